// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::numeric::split_leading_f64;

/// An initial value expression of the form `<coefficient><name>`, as in
/// `2.5`, `-x`, `0.5*rate` or `eye(3,3)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowCoef {
    pub coef: f64,
    pub name: String,
}

impl FlowCoef {
    pub fn parse(expr: &str) -> Self {
        let s = expr.trim();
        let (coef, rest) = match split_leading_f64(s) {
            Some((coef, end)) => (coef, &s[end..]),
            None => match s.strip_prefix('-') {
                Some(rest) => (-1.0, rest),
                None => (1.0, s.strip_prefix('+').unwrap_or(s)),
            },
        };
        let rest = rest.trim_start();
        let name = rest.strip_prefix('*').unwrap_or(rest).trim();
        FlowCoef {
            coef,
            name: name.to_owned(),
        }
    }
}
