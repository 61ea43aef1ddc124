// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Engineering notation for displaying values.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngNotation {
    /// Decimal exponent in scientific notation.
    pub sci_exp: i32,
    /// The multiple of 3 the value is displayed relative to.
    pub eng_exp: i32,
}

pub fn eng_exp(v: f64) -> EngNotation {
    let sci_exp = if v != 0.0 && v.is_finite() {
        v.abs().log10().floor() as i32
    } else {
        0
    };
    // four digit numbers are usually years
    let eng_exp = if sci_exp == 3 {
        0
    } else if sci_exp >= 0 {
        3 * (sci_exp / 3)
    } else {
        3 * ((sci_exp + 1) / 3 - 1)
    };
    EngNotation { sci_exp, eng_exp }
}

/// `value` scaled by `10^-eng_exp`, printed right aligned with `digits`
/// significant figures (at least 3).
pub fn mantissa(value: f64, e: EngNotation, digits: usize) -> String {
    let digits = digits.max(3);
    let (width, decimal_places) = match e.sci_exp - e.eng_exp {
        -3 => (digits + 4, digits + 1),
        -2 => (digits + 3, digits),
        0 | -1 => (digits + 2, digits - 1),
        1 => (digits + 2, digits - 2),
        2 | 3 => (digits + 2, digits - 3),
        _ => return String::new(),
    };
    let scaled = value * 10f64.powi(-e.eng_exp);
    format!("{scaled:>width$.decimal_places$}")
}

pub fn exp_multiplier(exp: i32) -> String {
    if exp != 0 {
        format!("×10^{exp}")
    } else {
        String::new()
    }
}

/// A value in engineering notation, as in ` 12.3×10^3`.
pub fn format_eng(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let e = eng_exp(value);
    format!("{}{}", mantissa(value, e, digits), exp_multiplier(e.eng_exp))
}
