// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Nested groups that qualify variable names.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(usize);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The text after the last `:` scope qualifier.
pub fn uq_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(p) => &name[p + 1..],
        None => name,
    }
}

/// Identity of a value: the scope it lives in (None for global) and its
/// unqualified name.  Ordering is total so tables keyed by it iterate
/// deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId {
    pub scope: Option<ScopeId>,
    pub name: String,
}

impl ValueId {
    pub fn global(name: &str) -> Self {
        ValueId {
            scope: None,
            name: uq_name(name).to_owned(),
        }
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{}:{}", scope, self.name),
            None => write!(f, ":{}", self.name),
        }
    }
}

#[derive(Clone, Debug)]
struct ScopeNode {
    name: String,
    parent: Option<ScopeId>,
    declared: BTreeSet<String>,
}

/// A tree of groups rooted at the model itself.  Names declared in the
/// root group live in the global namespace.
#[derive(Clone, Debug)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree {
            nodes: vec![ScopeNode {
                name: String::new(),
                parent: None,
                declared: BTreeSet::new(),
            }],
        }
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn add_group(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            name: name.to_owned(),
            parent: Some(parent),
            declared: BTreeSet::new(),
        });
        id
    }

    pub fn contains(&self, scope: ScopeId) -> bool {
        scope.0 < self.nodes.len()
    }

    pub fn name(&self, scope: ScopeId) -> Option<&str> {
        self.nodes.get(scope.0).map(|n| n.name.as_str())
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.nodes.get(scope.0).and_then(|n| n.parent)
    }

    pub fn declare(&mut self, scope: ScopeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(scope.0) {
            node.declared.insert(uq_name(name).to_owned());
        }
    }

    pub fn declares(&self, scope: ScopeId, name: &str) -> bool {
        self.nodes
            .get(scope.0)
            .is_some_and(|n| n.declared.contains(name))
    }

    /// The scope `name` refers to when written inside `scope`.
    ///
    /// A `:`-qualified name binds to the nearest enclosing group (starting
    /// from the parent of `scope`) that declares the unqualified name, or
    /// to the global namespace if none does.  Other names bind to `scope`.
    pub fn resolve_scope(&self, scope: Option<ScopeId>, name: &str) -> Option<ScopeId> {
        let Some(uq) = name.strip_prefix(':') else {
            return scope;
        };
        let mut group = scope.and_then(|s| self.parent(s));
        while let Some(g) = group {
            if self.declares(g, uq) {
                return Some(g);
            }
            group = self.parent(g);
        }
        None
    }

    /// The value id for `name` declared in `scope`.  Names in the root group
    /// are global.
    pub fn value_id(&self, scope: Option<ScopeId>, name: &str) -> ValueId {
        match scope {
            Some(s) if !name.is_empty() && self.parent(s).is_some() => ValueId {
                scope: Some(s),
                name: uq_name(name).to_owned(),
            },
            _ => ValueId::global(name),
        }
    }

    /// The identity `name` refers to when referenced from `scope`.
    pub fn lookup_id(&self, scope: Option<ScopeId>, name: &str) -> ValueId {
        self.value_id(self.resolve_scope(scope, name), name)
    }
}
