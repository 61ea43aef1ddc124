// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

/// Decides whether an allocation of `bytes` may go ahead.
///
/// The loader consults the budget before materialising a tensor; any
/// closure `Fn(usize) -> bool` can act as one.
pub trait MemoryBudget {
    fn allows(&self, bytes: usize) -> bool;
}

impl<F: Fn(usize) -> bool> MemoryBudget for F {
    fn allows(&self, bytes: usize) -> bool {
        self(bytes)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Unlimited;

impl MemoryBudget for Unlimited {
    fn allows(&self, _bytes: usize) -> bool {
        true
    }
}

/// Allows allocations up to a fixed number of bytes.
#[derive(Copy, Clone, Debug)]
pub struct ByteLimit(pub usize);

impl MemoryBudget for ByteLimit {
    fn allows(&self, bytes: usize) -> bool {
        bytes <= self.0
    }
}

#[test]
fn test_budgets() {
    assert!(Unlimited.allows(usize::MAX));
    assert!(ByteLimit(80).allows(80));
    assert!(!ByteLimit(80).allows(81));
    let even_only = |bytes: usize| bytes % 2 == 0;
    assert!(even_only.allows(8));
    assert!(!even_only.allows(9));
}
