// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Shared helpers for the integration tests.

use delaney_search::dsym::canonical;
use delaney_search::DSymbol;

pub fn symbol(text: &str) -> DSymbol {
    DSymbol::parse(text).unwrap_or_else(|error| panic!("bad test symbol {text:?}: {error}"))
}

/// Assert that no two symbols in the slice are isomorphic.
pub fn assert_pairwise_non_isomorphic(symbols: &[DSymbol]) {
    let invariants: Vec<Vec<u32>> = symbols.iter().map(canonical::invariant).collect();
    for (a, inv_a) in invariants.iter().enumerate() {
        for (b, inv_b) in invariants.iter().enumerate().skip(a + 1) {
            assert_ne!(
                inv_a, inv_b,
                "results {a} and {b} are isomorphic: {} / {}",
                symbols[a], symbols[b]
            );
        }
    }
}
