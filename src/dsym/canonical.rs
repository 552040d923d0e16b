// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Canonical forms and isomorphism invariants.
//!
//! The canonical form of a connected symbol is the relabeling produced
//! by the traversal whose protocol is lexicographically smallest among
//! all start elements. The protocol of a start element records, in
//! traversal numbering, the image of every element under every neighbor
//! operation followed by all branching values, with `0` for undefined
//! entries. Two connected symbols are isomorphic exactly when their
//! minimal protocols agree, which makes the protocol double as an
//! isomorphism invariant.
//!
//! The search engine's canonicity test is the cheap special case: the
//! current numbering is acceptable iff no start element produces a
//! strictly smaller protocol than element 1. Ties resolve to the
//! earliest start, so the identity relabeling wins them.

use crate::dsym::symbol::DSymbol;
use crate::dsym::{orbits, DelaneySymbol, Elem};

/// The traversal protocol for the given start element, together with
/// the old-to-new numbering that produced it.
fn protocol(ds: &impl DelaneySymbol, start: Elem) -> (Vec<u32>, Vec<Elem>) {
    let (old_to_new, new_to_old) = orbits::traversal_numbering(ds, start);
    let reached = new_to_old.len() - 1;
    debug_assert_eq!(reached, ds.size(), "protocol requires a connected symbol");
    let mut proto = Vec::with_capacity(reached * (2 * ds.dim() + 1));
    for &old in &new_to_old[1..] {
        for i in 0..=ds.dim() {
            let entry = match ds.op(i, old) {
                Some(e) => old_to_new[e as usize],
                None => 0,
            };
            proto.push(entry);
        }
    }
    for &old in &new_to_old[1..] {
        for i in 0..ds.dim() {
            proto.push(ds.v(i, old).unwrap_or(0) as u32);
        }
    }
    (proto, old_to_new)
}

/// The isomorphism invariant: the minimal protocol over all starts.
pub fn invariant(ds: &impl DelaneySymbol) -> Vec<u32> {
    let mut best: Option<Vec<u32>> = None;
    for start in ds.elements() {
        let (proto, _) = protocol(ds, start);
        match &best {
            Some(b) if *b <= proto => {}
            _ => best = Some(proto),
        }
    }
    best.unwrap_or_default()
}

/// The relabeling old → new that takes the symbol to its canonical
/// form. Among equally minimal relabelings, the one whose start element
/// is smallest is returned.
pub fn map_to_canonical(ds: &impl DelaneySymbol) -> Vec<Elem> {
    let mut best: Option<(Vec<u32>, Vec<Elem>)> = None;
    for start in ds.elements() {
        let (proto, map) = protocol(ds, start);
        match &best {
            Some((b, _)) if *b <= proto => {}
            _ => best = Some((proto, map)),
        }
    }
    best.map(|(_, map)| map).unwrap_or_default()
}

/// Apply a relabeling, producing a fresh flat symbol.
pub fn renumbered(ds: &impl DelaneySymbol, old_to_new: &[Elem]) -> DSymbol {
    let size = ds.size();
    let mut out = DSymbol::new(ds.dim(), size);
    for old in ds.elements() {
        let new_d = old_to_new[old as usize];
        for i in 0..=ds.dim() {
            if let Some(e) = ds.op(i, old) {
                out.set_op_pair(i, new_d, old_to_new[e as usize]);
            }
        }
        for i in 0..ds.dim() {
            if let Some(value) = ds.v(i, old) {
                out.set_v(i, new_d, value);
            }
        }
    }
    out
}

/// The canonical form of a connected symbol.
pub fn canonical_form(ds: &impl DelaneySymbol) -> DSymbol {
    renumbered(ds, &map_to_canonical(ds))
}

/// True if the identity relabeling already attains the minimal
/// protocol, i.e. element 1 keeps its place in the canonical form.
pub fn has_minimal_start(ds: &impl DelaneySymbol) -> bool {
    let (reference, _) = protocol(ds, 1);
    for start in 2..=ds.size() as Elem {
        let (proto, _) = protocol(ds, start);
        if proto < reference {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_relabeling_invariant() {
        // The same two-chamber symbol written with its elements swapped.
        let a = DSymbol::parse("2:2,1 2,2:2,4").unwrap();
        let swapped = renumbered(&a, &[0, 2, 1]);
        assert_eq!(canonical_form(&a), canonical_form(&swapped));
        assert_eq!(invariant(&a), invariant(&swapped));
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let ds = DSymbol::parse("2:2,1 2,2:2,4").unwrap();
        let canon = canonical_form(&ds);
        assert_eq!(canonical_form(&canon), canon);
        assert!(has_minimal_start(&canon));
    }

    #[test]
    fn invariant_separates_non_isomorphic_symbols() {
        let a = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let b = DSymbol::parse("1:1,1,1:4,3").unwrap();
        assert_ne!(invariant(&a), invariant(&b));
    }

    #[test]
    fn minimal_start_detects_bad_numbering() {
        // op2 joins 1 and 2; the asymmetry sits in the branching, with
        // the larger face size on element 1. Starting at 2 yields the
        // smaller protocol, so the identity numbering is not canonical.
        let ds = DSymbol::parse("2:1 2,1 2,2:6 3,4").unwrap();
        let better = renumbered(&ds, &[0, 2, 1]);
        assert!(has_minimal_start(&ds) != has_minimal_start(&better));
    }
}
