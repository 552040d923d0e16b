// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Per-element signature keys for the extension search.
//!
//! Two elements can be joined by the next (not yet defined) top-level
//! operation only if the orbits they sit in, taken under the indices
//! orthogonal to it, look the same around them. The signature captures
//! exactly that: the interned isomorphism type of the element's orbit,
//! plus the element's automorphism class inside it. Signatures are
//! plain value pairs, so candidate filtering is a single comparison.
//!
//! Interned orbit types are kept in a [`SignatureCache`] owned by the
//! enumeration session and lent to every search it spawns; distinct
//! sessions never share one, so there is no global state to poison.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dsym::{canonical, orbits, DelaneySymbol, Elem};
use crate::search::components::map_to_first_representatives;

/// (interned orbit type, first representative of the element's
/// automorphism class in the orbit's canonical form).
pub type Signature = (u32, Elem);

/// Interns orbit invariants and memoizes, per type, the map from
/// canonical elements to the first representatives of their
/// automorphism classes.
#[derive(Debug, Default)]
pub struct SignatureCache {
    interned: HashMap<Vec<u32>, u32>,
    rep_maps: Vec<Vec<Elem>>,
}

/// A cache handle shareable between the searches of one session.
pub type SharedSignatureCache = Rc<RefCell<SignatureCache>>;

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSignatureCache {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Number of distinct orbit types seen so far.
    pub fn len(&self) -> usize {
        self.rep_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rep_maps.is_empty()
    }

    /// Compute the signature of every element of `ds` with respect to
    /// the orbits under indices `0..=max_index`. The result is indexed
    /// by element id; index 0 is a sentinel.
    ///
    /// Must be recomputed after any structural change to `ds`; the
    /// searches do so once per successful move that touches the element
    /// set.
    pub fn signatures_for(&mut self, ds: &impl DelaneySymbol, max_index: usize) -> Vec<Signature> {
        let indices: Vec<usize> = (0..=max_index).collect();
        let mut signatures = vec![(0, 0); ds.size() + 1];
        for seed in orbits::orbit_reps(ds, &indices) {
            let (sub, sub_to_old) = orbits::orbit_symbol(ds, 0, max_index, seed);
            let invariant = canonical::invariant(&sub);
            let type_id = match self.interned.get(&invariant).copied() {
                Some(id) => id,
                None => {
                    let id = self.rep_maps.len() as u32;
                    let canon = canonical::canonical_form(&sub);
                    self.interned.insert(invariant, id);
                    self.rep_maps.push(map_to_first_representatives(&canon));
                    id
                }
            };
            let to_canonical = canonical::map_to_canonical(&sub);
            let rep_map = &self.rep_maps[type_id as usize];
            for sub_elem in 1..=sub.size() as Elem {
                let old = sub_to_old[sub_elem as usize];
                let canonical_elem = to_canonical[sub_elem as usize];
                signatures[old as usize] = (type_id, rep_map[canonical_elem as usize]);
            }
        }
        signatures
    }
}
