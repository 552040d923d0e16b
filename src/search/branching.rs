// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The branching-number assignment search.
//!
//! Takes a symbol with complete neighbor operations but missing
//! branching values and defines them in every admissible combination.
//! Slots are the orbits of consecutive index pairs without a value, in
//! a fixed order; candidates come from an increasing list and are cut
//! as soon as the numeric bound can no longer be met, since raising a
//! branching value only lowers curvature.
//!
//! Duplicate suppression works against the frozen input: the input is
//! canonicalized once, its automorphism group is computed once, and a
//! partial assignment is rejected whenever some automorphism permutes
//! it to a lexicographically smaller value sequence. Exactly one
//! assignment per isomorphism class survives to completion.

use num_traits::Zero;
use tracing::debug;

use crate::dsym::properties::{self, Rational};
use crate::dsym::{canonical, morphism, orbits, DSymbol, DelaneySymbol, DynamicSymbol, Elem};
use crate::engine::{BranchAndCut, MoveStatus, SearchSpec};
use crate::errors::{Error, Result};

/// Options for the branching search.
#[derive(Debug, Clone)]
pub struct BranchingOptions {
    /// Lower bound on m = v·r for the top index pair (vertex degrees in
    /// dimension 2, edge degrees in dimension 3).
    pub min_degree: usize,
    /// Lower bound on the curvature of the completed symbol (dimension
    /// 2 only; dimension 3 uses local euclidicity instead).
    pub min_curvature: Rational,
    /// Candidate branching values, tried in increasing order.
    pub candidates: Vec<u16>,
}

impl Default for BranchingOptions {
    fn default() -> Self {
        Self {
            min_degree: 3,
            min_curvature: Rational::zero(),
            candidates: vec![1, 2, 3, 4, 6],
        }
    }
}

/// An undefined orbit awaiting a branching value.
#[derive(Debug, Clone, Copy)]
struct Slot {
    pair: usize,
    rep: Elem,
    r: usize,
}

/// One move: assign `value` to `slot`. Value 0 marks a placeholder.
#[derive(Debug, Clone)]
pub struct BranchingMove {
    slot: usize,
    value: u16,
}

enum Feasibility {
    Ok,
    TooSmall,
    Cut,
}

/// State of the branching search; driven by [`BranchAndCut`].
pub struct BranchingSpec {
    dim: usize,
    current: DynamicSymbol,
    slots: Vec<Slot>,
    values: Vec<u16>,
    /// Slot permutations induced by the input's automorphisms.
    perms: Vec<Vec<usize>>,
    options: BranchingOptions,
}

/// The branching search as a pull-based iterator over completed symbols.
pub type DefineBranching = BranchAndCut<BranchingSpec>;

impl DefineBranching {
    /// Validate the input and set up the search. The input must be a
    /// connected, proper symbol of dimension 2 or 3 with complete
    /// neighbor operations.
    pub fn new(input: &DSymbol, options: BranchingOptions) -> Result<Self> {
        let dim = input.dim();
        if dim != 2 && dim != 3 {
            return Err(Error::UnsupportedDimension(dim));
        }
        if !input.ops_complete() {
            return Err(Error::Incomplete);
        }
        if !orbits::is_connected(input) {
            return Err(Error::Disconnected);
        }
        for i in 0..dim {
            for j in i + 2..=dim {
                for d in input.elements() {
                    match orbits::r(input, i, j, d) {
                        Some(r) if r <= 2 => {}
                        _ => return Err(Error::Improper { i, j }),
                    }
                }
            }
        }

        let canon = canonical::canonical_form(input);
        let automorphisms = morphism::automorphisms(&canon);
        let current = DynamicSymbol::from_symbol(&canon);

        let mut slots = Vec::new();
        let mut slot_of = vec![vec![usize::MAX; canon.size() + 1]; dim];
        for pair in 0..dim {
            for rep in orbits::orbit_reps(&canon, &[pair, pair + 1]) {
                if canon.defines_v(pair, rep) {
                    continue;
                }
                let r = orbits::r(&canon, pair, pair + 1, rep)
                    .expect("operations are complete");
                let index = slots.len();
                for e in orbits::orbit(&canon, &[pair, pair + 1], rep) {
                    slot_of[pair][e as usize] = index;
                }
                slots.push(Slot { pair, rep, r });
            }
        }

        // Automorphisms preserve which orbits carry a value, so they
        // act on the undefined slots by permutation.
        let perms = automorphisms
            .iter()
            .map(|image| {
                slots
                    .iter()
                    .map(|slot| {
                        let mapped = image[slot.rep as usize];
                        let index = slot_of[slot.pair][mapped as usize];
                        debug_assert_ne!(index, usize::MAX);
                        index
                    })
                    .collect()
            })
            .collect();

        let mut candidates = options.candidates.clone();
        candidates.sort_unstable();
        candidates.dedup();
        candidates.retain(|&v| v > 0);
        let options = BranchingOptions {
            candidates,
            ..options
        };

        let values = vec![0; slots.len()];
        Ok(BranchAndCut::from_spec(BranchingSpec {
            dim,
            current,
            slots,
            values,
            perms,
            options,
        }))
    }
}

impl BranchingSpec {
    /// Classify a candidate value for a slot. `TooSmall` skips to the
    /// next candidate; `Cut` abandons the slot's remaining (larger)
    /// candidates, which is sound because curvature decreases in v.
    fn feasibility(&mut self, slot: usize, value: u16) -> Feasibility {
        let Slot { pair, rep, r } = self.slots[slot];
        if pair == self.dim - 1 && (value as usize) * r < self.options.min_degree {
            return Feasibility::TooSmall;
        }
        self.current.redefine_v(pair, rep, value);
        let admissible = match self.dim {
            2 => matches!(
                properties::curvature_2d(&self.current, true),
                Some(k) if k >= self.options.min_curvature
            ),
            _ => properties::may_become_locally_euclidean_3d(&self.current),
        };
        self.current.undefine_v(pair, rep);
        if admissible {
            Feasibility::Ok
        } else {
            Feasibility::Cut
        }
    }
}

impl SearchSpec for BranchingSpec {
    type Mv = BranchingMove;
    type Output = DSymbol;

    fn initial_choice(&mut self) -> Option<BranchingMove> {
        (!self.slots.is_empty()).then_some(BranchingMove { slot: 0, value: 0 })
    }

    fn next_choice(&mut self, after: &BranchingMove) -> Option<BranchingMove> {
        (after.slot + 1 < self.slots.len()).then_some(BranchingMove {
            slot: after.slot + 1,
            value: 0,
        })
    }

    fn next_decision(&mut self, previous: &BranchingMove) -> Option<BranchingMove> {
        let slot = previous.slot;
        let candidates = self.options.candidates.clone();
        for value in candidates.into_iter().filter(|&v| v > previous.value) {
            match self.feasibility(slot, value) {
                Feasibility::TooSmall => continue,
                Feasibility::Cut => {
                    debug!(slot, value, "cutting remaining candidates");
                    return None;
                }
                Feasibility::Ok => return Some(BranchingMove { slot, value }),
            }
        }
        None
    }

    fn check_move(&mut self, mv: &BranchingMove) -> MoveStatus {
        let Slot { pair, rep, .. } = self.slots[mv.slot];
        match self.current.v(pair, rep) {
            None => MoveStatus::Ok,
            Some(value) if value == mv.value => MoveStatus::Void,
            Some(_) => MoveStatus::Illegal,
        }
    }

    fn perform(&mut self, mv: &BranchingMove) {
        let Slot { pair, rep, .. } = self.slots[mv.slot];
        self.current.redefine_v(pair, rep, mv.value);
        self.values[mv.slot] = mv.value;
    }

    fn undo(&mut self, mv: &BranchingMove) {
        let Slot { pair, rep, .. } = self.slots[mv.slot];
        self.current.undefine_v(pair, rep);
        self.values[mv.slot] = 0;
    }

    fn deductions(&mut self, _mv: &BranchingMove) -> Option<Vec<BranchingMove>> {
        Some(Vec::new())
    }

    /// Reject assignments some input automorphism maps to a smaller
    /// value sequence. The comparison stops at the first undefined
    /// slot on either side: beyond the assigned region it is not yet
    /// decided, and a premature verdict would cut minimal completions.
    fn is_valid(&mut self) -> bool {
        for perm in &self.perms {
            for (k, &mapped) in perm.iter().enumerate() {
                let permuted = self.values[mapped];
                let original = self.values[k];
                if permuted == 0 || original == 0 {
                    break;
                }
                if permuted < original {
                    return false;
                }
                if permuted > original {
                    break;
                }
            }
        }
        true
    }

    fn make_result(&mut self) -> Option<DSymbol> {
        let flat = self.current.flatten();
        let admissible = match self.dim {
            2 => matches!(
                properties::curvature_2d(&flat, false),
                Some(k) if k >= self.options.min_curvature
            ),
            _ => properties::is_locally_euclidean_3d(&flat),
        };
        admissible.then(|| canonical::canonical_form(&flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(text: &str, options: BranchingOptions) -> Vec<DSymbol> {
        DefineBranching::new(&DSymbol::parse(text).unwrap(), options)
            .unwrap()
            .collect()
    }

    #[test]
    fn single_chamber_euclidean_candidates() {
        // m01 free, m12 >= 3; K = 1/v0 + 1/v1 - 1/2 must stay >= 0.
        let results = branch("1:1,1,1:0,0", BranchingOptions::default());
        assert_eq!(results.len(), 12);
        let flat: Vec<&DSymbol> = results
            .iter()
            .filter(|ds| {
                properties::curvature_2d(*ds, false) == Some(Rational::zero())
            })
            .collect();
        // The classic euclidean family: {3,6}, {4,4}, {6,3}.
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn min_degree_tightens_the_enumeration() {
        let options = BranchingOptions {
            min_degree: 4,
            ..BranchingOptions::default()
        };
        let results = branch("1:1,1,1:0,0", options);
        assert_eq!(results.len(), 7);
        for ds in &results {
            assert!(orbits::m(ds, 1, 1).unwrap() >= 4);
        }
    }

    #[test]
    fn automorphic_assignments_are_reported_once() {
        // The swap automorphism identifies (a, b, c) with (b, a, c).
        let seed = "2:1 2,1 2,2:0,0";
        let results = branch(seed, BranchingOptions::default());
        let candidates = [1i64, 2, 3, 4, 6];
        let mut expected = 0;
        for (ai, &a) in candidates.iter().enumerate() {
            for &b in &candidates[ai..] {
                for &c in &[2i64, 3, 4, 6] {
                    let k = Rational::new(1, a) + Rational::new(1, b) + Rational::new(1, c)
                        - Rational::new(1, 1);
                    if k >= Rational::zero() {
                        expected += 1;
                    }
                }
            }
        }
        assert_eq!(results.len(), expected);
        for (k, a) in results.iter().enumerate() {
            for b in &results[k + 1..] {
                assert_ne!(canonical::invariant(a), canonical::invariant(b));
            }
        }
    }

    #[test]
    fn three_dimensional_branching_is_locally_euclidean() {
        // One chamber with tiles (3,3): the free edge branching must
        // keep the vertex figure (v23, 3) spherical.
        let results = branch("1 3:1,1,1,1:3,3,0", BranchingOptions::default());
        assert_eq!(results.len(), 2);
        let mut degrees: Vec<usize> = results
            .iter()
            .map(|ds| orbits::m(ds, 2, 1).unwrap())
            .collect();
        degrees.sort_unstable();
        assert_eq!(degrees, vec![3, 4]);
        for ds in &results {
            assert!(properties::is_locally_euclidean_3d(ds));
        }
    }

    #[test]
    fn disconnected_input_fails_fast() {
        let two_tiles = DSymbol::parse("2:1 2,1 2,1 2:3 3,3 3").unwrap();
        assert!(matches!(
            DefineBranching::new(&two_tiles, BranchingOptions::default()),
            Err(Error::Disconnected)
        ));
    }

    #[test]
    fn fully_branched_input_yields_itself_when_admissible() {
        let results = branch("1:1,1,1:4,4", BranchingOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], DSymbol::parse("1:1,1,1:4,4").unwrap());
        // A hyperbolic symbol misses the curvature bound.
        let none = branch("1:1,1,1:7,3", BranchingOptions::default());
        assert!(none.is_empty());
    }
}
