// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The neighbor-relation extension search.
//!
//! Takes a (d−1)-dimensional symbol whose connected components are the
//! available tiles and defines a d-th neighbor operation on it in every
//! admissible way, attaching whole pre-classified components as the
//! relation grows. For each isomorphism class of extended symbols
//! exactly one representative is produced; the order and naming of
//! elements is not preserved.
//!
//! A decision either joins the current choice element to a free element
//! with a matching signature, or appends an unused catalogue form whose
//! entry element matches. Every join forces its images under the
//! operations orthogonal to the new one to be joined too, which is the
//! deduction cascade; a contradiction or a signature mismatch rejects
//! the whole decision. Canonicity pruning keeps the numbering minimal
//! at every step, so isomorphic duplicates are cut off early instead of
//! being filtered at the end.

use tracing::debug;

use crate::dsym::{canonical, orbits, properties, DSymbol, DelaneySymbol, DynamicSymbol, Elem};
use crate::engine::{BranchAndCut, MoveStatus, SearchSpec};
use crate::errors::{Error, Result};
use crate::search::components::ComponentLibrary;
use crate::search::signature::{SharedSignatureCache, Signature, SignatureCache};

/// Options for the extension search.
#[derive(Debug, Clone, Default)]
pub struct CombineOptions {
    /// Upper bound on the length of (d−1, d)-chains. A chain that can
    /// no longer stay within the bound is a contradiction; a chain at
    /// exactly the bound forces its remaining joins. `None` disables
    /// the hook.
    pub edge_degree_limit: Option<usize>,
}

/// One move of the extension search. Doubles as the enumeration cursor:
/// the free-element scan continues above `neighbor`, the catalogue scan
/// at (`comp_type`, `comp_form` + 1). A placeholder has `neighbor` 0; a
/// deduction carries −1 in the catalogue fields.
#[derive(Debug, Clone)]
pub struct CombineMove {
    pub element: Elem,
    pub neighbor: Elem,
    comp_type: i32,
    comp_form: i32,
}

impl CombineMove {
    fn join(element: Elem, neighbor: Elem) -> Self {
        Self {
            element,
            neighbor,
            comp_type: -1,
            comp_form: -1,
        }
    }

    fn is_attach(&self) -> bool {
        self.comp_type >= 0 && self.neighbor > 0
    }
}

/// State of the extension search; driven by [`BranchAndCut`].
pub struct CombineSpec {
    dim: usize,
    target_size: usize,
    library: ComponentLibrary,
    unused: Vec<usize>,
    current: DynamicSymbol,
    size: usize,
    signatures: Vec<Signature>,
    cache: SharedSignatureCache,
    options: CombineOptions,
}

/// The extension search as a pull-based iterator over extended symbols.
pub type CombineTiles = BranchAndCut<CombineSpec>;

impl CombineTiles {
    /// Validate the input and set up the search. The input must be a
    /// finite, complete (d−1)-dimensional symbol; when the target
    /// dimension is 3, every component must be spherical.
    pub fn new(input: &DSymbol, options: CombineOptions) -> Result<Self> {
        Self::with_cache(input, options, SignatureCache::shared())
    }

    /// Like [`new`](Self::new), but borrowing a session-owned signature
    /// cache so that several searches can share interned orbit types.
    pub fn with_cache(
        input: &DSymbol,
        options: CombineOptions,
        cache: SharedSignatureCache,
    ) -> Result<Self> {
        let dim = input.dim() + 1;
        if dim < 2 {
            return Err(Error::UnsupportedDimension(dim));
        }
        if !input.is_complete() {
            return Err(Error::Incomplete);
        }
        let indices: Vec<usize> = (0..=input.dim()).collect();
        if dim == 3 {
            for seed in orbits::orbit_reps(input, &indices) {
                let (sub, _) = orbits::orbit_symbol(input, 0, input.dim(), seed);
                if !properties::is_spherical_2d(&sub) {
                    return Err(Error::NotSpherical(seed));
                }
            }
        }

        let library = {
            let mut cache_ref = cache.borrow_mut();
            ComponentLibrary::build(input, dim - 2, &mut cache_ref)
        };
        let mut unused = library.initial_counters();

        // The component with the smallest invariant seeds the search in
        // its canonical labelling.
        let mut current = DynamicSymbol::new(dim);
        current.append(&library.types[0].forms[0].symbol);
        unused[0] -= 1;
        let size = current.size();
        let signatures = cache.borrow_mut().signatures_for(&current, dim - 2);

        Ok(BranchAndCut::from_spec(CombineSpec {
            dim,
            target_size: input.size(),
            library,
            unused,
            current,
            size,
            signatures,
            cache,
            options,
        }))
    }
}

impl CombineSpec {
    fn refresh_signatures(&mut self) {
        self.size = self.current.size();
        self.signatures = self
            .cache
            .borrow_mut()
            .signatures_for(&self.current, self.dim - 2);
    }

    /// Walk the (d−1, d)-chain through `start`, collecting its open
    /// ends. Returns forced closures, or `None` when the chain exceeds
    /// the configured bound.
    fn edge_degree_deductions(&self, start: Elem, limit: usize) -> Option<Vec<CombineMove>> {
        let d = self.dim;
        let mut e = start;
        let mut steps = 0usize;
        let mut cuts: Vec<Elem> = Vec::new();
        loop {
            e = self
                .current
                .op(d - 1, e)
                .expect("operations below the top index are total");
            match self.current.op(d, e) {
                Some(next) => e = next,
                None => cuts.push(e),
            }
            steps += 1;
            if e == start {
                break;
            }
        }
        let mut forced = Vec::new();
        match cuts.as_slice() {
            [] => {
                if steps > limit {
                    return None;
                }
            }
            [a] => {
                if steps > limit {
                    return None;
                }
                if steps == limit {
                    forced.push(CombineMove::join(*a, *a));
                }
            }
            [a, b] => {
                if steps > 2 * limit {
                    return None;
                }
                if steps == 2 * limit {
                    forced.push(CombineMove::join(*a, *b));
                }
            }
            _ => unreachable!("a chain has at most two open ends"),
        }
        Some(forced)
    }
}

impl SearchSpec for CombineSpec {
    type Mv = CombineMove;
    type Output = DSymbol;

    fn initial_choice(&mut self) -> Option<CombineMove> {
        Some(CombineMove {
            element: 1,
            neighbor: 0,
            comp_type: 0,
            comp_form: 0,
        })
    }

    fn next_choice(&mut self, after: &CombineMove) -> Option<CombineMove> {
        let mut d = after.element;
        loop {
            d += 1;
            if d as usize > self.size {
                return None;
            }
            if !self.current.defines_op(self.dim, d) {
                return Some(CombineMove {
                    element: d,
                    neighbor: 0,
                    comp_type: -1,
                    comp_form: -1,
                });
            }
        }
    }

    fn next_decision(&mut self, previous: &CombineMove) -> Option<CombineMove> {
        let element = previous.element;
        let sig = self.signatures[element as usize];

        // First the free elements of the connected portion.
        for e in previous.neighbor + 1..=self.size as Elem {
            if !self.current.defines_op(self.dim, e) && self.signatures[e as usize] == sig {
                return Some(CombineMove::join(element, e));
            }
        }

        // Then the remaining catalogue forms, in catalogue order.
        let mut t = previous.comp_type.max(0) as usize;
        let mut f = (previous.comp_form + 1).max(0) as usize;
        while t < self.library.types.len() {
            if self.unused[t] > 0 {
                let forms = &self.library.types[t].forms;
                while f < forms.len() {
                    if forms[f].entry_signature == sig {
                        return Some(CombineMove {
                            element,
                            neighbor: (self.size + 1) as Elem,
                            comp_type: t as i32,
                            comp_form: f as i32,
                        });
                    }
                    f += 1;
                }
            }
            t += 1;
            f = 0;
        }
        None
    }

    fn check_move(&mut self, mv: &CombineMove) -> MoveStatus {
        if mv.is_attach() {
            return MoveStatus::Ok;
        }
        match (
            self.current.op(self.dim, mv.element),
            self.current.op(self.dim, mv.neighbor),
        ) {
            (None, None) => MoveStatus::Ok,
            (Some(e), _) if e == mv.neighbor => MoveStatus::Void,
            _ => MoveStatus::Illegal,
        }
    }

    fn perform(&mut self, mv: &CombineMove) {
        if mv.is_attach() {
            let form = &self.library.types[mv.comp_type as usize].forms[mv.comp_form as usize];
            self.current.append(&form.symbol);
            self.unused[mv.comp_type as usize] -= 1;
            self.refresh_signatures();
            debug!(
                comp_type = mv.comp_type,
                comp_form = mv.comp_form,
                size = self.size,
                "attached component"
            );
        }
        self.current
            .define_op(self.dim, mv.element, mv.neighbor)
            .expect("move was checked legal");
    }

    fn undo(&mut self, mv: &CombineMove) {
        if self.current.has_element(mv.neighbor) {
            self.current.undefine_op(self.dim, mv.element);
        }
        if mv.is_attach() {
            let indices: Vec<usize> = (0..=self.dim).collect();
            for e in orbits::orbit(&self.current, &indices, mv.neighbor) {
                self.current.remove_element(e);
            }
            self.current.renumber();
            self.unused[mv.comp_type as usize] += 1;
            self.refresh_signatures();
        }
    }

    fn deductions(&mut self, mv: &CombineMove) -> Option<Vec<CombineMove>> {
        let (d_elem, e_elem) = (mv.element, mv.neighbor);
        if self.signatures[d_elem as usize] != self.signatures[e_elem as usize] {
            debug!(element = d_elem, neighbor = e_elem, "signature mismatch");
            return None;
        }
        let mut forced = Vec::new();
        if let Some(limit) = self.options.edge_degree_limit {
            forced.extend(self.edge_degree_deductions(d_elem, limit)?);
        }
        for i in 0..=self.dim - 2 {
            let di = self
                .current
                .op(i, d_elem)
                .expect("operations below the top index are total");
            let ei = self
                .current
                .op(i, e_elem)
                .expect("operations below the top index are total");
            forced.push(CombineMove::join(di, ei));
        }
        Some(forced)
    }

    fn is_valid(&mut self) -> bool {
        canonical::has_minimal_start(&self.current)
    }

    fn make_result(&mut self) -> Option<DSymbol> {
        if self.size != self.target_size {
            return None;
        }
        if self.dim == 3 && !properties::may_become_locally_euclidean_3d(&self.current) {
            return None;
        }
        Some(canonical::canonical_form(&self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extend(text: &str) -> Vec<DSymbol> {
        CombineTiles::new(&DSymbol::parse(text).unwrap(), CombineOptions::default())
            .unwrap()
            .collect()
    }

    #[test]
    fn single_chamber_tile_closes_onto_itself() {
        let results = extend("1:1,1,1:3,3");
        assert_eq!(results.len(), 1);
        let ds = &results[0];
        assert_eq!(ds.dim(), 3);
        assert_eq!(ds.op(3, 1), Some(1));
        assert!(ds.ops_complete());
    }

    #[test]
    fn two_identical_tiles_join_in_one_way() {
        // The self-join leaves the second copy unused, so the only
        // complete result joins the two copies.
        let results = extend("2:1 2,1 2,1 2:3 3,3 3");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].size(), 2);
        assert!(orbits::is_connected(&results[0]));
    }

    #[test]
    fn results_are_connected_complete_and_canonical() {
        let results = extend("2:1 2,1 2,1 2:4 4,3 3");
        assert!(!results.is_empty());
        for ds in &results {
            assert!(orbits::is_connected(ds));
            assert!(ds.ops_complete());
            assert_eq!(&canonical::canonical_form(ds), ds);
        }
    }

    #[test]
    fn results_are_pairwise_non_isomorphic() {
        // A digonal dihedron with two chamber classes: the new
        // operation can fix both chambers or swap them.
        let results = extend("2:1 2,1 2,2:2 2,2");
        assert_eq!(results.len(), 2);
        for (k, a) in results.iter().enumerate() {
            for b in &results[k + 1..] {
                assert_ne!(canonical::invariant(a), canonical::invariant(b));
            }
        }
    }

    #[test]
    fn unmatchable_tiles_produce_nothing() {
        // Two tiles of different isomorphism type cannot be joined, and
        // a self-closed single tile leaves the other unused.
        let results = extend("2:1 2,1 2,1 2:3 4,3 3");
        assert!(results.is_empty());
    }

    #[test]
    fn non_spherical_component_fails_fast() {
        let heptagon = DSymbol::parse("1:1,1,1:7,3").unwrap();
        assert!(matches!(
            CombineTiles::new(&heptagon, CombineOptions::default()),
            Err(Error::NotSpherical(_))
        ));
    }

    #[test]
    fn incomplete_input_fails_fast() {
        let partial = DSymbol::parse("1:1,1,1:0,3").unwrap();
        assert!(matches!(
            CombineTiles::new(&partial, CombineOptions::default()),
            Err(Error::Incomplete)
        ));
    }

    #[test]
    fn edge_degree_limit_prunes_long_chains() {
        let without = extend("2:1 2,1 2,1 2:3 3,3 3").len();
        let mut options = CombineOptions::default();
        options.edge_degree_limit = Some(1);
        let with: Vec<DSymbol> = CombineTiles::new(
            &DSymbol::parse("2:1 2,1 2,1 2:3 3,3 3").unwrap(),
            options,
        )
        .unwrap()
        .collect();
        // The join of the two copies has a (2,3)-chain of length 2,
        // which the limit forbids.
        assert_eq!(without, 1);
        assert!(with.is_empty());
    }
}
