// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The catalogue of building blocks for the extension search.
//!
//! The input to an extension search is a collection of connected,
//! complete components ("tiles"). The catalogue groups them by
//! isomorphism type and precomputes, per type, every inequivalent
//! labelled form a copy can be attached in: one traversal renumbering
//! per automorphism class of possible entry elements. Attaching a copy
//! always joins the new component's element 1, so enumerating forms is
//! what enumerates attachment geometries.
//!
//! Each type carries a multiplicity: how many disjoint copies the final
//! result must contain. The search consumes and restores these counters
//! as it attaches and detaches copies.

use crate::dsym::{canonical, morphism, orbits, DSymbol, DelaneySymbol, Elem, Partition};
use crate::search::signature::{Signature, SignatureCache};

/// One attachable labelled form of a component type.
#[derive(Debug, Clone)]
pub struct ComponentForm {
    pub symbol: DSymbol,
    /// Signature of the form's element 1, the element a join enters at.
    pub entry_signature: Signature,
}

/// An isomorphism type of component together with its labelled forms
/// and required number of copies.
#[derive(Debug, Clone)]
pub struct ComponentType {
    pub canonical: DSymbol,
    pub invariant: Vec<u32>,
    pub multiplicity: usize,
    pub forms: Vec<ComponentForm>,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentLibrary {
    pub types: Vec<ComponentType>,
}

impl ComponentLibrary {
    /// Build the catalogue for the components of `ds`, computing entry
    /// signatures with respect to the orbits under `0..=max_sig_index`.
    pub fn build(
        ds: &impl DelaneySymbol,
        max_sig_index: usize,
        cache: &mut SignatureCache,
    ) -> Self {
        let mut types = Vec::new();
        for (canon, multiplicity) in component_multiplicities(ds) {
            let invariant = canonical::invariant(&canon);
            let forms = sub_canonical_forms(&canon)
                .into_iter()
                .map(|symbol| {
                    let entry_signature = cache.signatures_for(&symbol, max_sig_index)[1];
                    ComponentForm {
                        symbol,
                        entry_signature,
                    }
                })
                .collect();
            types.push(ComponentType {
                canonical: canon,
                invariant,
                multiplicity,
                forms,
            });
        }
        Self { types }
    }

    /// Initial per-type remaining-use counters.
    pub fn initial_counters(&self) -> Vec<usize> {
        self.types.iter().map(|t| t.multiplicity).collect()
    }
}

/// The isomorphism types of the connected components of `ds`, each in
/// canonical form with its number of occurrences, sorted by invariant.
pub fn component_multiplicities(ds: &impl DelaneySymbol) -> Vec<(DSymbol, usize)> {
    let indices: Vec<usize> = (0..=ds.dim()).collect();
    let mut grouped: Vec<(Vec<u32>, DSymbol, usize)> = Vec::new();
    for seed in orbits::orbit_reps(ds, &indices) {
        let (sub, _) = orbits::orbit_symbol(ds, 0, ds.dim(), seed);
        let canon = canonical::canonical_form(&sub);
        let invariant = canonical::invariant(&canon);
        match grouped.iter_mut().find(|(inv, _, _)| *inv == invariant) {
            Some((_, _, count)) => *count += 1,
            None => grouped.push((invariant, canon, 1)),
        }
    }
    grouped.sort_by(|a, b| a.0.cmp(&b.0));
    grouped
        .into_iter()
        .map(|(_, canon, count)| (canon, count))
        .collect()
}

/// For every element of a connected symbol, the first representative of
/// its class under the automorphism group. Indexed by element id.
pub fn map_to_first_representatives(ds: &impl DelaneySymbol) -> Vec<Elem> {
    let mut classes = Partition::new(ds.size());
    for d in 2..=ds.size() as Elem {
        if classes.same(1, d) {
            continue;
        }
        if let Some(image) = morphism::morphism(ds, ds, 1, d) {
            for e in ds.elements() {
                classes.unite(e, image[e as usize]);
            }
        }
    }
    let mut map = vec![0; ds.size() + 1];
    for d in ds.elements() {
        map[d as usize] = classes.find(d);
    }
    map
}

/// The first representatives themselves, in ascending order.
pub fn first_representatives(ds: &impl DelaneySymbol) -> Vec<Elem> {
    map_to_first_representatives(ds)
        .into_iter()
        .skip(1)
        .enumerate()
        .filter(|&(k, rep)| rep == (k + 1) as Elem)
        .map(|(_, rep)| rep)
        .collect()
}

/// All inequivalent labelled forms of a connected symbol: one traversal
/// renumbering per automorphism class representative.
pub fn sub_canonical_forms(ds: &impl DelaneySymbol) -> Vec<DSymbol> {
    first_representatives(ds)
        .into_iter()
        .map(|seed| {
            let (old_to_new, _) = orbits::traversal_numbering(ds, seed);
            canonical::renumbered(ds, &old_to_new)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsym::DynamicSymbol;

    #[test]
    fn multiplicities_group_isomorphic_components() {
        let a = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let b = DSymbol::parse("1:1,1,1:4,3").unwrap();
        let mut coll = DynamicSymbol::new(2);
        coll.append(&a);
        coll.append(&b);
        coll.append(&a);
        let groups = component_multiplicities(&coll);
        assert_eq!(groups.len(), 2);
        let counts: Vec<usize> = groups.iter().map(|(_, n)| *n).collect();
        assert!(counts.contains(&2) && counts.contains(&1));
    }

    #[test]
    fn transitive_component_has_one_form() {
        // All four chambers of the square face are equivalent, so a
        // single labelled form suffices.
        let square = DSymbol::parse("4:2 4,4 3,0 0 0 0:4,0 0").unwrap();
        assert_eq!(first_representatives(&square), vec![1]);
        assert_eq!(sub_canonical_forms(&square).len(), 1);
    }

    #[test]
    fn asymmetric_component_has_one_form_per_element_class() {
        // Branching 6 on one chamber, 3 on the other: no automorphism
        // can swap them, so both are entry classes.
        let ds = DSymbol::parse("2:1 2,1 2,2:6 3,4").unwrap();
        assert_eq!(first_representatives(&ds), vec![1, 2]);
        let forms = sub_canonical_forms(&ds);
        assert_eq!(forms.len(), 2);
        assert_ne!(forms[0], forms[1]);
        // Forms are relabelings of the same symbol.
        assert_eq!(
            canonical::canonical_form(&forms[0]),
            canonical::canonical_form(&forms[1])
        );
    }

    #[test]
    fn library_counts_copies_and_interns_entry_signatures() {
        let tile = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let mut coll = DynamicSymbol::new(2);
        coll.append(&tile);
        coll.append(&tile);
        let mut cache = SignatureCache::new();
        let library = ComponentLibrary::build(&coll, 1, &mut cache);
        assert_eq!(library.types.len(), 1);
        assert_eq!(library.types[0].multiplicity, 2);
        assert_eq!(library.types[0].forms.len(), 1);
        assert_eq!(library.initial_counters(), vec![2]);
    }
}
