// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Delaney morphisms and automorphisms.
//!
//! A morphism is determined by the image of a single element: it grows
//! breadth-first along the neighbor operations and fails on the first
//! inconsistency. Source and target must agree on definedness and on
//! branching values along the way. For connected symbols of equal size
//! the result is a bijection.

use crate::dsym::{DelaneySymbol, Elem};

/// The morphism mapping `seed_src` to `seed_dst`, as a source-indexed
/// image table, or `None` if no such morphism exists. The source must
/// be connected.
pub fn morphism(
    src: &impl DelaneySymbol,
    dst: &impl DelaneySymbol,
    seed_src: Elem,
    seed_dst: Elem,
) -> Option<Vec<Elem>> {
    if src.dim() != dst.dim() || src.size() != dst.size() {
        return None;
    }
    let mut image = vec![0; src.size() + 1];
    image[seed_src as usize] = seed_dst;
    let mut queue = vec![seed_src];
    let mut head = 0;
    while head < queue.len() {
        let d = queue[head];
        head += 1;
        let e = image[d as usize];
        for i in 0..src.dim() {
            if src.v(i, d) != dst.v(i, e) {
                return None;
            }
        }
        for i in 0..=src.dim() {
            match (src.op(i, d), dst.op(i, e)) {
                (None, None) => {}
                (Some(d2), Some(e2)) => {
                    let known = image[d2 as usize];
                    if known == 0 {
                        image[d2 as usize] = e2;
                        queue.push(d2);
                    } else if known != e2 {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
    debug_assert_eq!(queue.len(), src.size(), "source must be connected");
    Some(image)
}

/// All automorphisms of a connected symbol, as image tables. The
/// identity comes first.
pub fn automorphisms(ds: &impl DelaneySymbol) -> Vec<Vec<Elem>> {
    let mut out = Vec::new();
    for d in ds.elements() {
        if let Some(map) = morphism(ds, ds, 1, d) {
            out.push(map);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsym::DSymbol;

    #[test]
    fn identity_is_always_an_automorphism() {
        let ds = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let autos = automorphisms(&ds);
        assert_eq!(autos.len(), 1);
        assert_eq!(autos[0], vec![0, 1]);
    }

    #[test]
    fn symmetric_pair_has_a_swap() {
        let ds = DSymbol::parse("2:1 2,1 2,2:0,0").unwrap();
        let autos = automorphisms(&ds);
        assert_eq!(autos.len(), 2);
        assert_eq!(autos[1], vec![0, 2, 1]);
    }

    #[test]
    fn branching_breaks_the_swap() {
        let ds = DSymbol::parse("2:1 2,1 2,2:6 3,4").unwrap();
        assert_eq!(automorphisms(&ds).len(), 1);
        assert!(morphism(&ds, &ds, 1, 2).is_none());
    }
}
