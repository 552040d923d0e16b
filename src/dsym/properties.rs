// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Numeric and topological properties used for admissibility pruning:
//! properness, exact curvature, sphericity, oriented covers, and the 3D
//! local-euclidicity tests.
//!
//! Curvature is computed in exact rational arithmetic. The searches cut
//! on comparisons like `K >= 0`, and a float rendition would mistake a
//! flat orbit for a hyperbolic one (or vice versa) at the worst possible
//! moment.

use num_rational::Ratio;
use num_traits::Zero;

use crate::dsym::symbol::DSymbol;
use crate::dsym::{canonical, orbits, DelaneySymbol, Elem};

pub type Rational = Ratio<i64>;

/// True if all non-adjacent operation pairs interact dihedrally, i.e.
/// r(i,j) divides 2 everywhere. Requires complete operations.
pub fn is_proper(ds: &impl DelaneySymbol) -> bool {
    for i in 0..ds.dim() {
        for j in i + 2..=ds.dim() {
            for d in ds.elements() {
                match orbits::r(ds, i, j, d) {
                    Some(r) if r <= 2 => {}
                    _ => return false,
                }
            }
        }
    }
    true
}

/// The curvature of a 2-dimensional symbol:
/// K = Σ_D (1/m01 + 1/m12 + 1/m02) − size.
///
/// With `undefined_as_one` set, orbits without a branching value
/// contribute as if v = 1, which yields the maximal possible curvature
/// of any completion; otherwise an undefined value makes the result
/// `None`. Improper symbols and symbols with undefined operations also
/// yield `None`.
pub fn curvature_2d(ds: &impl DelaneySymbol, undefined_as_one: bool) -> Option<Rational> {
    debug_assert_eq!(ds.dim(), 2);
    let mut total = Rational::from_integer(-(ds.size() as i64));
    for d in ds.elements() {
        for i in 0..2 {
            let r = orbits::r(ds, i, i + 1, d)?;
            let v = match ds.v(i, d) {
                Some(value) => value as usize,
                None if undefined_as_one => 1,
                None => return None,
            };
            total += Rational::new(1, (v * r) as i64);
        }
        let r02 = orbits::r(ds, 0, 2, d)?;
        if r02 > 2 {
            return None;
        }
        total += Rational::new(1, 2);
    }
    Some(total)
}

/// The oriented double cover: the symbol itself when it is oriented,
/// otherwise the two-sheet cover in which every operation switches
/// sheets. Requires complete operations.
pub fn oriented_cover(ds: &impl DelaneySymbol) -> DSymbol {
    let size = ds.size();
    if orbits::is_oriented(ds) {
        return canonical::renumbered(ds, &(0..=size as Elem).collect::<Vec<_>>());
    }
    let n = size as Elem;
    let mut out = DSymbol::new(ds.dim(), 2 * size);
    for d in ds.elements() {
        for i in 0..=ds.dim() {
            if let Some(e) = ds.op(i, d) {
                out.set_op_pair(i, d, e + n);
            }
        }
        for i in 0..ds.dim() {
            if let Some(value) = ds.v(i, d) {
                out.set_v(i, d, value);
                out.set_v(i, d + n, value);
            }
        }
    }
    out
}

/// True if a complete, connected 2-dimensional symbol describes a
/// sphere: positive curvature and no bad orbifold (a single cone point,
/// or exactly two cone points of different order, on the oriented
/// cover).
pub fn is_spherical_2d(ds: &impl DelaneySymbol) -> bool {
    debug_assert_eq!(ds.dim(), 2);
    let positive = match curvature_2d(ds, false) {
        Some(k) => k > Rational::zero(),
        None => false,
    };
    if !positive {
        return false;
    }
    let cover = oriented_cover(ds);
    let mut cones: Vec<usize> = Vec::new();
    for (i, j) in [(0usize, 1usize), (1, 2), (0, 2)] {
        for d in orbits::orbit_reps(&cover, &[i, j]) {
            let v = if j == i + 1 {
                cover.v(i, d).map(|value| value as usize)
            } else {
                // Non-adjacent pair: the branching is implied by m = 2.
                orbits::r(&cover, i, j, d).map(|r| 2 / r)
            };
            match v {
                Some(v) if v > 1 => cones.push(v),
                Some(_) => {}
                None => return false,
            }
        }
    }
    match cones.as_slice() {
        [_] => false,
        [a, b] if a != b => false,
        _ => true,
    }
}

/// True if every tile and vertex figure of a 3-dimensional symbol is
/// spherical. Requires complete operations and branching.
pub fn is_locally_euclidean_3d(ds: &impl DelaneySymbol) -> bool {
    debug_assert_eq!(ds.dim(), 3);
    for (lo, hi) in [(0usize, 2usize), (1, 3)] {
        let indices: Vec<usize> = (lo..=hi).collect();
        for seed in orbits::orbit_reps(ds, &indices) {
            let (sub, _) = orbits::orbit_symbol(ds, lo, hi, seed);
            if !is_spherical_2d(&sub) {
                return false;
            }
        }
    }
    true
}

/// True if the partial branching of a 3-dimensional symbol can still be
/// completed to a locally euclidean one: every tile and vertex figure
/// has positive maximal curvature. Requires complete operations.
pub fn may_become_locally_euclidean_3d(ds: &impl DelaneySymbol) -> bool {
    debug_assert_eq!(ds.dim(), 3);
    for (lo, hi) in [(0usize, 2usize), (1, 3)] {
        let indices: Vec<usize> = (lo..=hi).collect();
        for seed in orbits::orbit_reps(ds, &indices) {
            let (sub, _) = orbits::orbit_symbol(ds, lo, hi, seed);
            match curvature_2d(&sub, true) {
                Some(k) if k > Rational::zero() => {}
                _ => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curvature_of_the_tetrahedron_chamber() {
        let ds = DSymbol::parse("1:1,1,1:3,3").unwrap();
        assert_eq!(curvature_2d(&ds, false), Some(Rational::new(1, 6)));
        assert!(is_spherical_2d(&ds));
    }

    #[test]
    fn flat_and_hyperbolic_chambers() {
        let flat = DSymbol::parse("1:1,1,1:6,3").unwrap();
        assert_eq!(curvature_2d(&flat, false), Some(Rational::zero()));
        assert!(!is_spherical_2d(&flat));
        let hyper = DSymbol::parse("1:1,1,1:7,3").unwrap();
        assert!(curvature_2d(&hyper, false).unwrap() < Rational::zero());
    }

    #[test]
    fn undefined_branching_counts_as_one_only_on_request() {
        let ds = DSymbol::parse("1:1,1,1:0,3").unwrap();
        assert_eq!(curvature_2d(&ds, false), None);
        // v01 = 1 gives K = 1 + 1/3 + 1/2 - 1 = 5/6.
        assert_eq!(curvature_2d(&ds, true), Some(Rational::new(5, 6)));
    }

    #[test]
    fn bad_orbifold_is_not_spherical() {
        // The teardrop: positive curvature, but its oriented cover has
        // cone points of orders 3 and 2 only.
        let ds = DSymbol::parse("1:1,1,1:1,3").unwrap();
        let k = curvature_2d(&ds, false).unwrap();
        assert!(k > Rational::zero());
        assert!(!is_spherical_2d(&ds));
    }

    #[test]
    fn dihedral_triangle_orbifold_is_spherical() {
        let ds = DSymbol::parse("2:2,1 2,2:4,2").unwrap();
        assert!(is_spherical_2d(&ds));
    }

    #[test]
    fn oriented_cover_doubles_unoriented_symbols() {
        let ds = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let cover = oriented_cover(&ds);
        assert_eq!(cover.size(), 2);
        assert!(orbits::is_oriented(&cover));
        assert_eq!(cover.v(0, 2), Some(3));
    }

    #[test]
    fn local_euclidicity_of_a_one_tile_extension() {
        // One chamber, all operations trivial except the extension; the
        // branching v23 decides local euclidicity.
        let good = DSymbol::parse("1 3:1,1,1,1:3,3,4").unwrap();
        assert!(may_become_locally_euclidean_3d(&good));
        assert!(is_locally_euclidean_3d(&good));
        let bad = DSymbol::parse("1 3:1,1,1,1:3,3,8").unwrap();
        assert!(!is_locally_euclidean_3d(&bad));
    }
}
