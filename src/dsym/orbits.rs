// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Orbits, traversals and the derived quantities r and m.
//!
//! An orbit is the closure of an element under a chosen set of neighbor
//! indices. Orbits partition the elements and are the combinatorial
//! counterpart of tiles, faces and vertex figures. All functions here
//! tolerate partially defined operations: undefined neighbors simply end
//! a walk.

use crate::dsym::symbol::DSymbol;
use crate::dsym::{DelaneySymbol, Elem};

/// The orbit of `seed` under the given indices, in breadth-first
/// discovery order (the seed comes first). The order is deterministic:
/// elements are expanded in discovery order and indices in ascending
/// order.
pub fn orbit(ds: &impl DelaneySymbol, indices: &[usize], seed: Elem) -> Vec<Elem> {
    let mut found = vec![false; ds.size() + 1];
    let mut queue = vec![seed];
    found[seed as usize] = true;
    let mut head = 0;
    while head < queue.len() {
        let d = queue[head];
        head += 1;
        for &i in indices {
            if let Some(e) = ds.op(i, d) {
                if !found[e as usize] {
                    found[e as usize] = true;
                    queue.push(e);
                }
            }
        }
    }
    queue
}

/// One representative per orbit, each the smallest element of its orbit,
/// in ascending order.
pub fn orbit_reps(ds: &impl DelaneySymbol, indices: &[usize]) -> Vec<Elem> {
    let mut seen = vec![false; ds.size() + 1];
    let mut reps = Vec::new();
    for d in ds.elements() {
        if seen[d as usize] {
            continue;
        }
        reps.push(d);
        for e in orbit(ds, indices, d) {
            seen[e as usize] = true;
        }
    }
    reps
}

/// True if the whole symbol is one orbit under all of its indices.
pub fn is_connected(ds: &impl DelaneySymbol) -> bool {
    if ds.size() == 0 {
        return true;
    }
    let indices: Vec<usize> = (0..=ds.dim()).collect();
    orbit(ds, &indices, 1).len() == ds.size()
}

/// The number of alternating (i, j) double steps that lead from `d` back
/// to itself, or `None` if the walk runs into an undefined neighbor.
pub fn r(ds: &impl DelaneySymbol, i: usize, j: usize, d: Elem) -> Option<usize> {
    let mut e = d;
    let mut count = 0;
    loop {
        e = ds.op(i, e)?;
        e = ds.op(j, e)?;
        count += 1;
        if e == d {
            return Some(count);
        }
    }
}

/// m = v·r for the consecutive pair (i, i+1), or `None` if either part
/// is undefined.
pub fn m(ds: &impl DelaneySymbol, i: usize, d: Elem) -> Option<usize> {
    let value = ds.v(i, d)?;
    let steps = r(ds, i, i + 1, d)?;
    Some(value as usize * steps)
}

/// True if no element of the orbit is fixed by one of the indices.
pub fn orbit_is_loopless(ds: &impl DelaneySymbol, indices: &[usize], seed: Elem) -> bool {
    orbit(ds, indices, seed)
        .into_iter()
        .all(|d| indices.iter().all(|&i| ds.op(i, d) != Some(d)))
}

/// True if the orbit admits a 2-coloring in which every defined neighbor
/// relation connects different colors.
pub fn orbit_is_oriented(ds: &impl DelaneySymbol, indices: &[usize], seed: Elem) -> bool {
    let mut color = vec![0i8; ds.size() + 1];
    color[seed as usize] = 1;
    let mut queue = vec![seed];
    let mut head = 0;
    while head < queue.len() {
        let d = queue[head];
        head += 1;
        for &i in indices {
            if let Some(e) = ds.op(i, d) {
                if color[e as usize] == 0 {
                    color[e as usize] = -color[d as usize];
                    queue.push(e);
                } else if color[e as usize] == color[d as usize] {
                    return false;
                }
            }
        }
    }
    true
}

/// True if the symbol as a whole is oriented.
pub fn is_oriented(ds: &impl DelaneySymbol) -> bool {
    let indices: Vec<usize> = (0..=ds.dim()).collect();
    orbit_reps(ds, &indices)
        .into_iter()
        .all(|d| orbit_is_oriented(ds, &indices, d))
}

/// Number the elements reachable from `seed` in traversal order.
///
/// Returns `(old_to_new, new_to_old)`; unreached elements map to 0, and
/// `new_to_old[0]` is a sentinel. The traversal expands elements in
/// their new numbering order and indices in ascending order, so the
/// numbering depends only on the seed and the symbol's structure, never
/// on the labels of the other elements.
pub fn traversal_numbering(ds: &impl DelaneySymbol, seed: Elem) -> (Vec<Elem>, Vec<Elem>) {
    let mut old_to_new = vec![0; ds.size() + 1];
    let mut new_to_old = vec![0];
    old_to_new[seed as usize] = 1;
    new_to_old.push(seed);
    let mut head = 1;
    while head < new_to_old.len() {
        let d = new_to_old[head];
        head += 1;
        for i in 0..=ds.dim() {
            if let Some(e) = ds.op(i, d) {
                if old_to_new[e as usize] == 0 {
                    old_to_new[e as usize] = new_to_old.len() as Elem;
                    new_to_old.push(e);
                }
            }
        }
    }
    (old_to_new, new_to_old)
}

/// Extract the orbit of `seed` under the contiguous index range
/// `lo..=hi` as a standalone symbol of dimension `hi - lo`, together
/// with the map from new element ids back to the original ones.
pub fn orbit_symbol(
    ds: &impl DelaneySymbol,
    lo: usize,
    hi: usize,
    seed: Elem,
) -> (DSymbol, Vec<Elem>) {
    debug_assert!(lo <= hi && hi <= ds.dim());
    let indices: Vec<usize> = (lo..=hi).collect();
    let members = orbit(ds, &indices, seed);
    let mut old_to_sub = vec![0; ds.size() + 1];
    for (k, &d) in members.iter().enumerate() {
        old_to_sub[d as usize] = (k + 1) as Elem;
    }
    let sub_dim = hi - lo;
    let size = members.len();
    let mut op = vec![vec![0; size + 1]; sub_dim + 1];
    let mut v = vec![vec![0; size + 1]; sub_dim];
    for (k, &d) in members.iter().enumerate() {
        let sd = k + 1;
        for idx in 0..=sub_dim {
            if let Some(e) = ds.op(lo + idx, d) {
                op[idx][sd] = old_to_sub[e as usize];
            }
        }
        for idx in 0..sub_dim {
            if let Some(value) = ds.v(lo + idx, d) {
                v[idx][sd] = value;
            }
        }
    }
    let mut sub_to_old = vec![0];
    sub_to_old.extend(members);
    (DSymbol::from_tables(sub_dim, size, op, v), sub_to_old)
}
