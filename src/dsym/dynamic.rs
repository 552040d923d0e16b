// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The mutable symbol a search operates on.
//!
//! A `DynamicSymbol` supports the exact operations the searches need and
//! nothing more: defining and undefining one neighbor relation at a
//! time, appending a whole component above the current maximum element,
//! and removing elements followed by a deterministic renumbering. The
//! renumbering preserves the relative order of surviving elements, so
//! removing exactly the elements a previous `append` added restores the
//! tables bit for bit. That exactness is what the engine's undo relies
//! on.
//!
//! Every mutation here invalidates any signature map or canonicity
//! verdict computed for the previous state; the searches recompute those
//! after each successful move.

use crate::dsym::{orbits, DelaneySymbol, DSymbol, Elem};

/// Attempting to define a relation that is already defined differently.
/// Recoverable by construction: the engine rejects the move and tries
/// the next alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSymbol {
    dim: usize,
    size: usize,
    op: Vec<Vec<Elem>>,
    v: Vec<Vec<u16>>,
    dead: Vec<bool>,
}

impl DynamicSymbol {
    /// An empty symbol of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            size: 0,
            op: vec![vec![0]; dim + 1],
            v: vec![vec![0]; dim],
            dead: vec![false],
        }
    }

    /// A mutable copy of a flat symbol.
    pub fn from_symbol(ds: &DSymbol) -> Self {
        let mut out = Self::new(ds.dim());
        out.append(ds);
        out
    }

    /// Append all elements of `component`, renumbered to start just
    /// above the current maximum. The component may have a smaller
    /// dimension; its missing operations stay undefined.
    pub fn append(&mut self, component: &DSymbol) {
        debug_assert!(component.dim() <= self.dim);
        let offset = self.size as Elem;
        for i in 0..=self.dim {
            for d in 1..=component.size() as Elem {
                let e = if i <= component.dim() {
                    component.op(i, d).map_or(0, |e| e + offset)
                } else {
                    0
                };
                self.op[i].push(e);
            }
        }
        for i in 0..self.dim {
            for d in 1..=component.size() as Elem {
                let value = if i < component.dim() {
                    component.v(i, d).unwrap_or(0)
                } else {
                    0
                };
                self.v[i].push(value);
            }
        }
        self.dead.resize(self.dead.len() + component.size(), false);
        self.size += component.size();
    }

    /// Define `op_i(d) = e` (and the converse). A no-op if the relation
    /// already holds; a [`Conflict`] if either side is defined
    /// differently.
    pub fn define_op(&mut self, i: usize, d: Elem, e: Elem) -> Result<(), Conflict> {
        let cur_d = self.op[i][d as usize];
        let cur_e = self.op[i][e as usize];
        if cur_d == e && cur_e == d {
            return Ok(());
        }
        if cur_d != 0 || cur_e != 0 {
            return Err(Conflict);
        }
        self.op[i][d as usize] = e;
        self.op[i][e as usize] = d;
        Ok(())
    }

    /// Remove both directions of `op_i` at `d`, if defined.
    pub fn undefine_op(&mut self, i: usize, d: Elem) {
        let e = self.op[i][d as usize];
        if e != 0 {
            self.op[i][e as usize] = 0;
            self.op[i][d as usize] = 0;
        }
    }

    /// Set the branching value on the whole `{i, i+1}`-orbit of `d`.
    pub fn redefine_v(&mut self, i: usize, d: Elem, value: u16) {
        for e in orbits::orbit(self, &[i, i + 1], d) {
            self.v[i][e as usize] = value;
        }
    }

    /// Clear the branching value on the whole `{i, i+1}`-orbit of `d`.
    pub fn undefine_v(&mut self, i: usize, d: Elem) {
        self.redefine_v(i, d, 0);
    }

    /// Detach `d` from all of its neighbors and mark it for removal.
    /// The element keeps its id until the next [`renumber`](Self::renumber).
    pub fn remove_element(&mut self, d: Elem) {
        for i in 0..=self.dim {
            self.undefine_op(i, d);
        }
        for i in 0..self.dim {
            self.v[i][d as usize] = 0;
        }
        self.dead[d as usize] = true;
    }

    /// Compact the element ids, dropping removed elements and keeping
    /// the relative order of the rest.
    pub fn renumber(&mut self) {
        let mut old_to_new = vec![0; self.size + 1];
        let mut next = 0;
        for d in 1..=self.size {
            if !self.dead[d] {
                next += 1;
                old_to_new[d] = next as Elem;
            }
        }
        for i in 0..=self.dim {
            let mut row = vec![0; next + 1];
            for d in 1..=self.size {
                if !self.dead[d] {
                    let e = self.op[i][d];
                    row[old_to_new[d] as usize] = if e == 0 { 0 } else { old_to_new[e as usize] };
                }
            }
            self.op[i] = row;
        }
        for i in 0..self.dim {
            let mut row = vec![0; next + 1];
            for d in 1..=self.size {
                if !self.dead[d] {
                    row[old_to_new[d] as usize] = self.v[i][d];
                }
            }
            self.v[i] = row;
        }
        self.size = next;
        self.dead = vec![false; next + 1];
    }

    /// An immutable snapshot of the current state.
    pub fn flatten(&self) -> DSymbol {
        debug_assert!(self.dead.iter().all(|&dead| !dead));
        DSymbol::from_tables(self.dim, self.size, self.op.clone(), self.v.clone())
    }
}

impl DelaneySymbol for DynamicSymbol {
    fn dim(&self) -> usize {
        self.dim
    }

    fn size(&self) -> usize {
        self.size
    }

    fn op(&self, i: usize, d: Elem) -> Option<Elem> {
        match self.op.get(i).and_then(|row| row.get(d as usize)) {
            Some(&e) if e != 0 => Some(e),
            _ => None,
        }
    }

    fn v(&self, i: usize, d: Elem) -> Option<u16> {
        match self.v.get(i).and_then(|row| row.get(d as usize)) {
            Some(&value) if value != 0 => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tile() -> DSymbol {
        DSymbol::parse("1:1,1,1:3,3").unwrap()
    }

    #[test]
    fn append_renumbers_above_current_maximum() {
        let mut ds = DynamicSymbol::new(3);
        ds.append(&tile());
        ds.append(&tile());
        assert_eq!(ds.size(), 2);
        assert_eq!(ds.op(0, 2), Some(2));
        assert_eq!(ds.op(3, 2), None);
        assert_eq!(ds.v(0, 2), Some(3));
        assert_eq!(ds.v(2, 2), None);
    }

    #[test]
    fn define_op_is_an_involution_with_conflicts() {
        let mut ds = DynamicSymbol::new(3);
        ds.append(&tile());
        ds.append(&tile());
        assert_eq!(ds.define_op(3, 1, 2), Ok(()));
        assert_eq!(ds.op(3, 2), Some(1));
        // Defining the same relation again is a no-op.
        assert_eq!(ds.define_op(3, 1, 2), Ok(()));
        assert_eq!(ds.define_op(3, 1, 1), Err(Conflict));
        ds.undefine_op(3, 2);
        assert_eq!(ds.op(3, 1), None);
        assert_eq!(ds.define_op(3, 1, 1), Ok(()));
    }

    #[test]
    fn remove_and_renumber_invert_append_exactly() {
        let mut ds = DynamicSymbol::new(3);
        ds.append(&tile());
        let before = ds.clone();
        ds.append(&tile());
        let _ = ds.define_op(3, 1, 2);
        ds.undefine_op(3, 1);
        ds.remove_element(2);
        ds.renumber();
        assert_eq!(ds, before);
    }

    #[test]
    fn redefine_v_covers_the_orbit() {
        let two = DSymbol::parse("2:2,1 2,2:0,0").unwrap();
        let mut ds = DynamicSymbol::from_symbol(&two);
        ds.redefine_v(0, 1, 4);
        assert_eq!(ds.v(0, 2), Some(4));
        ds.undefine_v(0, 2);
        assert_eq!(ds.v(0, 1), None);
    }

    proptest! {
        /// Any sequence of joins on a pool of components, undone in
        /// reverse, restores the store bit for bit.
        #[test]
        fn joins_undo_exactly(pairs in prop::collection::vec((1u32..=4, 1u32..=4), 0..12)) {
            let mut ds = DynamicSymbol::new(3);
            for _ in 0..4 {
                ds.append(&tile());
            }
            let before = ds.clone();
            let mut performed = Vec::new();
            for (d, e) in pairs {
                if ds.define_op(3, d, e).is_ok() && ds.op(3, d) == Some(e) {
                    if !performed.contains(&d) && !performed.contains(&e) {
                        performed.push(d);
                    }
                }
            }
            for &d in performed.iter().rev() {
                ds.undefine_op(3, d);
            }
            prop_assert_eq!(ds, before);
        }
    }
}
