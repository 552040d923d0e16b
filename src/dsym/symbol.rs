// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The immutable flat symbol and its linear text notation.
//!
//! The notation is the classic one used for exchanging symbols between
//! programs: `size dim:op-lists:m-lists`, where the dimension is omitted
//! when it is 2. Each op section lists, per neighbor index, one value for
//! every element not already covered as the image of a smaller element;
//! each m section lists m = v·r once per `{i, i+1}`-orbit in order of the
//! orbit's smallest element. `0` marks an undefined entry on both sides.
//! An id prefix and angle brackets (`<1.1: … >`) are accepted on input
//! and ignored.

use std::fmt;
use std::str::FromStr;

use crate::dsym::{orbits, DelaneySymbol, Elem};
use crate::errors::{Error, Result};

/// An immutable Delaney-Dress symbol backed by plain integer tables.
///
/// `op[i][d]` is the `i`-neighbor of `d` (0 = undefined) and `v[i][d]`
/// the branching value of the `{i, i+1}`-orbit of `d` (0 = undefined).
/// Index 0 of every row is an unused sentinel so elements can be used as
/// indices directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DSymbol {
    dim: usize,
    size: usize,
    op: Vec<Vec<Elem>>,
    v: Vec<Vec<u16>>,
}

impl DSymbol {
    /// Create a symbol with all operations and branching undefined.
    pub fn new(dim: usize, size: usize) -> Self {
        Self {
            dim,
            size,
            op: vec![vec![0; size + 1]; dim + 1],
            v: vec![vec![0; size + 1]; dim],
        }
    }

    pub(crate) fn from_tables(dim: usize, size: usize, op: Vec<Vec<Elem>>, v: Vec<Vec<u16>>) -> Self {
        debug_assert_eq!(op.len(), dim + 1);
        debug_assert_eq!(v.len(), dim);
        debug_assert!(op.iter().all(|row| row.len() == size + 1));
        Self { dim, size, op, v }
    }

    pub(crate) fn set_op_pair(&mut self, i: usize, d: Elem, e: Elem) {
        self.op[i][d as usize] = e;
        self.op[i][e as usize] = d;
    }

    pub(crate) fn set_v(&mut self, i: usize, d: Elem, value: u16) {
        self.v[i][d as usize] = value;
    }

    /// Parse the linear notation. Equivalent to the `FromStr` impl.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    /// The dual symbol: neighbor indices reversed, so tiles and vertices
    /// swap roles. An involution up to equality of tables.
    pub fn dual(&self) -> DSymbol {
        let dim = self.dim;
        let op = (0..=dim).map(|i| self.op[dim - i].clone()).collect();
        let v = (0..dim).map(|i| self.v[dim - 1 - i].clone()).collect();
        DSymbol::from_tables(dim, self.size, op, v)
    }
}

impl DelaneySymbol for DSymbol {
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

impl FromStr for DSymbol {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut text = input.trim();
        if text.starts_with('<') && text.ends_with('>') {
            text = text[1..text.len() - 1].trim();
        }
        let parts: Vec<&str> = text.split(':').map(str::trim).collect();
        let (head, ops_part, vs_part) = match parts.len() {
            3 => (parts[0], parts[1], parts[2]),
            4 => (parts[1], parts[2], parts[3]),
            n => {
                return Err(Error::Parse(format!(
                    "expected 3 sections separated by ':', found {}",
                    n.saturating_sub(1)
                )))
            }
        };

        let mut head_nums = head.split_whitespace();
        let size: usize = head_nums
            .next()
            .ok_or_else(|| Error::Parse("missing size".into()))?
            .parse()
            .map_err(|_| Error::Parse(format!("bad size in {head:?}")))?;
        let dim: usize = match head_nums.next() {
            Some(word) => word
                .parse()
                .map_err(|_| Error::Parse(format!("bad dimension in {head:?}")))?,
            None => 2,
        };
        if size == 0 {
            return Err(Error::Parse("symbol must have at least one element".into()));
        }

        let mut ds = DSymbol::new(dim, size);

        let op_lists: Vec<&str> = ops_part.split(',').collect();
        if op_lists.len() != dim + 1 {
            return Err(Error::Parse(format!(
                "expected {} op lists, found {}",
                dim + 1,
                op_lists.len()
            )));
        }
        for (i, list) in op_lists.iter().enumerate() {
            let mut values = list.split_whitespace();
            let mut seen = vec![false; size + 1];
            for d in 1..=size as Elem {
                if seen[d as usize] {
                    continue;
                }
                let word = values
                    .next()
                    .ok_or_else(|| Error::Parse(format!("op list {i} is too short")))?;
                let e: Elem = word
                    .parse()
                    .map_err(|_| Error::Parse(format!("bad op value {word:?}")))?;
                seen[d as usize] = true;
                if e == 0 {
                    continue;
                }
                if e < d || e as usize > size {
                    return Err(Error::Parse(format!(
                        "op_{i}({d}) = {e} is out of range"
                    )));
                }
                seen[e as usize] = true;
                ds.set_op_pair(i, d, e);
            }
            if values.next().is_some() {
                return Err(Error::Parse(format!("op list {i} is too long")));
            }
        }

        let v_lists: Vec<&str> = vs_part.split(',').collect();
        if v_lists.len() != dim {
            return Err(Error::Parse(format!(
                "expected {} branching lists, found {}",
                dim,
                v_lists.len()
            )));
        }
        for (i, list) in v_lists.iter().enumerate() {
            let mut values = list.split_whitespace();
            let mut seen = vec![false; size + 1];
            for d in 1..=size as Elem {
                if seen[d as usize] {
                    continue;
                }
                let orbit = orbits::orbit(&ds, &[i, i + 1], d);
                for &e in &orbit {
                    seen[e as usize] = true;
                }
                let word = values
                    .next()
                    .ok_or_else(|| Error::Parse(format!("branching list {i} is too short")))?;
                let m: usize = word
                    .parse()
                    .map_err(|_| Error::Parse(format!("bad branching value {word:?}")))?;
                if m == 0 {
                    continue;
                }
                let r = orbits::r(&ds, i, i + 1, d).ok_or_else(|| {
                    Error::Parse(format!(
                        "m_{i}({d}) given but the {{{i},{}}}-orbit is incomplete",
                        i + 1
                    ))
                })?;
                if m % r != 0 {
                    return Err(Error::Parse(format!(
                        "m_{i}({d}) = {m} is not a multiple of the orbit length {r}"
                    )));
                }
                let value = (m / r) as u16;
                for &e in &orbit {
                    ds.set_v(i, e, value);
                }
            }
            if values.next().is_some() {
                return Err(Error::Parse(format!("branching list {i} is too long")));
            }
        }

        Ok(ds)
    }
}

impl fmt::Display for DSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.size)?;
        if self.dim != 2 {
            write!(f, " {}", self.dim)?;
        }
        write!(f, ":")?;
        for i in 0..=self.dim {
            if i > 0 {
                write!(f, ",")?;
            }
            let mut seen = vec![false; self.size + 1];
            let mut first = true;
            for d in 1..=self.size as Elem {
                if seen[d as usize] {
                    continue;
                }
                seen[d as usize] = true;
                let e = self.op[i][d as usize];
                if e != 0 {
                    seen[e as usize] = true;
                }
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                write!(f, "{e}")?;
            }
        }
        write!(f, ":")?;
        for i in 0..self.dim {
            if i > 0 {
                write!(f, ",")?;
            }
            let mut seen = vec![false; self.size + 1];
            let mut first = true;
            for d in 1..=self.size as Elem {
                if seen[d as usize] {
                    continue;
                }
                for e in orbits::orbit(self, &[i, i + 1], d) {
                    seen[e as usize] = true;
                }
                let m = match (self.v(i, d), orbits::r(self, i, i + 1, d)) {
                    (Some(value), Some(r)) => value as usize * r,
                    _ => 0,
                };
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                write!(f, "{m}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_one_element_tile() {
        let ds = DSymbol::parse("1:1,1,1:3,3").unwrap();
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.size(), 1);
        assert_eq!(ds.op(0, 1), Some(1));
        assert_eq!(ds.op(2, 1), Some(1));
        assert_eq!(ds.v(0, 1), Some(3));
        assert_eq!(ds.v(1, 1), Some(3));
    }

    #[test]
    fn parse_explicit_dimension_and_undefined_branching() {
        let ds = DSymbol::parse("1 3:1,1,1,1:3,3,0").unwrap();
        assert_eq!(ds.dim(), 3);
        assert_eq!(ds.op(3, 1), Some(1));
        assert_eq!(ds.v(2, 1), None);
    }

    #[test]
    fn parse_accepts_wrapped_form() {
        let plain = DSymbol::parse("2:2,1 2,2:2,4").unwrap();
        let wrapped = DSymbol::parse("<1.1:2:2,1 2,2:2,4>").unwrap();
        assert_eq!(plain, wrapped);
        assert_eq!(wrapped.op(0, 1), Some(2));
        assert_eq!(wrapped.op(1, 2), Some(2));
        // m = 2 on the two-element {0,1}-orbit means v = 1.
        assert_eq!(wrapped.v(0, 1), Some(1));
        assert_eq!(wrapped.v(1, 1), Some(4));
    }

    #[test]
    fn display_round_trips() {
        for text in ["1:1,1,1:3,3", "1 3:1,1,1,1:3,3,0", "2:2,1 2,2:2,4"] {
            let ds = DSymbol::parse(text).unwrap();
            assert_eq!(ds.to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(DSymbol::parse("").is_err());
        assert!(DSymbol::parse("1:1,1:3,3").is_err());
        assert!(DSymbol::parse("2:3,1 2,2:2,4").is_err());
        assert!(DSymbol::parse("1:1,1,1:4,3 3").is_err());
    }

    #[test]
    fn dual_swaps_tiles_and_vertices() {
        let ds = DSymbol::parse("1:1,1,1:4,3").unwrap();
        let dual = ds.dual();
        assert_eq!(dual.v(0, 1), Some(3));
        assert_eq!(dual.v(1, 1), Some(4));
        assert_eq!(dual.dual(), ds);
    }
}
