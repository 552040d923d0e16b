// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Checkpoint tokens: serializable descriptions of a search path.
//!
//! A token lists, for every open choice point from the outermost to the
//! innermost, the ordinal of the decision currently taken there. Tokens
//! are totally ordered by the lexicographic order of those ordinals,
//! which coincides with the order in which a depth-first search visits
//! the corresponding states. Splitting an enumeration into contiguous
//! token ranges therefore yields non-overlapping sections that together
//! cover the whole search space.

use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckpointToken {
    levels: Vec<u32>,
}

impl CheckpointToken {
    pub fn new(levels: Vec<u32>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl fmt::Display for CheckpointToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.levels.is_empty() {
            return write!(f, "-");
        }
        for (k, level) in self.levels.iter().enumerate() {
            if k > 0 {
                write!(f, "-")?;
            }
            write!(f, "{level}")?;
        }
        Ok(())
    }
}

impl FromStr for CheckpointToken {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let text = text.trim();
        if text.is_empty() || text == "-" {
            return Ok(Self::default());
        }
        let mut levels = Vec::new();
        for word in text.split('-') {
            let level: u32 = word
                .parse()
                .map_err(|_| Error::BadResumeToken(text.to_string()))?;
            if level == 0 {
                return Err(Error::BadResumeToken(text.to_string()));
            }
            levels.push(level);
        }
        Ok(Self { levels })
    }
}
