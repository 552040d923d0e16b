// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Crate-level error type.
//!
//! Only boundary failures live here: malformed input text, seed symbols
//! that fail their preconditions, and resume tokens that do not describe
//! a valid search path. Structural conflicts discovered while searching
//! are ordinary control flow inside the engine and never surface as
//! errors.

use thiserror::Error;

use crate::dsym::Elem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not parse symbol: {0}")]
    Parse(String),

    #[error("symbol has dimension {found}, expected {expected}")]
    WrongDimension { expected: usize, found: usize },

    #[error("symbol must be complete")]
    Incomplete,

    #[error("symbol must be connected")]
    Disconnected,

    #[error("symbol is not proper: op_{i} and op_{j} do not commute everywhere")]
    Improper { i: usize, j: usize },

    #[error("component containing element {0} is not spherical")]
    NotSpherical(Elem),

    #[error("dimension {0} is not supported here")]
    UnsupportedDimension(usize),

    #[error("tile copy count must be positive")]
    NoTiles,

    #[error("invalid resume token: {0}")]
    BadResumeToken(String),
}

pub type Result<T> = std::result::Result<T, Error>;
