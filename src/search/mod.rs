// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The concrete searches built on the branch-and-cut engine.
//!
//! - [`combine`] extends a collection of tiles by one dimension,
//!   defining the new neighbor relation in every admissible way.
//! - [`branching`] completes the missing branching numbers of a symbol
//!   under numeric feasibility bounds.
//! - [`session`] chains the two into the tile-k-transitive pipeline.
//! - [`signature`] and [`components`] supply the shared indices both
//!   searches prune with.

pub mod branching;
pub mod combine;
pub mod components;
pub mod session;
pub mod signature;

pub use branching::{BranchingOptions, DefineBranching};
pub use combine::{CombineOptions, CombineTiles};
pub use components::ComponentLibrary;
pub use session::{
    AcceptAll, Feasibility, FeasibilityTester, SessionResult, SessionStats, SessionToken,
    TileSearch, TileSearchOptions,
};
pub use signature::{Signature, SignatureCache};
