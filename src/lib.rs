// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Exhaustive, non-redundant enumeration of Delaney-Dress symbols.
//!
//! Delaney-Dress symbols encode tilings and periodic nets as finite
//! combinatorial objects: elements 1..n, partial involutions
//! `op_0..op_dim`, and branching numbers on consecutive-index orbits.
//! This crate enumerates such symbols under topological admissibility
//! constraints, reporting exactly one representative per isomorphism
//! class.
//!
//! # Architecture
//!
//! The crate is layered bottom-up:
//!
//! - [`dsym`] — the symbol types ([`DSymbol`], [`DynamicSymbol`]) and
//!   the pure algorithms on them: orbits, canonical forms, morphisms,
//!   curvature and sphericity.
//! - [`engine`] — the generic branch-and-cut search: choice points,
//!   forced deductions, exact undo via a move stack, canonicity-based
//!   pruning, and checkpoint tokens for resumable runs.
//! - [`search`] — the two concrete searches (neighbor-relation
//!   extension and branching-number assignment) plus the session that
//!   pipelines them into the tile-k-transitive enumeration.
//!
//! # Search model
//!
//! Every search is a lazy, pull-driven iterator: each `next()` advances
//! an explicit state machine to the next result or to exhaustion. The
//! move stack is the whole continuation, which is what makes exact
//! resume possible: a checkpoint token records one decision ordinal per
//! choice level, and replaying those decisions (recomputing all forced
//! deductions) reproduces the state bit for bit.
//!
//! Engines are single-threaded by design; parallel runs partition the
//! search space along checkpoint-token boundaries and use one engine
//! per section.

pub mod dsym;
pub mod engine;
pub mod errors;
pub mod search;

pub use dsym::{DSymbol, DelaneySymbol, DynamicSymbol, Elem};
pub use engine::{BranchAndCut, CheckpointToken, SearchSpec, SearchStats};
pub use errors::{Error, Result};
pub use search::{
    BranchingOptions, CombineOptions, DefineBranching, CombineTiles, Feasibility, SessionResult,
    SessionToken, TileSearch, TileSearchOptions,
};
