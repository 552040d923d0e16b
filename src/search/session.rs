// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The tile-k-transitive enumeration session: extend a collection of
//! tile copies to the next dimension, then complete the branching of
//! every extended set, yielding finished tilings one at a time.
//!
//! The session composes the checkpoint tokens of its two stages into
//! one ordered token, so a long pipeline run can be sectioned and
//! resumed exactly like a single search. A feasibility tester, when
//! installed, classifies each finished symbol; its verdict is reported
//! with the result and never treated as a search error.

use std::fmt;
use std::str::FromStr;

use strum_macros::Display;
use tracing::{info, warn};

use crate::dsym::{orbits, DSymbol, DelaneySymbol, DynamicSymbol};
use crate::engine::CheckpointToken;
use crate::errors::{Error, Result};
use crate::search::branching::{BranchingOptions, DefineBranching};
use crate::search::combine::{CombineOptions, CombineTiles};
use crate::search::signature::SignatureCache;

/// Verdict of the external feasibility test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Feasibility {
    Good,
    Bad,
    Ambiguous,
}

/// A pure, possibly slow post-filter invoked once per finished symbol.
pub trait FeasibilityTester {
    fn classify(&self, ds: &DSymbol) -> Feasibility;
}

/// The trivial tester: everything passes.
pub struct AcceptAll;

impl FeasibilityTester for AcceptAll {
    fn classify(&self, _ds: &DSymbol) -> Feasibility {
        Feasibility::Good
    }
}

/// Options for a [`TileSearch`].
#[derive(Debug, Clone)]
pub struct TileSearchOptions {
    /// Number of disjoint copies of the tile in the final tilings.
    pub copies: usize,
    pub combine: CombineOptions,
    pub branching: BranchingOptions,
}

impl Default for TileSearchOptions {
    fn default() -> Self {
        Self {
            copies: 1,
            combine: CombineOptions::default(),
            branching: BranchingOptions::default(),
        }
    }
}

/// A finished symbol plus its feasibility classification.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub symbol: DSymbol,
    pub feasibility: Feasibility,
}

/// Counters for the session's intermediate stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub extended_sets: u64,
    pub branched: u64,
    pub emitted: u64,
}

impl SessionStats {
    pub fn summary(&self) -> String {
        format!(
            "assembled {} extended sets and completed {} branchings, emitting {} results",
            self.extended_sets, self.branched, self.emitted
        )
    }
}

/// A composed checkpoint: the extension stage's path plus the branching
/// stage's path within the current extended set. Ordered
/// lexicographically, outer stage first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionToken {
    pub extend: CheckpointToken,
    pub branch: CheckpointToken,
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.extend, self.branch)
    }
}

impl FromStr for SessionToken {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (extend, branch) = text
            .split_once('/')
            .ok_or_else(|| Error::BadResumeToken(text.to_string()))?;
        Ok(Self {
            extend: extend.parse()?,
            branch: branch.parse()?,
        })
    }
}

/// The full pipeline, pull-driven: each `next` returns one finished,
/// canonical, connected symbol of dimension 3.
pub struct TileSearch {
    extender: CombineTiles,
    brancher: Option<DefineBranching>,
    branching: BranchingOptions,
    tester: Option<Box<dyn FeasibilityTester>>,
    stop: Option<SessionToken>,
    stats: SessionStats,
}

impl TileSearch {
    /// Validate the tile and set up the pipeline. The tile must be a
    /// connected, complete, 2-dimensional symbol; sphericity is checked
    /// by the extension stage.
    pub fn new(tile: &DSymbol, options: TileSearchOptions) -> Result<Self> {
        if tile.dim() != 2 {
            return Err(Error::WrongDimension {
                expected: 2,
                found: tile.dim(),
            });
        }
        if !orbits::is_connected(tile) {
            return Err(Error::Disconnected);
        }
        if options.copies == 0 {
            return Err(Error::NoTiles);
        }
        let mut collection = DynamicSymbol::new(2);
        for _ in 0..options.copies {
            collection.append(tile);
        }
        let extender = CombineTiles::with_cache(
            &collection.flatten(),
            options.combine,
            SignatureCache::shared(),
        )?;
        Ok(Self {
            extender,
            brancher: None,
            branching: options.branching,
            tester: None,
            stop: None,
            stats: SessionStats::default(),
        })
    }

    /// Install a feasibility tester for finished symbols.
    pub fn with_tester(mut self, tester: Box<dyn FeasibilityTester>) -> Self {
        self.tester = Some(tester);
        self
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The composed token for the current state. Meaningful between
    /// pulls.
    pub fn checkpoint(&self) -> SessionToken {
        SessionToken {
            extend: self.extender.checkpoint(),
            branch: self
                .brancher
                .as_ref()
                .map(|b| b.checkpoint())
                .unwrap_or_default(),
        }
    }

    /// End the session just before the first state whose token reaches
    /// the bound.
    pub fn stop_before(&mut self, token: SessionToken) {
        self.stop = Some(token);
    }

    /// Restore the session to the state a token was taken at. Must be
    /// called before the first pull.
    pub fn resume(&mut self, token: &SessionToken) -> Result<()> {
        if token.extend.is_empty() {
            if token.branch.is_empty() {
                return Ok(());
            }
            return Err(Error::BadResumeToken(token.to_string()));
        }
        let set = self
            .extender
            .resume(&token.extend)?
            .ok_or_else(|| Error::BadResumeToken(token.to_string()))?;
        self.stats.extended_sets += 1;
        let mut brancher = DefineBranching::new(&set, self.branching.clone())?;
        if !token.branch.is_empty() {
            // The result materialized at the restored state was already
            // emitted before the checkpoint was taken.
            let _ = brancher.resume(&token.branch)?;
        }
        self.brancher = Some(brancher);
        Ok(())
    }
}

impl Iterator for TileSearch {
    type Item = SessionResult;

    fn next(&mut self) -> Option<SessionResult> {
        if let Some(stop) = &self.stop {
            if &self.checkpoint() >= stop {
                return None;
            }
        }
        loop {
            if let Some(brancher) = &mut self.brancher {
                if let Some(symbol) = brancher.next() {
                    self.stats.branched += 1;
                    let feasibility = self
                        .tester
                        .as_ref()
                        .map(|t| t.classify(&symbol))
                        .unwrap_or(Feasibility::Good);
                    self.stats.emitted += 1;
                    return Some(SessionResult {
                        symbol,
                        feasibility,
                    });
                }
                self.brancher = None;
            }
            let set = match self.extender.next() {
                Some(set) => set,
                None => {
                    info!(summary = %self.stats.summary(), "session exhausted");
                    return None;
                }
            };
            self.stats.extended_sets += 1;
            match DefineBranching::new(&set, self.branching.clone()) {
                Ok(brancher) => self.brancher = Some(brancher),
                Err(error) => {
                    // An extended set always satisfies the branching
                    // preconditions; a failure here is a bug, but one
                    // lost set is better than a poisoned enumeration.
                    warn!(%error, set = %set, "skipping extended set");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsym::properties;

    fn session(tile: &str, copies: usize) -> TileSearch {
        let options = TileSearchOptions {
            copies,
            ..TileSearchOptions::default()
        };
        TileSearch::new(&DSymbol::parse(tile).unwrap(), options).unwrap()
    }

    #[test]
    fn one_triangle_chamber_gives_two_tilings() {
        let results: Vec<SessionResult> = session("1:1,1,1:3,3", 1).collect();
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.feasibility, Feasibility::Good);
            assert!(properties::is_locally_euclidean_3d(&result.symbol));
            assert!(orbits::is_connected(&result.symbol));
        }
    }

    #[test]
    fn two_copies_join_into_one_tiling() {
        let mut search = session("1:1,1,1:3,3", 2);
        let results: Vec<SessionResult> = search.by_ref().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol.size(), 2);
        let stats = search.stats();
        assert_eq!(stats.extended_sets, 1);
        assert_eq!(stats.emitted, 1);
    }

    #[test]
    fn wrong_dimension_fails_fast() {
        let ds = DSymbol::parse("1 3:1,1,1,1:3,3,4").unwrap();
        assert!(matches!(
            TileSearch::new(&ds, TileSearchOptions::default()),
            Err(Error::WrongDimension { .. })
        ));
    }

    #[test]
    fn zero_copies_fail_fast() {
        let tile = DSymbol::parse("1:1,1,1:3,3").unwrap();
        let options = TileSearchOptions {
            copies: 0,
            ..TileSearchOptions::default()
        };
        assert!(matches!(
            TileSearch::new(&tile, options),
            Err(Error::NoTiles)
        ));
    }

    #[test]
    fn session_tokens_round_trip_and_order() {
        let a: SessionToken = "1-2/1".parse().unwrap();
        let b: SessionToken = "1-2/2".parse().unwrap();
        let c: SessionToken = "1-3/-".parse().unwrap();
        assert!(a < b && b < c);
        assert_eq!(a.to_string(), "1-2/1");
        assert!("nonsense".parse::<SessionToken>().is_err());
    }
}
