// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Checkpoint, resume and sectioning over the real searches.
//!
//! The contract under test: resuming from a token taken after the j-th
//! result must reproduce exactly the results after j, and splitting a
//! run at any token must partition the output into two contiguous,
//! non-overlapping sections.

mod common;

use common::symbol;
use delaney_search::search::{
    BranchingOptions, CombineOptions, CombineTiles, DefineBranching, SessionResult, TileSearch,
    TileSearchOptions,
};
use delaney_search::DSymbol;

fn branching_engine() -> DefineBranching {
    DefineBranching::new(&symbol("1:1,1,1:0,0"), BranchingOptions::default()).unwrap()
}

fn combine_engine() -> CombineTiles {
    CombineTiles::new(&symbol("2:1 2,1 2,2:2 2,2"), CombineOptions::default()).unwrap()
}

fn session() -> TileSearch {
    TileSearch::new(
        &symbol("2:1 2,1 2,2:2 2,2"),
        TileSearchOptions {
            copies: 1,
            ..TileSearchOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn branching_resume_emits_the_exact_suffix() {
    let all: Vec<DSymbol> = branching_engine().collect();
    assert!(all.len() > 3);
    for split in 1..all.len() {
        let mut head_run = branching_engine();
        let head: Vec<DSymbol> = head_run.by_ref().take(split).collect();
        assert_eq!(head, all[..split]);
        let token = head_run.checkpoint();

        let mut resumed = branching_engine();
        let replayed = resumed.resume(&token).unwrap();
        assert_eq!(replayed.as_ref(), Some(&all[split - 1]));
        let tail: Vec<DSymbol> = resumed.collect();
        assert_eq!(tail, all[split..]);
    }
}

#[test]
fn combine_resume_emits_the_exact_suffix() {
    let all: Vec<DSymbol> = combine_engine().collect();
    assert!(all.len() >= 2);
    for split in 1..all.len() {
        let mut head_run = combine_engine();
        let _ = head_run.by_ref().take(split).count();
        let token = head_run.checkpoint();

        let mut resumed = combine_engine();
        let replayed = resumed.resume(&token).unwrap();
        assert_eq!(replayed.as_ref(), Some(&all[split - 1]));
        let tail: Vec<DSymbol> = resumed.collect();
        assert_eq!(tail, all[split..]);
    }
}

#[test]
fn sections_cover_the_run_without_overlap() {
    let all: Vec<DSymbol> = branching_engine().collect();
    for split in 1..all.len() {
        let mut probe = branching_engine();
        let _ = probe.by_ref().take(split).count();
        let token = probe.checkpoint();

        let mut head_engine = branching_engine();
        head_engine.stop_before(token.clone());
        let head: Vec<DSymbol> = head_engine.collect();

        let mut tail_engine = branching_engine();
        let _ = tail_engine.resume(&token).unwrap();
        let tail: Vec<DSymbol> = tail_engine.collect();

        assert_eq!(head.len(), split, "head section at split {split}");
        let mut combined = head;
        combined.extend(tail);
        assert_eq!(combined, all, "sections at split {split}");
    }
}

#[test]
fn session_resume_spans_stage_boundaries() {
    let all: Vec<SessionResult> = session().collect();
    assert!(all.len() >= 2);
    let all_symbols: Vec<DSymbol> = all.iter().map(|r| r.symbol.clone()).collect();

    for split in 1..all.len() {
        let mut head_run = session();
        let _ = head_run.by_ref().take(split).count();
        let token = head_run.checkpoint();

        let mut resumed = session();
        resumed.resume(&token).unwrap();
        let tail: Vec<DSymbol> = resumed.map(|r| r.symbol).collect();
        assert_eq!(tail, all_symbols[split..], "resume at split {split}");
    }
}

#[test]
fn session_sections_partition_the_pipeline() {
    let all: Vec<DSymbol> = session().map(|r| r.symbol).collect();
    for split in 1..all.len() {
        let mut probe = session();
        let _ = probe.by_ref().take(split).count();
        let token = probe.checkpoint();

        let mut head_session = session();
        head_session.stop_before(token.clone());
        let head: Vec<DSymbol> = head_session.map(|r| r.symbol).collect();

        let mut tail_session = session();
        tail_session.resume(&token).unwrap();
        let tail: Vec<DSymbol> = tail_session.map(|r| r.symbol).collect();

        let mut combined = head;
        combined.extend(tail);
        assert_eq!(combined, all, "session sections at split {split}");
    }
}

#[test]
fn foreign_tokens_are_rejected() {
    let mut engine = branching_engine();
    let alien = "9-9-9".parse().unwrap();
    assert!(engine.resume(&alien).is_err());
}
