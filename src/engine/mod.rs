// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! The generic incremental branch-and-cut engine.
//!
//! A search is described by a value implementing [`SearchSpec`]; the
//! engine supplies the control skeleton shared by all searches:
//!
//! 1. **Undo** the most recent choice together with the deductions it
//!    forced, restoring the exact previous state.
//! 2. **Find the next alternative** for that choice point.
//! 3. **Apply** it: perform the move, then drain a FIFO queue of forced
//!    deductions, rejecting on the first contradiction.
//! 4. **Validate** the new partial state (typically a canonicity test);
//!    rejection discards only this move.
//! 5. Either push the next choice point, or — when no choice remains —
//!    materialize a result and return it with the stack intact, so the
//!    next pull resumes the search exactly where it left off.
//!
//! The move stack is the continuation: a rejected or partly performed
//! decision stays on the stack as the cursor for step 2 and is cleaned
//! up by the next undo, which keeps undo handling in one place.
//!
//! The engine is strictly single-threaded; exact undo depends on LIFO
//! discipline over one mutable state. Callers wanting parallelism run
//! several engines over disjoint [checkpoint](checkpoint::CheckpointToken)
//! ranges.

pub mod checkpoint;

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

pub use checkpoint::CheckpointToken;

use crate::errors::{Error, Result};

/// How a move entered the stack.
///
/// A `Choice` is an undoable decision (or the placeholder announcing
/// that one has to be made); a `Deduction` is a forced consequence,
/// undone together with the choice that caused it and never on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Choice,
    Deduction,
}

/// Verdict on a move before it is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Can be performed as requested.
    Ok,
    /// Would not change the current state.
    Void,
    /// Contradicts the current state.
    Illegal,
}

/// The capability interface a concrete search implements.
///
/// All methods take `&mut self` because the concrete search owns the
/// mutable working state the moves act on.
pub trait SearchSpec {
    /// The move type. Moves double as enumeration cursors: the engine
    /// hands the last tried move back to [`next_decision`](Self::next_decision)
    /// to obtain the next alternative.
    type Mv: Clone + std::fmt::Debug;

    /// The result type produced at complete states.
    type Output;

    /// The placeholder for the first choice to make, or `None` if the
    /// initial state has nothing left to decide.
    fn initial_choice(&mut self) -> Option<Self::Mv>;

    /// The placeholder for the choice following the given performed
    /// decision, or `None` when the state is complete.
    fn next_choice(&mut self, after: &Self::Mv) -> Option<Self::Mv>;

    /// The next untried alternative at the choice point described by
    /// `previous` (a placeholder or the last tried decision), or `None`
    /// when the choice point is exhausted.
    fn next_decision(&mut self, previous: &Self::Mv) -> Option<Self::Mv>;

    /// Classify a move against the current state.
    fn check_move(&mut self, mv: &Self::Mv) -> MoveStatus;

    /// Perform a move known to be legal and non-void.
    fn perform(&mut self, mv: &Self::Mv);

    /// Undo a performed move, assuming it was the most recent one.
    fn undo(&mut self, mv: &Self::Mv);

    /// The forced consequences of a performed move, or `None` if the
    /// state already contradicts an admissibility requirement.
    fn deductions(&mut self, mv: &Self::Mv) -> Option<Vec<Self::Mv>>;

    /// Final test after a decision and its deductions; typically the
    /// canonicity check. Failure discards the decision but not the
    /// stack below it.
    fn is_valid(&mut self) -> bool {
        true
    }

    /// Materialize a result from a state with no open choices, or
    /// `None` if the state is not an admissible result.
    fn make_result(&mut self) -> Option<Self::Output>;
}

/// Running counters, reported by the binary after a search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Decisions tried, including rejected ones.
    pub decisions: u64,
    /// Forced moves performed.
    pub deductions: u64,
    /// Decisions rejected by a contradiction or the validity test.
    pub rejected: u64,
    /// Results emitted.
    pub results: u64,
}

#[derive(Debug)]
struct Entry<M> {
    mv: M,
    kind: MoveKind,
    /// Ordinal of this decision at its choice point; 0 for placeholders.
    attempt: u32,
    /// Whether `perform` ran, and hence whether `undo` must.
    performed: bool,
}

/// The engine. Drives one [`SearchSpec`] as a lazy, pull-based iterator
/// over results.
pub struct BranchAndCut<S: SearchSpec> {
    spec: S,
    stack: Vec<Entry<S::Mv>>,
    started: bool,
    done: bool,
    stop_before: Option<CheckpointToken>,
    reporter: Option<Box<dyn FnMut(&CheckpointToken)>>,
    stats: SearchStats,
}

impl<S: SearchSpec> BranchAndCut<S> {
    pub fn from_spec(spec: S) -> Self {
        Self {
            spec,
            stack: Vec::new(),
            started: false,
            done: false,
            stop_before: None,
            reporter: None,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn spec(&self) -> &S {
        &self.spec
    }

    /// End the enumeration just before the first state whose token is
    /// `>= token`. Combined with [`resume`](Self::resume) this splits a
    /// search into contiguous sections.
    pub fn stop_before(&mut self, token: CheckpointToken) {
        self.stop_before = Some(token);
    }

    /// Install a callback invoked with the current token between pulls.
    /// A panicking callback is swallowed; reporting never breaks the
    /// search.
    pub fn on_checkpoint(&mut self, reporter: impl FnMut(&CheckpointToken) + 'static) {
        self.reporter = Some(Box::new(reporter));
    }

    /// The token describing the current path through the choice points.
    /// Meaningful between pulls.
    pub fn checkpoint(&self) -> CheckpointToken {
        CheckpointToken::new(
            self.stack
                .iter()
                .filter(|entry| entry.kind == MoveKind::Choice && entry.attempt > 0)
                .map(|entry| entry.attempt)
                .collect(),
        )
    }

    /// Restore the search to the state a token was taken at, replaying
    /// the recorded decision at every choice point and recomputing all
    /// deductions. Returns the result materialized at the restored
    /// state, which the caller has typically already consumed.
    ///
    /// Must be called before the first pull.
    pub fn resume(&mut self, token: &CheckpointToken) -> Result<Option<S::Output>> {
        if self.started {
            return Err(Error::BadResumeToken(
                "cannot resume a search that has already run".into(),
            ));
        }
        self.started = true;
        let Some(first) = self.spec.initial_choice() else {
            return if token.is_empty() {
                Ok(None)
            } else {
                Err(Error::BadResumeToken(token.to_string()))
            };
        };
        self.push_placeholder(first);
        if token.is_empty() {
            return Ok(None);
        }
        for (depth, &target) in token.levels().iter().enumerate() {
            let anchor = match self.stack.pop() {
                Some(entry) if entry.kind == MoveKind::Choice && entry.attempt == 0 => entry.mv,
                _ => return Err(Error::BadResumeToken(token.to_string())),
            };
            let mut cursor = anchor;
            let mut decision = None;
            for attempt in 1..=target {
                match self.spec.next_decision(&cursor) {
                    Some(mv) => {
                        if attempt == target {
                            decision = Some(mv);
                        } else {
                            cursor = mv;
                        }
                    }
                    None => return Err(Error::BadResumeToken(token.to_string())),
                }
            }
            let decision = decision.ok_or_else(|| Error::BadResumeToken(token.to_string()))?;
            if !self.apply(decision.clone(), target) || !self.spec.is_valid() {
                return Err(Error::BadResumeToken(token.to_string()));
            }
            match self.spec.next_choice(&decision) {
                Some(placeholder) => self.push_placeholder(placeholder),
                None => {
                    if depth + 1 != token.levels().len() {
                        return Err(Error::BadResumeToken(token.to_string()));
                    }
                }
            }
        }
        Ok(self.spec.make_result())
    }

    fn push_placeholder(&mut self, mv: S::Mv) {
        self.stack.push(Entry {
            mv,
            kind: MoveKind::Choice,
            attempt: 0,
            performed: false,
        });
    }

    /// Pop and undo entries until a choice-kind entry has been undone,
    /// returning it as the cursor for the next alternative.
    fn undo_last_choice(&mut self) -> Option<(S::Mv, u32)> {
        while let Some(entry) = self.stack.pop() {
            if entry.performed {
                self.spec.undo(&entry.mv);
            }
            if entry.kind == MoveKind::Choice {
                return Some((entry.mv, entry.attempt));
            }
        }
        None
    }

    /// Perform a decision and drain its deduction queue. On a
    /// contradiction the partially performed prefix stays on the stack;
    /// the next `undo_last_choice` removes it together with the
    /// decision entry, which acts as the cursor meanwhile.
    fn apply(&mut self, initial: S::Mv, attempt: u32) -> bool {
        let mut queue: VecDeque<S::Mv> = VecDeque::new();
        queue.push_back(initial);
        let mut is_initial = true;
        while let Some(mv) = queue.pop_front() {
            let status = self.spec.check_move(&mv);
            let kind = if is_initial {
                MoveKind::Choice
            } else {
                MoveKind::Deduction
            };
            match status {
                MoveStatus::Void if !is_initial => continue,
                MoveStatus::Illegal => {
                    debug!(mv = ?mv, "contradiction");
                    if is_initial {
                        // Nothing performed yet; keep the decision as a
                        // cursor entry so backtracking finds it.
                        self.stack.push(Entry {
                            mv,
                            kind,
                            attempt,
                            performed: false,
                        });
                    }
                    return false;
                }
                _ => {}
            }
            let performed = status == MoveStatus::Ok;
            if performed {
                self.spec.perform(&mv);
                if !is_initial {
                    self.stats.deductions += 1;
                }
            }
            self.stack.push(Entry {
                mv: mv.clone(),
                kind,
                attempt,
                performed,
            });
            match self.spec.deductions(&mv) {
                None => {
                    debug!(mv = ?mv, "deductions found a contradiction");
                    return false;
                }
                Some(forced) => queue.extend(forced),
            }
            is_initial = false;
        }
        true
    }

    fn report(&mut self) {
        if self.reporter.is_some() {
            let token = self.checkpoint();
            if let Some(reporter) = &mut self.reporter {
                let outcome = catch_unwind(AssertUnwindSafe(|| reporter(&token)));
                if outcome.is_err() {
                    warn!(token = %token, "checkpoint reporter failed; ignored");
                }
            }
        }
    }
}

impl<S: SearchSpec> Iterator for BranchAndCut<S> {
    type Item = S::Output;

    fn next(&mut self) -> Option<S::Output> {
        if self.done {
            return None;
        }
        if let Some(stop) = &self.stop_before {
            if &self.checkpoint() >= stop {
                self.done = true;
                return None;
            }
        }
        self.report();
        if !self.started {
            self.started = true;
            match self.spec.initial_choice() {
                Some(first) => self.push_placeholder(first),
                None => {
                    // Nothing to decide: the input is the only candidate.
                    self.done = true;
                    if self.spec.is_valid() {
                        if let Some(out) = self.spec.make_result() {
                            self.stats.results += 1;
                            return Some(out);
                        }
                    }
                    return None;
                }
            }
        }
        loop {
            let Some((cursor, attempt)) = self.undo_last_choice() else {
                self.done = true;
                return None;
            };
            let Some(decision) = self.spec.next_decision(&cursor) else {
                continue;
            };
            debug!(decision = ?decision, attempt = attempt + 1, "trying");
            self.stats.decisions += 1;
            if !self.apply(decision.clone(), attempt + 1) {
                self.stats.rejected += 1;
                continue;
            }
            if !self.spec.is_valid() {
                self.stats.rejected += 1;
                continue;
            }
            match self.spec.next_choice(&decision) {
                Some(placeholder) => self.push_placeholder(placeholder),
                None => {
                    if let Some(out) = self.spec.make_result() {
                        self.stats.results += 1;
                        return Some(out);
                    }
                }
            }
        }
    }
}
