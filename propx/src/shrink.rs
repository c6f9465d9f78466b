//! Shrinking search: a bounded walk over the shrink tree.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::ShrinkStrategy;
use crate::error::PropertyError;
use crate::generator::{BoxShrinker, Shrinker};

/// The process-global traversal order, read by shrinkers when they are
/// constructed. Written once by the engine before sampling starts and
/// read-only for the rest of the run.
static STRATEGY: AtomicU8 = AtomicU8::new(0);

/// Set the shrinking strategy for all generators.
pub fn set_shrink_strategy(strategy: ShrinkStrategy) {
    let tag = match strategy {
        ShrinkStrategy::Bfs => 0,
        ShrinkStrategy::Dfs => 1,
    };
    STRATEGY.store(tag, Ordering::Relaxed);
}

/// The current shrinking strategy.
pub fn shrink_strategy() -> ShrinkStrategy {
    match STRATEGY.load(Ordering::Relaxed) {
        1 => ShrinkStrategy::Dfs,
        _ => ShrinkStrategy::Bfs,
    }
}

/// A shrinker over a candidate tree described by an `expand` function.
///
/// `expand(node)` lists the node's candidates, simplest first; every
/// candidate must be no larger than the node it came from, and strictly
/// smaller along at least one descent axis so the walk terminates.
///
/// Acceptance handling realizes the traversal order:
///
/// - DFS descends the moment a candidate is accepted: the remaining
///   siblings are dropped and the accepted candidate's own candidates
///   become the pending level.
/// - BFS finishes proposing the current level first. At the end of the
///   level it re-proposes the earliest accepted candidate once (so the
///   caller's notion of "current best" settles on the value actually
///   descended into, even when a later sibling also reproduced the
///   failure), then descends into it and discards the rest.
///
/// Either way the walk follows a single descending chain, so exhaustion
/// means the final accepted value had a full level of candidates proposed
/// and none accepted: a local minimum. The strategy is captured at
/// construction and fixed for the instance's lifetime.
pub(crate) struct TreeShrinker<R, F> {
    expand: F,
    strategy: ShrinkStrategy,
    pending: VecDeque<R>,
    level_accept: Option<R>,
    /// Set while the emission awaiting feedback is the end-of-level
    /// re-proposal of the accepted candidate.
    confirming: Option<R>,
    last: Option<R>,
    done: bool,
}

impl<R, F> TreeShrinker<R, F>
where
    R: Clone,
    F: Fn(&R) -> Vec<R>,
{
    pub fn new(origin: &R, expand: F) -> Self {
        let pending = expand(origin).into();
        Self {
            expand,
            strategy: shrink_strategy(),
            pending,
            level_accept: None,
            confirming: None,
            last: None,
            done: false,
        }
    }
}

impl<R, F> Shrinker<R> for TreeShrinker<R, F>
where
    R: Clone,
    F: Fn(&R) -> Vec<R>,
{
    fn next(&mut self, accept: bool) -> Option<R> {
        if self.done {
            return None;
        }
        if let Some(root) = self.confirming.take() {
            if accept {
                self.pending = (self.expand)(&root).into();
            }
            // A rejected confirmation means the failure did not reproduce;
            // the walk ends with whatever is pending (nothing).
        } else if accept {
            if let Some(last) = self.last.take() {
                match self.strategy {
                    ShrinkStrategy::Dfs => {
                        self.pending = (self.expand)(&last).into();
                        self.level_accept = None;
                    }
                    ShrinkStrategy::Bfs => {
                        if self.level_accept.is_none() {
                            self.level_accept = Some(last);
                        }
                    }
                }
            }
        }
        if let Some(candidate) = self.pending.pop_front() {
            self.last = Some(candidate.clone());
            return Some(candidate);
        }
        let Some(root) = self.level_accept.take() else {
            self.done = true;
            self.last = None;
            return None;
        };
        self.last = None;
        self.confirming = Some(root.clone());
        Some(root)
    }
}

/// Build a shrinker from a candidate-tree description, for custom
/// generators: `expand(node)` lists a node's candidates, simplest first,
/// each no larger than the node it came from. Traversal order follows the
/// active strategy.
pub fn tree_shrink<R, F>(origin: &R, expand: F) -> BoxShrinker<R>
where
    R: Clone + 'static,
    F: Fn(&R) -> Vec<R> + 'static,
{
    Box::new(TreeShrinker::new(origin, expand))
}

/// Outcome of a shrinking search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkReport<T> {
    /// The locally-minimal failing value found.
    pub minimal: T,
    /// Property re-evaluations performed during the search.
    pub steps: u32,
    /// The step budget ran out with candidates still pending; the minimum
    /// may not be local.
    pub budget_exhausted: bool,
}

/// Walk the shrink tree below `origin`, driven by `probe`.
///
/// `probe` re-runs the property against a candidate and returns whether it
/// still failed. Every probe call counts one step against `max_shrink`.
/// The acceptance signal is the pruning rule: a candidate that did not
/// reproduce the failure is never descended from.
pub fn minimize<T, F>(
    origin: T,
    mut shrinker: BoxShrinker<T>,
    max_shrink: u32,
    mut probe: F,
) -> Result<ShrinkReport<T>, PropertyError>
where
    F: FnMut(&T) -> bool,
{
    let mut best = origin;
    let mut steps = 0u32;
    let mut accept = false;
    let mut exhausted = false;

    while steps < max_shrink {
        match shrinker.next(accept) {
            Some(candidate) => {
                steps += 1;
                let failed = probe(&candidate);
                if failed {
                    best = candidate;
                }
                accept = failed;
            }
            None => {
                exhausted = true;
                break;
            }
        }
    }

    // Contract check: once exhausted, a shrinker must stay exhausted.
    if exhausted && shrinker.next(false).is_some() {
        return Err(PropertyError::internal_invariant(
            "shrinker produced a candidate after signaling exhaustion",
        ));
    }

    Ok(ShrinkReport {
        minimal: best,
        steps,
        budget_exhausted: !exhausted,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_sync::strategy_guard;

    fn candidates(v: &i64) -> Vec<i64> {
        let v = *v;
        if v == 0 {
            return Vec::new();
        }
        let mut out = vec![0];
        if v / 2 != 0 {
            out.push(v / 2);
        }
        if v - 1 != v / 2 && v - 1 != 0 {
            out.push(v - 1);
        }
        out
    }

    fn tree(origin: i64) -> BoxShrinker<i64> {
        Box::new(TreeShrinker::new(&origin, candidates))
    }

    #[test]
    fn test_minimize_trivial_shrinker_takes_no_steps() {
        let report =
            minimize(42, crate::generator::no_shrink::<i32>(), 400, |_| true).unwrap();
        assert_eq!(report.minimal, 42);
        assert_eq!(report.steps, 0);
        assert!(!report.budget_exhausted);
    }

    #[test]
    fn test_minimize_finds_local_minimum_bfs() {
        let _g = strategy_guard();
        set_shrink_strategy(ShrinkStrategy::Bfs);
        // Failing iff >= 13: the only local minimum is 13.
        let report = minimize(100, tree(100), 400, |v| *v >= 13).unwrap();
        assert_eq!(report.minimal, 13);
        assert!(report.steps >= 1);
        assert!(!report.budget_exhausted);
    }

    #[test]
    fn test_minimize_finds_local_minimum_dfs() {
        let _g = strategy_guard();
        set_shrink_strategy(ShrinkStrategy::Dfs);
        let report = minimize(100, tree(100), 400, |v| *v >= 13).unwrap();
        assert_eq!(report.minimal, 13);
        assert!(!report.budget_exhausted);
        set_shrink_strategy(ShrinkStrategy::Bfs);
    }

    #[test]
    fn test_tree_shrinker_terminates_under_all_feedback() {
        let _g = strategy_guard();
        for strategy in [ShrinkStrategy::Bfs, ShrinkStrategy::Dfs] {
            set_shrink_strategy(strategy);
            for always_accept in [false, true] {
                let mut s = tree(1000);
                let mut calls = 0;
                while s.next(always_accept).is_some() {
                    calls += 1;
                    assert!(calls < 100_000, "shrinker did not terminate");
                }
            }
        }
        set_shrink_strategy(ShrinkStrategy::Bfs);
    }

    #[test]
    fn test_tree_shrinker_candidates_never_grow() {
        let _g = strategy_guard();
        set_shrink_strategy(ShrinkStrategy::Bfs);
        let mut s = tree(500);
        let mut accept = false;
        while let Some(v) = s.next(accept) {
            assert!(v.abs() <= 500);
            accept = v >= 7; // arbitrary failing predicate
        }
    }

    #[test]
    fn test_minimize_respects_budget() {
        let mut n = 0_i64;
        // Endless sibling stream; the budget is the only bound.
        let endless: BoxShrinker<i64> = Box::new(move |_accept: bool| {
            n += 1;
            Some(n)
        });
        let report = minimize(0, endless, 25, |_| false).unwrap();
        assert_eq!(report.steps, 25);
        assert_eq!(report.minimal, 0);
        assert!(report.budget_exhausted);
    }

    #[test]
    fn test_minimize_rejects_contract_violation() {
        let mut calls = 0;
        let lying: BoxShrinker<i32> = Box::new(move |_accept: bool| {
            calls += 1;
            match calls {
                1 => Some(1),
                2 => None,
                _ => Some(99), // resurrects after exhaustion
            }
        });
        let err = minimize(5, lying, 400, |_| false).unwrap_err();
        assert!(matches!(err, PropertyError::InternalInvariant { .. }));
    }

    #[test]
    fn test_strategy_global_round_trip() {
        let _g = strategy_guard();
        set_shrink_strategy(ShrinkStrategy::Dfs);
        assert_eq!(shrink_strategy(), ShrinkStrategy::Dfs);
        set_shrink_strategy(ShrinkStrategy::Bfs);
        assert_eq!(shrink_strategy(), ShrinkStrategy::Bfs);
    }
}
