//! Refinement checking between two transition systems.
//!
//! # Theory: Input/Output Refinement
//!
//! An *implementation* `T1` refines a *specification* `T2` when, from every
//! reachable pair of states:
//!
//! - every output `T1` can produce, `T2` can produce as well, and
//! - every input `T2` accepts, `T1` accepts as well.
//!
//! Timing is part of the match: a transition exists only if its guards are
//! satisfiable within the current zone, so an output that `T1` may emit after
//! 7 time units must be possible in `T2` at some point of its zone too.
//!
//! # Algorithm
//!
//! The check is a waiting/passed exploration over pairs of symbolic states:
//!
//! ```text
//! Waiting := { (init1, init2) }, Passed := {}
//! while Waiting ≠ {}:
//!     (s1, s2) := pop(Waiting)                // LIFO, depth first
//!     if some (p1, p2) ∈ Passed at the same locations has
//!        zone(s1) ⊆ zone(p1) and zone(s2) ⊆ zone(p2): skip
//!     Passed := Passed ∪ { (s1, s2) }
//!     for each output a of T1 enabled at s1:
//!         if T2 has no a-successor at s2: FAIL
//!         push every successor pair on a
//!     for each input a of T2 enabled at s2:
//!         if T1 has no a-successor at s1: FAIL
//!         push every successor pair on a
//! HOLDS
//! ```
//!
//! Termination depends on the inclusion test: once a zone pair has been
//! explored, any pair whose zones it covers cannot exhibit new behavior.
//! Systems whose zones grow without bound can still make the search diverge;
//! the host bounds it with a [`SearchConfig`], and a stopped search reports
//! [`Verdict::Indeterminate`], never [`Verdict::Holds`].
//!
//! # Examples
//!
//! ```
//! use tioa::automaton::{AutomatonBuilder, Edge, Guard};
//! use tioa::refinement::Refinement;
//! use tioa::system::SimpleSystem;
//!
//! let build = |bound| {
//!     let mut b = AutomatonBuilder::new("M");
//!     let x = b.clock("x");
//!     let a = b.output("a");
//!     let l0 = b.initial_location("L0");
//!     b.invariant(l0, Guard::le(x, bound));
//!     b.edge(Edge::new(l0, l0, &a).with_guard(Guard::le(x, 5)));
//!     SimpleSystem::new(b.build().unwrap())
//! };
//!
//! let implementation = build(5);
//! let specification = build(10);
//! let verdict = Refinement::new(&implementation, &specification).check();
//! assert!(verdict.holds());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::automaton::Channel;
use crate::state::{State, SymbolicLocation};
use crate::system::TransitionSystem;

/// A flag a host can trip, from any thread, to stop a running check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits of a refinement search.
///
/// The default places no limit.
///
/// ```
/// use tioa::refinement::{CancelToken, SearchConfig};
///
/// let token = CancelToken::new();
/// let config = SearchConfig::default()
///     .with_max_states(10_000)
///     .with_cancel_token(token.clone());
/// assert_eq!(config.max_states, Some(10_000));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Maximum number of explored (non-pruned) state pairs.
    pub max_states: Option<usize>,
    pub cancel: Option<CancelToken>,
}

impl SearchConfig {
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Counters collected during a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// State pairs taken from Waiting and added to Passed.
    pub explored: usize,
    /// State pairs taken from Waiting and skipped because Passed covered them.
    pub pruned: usize,
    /// State pairs pushed onto Waiting, the initial pair included.
    pub pushed: usize,
    /// Largest size Waiting reached.
    pub peak_waiting: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "explored={}, pruned={}, pushed={}, peak_waiting={}",
            self.explored, self.pruned, self.pushed, self.peak_waiting
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailureKind {
    /// The implementation emits an output the specification cannot emit.
    UnmatchedOutput,
    /// The specification accepts an input the implementation refuses.
    UnmatchedInput,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopReason {
    Cancelled,
    StateLimit,
}

/// Evidence that refinement does not hold.
#[derive(Debug, Clone)]
pub struct Counterexample {
    /// Implementation state at which matching failed.
    pub implementation: State,
    /// Specification state at which matching failed.
    pub specification: State,
    pub channel: Channel,
    pub kind: FailureKind,
    pub stats: SearchStats,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::UnmatchedOutput => write!(
                f,
                "output `{}` of the implementation at {} is not matched by the specification at {}",
                self.channel,
                self.implementation.location(),
                self.specification.location()
            ),
            FailureKind::UnmatchedInput => write!(
                f,
                "input `{}` of the specification at {} is refused by the implementation at {}",
                self.channel,
                self.specification.location(),
                self.implementation.location()
            ),
        }
    }
}

/// Outcome of a refinement check.
#[derive(Debug, Clone)]
pub enum Verdict {
    Holds { stats: SearchStats },
    Fails(Box<Counterexample>),
    /// The search was stopped before it could decide.
    Indeterminate { reason: StopReason, stats: SearchStats },
}

impl Verdict {
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::Holds { .. })
    }

    pub fn fails(&self) -> bool {
        matches!(self, Verdict::Fails(_))
    }

    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            Verdict::Fails(cex) => Some(cex.as_ref()),
            _ => None,
        }
    }

    pub fn stats(&self) -> SearchStats {
        match self {
            Verdict::Holds { stats } | Verdict::Indeterminate { stats, .. } => *stats,
            Verdict::Fails(cex) => cex.stats,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Holds { stats } => write!(f, "refinement holds ({})", stats),
            Verdict::Fails(cex) => write!(f, "refinement fails: {} ({})", cex, cex.stats),
            Verdict::Indeterminate { reason, stats } => {
                let why = match reason {
                    StopReason::Cancelled => "cancelled",
                    StopReason::StateLimit => "state limit reached",
                };
                write!(f, "refinement undecided: {} ({})", why, stats)
            }
        }
    }
}

type StatePair = (State, State);

/// Explored state pairs, grouped by the pair of symbolic locations.
#[derive(Debug, Default)]
struct Passed {
    by_location: FxHashMap<(SymbolicLocation, SymbolicLocation), Vec<StatePair>>,
}

impl Passed {
    fn covers(&self, (s1, s2): &StatePair) -> bool {
        let key = (s1.location().clone(), s2.location().clone());
        self.by_location.get(&key).map_or(false, |pairs| {
            pairs
                .iter()
                .any(|(p1, p2)| s1.is_covered_by(p1) && s2.is_covered_by(p2))
        })
    }

    fn insert(&mut self, pair: &StatePair) {
        self.by_location
            .entry((pair.0.location().clone(), pair.1.location().clone()))
            .or_default()
            .push(pair.clone());
    }
}

/// Working set of one check. Never shared between checks.
#[derive(Debug)]
struct SearchState {
    waiting: Vec<StatePair>,
    passed: Passed,
    stats: SearchStats,
}

impl SearchState {
    fn new(initial: StatePair) -> Self {
        let mut search = Self {
            waiting: Vec::new(),
            passed: Passed::default(),
            stats: SearchStats::default(),
        };
        search.push(initial);
        search
    }

    fn push(&mut self, pair: StatePair) {
        self.waiting.push(pair);
        self.stats.pushed += 1;
        self.stats.peak_waiting = self.stats.peak_waiting.max(self.waiting.len());
    }

    fn push_product(&mut self, next1: &[State], next2: &[State]) {
        for s1 in next1 {
            for s2 in next2 {
                self.push((s1.clone(), s2.clone()));
            }
        }
    }
}

struct Mismatch {
    channel: Channel,
    kind: FailureKind,
}

/// A refinement query: does `implementation` refine `specification`?
pub struct Refinement<'a> {
    implementation: &'a dyn TransitionSystem,
    specification: &'a dyn TransitionSystem,
    config: SearchConfig,
}

impl<'a> Refinement<'a> {
    pub fn new(implementation: &'a dyn TransitionSystem, specification: &'a dyn TransitionSystem) -> Self {
        Self {
            implementation,
            specification,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the search to a verdict.
    ///
    /// Each call starts from scratch with its own Waiting and Passed sets.
    pub fn check(&self) -> Verdict {
        let initial = (self.implementation.initial_state(), self.specification.initial_state());
        debug!("refinement: initial pair {} | {}", initial.0, initial.1);
        let mut search = SearchState::new(initial);

        while !search.waiting.is_empty() {
            if let Some(reason) = self.stop_reason(&search) {
                warn!("refinement: stopped ({:?}) after {}", reason, search.stats);
                return Verdict::Indeterminate {
                    reason,
                    stats: search.stats,
                };
            }

            let Some(curr) = search.waiting.pop() else {
                break;
            };

            if search.passed.covers(&curr) {
                search.stats.pruned += 1;
                continue;
            }
            search.passed.insert(&curr);
            search.stats.explored += 1;
            debug!("refinement: explore {} | {}", curr.0, curr.1);

            if let Some(Mismatch { channel, kind }) = self.explore(&mut search, &curr) {
                let (implementation, specification) = curr;
                let cex = Counterexample {
                    implementation,
                    specification,
                    channel,
                    kind,
                    stats: search.stats,
                };
                info!("{}", cex);
                return Verdict::Fails(Box::new(cex));
            }
        }

        info!("refinement holds ({})", search.stats);
        Verdict::Holds { stats: search.stats }
    }

    fn stop_reason(&self, search: &SearchState) -> Option<StopReason> {
        if self.config.cancel.as_ref().map_or(false, |t| t.is_cancelled()) {
            return Some(StopReason::Cancelled);
        }
        if self.config.max_states.map_or(false, |max| search.stats.explored >= max) {
            return Some(StopReason::StateLimit);
        }
        None
    }

    /// Matches every output of the implementation and every input of the
    /// specification at `curr`, pushing the successor pairs.
    fn explore(&self, search: &mut SearchState, (s1, s2): &StatePair) -> Option<Mismatch> {
        for output in self.implementation.outputs() {
            let next1 = self.implementation.next_states(s1, output);
            if next1.is_empty() {
                continue;
            }
            let next2 = self.specification.next_states(s2, output);
            if next2.is_empty() {
                return Some(Mismatch {
                    channel: output.clone(),
                    kind: FailureKind::UnmatchedOutput,
                });
            }
            search.push_product(&next1, &next2);
        }

        for input in self.specification.inputs() {
            let next2 = self.specification.next_states(s2, input);
            if next2.is_empty() {
                continue;
            }
            let next1 = self.implementation.next_states(s1, input);
            if next1.is_empty() {
                return Some(Mismatch {
                    channel: input.clone(),
                    kind: FailureKind::UnmatchedInput,
                });
            }
            search.push_product(&next1, &next2);
        }

        None
    }
}

/// Returns `true` iff `implementation` refines `specification`.
///
/// Runs without limits; see [`Refinement::with_config`] to bound the search.
pub fn refines(implementation: &dyn TransitionSystem, specification: &dyn TransitionSystem) -> bool {
    Refinement::new(implementation, specification).check().holds()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::{Automaton, AutomatonBuilder, Edge, Guard, Update};
    use crate::system::SimpleSystem;

    /// `L0 --a!, x <= guard--> L0` with invariant `x <= inv`.
    fn looping(inv: i32, guard: i32) -> SimpleSystem {
        let mut b = AutomatonBuilder::new("M");
        let x = b.clock("x");
        let a = b.output("a");
        let l0 = b.initial_location("L0");
        b.invariant(l0, Guard::le(x, inv));
        b.edge(Edge::new(l0, l0, &a).with_guard(Guard::le(x, guard)));
        SimpleSystem::new(b.build().unwrap())
    }

    /// Emits `a!` exactly once per time unit forever, so its zones never repeat.
    fn divergent() -> Automaton {
        let mut b = AutomatonBuilder::new("Tick");
        let x = b.clock("x");
        b.clock("y");
        let a = b.output("a");
        let l0 = b.initial_location("L0");
        b.invariant(l0, Guard::le(x, 1));
        b.edge(
            Edge::new(l0, l0, &a)
                .with_guard(Guard::exactly(x, 1))
                .with_update(Update::reset(x)),
        );
        b.build().unwrap()
    }

    #[test]
    fn test_reflexive() {
        let ts = looping(10, 5);
        let verdict = Refinement::new(&ts, &ts).check();
        assert!(verdict.holds(), "{}", verdict);
        assert!(verdict.stats().explored >= 1);
    }

    #[test]
    fn test_unmatched_output() {
        let ts1 = looping(10, 5);

        let mut b = AutomatonBuilder::new("Silent");
        let x = b.clock("x");
        let l0 = b.initial_location("L0");
        b.invariant(l0, Guard::le(x, 10));
        let ts2 = SimpleSystem::new(b.build().unwrap());

        let verdict = Refinement::new(&ts1, &ts2).check();
        let cex = verdict.counterexample().expect("refinement should fail");
        assert_eq!(cex.kind, FailureKind::UnmatchedOutput);
        assert_eq!(cex.channel, Channel::from("a"));
        assert_eq!(cex.implementation, ts1.initial_state());
        assert_eq!(cex.specification, ts2.initial_state());
    }

    #[test]
    fn test_unmatched_input() {
        let mut b = AutomatonBuilder::new("Deaf");
        b.input("i");
        b.initial_location("L0");
        let ts1 = SimpleSystem::new(b.build().unwrap());

        let mut b = AutomatonBuilder::new("Listener");
        let i = b.input("i");
        let l0 = b.initial_location("L0");
        b.edge(Edge::new(l0, l0, &i));
        let ts2 = SimpleSystem::new(b.build().unwrap());

        let verdict = Refinement::new(&ts1, &ts2).check();
        let cex = verdict.counterexample().unwrap();
        assert_eq!(cex.kind, FailureKind::UnmatchedInput);
        assert_eq!(cex.channel, Channel::from("i"));

        // The other direction only needs the listener's inputs to be accepted.
        assert!(refines(&ts2, &ts1));
    }

    #[test]
    fn test_tighter_invariant_refines() {
        assert!(refines(&looping(5, 5), &looping(10, 5)));
    }

    #[test]
    fn test_infeasible_window_fails() {
        // The specification's `a!` needs x > 10 but its invariant caps x at 10.
        let mut b = AutomatonBuilder::new("Late");
        let x = b.clock("x");
        let a = b.output("a");
        let l0 = b.initial_location("L0");
        b.invariant(l0, Guard::le(x, 10));
        b.edge(Edge::new(l0, l0, &a).with_guard(Guard::gt(x, 10)));
        let late = SimpleSystem::new(b.build().unwrap());

        let verdict = Refinement::new(&looping(10, 5), &late).check();
        assert!(verdict.fails());
        assert_eq!(verdict.counterexample().unwrap().kind, FailureKind::UnmatchedOutput);
    }

    #[test]
    fn test_state_limit() {
        let ts = SimpleSystem::new(divergent());
        let config = SearchConfig::default().with_max_states(25);
        let verdict = Refinement::new(&ts, &ts).with_config(config).check();
        match verdict {
            Verdict::Indeterminate { reason, stats } => {
                assert_eq!(reason, StopReason::StateLimit);
                assert_eq!(stats.explored, 25);
            }
            other => panic!("expected an indeterminate verdict, got {}", other),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let ts = looping(10, 5);
        let token = CancelToken::new();
        token.cancel();
        let config = SearchConfig::default().with_cancel_token(token);
        let verdict = Refinement::new(&ts, &ts).with_config(config).check();
        assert!(matches!(
            verdict,
            Verdict::Indeterminate {
                reason: StopReason::Cancelled,
                stats: SearchStats { explored: 0, .. }
            }
        ));
        assert!(!verdict.holds());
    }

    #[test]
    fn test_repeated_checks_are_independent() {
        let ts = looping(10, 5);
        let query = Refinement::new(&ts, &ts);
        let first = query.check().stats();
        let second = query.check().stats();
        assert_eq!(first, second);
    }

    #[test]
    fn test_passed_prunes_covered_pair() {
        // Firing `a!` returns to L0 with the zone it started from, so the
        // successor pair is covered by the initial pair.
        let ts = looping(10, 5);
        let verdict = Refinement::new(&ts, &ts).check();
        assert!(verdict.holds(), "{}", verdict);
        let stats = verdict.stats();
        assert_eq!(stats.explored, 1);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.pushed, 2);
    }

    #[test]
    fn test_passed_keeps_uncovered_pair() {
        let ts = looping(10, 5);
        let initial = (ts.initial_state(), ts.initial_state());
        let mut passed = Passed::default();
        assert!(!passed.covers(&initial));
        passed.insert(&initial);
        assert!(passed.covers(&initial));

        // Same locations, larger implementation zone.
        let wider = looping(20, 5);
        let pair = (wider.initial_state(), ts.initial_state());
        assert!(!passed.covers(&pair));
    }
}
