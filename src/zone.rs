//! Zones as difference-bound matrices.
//!
//! # Theory: Zones
//!
//! A *zone* is a convex set of clock valuations described by a conjunction of
//! constraints of the form `x_i - x_j ⋈ c` with `⋈ ∈ {<, ≤}`. With `C` clocks
//! the constraints are kept in a `(C+1) × (C+1)` *difference-bound matrix*
//! (DBM): entry `(i, j)` bounds `x_i - x_j`. Index `0` is the reference clock,
//! whose value is always `0`, so `(i, 0)` is an upper bound on `x_i` and
//! `(0, i)` is the negated lower bound.
//!
//! ## Canonical form
//!
//! Many matrices describe the same zone. The *canonical* one is the tightest:
//! every entry equals the shortest path between its two clocks in the
//! constraint graph. It is obtained with Floyd-Warshall and is required
//! before two zones can be compared entry by entry. A zone is empty iff its
//! canonical form has a negative diagonal entry (a negative cycle).
//!
//! ## Operations
//!
//! - [`Zone::init`]: all clocks equal zero.
//! - [`Zone::delay`]: let an arbitrary amount of time pass (drop upper bounds).
//! - [`Zone::apply_guard`] / [`Zone::constrain`]: intersect with a constraint.
//! - [`Zone::reset`]: assign a constant to a clock.
//! - [`Zone::is_subset_eq`]: zone inclusion, the pruning test of the search.
//!
//! Operations never allocate beyond the matrix itself and hold no shared
//! state, so independent zones can be used from independent threads.
//!
//! # Examples
//!
//! ```
//! use tioa::zone::{Relation, Zone};
//!
//! // One clock `x` (index 1) plus the reference clock.
//! let mut z = Zone::init(2);
//! z.delay();
//! z.apply_guard(1, Relation::Le, 5);
//! z.canonicalize();
//! assert!(z.is_valid());
//! assert!(z.contains(&[5]));
//! assert!(!z.contains(&[6]));
//! ```
//!
//! # References
//!
//! - J. Bengtsson & W. Yi. "Timed Automata: Semantics, Algorithms and Tools."
//!   Lectures on Concurrency and Petri Nets, 2004.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use log::debug;

use crate::bound::Bound;

/// Comparison operator of a clock constraint `x ⋈ c`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Relation {
    /// Returns the relation describing exactly the valuations this one excludes.
    ///
    /// `Eq` has no single-constraint complement and yields `None`.
    pub fn complement(self) -> Option<Relation> {
        match self {
            Relation::Lt => Some(Relation::Ge),
            Relation::Le => Some(Relation::Gt),
            Relation::Ge => Some(Relation::Lt),
            Relation::Gt => Some(Relation::Le),
            Relation::Eq => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Eq => "==",
            Relation::Ge => ">=",
            Relation::Gt => ">",
        };
        write!(f, "{}", s)
    }
}

/// A difference-bound matrix of dimension `C+1` for `C` clocks.
#[derive(Debug, Clone)]
pub struct Zone {
    dimension: usize,
    /// Row-major: entry `(i, j)` lives at `i * dimension + j`.
    bounds: Vec<Bound>,
    /// Whether the matrix is known to be shortest-path closed.
    canonical: bool,
}

impl Zone {
    /// Creates the zone where every clock equals zero.
    ///
    /// # Panics
    ///
    /// Panics if `dimension == 0`; the reference clock is always present.
    pub fn init(dimension: usize) -> Self {
        assert!(dimension >= 1, "Zone dimension must be >= 1");
        Self {
            dimension,
            bounds: vec![Bound::LE_ZERO; dimension * dimension],
            canonical: true,
        }
    }

    /// Number of rows (and columns), i.e. the clock count plus one.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.dimension && j < self.dimension,
            "Entry ({}, {}) is out of range for a zone of dimension {}",
            i,
            j,
            self.dimension
        );
        i * self.dimension + j
    }

    /// Returns the bound on `x_i - x_j`.
    pub fn get(&self, i: usize, j: usize) -> Bound {
        self.bounds[self.offset(i, j)]
    }

    /// Upper bound on clock `clock`, i.e. entry `(clock, 0)`.
    pub fn upper_bound(&self, clock: usize) -> Bound {
        self.get(clock, 0)
    }

    /// Negated lower bound on clock `clock`, i.e. entry `(0, clock)`.
    pub fn lower_bound(&self, clock: usize) -> Bound {
        self.get(0, clock)
    }

    /// Computes the shortest-path closure in place.
    ///
    /// Stops as soon as a negative cycle is found. Every entry of an empty zone
    /// is then set to `< 0`, so all empty zones of one dimension are equal.
    /// Calling it on a canonical zone is a no-op.
    pub fn canonicalize(&mut self) {
        if self.canonical {
            return;
        }

        let n = self.dimension;
        for k in 0..n {
            for i in 0..n {
                let d_ik = self.bounds[i * n + k];
                if d_ik.is_infinite() {
                    continue;
                }
                for j in 0..n {
                    let via = d_ik + self.bounds[k * n + j];
                    if via < self.bounds[i * n + j] {
                        self.bounds[i * n + j] = via;
                    }
                }
                if self.bounds[i * n + i].is_negative() {
                    debug!("canonicalize: negative cycle through clock {}", i);
                    self.bounds.fill(Bound::LT_ZERO);
                    self.canonical = true;
                    return;
                }
            }
        }

        self.canonical = true;
    }

    /// Returns a canonical view of this zone, cloning only when necessary.
    fn closed(&self) -> Cow<'_, Zone> {
        if self.canonical {
            Cow::Borrowed(self)
        } else {
            let mut z = self.clone();
            z.canonicalize();
            Cow::Owned(z)
        }
    }

    /// Returns `true` iff the zone contains at least one valuation.
    ///
    /// A non-canonical zone is closed on a copy first.
    pub fn is_valid(&self) -> bool {
        let z = self.closed();
        (0..z.dimension).all(|i| !z.bounds[i * z.dimension + i].is_negative())
    }

    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    /// Lets time pass: removes every upper bound `x_i ≤ c` for `i ≥ 1`.
    ///
    /// The zone is closed first if needed, so differences implied by the
    /// dropped upper bounds survive. Differences between clocks and lower
    /// bounds are unchanged and the result is canonical. An empty zone stays
    /// empty.
    pub fn delay(&mut self) {
        self.canonicalize();
        if self.is_empty() {
            return;
        }
        let n = self.dimension;
        for i in 1..n {
            self.bounds[i * n] = Bound::INFINITY;
        }
    }

    /// Tightens entry `(i, j)` to `bound` if `bound` is tighter.
    ///
    /// Does not re-close the matrix; call [`canonicalize`][Zone::canonicalize]
    /// before trusting comparisons.
    pub fn constrain(&mut self, i: usize, j: usize, bound: Bound) {
        let index = self.offset(i, j);
        if bound < self.bounds[index] {
            self.bounds[index] = bound;
            self.canonical = false;
        }
    }

    /// Intersects the zone with the guard `x_clock ⋈ constant`.
    ///
    /// # Panics
    ///
    /// Panics if `clock` is the reference clock or out of range.
    pub fn apply_guard(&mut self, clock: usize, relation: Relation, constant: i32) {
        assert!(
            clock >= 1 && clock < self.dimension,
            "Guard clock index {} is out of range 1..{}",
            clock,
            self.dimension
        );
        match relation {
            Relation::Lt => self.constrain(clock, 0, Bound::lt(constant)),
            Relation::Le => self.constrain(clock, 0, Bound::le(constant)),
            Relation::Ge => self.constrain(0, clock, Bound::le(-constant)),
            Relation::Gt => self.constrain(0, clock, Bound::lt(-constant)),
            Relation::Eq => {
                self.constrain(clock, 0, Bound::le(constant));
                self.constrain(0, clock, Bound::le(-constant));
            }
        }
    }

    /// Assigns `value` to clock `clock`.
    ///
    /// The zone is closed first if needed; the result is canonical.
    ///
    /// # Panics
    ///
    /// Panics if `clock` is the reference clock or out of range, or if `value` is negative.
    pub fn reset(&mut self, clock: usize, value: i32) {
        assert!(
            clock >= 1 && clock < self.dimension,
            "Reset clock index {} is out of range 1..{}",
            clock,
            self.dimension
        );
        assert!(value >= 0, "Clocks cannot be reset to a negative value");

        self.canonicalize();
        if self.is_empty() {
            return;
        }

        let n = self.dimension;
        let pos = Bound::le(value);
        let neg = Bound::le(-value);
        for k in 0..n {
            if k == clock {
                continue;
            }
            self.bounds[clock * n + k] = pos + self.bounds[k];
            self.bounds[k * n + clock] = self.bounds[k * n] + neg;
        }
        self.bounds[clock * n + clock] = Bound::LE_ZERO;
    }

    /// Returns `true` iff every valuation of `self` is also in `other`.
    ///
    /// An empty zone is included in every zone.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions differ.
    pub fn is_subset_eq(&self, other: &Zone) -> bool {
        assert_eq!(
            self.dimension, other.dimension,
            "Cannot compare zones of different dimensions"
        );
        if self.is_empty() {
            return true;
        }
        if other.is_empty() {
            return false;
        }
        let a = self.closed();
        let b = other.closed();
        a.bounds.iter().zip(b.bounds.iter()).all(|(x, y)| x <= y)
    }

    /// Returns `true` iff the valuation `values` (one entry per clock, the
    /// reference clock omitted) satisfies every constraint of the zone.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() + 1 != dimension`.
    pub fn contains(&self, values: &[i32]) -> bool {
        assert_eq!(
            values.len() + 1,
            self.dimension,
            "Valuation must assign every non-reference clock"
        );
        let value = |i: usize| if i == 0 { 0 } else { values[i - 1] };
        let n = self.dimension;
        for i in 0..n {
            for j in 0..n {
                let b = self.bounds[i * n + j];
                if let Some(c) = b.value() {
                    let diff = value(i) - value(j);
                    if diff > c || (b.is_strict() && diff == c) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.bounds == other.bounds
    }
}

impl Eq for Zone {}

impl Hash for Zone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimension.hash(state);
        self.bounds.hash(state);
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dimension;
        for i in 0..n {
            let row: Vec<String> = (0..n).map(|j| self.bounds[i * n + j].to_string()).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    use super::*;

    /// Builds a random canonical zone over `clocks` clocks.
    fn random_zone(rng: &mut ChaCha8Rng, clocks: usize) -> Zone {
        let mut z = Zone::init(clocks + 1);
        z.delay();
        for _ in 0..rng.gen_range(0..4) {
            let clock = rng.gen_range(1..=clocks);
            if rng.gen_bool(0.5) {
                z.reset(clock, rng.gen_range(0..3));
            }
            let relation = [Relation::Lt, Relation::Le, Relation::Ge, Relation::Gt][rng.gen_range(0..4)];
            z.apply_guard(clock, relation, rng.gen_range(0..8));
            z.canonicalize();
            z.delay();
        }
        z.canonicalize();
        z
    }

    /// Two contradictory bounds on clock 1, reached through different paths.
    fn empty_zone(clocks: usize, c: i32) -> Zone {
        let mut z = Zone::init(clocks + 1);
        z.delay();
        z.apply_guard(1, Relation::Le, c);
        z.apply_guard(1, Relation::Gt, c + 1);
        z.canonicalize();
        z
    }

    #[test]
    fn test_init() {
        for n in 1..5 {
            let z = Zone::init(n);
            assert!(z.is_valid());
            assert!(z.is_canonical());
            for i in 0..n {
                for j in 0..n {
                    assert_eq!(z.get(i, j), Bound::LE_ZERO);
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "Zone dimension must be >= 1")]
    fn test_init_zero_panics() {
        Zone::init(0);
    }

    #[test]
    fn test_forced_negative_diagonal_is_invalid() {
        let mut z = Zone::init(3);
        z.constrain(2, 2, Bound::le(-1));
        assert!(!z.is_valid());

        let mut z = Zone::init(1);
        z.constrain(0, 0, Bound::lt(0));
        assert!(z.is_empty());
    }

    #[test]
    fn test_delay_drops_upper_bounds() {
        let mut z = Zone::init(3);
        z.delay();
        assert_eq!(z.upper_bound(1), Bound::INFINITY);
        assert_eq!(z.upper_bound(2), Bound::INFINITY);
        assert_eq!(z.lower_bound(1), Bound::LE_ZERO);
        // Clocks still advance together.
        assert_eq!(z.get(1, 2), Bound::LE_ZERO);
        assert_eq!(z.get(2, 1), Bound::LE_ZERO);
        assert!(z.contains(&[7, 7]));
        assert!(!z.contains(&[7, 6]));
    }

    #[test]
    fn test_guard_then_canonicalize() {
        let mut z = Zone::init(3);
        z.delay();
        z.apply_guard(1, Relation::Le, 4);
        assert!(!z.is_canonical());
        z.canonicalize();
        // x1 == x2, so the bound propagates to x2.
        assert_eq!(z.upper_bound(2), Bound::le(4));
    }

    #[test]
    fn test_guard_eq() {
        let mut z = Zone::init(2);
        z.delay();
        z.apply_guard(1, Relation::Eq, 3);
        z.canonicalize();
        assert!(z.contains(&[3]));
        assert!(!z.contains(&[2]));
        assert!(!z.contains(&[4]));
    }

    #[test]
    fn test_guard_and_complement_are_disjoint() {
        let relations = [Relation::Lt, Relation::Le, Relation::Ge, Relation::Gt];
        for relation in relations {
            for c in 0..4 {
                let mut z = Zone::init(2);
                z.delay();
                z.apply_guard(1, relation, c);
                z.apply_guard(1, relation.complement().unwrap(), c);
                z.canonicalize();
                assert!(!z.is_valid(), "{} {} and its complement overlap", relation, c);
            }
        }
    }

    #[test]
    fn test_strict_bounds_at_same_constant() {
        // x <= 3 && x >= 3 is the single point 3.
        let mut z = Zone::init(2);
        z.delay();
        z.apply_guard(1, Relation::Le, 3);
        z.apply_guard(1, Relation::Ge, 3);
        z.canonicalize();
        assert!(z.is_valid());

        // x < 3 && x >= 3 is empty.
        let mut z = Zone::init(2);
        z.delay();
        z.apply_guard(1, Relation::Lt, 3);
        z.apply_guard(1, Relation::Ge, 3);
        z.canonicalize();
        assert!(!z.is_valid());
    }

    #[test]
    fn test_reset() {
        let mut z = Zone::init(3);
        z.delay();
        z.apply_guard(1, Relation::Ge, 2);
        z.apply_guard(1, Relation::Le, 5);
        z.canonicalize();
        z.reset(1, 0);
        assert!(z.is_canonical());
        assert_eq!(z.upper_bound(1), Bound::LE_ZERO);
        assert_eq!(z.lower_bound(1), Bound::LE_ZERO);
        // x2 kept its window [2, 5].
        assert_eq!(z.upper_bound(2), Bound::le(5));
        assert_eq!(z.lower_bound(2), Bound::le(-2));
        assert_eq!(z.get(2, 1), Bound::le(5));
        assert!(z.contains(&[0, 4]));
        assert!(!z.contains(&[1, 4]));
    }

    #[test]
    fn test_reset_to_value() {
        let mut z = Zone::init(2);
        z.reset(1, 4);
        assert!(z.contains(&[4]));
        assert!(!z.contains(&[0]));
        z.delay();
        assert!(z.contains(&[9]));
        assert!(!z.contains(&[3]));
    }

    #[test]
    fn test_subset() {
        let mut small = Zone::init(2);
        small.delay();
        small.apply_guard(1, Relation::Le, 3);
        small.canonicalize();

        let mut big = Zone::init(2);
        big.delay();
        big.apply_guard(1, Relation::Le, 7);
        big.canonicalize();

        assert!(small.is_subset_eq(&big));
        assert!(!big.is_subset_eq(&small));
        assert!(small.is_subset_eq(&small));
    }

    #[test]
    fn test_subset_strictness_tie() {
        let mut strict = Zone::init(2);
        strict.delay();
        strict.apply_guard(1, Relation::Lt, 3);
        strict.canonicalize();

        let mut non_strict = Zone::init(2);
        non_strict.delay();
        non_strict.apply_guard(1, Relation::Le, 3);
        non_strict.canonicalize();

        assert!(strict.is_subset_eq(&non_strict));
        assert!(!non_strict.is_subset_eq(&strict));
    }

    #[test]
    fn test_empty_is_subset_of_everything() {
        let mut empty = Zone::init(2);
        empty.apply_guard(1, Relation::Ge, 1);
        empty.canonicalize();
        assert!(empty.is_empty());
        let init = Zone::init(2);
        assert!(empty.is_subset_eq(&init));
        assert!(!init.is_subset_eq(&empty));
    }

    #[test]
    fn test_empty_zones_are_equal() {
        let mut a = Zone::init(2);
        a.apply_guard(1, Relation::Ge, 1);
        a.canonicalize();

        let mut b = Zone::init(2);
        b.delay();
        b.apply_guard(1, Relation::Le, 3);
        b.apply_guard(1, Relation::Ge, 5);
        b.canonicalize();

        assert!(a.is_canonical() && b.is_canonical());
        assert!(a.is_subset_eq(&b) && b.is_subset_eq(&a));
        assert_eq!(a, b);
        assert!((0..2).all(|i| (0..2).all(|j| a.get(i, j) == Bound::LT_ZERO)));
    }

    #[test]
    fn test_empty_zone_stays_empty() {
        let mut z = empty_zone(2, 2);
        let before = z.clone();
        z.delay();
        assert_eq!(z, before);
        z.reset(1, 0);
        assert_eq!(z, before);
        assert!(!z.contains(&[0, 0]));
    }

    #[test]
    fn test_delay_closes_first() {
        // y was reset after x, so only y - x <= 0 is stored. The bounds x <= 3
        // and y >= 3 additionally imply x - y <= 0, which must outlive delay.
        let mut z = Zone::init(3);
        z.delay();
        z.reset(2, 0);
        z.delay();
        assert_eq!(z.get(1, 2), Bound::INFINITY);
        z.apply_guard(1, Relation::Le, 3);
        z.apply_guard(2, Relation::Ge, 3);
        assert!(!z.is_canonical());

        let mut closed = z.clone();
        closed.canonicalize();
        closed.delay();

        z.delay();
        assert!(z.is_canonical());
        assert_eq!(z, closed);
        assert_eq!(z.get(1, 2), Bound::LE_ZERO);
        assert_eq!(z.upper_bound(1), Bound::INFINITY);
    }

    #[test]
    #[should_panic(expected = "different dimensions")]
    fn test_subset_dimension_mismatch_panics() {
        Zone::init(2).is_subset_eq(&Zone::init(3));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_guard_on_reference_clock_panics() {
        Zone::init(2).apply_guard(0, Relation::Le, 1);
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let z = random_zone(&mut rng, 3);
            let mut again = z.clone();
            again.canonical = false;
            again.canonicalize();
            assert_eq!(z, again);
        }
    }

    #[test]
    fn test_inclusion_antisymmetry() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut zones: Vec<Zone> = (0..60).map(|_| random_zone(&mut rng, 2)).collect();
        zones.push(empty_zone(2, 1));
        zones.push(empty_zone(2, 5));
        assert!(zones.iter().filter(|z| z.is_empty()).count() >= 2);
        for a in &zones {
            for b in &zones {
                if a.is_subset_eq(b) && b.is_subset_eq(a) {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_inclusion_matches_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        for _ in 0..100 {
            let a = random_zone(&mut rng, 2);
            let b = random_zone(&mut rng, 2);
            if a.is_subset_eq(&b) {
                for x in 0..12 {
                    for y in 0..12 {
                        if a.contains(&[x, y]) {
                            assert!(b.contains(&[x, y]), "({}, {}) in a but not in b", x, y);
                        }
                    }
                }
            }
        }
    }
}
