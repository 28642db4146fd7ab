//! Packed difference bounds.
//!
//! A [`Bound`] is one entry of a difference-bound matrix: the constraint
//! `x_i - x_j ⋈ c` where `⋈` is either `<` or `≤`. Both parts are packed into
//! a single `i32`:
//!
//! ```text
//! raw = (c << 1) | (⋈ == ≤)
//! ```
//!
//! With this encoding the natural integer order of the raw value coincides with
//! the tightness order of bounds: `(c, <)` is tighter than `(c, ≤)`, which is
//! tighter than `(c + 1, <)`. Unbounded entries are stored as `i32::MAX`.
//!
//! # Examples
//!
//! ```
//! use tioa::bound::Bound;
//!
//! let a = Bound::le(3);
//! let b = Bound::lt(4);
//! assert!(a < b);
//! assert_eq!(a + b, Bound::lt(7));
//! assert_eq!(a + Bound::INFINITY, Bound::INFINITY);
//! ```

use std::fmt::{Display, Formatter};
use std::ops::Add;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bound(i32);

/// Largest absolute constant that can be stored without overflowing the encoding.
pub const MAX_CONSTANT: i32 = (i32::MAX >> 2) - 1;

impl Bound {
    /// The absent constraint, `< ∞`.
    pub const INFINITY: Bound = Bound(i32::MAX);

    /// The constraint `≤ 0`, found on the diagonal of every non-empty zone.
    pub const LE_ZERO: Bound = Bound(1);

    /// The constraint `< 0`. Any diagonal entry at or below it marks an empty zone.
    pub const LT_ZERO: Bound = Bound(0);

    /// Creates the non-strict bound `≤ value`.
    ///
    /// # Panics
    ///
    /// Panics if `|value|` exceeds [`MAX_CONSTANT`].
    pub const fn le(value: i32) -> Self {
        assert!(
            value <= MAX_CONSTANT && value >= -MAX_CONSTANT,
            "Bound constant is out of range"
        );
        Bound((value << 1) | 1)
    }

    /// Creates the strict bound `< value`.
    ///
    /// # Panics
    ///
    /// Panics if `|value|` exceeds [`MAX_CONSTANT`].
    pub const fn lt(value: i32) -> Self {
        assert!(
            value <= MAX_CONSTANT && value >= -MAX_CONSTANT,
            "Bound constant is out of range"
        );
        Bound(value << 1)
    }

    /// Creates a bound from its constant and strictness.
    pub const fn new(value: i32, strict: bool) -> Self {
        if strict {
            Self::lt(value)
        } else {
            Self::le(value)
        }
    }

    /// Return the internal representation of the bound.
    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn is_infinite(self) -> bool {
        self.0 == i32::MAX
    }

    pub const fn is_strict(self) -> bool {
        self.0 & 1 == 0
    }

    /// Returns the integer constant, or `None` for `+∞`.
    pub const fn value(self) -> Option<i32> {
        if self.is_infinite() {
            None
        } else {
            Some(self.0 >> 1)
        }
    }

    /// Returns `true` if this bound, placed on a diagonal, makes the zone empty.
    pub const fn is_negative(self) -> bool {
        self.0 < Self::LE_ZERO.0
    }
}

impl Add for Bound {
    type Output = Bound;

    /// Sums two bounds; the result is strict if either operand is strict.
    fn add(self, rhs: Self) -> Self::Output {
        if self.is_infinite() || rhs.is_infinite() {
            return Bound::INFINITY;
        }
        Bound(self.0 + rhs.0 - ((self.0 & 1) | (rhs.0 & 1)))
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value() {
            None => write!(f, "<∞"),
            Some(v) if self.is_strict() => write!(f, "<{}", v),
            Some(v) => write!(f, "≤{}", v),
        }
    }
}
