//! Type-safe indices into an automaton.
//!
//! Clocks, locations and edges live in flat vectors owned by their
//! [`Automaton`][crate::automaton::Automaton]. These newtypes keep the three
//! index spaces apart. All of them are automaton-local and 0-based; the
//! mapping of a local clock into the global DBM index space of a transition
//! system is done by the system itself (see [`crate::system`]).
use std::fmt;

/// A clock index, local to one automaton.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClockId(u32);

impl ClockId {
    pub fn new(index: usize) -> Self {
        ClockId(index as u32)
    }

    /// Returns the raw index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A location index, local to one automaton.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LocationId(u32);

impl LocationId {
    pub fn new(index: usize) -> Self {
        LocationId(index as u32)
    }

    /// Returns the raw index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// An edge index, local to one automaton.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EdgeId(u32);

impl EdgeId {
    pub fn new(index: usize) -> Self {
        EdgeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}
