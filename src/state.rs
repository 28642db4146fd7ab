//! Symbolic states of a transition system.
//!
//! A [`State`] pairs a [`SymbolicLocation`] (one location per component
//! automaton) with the [`Zone`] of clock valuations reachable there. States
//! are created by a [`TransitionSystem`][crate::system::TransitionSystem] and
//! derive their zones by copying the parent's zone, never by sharing it.

use std::fmt;

use crate::automaton::Edge;
use crate::types::LocationId;
use crate::zone::Zone;

/// A vector of locations, one per component automaton.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SymbolicLocation(Vec<LocationId>);

impl SymbolicLocation {
    pub fn new(locations: Vec<LocationId>) -> Self {
        SymbolicLocation(locations)
    }

    pub fn locations(&self) -> &[LocationId] {
        &self.0
    }

    /// Location of the `component`-th automaton.
    pub fn get(&self, component: usize) -> LocationId {
        self.0[component]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SymbolicLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|l| l.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// A symbolic state.
///
/// # Invariants
///
/// - `zone` is canonical and, unless empty, satisfies the invariants of every
///   location in `location`.
/// - `arrival_zone` is the zone at the instant of arrival, before time elapsed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct State {
    location: SymbolicLocation,
    zone: Zone,
    arrival_zone: Zone,
}

impl State {
    pub fn new(location: SymbolicLocation, zone: Zone, arrival_zone: Zone) -> Self {
        assert_eq!(
            zone.dimension(),
            arrival_zone.dimension(),
            "Zone and arrival zone must have the same dimension"
        );
        Self {
            location,
            zone,
            arrival_zone,
        }
    }

    pub fn location(&self) -> &SymbolicLocation {
        &self.location
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn arrival_zone(&self) -> &Zone {
        &self.arrival_zone
    }

    /// Returns `true` if `other` is at the same location with a zone that includes ours.
    pub fn is_covered_by(&self, other: &State) -> bool {
        self.location == other.location && self.zone.is_subset_eq(&other.zone)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.location, self.zone.to_string().trim_end().replace('\n', " "))
    }
}

/// One synchronized step of a transition system.
///
/// `edges` has one entry per component: the edge it fired, or `None` if the
/// component did not take part in the synchronization.
#[derive(Debug, Clone)]
pub struct Transition<'a> {
    pub source: State,
    pub target: State,
    pub edges: Vec<Option<&'a Edge>>,
}
