//! Timed input/output automata.
//!
//! An [`Automaton`] is a finite set of [`Location`]s connected by [`Edge`]s.
//! Every edge carries a [`Channel`], a conjunction of clock [`Guard`]s and a
//! list of clock [`Update`]s. Each location has an invariant that must hold
//! while time elapses there. Channels are declared per automaton either as
//! inputs or as outputs.
//!
//! Automata are immutable once built. Use [`AutomatonBuilder`] to assemble
//! one; [`AutomatonBuilder::build`] checks that every reference is resolvable
//! and that every constant fits a zone bound.
//!
//! # Examples
//!
//! ```
//! use tioa::automaton::{AutomatonBuilder, Edge, Guard, Update};
//!
//! let mut b = AutomatonBuilder::new("Coffee");
//! let x = b.clock("x");
//! let coin = b.input("coin");
//! let coffee = b.output("coffee");
//! let idle = b.initial_location("Idle");
//! let busy = b.location("Busy");
//! b.invariant(busy, Guard::le(x, 5));
//! b.edge(Edge::new(idle, busy, &coin).with_update(Update::reset(x)));
//! b.edge(Edge::new(busy, idle, &coffee).with_guard(Guard::ge(x, 2)));
//!
//! let machine = b.build().unwrap();
//! assert_eq!(machine.locations().len(), 2);
//! assert_eq!(machine.edges_from(idle, &coin).count(), 1);
//! assert_eq!(machine.edges_from(idle, &coffee).count(), 0);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::bound::MAX_CONSTANT;
use crate::error::ModelError;
use crate::types::{ClockId, EdgeId, LocationId};
use crate::zone::Relation;

/// A clock identity. Clocks have no value of their own; valuations live in zones.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Clock {
    name: String,
}

impl Clock {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A synchronization channel, identified by name.
///
/// Its [`Direction`] is a property of the automaton that declares it.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Channel(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel::new(name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// The clock constraint `clock ⋈ constant`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Guard {
    pub clock: ClockId,
    pub relation: Relation,
    pub constant: i32,
}

impl Guard {
    pub fn new(clock: ClockId, relation: Relation, constant: i32) -> Self {
        Self {
            clock,
            relation,
            constant,
        }
    }

    pub fn lt(clock: ClockId, constant: i32) -> Self {
        Self::new(clock, Relation::Lt, constant)
    }
    pub fn le(clock: ClockId, constant: i32) -> Self {
        Self::new(clock, Relation::Le, constant)
    }
    pub fn exactly(clock: ClockId, constant: i32) -> Self {
        Self::new(clock, Relation::Eq, constant)
    }
    pub fn ge(clock: ClockId, constant: i32) -> Self {
        Self::new(clock, Relation::Ge, constant)
    }
    pub fn gt(clock: ClockId, constant: i32) -> Self {
        Self::new(clock, Relation::Gt, constant)
    }
}

/// The assignment `clock := value`, applied when an edge is taken.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Update {
    pub clock: ClockId,
    pub value: i32,
}

impl Update {
    pub fn new(clock: ClockId, value: i32) -> Self {
        Self { clock, value }
    }

    /// Resets `clock` to zero.
    pub fn reset(clock: ClockId) -> Self {
        Self::new(clock, 0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Location {
    name: String,
    invariants: Vec<Guard>,
    initial: bool,
}

impl Location {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Guards that must hold while time elapses in this location.
    pub fn invariants(&self) -> &[Guard] {
        &self.invariants
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edge {
    pub source: LocationId,
    pub target: LocationId,
    pub channel: Channel,
    pub guards: Vec<Guard>,
    pub updates: Vec<Update>,
}

impl Edge {
    pub fn new(source: LocationId, target: LocationId, channel: &Channel) -> Self {
        Self {
            source,
            target,
            channel: channel.clone(),
            guards: Vec::new(),
            updates: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn with_update(mut self, update: Update) -> Self {
        self.updates.push(update);
        self
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Automaton {
    name: String,
    clocks: Vec<Clock>,
    locations: Vec<Location>,
    edges: Vec<Edge>,
    inputs: BTreeSet<Channel>,
    outputs: BTreeSet<Channel>,
    initial: LocationId,
    /// Outgoing edges per `(source, channel)`, in declaration order.
    outgoing: FxHashMap<(LocationId, Channel), Vec<EdgeId>>,
}

impl Automaton {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clocks(&self) -> &[Clock] {
        &self.clocks
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    /// Looks a location up by name.
    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.locations.iter().position(|l| l.name == name).map(LocationId::new)
    }

    pub fn initial_location(&self) -> LocationId {
        self.initial
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn inputs(&self) -> &BTreeSet<Channel> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeSet<Channel> {
        &self.outputs
    }

    /// Returns the declared direction of `channel`, or `None` if it is not in the alphabet.
    pub fn direction(&self, channel: &Channel) -> Option<Direction> {
        if self.inputs.contains(channel) {
            Some(Direction::Input)
        } else if self.outputs.contains(channel) {
            Some(Direction::Output)
        } else {
            None
        }
    }

    /// Returns `true` if `channel` is one of this automaton's inputs or outputs.
    pub fn has_channel(&self, channel: &Channel) -> bool {
        self.direction(channel).is_some()
    }

    /// Iterates the edges leaving `location` on `channel`.
    pub fn edges_from<'a>(&'a self, location: LocationId, channel: &Channel) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing
            .get(&(location, channel.clone()))
            .into_iter()
            .flatten()
            .map(move |&id| self.edge(id))
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} locations, {} edges, {} clocks)",
            self.name,
            self.locations.len(),
            self.edges.len(),
            self.clocks.len()
        )
    }
}

/// Incremental constructor for [`Automaton`].
///
/// Identifiers returned by the builder are valid for the built automaton.
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    name: String,
    clocks: Vec<Clock>,
    locations: Vec<Location>,
    edges: Vec<Edge>,
    inputs: BTreeSet<Channel>,
    outputs: BTreeSet<Channel>,
}

impl AutomatonBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn clock(&mut self, name: impl Into<String>) -> ClockId {
        self.clocks.push(Clock::new(name));
        ClockId::new(self.clocks.len() - 1)
    }

    pub fn input(&mut self, name: impl Into<String>) -> Channel {
        let channel = Channel::new(name);
        self.inputs.insert(channel.clone());
        channel
    }

    pub fn output(&mut self, name: impl Into<String>) -> Channel {
        let channel = Channel::new(name);
        self.outputs.insert(channel.clone());
        channel
    }

    fn add_location(&mut self, name: String, initial: bool) -> LocationId {
        self.locations.push(Location {
            name,
            invariants: Vec::new(),
            initial,
        });
        LocationId::new(self.locations.len() - 1)
    }

    pub fn location(&mut self, name: impl Into<String>) -> LocationId {
        self.add_location(name.into(), false)
    }

    pub fn initial_location(&mut self, name: impl Into<String>) -> LocationId {
        self.add_location(name.into(), true)
    }

    /// Adds `guard` to the invariant of `location`.
    ///
    /// # Panics
    ///
    /// Panics if `location` was not created by this builder.
    pub fn invariant(&mut self, location: LocationId, guard: Guard) -> &mut Self {
        self.locations[location.index()].invariants.push(guard);
        self
    }

    pub fn edge(&mut self, edge: Edge) -> EdgeId {
        self.edges.push(edge);
        EdgeId::new(self.edges.len() - 1)
    }

    /// Validates the collected parts and freezes them into an [`Automaton`].
    pub fn build(self) -> Result<Automaton, ModelError> {
        let name = self.name;
        let num_clocks = self.clocks.len();
        let num_locations = self.locations.len();

        let mut seen = FxHashSet::default();
        for clock in &self.clocks {
            if !seen.insert(clock.name()) {
                return Err(ModelError::DuplicateClock {
                    automaton: name,
                    clock: clock.name().to_string(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for location in &self.locations {
            if !seen.insert(location.name()) {
                return Err(ModelError::DuplicateLocation {
                    automaton: name,
                    location: location.name().to_string(),
                });
            }
        }

        if let Some(channel) = self.inputs.intersection(&self.outputs).next() {
            return Err(ModelError::ChannelDirectionConflict {
                automaton: name,
                channel: channel.to_string(),
            });
        }

        let mut initials = self.locations.iter().enumerate().filter(|(_, l)| l.initial);
        let initial = match (initials.next(), initials.next()) {
            (None, _) => return Err(ModelError::NoInitialLocation { automaton: name }),
            (Some((_, first)), Some((_, second))) => {
                return Err(ModelError::MultipleInitialLocations {
                    automaton: name.clone(),
                    first: first.name.clone(),
                    second: second.name.clone(),
                })
            }
            (Some((i, _)), None) => LocationId::new(i),
        };

        let check_clock = |clock: ClockId| {
            if clock.index() < num_clocks {
                Ok(())
            } else {
                Err(ModelError::UnknownClock {
                    automaton: name.clone(),
                    clock,
                })
            }
        };
        let check_location = |location: LocationId| {
            if location.index() < num_locations {
                Ok(())
            } else {
                Err(ModelError::UnknownLocation {
                    automaton: name.clone(),
                    location,
                })
            }
        };

        let check_guard = |guard: &Guard| -> Result<(), ModelError> {
            check_clock(guard.clock)?;
            if (-MAX_CONSTANT..=MAX_CONSTANT).contains(&guard.constant) {
                Ok(())
            } else {
                Err(ModelError::ConstantOutOfRange {
                    automaton: name.clone(),
                    clock: guard.clock,
                    constant: guard.constant,
                    max: MAX_CONSTANT,
                })
            }
        };
        let check_update = |update: &Update| -> Result<(), ModelError> {
            check_clock(update.clock)?;
            if update.value < 0 {
                Err(ModelError::NegativeReset {
                    automaton: name.clone(),
                    clock: update.clock,
                    value: update.value,
                })
            } else if update.value > MAX_CONSTANT {
                Err(ModelError::ConstantOutOfRange {
                    automaton: name.clone(),
                    clock: update.clock,
                    constant: update.value,
                    max: MAX_CONSTANT,
                })
            } else {
                Ok(())
            }
        };

        for location in &self.locations {
            for guard in &location.invariants {
                check_guard(guard)?;
            }
        }

        let mut outgoing: FxHashMap<(LocationId, Channel), Vec<EdgeId>> = FxHashMap::default();
        for (i, edge) in self.edges.iter().enumerate() {
            check_location(edge.source)?;
            check_location(edge.target)?;
            for guard in &edge.guards {
                check_guard(guard)?;
            }
            for update in &edge.updates {
                check_update(update)?;
            }
            if !self.inputs.contains(&edge.channel) && !self.outputs.contains(&edge.channel) {
                return Err(ModelError::UndeclaredChannel {
                    automaton: name.clone(),
                    channel: edge.channel.to_string(),
                });
            }
            outgoing
                .entry((edge.source, edge.channel.clone()))
                .or_default()
                .push(EdgeId::new(i));
        }

        Ok(Automaton {
            name,
            clocks: self.clocks,
            locations: self.locations,
            edges: self.edges,
            inputs: self.inputs,
            outputs: self.outputs,
            initial,
            outgoing,
        })
    }
}
