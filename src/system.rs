//! Transition systems over one or more automata.
//!
//! A [`TransitionSystem`] turns static automata into a symbolic state space:
//! it builds the initial [`State`] and enumerates the successors reachable on
//! a channel. Two implementations are provided:
//!
//! - [`SimpleSystem`]: a single automaton.
//! - [`ProductSystem`]: the parallel composition of several automata that
//!   synchronize on shared channels.
//!
//! # Clock layout
//!
//! Every component keeps its own clocks. A system concatenates them into one
//! global list, so the DBM index of local clock `c` of component `k` is
//! `offset[k] + c + 1`; index `0` is the reference clock.
//!
//! # Successor zones
//!
//! Firing a tuple of edges from a state copies the state's zone and then:
//!
//! 1. intersects it with the guards of every edge and closes it,
//! 2. applies the updates of every edge,
//! 3. intersects it with the target invariants and closes it (the *arrival zone*),
//! 4. lets time pass and intersects it with the target invariants again.
//!
//! A tuple whose zone becomes empty at step 1 or 3 is infeasible and is
//! silently dropped.

use std::collections::BTreeSet;

use log::debug;

use crate::automaton::{Automaton, Channel, Clock, Edge, Guard, Update};
use crate::error::ModelError;
use crate::state::{State, SymbolicLocation, Transition};
use crate::types::ClockId;
use crate::utils::cartesian_product;
use crate::zone::Zone;

/// A symbolic state space with an input/output alphabet.
pub trait TransitionSystem {
    /// Component automata, in composition order.
    fn components(&self) -> &[Automaton];

    /// Global clock list (without the reference clock).
    fn clocks(&self) -> &[Clock];

    /// Dimension of every zone of this system.
    fn dimension(&self) -> usize {
        self.clocks().len() + 1
    }

    fn inputs(&self) -> &BTreeSet<Channel>;

    fn outputs(&self) -> &BTreeSet<Channel>;

    fn initial_state(&self) -> State;

    /// All feasible transitions leaving `state` on `channel`.
    fn next_transitions(&self, state: &State, channel: &Channel) -> Vec<Transition<'_>>;

    /// Targets of [`next_transitions`][TransitionSystem::next_transitions].
    fn next_states(&self, state: &State, channel: &Channel) -> Vec<State> {
        self.next_transitions(state, channel)
            .into_iter()
            .map(|t| t.target)
            .collect()
    }

    /// Same components, alphabet, clocks and zone dimension.
    fn structurally_eq(&self, other: &dyn TransitionSystem) -> bool {
        self.components() == other.components()
            && self.inputs() == other.inputs()
            && self.outputs() == other.outputs()
            && self.clocks() == other.clocks()
            && self.dimension() == other.dimension()
    }
}

/// Components plus their placement in the global clock list.
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    automata: Vec<Automaton>,
    clocks: Vec<Clock>,
    offsets: Vec<usize>,
}

impl Layout {
    fn new(automata: Vec<Automaton>, qualify_clocks: bool) -> Self {
        let mut clocks = Vec::new();
        let mut offsets = Vec::with_capacity(automata.len());
        for automaton in &automata {
            offsets.push(clocks.len());
            for clock in automaton.clocks() {
                if qualify_clocks {
                    clocks.push(Clock::new(format!("{}.{}", automaton.name(), clock.name())));
                } else {
                    clocks.push(clock.clone());
                }
            }
        }
        Self {
            automata,
            clocks,
            offsets,
        }
    }

    fn dimension(&self) -> usize {
        self.clocks.len() + 1
    }

    /// DBM index of local clock `clock` of component `component`.
    fn global_clock(&self, component: usize, clock: ClockId) -> usize {
        self.offsets[component] + clock.index() + 1
    }

    fn apply_guards(&self, zone: &mut Zone, component: usize, guards: &[Guard]) {
        for guard in guards {
            zone.apply_guard(self.global_clock(component, guard.clock), guard.relation, guard.constant);
        }
    }

    fn apply_updates(&self, zone: &mut Zone, component: usize, updates: &[Update]) {
        for update in updates {
            zone.reset(self.global_clock(component, update.clock), update.value);
        }
    }

    fn apply_invariants(&self, zone: &mut Zone, location: &SymbolicLocation) {
        for (component, automaton) in self.automata.iter().enumerate() {
            let invariants = automaton.location(location.get(component)).invariants();
            self.apply_guards(zone, component, invariants);
        }
    }

    /// Steps 3 and 4 of successor construction; `None` if the invariants cannot hold.
    fn settle(&self, location: SymbolicLocation, mut zone: Zone) -> Option<State> {
        self.apply_invariants(&mut zone, &location);
        zone.canonicalize();
        if zone.is_empty() {
            return None;
        }
        let arrival_zone = zone.clone();
        zone.delay();
        self.apply_invariants(&mut zone, &location);
        zone.canonicalize();
        Some(State::new(location, zone, arrival_zone))
    }

    fn initial_state(&self) -> State {
        let location = SymbolicLocation::new(self.automata.iter().map(|a| a.initial_location()).collect());
        let zone = Zone::init(self.dimension());
        match self.settle(location.clone(), zone.clone()) {
            Some(state) => state,
            // Initial invariants exclude time zero: keep the empty zone so
            // that the state has no successors.
            None => {
                let mut empty = zone;
                self.apply_invariants(&mut empty, &location);
                empty.canonicalize();
                State::new(location, empty.clone(), empty)
            }
        }
    }

    /// Fires one edge per participating component.
    fn fire<'a>(&'a self, source: &State, firing: &[Option<&'a Edge>]) -> Option<Transition<'a>> {
        assert_eq!(firing.len(), self.automata.len(), "One entry per component is required");
        assert_eq!(
            source.zone().dimension(),
            self.dimension(),
            "State does not belong to this system"
        );

        let mut zone = source.zone().clone();
        for (component, edge) in firing.iter().enumerate() {
            if let Some(edge) = edge {
                self.apply_guards(&mut zone, component, &edge.guards);
            }
        }
        zone.canonicalize();
        if zone.is_empty() {
            return None;
        }

        for (component, edge) in firing.iter().enumerate() {
            if let Some(edge) = edge {
                self.apply_updates(&mut zone, component, &edge.updates);
            }
        }

        let target = SymbolicLocation::new(
            firing
                .iter()
                .enumerate()
                .map(|(component, edge)| match edge {
                    Some(edge) => edge.target,
                    None => source.location().get(component),
                })
                .collect(),
        );

        let target = self.settle(target, zone)?;
        Some(Transition {
            source: source.clone(),
            target,
            edges: firing.to_vec(),
        })
    }
}

/// A transition system over exactly one automaton.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSystem {
    layout: Layout,
}

impl SimpleSystem {
    pub fn new(automaton: Automaton) -> Self {
        Self {
            layout: Layout::new(vec![automaton], false),
        }
    }

    pub fn automaton(&self) -> &Automaton {
        &self.layout.automata[0]
    }
}

impl TransitionSystem for SimpleSystem {
    fn components(&self) -> &[Automaton] {
        &self.layout.automata
    }

    fn clocks(&self) -> &[Clock] {
        &self.layout.clocks
    }

    fn inputs(&self) -> &BTreeSet<Channel> {
        self.automaton().inputs()
    }

    fn outputs(&self) -> &BTreeSet<Channel> {
        self.automaton().outputs()
    }

    fn initial_state(&self) -> State {
        self.layout.initial_state()
    }

    fn next_transitions(&self, state: &State, channel: &Channel) -> Vec<Transition<'_>> {
        let automaton = self.automaton();
        let transitions: Vec<_> = automaton
            .edges_from(state.location().get(0), channel)
            .filter_map(|edge| self.layout.fire(state, &[Some(edge)]))
            .collect();
        debug!(
            "{}: {} transition(s) on {} from {}",
            automaton.name(),
            transitions.len(),
            channel,
            state.location()
        );
        transitions
    }
}

/// The parallel composition of several automata.
///
/// Components synchronize on every channel they share. A component whose
/// alphabet lacks a channel does not take part in transitions on it and keeps
/// its location. Outputs of the composition are the outputs of its components;
/// inputs are the component inputs that no component outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSystem {
    layout: Layout,
    inputs: BTreeSet<Channel>,
    outputs: BTreeSet<Channel>,
}

impl ProductSystem {
    /// Composes `automata`.
    ///
    /// Fails if `automata` is empty or if two components output the same channel.
    pub fn new(automata: Vec<Automaton>) -> Result<Self, ModelError> {
        if automata.is_empty() {
            return Err(ModelError::EmptyComposition);
        }

        let mut outputs = BTreeSet::new();
        for (i, a) in automata.iter().enumerate() {
            for b in &automata[i + 1..] {
                if let Some(channel) = a.outputs().intersection(b.outputs()).next() {
                    return Err(ModelError::OverlappingOutputs {
                        channel: channel.to_string(),
                        first: a.name().to_string(),
                        second: b.name().to_string(),
                    });
                }
            }
            outputs.extend(a.outputs().iter().cloned());
        }

        let inputs: BTreeSet<Channel> = automata
            .iter()
            .flat_map(|a| a.inputs().iter())
            .filter(|c| !outputs.contains(*c))
            .cloned()
            .collect();

        debug!(
            "compose {} automata: {} input(s), {} output(s)",
            automata.len(),
            outputs.len(),
            inputs.len()
        );

        Ok(Self {
            layout: Layout::new(automata, true),
            inputs,
            outputs,
        })
    }
}

impl TransitionSystem for ProductSystem {
    fn components(&self) -> &[Automaton] {
        &self.layout.automata
    }

    fn clocks(&self) -> &[Clock] {
        &self.layout.clocks
    }

    fn inputs(&self) -> &BTreeSet<Channel> {
        &self.inputs
    }

    fn outputs(&self) -> &BTreeSet<Channel> {
        &self.outputs
    }

    fn initial_state(&self) -> State {
        self.layout.initial_state()
    }

    fn next_transitions(&self, state: &State, channel: &Channel) -> Vec<Transition<'_>> {
        let mut candidates: Vec<Vec<Option<&Edge>>> = Vec::with_capacity(self.layout.automata.len());
        let mut participants = 0;
        for (component, automaton) in self.layout.automata.iter().enumerate() {
            if !automaton.has_channel(channel) {
                candidates.push(vec![None]);
                continue;
            }
            participants += 1;
            let edges: Vec<_> = automaton
                .edges_from(state.location().get(component), channel)
                .map(Some)
                .collect();
            if edges.is_empty() {
                debug!("{} blocks {} at {}", automaton.name(), channel, state.location());
                return Vec::new();
            }
            candidates.push(edges);
        }
        if participants == 0 {
            return Vec::new();
        }

        let transitions: Vec<_> = cartesian_product(&candidates)
            .iter()
            .filter_map(|firing| self.layout.fire(state, firing))
            .collect();
        debug!(
            "product: {} transition(s) on {} from {}",
            transitions.len(),
            channel,
            state.location()
        );
        transitions
    }
}
