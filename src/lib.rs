//! # tioa: Refinement Checking for Timed I/O Automata
//!
//! **`tioa`** checks whether one network of timed input/output automata *refines* another.
//! It is designed for compositional verification of real-time components: a specification
//! describes what a component may emit and must accept, an implementation is checked against it.
//!
//! ## What is a Zone?
//!
//! Clocks take real values, so a timed automaton has infinitely many concrete states.
//! Zones are convex sets of clock valuations described by constraints of the form
//! `x - y ≺ c`, and are stored as **difference-bound matrices** (DBMs).
//! A canonical DBM is a **unique** representation of its zone, which makes inclusion a
//! pointwise comparison. Every search in this crate works on pairs of *symbolic states*:
//! a location per component plus a zone.
//!
//! ## Key Features
//!
//! - **Validated Models**: Automata are assembled with an [`AutomatonBuilder`][crate::automaton::AutomatonBuilder]
//!   that rejects dangling references and conflicting channel directions before any search runs.
//! - **Composition**: A [`ProductSystem`][crate::system::ProductSystem] synchronizes several automata on
//!   shared channels. Outputs are owned by exactly one component.
//! - **Bounded Search**: A [`SearchConfig`][crate::refinement::SearchConfig] caps the number of explored states
//!   and can be cancelled from another thread.
//! - **Explained Failures**: A failed check returns the offending state pair and channel.
//!
//! ## Basic Usage
//!
//! ```rust
//! use tioa::automaton::{AutomatonBuilder, Edge, Guard, Update};
//! use tioa::refinement::refines;
//! use tioa::system::SimpleSystem;
//!
//! // 1. A machine that serves tea within 5 time units of a coin
//! let machine = |deadline| {
//!     let mut b = AutomatonBuilder::new("Machine");
//!     let x = b.clock("x");
//!     let coin = b.input("coin");
//!     let tea = b.output("tea");
//!     let idle = b.initial_location("Idle");
//!     let busy = b.location("Busy");
//!     b.invariant(busy, Guard::le(x, deadline));
//!     b.edge(Edge::new(idle, busy, &coin).with_update(Update::reset(x)));
//!     b.edge(Edge::new(busy, idle, &tea));
//!     b.build().unwrap()
//! };
//!
//! // 2. Wrap the automata into transition systems
//! let fast = SimpleSystem::new(machine(5));
//! let slow = SimpleSystem::new(machine(10));
//!
//! // 3. Check refinement
//! assert!(refines(&fast, &slow));
//! assert!(refines(&fast, &fast));
//! ```
//!
//! ## Core Components
//!
//! - **[`zone`]**: The DBM and its operations (canonical form, delay, guards, resets, inclusion).
//! - **[`automaton`]**: Clocks, channels, locations, edges, and the builder.
//! - **[`system`]**: Transition systems over one automaton or a product of several.
//! - **[`refinement`]**: The refinement search and its verdicts.
//! - **[`dot`]**: Utilities for visualizing automata using Graphviz.
//!
//! For a deep dive into the search, check the [`refinement`] module documentation.

pub mod automaton;
pub mod bound;
pub mod debug;
pub mod dot;
pub mod error;
pub mod refinement;
pub mod state;
pub mod system;
pub mod types;
pub mod utils;
pub mod zone;
