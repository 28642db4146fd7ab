//! Debug utilities for inspecting zones and states.
//!
//! This module renders DBMs as readable clock constraints. These are mostly
//! useful in tests, in log output, and when reporting counterexamples.

use crate::automaton::Clock;
use crate::bound::Bound;
use crate::state::State;
use crate::system::TransitionSystem;
use crate::zone::Zone;

impl Zone {
    /// Lists the non-trivial constraints of the zone.
    ///
    /// Clock `i` (for `i ≥ 1`) is named after `clocks[i - 1]`. Lower bounds of
    /// `≥ 0` and unbounded entries are omitted. An empty zone yields `["false"]`.
    ///
    /// # Panics
    ///
    /// Panics if `clocks.len() + 1 != dimension`.
    pub fn constraints(&self, clocks: &[Clock]) -> Vec<String> {
        assert_eq!(clocks.len() + 1, self.dimension(), "One name per clock is required");

        if self.is_empty() {
            return vec!["false".to_string()];
        }

        let name = |i: usize| clocks[i - 1].name();
        let n = self.dimension();
        let mut result = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let bound = self.get(i, j);
                let Some(c) = bound.value() else {
                    continue;
                };
                let (lt, le) = if bound.is_strict() { ("<", ">") } else { ("<=", ">=") };
                if j == 0 {
                    result.push(format!("{} {} {}", name(i), lt, c));
                } else if i == 0 {
                    if bound == Bound::LE_ZERO {
                        continue;
                    }
                    result.push(format!("{} {} {}", name(j), le, -c));
                } else {
                    result.push(format!("{} - {} {} {}", name(i), name(j), lt, c));
                }
            }
        }
        result
    }

    /// Renders the constraints as one conjunction, `true` if there are none.
    pub fn debug_string(&self, clocks: &[Clock]) -> String {
        let constraints = self.constraints(clocks);
        if constraints.is_empty() {
            "true".to_string()
        } else {
            constraints.join(" && ")
        }
    }
}

/// Renders `state` with location and clock names taken from `system`.
///
/// Format: `(Loc1, Loc2) | x <= 5 && ...`
pub fn state_string(system: &dyn TransitionSystem, state: &State) -> String {
    let names: Vec<&str> = system
        .components()
        .iter()
        .enumerate()
        .map(|(component, automaton)| automaton.location(state.location().get(component)).name())
        .collect();
    format!("({}) | {}", names.join(", "), state.zone().debug_string(system.clocks()))
}
