//! Automaton to DOT (Graphviz) conversion.
//!
//! Renders an [`Automaton`] as a directed graph that can be viewed with
//! Graphviz tools like `dot` or online viewers.
//!
//! # DOT Format
//!
//! The generated DOT output follows these conventions:
//! - **Locations** are rendered as circles, labeled with their name and invariant
//! - **The initial location** is rendered as a double circle
//! - **Edges** are labeled `channel? guards / updates` for inputs and `channel! guards / updates` for outputs:
//!   - Dashed lines represent input edges
//!   - Solid lines represent output edges
//!
//! # Examples
//!
//! ```
//! use tioa::automaton::{AutomatonBuilder, Edge, Guard, Update};
//!
//! let mut b = AutomatonBuilder::new("Machine");
//! let x = b.clock("x");
//! let coin = b.input("coin");
//! let idle = b.initial_location("Idle");
//! b.invariant(idle, Guard::le(x, 5));
//! b.edge(Edge::new(idle, idle, &coin).with_update(Update::reset(x)));
//! let machine = b.build().unwrap();
//!
//! let dot = machine.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::fmt::Write as _;

use crate::automaton::{Automaton, Direction, Edge, Guard};

/// Configuration options for DOT output generation.
///
/// Use `DotConfig::default()` for standard settings.
///
/// # Examples
///
/// ```
/// use tioa::dot::DotConfig;
///
/// let config = DotConfig {
///     location_shape: "ellipse",
///     ..DotConfig::default()
/// };
/// assert!(config.show_invariants);
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for locations (default: "circle")
    pub location_shape: &'static str,
    /// Shape for the initial location (default: "doublecircle")
    pub initial_shape: &'static str,
    /// Style for input edges (default: "dashed")
    pub input_edge_style: &'static str,
    /// Style for output edges (default: "solid")
    pub output_edge_style: &'static str,
    /// Whether location labels include invariants (default: true)
    pub show_invariants: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            location_shape: "circle",
            initial_shape: "doublecircle",
            input_edge_style: "dashed",
            output_edge_style: "solid",
            show_invariants: true,
        }
    }
}

impl Automaton {
    /// Converts the automaton to DOT (Graphviz) format.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - A DOT-formatted string representation of the automaton
    /// * `Err(std::fmt::Error)` - If string formatting fails (rare)
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the automaton to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph \"{}\" {{", escape(self.name()))?;
        writeln!(dot, "node [shape={}];", config.location_shape)?;

        for (index, location) in self.locations().iter().enumerate() {
            let mut label = escape(location.name());
            if config.show_invariants && !location.invariants().is_empty() {
                write!(label, "\\n{}", self.guards_label(location.invariants()))?;
            }
            if location.is_initial() {
                writeln!(dot, "l{} [shape={}, label=\"{}\"];", index, config.initial_shape, label)?;
            } else {
                writeln!(dot, "l{} [label=\"{}\"];", index, label)?;
            }
        }

        for edge in self.edges() {
            let style = match self.direction(&edge.channel) {
                Some(Direction::Output) => config.output_edge_style,
                _ => config.input_edge_style,
            };
            writeln!(
                dot,
                "l{} -> l{} [style={}, label=\"{}\"];",
                edge.source.index(),
                edge.target.index(),
                style,
                self.edge_label(edge)
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    fn guards_label(&self, guards: &[Guard]) -> String {
        guards
            .iter()
            .map(|g| format!("{} {} {}", self.clocks()[g.clock.index()].name(), g.relation, g.constant))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    fn edge_label(&self, edge: &Edge) -> String {
        let mark = match self.direction(&edge.channel) {
            Some(Direction::Output) => '!',
            _ => '?',
        };
        let mut label = format!("{}{}", escape(edge.channel.name()), mark);
        if !edge.guards.is_empty() {
            label.push(' ');
            label.push_str(&self.guards_label(&edge.guards));
        }
        if !edge.updates.is_empty() {
            let updates: Vec<String> = edge
                .updates
                .iter()
                .map(|u| format!("{} := {}", self.clocks()[u.clock.index()].name(), u.value))
                .collect();
            label.push_str(" / ");
            label.push_str(&updates.join(", "));
        }
        label
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::{AutomatonBuilder, Update};

    fn machine() -> Automaton {
        let mut b = AutomatonBuilder::new("Machine");
        let x = b.clock("x");
        let coin = b.input("coin");
        let tea = b.output("tea");
        let idle = b.initial_location("Idle");
        let busy = b.location("Busy");
        b.invariant(busy, Guard::le(x, 6));
        b.edge(Edge::new(idle, busy, &coin).with_update(Update::reset(x)));
        b.edge(Edge::new(busy, idle, &tea).with_guard(Guard::ge(x, 2)));
        b.build().unwrap()
    }

    #[test]
    fn test_to_dot_basic() {
        let dot = machine().to_dot().unwrap();
        assert!(dot.starts_with("digraph \"Machine\" {"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_locations_and_invariants() {
        let dot = machine().to_dot().unwrap();
        assert!(dot.contains("l0 [shape=doublecircle, label=\"Idle\"];"), "{}", dot);
        assert!(dot.contains("l1 [label=\"Busy\\nx <= 6\"];"), "{}", dot);
    }

    #[test]
    fn test_edge_labels() {
        let dot = machine().to_dot().unwrap();
        assert!(dot.contains("l0 -> l1 [style=dashed, label=\"coin? / x := 0\"];"), "{}", dot);
        assert!(dot.contains("l1 -> l0 [style=solid, label=\"tea! x >= 2\"];"), "{}", dot);
    }

    #[test]
    fn test_output_edge_with_update() {
        let mut b = AutomatonBuilder::new("Ticker");
        let x = b.clock("x");
        let tick = b.output("tick");
        let l0 = b.initial_location("L0");
        b.edge(
            Edge::new(l0, l0, &tick)
                .with_guard(Guard::exactly(x, 1))
                .with_update(Update::reset(x)),
        );
        let dot = b.build().unwrap().to_dot().unwrap();
        assert!(dot.contains("label=\"tick! x == 1 / x := 0\""), "{}", dot);
    }

    #[test]
    fn test_custom_config() {
        let config = DotConfig {
            location_shape: "box",
            show_invariants: false,
            ..DotConfig::default()
        };
        let dot = machine().to_dot_with_config(&config).unwrap();
        assert!(dot.contains("node [shape=box];"));
        assert!(!dot.contains("x <= 6"));
    }

    #[test]
    fn test_escaped_names() {
        let mut b = AutomatonBuilder::new("say \"hi\"");
        b.initial_location("L");
        let dot = b.build().unwrap().to_dot().unwrap();
        assert!(dot.starts_with("digraph \"say \\\"hi\\\"\" {"), "{}", dot);
    }
}
