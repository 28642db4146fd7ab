use thiserror::Error;

use crate::types::{ClockId, LocationId};

/// Structural problems detected while building automata or compositions.
///
/// These describe malformed input from a loader. Contract violations inside the
/// engine itself (mismatched zone dimensions, out-of-range clock indices) are
/// not reported here; they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("automaton `{automaton}` has no initial location")]
    NoInitialLocation { automaton: String },

    #[error("automaton `{automaton}` has several initial locations: `{first}` and `{second}`")]
    MultipleInitialLocations {
        automaton: String,
        first: String,
        second: String,
    },

    #[error("automaton `{automaton}` refers to unknown location {location}")]
    UnknownLocation { automaton: String, location: LocationId },

    #[error("automaton `{automaton}` refers to unknown clock {clock}")]
    UnknownClock { automaton: String, clock: ClockId },

    #[error("automaton `{automaton}` uses channel `{channel}` without declaring it")]
    UndeclaredChannel { automaton: String, channel: String },

    #[error("automaton `{automaton}` declares channel `{channel}` as both input and output")]
    ChannelDirectionConflict { automaton: String, channel: String },

    #[error("automaton `{automaton}` resets clock {clock} to negative value {value}")]
    NegativeReset {
        automaton: String,
        clock: ClockId,
        value: i32,
    },

    #[error("automaton `{automaton}` compares clock {clock} with {constant}, outside ±{max}")]
    ConstantOutOfRange {
        automaton: String,
        clock: ClockId,
        constant: i32,
        max: i32,
    },

    #[error("automaton `{automaton}` declares clock `{clock}` twice")]
    DuplicateClock { automaton: String, clock: String },

    #[error("automaton `{automaton}` declares location `{location}` twice")]
    DuplicateLocation { automaton: String, location: String },

    #[error("output `{channel}` is owned by both `{first}` and `{second}`")]
    OverlappingOutputs {
        channel: String,
        first: String,
        second: String,
    },

    #[error("a composition needs at least one automaton")]
    EmptyComposition,
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_messages() {
        let e = ModelError::NoInitialLocation {
            automaton: "Machine".to_string(),
        };
        assert_eq!(e.to_string(), "automaton `Machine` has no initial location");

        let e = ModelError::UnknownClock {
            automaton: "Machine".to_string(),
            clock: ClockId::new(3),
        };
        assert_eq!(e.to_string(), "automaton `Machine` refers to unknown clock c3");

        let e = ModelError::NegativeReset {
            automaton: "Machine".to_string(),
            clock: ClockId::new(0),
            value: -2,
        };
        assert_eq!(e.to_string(), "automaton `Machine` resets clock c0 to negative value -2");
    }
}
