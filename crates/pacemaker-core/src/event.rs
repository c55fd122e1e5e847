//! Scheduling events
//!
//! An event is a request to the scheduler to resume the emitting process at
//! a given simulation time. Events are immutable once emitted.

use std::fmt;

use crate::round_time;

/// Channel label of events emitted by the temporal module
pub const TEMPORAL_CHANNEL: &str = "TEMPORAL";

/// Timed scheduling request
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Simulation time (seconds) at which the emitter wants to resume
    pub time: f64,
    /// Module that emitted the event
    pub channel: &'static str,
    /// Human-readable trace line
    pub description: String,
    /// Index of the tick this event announces
    pub tick: u64,
}

impl Event {
    /// Temporal tick event, time rounded to the engine resolution
    pub fn tick(time: f64, tick: u64) -> Self {
        Event {
            time: round_time(time),
            channel: TEMPORAL_CHANNEL,
            description: format!("TICK: {}", tick),
            tick,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {}, {})", self.time, self.channel, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_event() {
        let event = Event::tick(1.000049, 2);

        assert_eq!(event.time, 1.0);
        assert_eq!(event.channel, TEMPORAL_CHANNEL);
        assert_eq!(event.description, "TICK: 2");
        assert_eq!(event.to_string(), "(1.0000, TEMPORAL, TICK: 2)");
    }
}
