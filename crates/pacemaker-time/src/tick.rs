//! Tick process - scalar-timing pacemaker
//!
//! A run emits one event per tick and suspends until the scheduler resumes
//! it at (or after) the event time. Intervals follow the recurrence of
//! Taatgen, van Rijn & Anderson (2007):
//!
//! - first tick: `lag = start + noise(noise * 5 * start)`
//! - later ticks: `lag = mult * prev + noise(noise * mult * prev)`
//!
//! A run stops at the first resumption that finds its clock record gone.

use pacemaker_core::{has_reached, Event, TIME_RESOLUTION};
use tracing::{debug, warn};

use crate::{DeclarativeMemory, TemporalBuffer, TickAdvance};

/// Where a run is between resumptions
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickPhase {
    /// Next resumption emits the first tick
    Ready,
    /// Tick in flight, due at this simulation time
    Waiting { due: f64 },
    /// Clock record gone; no further events
    Finished,
}

/// One run of the pacemaker, resumed by the scheduler once per event
#[derive(Clone, Debug)]
pub struct TickProcess {
    phase: TickPhase,
    /// Index of the tick in flight (or next to emit)
    tick_index: u64,
    /// Last sampled interval, before the resolution floor
    lag: Option<f64>,
    /// Record this run drives
    generation: u64,
    /// Advances dropped because the buffer was cleared
    stale_writes: u32,
}

impl TickProcess {
    /// Fresh run; the first `advance` emits tick 0
    pub fn new() -> Self {
        TickProcess {
            phase: TickPhase::Ready,
            tick_index: 0,
            lag: None,
            generation: 0,
            stale_writes: 0,
        }
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Sampled interval of the most recent tick
    ///
    /// This is the recurrence state and may be shorter than the time
    /// resolution; the emitted event is never closer than one resolution step.
    pub fn lag(&self) -> Option<f64> {
        self.lag
    }

    /// Due time of the tick in flight
    pub fn due(&self) -> Option<f64> {
        match self.phase {
            TickPhase::Waiting { due } => Some(due),
            _ => None,
        }
    }

    pub fn stale_writes(&self) -> u32 {
        self.stale_writes
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TickPhase::Finished
    }

    /// Resume the run at `current_time`
    ///
    /// Lands the tick in flight, if any, then emits the next one. Returns
    /// `None` once the clock record has been cleared or replaced.
    pub fn advance<M: DeclarativeMemory>(
        &mut self,
        buffer: &mut TemporalBuffer<M>,
        current_time: f64,
    ) -> Option<Event> {
        match self.phase {
            TickPhase::Finished => return None,
            TickPhase::Ready => self.generation = buffer.generation(),
            TickPhase::Waiting { due } => {
                if !has_reached(current_time, due) {
                    debug!(tick = self.tick_index, due, current_time, "tick resumed before due time");
                }
                match buffer.advance_ticks(self.generation, self.tick_index) {
                    TickAdvance::Advanced(_) => self.tick_index += 1,
                    TickAdvance::Dropped => {
                        warn!(
                            tick = self.tick_index,
                            time = current_time,
                            "temporal buffer cleared while tick was in flight; tick dropped"
                        );
                        self.stale_writes += 1;
                        self.phase = TickPhase::Finished;
                        return None;
                    }
                }
            }
        }

        if !buffer.holds(self.generation) {
            self.phase = TickPhase::Finished;
            return None;
        }

        let lag = self.next_lag(buffer);
        // Ticks must stay strictly ordered in time
        let event = Event::tick(current_time + lag.max(TIME_RESOLUTION), self.tick_index);
        debug!(tick = self.tick_index, lag, time = event.time, "tick scheduled");

        self.lag = Some(lag);
        self.phase = TickPhase::Waiting { due: event.time };
        Some(event)
    }

    fn next_lag<M: DeclarativeMemory>(&self, buffer: &mut TemporalBuffer<M>) -> f64 {
        let config = buffer.config();
        let (start, mult, coefficient) = (config.time_start, config.time_mult, config.time_noise);

        match self.lag {
            None => start + buffer.sample_noise(coefficient * 5.0 * start),
            Some(prev) => {
                let expected = mult * prev;
                // Logistic noise is symmetric, so a negative previous lag only
                // affects the magnitude of the scale
                expected + buffer.sample_noise(coefficient * expected.abs())
            }
        }
    }
}

impl Default for TickProcess {
    fn default() -> Self {
        Self::new()
    }
}
