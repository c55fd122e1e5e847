//! Cooperative scheduler driving a temporal buffer
//!
//! Holds one buffer and its current tick run. The run is resumed at the due
//! time of its pending event, optionally delayed to mimic other simulation
//! activity holding the engine. Clears can be scripted at fixed times and
//! are applied before any resumption at or after that time.

use pacemaker_core::{round_time, Bindings, Chunk, ConfigError, Event, PacemakerResult};
use pacemaker_time::{ChunkStore, DeclarativeMemory, TemporalBuffer, TickProcess, TEMPORAL_TYPE, TICKS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// How late a run is resumed relative to its event time
#[derive(Clone, Debug, PartialEq)]
pub enum ResumeDelay {
    /// Resume exactly at the event time
    None,
    /// Always this many seconds late
    Fixed(f64),
    /// Uniformly between 0 and `max` seconds late
    Uniform { max: f64 },
}

impl ResumeDelay {
    /// Reject delays that are negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bound = match self {
            ResumeDelay::None => return Ok(()),
            ResumeDelay::Fixed(delay) => *delay,
            ResumeDelay::Uniform { max } => *max,
        };
        if !bound.is_finite() {
            return Err(ConfigError::NotFinite { name: "resume_delay" });
        }
        if bound < 0.0 {
            return Err(ConfigError::NegativeDelay(bound));
        }
        Ok(())
    }

    /// Sample a delay in seconds
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            ResumeDelay::None => 0.0,
            ResumeDelay::Fixed(delay) => *delay,
            ResumeDelay::Uniform { max } => rng.gen_range(0.0..=*max),
        }
    }
}

/// Event a run is suspended on, with the time it will actually be resumed
#[derive(Clone, Debug)]
struct Pending {
    event: Event,
    resume_at: f64,
}

/// Single-process discrete-event driver for a temporal buffer
pub struct Scheduler<M = ChunkStore> {
    /// Buffer under simulation
    buffer: TemporalBuffer<M>,
    /// Current tick run
    run: Option<TickProcess>,
    /// Event the run is suspended on
    pending: Option<Pending>,
    /// Scripted clear times, ascending
    clears: Vec<f64>,
    /// Simulation clock (seconds)
    now: f64,
    /// Resumption delay model
    delay: ResumeDelay,
    /// Delay RNG
    rng: StdRng,
    /// Every event emitted so far
    log: Vec<Event>,
    /// Stale writes of abandoned runs
    dropped: u32,
}

impl<M: DeclarativeMemory> Scheduler<M> {
    /// Create a scheduler at time zero that resumes runs on time
    pub fn new(buffer: TemporalBuffer<M>) -> Self {
        Scheduler {
            buffer,
            run: None,
            pending: None,
            clears: Vec::new(),
            now: 0.0,
            delay: ResumeDelay::None,
            rng: StdRng::seed_from_u64(0),
            log: Vec::new(),
            dropped: 0,
        }
    }

    /// Resume runs late according to `delay`, drawing from a seeded RNG
    pub fn with_delay(mut self, delay: ResumeDelay, seed: u64) -> Result<Self, ConfigError> {
        delay.validate()?;
        self.delay = delay;
        self.rng = StdRng::seed_from_u64(seed);
        Ok(self)
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn buffer(&self) -> &TemporalBuffer<M> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut TemporalBuffer<M> {
        &mut self.buffer
    }

    /// Events emitted so far, in emission order
    pub fn events(&self) -> &[Event] {
        &self.log
    }

    /// Event the current run is waiting on
    pub fn pending(&self) -> Option<&Event> {
        self.pending.as_ref().map(|p| &p.event)
    }

    /// Time at which the pending event will be resumed
    pub fn resume_at(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.resume_at)
    }

    /// Dropped tick advances across all runs
    pub fn stale_writes(&self) -> u32 {
        self.dropped + self.run.as_ref().map_or(0, TickProcess::stale_writes)
    }

    /// Start the clock now with a `ticks 0` command and begin a new run
    pub fn start(&mut self) -> PacemakerResult<()> {
        let command = Chunk::new(TEMPORAL_TYPE).with_slot(TICKS, 0u64);
        self.buffer.create_at(&command, &Bindings::new(), self.now)?;

        if let Some(old) = self.run.take() {
            self.dropped += old.stale_writes();
        }
        let (run, event) = self.buffer.tick(self.now);
        self.run = Some(run);
        self.suspend(event);
        Ok(())
    }

    /// Clear the buffer when simulation time reaches `time`
    ///
    /// A time already in the past clears at the current time.
    pub fn clear_at(&mut self, time: f64) {
        let time = time.max(self.now);
        let idx = self.clears.partition_point(|&t| t <= time);
        self.clears.insert(idx, time);
    }

    /// Resume the run on its pending event
    ///
    /// Returns the next event, or `None` when nothing is pending or the run
    /// has finished.
    pub fn step(&mut self) -> Option<Event> {
        let resume_at = self.pending.take()?.resume_at;
        self.apply_clears(resume_at);
        self.now = self.now.max(resume_at);

        let run = self.run.as_mut()?;
        let event = run.advance(&mut self.buffer, self.now);
        if event.is_none() {
            debug!(time = self.now, "tick run finished");
        }
        self.suspend(event.clone());
        event
    }

    /// Step until the next resumption would happen after `end`
    ///
    /// Clears scripted up to `end` are applied and the clock is left at
    /// `end`. Returns the number of events emitted.
    pub fn run_until(&mut self, end: f64) -> usize {
        let before = self.log.len();
        while self.resume_at().is_some_and(|t| t <= end) {
            if self.step().is_none() {
                break;
            }
        }
        self.apply_clears(end);
        self.now = self.now.max(end);
        self.log.len() - before
    }

    /// Log an emitted event and draw the delay it will be resumed with
    fn suspend(&mut self, event: Option<Event>) {
        self.pending = None;
        if let Some(event) = event {
            let resume_at = round_time(event.time + self.delay.sample(&mut self.rng));
            self.log.push(event.clone());
            self.pending = Some(Pending { event, resume_at });
        }
    }

    fn apply_clears(&mut self, until: f64) {
        let count = self.clears.partition_point(|&t| t <= until);
        for time in self.clears.drain(..count) {
            self.now = self.now.max(time);
            self.buffer.clear(time);
        }
    }
}
