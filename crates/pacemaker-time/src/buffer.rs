//! Temporal buffer - the clock as seen by production rules
//!
//! The buffer holds at most one `_time` chunk whose `ticks` slot is the
//! visible tick count. A production starts the clock by writing
//! `ticks 0`; the tick process then rewrites the count as ticks land.
//! Clearing the buffer harvests the chunk into declarative memory and stops
//! the clock at the next resumption.

use std::mem;

use pacemaker_core::{Bindings, Chunk, Event, PacemakerError, PacemakerResult, SlotValue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::{noise_with, ChunkStore, DeclarativeMemory, TemporalConfig, TickProcess};

/// Chunk type of records in the temporal buffer
pub const TEMPORAL_TYPE: &str = "_time";

/// The single slot a clock record carries
pub const TICKS: &str = "ticks";

const BUFFER_NAME: &str = "temporal";

/// Processing state of a buffer, kept by the host engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BufferState {
    #[default]
    Free,
    Busy,
    Error,
}

/// Whether the buffer holds a chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupancy {
    Full,
    Empty,
}

/// Query a production rule can make about a buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inquiry {
    State(BufferState),
    Buffer(Occupancy),
}

impl Inquiry {
    /// Parse the `attribute value` form used in rule conditions
    pub fn parse(attribute: &str, value: &str) -> PacemakerResult<Self> {
        let inquiry = match (attribute, value) {
            ("state", "free") => Inquiry::State(BufferState::Free),
            ("state", "busy") => Inquiry::State(BufferState::Busy),
            ("state", "error") => Inquiry::State(BufferState::Error),
            ("buffer", "full") => Inquiry::Buffer(Occupancy::Full),
            ("buffer", "empty") => Inquiry::Buffer(Occupancy::Empty),
            _ => {
                return Err(PacemakerError::UnknownInquiry {
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                })
            }
        };
        Ok(inquiry)
    }
}

/// Result of applying a landed tick to the buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAdvance {
    /// The visible count now reads this value
    Advanced(u64),
    /// The buffer was cleared while the tick was in flight
    Dropped,
}

/// Single-slot buffer exposing the internal clock
pub struct TemporalBuffer<M = ChunkStore> {
    /// Current clock record
    slot: Option<Chunk>,
    /// Host-maintained processing state
    state: BufferState,
    /// Timing parameters
    config: TemporalConfig,
    /// Noise source
    rng: StdRng,
    /// Harvest target
    memory: M,
    /// Bumped on every accepted record, so runs can tell their record was replaced
    generation: u64,
}

impl<M: DeclarativeMemory> TemporalBuffer<M> {
    /// Create an empty buffer that harvests into `memory`
    pub fn new(config: TemporalConfig, memory: M) -> PacemakerResult<Self> {
        config.validate()?;
        let rng = seeded_rng(&config);
        Ok(TemporalBuffer {
            slot: None,
            state: BufferState::Free,
            config,
            rng,
            memory,
            generation: 0,
        })
    }

    /// Replace the timing parameters; affects runs started afterwards
    pub fn reconfigure(&mut self, config: TemporalConfig) -> PacemakerResult<()> {
        config.validate()?;
        if config.seed.is_some() {
            self.rng = seeded_rng(&config);
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    /// Memory that receives cleared chunks
    pub fn default_harvest(&self) -> &M {
        &self.memory
    }

    pub fn default_harvest_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Swap the harvest target, returning the previous one
    pub fn set_default_harvest(&mut self, memory: M) -> M {
        mem::replace(&mut self.memory, memory)
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn set_state(&mut self, state: BufferState) {
        self.state = state;
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    pub fn chunk(&self) -> Option<&Chunk> {
        self.slot.as_ref()
    }

    /// Visible tick count, if the clock is running
    pub fn ticks(&self) -> Option<u64> {
        match self.slot.as_ref()?.get(TICKS)? {
            SlotValue::Value(v) => v.parse().ok(),
            _ => None,
        }
    }

    /// Evaluate a rule condition such as `state free` or `buffer full`
    pub fn test(&self, attribute: &str, expected: &str) -> PacemakerResult<bool> {
        Ok(self.check(Inquiry::parse(attribute, expected)?))
    }

    pub fn check(&self, inquiry: Inquiry) -> bool {
        match inquiry {
            Inquiry::State(state) => self.state == state,
            Inquiry::Buffer(Occupancy::Full) => self.is_occupied(),
            Inquiry::Buffer(Occupancy::Empty) => !self.is_occupied(),
        }
    }

    /// Start the clock from a `ticks 0` command
    pub fn create(&mut self, command: &Chunk, bindings: &Bindings) -> PacemakerResult<()> {
        self.create_at(command, bindings, 0.0)
    }

    /// Start the clock; a running clock is harvested at `time` first
    pub fn create_at(&mut self, command: &Chunk, bindings: &Bindings, time: f64) -> PacemakerResult<()> {
        let resolved = command.resolve(bindings).map_err(|e| {
            PacemakerError::Validation(format!(
                "Setting the buffer using the chunk '{}' is impossible; {}",
                command, e
            ))
        })?;

        let start = match resolved.get(TICKS) {
            Some(value) if resolved.len() == 1 => value,
            _ => {
                return Err(PacemakerError::Validation(format!(
                    "Chunks in the temporal buffer must specify the attribute {} and nothing else",
                    TICKS
                )))
            }
        };
        if start.trim().parse::<f64>().ok() != Some(0.0) {
            return Err(PacemakerError::Validation(format!(
                "The temporal buffer must begin counting at 0, got '{}'",
                start
            )));
        }

        self.add(Chunk::new(TEMPORAL_TYPE).with_slot(TICKS, 0u64), time);
        debug!(time, "temporal clock started");
        Ok(())
    }

    /// The temporal buffer cannot be retrieved into
    pub fn retrieve(&self, chunk: &Chunk, _bindings: &Bindings) -> PacemakerResult<()> {
        Err(PacemakerError::Unsupported {
            buffer: BUFFER_NAME.to_string(),
            chunk: chunk.to_string(),
        })
    }

    /// Harvest the clock record into memory; returns whether anything moved
    pub fn clear(&mut self, time: f64) -> bool {
        match self.slot.take() {
            Some(chunk) => {
                debug!(time, chunk = %chunk, "temporal buffer harvested");
                self.memory.add(chunk, time);
                true
            }
            None => false,
        }
    }

    /// Start a new tick run at `current_time`
    ///
    /// Returns the run and its first event; the event is `None` when the
    /// buffer is empty.
    pub fn tick(&mut self, current_time: f64) -> (TickProcess, Option<Event>) {
        let mut process = TickProcess::new();
        let event = process.advance(self, current_time);
        (process, event)
    }

    /// Insertion primitive: harvests any occupant before accepting `chunk`
    fn add(&mut self, chunk: Chunk, time: f64) {
        self.clear(time);
        self.slot = Some(chunk);
        self.generation += 1;
    }

    /// Identity of the current record
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the record of `generation` is still in the slot
    pub(crate) fn holds(&self, generation: u64) -> bool {
        self.is_occupied() && self.generation == generation
    }

    /// Rewrite the visible count after a tick lands
    pub(crate) fn advance_ticks(&mut self, generation: u64, ticks: u64) -> TickAdvance {
        match self.slot.as_mut() {
            Some(chunk) if self.generation == generation => {
                chunk.set(TICKS, ticks);
                TickAdvance::Advanced(ticks)
            }
            _ => TickAdvance::Dropped,
        }
    }

    pub(crate) fn sample_noise(&mut self, scale: f64) -> f64 {
        noise_with(&mut self.rng, scale)
    }
}

fn seeded_rng(config: &TemporalConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer() -> TemporalBuffer {
        TemporalBuffer::new(TemporalConfig::noiseless(), ChunkStore::new()).unwrap()
    }

    fn start_command(value: &str) -> Chunk {
        Chunk::new("_time").with_slot(TICKS, value)
    }

    #[test]
    fn test_create_starts_clock() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();

        assert!(buf.is_occupied());
        assert_eq!(buf.ticks(), Some(0));
        assert_eq!(buf.chunk().unwrap().type_name(), TEMPORAL_TYPE);
    }

    #[test]
    fn test_create_resolves_variables() {
        let mut buf = buffer();
        let command = start_command("=zero");

        buf.create(&command, &Bindings::new().bind("zero", 0)).unwrap();
        assert_eq!(buf.ticks(), Some(0));
    }

    #[test]
    fn test_create_unbound_variable_fails() {
        let mut buf = buffer();
        let err = buf.create(&start_command("=zero"), &Bindings::new()).unwrap_err();

        assert!(matches!(err, PacemakerError::Validation(_)));
        assert!(!buf.is_occupied());
    }

    #[test]
    fn test_create_rejects_nonzero_start() {
        let mut buf = buffer();
        for value in ["1", "0.5", "-2", "zero"] {
            let err = buf.create(&start_command(value), &Bindings::new()).unwrap_err();
            assert!(matches!(err, PacemakerError::Validation(_)), "{}", value);
        }
        assert!(!buf.is_occupied());
    }

    #[test]
    fn test_create_rejects_extra_or_missing_attribute() {
        let mut buf = buffer();

        let extra = start_command("0").with_slot("label", "a");
        assert!(buf.create(&extra, &Bindings::new()).is_err());

        let missing = Chunk::new("_time").with_slot("time", "0");
        assert!(buf.create(&missing, &Bindings::new()).is_err());

        let empty = Chunk::new("_time");
        assert!(buf.create(&empty, &Bindings::new()).is_err());

        assert!(!buf.is_occupied());
    }

    #[test]
    fn test_create_ignores_unused_attributes() {
        let mut buf = buffer();
        let command = start_command("0").with_slot("label", None::<&str>);

        buf.create(&command, &Bindings::new()).unwrap();
        assert_eq!(buf.ticks(), Some(0));
    }

    #[test]
    fn test_failed_create_leaves_running_clock() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        buf.advance_ticks(buf.generation(), 4);

        assert!(buf.create(&start_command("1"), &Bindings::new()).is_err());
        assert_eq!(buf.ticks(), Some(4));
        assert!(buf.default_harvest().is_empty());
    }

    #[test]
    fn test_create_harvests_running_clock() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        buf.advance_ticks(buf.generation(), 4);

        buf.create_at(&start_command("0"), &Bindings::new(), 2.5).unwrap();

        assert_eq!(buf.ticks(), Some(0));
        let old = Chunk::new(TEMPORAL_TYPE).with_slot(TICKS, 4u64);
        assert_eq!(buf.default_harvest().presentations(&old), &[2.5]);
    }

    #[test]
    fn test_retrieve_unsupported() {
        let buf = buffer();
        let err = buf.retrieve(&start_command("0"), &Bindings::new()).unwrap_err();

        assert!(matches!(err, PacemakerError::Unsupported { .. }));
        assert!(err.to_string().contains("temporal"));
    }

    #[test]
    fn test_clear_harvests_exact_record() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        buf.advance_ticks(buf.generation(), 7);
        let record = buf.chunk().cloned().unwrap();

        assert!(buf.clear(3.25));

        assert!(!buf.is_occupied());
        assert_eq!(buf.default_harvest().presentations(&record), &[3.25]);
    }

    #[test]
    fn test_clear_empty_is_noop() {
        let mut buf = buffer();
        assert!(!buf.clear(1.0));
        assert!(buf.default_harvest().is_empty());
    }

    #[test]
    fn test_advance_after_clear_is_dropped() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        let generation = buf.generation();
        buf.clear(0.0);

        assert_eq!(buf.advance_ticks(generation, 1), TickAdvance::Dropped);
    }

    #[test]
    fn test_advance_of_replaced_record_is_dropped() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        let generation = buf.generation();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();

        assert!(!buf.holds(generation));
        assert_eq!(buf.advance_ticks(generation, 1), TickAdvance::Dropped);
        assert_eq!(buf.ticks(), Some(0));
    }

    #[test]
    fn test_inquiries() {
        let mut buf = buffer();

        assert!(buf.test("state", "free").unwrap());
        assert!(buf.test("buffer", "empty").unwrap());
        assert!(!buf.test("buffer", "full").unwrap());

        buf.create(&start_command("0"), &Bindings::new()).unwrap();
        assert!(buf.test("buffer", "full").unwrap());

        buf.set_state(BufferState::Busy);
        assert!(buf.test("state", "busy").unwrap());
        assert!(!buf.test("state", "free").unwrap());

        assert!(matches!(
            buf.test("mood", "happy"),
            Err(PacemakerError::UnknownInquiry { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TemporalConfig::default().with_mult(0.9);
        assert!(matches!(
            TemporalBuffer::new(config, ChunkStore::new()),
            Err(PacemakerError::Config(_))
        ));

        let mut buf = buffer();
        assert!(buf.reconfigure(TemporalConfig::default().with_start(-1.0)).is_err());
        assert_eq!(buf.config(), &TemporalConfig::noiseless());
    }

    #[test]
    fn test_set_default_harvest() {
        let mut buf = buffer();
        buf.create(&start_command("0"), &Bindings::new()).unwrap();

        let previous = buf.set_default_harvest(ChunkStore::new());
        assert!(previous.is_empty());

        buf.clear(1.0);
        assert_eq!(buf.default_harvest().len(), 1);
    }

    #[test]
    fn test_shared_harvest_target() {
        let shared = ChunkStore::shared();
        let mut a = TemporalBuffer::new(TemporalConfig::default(), shared.clone()).unwrap();
        let mut b = TemporalBuffer::new(TemporalConfig::default(), shared.clone()).unwrap();

        a.create(&start_command("0"), &Bindings::new()).unwrap();
        b.create(&start_command("0"), &Bindings::new()).unwrap();
        a.clear(1.0);
        b.clear(2.0);

        let record = Chunk::new(TEMPORAL_TYPE).with_slot(TICKS, 0u64);
        assert_eq!(shared.lock().presentations(&record), &[1.0, 2.0]);
    }

    #[derive(Clone, Debug)]
    enum Command {
        Create(bool),
        Clear,
    }

    fn command() -> impl Strategy<Value = Command> {
        prop_oneof![any::<bool>().prop_map(Command::Create), Just(Command::Clear)]
    }

    proptest! {
        #[test]
        fn prop_single_occupancy(commands in proptest::collection::vec(command(), 0..40)) {
            let mut buf = buffer();
            let mut created = 0usize;
            let mut cleared = 0usize;

            for (i, cmd) in commands.iter().enumerate() {
                let t = i as f64;
                match cmd {
                    Command::Create(valid) => {
                        let was_occupied = buf.is_occupied();
                        let value = if *valid { "0" } else { "3" };
                        let ok = buf.create_at(&start_command(value), &Bindings::new(), t).is_ok();
                        prop_assert_eq!(ok, *valid);
                        if ok {
                            created += 1;
                            if was_occupied {
                                cleared += 1;
                            }
                        }
                    }
                    Command::Clear => {
                        if buf.clear(t) {
                            cleared += 1;
                        }
                    }
                }
                // Every record ever created is either live or harvested
                let live = usize::from(buf.is_occupied());
                prop_assert_eq!(created, cleared + live);
                prop_assert_eq!(buf.default_harvest().total_presentations(), cleared);
            }
        }
    }
}
