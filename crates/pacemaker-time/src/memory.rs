//! Declarative memory - the harvest target of the temporal buffer

use std::collections::HashMap;
use std::sync::Arc;

use pacemaker_core::Chunk;
use parking_lot::Mutex;

/// Long-term store that receives harvested buffer contents
///
/// Implementations take ownership of the chunk and accept any chunk type.
pub trait DeclarativeMemory {
    /// Store a chunk presented at simulation time `time`
    fn add(&mut self, chunk: Chunk, time: f64);
}

/// Declarative memory shared by several buffers
pub type SharedMemory<M = ChunkStore> = Arc<Mutex<M>>;

impl<M: DeclarativeMemory> DeclarativeMemory for Arc<Mutex<M>> {
    fn add(&mut self, chunk: Chunk, time: f64) {
        self.lock().add(chunk, time);
    }
}

impl<M: DeclarativeMemory + ?Sized> DeclarativeMemory for Box<M> {
    fn add(&mut self, chunk: Chunk, time: f64) {
        (**self).add(chunk, time);
    }
}

/// In-memory chunk store recording every presentation time per chunk
#[derive(Debug, Default)]
pub struct ChunkStore {
    presentations: HashMap<Chunk, Vec<f64>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        ChunkStore::default()
    }

    /// Store wrapped for sharing between buffers
    pub fn shared() -> SharedMemory {
        Arc::new(Mutex::new(ChunkStore::new()))
    }

    /// Presentation times of a chunk, oldest first
    pub fn presentations(&self, chunk: &Chunk) -> &[f64] {
        self.presentations.get(chunk).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, chunk: &Chunk) -> bool {
        self.presentations.contains_key(chunk)
    }

    /// Number of distinct chunks
    pub fn len(&self) -> usize {
        self.presentations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presentations.is_empty()
    }

    /// Number of presentations across all chunks
    pub fn total_presentations(&self) -> usize {
        self.presentations.values().map(Vec::len).sum()
    }

    /// Iterate over stored chunks of a given type
    pub fn iter_by_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.presentations
            .keys()
            .filter(move |c| c.type_name() == type_name)
    }
}

impl DeclarativeMemory for ChunkStore {
    fn add(&mut self, chunk: Chunk, time: f64) {
        self.presentations.entry(chunk).or_default().push(time);
    }
}
