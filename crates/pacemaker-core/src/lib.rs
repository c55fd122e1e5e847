//! Pacemaker Core - Fundamental types and primitives
//!
//! This crate defines the types shared by the temporal module and its
//! collaborators:
//! - Chunks, slot values and variable bindings
//! - Scheduling events
//! - Simulation time resolution
//! - Error taxonomy

pub mod chunk;
pub mod error;
pub mod event;
pub mod time;

pub use chunk::*;
pub use error::*;
pub use event::*;
pub use time::*;
