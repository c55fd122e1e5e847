//! Pacemaker Time - the temporal module
//!
//! This crate implements the internal clock of the cognitive engine:
//! - Temporal buffer holding the `_time` clock record
//! - Tick process with scalar-timing (Weber's law) interval growth
//! - Logistic noise generator
//! - Declarative memory contract for harvested records

pub mod buffer;
pub mod config;
pub mod memory;
pub mod noise;
pub mod tick;

pub use buffer::*;
pub use config::*;
pub use memory::*;
pub use noise::*;
pub use tick::*;
