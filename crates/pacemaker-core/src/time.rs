//! Simulation time primitives
//!
//! Simulation time is measured in seconds since model start. Every time the
//! engine schedules something it is rounded to the engine resolution.

/// Number of decimal places kept in scheduled times (0.1 ms)
pub const TIME_PRECISION: i32 = 4;

/// Smallest distinguishable difference between two scheduled times
pub const TIME_RESOLUTION: f64 = 0.0001;

/// Round a time in seconds to the engine resolution
#[inline]
pub fn round_time(secs: f64) -> f64 {
    let factor = 10f64.powi(TIME_PRECISION);
    (secs * factor).round() / factor
}

/// Whether `now` has reached `due`, allowing for rounding
#[inline]
pub fn has_reached(now: f64, due: f64) -> bool {
    now + TIME_RESOLUTION / 2.0 >= due
}
