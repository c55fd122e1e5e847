//! Temporal module configuration

use pacemaker_core::{ConfigError, TIME_RESOLUTION};

/// Temporal buffer configuration
///
/// Defaults are the parameters fitted by Taatgen, van Rijn & Anderson (2007).
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalConfig {
    /// Length of the first tick interval (seconds)
    pub time_start: f64,
    /// Multiplicative growth of successive intervals
    pub time_mult: f64,
    /// Noise coefficient, scaled by the expected interval
    pub time_noise: f64,
    /// Seed for the noise source; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        TemporalConfig {
            time_start: 0.011,
            time_mult: 1.1,
            time_noise: 0.015,
            seed: None,
        }
    }
}

impl TemporalConfig {
    /// Default parameters without noise, for deterministic runs
    pub fn noiseless() -> Self {
        TemporalConfig {
            time_noise: 0.0,
            ..Self::default()
        }
    }

    pub fn with_start(mut self, time_start: f64) -> Self {
        self.time_start = time_start;
        self
    }

    pub fn with_mult(mut self, time_mult: f64) -> Self {
        self.time_mult = time_mult;
        self
    }

    pub fn with_noise(mut self, time_noise: f64) -> Self {
        self.time_noise = time_noise;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject degenerate or non-growing intervals
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("time_start", self.time_start),
            ("time_mult", self.time_mult),
            ("time_noise", self.time_noise),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name });
            }
        }

        if self.time_start <= 0.0 {
            return Err(ConfigError::NonPositiveStart(self.time_start));
        }
        if self.time_start < TIME_RESOLUTION {
            return Err(ConfigError::StartBelowResolution(self.time_start));
        }
        if self.time_mult <= 1.0 {
            return Err(ConfigError::NonGrowing(self.time_mult));
        }
        if self.time_noise < 0.0 {
            return Err(ConfigError::NegativeNoise(self.time_noise));
        }
        Ok(())
    }

    /// Noiseless length of interval `n` (0-based)
    pub fn expected_lag(&self, n: u64) -> f64 {
        self.time_start * self.time_mult.powf(n as f64)
    }

    /// Noiseless time, relative to run start, at which tick `n` lands
    pub fn expected_onset(&self, n: u64) -> f64 {
        let g = self.time_mult;
        self.time_start * (g.powf(n as f64 + 1.0) - 1.0) / (g - 1.0)
    }

    /// Noiseless visible count `interval` seconds after the clock starts
    ///
    /// The count holds the index of the last landed tick, and reads 0 both
    /// before and after tick 0 lands.
    pub fn expected_ticks(&self, interval: f64) -> u64 {
        if interval <= 0.0 {
            return 0;
        }
        let g = self.time_mult;
        let ratio = 1.0 + interval * (g - 1.0) / self.time_start;
        // Onsets that fall exactly on the interval boundary count as landed
        let landed = (ratio.ln() / g.ln() + 1e-9).floor() as u64;
        landed.saturating_sub(1)
    }
}
