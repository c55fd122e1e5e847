//! Interval-timing trials
//!
//! Repeats independent clock runs to estimate the distribution of tick
//! counts for a target interval, or of the onset time of a given tick.
//! Under scalar timing the coefficient of variation stays roughly constant
//! as intervals grow.

use pacemaker_time::{ChunkStore, TemporalBuffer, TemporalConfig};
use tracing::debug;

use crate::Scheduler;

/// Summary statistics over trial samples
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialStats {
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl TrialStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return TrialStats::default();
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let ss: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        TrialStats {
            samples: n,
            mean,
            std_dev,
        }
    }

    /// Coefficient of variation
    pub fn cv(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.std_dev / self.mean
        }
    }
}

/// Batch of independent clock runs sharing one configuration
pub struct IntervalTrials {
    config: TemporalConfig,
    trials: usize,
    seed: u64,
}

impl IntervalTrials {
    /// `trials` runs; trial `i` seeds its noise with `seed + i`
    pub fn new(config: TemporalConfig, trials: usize, seed: u64) -> Self {
        IntervalTrials {
            config,
            trials,
            seed,
        }
    }

    /// Distribution of the visible tick count after `interval` seconds
    pub fn ticks_in(&self, interval: f64) -> TrialStats {
        let samples: Vec<f64> = (0..self.trials)
            .filter_map(|i| {
                let mut sched = self.scheduler(i)?;
                sched.run_until(interval);
                sched.buffer().ticks().map(|t| t as f64)
            })
            .collect();

        let stats = TrialStats::from_samples(&samples);
        debug!(interval, mean = stats.mean, cv = stats.cv(), "tick count trials");
        stats
    }

    /// Distribution of the time at which tick `tick` lands
    pub fn onset_of(&self, tick: u64) -> TrialStats {
        let samples: Vec<f64> = (0..self.trials)
            .filter_map(|i| {
                let mut sched = self.scheduler(i)?;
                while sched.events().last()?.tick < tick {
                    sched.step()?;
                }
                sched.events().last().map(|e| e.time)
            })
            .collect();

        let stats = TrialStats::from_samples(&samples);
        debug!(tick, mean = stats.mean, cv = stats.cv(), "tick onset trials");
        stats
    }

    fn scheduler(&self, trial: usize) -> Option<Scheduler> {
        let config = self.config.clone().with_seed(self.seed.wrapping_add(trial as u64));
        let buffer = TemporalBuffer::new(config, ChunkStore::new()).ok()?;
        let mut sched = Scheduler::new(buffer);
        sched.start().ok()?;
        Some(sched)
    }
}
