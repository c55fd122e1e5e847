//! Logistic noise for scalar timing
//!
//! Tick intervals are perturbed by logistic noise whose scale is proportional
//! to the expected interval, which keeps the coefficient of variation of
//! timed intervals constant.

use std::f64::consts::PI;

use rand::Rng;

/// Sample logistic noise centered at 0 from the thread-local random source
pub fn noise(scale: f64) -> f64 {
    noise_with(&mut rand::thread_rng(), scale)
}

/// Sample logistic noise centered at 0 from `rng`
///
/// Uses the inverse CDF, `s * ln(u / (1 - u))` with `u` uniform on (0, 1).
/// A zero scale returns exactly zero and draws nothing.
pub fn noise_with<R: Rng + ?Sized>(rng: &mut R, scale: f64) -> f64 {
    debug_assert!(
        scale.is_finite() && scale >= 0.0,
        "noise scale must be finite and non-negative, got {}",
        scale
    );
    if scale == 0.0 {
        return 0.0;
    }

    // gen() is uniform on [0, 1); 0 would map to -inf
    let u = loop {
        let u: f64 = rng.gen();
        if u > 0.0 {
            break u;
        }
    };
    scale * (u / (1.0 - u)).ln()
}

/// Variance of a logistic distribution with the given scale
pub fn logistic_variance(scale: f64) -> f64 {
    PI * PI * scale * scale / 3.0
}
