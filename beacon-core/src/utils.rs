//! Small numeric helpers shared across the simulation.

use crate::constants::WEIGHT_INIT_RANGE;
use rand::Rng;

/// Draws an initial weight or bias, uniform in [-WEIGHT_INIT_RANGE, +WEIGHT_INIT_RANGE).
///
/// # Examples
///
/// ```
/// use beacon_core::utils::random_weight;
/// use beacon_core::constants::WEIGHT_INIT_RANGE;
///
/// let w = random_weight(&mut rand::thread_rng());
/// assert!(w >= -WEIGHT_INIT_RANGE && w <= WEIGHT_INIT_RANGE);
/// ```
pub fn random_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>() * 2.0 * WEIGHT_INIT_RANGE - WEIGHT_INIT_RANGE
}

/// A vector of `len` fresh random weights.
pub fn random_vec<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<f64> {
    (0..len).map(|_| random_weight(rng)).collect()
}

/// Discretizes a position to the integer cell used for exploration tracking.
///
/// Rounds half away from zero, so `(2.5, -2.5)` lands in `(3, -3)`.
pub fn cell_of(x: f64, y: f64) -> (i64, i64) {
    (x.round() as i64, y.round() as i64)
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}
