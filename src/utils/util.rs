//! # Utility Module
//!
//! Small numeric helpers shared by the search heuristics.
//!
//! ## Example Function: `clamp`
//!
//! The `clamp` function restricts a value to lie within a specified range. If the value
//! is below the minimum, it returns the minimum; if it's above the maximum, it returns the
//! maximum; otherwise, it returns the value unchanged.

/// Clamps a value between a minimum and maximum.
///
/// # Examples
///
/// ```
/// use rust_delve::utils::util::clamp;
///
/// assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Clamps into `[0, 1]`. NaN maps to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    clamp(value, 0.0, 1.0)
}

/// Probability of rejecting a single-connection room placed at `depth`.
///
/// `clamp01((1 - e^(t * ramp)) / (1 - e^t)) * allowable` with
/// `ramp = 1 - depth / max_depth`. Close to `allowable` at the root and falls
/// towards zero as the branch approaches `max_depth`.
///
/// ```
/// use rust_delve::utils::util::too_small_probability;
///
/// assert!((too_small_probability(0, 10, 10.0, 0.9) - 0.9).abs() < 1e-9);
/// assert_eq!(too_small_probability(10, 10, 10.0, 0.9), 0.0);
/// ```
pub fn too_small_probability(depth: usize, max_depth: usize, steepness: f64, allowable: f64) -> f64 {
    if max_depth == 0 || steepness == 0.0 {
        return 0.0;
    }
    let ramp = 1.0 - depth as f64 / max_depth as f64;
    let curve = (1.0 - (steepness * ramp).exp()) / (1.0 - steepness.exp());
    clamp01(curve) * allowable
}
