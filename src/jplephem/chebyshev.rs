//! Chebyshev polynomial evaluation for SPK types 2 and 3
//!
//! Each SPK Chebyshev record stores a midpoint, a radius and one coefficient
//! series per component. Time is normalized to [-1, 1] over the record before
//! the series is summed.

use crate::jplephem::errors::{JplephemError, Result};

/// Evaluate a Chebyshev series and its derivative with respect to `x`
///
/// Returns `(value, d value / dx)`. The coefficients are ordered from lowest
/// to highest degree.
pub fn evaluate_with_derivative(coefficients: &[f64], x: f64) -> (f64, f64) {
    match coefficients.len() {
        0 => return (0.0, 0.0),
        1 => return (coefficients[0], 0.0),
        _ => {}
    }

    // Forward recurrence for T_n(x) and its derivative T'_n(x)
    let two_x = 2.0 * x;
    let (mut t_prev, mut t_curr) = (1.0, x);
    let (mut dt_prev, mut dt_curr) = (0.0, 1.0);
    let mut value = coefficients[0] + coefficients[1] * x;
    let mut derivative = coefficients[1];

    for &c in &coefficients[2..] {
        let t_next = two_x * t_curr - t_prev;
        let dt_next = 2.0 * t_curr + two_x * dt_curr - dt_prev;
        value += c * t_next;
        derivative += c * dt_next;
        t_prev = t_curr;
        t_curr = t_next;
        dt_prev = dt_curr;
        dt_curr = dt_next;
    }

    (value, derivative)
}

/// Evaluate a Chebyshev series at `x`
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    evaluate_with_derivative(coefficients, x).0
}

/// Normalize a time to [-1, 1] given an interval midpoint and radius
pub fn normalize_time(time: f64, midpoint: f64, radius: f64) -> Result<f64> {
    if radius <= 0.0 {
        return Err(JplephemError::InvalidFormat(format!(
            "Chebyshev record radius must be positive, got {}",
            radius
        )));
    }

    let normalized = (time - midpoint) / radius;
    if !(-1.0..=1.0).contains(&normalized) {
        return Err(JplephemError::OutOfRange {
            et: time,
            start_et: midpoint - radius,
            end_et: midpoint + radius,
        });
    }

    Ok(normalized)
}
