//! IAU HG phase function for asteroid photometry
//!
//! Bowell et al. (1989), "Application of photometric models to asteroids",
//! Asteroids II, 524-556. See also Myhrvold (2016), PASP 128, 045004, Sect. 2.2.

use crate::constants::D2R;

/// Default slope parameter
pub const DEFAULT_G: f64 = 0.15;

/// Basis functions φ1 and φ2 at phase angle `alpha_deg` (degrees)
///
/// Each is a blend of a smooth near-opposition term and a steeper
/// large-angle term, weighted by `W = exp(-90.56 tan²(α/2))`.
pub fn hg_phi12(alpha_deg: f64) -> (f64, f64) {
    let alpha = alpha_deg.abs() * D2R;
    let sin_a = alpha.sin();
    let f_a = sin_a / (0.119 + 1.341 * sin_a - 0.754 * sin_a * sin_a);
    let tan_half = (0.5 * alpha).tan();
    let w = (-90.56 * tan_half * tan_half).exp();

    let phi1_small = 1.0 - 0.986 * f_a;
    let phi2_small = 1.0 - 0.238 * f_a;
    let phi1_large = (-3.332 * tan_half.powf(0.631)).exp();
    let phi2_large = (-1.862 * tan_half.powf(1.218)).exp();

    (
        w * phi1_small + (1.0 - w) * phi1_large,
        w * phi2_small + (1.0 - w) * phi2_large,
    )
}

/// The IAU HG phase function in intensity, equal to 1 at zero phase
///
/// Negative phase angles are treated as their absolute value.
pub fn iau_hg_model(alpha_deg: f64, g: f64) -> f64 {
    let (phi1, phi2) = hg_phi12(alpha_deg);
    (1.0 - g) * phi1 + g * phi2
}

/// [`iau_hg_model`] over several phase angles
pub fn iau_hg_model_many(alphas_deg: &[f64], g: f64) -> Vec<f64> {
    alphas_deg.iter().map(|&alpha| iau_hg_model(alpha, g)).collect()
}

/// Reduced magnitude change `-2.5 log10(Φ)` for the HG model
pub fn hg_magnitude_offset(alpha_deg: f64, g: f64) -> f64 {
    -2.5 * iau_hg_model(alpha_deg, g).log10()
}
