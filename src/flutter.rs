//! Flutter margin and stability classification.
//!
//! Flutter sets in when the radiation-pressure forcing per unit area exceeds
//! the damping capacity of the fundamental mode:
//!
//! `margin = (zeta * 2 * sigma * omega_n) / F_srp`
//!
//! Margins of 2 and above are stable, 1 to 2 marginal, below 1 flutter.

use serde::{Deserialize, Serialize};

use crate::types::{
    round_decimals, Stability, MARGIN_DECIMALS, REFLECTIVITY_FACTOR, SRP_1AU, UNFORCED_MARGIN,
};

/// Radiation-pressure forcing per unit area (N/m²) at a heliocentric distance.
pub fn srp_force_at(distance_au: f64) -> f64 {
    SRP_1AU / (distance_au * distance_au) * REFLECTIVITY_FACTOR
}

/// Smallest strictly positive eigenvalue, if any.
pub fn lowest_positive_eigenvalue(eigenvalues: &[f64]) -> Option<f64> {
    eigenvalues
        .iter()
        .copied()
        .filter(|&lambda| lambda > 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

/// Flutter margin from an eigenvalue sequence (rad²/s²).
///
/// Returns 0 when no eigenvalue is positive and `UNFORCED_MARGIN` when the
/// forcing is not positive.
pub fn flutter_margin(eigenvalues: &[f64], areal_density: f64, damping: f64, srp_force: f64) -> f64 {
    let Some(lambda_min) = lowest_positive_eigenvalue(eigenvalues) else {
        return 0.0;
    };
    if srp_force <= 0.0 {
        return UNFORCED_MARGIN;
    }
    margin_from_omega(lambda_min.sqrt(), areal_density, damping, srp_force)
}

/// Flutter margin from a fundamental angular frequency (rad/s).
pub fn margin_from_omega(omega_n: f64, areal_density: f64, damping: f64, srp_force: f64) -> f64 {
    if srp_force <= 0.0 {
        return UNFORCED_MARGIN;
    }
    let damping_capacity = damping * 2.0 * areal_density * omega_n;
    damping_capacity / srp_force
}

/// Reported flutter margin and its stability class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlutterAssessment {
    pub flutter_margin: f64,
    pub stability: Stability,
}

/// Evaluate and round the margin, then classify the rounded value so the label
/// always agrees with the reported margin.
pub fn assess_flutter(
    eigenvalues: &[f64],
    areal_density: f64,
    damping: f64,
    srp_force: f64,
) -> FlutterAssessment {
    let margin = round_decimals(
        flutter_margin(eigenvalues, areal_density, damping, srp_force),
        MARGIN_DECIMALS,
    );
    FlutterAssessment {
        flutter_margin: margin,
        stability: Stability::from_margin(margin),
    }
}
