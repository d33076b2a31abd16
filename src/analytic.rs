//! Closed-form circular membrane model.
//!
//! A tensioned circular membrane fixed at its rim vibrates axisymmetrically at
//!
//! `f_j = alpha_j / (pi * D) * sqrt(T / sigma)`
//!
//! where `alpha_j` are the zeros of the Bessel function J0. Spin is folded in as
//! an extra centrifugal tension `sigma * omega² * R² / 4`.

use serde::{Deserialize, Serialize};

use crate::config::ModalConfig;
use crate::flutter::{assess_flutter, flutter_margin};
use crate::types::{rpm_to_rad_per_sec, ParameterPoint, Stability, STABLE_MARGIN};

/// First 20 zeros of J0, to four decimals.
pub const BESSEL_J0_ZEROS: [f64; 20] = [
    2.4048, 3.8317, 5.1356, 6.3802, 7.5883, 8.7715, 9.9361, 11.0864, 12.2251, 13.3543, 14.4755,
    15.5898, 16.6983, 17.8014, 18.9000, 19.9944, 21.0852, 22.1725, 23.2568, 24.3383,
];

/// Bisection bracket (N/m) for the flutter-boundary tension search.
const BOUNDARY_TENSION_MIN: f64 = 0.01;
const BOUNDARY_TENSION_MAX: f64 = 50.0;
const BOUNDARY_BISECTION_STEPS: usize = 30;

/// Rotation-induced tension (N/m).
pub fn centrifugal_tension(areal_density: f64, spin_rpm: f64, diameter: f64) -> f64 {
    let omega = rpm_to_rad_per_sec(spin_rpm);
    let radius = diameter / 2.0;
    areal_density * omega * omega * radius * radius / 4.0
}

/// Applied plus centrifugal tension (N/m).
pub fn effective_tension(point: &ParameterPoint) -> f64 {
    point.tension + centrifugal_tension(point.areal_density, point.spin_rpm, point.diameter)
}

/// `sqrt(T_eff / sigma) / (pi * D)`: frequency per unit Bessel zero (Hz).
pub fn frequency_factor(point: &ParameterPoint) -> f64 {
    (effective_tension(point) / point.areal_density).sqrt()
        / (std::f64::consts::PI * point.diameter)
}

/// Natural frequencies (Hz) of the first `count` axisymmetric modes, limited by
/// the size of the zero table.
pub fn natural_frequencies(point: &ParameterPoint, count: usize) -> Vec<f64> {
    let factor = frequency_factor(point);
    BESSEL_J0_ZEROS
        .iter()
        .take(count)
        .map(|alpha| alpha * factor)
        .collect()
}

/// Eigenvalues `(2π f_j)²` (rad²/s²) of the first `count` modes.
pub fn bessel_eigenvalues(point: &ParameterPoint, count: usize) -> Vec<f64> {
    natural_frequencies(point, count)
        .into_iter()
        .map(|f| {
            let omega = 2.0 * std::f64::consts::PI * f;
            omega * omega
        })
        .collect()
}

/// Modal estimate for one configuration, from the closed form or a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalEstimate {
    /// Eigenvalues (rad²/s²)
    pub eigenvalues: Vec<f64>,
    /// Natural frequencies (Hz)
    pub natural_frequencies: Vec<f64>,
    pub flutter_margin: f64,
    pub stability: Stability,
    /// Applied plus centrifugal tension (N/m)
    pub effective_tension: f64,
    /// Forcing per unit area used for the margin (N/m²)
    pub srp_force: f64,
}

impl ModalEstimate {
    /// Lowest natural frequency (Hz), 0 when there is none.
    pub fn lowest_frequency(&self) -> f64 {
        self.natural_frequencies
            .iter()
            .copied()
            .find(|&f| f > 0.0)
            .unwrap_or(0.0)
    }
}

/// Frequency (Hz) of an eigenvalue, 0 for non-positive values.
pub fn eigenvalue_to_frequency(lambda: f64) -> f64 {
    if lambda > 0.0 {
        lambda.sqrt() / (2.0 * std::f64::consts::PI)
    } else {
        0.0
    }
}

/// Full closed-form analysis of one configuration.
pub fn analyze_analytic(point: &ParameterPoint, config: &ModalConfig) -> ModalEstimate {
    let eigenvalues = bessel_eigenvalues(point, config.eigen_count);
    let natural_frequencies = natural_frequencies(point, config.eigen_count);
    let flutter = assess_flutter(
        &eigenvalues,
        point.areal_density,
        config.reference_damping,
        config.srp_force,
    );

    ModalEstimate {
        eigenvalues,
        natural_frequencies,
        flutter_margin: flutter.flutter_margin,
        stability: flutter.stability,
        effective_tension: effective_tension(point),
        srp_force: config.srp_force,
    }
}

/// Unrounded closed-form margin of the fundamental mode.
fn analytic_margin(point: &ParameterPoint, config: &ModalConfig) -> f64 {
    let eigenvalues = bessel_eigenvalues(point, 1);
    flutter_margin(
        &eigenvalues,
        point.areal_density,
        config.reference_damping,
        config.srp_force,
    )
}

/// Smallest applied tension (N/m) at which the closed-form model is stable,
/// found by bisection between 0.01 and 50 N/m. Returns the upper bracket when
/// even 50 N/m is not enough.
pub fn flutter_boundary_tension(point: &ParameterPoint, config: &ModalConfig) -> f64 {
    let mut low = BOUNDARY_TENSION_MIN;
    let mut high = BOUNDARY_TENSION_MAX;

    for _ in 0..BOUNDARY_BISECTION_STEPS {
        let mid = 0.5 * (low + high);
        if analytic_margin(&point.with_tension(mid), config) >= STABLE_MARGIN {
            high = mid;
        } else {
            low = mid;
        }
    }

    0.5 * (low + high)
}
