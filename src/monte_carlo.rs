//! Manufacturing-tolerance study.
//!
//! Tension and areal density are perturbed by seeded Gaussian factors and each
//! perturbed membrane is evaluated from the modal table when one is available,
//! from the closed-form model otherwise. A diameter sweep at nominal tension
//! reports how the stability picture and the minimum stable tension scale.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analytic::{flutter_boundary_tension, ModalEstimate};
use crate::config::ModalConfig;
use crate::error::{MembraneError, MembraneResult};
use crate::grid::ModalGrid;
use crate::interpolate::analyze_with_grid;
use crate::types::{ParameterPoint, Stability};

/// Study settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToleranceStudyConfig {
    /// Number of perturbed runs
    pub iterations: usize,
    /// Run `i` is seeded with `seed + i`
    pub seed: u64,
    /// Coefficient of variation of the tension factor
    pub tension_cov: f64,
    /// Coefficient of variation of the density factor
    pub density_cov: f64,
    /// Lower bound of the tension factor
    pub tension_floor: f64,
    /// Lower bound of the density factor
    pub density_floor: f64,
    /// Diameters (m) for the scaling sweep
    pub sweep_diameters: Vec<f64>,
}

impl Default for ToleranceStudyConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            seed: 42,
            tension_cov: 0.05,
            density_cov: 0.03,
            tension_floor: 0.8,
            density_floor: 0.85,
            sweep_diameters: vec![
                100.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0, 600.0, 750.0, 1000.0,
            ],
        }
    }
}

impl ToleranceStudyConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> MembraneResult<()> {
        if self.iterations == 0 {
            return Err(MembraneError::Config(
                "tolerance study needs at least one iteration".into(),
            ));
        }
        for (name, cov) in [("tension_cov", self.tension_cov), ("density_cov", self.density_cov)] {
            if !cov.is_finite() || cov < 0.0 {
                return Err(MembraneError::Config(format!("{name} must be finite and >= 0, got {cov}")));
            }
        }
        for (name, floor) in [
            ("tension_floor", self.tension_floor),
            ("density_floor", self.density_floor),
        ] {
            if !floor.is_finite() || floor <= 0.0 {
                return Err(MembraneError::Config(format!("{name} must be positive, got {floor}")));
            }
        }
        Ok(())
    }
}

/// One diameter of the scaling sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub diameter: f64,
    pub stability: Stability,
    pub flutter_margin: f64,
    /// Lowest natural frequency (Hz)
    pub lowest_frequency: f64,
    /// Minimum applied tension (N/m) for a stable closed-form margin
    pub boundary_tension: f64,
}

/// Aggregate result of a tolerance study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToleranceStudy {
    pub iterations: usize,
    pub stable_fraction: f64,
    pub marginal_fraction: f64,
    pub flutter_fraction: f64,
    pub mean_margin: f64,
    /// Population standard deviation of the margin
    pub std_margin: f64,
    /// Mean lowest natural frequency (Hz)
    pub mean_lowest_frequency: f64,
    pub nominal: ModalEstimate,
    /// True when the nominal point was answered from the table
    pub used_grid: bool,
    pub sweep: Vec<SweepPoint>,
}

/// Perturbed copy of `point` for run `run`.
fn perturbed_point(
    point: &ParameterPoint,
    run: usize,
    study: &ToleranceStudyConfig,
    tension_dist: &Normal<f64>,
    density_dist: &Normal<f64>,
) -> ParameterPoint {
    let mut rng = StdRng::seed_from_u64(study.seed.wrapping_add(run as u64));
    let tension_factor = tension_dist.sample(&mut rng).max(study.tension_floor);
    let density_factor = density_dist.sample(&mut rng).max(study.density_floor);
    ParameterPoint {
        tension: point.tension * tension_factor,
        areal_density: point.areal_density * density_factor,
        ..*point
    }
}

#[cfg(feature = "parallel")]
fn evaluate_runs(
    grid: Option<&ModalGrid>,
    point: &ParameterPoint,
    config: &ModalConfig,
    study: &ToleranceStudyConfig,
    tension_dist: &Normal<f64>,
    density_dist: &Normal<f64>,
) -> Vec<ModalEstimate> {
    (0..study.iterations)
        .into_par_iter()
        .map(|run| {
            let p = perturbed_point(point, run, study, tension_dist, density_dist);
            analyze_with_grid(grid, &p, config).0
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_runs(
    grid: Option<&ModalGrid>,
    point: &ParameterPoint,
    config: &ModalConfig,
    study: &ToleranceStudyConfig,
    tension_dist: &Normal<f64>,
    density_dist: &Normal<f64>,
) -> Vec<ModalEstimate> {
    (0..study.iterations)
        .map(|run| {
            let p = perturbed_point(point, run, study, tension_dist, density_dist);
            analyze_with_grid(grid, &p, config).0
        })
        .collect()
}

fn sweep_diameters(
    grid: Option<&ModalGrid>,
    point: &ParameterPoint,
    config: &ModalConfig,
    diameters: &[f64],
) -> Vec<SweepPoint> {
    diameters
        .iter()
        .map(|&diameter| {
            let p = point.with_diameter(diameter);
            let (estimate, _) = analyze_with_grid(grid, &p, config);
            SweepPoint {
                diameter,
                stability: estimate.stability,
                flutter_margin: estimate.flutter_margin,
                lowest_frequency: estimate.lowest_frequency(),
                boundary_tension: flutter_boundary_tension(&p, config),
            }
        })
        .collect()
}

/// Run the seeded tolerance study around `point`.
///
/// Results depend only on the inputs and `study.seed`, not on thread count.
pub fn run_tolerance_study(
    grid: Option<&ModalGrid>,
    point: &ParameterPoint,
    config: &ModalConfig,
    study: &ToleranceStudyConfig,
) -> MembraneResult<ToleranceStudy> {
    point.validate()?;
    config.validate()?;
    study.validate()?;

    let tension_dist = Normal::new(1.0, study.tension_cov)
        .map_err(|e| MembraneError::Config(format!("tension distribution: {e}")))?;
    let density_dist = Normal::new(1.0, study.density_cov)
        .map_err(|e| MembraneError::Config(format!("density distribution: {e}")))?;

    log::info!(
        "Tolerance study: {} runs around D={} T={} spin={} sigma={} (seed {})",
        study.iterations,
        point.diameter,
        point.tension,
        point.spin_rpm,
        point.areal_density,
        study.seed
    );

    let (nominal, used_grid) = analyze_with_grid(grid, point, config);
    let runs = evaluate_runs(grid, point, config, study, &tension_dist, &density_dist);

    let count = runs.len() as f64;
    let fraction = |class: Stability| runs.iter().filter(|r| r.stability == class).count() as f64 / count;
    let mean_margin = runs.iter().map(|r| r.flutter_margin).sum::<f64>() / count;
    let variance = runs
        .iter()
        .map(|r| (r.flutter_margin - mean_margin).powi(2))
        .sum::<f64>()
        / count;
    let mean_lowest_frequency = runs.iter().map(|r| r.lowest_frequency()).sum::<f64>() / count;

    let result = ToleranceStudy {
        iterations: runs.len(),
        stable_fraction: fraction(Stability::Stable),
        marginal_fraction: fraction(Stability::Marginal),
        flutter_fraction: fraction(Stability::Flutter),
        mean_margin,
        std_margin: variance.sqrt(),
        mean_lowest_frequency,
        sweep: sweep_diameters(grid, point, config, &study.sweep_diameters),
        nominal,
        used_grid,
    };

    log::info!(
        "Tolerance study done: stable {:.1}%, marginal {:.1}%, flutter {:.1}%, margin {:.3} ± {:.3}",
        result.stable_fraction * 100.0,
        result.marginal_fraction * 100.0,
        result.flutter_fraction * 100.0,
        result.mean_margin,
        result.std_margin
    );
    Ok(result)
}
