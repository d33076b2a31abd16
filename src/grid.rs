//! Per-point analysis and the 4D grid runner.
//!
//! Every grid point is independent: mesh, operators and spectrum are built and
//! dropped inside `analyze_point`. The runner only enumerates indices, fans the
//! points out (over rayon when the `parallel` feature is enabled), and collects
//! records in iteration order.

use std::path::Path;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assembly::assemble_operators;
use crate::config::{GridAxes, ModalConfig};
use crate::error::{MembraneError, MembraneResult};
use crate::flutter::assess_flutter;
use crate::mesh::RadialMesh;
use crate::regularize::regularize_mass;
use crate::solver::{finalize_eigenvalues, pad_eigenvalues, solve_modes};
use crate::types::{ParameterPoint, Stability};

/// Points between progress log lines.
const PROGRESS_INTERVAL: usize = 100;

/// Modal and flutter summary of one parameter point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalResult {
    /// Ascending eigenvalues (rad²/s²), rounded to 6 decimals
    pub eigenvalues: Vec<f64>,
    /// Flutter margin, rounded to 4 decimals
    pub flutter_margin: f64,
    pub stability: Stability,
    /// True when the closed-form fallback produced the spectrum.
    #[serde(skip)]
    pub approximated: bool,
}

/// A `ModalResult` tagged with its axis indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub d: usize,
    pub t: usize,
    pub s: usize,
    pub a: usize,
    #[serde(flatten)]
    pub result: ModalResult,
}

impl GridRecord {
    pub fn indices(&self) -> [usize; 4] {
        [self.d, self.t, self.s, self.a]
    }
}

/// The serialized table: axes plus one record per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalGrid {
    pub grid: GridAxes,
    pub points: Vec<GridRecord>,
}

/// A grid point that could not be analyzed.
#[derive(Debug)]
pub struct GridFailure {
    pub indices: [usize; 4],
    pub point: ParameterPoint,
    pub error: MembraneError,
}

/// Result of a grid run.
#[derive(Debug)]
pub struct GridOutcome {
    pub grid: ModalGrid,
    pub failures: Vec<GridFailure>,
}

impl GridOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of records produced by the closed-form fallback.
    pub fn approximated_count(&self) -> usize {
        self.grid
            .points
            .iter()
            .filter(|p| p.result.approximated)
            .count()
    }
}

/// Run the full pipeline for one parameter point.
///
/// Fails only for invalid input; eigensolve problems are absorbed by the
/// closed-form fallback.
pub fn analyze_point(point: &ParameterPoint, config: &ModalConfig) -> MembraneResult<ModalResult> {
    point.validate()?;
    config.validate()?;

    let mesh = RadialMesh::uniform(point.diameter, config.element_count);
    let operators = assemble_operators(point, &mesh);
    let k_total = operators.total_stiffness();
    let m_reg = regularize_mass(&operators.mass);

    // margin from the unrounded spectrum; rounding is for the record only
    let outcome = solve_modes(point, &mesh, &k_total, &m_reg, config)
        .map(|eigs| pad_eigenvalues(eigs, config.eigen_count));
    let flutter = assess_flutter(
        outcome.eigenvalues(),
        point.areal_density,
        config.reference_damping,
        config.srp_force,
    );

    Ok(ModalResult {
        approximated: outcome.is_approximated(),
        eigenvalues: finalize_eigenvalues(outcome.into_eigenvalues(), config.eigen_count),
        flutter_margin: flutter.flutter_margin,
        stability: flutter.stability,
    })
}

/// Every `(indices, point)` pair of the grid in `d, t, s, a` order.
pub fn enumerate_points(axes: &GridAxes) -> Vec<([usize; 4], ParameterPoint)> {
    let mut points = Vec::with_capacity(axes.num_points());
    for (d, &diameter) in axes.diameters.iter().enumerate() {
        for (t, &tension) in axes.tensions.iter().enumerate() {
            for (s, &spin) in axes.spin_rates.iter().enumerate() {
                for (a, &sigma) in axes.areal_densities.iter().enumerate() {
                    points.push((
                        [d, t, s, a],
                        ParameterPoint::new(diameter, tension, spin, sigma),
                    ));
                }
            }
        }
    }
    points
}

fn log_progress(done: usize, total: usize) {
    if done % PROGRESS_INTERVAL == 0 || done == total {
        let pct = done as f64 / total as f64 * 100.0;
        log::info!("  {done}/{total} ({pct:.0}%)");
    }
}

#[cfg(feature = "parallel")]
fn evaluate_points(
    points: &[([usize; 4], ParameterPoint)],
    config: &ModalConfig,
) -> Vec<MembraneResult<ModalResult>> {
    let done = AtomicUsize::new(0);
    let total = points.len();
    points
        .par_iter()
        .map(|(_, point)| {
            let result = analyze_point(point, config);
            log_progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
            result
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_points(
    points: &[([usize; 4], ParameterPoint)],
    config: &ModalConfig,
) -> Vec<MembraneResult<ModalResult>> {
    let total = points.len();
    points
        .iter()
        .enumerate()
        .map(|(i, (_, point))| {
            let result = analyze_point(point, config);
            log_progress(i + 1, total);
            result
        })
        .collect()
}

/// Analyze every point of the grid.
///
/// Configuration problems abort the run up front. A failing point is logged,
/// reported in `GridOutcome::failures`, and left out of the table; the other
/// points are unaffected.
pub fn run_grid(axes: &GridAxes, config: &ModalConfig) -> MembraneResult<GridOutcome> {
    axes.validate()?;
    config.validate()?;

    let [nd, nt, ns, na] = axes.shape();
    log::info!(
        "Generating modal grid: {} points ({nd} x {nt} x {ns} x {na}), {} elements, {} modes",
        axes.num_points(),
        config.element_count,
        config.eigen_count
    );

    let points = enumerate_points(axes);
    let results = evaluate_points(&points, config);

    let mut records = Vec::with_capacity(points.len());
    let mut failures = Vec::new();
    for ((indices, point), result) in points.into_iter().zip(results) {
        match result {
            Ok(result) => records.push(GridRecord {
                d: indices[0],
                t: indices[1],
                s: indices[2],
                a: indices[3],
                result,
            }),
            Err(error) => {
                log::error!("Grid point {indices:?} ({point:?}) failed: {error}");
                failures.push(GridFailure {
                    indices,
                    point,
                    error,
                });
            }
        }
    }

    let outcome = GridOutcome {
        grid: ModalGrid {
            grid: axes.clone(),
            points: records,
        },
        failures,
    };
    log::info!(
        "Modal grid complete: {} records, {} approximated, {} failed",
        outcome.grid.points.len(),
        outcome.approximated_count(),
        outcome.failures.len()
    );
    Ok(outcome)
}

impl ModalGrid {
    /// Record at the given axis indices.
    pub fn find(&self, d: usize, t: usize, s: usize, a: usize) -> Option<&GridRecord> {
        let [_, nt, ns, na] = self.grid.shape();
        let flat = ((d * nt + t) * ns + s) * na + a;
        match self.points.get(flat) {
            Some(p) if p.indices() == [d, t, s, a] => Some(p),
            _ => self.points.iter().find(|p| p.indices() == [d, t, s, a]),
        }
    }

    /// Parameter point for the given axis indices.
    pub fn point_at(&self, d: usize, t: usize, s: usize, a: usize) -> Option<ParameterPoint> {
        Some(ParameterPoint::new(
            *self.grid.diameters.get(d)?,
            *self.grid.tensions.get(t)?,
            *self.grid.spin_rates.get(s)?,
            *self.grid.areal_densities.get(a)?,
        ))
    }

    /// Compact JSON, as consumed by the front-end.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write compact JSON, creating parent directories as needed.
    pub fn write_json(&self, path: impl AsRef<Path>) -> MembraneResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> MembraneResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}
