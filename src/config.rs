//! Engine configuration and grid axes.
//!
//! Everything here is plain data threaded explicitly through the engine, so a
//! grid point's computation depends only on its `ParameterPoint` and the
//! `ModalConfig` it is handed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MembraneError, MembraneResult};
use crate::flutter::srp_force_at;
use crate::types::{
    EigenSolver, DEFAULT_EIGEN_COUNT, DEFAULT_ELEMENT_COUNT, DEFAULT_REFERENCE_DAMPING,
    MIN_ELEMENT_COUNT, REFERENCE_DISTANCE_AU,
};

/// Per-point solver and flutter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModalConfig {
    /// Number of radial elements (nodes) in the mesh.
    pub element_count: usize,
    /// Number of eigenvalues reported per point.
    pub eigen_count: usize,
    /// Structural damping ratio used for the flutter margin.
    pub reference_damping: f64,
    /// Destabilizing radiation-pressure force per unit area (N/m²).
    pub srp_force: f64,
    /// Numeric backend for the primary eigensolve.
    pub solver: EigenSolver,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            element_count: DEFAULT_ELEMENT_COUNT,
            eigen_count: DEFAULT_EIGEN_COUNT,
            reference_damping: DEFAULT_REFERENCE_DAMPING,
            srp_force: srp_force_at(REFERENCE_DISTANCE_AU),
            solver: EigenSolver::Auto,
        }
    }
}

impl ModalConfig {
    pub fn with_element_count(mut self, element_count: usize) -> Self {
        self.element_count = element_count;
        self
    }

    pub fn with_eigen_count(mut self, eigen_count: usize) -> Self {
        self.eigen_count = eigen_count;
        self
    }

    pub fn with_srp_force(mut self, srp_force: f64) -> Self {
        self.srp_force = srp_force;
        self
    }

    pub fn with_solver(mut self, solver: EigenSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Number of modes the numeric solver is asked for: `min(eigen_count, n - 2)`.
    pub fn requested_modes(&self) -> usize {
        self.eigen_count.min(self.element_count.saturating_sub(2))
    }

    pub fn validate(&self) -> MembraneResult<()> {
        if self.element_count < MIN_ELEMENT_COUNT {
            return Err(MembraneError::TooFewElements {
                elements: self.element_count,
            });
        }
        if self.eigen_count == 0 {
            return Err(MembraneError::Config(
                "eigen_count must be at least 1".to_string(),
            ));
        }
        if !self.reference_damping.is_finite() || self.reference_damping < 0.0 {
            return Err(MembraneError::Config(format!(
                "reference_damping must be finite and non-negative, got {}",
                self.reference_damping
            )));
        }
        if !self.srp_force.is_finite() {
            return Err(MembraneError::Config(format!(
                "srp_force must be finite, got {}",
                self.srp_force
            )));
        }
        Ok(())
    }
}

/// The four ordered parameter axes of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAxes {
    /// Membrane diameters (m)
    pub diameters: Vec<f64>,
    /// Edge tensions (N/m)
    pub tensions: Vec<f64>,
    /// Spin rates (RPM)
    pub spin_rates: Vec<f64>,
    /// Areal densities (kg/m²)
    pub areal_densities: Vec<f64>,
}

impl Default for GridAxes {
    fn default() -> Self {
        Self::reference()
    }
}

impl GridAxes {
    /// The 5 × 10 × 5 × 4 reference table.
    pub fn reference() -> Self {
        let tensions = logspace(0.1, 10.0, 10)
            .into_iter()
            .map(|t| crate::types::round_decimals(t, 3))
            .collect();
        Self {
            diameters: vec![100.0, 250.0, 500.0, 750.0, 1000.0],
            tensions,
            spin_rates: vec![0.0, 0.1, 0.2, 0.35, 0.5],
            areal_densities: vec![0.035, 0.040, 0.045, 0.050],
        }
    }

    /// Axis lengths in `(d, t, s, a)` order.
    pub fn shape(&self) -> [usize; 4] {
        [
            self.diameters.len(),
            self.tensions.len(),
            self.spin_rates.len(),
            self.areal_densities.len(),
        ]
    }

    pub fn num_points(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn validate(&self) -> MembraneResult<()> {
        let axes = [
            ("diameters", &self.diameters),
            ("tensions", &self.tensions),
            ("spinRates", &self.spin_rates),
            ("arealDensities", &self.areal_densities),
        ];
        for (name, values) in axes {
            if values.is_empty() {
                return Err(MembraneError::Config(format!("axis {name} is empty")));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(MembraneError::Config(format!(
                    "axis {name} contains a non-finite value"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration file for a full grid run. Missing sections take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub axes: GridAxes,
    pub modal: ModalConfig,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> MembraneResult<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.axes.validate()?;
        config.modal.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> MembraneResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// `count` values spaced evenly in log10 between `start` and `stop`, inclusive.
pub fn logspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (lo, hi) = (start.log10(), stop.log10());
            let step = (hi - lo) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(lo + step * i as f64))
                .collect()
        }
    }
}
