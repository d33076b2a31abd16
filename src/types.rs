//! Constants, parameter points, and core enums shared across the engine.

use serde::{Deserialize, Serialize};

use crate::error::{MembraneError, MembraneResult};

// Discretization defaults
pub const DEFAULT_ELEMENT_COUNT: usize = 50;
pub const DEFAULT_EIGEN_COUNT: usize = 20;
/// Smallest usable radial mesh; the solver requests at most `n - 2` modes.
pub const MIN_ELEMENT_COUNT: usize = 3;

/// Reference structural damping ratio for the flutter margin.
pub const DEFAULT_REFERENCE_DAMPING: f64 = 0.03;

/// Solar radiation pressure at 1 AU (N/m²).
pub const SRP_1AU: f64 = 4.56e-6;
/// Heliocentric distance (AU) at which the reference forcing is evaluated.
pub const REFERENCE_DISTANCE_AU: f64 = 0.5;
/// Forcing multiplier for a thin film with reflectivity around 0.1.
pub const REFLECTIVITY_FACTOR: f64 = 1.1;

/// Margin at or above which a point is stable.
pub const STABLE_MARGIN: f64 = 2.0;
/// Margin at or above which a point is marginal (below: flutter).
pub const MARGINAL_MARGIN: f64 = 1.0;
/// Margin reported when there is no destabilizing force at all.
pub const UNFORCED_MARGIN: f64 = 100.0;

/// Relative floor applied to non-positive lumped masses.
pub const MASS_FLOOR_SCALE: f64 = 1e-6;
/// Floor used when no mass entry is positive.
pub const ABSOLUTE_MASS_FLOOR: f64 = 1e-12;

/// Growth factor between consecutive padded eigenvalues.
pub const PAD_GROWTH: f64 = 1.2;
/// Padding seed used when the solver produced nothing.
pub const PAD_SEED: f64 = 1.0;

pub const EIGENVALUE_DECIMALS: i32 = 6;
pub const MARGIN_DECIMALS: i32 = 4;

/// Node count above which `EigenSolver::Auto` switches to Lanczos.
pub const SPARSE_NODE_THRESHOLD: usize = 200;

/// Maximum Lanczos iterations.
pub const MAX_LANCZOS_ITER: usize = 300;

/// Convergence tolerance for Lanczos.
pub const LANCZOS_TOL: f64 = 1e-10;

/// Sweep limit for the dense symmetric eigensolver.
pub const MAX_EIGEN_SWEEPS: usize = 10_000;

/// Solver type for eigenvalue computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EigenSolver {
    /// Symmetrically scaled dense eigendecomposition. Best for small meshes.
    Dense,
    /// Shift-invert Lanczos on CSR operators. Best for fine meshes.
    Sparse,
    /// Choose by node count.
    #[default]
    Auto,
}

impl EigenSolver {
    /// Resolve `Auto` against a node count.
    pub fn resolve(self, num_nodes: usize) -> EigenSolver {
        match self {
            EigenSolver::Auto if num_nodes > SPARSE_NODE_THRESHOLD => EigenSolver::Sparse,
            EigenSolver::Auto => EigenSolver::Dense,
            other => other,
        }
    }
}

/// Stability class derived from the flutter margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Marginal,
    Flutter,
}

impl Stability {
    /// Classify a margin. Each band includes its lower bound.
    pub fn from_margin(margin: f64) -> Self {
        if margin >= STABLE_MARGIN {
            Stability::Stable
        } else if margin >= MARGINAL_MARGIN {
            Stability::Marginal
        } else {
            Stability::Flutter
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::Marginal => "marginal",
            Stability::Flutter => "flutter",
        }
    }
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One membrane configuration drawn from the grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPoint {
    /// Membrane diameter (m)
    pub diameter: f64,
    /// Edge tension (N/m)
    pub tension: f64,
    /// Spin rate (RPM)
    pub spin_rpm: f64,
    /// Areal density (kg/m²)
    pub areal_density: f64,
}

impl ParameterPoint {
    pub fn new(diameter: f64, tension: f64, spin_rpm: f64, areal_density: f64) -> Self {
        Self {
            diameter,
            tension,
            spin_rpm,
            areal_density,
        }
    }

    /// Spin rate in rad/s.
    pub fn omega(&self) -> f64 {
        rpm_to_rad_per_sec(self.spin_rpm)
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Reject values that cannot describe a physical membrane.
    pub fn validate(&self) -> MembraneResult<()> {
        let positive = [
            ("diameter", self.diameter),
            ("tension", self.tension),
            ("areal_density", self.areal_density),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MembraneError::InvalidParameter { name, value });
            }
        }
        if !self.spin_rpm.is_finite() || self.spin_rpm < 0.0 {
            return Err(MembraneError::InvalidParameter {
                name: "spin_rpm",
                value: self.spin_rpm,
            });
        }
        Ok(())
    }

    pub fn with_tension(self, tension: f64) -> Self {
        Self { tension, ..self }
    }

    pub fn with_diameter(self, diameter: f64) -> Self {
        Self { diameter, ..self }
    }
}

#[inline]
pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * 2.0 * std::f64::consts::PI / 60.0
}

/// Round half away from zero to a fixed number of decimals.
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}
