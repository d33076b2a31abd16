//! Modal stability tables for spinning, tensioned circular membranes.
//!
//! Each configuration `(diameter, tension, spin rate, areal density)` is
//! discretized into a 1D axisymmetric radial mesh, its lowest vibration modes
//! are solved from the generalized eigenproblem `K φ = λ M φ`, and the
//! fundamental mode is checked against radiation-pressure flutter. The grid
//! runner sweeps a 4D parameter table and writes it as JSON.
//!
//! ```no_run
//! use membrane_modal_grid::{analyze_point, ModalConfig, ParameterPoint};
//!
//! let point = ParameterPoint::new(500.0, 1.0, 0.2, 0.04);
//! let result = analyze_point(&point, &ModalConfig::default())?;
//! println!("{} margin {}", result.stability, result.flutter_margin);
//! # Ok::<(), membrane_modal_grid::MembraneError>(())
//! ```

pub mod analytic;
pub mod assembly;
pub mod config;
pub mod error;
pub mod flutter;
pub mod grid;
pub mod interpolate;
pub mod mesh;
pub mod monte_carlo;
pub mod regularize;
pub mod solver;
pub mod types;

pub use analytic::{analyze_analytic, flutter_boundary_tension, ModalEstimate};
pub use assembly::{assemble_operators, DiagonalOperator, MembraneOperators, TridiagonalOperator};
pub use config::{GridAxes, ModalConfig, RunConfig};
pub use error::{MembraneError, MembraneResult};
pub use flutter::{assess_flutter, flutter_margin, srp_force_at, FlutterAssessment};
pub use grid::{analyze_point, run_grid, GridFailure, GridOutcome, GridRecord, ModalGrid, ModalResult};
pub use interpolate::analyze_with_grid;
pub use mesh::RadialMesh;
pub use monte_carlo::{run_tolerance_study, SweepPoint, ToleranceStudy, ToleranceStudyConfig};
pub use regularize::regularize_mass;
pub use solver::{solve_modes, SolveOutcome};
pub use types::{EigenSolver, ParameterPoint, Stability};
