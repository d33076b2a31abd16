//! Error taxonomy for grid generation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MembraneError {
    /// A parameter point value is out of its physical range.
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The radial mesh is too coarse to request any eigenvalue.
    #[error("Element count {elements} is too small (need at least 3)")]
    TooFewElements { elements: usize },

    /// The numeric eigensolve did not produce a usable spectrum.
    /// Recovered inside the solver by the analytic approximation.
    #[error("Eigensolve failed: {0}")]
    EigensolveFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MembraneResult<T> = Result<T, MembraneError>;
