//! Eigenvalue solvers for the radial membrane.
//!
//! The generalized problem `K x = λ M x` is solved either densely, after a
//! symmetric scaling by the (diagonal) lumped mass, or with shift-invert Lanczos
//! on CSR operators. When the numeric path fails the point is approximated with
//! the closed-form Bessel-zero model instead, and the outcome is tagged so
//! callers can tell the two apart.

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

use crate::analytic::bessel_eigenvalues;
use crate::assembly::{DiagonalOperator, TridiagonalOperator};
use crate::config::ModalConfig;
use crate::error::{MembraneError, MembraneResult};
use crate::mesh::RadialMesh;
use crate::types::{
    round_decimals, EigenSolver, ParameterPoint, EIGENVALUE_DECIMALS, LANCZOS_TOL,
    MAX_EIGEN_SWEEPS, MAX_LANCZOS_ITER, PAD_GROWTH, PAD_SEED,
};

/// Lanczos shift targeting eigenvalues of smallest magnitude.
const SMALLEST_MAGNITUDE_SHIFT: f64 = 0.0;

/// Result of the modal solve for one point.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Eigenvalues from the numeric generalized eigensolve.
    Solved(Vec<f64>),
    /// Eigenvalues from the closed-form fallback.
    Approximated(Vec<f64>),
}

impl SolveOutcome {
    pub fn eigenvalues(&self) -> &[f64] {
        match self {
            SolveOutcome::Solved(v) | SolveOutcome::Approximated(v) => v,
        }
    }

    pub fn into_eigenvalues(self) -> Vec<f64> {
        match self {
            SolveOutcome::Solved(v) | SolveOutcome::Approximated(v) => v,
        }
    }

    pub fn is_approximated(&self) -> bool {
        matches!(self, SolveOutcome::Approximated(_))
    }

    /// Transform the eigenvalues, keeping the tag.
    pub fn map(self, f: impl FnOnce(Vec<f64>) -> Vec<f64>) -> Self {
        match self {
            SolveOutcome::Solved(v) => SolveOutcome::Solved(f(v)),
            SolveOutcome::Approximated(v) => SolveOutcome::Approximated(f(v)),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_operators(k: &TridiagonalOperator, m: &DiagonalOperator) -> MembraneResult<()> {
    if k.size() != m.size() {
        return Err(MembraneError::EigensolveFailed(format!(
            "operator size mismatch: K is {}, M is {}",
            k.size(),
            m.size()
        )));
    }
    if k.size() < 2 {
        return Err(MembraneError::EigensolveFailed(
            "operators must have at least two rows".to_string(),
        ));
    }
    if !k.is_finite() || !m.is_finite() {
        return Err(MembraneError::EigensolveFailed(
            "operators contain non-finite entries".to_string(),
        ));
    }
    if m.diag.iter().any(|&v| v <= 0.0) {
        return Err(MembraneError::EigensolveFailed(
            "mass operator is not positive definite".to_string(),
        ));
    }
    Ok(())
}

/// Keep the `num_modes` eigenvalues of smallest magnitude, sorted ascending.
pub(crate) fn select_smallest_magnitude(
    mut eigenvalues: Vec<f64>,
    num_modes: usize,
) -> MembraneResult<Vec<f64>> {
    if let Some(bad) = eigenvalues.iter().find(|v| !v.is_finite()) {
        return Err(MembraneError::EigensolveFailed(format!(
            "non-finite eigenvalue {bad}"
        )));
    }

    eigenvalues.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    eigenvalues.truncate(num_modes.min(eigenvalues.len()));
    eigenvalues.sort_by(|a, b| a.total_cmp(b));
    Ok(eigenvalues)
}

/// Report negative eigenvalues as 0. They are squared angular frequencies,
/// and the clamp keeps an ascending sequence ascending.
pub fn clamp_non_negative(eigenvalues: Vec<f64>) -> Vec<f64> {
    eigenvalues
        .into_iter()
        .map(|lambda| if lambda <= 0.0 { 0.0 } else { lambda })
        .collect()
}

/// Pad to `target` entries by growing the last value by `PAD_GROWTH`
/// (starting from `PAD_SEED` when empty), then truncate to `target`.
pub fn pad_eigenvalues(mut eigenvalues: Vec<f64>, target: usize) -> Vec<f64> {
    while eigenvalues.len() < target {
        let next = eigenvalues.last().map_or(PAD_SEED, |last| last * PAD_GROWTH);
        eigenvalues.push(next);
    }
    eigenvalues.truncate(target);
    eigenvalues
}

/// Pad, truncate, and round to the reported precision.
pub fn finalize_eigenvalues(eigenvalues: Vec<f64>, target: usize) -> Vec<f64> {
    pad_eigenvalues(eigenvalues, target)
        .into_iter()
        .map(|lambda| round_decimals(lambda, EIGENVALUE_DECIMALS))
        .collect()
}

// ============================================================================
// Dense Solver
// ============================================================================

/// Dense generalized eigensolve.
///
/// With a diagonal mass the problem is equivalent to the standard symmetric
/// problem `A y = λ y` with `A = M^(-1/2) K M^(-1/2)`.
pub fn solve_dense(
    k: &TridiagonalOperator,
    m: &DiagonalOperator,
    num_modes: usize,
) -> MembraneResult<Vec<f64>> {
    check_operators(k, m)?;
    let n = k.size();
    let inv_sqrt: Vec<f64> = m.diag.iter().map(|&mi| 1.0 / mi.sqrt()).collect();

    let mut a = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        a[(i, i)] = k.diag[i] * inv_sqrt[i] * inv_sqrt[i];
    }
    for (i, &e) in k.off_diag.iter().enumerate() {
        let v = e * inv_sqrt[i] * inv_sqrt[i + 1];
        a[(i, i + 1)] = v;
        a[(i + 1, i)] = v;
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(MembraneError::EigensolveFailed(
            "scaled stiffness overflowed".to_string(),
        ));
    }

    let eig = SymmetricEigen::try_new(a, f64::EPSILON, MAX_EIGEN_SWEEPS).ok_or_else(|| {
        MembraneError::EigensolveFailed("symmetric eigensolve did not converge".to_string())
    })?;

    select_smallest_magnitude(eig.eigenvalues.iter().copied().collect(), num_modes)
}

// ============================================================================
// Sparse Eigenvalue Solver (Shift-Invert Lanczos)
// ============================================================================

/// Build the shifted matrix (K - sigma * M) as a dense matrix for factorization.
fn build_shifted_matrix_dense(k: &CsrMatrix<f64>, m: &CsrMatrix<f64>, sigma: f64) -> DMatrix<f64> {
    let n = k.nrows();
    let mut a = DMatrix::zeros(n, n);

    for (i, row) in k.row_iter().enumerate() {
        for (&col, &val) in row.col_indices().iter().zip(row.values().iter()) {
            a[(i, col)] += val;
        }
    }

    for (i, row) in m.row_iter().enumerate() {
        for (&col, &val) in row.col_indices().iter().zip(row.values().iter()) {
            a[(i, col)] -= sigma * val;
        }
    }

    a
}

/// Shift-invert Lanczos for `K x = λ M x`.
///
/// Iterates on `(K - σM)^(-1) M`, whose dominant eigenvalues `θ = 1/(λ - σ)`
/// belong to the `λ` closest to `σ`. Returns the `num_modes` eigenvalues of
/// smallest magnitude among the converged Ritz values, sorted ascending and
/// unclamped.
pub fn lanczos_shift_invert(
    k: &CsrMatrix<f64>,
    m: &CsrMatrix<f64>,
    num_modes: usize,
    sigma: f64,
) -> MembraneResult<Vec<f64>> {
    let n = k.nrows();
    if n < 2 || m.nrows() != n {
        return Err(MembraneError::EigensolveFailed(
            "Lanczos needs two or more matching rows".to_string(),
        ));
    }
    let num_lanczos = (2 * num_modes + 10).min(n).min(MAX_LANCZOS_ITER);

    // LU because K - σM may be indefinite
    let a_shifted = build_shifted_matrix_dense(k, m, sigma);
    let lu = a_shifted.clone().lu();

    let lu_factor = if lu.is_invertible() {
        lu
    } else {
        let mut a_reg = a_shifted;
        for i in 0..n {
            a_reg[(i, i)] += 1e-8 * a_reg[(i, i)].abs().max(1e-8);
        }
        let lu_reg = a_reg.lu();
        if !lu_reg.is_invertible() {
            return Err(MembraneError::EigensolveFailed(
                "shifted stiffness is singular".to_string(),
            ));
        }
        lu_reg
    };

    let mut v_prev = DVector::zeros(n);
    let mut v_curr = DVector::from_fn(n, |i, _| ((i * 7 + 13) % 101) as f64 / 100.0 - 0.5);

    // M-orthonormalize initial vector
    let mv = m * &v_curr;
    let norm = v_curr.dot(&mv).sqrt();
    if norm.is_nan() || norm < 1e-14 {
        return Err(MembraneError::EigensolveFailed(
            "Lanczos start vector has zero M-norm".to_string(),
        ));
    }
    v_curr /= norm;

    let mut v_matrix = DMatrix::zeros(n, num_lanczos);
    // Cached M*v products for reorthogonalization
    let mut mv_matrix = DMatrix::zeros(n, num_lanczos);
    let mut alpha = Vec::with_capacity(num_lanczos);
    let mut beta: Vec<f64> = Vec::with_capacity(num_lanczos);

    for j in 0..num_lanczos {
        v_matrix.set_column(j, &v_curr);

        let mv_curr = m * &v_curr;
        mv_matrix.set_column(j, &mv_curr);

        let w = lu_factor.solve(&mv_curr).ok_or_else(|| {
            MembraneError::EigensolveFailed("shifted solve failed".to_string())
        })?;

        let mw = m * &w;
        let alpha_j = v_curr.dot(&mw);
        alpha.push(alpha_j);

        let mut w_orth = w - alpha_j * &v_curr;
        if j > 0 {
            w_orth -= beta[j - 1] * &v_prev;
        }

        // Full reorthogonalization against every stored vector
        for col in 0..=j {
            let v_k = v_matrix.column(col);
            let mv_k = mv_matrix.column(col);
            let coeff = w_orth.dot(&mv_k);
            w_orth -= coeff * &v_k;
        }

        let mw_orth = m * &w_orth;
        let beta_j = w_orth.dot(&mw_orth).max(0.0).sqrt();

        if beta_j < LANCZOS_TOL {
            // Invariant subspace found
            break;
        }

        beta.push(beta_j);
        v_prev = v_curr;
        v_curr = w_orth / beta_j;
    }

    let m_lanczos = alpha.len();
    let mut t_mat = DMatrix::zeros(m_lanczos, m_lanczos);
    for i in 0..m_lanczos {
        t_mat[(i, i)] = alpha[i];
        if i < beta.len() && i + 1 < m_lanczos {
            t_mat[(i, i + 1)] = beta[i];
            t_mat[(i + 1, i)] = beta[i];
        }
    }

    let eig = SymmetricEigen::try_new(t_mat, f64::EPSILON, MAX_EIGEN_SWEEPS).ok_or_else(|| {
        MembraneError::EigensolveFailed("Lanczos tridiagonal solve did not converge".to_string())
    })?;

    // lambda = sigma + 1/theta
    let lambdas: Vec<f64> = eig
        .eigenvalues
        .iter()
        .filter(|theta| theta.abs() > 1e-14)
        .map(|theta| sigma + 1.0 / theta)
        .collect();

    select_smallest_magnitude(lambdas, num_modes)
}

// ============================================================================
// Mode Solve With Fallback
// ============================================================================

/// Closed-form approximation of the first `eigen_count` modes.
pub fn approximate_modes(point: &ParameterPoint, config: &ModalConfig) -> SolveOutcome {
    SolveOutcome::Approximated(bessel_eigenvalues(point, config.eigen_count))
}

/// Numeric solve only, using the configured backend.
pub fn solve_primary(
    mesh: &RadialMesh,
    k_total: &TridiagonalOperator,
    m_reg: &DiagonalOperator,
    config: &ModalConfig,
) -> MembraneResult<Vec<f64>> {
    let num_modes = config.requested_modes();
    let backend = config.solver.resolve(mesh.num_nodes);
    log::debug!("Solving {num_modes} modes on {} nodes with {backend:?}", mesh.num_nodes);
    let eigenvalues = match backend {
        EigenSolver::Sparse => lanczos_shift_invert(
            &k_total.to_csr(),
            &m_reg.to_csr(),
            num_modes,
            SMALLEST_MAGNITUDE_SHIFT,
        )?,
        EigenSolver::Dense | EigenSolver::Auto => solve_dense(k_total, m_reg, num_modes)?,
    };
    Ok(clamp_non_negative(eigenvalues))
}

/// Solve for the lowest modes, approximating analytically when the numeric
/// solve fails. Never fails itself.
pub fn solve_modes(
    point: &ParameterPoint,
    mesh: &RadialMesh,
    k_total: &TridiagonalOperator,
    m_reg: &DiagonalOperator,
    config: &ModalConfig,
) -> SolveOutcome {
    match solve_primary(mesh, k_total, m_reg, config) {
        Ok(eigenvalues) => SolveOutcome::Solved(eigenvalues),
        Err(err) => {
            log::warn!(
                "Eigensolve failed at D={} T={} spin={} sigma={}: {err}; using Bessel approximation",
                point.diameter,
                point.tension,
                point.spin_rpm,
                point.areal_density
            );
            approximate_modes(point, config)
        }
    }
}
