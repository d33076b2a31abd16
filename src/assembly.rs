//! Stiffness, centrifugal-stiffness, and lumped mass operators.
//!
//! All operators are assembled straight from closed-form nodal formulas and
//! stored as bands. Dense and CSR views are produced on demand for the
//! eigensolvers.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::mesh::RadialMesh;
use crate::types::ParameterPoint;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Symmetric tridiagonal operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalOperator {
    /// Main diagonal, length `n`
    pub diag: Vec<f64>,
    /// Super/sub diagonal, length `n - 1`
    pub off_diag: Vec<f64>,
}

/// Diagonal operator.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalOperator {
    pub diag: Vec<f64>,
}

impl TridiagonalOperator {
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// `self + other`; the result stays tridiagonal.
    pub fn add_diagonal(&self, other: &DiagonalOperator) -> TridiagonalOperator {
        debug_assert_eq!(self.size(), other.size());
        TridiagonalOperator {
            diag: self
                .diag
                .iter()
                .zip(&other.diag)
                .map(|(a, b)| a + b)
                .collect(),
            off_diag: self.off_diag.clone(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.diag.iter().chain(&self.off_diag).all(|v| v.is_finite())
    }

    /// Matrix-vector product without materializing the matrix.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.size();
        DVector::from_fn(n, |i, _| {
            let mut y = self.diag[i] * x[i];
            if i > 0 {
                y += self.off_diag[i - 1] * x[i - 1];
            }
            if i + 1 < n {
                y += self.off_diag[i] * x[i + 1];
            }
            y
        })
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut mat = DMatrix::<f64>::zeros(n, n);
        for (i, &d) in self.diag.iter().enumerate() {
            mat[(i, i)] = d;
        }
        for (i, &e) in self.off_diag.iter().enumerate() {
            mat[(i, i + 1)] = e;
            mat[(i + 1, i)] = e;
        }
        mat
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let n = self.size();
        let mut coo = CooMatrix::new(n, n);
        for (i, &d) in self.diag.iter().enumerate() {
            coo.push(i, i, d);
        }
        for (i, &e) in self.off_diag.iter().enumerate() {
            if e.abs() > f64::EPSILON {
                coo.push(i, i + 1, e);
                coo.push(i + 1, i, e);
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl DiagonalOperator {
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    pub fn is_finite(&self) -> bool {
        self.diag.iter().all(|v| v.is_finite())
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_column_slice(&self.diag))
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let n = self.size();
        let mut coo = CooMatrix::new(n, n);
        for (i, &d) in self.diag.iter().enumerate() {
            coo.push(i, i, d);
        }
        CsrMatrix::from(&coo)
    }
}

/// The three operators of one parameter point.
#[derive(Debug, Clone)]
pub struct MembraneOperators {
    pub stiffness: TridiagonalOperator,
    pub centrifugal: DiagonalOperator,
    pub mass: DiagonalOperator,
}

impl MembraneOperators {
    /// `K + K_spin`.
    pub fn total_stiffness(&self) -> TridiagonalOperator {
        self.stiffness.add_diagonal(&self.centrifugal)
    }
}

/// Radial membrane stiffness.
///
/// The two end nodes carry a one-sided weight `T * r_i / dr`, interior nodes
/// `2 * T * r_i / dr`. The coupling between nodes `i` and `i + 1` uses the
/// midpoint radius.
pub fn assemble_stiffness(mesh: &RadialMesh, tension: f64) -> TridiagonalOperator {
    let n = mesh.num_nodes;
    let dr = mesh.dr;

    let diag = (0..n)
        .map(|i| {
            let weight = if mesh.is_boundary(i) { 1.0 } else { 2.0 };
            weight * tension * mesh.node_radius(i) / dr
        })
        .collect();
    let off_diag = (0..n.saturating_sub(1))
        .map(|i| -tension * mesh.midpoint_radius(i) / dr)
        .collect();

    TridiagonalOperator { diag, off_diag }
}

/// Lumped mass: the annulus `sigma * 2π r_i dr` around each node.
pub fn assemble_mass(mesh: &RadialMesh, areal_density: f64) -> DiagonalOperator {
    let diag = (0..mesh.num_nodes)
        .map(|i| areal_density * TWO_PI * mesh.node_radius(i) * mesh.dr)
        .collect();
    DiagonalOperator { diag }
}

/// Centrifugal stiffening `sigma * omega² * r_i * 2π dr`.
pub fn assemble_centrifugal(mesh: &RadialMesh, areal_density: f64, omega: f64) -> DiagonalOperator {
    let diag = (0..mesh.num_nodes)
        .map(|i| areal_density * omega * omega * mesh.node_radius(i) * TWO_PI * mesh.dr)
        .collect();
    DiagonalOperator { diag }
}

/// Assemble every operator for one parameter point.
pub fn assemble_operators(point: &ParameterPoint, mesh: &RadialMesh) -> MembraneOperators {
    MembraneOperators {
        stiffness: assemble_stiffness(mesh, point.tension),
        centrifugal: assemble_centrifugal(mesh, point.areal_density, point.omega()),
        mass: assemble_mass(mesh, point.areal_density),
    }
}
