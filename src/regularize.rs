//! Mass-operator repair ahead of the generalized eigensolve.

use crate::assembly::DiagonalOperator;
use crate::types::{ABSOLUTE_MASS_FLOOR, MASS_FLOOR_SCALE};

/// Floor value for non-positive masses: the smallest positive entry scaled by
/// `MASS_FLOOR_SCALE`, or `ABSOLUTE_MASS_FLOOR` when nothing is positive.
pub fn mass_floor(diag: &[f64]) -> f64 {
    diag.iter()
        .copied()
        .filter(|&m| m > 0.0)
        .min_by(|a, b| a.total_cmp(b))
        .map(|min_positive| min_positive * MASS_FLOOR_SCALE)
        .unwrap_or(ABSOLUTE_MASS_FLOOR)
}

/// Replace every non-positive diagonal entry with the floor.
///
/// NaN entries are treated as non-positive. The result is strictly positive
/// unless the smallest positive entry is so small that scaling it underflows,
/// in which case the absolute floor is used instead.
pub fn regularize_mass(mass: &DiagonalOperator) -> DiagonalOperator {
    let mut floor = mass_floor(&mass.diag);
    if floor <= 0.0 {
        floor = ABSOLUTE_MASS_FLOOR;
    }

    let mut repaired = 0usize;
    let diag = mass
        .diag
        .iter()
        .map(|&m| {
            if m > 0.0 {
                m
            } else {
                repaired += 1;
                floor
            }
        })
        .collect();

    if repaired > 0 {
        log::debug!(
            "Regularized {repaired}/{} mass entries to floor {floor:.3e}",
            mass.size()
        );
    }

    DiagonalOperator { diag }
}
