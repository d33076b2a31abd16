//! Table lookup: quadrilinear interpolation into a computed modal grid.

use crate::analytic::{analyze_analytic, effective_tension, eigenvalue_to_frequency, ModalEstimate};
use crate::config::ModalConfig;
use crate::grid::ModalGrid;
use crate::types::{round_decimals, ParameterPoint, Stability, MARGIN_DECIMALS};

/// Bracketing indices of `value` on an ascending axis and the fractional
/// position between them. Values outside the axis clamp to its ends.
pub fn bracket(axis: &[f64], value: f64) -> (usize, usize, f64) {
    let Some(&last) = axis.last() else {
        return (0, 0, 0.0);
    };
    if axis.len() == 1 || value <= axis[0] {
        return (0, 0, 0.0);
    }
    if value >= last {
        let end = axis.len() - 1;
        return (end, end, 0.0);
    }

    let hi = axis.partition_point(|&x| x <= value).min(axis.len() - 1);
    let lo = hi - 1;
    let span = axis[hi] - axis[lo];
    let fraction = if span > 0.0 {
        (value - axis[lo]) / span
    } else {
        0.0
    };
    (lo, hi, fraction)
}

impl ModalGrid {
    /// Blend the 16 records around `point`.
    ///
    /// Returns `None` if any corner record is missing from the table, for
    /// example because that grid point failed.
    pub fn interpolate(&self, point: &ParameterPoint, config: &ModalConfig) -> Option<ModalEstimate> {
        let brackets = [
            bracket(&self.grid.diameters, point.diameter),
            bracket(&self.grid.tensions, point.tension),
            bracket(&self.grid.spin_rates, point.spin_rpm),
            bracket(&self.grid.areal_densities, point.areal_density),
        ];

        let mut eigenvalues: Option<Vec<f64>> = None;
        let mut margin = 0.0;

        for corner in 0..16usize {
            let mut idx = [0usize; 4];
            let mut weight = 1.0;
            for (axis, &(lo, hi, frac)) in brackets.iter().enumerate() {
                if (corner >> axis) & 1 == 1 {
                    idx[axis] = hi;
                    weight *= frac;
                } else {
                    idx[axis] = lo;
                    weight *= 1.0 - frac;
                }
            }

            let record = self.find(idx[0], idx[1], idx[2], idx[3])?;
            let eigs = &record.result.eigenvalues;
            let acc = eigenvalues.get_or_insert_with(|| vec![0.0; eigs.len()]);
            acc.truncate(eigs.len());
            for (a, &lambda) in acc.iter_mut().zip(eigs) {
                *a += weight * lambda;
            }
            margin += weight * record.result.flutter_margin;
        }

        let eigenvalues = eigenvalues?;
        let flutter_margin = round_decimals(margin, MARGIN_DECIMALS);
        Some(ModalEstimate {
            natural_frequencies: eigenvalues.iter().map(|&l| eigenvalue_to_frequency(l)).collect(),
            eigenvalues,
            flutter_margin,
            stability: Stability::from_margin(flutter_margin),
            effective_tension: effective_tension(point),
            srp_force: config.srp_force,
        })
    }
}

/// Estimate from the table when it covers `point`, from the closed-form model
/// otherwise. The flag is true when the table was used.
pub fn analyze_with_grid(
    grid: Option<&ModalGrid>,
    point: &ParameterPoint,
    config: &ModalConfig,
) -> (ModalEstimate, bool) {
    match grid.and_then(|g| g.interpolate(point, config)) {
        Some(estimate) => (estimate, true),
        None => (analyze_analytic(point, config), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridAxes;
    use crate::grid::{enumerate_points, GridRecord, ModalResult};

    /// Table whose values are multilinear in the parameters, which
    /// quadrilinear blending reproduces exactly.
    fn linear_grid() -> ModalGrid {
        let axes = GridAxes {
            diameters: vec![100.0, 200.0],
            tensions: vec![1.0, 2.0, 4.0],
            spin_rates: vec![0.0, 0.5],
            areal_densities: vec![0.04, 0.05],
        };
        let points = enumerate_points(&axes)
            .into_iter()
            .map(|(idx, p)| {
                let base = p.diameter + 10.0 * p.tension + 100.0 * p.spin_rpm + 1000.0 * p.areal_density;
                let margin = 0.01 * p.tension + 0.5;
                GridRecord {
                    d: idx[0],
                    t: idx[1],
                    s: idx[2],
                    a: idx[3],
                    result: ModalResult {
                        eigenvalues: vec![base, 2.0 * base],
                        flutter_margin: margin,
                        stability: Stability::from_margin(margin),
                        approximated: false,
                    },
                }
            })
            .collect();
        ModalGrid { grid: axes, points }
    }

    #[test]
    fn bracket_inside_and_outside() {
        let axis = [1.0, 2.0, 4.0];
        assert_eq!(bracket(&axis, 0.5), (0, 0, 0.0));
        assert_eq!(bracket(&axis, 5.0), (2, 2, 0.0));
        assert_eq!(bracket(&axis, 4.0), (2, 2, 0.0));
        assert_eq!(bracket(&axis, 2.0), (1, 2, 0.0));

        let (lo, hi, f) = bracket(&axis, 3.0);
        assert_eq!((lo, hi), (1, 2));
        assert!((f - 0.5).abs() < 1e-12);

        assert_eq!(bracket(&[7.0], 3.0), (0, 0, 0.0));
        assert_eq!(bracket(&[], 3.0), (0, 0, 0.0));
    }

    #[test]
    fn grid_nodes_are_reproduced() {
        let grid = linear_grid();
        let config = ModalConfig::default();
        let point = ParameterPoint::new(200.0, 2.0, 0.5, 0.04);
        let est = grid.interpolate(&point, &config).unwrap();
        let rec = grid.find(1, 1, 1, 0).unwrap();
        assert!((est.eigenvalues[0] - rec.result.eigenvalues[0]).abs() < 1e-9);
        assert!((est.flutter_margin - rec.result.flutter_margin).abs() < 1e-12);
    }

    #[test]
    fn blend_is_exact_for_multilinear_data() {
        let grid = linear_grid();
        let config = ModalConfig::default();
        let point = ParameterPoint::new(130.0, 3.0, 0.2, 0.047);
        let est = grid.interpolate(&point, &config).unwrap();

        let expected = 130.0 + 30.0 + 20.0 + 47.0;
        assert_eq!(est.eigenvalues.len(), 2);
        assert!((est.eigenvalues[0] - expected).abs() < 1e-9);
        assert!((est.eigenvalues[1] - 2.0 * expected).abs() < 1e-9);
        assert!((est.flutter_margin - 0.53).abs() < 1e-12);
        assert_eq!(est.stability, Stability::Flutter);
        assert!((est.natural_frequencies[0] - eigenvalue_to_frequency(expected)).abs() < 1e-12);
    }

    #[test]
    fn missing_corner_gives_none() {
        let mut grid = linear_grid();
        grid.points.retain(|p| p.indices() != [0, 1, 0, 0]);
        let config = ModalConfig::default();
        let point = ParameterPoint::new(150.0, 1.5, 0.25, 0.045);
        assert!(grid.interpolate(&point, &config).is_none());

        let (est, used) = analyze_with_grid(Some(&grid), &point, &config);
        assert!(!used);
        assert_eq!(est, analyze_analytic(&point, &config));
    }

    #[test]
    fn without_table_falls_back_to_closed_form() {
        let config = ModalConfig::default();
        let point = ParameterPoint::new(500.0, 1.0, 0.2, 0.04);
        let (est, used) = analyze_with_grid(None, &point, &config);
        assert!(!used);
        assert_eq!(est.eigenvalues.len(), config.eigen_count);

        let grid = linear_grid();
        let (_, used) = analyze_with_grid(Some(&grid), &point, &config);
        assert!(used);
    }
}
