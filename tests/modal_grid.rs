use membrane_modal_grid::analytic::bessel_eigenvalues;
use membrane_modal_grid::assembly::assemble_operators;
use membrane_modal_grid::flutter::{flutter_margin, lowest_positive_eigenvalue};
use membrane_modal_grid::solver::{approximate_modes, pad_eigenvalues, solve_dense, solve_modes};
use membrane_modal_grid::types::{round_decimals, MARGIN_DECIMALS, UNFORCED_MARGIN};
use membrane_modal_grid::{
    analyze_point, regularize_mass, EigenSolver, ModalConfig, ParameterPoint, RadialMesh,
    SolveOutcome, Stability,
};

/// Absolute slack for values rounded to 6 decimals.
const ROUNDING_TOL: f64 = 2e-6;

fn reference_point() -> ParameterPoint {
    ParameterPoint::new(500.0, 1.0, 0.2, 0.04)
}

#[test]
fn reference_point_end_to_end() {
    let config = ModalConfig::default();
    let result = analyze_point(&reference_point(), &config).unwrap();

    assert_eq!(result.eigenvalues.len(), 20);
    assert!(!result.approximated);
    for window in result.eigenvalues.windows(2) {
        assert!(window[0] <= window[1], "eigenvalues not ascending: {window:?}");
    }
    assert!(result.eigenvalues.iter().all(|&l| l >= 0.0 && l.is_finite()));

    let point = reference_point();
    let mesh = RadialMesh::uniform(point.diameter, config.element_count);
    let ops = assemble_operators(&point, &mesh);
    let m_reg = regularize_mass(&ops.mass);
    let raw = solve_modes(&point, &mesh, &ops.total_stiffness(), &m_reg, &config);
    let padded = pad_eigenvalues(raw.into_eigenvalues(), config.eigen_count);
    let expected = round_decimals(
        flutter_margin(&padded, 0.04, config.reference_damping, config.srp_force),
        MARGIN_DECIMALS,
    );
    assert_eq!(result.flutter_margin, expected);

    let lambda = lowest_positive_eigenvalue(&padded).unwrap();
    let formula = 0.03 * 2.0 * 0.04 * lambda.sqrt() / config.srp_force;
    assert!(
        (result.flutter_margin - formula).abs() <= 5e-5,
        "margin {} vs formula {formula}",
        result.flutter_margin
    );
    assert_eq!(result.stability, Stability::from_margin(result.flutter_margin));
}

#[test]
fn sparse_and_dense_backends_agree() {
    let dense = analyze_point(
        &reference_point(),
        &ModalConfig::default().with_solver(EigenSolver::Dense),
    )
    .unwrap();
    let sparse = analyze_point(
        &reference_point(),
        &ModalConfig::default().with_solver(EigenSolver::Sparse),
    )
    .unwrap();

    assert!(!sparse.approximated);
    for (d, s) in dense.eigenvalues.iter().zip(&sparse.eigenvalues) {
        let tol = ROUNDING_TOL.max(1e-6 * d.abs());
        assert!((d - s).abs() <= tol, "dense {d} vs sparse {s}");
    }
    assert_eq!(dense.stability, sparse.stability);
}

#[test]
fn spin_does_not_lower_the_fundamental() {
    let config = ModalConfig::default();
    let lowest: Vec<(f64, f64)> = [0.0, 0.25, 0.5]
        .iter()
        .map(|&rpm| {
            let point = ParameterPoint::new(500.0, 1.0, rpm, 0.04);
            let mesh = RadialMesh::uniform(point.diameter, config.element_count);
            let ops = assemble_operators(&point, &mesh);
            let m_reg = regularize_mass(&ops.mass);
            let unclamped = solve_dense(&ops.total_stiffness(), &m_reg, config.eigen_count).unwrap();

            let result = analyze_point(&point, &config).unwrap();
            assert!(!result.approximated);
            let positive = lowest_positive_eigenvalue(&result.eigenvalues).unwrap();
            (unclamped[0], positive)
        })
        .collect();

    // the unclamped fundamental is negative here and must still rise with spin
    assert!(lowest[0].0 < 0.0, "{lowest:?}");
    for pair in lowest.windows(2) {
        assert!(pair[1].0 >= pair[0].0, "{pair:?}");
        assert!(pair[1].1 > pair[0].1, "{pair:?}");
    }
}

#[test]
fn coarse_mesh_is_padded_geometrically() {
    let config = ModalConfig::default().with_element_count(5).with_eigen_count(20);
    let point = ParameterPoint::new(1.0, 1.0, 0.0, 0.04);
    let result = analyze_point(&point, &config).unwrap();

    assert_eq!(result.eigenvalues.len(), 20);
    assert!(!result.approximated);
    // n - 2 = 3 solved modes, the rest padded
    assert!(result.eigenvalues[2] > 0.0);
    for i in 2..19 {
        let expected = 1.2 * result.eigenvalues[i];
        assert!(
            (result.eigenvalues[i + 1] - expected).abs() < 1e-5,
            "step {i}: {} vs {expected}",
            result.eigenvalues[i + 1]
        );
    }
}

#[test]
fn vanishing_density_is_regularized() {
    let point = ParameterPoint::new(0.1, 1.0, 0.0, f64::from_bits(1));
    let mesh = RadialMesh::uniform(point.diameter, 50);
    let ops = assemble_operators(&point, &mesh);
    assert!(ops.mass.diag.iter().all(|&m| m == 0.0));

    let m_reg = regularize_mass(&ops.mass);
    assert!(m_reg.diag.iter().all(|&m| m > 0.0));

    let result = analyze_point(&point, &ModalConfig::default()).unwrap();
    assert_eq!(result.eigenvalues.len(), 20);
    assert!(result.eigenvalues.iter().all(|&l| l >= 0.0));
    assert!(result.flutter_margin >= 0.0);
    assert_eq!(result.stability, Stability::Flutter);
}

#[test]
fn unforced_membrane_reports_fixed_margin() {
    let config = ModalConfig::default().with_srp_force(0.0);
    let result = analyze_point(&reference_point(), &config).unwrap();
    assert_eq!(result.flutter_margin, UNFORCED_MARGIN);
    assert_eq!(result.stability, Stability::Stable);

    let config = ModalConfig::default().with_srp_force(-1.0e-5);
    let result = analyze_point(&reference_point(), &config).unwrap();
    assert_eq!(result.flutter_margin, UNFORCED_MARGIN);
}

#[test]
fn stability_thresholds() {
    assert_eq!(Stability::from_margin(2.0), Stability::Stable);
    assert_eq!(Stability::from_margin(1.9999), Stability::Marginal);
    assert_eq!(Stability::from_margin(1.0), Stability::Marginal);
    assert_eq!(Stability::from_margin(0.9999), Stability::Flutter);
}

#[test]
fn failed_eigensolve_falls_back_reproducibly() {
    let point = reference_point();
    let config = ModalConfig::default();
    let mesh = RadialMesh::uniform(point.diameter, config.element_count);
    let ops = assemble_operators(&point, &mesh);
    let mut k_total = ops.total_stiffness();
    k_total.diag[10] = f64::NAN;
    let m_reg = regularize_mass(&ops.mass);

    let first = solve_modes(&point, &mesh, &k_total, &m_reg, &config);
    let second = solve_modes(&point, &mesh, &k_total, &m_reg, &config);
    assert!(first.is_approximated());
    assert_eq!(first, second);
    assert_eq!(first, approximate_modes(&point, &config));

    let SolveOutcome::Approximated(eigs) = first else {
        panic!("expected the closed-form fallback");
    };
    let expected = bessel_eigenvalues(&point, 20);
    for (a, b) in eigs.iter().zip(&expected) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn invalid_configuration_is_rejected() {
    let point = reference_point();
    assert!(analyze_point(&point, &ModalConfig::default().with_element_count(2)).is_err());
    assert!(analyze_point(&point, &ModalConfig::default().with_eigen_count(0)).is_err());
    assert!(analyze_point(&ParameterPoint::new(500.0, 0.0, 0.2, 0.04), &ModalConfig::default()).is_err());
    assert!(analyze_point(&ParameterPoint::new(500.0, 1.0, -0.1, 0.04), &ModalConfig::default()).is_err());
}
