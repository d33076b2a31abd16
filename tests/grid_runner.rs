use membrane_modal_grid::{
    analyze_point, analyze_with_grid, run_grid, GridAxes, ModalConfig, ModalGrid, RunConfig,
};

fn small_config() -> ModalConfig {
    ModalConfig::default().with_element_count(16).with_eigen_count(6)
}

fn small_axes() -> GridAxes {
    GridAxes {
        diameters: vec![100.0, 500.0],
        tensions: vec![0.1, 1.0],
        spin_rates: vec![0.0, 0.2, 0.5],
        areal_densities: vec![0.035, 0.05],
    }
}

#[test]
fn every_point_is_recorded_in_order() {
    let axes = small_axes();
    let config = small_config();
    let outcome = run_grid(&axes, &config).unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.grid.grid, axes);
    assert_eq!(outcome.grid.points.len(), 24);

    let mut expected = Vec::new();
    for d in 0..2 {
        for t in 0..2 {
            for s in 0..3 {
                for a in 0..2 {
                    expected.push([d, t, s, a]);
                }
            }
        }
    }
    let actual: Vec<[usize; 4]> = outcome.grid.points.iter().map(|p| p.indices()).collect();
    assert_eq!(actual, expected);

    for record in &outcome.grid.points {
        assert_eq!(record.result.eigenvalues.len(), 6);
        let point = outcome
            .grid
            .point_at(record.d, record.t, record.s, record.a)
            .unwrap();
        let direct = analyze_point(&point, &config).unwrap();
        assert_eq!(direct, record.result, "record {:?} differs", record.indices());
    }
}

#[test]
fn table_round_trips_through_a_file() {
    let outcome = run_grid(&small_axes(), &small_config()).unwrap();
    let dir = std::env::temp_dir().join(format!("modal-grid-test-{}", std::process::id()));
    let path = dir.join("nested").join("modal-grid.json");

    outcome.grid.write_json(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains('\n'));
    assert!(!text.contains(": "));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let grid = value["grid"].as_object().unwrap();
    let mut keys: Vec<&str> = grid.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["arealDensities", "diameters", "spinRates", "tensions"]);

    let first = value["points"][0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["a", "d", "eigenvalues", "flutterMargin", "s", "stability", "t"]
    );
    let label = first["stability"].as_str().unwrap();
    assert!(["stable", "marginal", "flutter"].contains(&label));

    let loaded = ModalGrid::read_json(&path).unwrap();
    assert_eq!(loaded.points.len(), outcome.grid.points.len());
    assert_eq!(loaded.grid, outcome.grid.grid);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn interpolation_hits_grid_nodes() {
    let config = small_config();
    let outcome = run_grid(&small_axes(), &config).unwrap();
    let grid = &outcome.grid;

    for record in grid.points.iter().step_by(5) {
        let point = grid.point_at(record.d, record.t, record.s, record.a).unwrap();
        let (estimate, used) = analyze_with_grid(Some(grid), &point, &config);
        assert!(used);
        assert!((estimate.flutter_margin - record.result.flutter_margin).abs() < 1e-9);
        for (e, r) in estimate.eigenvalues.iter().zip(&record.result.eigenvalues) {
            assert!((e - r).abs() <= 1e-9 * r.abs().max(1.0), "{e} vs {r}");
        }
    }
}

#[test]
fn partial_run_config_takes_defaults() {
    let config = RunConfig::from_json_str(r#"{"modal":{"elementCount":12}}"#).unwrap();
    assert_eq!(config.axes, GridAxes::reference());
    assert_eq!(config.axes.num_points(), 1000);
    assert_eq!(config.modal.element_count, 12);
    assert_eq!(config.modal.eigen_count, 20);

    let config = RunConfig::from_json_str(
        r#"{"axes":{"diameters":[200.0],"tensions":[1.0],"spinRates":[0.0],"arealDensities":[0.04]}}"#,
    )
    .unwrap();
    assert_eq!(config.axes.shape(), [1, 1, 1, 1]);
    assert_eq!(config.modal, ModalConfig::default());

    assert!(RunConfig::from_json_str(r#"{"modal":{"elementCount":2}}"#).is_err());
    assert!(RunConfig::from_json_str(r#"{"axes":{"diameters":[]}}"#).is_err());
}
