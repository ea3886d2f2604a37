// Integration tests for foilsim
use foilsim_core::{
    Error, Feature, FeatureScaler, FeatureVector, Geometry, Query, ReferenceRecord, SearchConfig,
    SimilarityEngine, ValidationError, FEATURE_COUNT,
};
use foilsim_storage::{load_engine, save_scaler, save_table, DataFiles};
use std::collections::HashMap;
use std::path::Path;

const ROWS: usize = 40;

fn raw_row(i: usize) -> FeatureVector {
    let reynolds = 1.0e5 * (1 + i % 5) as f64;
    let aoa = -4.0 + (i % 13) as f64;
    let cl = 0.3 + 0.1 * aoa + 0.01 * (i % 3) as f64;
    let cd = 0.008 + 0.0005 * (i % 7) as f64;
    let cm = -0.01 * (i % 4) as f64;
    [reynolds, aoa, cl, cd, cm, cl / cd]
}

fn raw_rows() -> Vec<FeatureVector> {
    (0..ROWS).map(raw_row).collect()
}

fn write_dataset(dir: &Path, table_file: &str) -> (DataFiles, FeatureScaler) {
    let raw = raw_rows();
    let scaler = FeatureScaler::fit_standard(&raw).unwrap();
    let records: Vec<ReferenceRecord> = raw
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let geometry = serde_json::json!([[1.0, 0.0], [0.5, 0.01 * i as f64], [0.0, 0.0]]);
            ReferenceRecord::new(
                format!("foil-{:02}", i),
                scaler.transform(row),
                Geometry::Encoded(geometry.to_string()),
            )
        })
        .collect();

    let files = DataFiles::in_dir(dir).with_table(dir.join(table_file));
    save_table(&files.table, &records).unwrap();
    save_scaler(&files.scaler, &scaler).unwrap();
    (files, scaler)
}

fn engine_with(config: SearchConfig) -> SimilarityEngine {
    let dir = tempfile::tempdir().unwrap();
    let (files, _) = write_dataset(dir.path(), "airfoil_data.json");
    load_engine(&files, config).unwrap()
}

fn engine() -> SimilarityEngine {
    engine_with(SearchConfig::default())
}

const WEIGHTS: FeatureVector = [1.0, 0.5, 3.0, 2.0, 0.25, 1.5];

#[test]
fn test_search_is_deterministic() {
    let engine = engine();
    let query = Query::from_vectors(&[2.5e5, 3.3, 0.62, 0.0093, -0.015, 60.0], &WEIGHTS);
    let first = engine.search(&query, 5).unwrap();
    let second = engine.search(&query, 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_weight_scaling_does_not_change_results() {
    let engine = engine();
    let target = [3.1e5, 1.0, 0.45, 0.0101, -0.02, 44.0];
    let base = engine.search(&Query::from_vectors(&target, &WEIGHTS), 8).unwrap();

    for c in [1.0e-3, 7.5, 1.0e6] {
        let scaled_weights = WEIGHTS.map(|w| w * c);
        let scaled = engine.search(&Query::from_vectors(&target, &scaled_weights), 8).unwrap();
        assert_eq!(base.len(), scaled.len());
        for (a, b) in base.iter().zip(scaled.iter()) {
            assert_eq!(a.airfoil_name, b.airfoil_name);
            assert!((a.distance - b.distance).abs() < 1e-9);
            assert!((a.similarity - b.similarity).abs() < 1e-6);
        }
    }
}

#[test]
fn test_scaler_round_trip_on_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let (files, _) = write_dataset(dir.path(), "airfoil_data.json");
    let scaler = foilsim_storage::load_scaler(&files.scaler).unwrap();

    for raw in raw_rows() {
        let back = scaler.inverse_transform(&[scaler.transform(&raw)]);
        for i in 0..FEATURE_COUNT {
            let tol = 1e-9 * raw[i].abs().max(1.0);
            assert!((back[0][i] - raw[i]).abs() <= tol, "feature {}: {} vs {}", i, back[0][i], raw[i]);
        }
    }
}

#[test]
fn test_exact_match_ranks_first_with_full_similarity() {
    let engine = engine();
    for i in [0, 7, 23, ROWS - 1] {
        let results = engine
            .search(&Query::from_vectors(&raw_row(i), &WEIGHTS), 3)
            .unwrap();
        assert_eq!(results[0].airfoil_name, format!("foil-{:02}", i));
        assert!(results[0].distance < 1e-9);
        assert!((results[0].similarity - 100.0).abs() < 1e-6);
        assert!(results[1].distance > 0.0);
    }
}

#[test]
fn test_similarity_bounded_and_non_increasing() {
    let engine = engine_with(SearchConfig {
        decay_scale: 1.0,
        ..SearchConfig::default()
    });
    let query = Query::from_vectors(&[2.0e5, 0.0, 0.3, 0.009, -0.01, 33.0], &[1.0; FEATURE_COUNT]);
    let results = engine.search(&query, ROWS).unwrap();
    assert_eq!(results.len(), ROWS);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    assert!(results.iter().all(|r| (0.0..=100.0).contains(&r.similarity)));
    // most of the table sits below the calibration percentile
    assert!(results[ROWS / 2].similarity > 1.0);
}

#[test]
fn test_top_k_length_and_order() {
    let engine = engine();
    let query = Query::from_vectors(&[4.0e5, 6.0, 0.9, 0.011, -0.03, 80.0], &WEIGHTS);
    for k in [1, 3, 10, ROWS, ROWS + 5] {
        let results = engine.search(&query, k).unwrap();
        assert_eq!(results.len(), k.min(ROWS));
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}

#[test]
fn test_results_carry_physical_units_and_geometry() {
    let engine = engine();
    let results = engine
        .search(&Query::from_vectors(&raw_row(12), &WEIGHTS), 1)
        .unwrap();
    let hit = &results[0];
    let expected = raw_row(12);
    for feature in Feature::ALL {
        let want = expected[feature.index()];
        assert!((hit.feature(feature) - want).abs() <= 1e-9 * want.abs().max(1.0));
    }
    assert!((hit.geometry[1][1].as_f64().unwrap() - 0.12).abs() < 1e-12);
}

#[test]
fn test_validation_happens_before_search() {
    let engine = engine();
    let full: HashMap<String, f64> = Feature::ALL
        .iter()
        .map(|f| (f.name().to_string(), 1.0))
        .collect();

    let mut targets = full.clone();
    targets.remove("cl_cd_ratio");
    let err = engine.search(&Query::new(targets, full.clone()), 3).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingTarget("cl_cd_ratio"))
    ));

    let zeros: HashMap<String, f64> = full.keys().map(|k| (k.clone(), 0.0)).collect();
    let err = engine.search(&Query::new(full, zeros), 3).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Weights must not all be zero");
}

#[test]
fn test_binary_snapshot_matches_json_table() {
    let dir = tempfile::tempdir().unwrap();
    let (json_files, _) = write_dataset(dir.path(), "airfoil_data.json");
    let (bin_files, _) = write_dataset(dir.path(), "airfoil_data.bin.gz");

    let from_json = load_engine(&json_files, SearchConfig::default()).unwrap();
    let from_bin = load_engine(&bin_files, SearchConfig::default()).unwrap();

    let query = Query::from_vectors(&[1.5e5, -1.0, 0.05, 0.0085, 0.0, 6.0], &WEIGHTS);
    assert_eq!(
        from_json.search(&query, 4).unwrap(),
        from_bin.search(&query, 4).unwrap()
    );
}
