//! End-to-end integration tests: UCR files -> search/classify -> JSON -> deserialize.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use warpseek_index::{
    IndexConfig, brute_force_best_match, brute_force_best_match_banded, classify_1nn,
    find_best_match, find_best_match_banded,
};
use warpseek_io::{ExperimentName, IoError, LabeledDataset, ResultWriter, Split, UcrReader};

/// Path to the test fixture directory.
fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn synthetic(split: Split) -> LabeledDataset {
    UcrReader::from_archive(&fixtures(), "Synthetic", split)
        .read()
        .expect("fixture should parse")
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn archive_fixture_loads() {
    let train = synthetic(Split::Train);
    let test = synthetic(Split::Test);
    assert_eq!(train.len(), 9);
    assert_eq!(test.len(), 6);
    assert_eq!(train.series_length(), 12);
    assert_eq!(test.series_length(), 12);
    assert_eq!(train.class_counts().len(), 3);
    // "2.0000000e+00" in the test file normalises to the training label "2".
    assert_eq!(test.labels[2], train.labels[3]);
}

#[test]
fn classify_round_trip() {
    let train = synthetic(Split::Train);
    let test = synthetic(Split::Test);
    let config = IndexConfig::new(2, 4).unwrap();

    let result = classify_1nn(&train.labels, &train.series, &test.labels, &test.series, &config).unwrap();
    // Classes sit around 0, 5 and 10, far apart relative to their wiggle.
    assert_eq!(result.n_correct, 6);
    assert_eq!(result.error_rate, 0.0);

    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("synthetic_1nn".into()).unwrap()).unwrap();
    let path = writer.write_classify(&config, train.len(), &result, &test.labels).unwrap();
    assert_eq!(path, dir.path().join("synthetic_1nn_classify.json"));

    let content = read_json(&path);
    assert_eq!(content["experiment"], "synthetic_1nn");
    assert_eq!(content["n_train"], 9);
    assert_eq!(content["n_test"], 6);
    assert_eq!(content["params"]["window_size"], 2);
    let predictions = content["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 6);
    for p in predictions {
        assert_eq!(p["actual"], p["predicted"]);
        assert!(p["distance"].as_f64().unwrap() >= 0.0);
    }
    assert_eq!(content["stats"]["candidates"], 54);
}

#[test]
fn nearest_round_trip_with_verification() {
    let train = synthetic(Split::Train);
    let test = synthetic(Split::Test);
    let config = IndexConfig::new(3, 4).unwrap();

    let query = config.represent(test.series[4].clone()).unwrap();
    let unbanded = find_best_match(&query, &train.series).unwrap();
    let unbanded_reference = brute_force_best_match(&query, &train.series).unwrap();
    assert_eq!(train.labels[unbanded.index.unwrap()].as_str(), "3");
    assert_eq!(train.labels[unbanded_reference.index.unwrap()].as_str(), "3");

    let best = find_best_match_banded(&query, &train.series).unwrap();
    let reference = brute_force_best_match_banded(&query, &train.series).unwrap();
    assert_eq!(best.index, reference.index);
    let winner = best.index.unwrap();
    assert_eq!(train.labels[winner].as_str(), "3");

    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("nn".into()).unwrap()).unwrap();
    let path = writer
        .write_nearest(&config, 4, &best, &train.labels, Some(best.index == reference.index))
        .unwrap();

    let content = read_json(&path);
    assert_eq!(content["query_index"], 4);
    assert_eq!(content["index"].as_u64().unwrap() as usize, winner);
    assert_eq!(content["label"], "3");
    assert_eq!(content["verified"], true);
}

#[test]
fn knn_round_trip() {
    let train = synthetic(Split::Train);
    let test = synthetic(Split::Test);
    let config = IndexConfig::new(2, 4).unwrap().with_min_leaf_size(2);
    let tree = config.build_tree(&train.series).unwrap();
    let result = tree.search_series(&test.series[0], 3).unwrap();
    assert_eq!(result.len(), 3);

    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("knn-run".into()).unwrap()).unwrap();
    let path = writer.write_knn(&config, 0, 3, &result, &train.labels).unwrap();

    let content = read_json(&path);
    assert_eq!(content["k"], 3);
    assert_eq!(content["params"]["min_leaf_size"], 2);
    let neighbors = content["neighbors"].as_array().unwrap();
    assert_eq!(neighbors.len(), 3);
    let ranks: Vec<u64> = neighbors.iter().map(|n| n["rank"].as_u64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    // The three class-1 training series are the only ones near zero.
    for n in neighbors {
        assert_eq!(n["label"], "1");
    }
}

#[test]
fn reader_fixture_files_match_expected_errors() {
    let read = |name: &str| UcrReader::new(&fixtures().join(name)).read();

    assert!(matches!(read("empty.csv"), Err(IoError::EmptyDataset { .. })));
    assert!(matches!(
        read("jagged.csv"),
        Err(IoError::InconsistentRowLength { row_index: 1, expected: 4, got: 3, .. })
    ));
    assert!(matches!(
        read("nan.csv"),
        Err(IoError::NonFiniteValue { col_index: 1, .. })
    ));
    assert!(matches!(
        read("inf.csv"),
        Err(IoError::NonFiniteValue { col_index: 0, .. })
    ));
    assert!(matches!(
        read("blank_label.csv"),
        Err(IoError::InvalidLabel { row_index: 1, .. })
    ));
    assert!(matches!(
        read("does_not_exist.csv"),
        Err(IoError::FileNotFound { .. })
    ));
}

#[test]
fn mismatched_lengths_surface_as_index_errors() {
    let train = synthetic(Split::Train);
    let short = UcrReader::new(&fixtures().join("short_test.csv")).read().unwrap();
    let config = IndexConfig::new(1, 2).unwrap();
    let query = config.represent(short.series[0].clone()).unwrap();
    assert!(find_best_match(&query, &train.series).is_err());
}
