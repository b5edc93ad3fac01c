//! JSON result writer for search and classification outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};
use warpseek_index::{BestMatch, CascadeStats, Classification, IndexConfig, KnnResult, SearchStats};

use crate::IoError;
use crate::domain::{ClassLabel, ExperimentName};

/// Writes search and classification results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_knn.json`,
/// `{experiment}_nearest.json` and `{experiment}_classify.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path an artifact with the given kind would be written to.
    #[must_use]
    pub fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    /// Write a top-K search result to `{experiment}_knn.json`.
    ///
    /// `train_labels` supplies the label of each neighbour.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all, fields(query = query_index, k = k))]
    pub fn write_knn(
        &self,
        config: &IndexConfig,
        query_index: usize,
        k: usize,
        result: &KnnResult,
        train_labels: &[ClassLabel],
    ) -> Result<PathBuf, IoError> {
        let neighbors = result
            .neighbors
            .iter()
            .enumerate()
            .map(|(rank, n)| NeighborEntry {
                rank: rank + 1,
                index: n.index,
                label: train_labels.get(n.index),
                bound: n.bound,
            })
            .collect();

        let artifact = KnnArtifact {
            experiment: self.experiment.as_str(),
            params: Params::from(config),
            query_index,
            k,
            neighbors,
            stats: result.stats,
        };
        self.write_json("knn", &artifact)
    }

    /// Write an exact nearest-neighbour result to `{experiment}_nearest.json`.
    ///
    /// `verified` records the outcome of a brute-force cross-check, if one ran.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all, fields(query = query_index))]
    pub fn write_nearest(
        &self,
        config: &IndexConfig,
        query_index: usize,
        result: &BestMatch,
        train_labels: &[ClassLabel],
        verified: Option<bool>,
    ) -> Result<PathBuf, IoError> {
        let artifact = NearestArtifact {
            experiment: self.experiment.as_str(),
            params: Params::from(config),
            query_index,
            index: result.index,
            label: result.index.and_then(|i| train_labels.get(i)),
            distance: finite(result.distance.value()),
            verified,
            stats: result.stats,
        };
        self.write_json("nearest", &artifact)
    }

    /// Write a 1-NN classification result to `{experiment}_classify.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all, fields(n_test = test_labels.len()))]
    pub fn write_classify(
        &self,
        config: &IndexConfig,
        n_train: usize,
        result: &Classification<ClassLabel>,
        test_labels: &[ClassLabel],
    ) -> Result<PathBuf, IoError> {
        let predictions = result
            .predictions
            .iter()
            .zip(&result.matches)
            .zip(test_labels)
            .enumerate()
            .map(|(test_index, ((predicted, m), actual))| PredictionEntry {
                test_index,
                actual,
                predicted: predicted.as_ref(),
                nearest_index: m.index,
                distance: finite(m.distance.value()),
            })
            .collect();

        let artifact = ClassifyArtifact {
            experiment: self.experiment.as_str(),
            params: Params::from(config),
            n_train,
            n_test: test_labels.len(),
            n_correct: result.n_correct,
            error_rate: result.error_rate,
            stats: result.stats,
            predictions,
        };
        self.write_json("classify", &artifact)
    }

    fn write_json<T: Serialize>(&self, kind: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(kind);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), "{kind} result written");
        Ok(path)
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct Params {
    window_size: usize,
    num_segments: usize,
    min_leaf_size: usize,
}

impl From<&IndexConfig> for Params {
    fn from(config: &IndexConfig) -> Self {
        Self {
            window_size: config.window_size(),
            num_segments: config.num_segments(),
            min_leaf_size: config.min_leaf_size(),
        }
    }
}

#[derive(Serialize)]
struct KnnArtifact<'a> {
    experiment: &'a str,
    params: Params,
    query_index: usize,
    k: usize,
    neighbors: Vec<NeighborEntry<'a>>,
    stats: SearchStats,
}

#[derive(Serialize)]
struct NeighborEntry<'a> {
    rank: usize,
    index: usize,
    label: Option<&'a ClassLabel>,
    bound: f64,
}

#[derive(Serialize)]
struct NearestArtifact<'a> {
    experiment: &'a str,
    params: Params,
    query_index: usize,
    index: Option<usize>,
    label: Option<&'a ClassLabel>,
    distance: Option<f64>,
    verified: Option<bool>,
    stats: CascadeStats,
}

#[derive(Serialize)]
struct ClassifyArtifact<'a> {
    experiment: &'a str,
    params: Params,
    n_train: usize,
    n_test: usize,
    n_correct: usize,
    error_rate: f64,
    stats: CascadeStats,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    test_index: usize,
    actual: &'a ClassLabel,
    predicted: Option<&'a ClassLabel>,
    nearest_index: Option<usize>,
    distance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use warpseek_dtw::TimeSeries;
    use warpseek_index::{classify_1nn, find_best_match};

    fn labels(raw: &[&str]) -> Vec<ClassLabel> {
        raw.iter().map(|l| ClassLabel::parse(l).unwrap()).collect()
    }

    fn series() -> Vec<TimeSeries> {
        vec![
            TimeSeries::new(vec![0.0, 0.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.1, 0.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![5.0, 5.0, 5.0, 5.0]).unwrap(),
            TimeSeries::new(vec![5.1, 5.0, 5.0, 5.0]).unwrap(),
        ]
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn write_knn_json_structure() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("run".into()).unwrap()).unwrap();
        let config = IndexConfig::new(1, 2).unwrap();
        let db = series();
        let tree = config.build_tree(&db).unwrap();
        let result = tree.search_series(&db[2], 2).unwrap();

        let path = writer
            .write_knn(&config, 2, 2, &result, &labels(&["a", "a", "b", "b"]))
            .unwrap();
        assert_eq!(path, dir.path().join("run_knn.json"));

        let content = read_json(&path);
        assert_eq!(content["experiment"], "run");
        assert_eq!(content["params"]["window_size"], 1);
        assert_eq!(content["params"]["num_segments"], 2);
        assert_eq!(content["k"], 2);
        let neighbors = content["neighbors"].as_array().unwrap();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0]["rank"], 1);
        assert_eq!(neighbors[0]["index"], 2);
        assert_eq!(neighbors[0]["label"], "b");
        assert!(content["stats"]["frontier_pops"].is_number());
    }

    #[test]
    fn write_nearest_json_structure() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("nn".into()).unwrap()).unwrap();
        let config = IndexConfig::new(1, 2).unwrap();
        let query = config.represent(series()[3].clone()).unwrap();
        let best = find_best_match(&query, &series()[..3]).unwrap();

        let path = writer
            .write_nearest(&config, 3, &best, &labels(&["a", "a", "b"]), Some(true))
            .unwrap();
        let content = read_json(&path);
        assert_eq!(content["index"], 2);
        assert_eq!(content["label"], "b");
        assert!((content["distance"].as_f64().unwrap() - 0.1).abs() < 1e-9);
        assert_eq!(content["verified"], true);
        assert!(content["stats"]["candidates"].is_number());
    }

    #[test]
    fn empty_match_writes_nulls() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("none".into()).unwrap()).unwrap();
        let config = IndexConfig::new(1, 2).unwrap();
        let query = config.represent(series()[0].clone()).unwrap();
        let best = find_best_match(&query, &[]).unwrap();

        let content = read_json(&writer.write_nearest(&config, 0, &best, &[], None).unwrap());
        assert!(content["index"].is_null());
        assert!(content["distance"].is_null());
        assert!(content["verified"].is_null());
    }

    #[test]
    fn write_classify_json_structure() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("cls".into()).unwrap()).unwrap();
        let config = IndexConfig::new(1, 2).unwrap();
        let db = series();
        let train_labels = labels(&["a", "a", "b", "b"]);
        let result = classify_1nn(&train_labels, &db, &train_labels, &db, &config).unwrap();

        let path = writer.write_classify(&config, db.len(), &result, &train_labels).unwrap();
        let content = read_json(&path);
        assert_eq!(content["n_train"], 4);
        assert_eq!(content["n_test"], 4);
        assert_eq!(content["n_correct"], 4);
        assert_eq!(content["error_rate"], 0.0);
        let predictions = content["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 4);
        assert_eq!(predictions[3]["actual"], "b");
        assert_eq!(predictions[3]["predicted"], "b");
        assert_eq!(predictions[3]["nearest_index"], 3);
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = ResultWriter::new(&nested, ExperimentName::new("x".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.artifact_path("knn"), nested.join("x_knn.json"));
    }
}
