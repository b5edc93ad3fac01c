//! I/O error types for warpseek-io.

use std::path::PathBuf;

/// Errors from reading datasets and writing result artifacts.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("parse error in {path} at byte offset {offset}")]
    Parse {
        /// Path to the dataset file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the file holds no rows.
    #[error("empty dataset (no rows) in {path}")]
    EmptyDataset {
        /// Path to the dataset file.
        path: PathBuf,
    },

    /// Returned when a row has a label but no values.
    #[error("row {row_index} in {path} has a label but no values")]
    NoValues {
        /// Path to the dataset file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
    },

    /// Returned when a row has a different number of fields than the first row.
    #[error("inconsistent row length in {path}: row {row_index} (label {label}) has {got} fields, expected {expected}")]
    InconsistentRowLength {
        /// Path to the dataset file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Raw label field of the offending row.
        label: String,
        /// Field count of the first row.
        expected: usize,
        /// Field count of this row.
        got: usize,
    },

    /// Returned when a value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the dataset file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based value index (excluding the label field).
        col_index: usize,
        /// The raw field that failed to parse.
        raw: String,
    },

    /// Returned when the label field is blank.
    #[error("invalid class label in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidLabel {
        /// Path to the dataset file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// The raw label field.
        raw: String,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be encoded as JSON.
    #[error("cannot serialize artifact for {path}")]
    Serialize {
        /// Destination path of the artifact.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}
