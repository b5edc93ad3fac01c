//! UCR-format dataset reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use warpseek_dtw::TimeSeries;

use crate::IoError;
use crate::domain::{ClassLabel, LabeledDataset, Split};

/// Reads labelled series in the UCR archive format.
///
/// Expected layout:
/// - No header row
/// - `label,v0,v1,...,vn`, one series per line
/// - Every row has the same number of fields
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::Parse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | No rows |
/// | [`IoError::NoValues`] | A row holds only a label |
/// | [`IoError::InconsistentRowLength`] | Row has a different field count than the first row |
/// | [`IoError::NonFiniteValue`] | Value is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Label field is blank |
pub struct UcrReader {
    path: PathBuf,
}

impl UcrReader {
    /// Create a reader for the given file.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Reader for `{base}/{name}/{name}_TRAIN` or `..._TEST`, the layout of
    /// the UCR 2015 archive.
    pub fn from_archive(base: &Path, name: &str, split: Split) -> Self {
        Self::new(&base.join(name).join(format!("{name}_{}", split.suffix())))
    }

    /// Path this reader reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our own InconsistentRowLength check fire instead
        // of a low-level parse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut labels = Vec::new();
        let mut series = Vec::new();
        let mut expected_fields = None;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::Parse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;
            let raw_label = record.get(0).unwrap_or("");

            let expected = *expected_fields.get_or_insert(record.len());
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    label: raw_label.to_string(),
                    expected,
                    got: record.len(),
                });
            }
            if record.len() < 2 {
                return Err(IoError::NoValues {
                    path: self.path.clone(),
                    row_index,
                });
            }

            let label = ClassLabel::parse(raw_label).ok_or_else(|| IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                raw: raw_label.to_string(),
            })?;

            let mut values = Vec::with_capacity(record.len() - 1);
            for (col_index, raw) in record.iter().skip(1).enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }
            // Non-empty and finite were checked above.
            let ts = TimeSeries::new(values).map_err(|_| IoError::NoValues {
                path: self.path.clone(),
                row_index,
            })?;

            labels.push(label);
            series.push(ts);
        }

        if series.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = LabeledDataset { labels, series };
        debug!(n_classes = dataset.class_counts().len(), "class labels parsed");
        info!(
            n_series = dataset.len(),
            length = dataset.series_length(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}
