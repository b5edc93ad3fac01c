//! Domain types for warpseek-io.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use warpseek_dtw::TimeSeries;

use crate::IoError;

/// A class label from the first field of a dataset row.
///
/// Numeric labels are normalised so that `1`, `1.0` and `1.0000000e+00`
/// compare equal; anything else is kept verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Normalise a raw label field. Returns `None` for a blank field.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(value) = trimmed.parse::<f64>()
            && value.is_finite()
            && value.fract() == 0.0
            && value.abs() < 1e15
        {
            return Some(Self(format!("{}", value as i64)));
        }
        Some(Self(trimmed.to_string()))
    }

    /// Return the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of an archive dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// The `_TRAIN` file.
    Train,
    /// The `_TEST` file.
    Test,
}

impl Split {
    /// File name suffix used by the UCR archive layout.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Train => "TRAIN",
            Self::Test => "TEST",
        }
    }
}

/// Labelled series read from one dataset file.
///
/// `labels[i]` belongs to `series[i]`; rows keep file order.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    /// Class label of each row.
    pub labels: Vec<ClassLabel>,
    /// Validated series, all of the same length.
    pub series: Vec<TimeSeries>,
}

impl LabeledDataset {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Common series length.
    #[must_use]
    pub fn series_length(&self) -> usize {
        self.series.first().map_or(0, TimeSeries::len)
    }

    /// Rows per class, ordered by label.
    #[must_use]
    pub fn class_counts(&self) -> BTreeMap<&ClassLabel, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_labels_are_normalised() {
        assert_eq!(ClassLabel::parse("1").unwrap().as_str(), "1");
        assert_eq!(ClassLabel::parse(" 1.0000000e+00 ").unwrap().as_str(), "1");
        assert_eq!(ClassLabel::parse("-1.0").unwrap().as_str(), "-1");
        assert_eq!(ClassLabel::parse("2.5").unwrap().as_str(), "2.5");
        assert_eq!(ClassLabel::parse("walk").unwrap().as_str(), "walk");
    }

    #[test]
    fn blank_label_is_rejected() {
        assert!(ClassLabel::parse("").is_none());
        assert!(ClassLabel::parse("   ").is_none());
    }

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("my-experiment_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "my-experiment_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let err = ExperimentName::new(String::new()).unwrap_err();
        assert!(matches!(err, IoError::InvalidExperimentName { .. }));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        for bad in ["has space", "dot.name", "slash/name", "semi;colon"] {
            assert!(ExperimentName::new(bad.to_string()).is_err(), "{bad}");
        }
    }

    #[test]
    fn class_counts_group_by_label() {
        let ds = LabeledDataset {
            labels: ["2", "1", "2"].iter().map(|l| ClassLabel::parse(l).unwrap()).collect(),
            series: (0..3)
                .map(|i| TimeSeries::new(vec![f64::from(i); 4]).unwrap())
                .collect(),
        };
        let counts: Vec<(&str, usize)> =
            ds.class_counts().into_iter().map(|(l, n)| (l.as_str(), n)).collect();
        assert_eq!(counts, vec![("1", 1), ("2", 2)]);
        assert_eq!(ds.series_length(), 4);
    }
}
