//! 1-NN classification on top of the cascading search.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument};
use warpseek_dtw::TimeSeries;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::nearest::{BestMatch, CascadeStats, find_best_match_prepared};
use crate::representation::Representation;

/// Outcome of classifying a labelled test set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification<L> {
    /// Label of each test series' nearest training series, in test order.
    /// `None` only when the training set is empty.
    pub predictions: Vec<Option<L>>,
    /// Per-query nearest-neighbour index and distance.
    pub matches: Vec<BestMatch>,
    /// Predictions equal to the true label.
    pub n_correct: usize,
    /// `1 - n_correct / n_test`; zero for an empty test set.
    pub error_rate: f64,
    /// Cascade counters summed over every query.
    pub stats: CascadeStats,
}

/// Label every test series with the label of its DTW nearest neighbour.
///
/// Training series are wrapped once and shared by all queries; queries run on
/// the rayon pool and results keep test order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IndexError::DimensionMismatch`] | label and series counts differ, or series lengths differ |
/// | [`IndexError::InvalidConfig`] | `config` has more segments than the series length |
#[instrument(skip_all, fields(n_train = train.len(), n_test = test.len()))]
pub fn classify_1nn<L>(
    train_labels: &[L],
    train: &[TimeSeries],
    test_labels: &[L],
    test: &[TimeSeries],
    config: &IndexConfig,
) -> Result<Classification<L>, IndexError>
where
    L: Clone + PartialEq + Send + Sync,
{
    IndexError::check_dims("training label count", train.len(), train_labels.len())?;
    IndexError::check_dims("test label count", test.len(), test_labels.len())?;

    let prepared = train
        .par_iter()
        .map(|s| config.represent(s.clone()))
        .collect::<Result<Vec<Representation>, _>>()?;

    let matches = test
        .par_iter()
        .map(|s| {
            let query = config.represent(s.clone())?;
            find_best_match_prepared(&query, &prepared)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let predictions: Vec<Option<L>> = matches
        .iter()
        .map(|m| m.index.map(|i| train_labels[i].clone()))
        .collect();
    let n_correct = predictions
        .iter()
        .zip(test_labels)
        .filter(|(p, truth)| p.as_ref() == Some(*truth))
        .count();
    let error_rate = if test.is_empty() {
        0.0
    } else {
        1.0 - n_correct as f64 / test.len() as f64
    };
    let mut stats = CascadeStats::default();
    for m in &matches {
        stats.merge(&m.stats);
    }

    info!(
        n_correct,
        error_rate,
        pruned = stats.pruned_by_keogh,
        dtw = stats.dtw_computed,
        "classification complete"
    );
    Ok(Classification {
        predictions,
        matches,
        n_correct,
        error_rate,
        stats,
    })
}
