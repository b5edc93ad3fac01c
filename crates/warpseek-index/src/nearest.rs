//! 1-NN search by linear scan with LB_Keogh pruning.
//!
//! Every candidate is first compared against the best distance so far with
//! [`envelope_bound`]. Survivors are scored with DTW that abandons as soon as
//! it cannot beat the current best.
//!
//! [`find_best_match`] scores with unconstrained DTW. LB_Keogh of a windowed
//! envelope can exceed unconstrained DTW, so a pruned candidate may on rare
//! occasions have been closer than the reported winner.
//! [`find_best_match_banded`] restricts DTW to a Sakoe-Chiba band whose radius
//! equals the envelope window. There the bound is admissible and the result is
//! identical to [`brute_force_best_match_banded`].

use serde::Serialize;
use tracing::{debug, instrument};
use warpseek_dtw::{BandConstraint, Dtw, DtwDistance, TimeSeries};

use crate::bounds::envelope_bound;
use crate::error::IndexError;
use crate::representation::Representation;

/// Work counters for one cascading scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeStats {
    /// Candidates examined.
    pub candidates: usize,
    /// Candidates rejected by the envelope bound alone.
    pub pruned_by_keogh: usize,
    /// DTW computations abandoned above the running best.
    pub abandoned: usize,
    /// DTW computations run to completion.
    pub dtw_computed: usize,
}

impl CascadeStats {
    /// Add another scan's counters to these.
    pub fn merge(&mut self, other: &Self) {
        self.candidates += other.candidates;
        self.pruned_by_keogh += other.pruned_by_keogh;
        self.abandoned += other.abandoned;
        self.dtw_computed += other.dtw_computed;
    }
}

/// The closest database series found by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestMatch {
    /// Input position of the winner; `None` for an empty database.
    pub index: Option<usize>,
    /// Its DTW distance, infinite when nothing matched.
    pub distance: DtwDistance,
    /// Work done by the scan.
    pub stats: CascadeStats,
}

impl BestMatch {
    fn none() -> Self {
        Self {
            index: None,
            distance: DtwDistance::INFINITY,
            stats: CascadeStats::default(),
        }
    }
}

/// Running state of one scan.
struct Cascade<'q> {
    query: &'q Representation,
    dtw: Dtw,
    best: BestMatch,
}

impl<'q> Cascade<'q> {
    fn new(query: &'q Representation, dtw: Dtw) -> Self {
        Self {
            query,
            dtw,
            best: BestMatch::none(),
        }
    }

    fn consider(&mut self, index: usize, candidate: &Representation) -> Result<(), IndexError> {
        self.best.stats.candidates += 1;
        let best = self.best.distance.value();

        if envelope_bound(self.query, candidate)? >= best {
            self.best.stats.pruned_by_keogh += 1;
            return Ok(());
        }

        let distance = self.dtw.distance_with_cutoff(
            self.query.series().as_view(),
            candidate.series().as_view(),
            best,
        );
        if !distance.is_finite() {
            self.best.stats.abandoned += 1;
            return Ok(());
        }
        self.best.stats.dtw_computed += 1;
        if distance.value() < best {
            self.best.index = Some(index);
            self.best.distance = distance;
        }
        Ok(())
    }

    fn finish(self) -> BestMatch {
        debug!(
            index = ?self.best.index,
            distance = %self.best.distance,
            pruned = self.best.stats.pruned_by_keogh,
            abandoned = self.best.stats.abandoned,
            "cascade finished"
        );
        self.best
    }
}

/// Sakoe-Chiba DTW with the query's envelope window as radius.
fn banded(query: &Representation) -> Dtw {
    Dtw::new(BandConstraint::from_window(query.window_size()))
}

fn scan(
    query: &Representation,
    database: &[TimeSeries],
    dtw: Dtw,
) -> Result<BestMatch, IndexError> {
    let mut cascade = Cascade::new(query, dtw);
    for (index, series) in database.iter().enumerate() {
        IndexError::check_dims("series length", query.len(), series.len())?;
        let candidate =
            Representation::build(series.clone(), query.window_size(), query.num_segments())?;
        cascade.consider(index, &candidate)?;
    }
    Ok(cascade.finish())
}

/// Scan `database` for the series closest to `query` under unconstrained DTW.
///
/// Each candidate is wrapped with the query's window and segment count before
/// its envelope bound is taken. Ties keep the earliest candidate.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if a candidate's length differs from the query's.
#[instrument(skip_all, fields(n = database.len(), len = query.len()))]
pub fn find_best_match(
    query: &Representation,
    database: &[TimeSeries],
) -> Result<BestMatch, IndexError> {
    scan(query, database, Dtw::unconstrained())
}

/// [`find_best_match`] with DTW limited to a band of radius `window_size`.
///
/// Pruning never discards the true winner, so the answer always equals
/// [`brute_force_best_match_banded`].
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if a candidate's length differs from the query's.
#[instrument(skip_all, fields(n = database.len(), len = query.len(), radius = query.window_size()))]
pub fn find_best_match_banded(
    query: &Representation,
    database: &[TimeSeries],
) -> Result<BestMatch, IndexError> {
    scan(query, database, banded(query))
}

/// [`find_best_match`] over candidates that are already wrapped.
///
/// Lets a caller answer many queries without rebuilding candidate envelopes.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IndexError::DimensionMismatch`] | a candidate differs from the query in length or envelope window |
pub fn find_best_match_prepared(
    query: &Representation,
    candidates: &[Representation],
) -> Result<BestMatch, IndexError> {
    let mut cascade = Cascade::new(query, Dtw::unconstrained());
    for (index, candidate) in candidates.iter().enumerate() {
        IndexError::check_dims("envelope window", query.window_size(), candidate.window_size())?;
        cascade.consider(index, candidate)?;
    }
    Ok(cascade.finish())
}

fn exhaustive(
    query: &Representation,
    database: &[TimeSeries],
    dtw: Dtw,
) -> Result<BestMatch, IndexError> {
    let mut best = BestMatch::none();
    for (index, series) in database.iter().enumerate() {
        IndexError::check_dims("series length", query.len(), series.len())?;
        best.stats.candidates += 1;
        best.stats.dtw_computed += 1;
        let distance = dtw.distance(query.series().as_view(), series.as_view());
        if distance.value() < best.distance.value() {
            best.index = Some(index);
            best.distance = distance;
        }
    }
    Ok(best)
}

/// Full unconstrained DTW against every candidate, without any pruning.
///
/// Same tie rule as [`find_best_match`]; the reported distance is the true
/// minimum over the database.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if a candidate's length differs from the query's.
#[instrument(skip_all, fields(n = database.len(), len = query.len()))]
pub fn brute_force_best_match(
    query: &Representation,
    database: &[TimeSeries],
) -> Result<BestMatch, IndexError> {
    exhaustive(query, database, Dtw::unconstrained())
}

/// Full banded DTW against every candidate, the reference for
/// [`find_best_match_banded`].
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if a candidate's length differs from the query's.
#[instrument(skip_all, fields(n = database.len(), len = query.len(), radius = query.window_size()))]
pub fn brute_force_best_match_banded(
    query: &Representation,
    database: &[TimeSeries],
) -> Result<BestMatch, IndexError> {
    exhaustive(query, database, banded(query))
}
