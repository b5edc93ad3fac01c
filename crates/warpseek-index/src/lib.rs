//! Lower-bound-pruned similarity search over equal-length time series.
//!
//! Two search modes share one set of per-series summaries
//! ([`Representation`]):
//!
//! - [`MbrTree::search`]: best-first traversal of a binary MBR tree over PAA
//!   vectors, returning the `k` series with the smallest PAA lower bound.
//!   DTW is never computed, so the set is approximate.
//! - [`find_best_match`]: 1-NN under unconstrained DTW, pruned with LB_Keogh
//!   and early abandoning. [`find_best_match_banded`] runs the same scan with
//!   a Sakoe-Chiba band, where pruning is exact.
//!
//! ```no_run
//! use warpseek_dtw::TimeSeries;
//! use warpseek_index::{IndexConfig, find_best_match};
//!
//! # fn main() -> Result<(), warpseek_index::IndexError> {
//! let db: Vec<TimeSeries> = Vec::new();
//! let config = IndexConfig::new(3, 8)?;
//! let tree = config.build_tree(&db)?;
//! let query = config.represent(TimeSeries::new(vec![0.0; 64])?)?;
//! let approx = tree.search(&query, 5)?;
//! let exact = find_best_match(&query, &db)?;
//! # let _ = (approx, exact);
//! # Ok(())
//! # }
//! ```

mod bounds;
mod classify;
mod config;
mod error;
mod mbr;
mod nearest;
mod representation;
mod search;
mod tree;

pub use bounds::{envelope_bound, node_distance, raw_point_distance, segment_bound};
pub use classify::{Classification, classify_1nn};
pub use config::{DEFAULT_MIN_LEAF_SIZE, IndexConfig};
pub use error::IndexError;
pub use mbr::BoundingRect;
pub use nearest::{
    BestMatch, CascadeStats, brute_force_best_match, brute_force_best_match_banded,
    find_best_match, find_best_match_banded, find_best_match_prepared,
};
pub use representation::Representation;
pub use search::{KnnResult, KnnSearch, Neighbor, SearchStats};
pub use tree::{MbrTree, Node, NodeIndex, NodeKind};
