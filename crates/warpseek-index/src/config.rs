//! Index configuration builder.

use warpseek_dtw::TimeSeries;

use crate::error::IndexError;
use crate::representation::Representation;
use crate::tree::MbrTree;

/// Leaf threshold used when none is configured.
pub const DEFAULT_MIN_LEAF_SIZE: usize = 5;

/// Shared configuration for representations and the MBR tree.
///
/// Construct via [`IndexConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `min_leaf_size` | 5       |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    pub(crate) window_size: usize,
    pub(crate) num_segments: usize,
    pub(crate) min_leaf_size: usize,
}

impl IndexConfig {
    /// Create a configuration with the given envelope half-width and segment count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::InvalidConfig`] | `num_segments` is zero |
    pub fn new(window_size: usize, num_segments: usize) -> Result<Self, IndexError> {
        if num_segments == 0 {
            return Err(IndexError::InvalidConfig {
                parameter: "num_segments",
                value: num_segments,
                reason: "at least one segment is required",
            });
        }
        Ok(Self {
            window_size,
            num_segments,
            min_leaf_size: DEFAULT_MIN_LEAF_SIZE,
        })
    }

    /// Set the largest number of series a node may hold and still be a leaf.
    /// Validated when the tree is built.
    #[must_use]
    pub fn with_min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    /// Envelope half-width.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Requested number of equal-length segments.
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Leaf threshold.
    #[must_use]
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }

    /// Wrap one series under this configuration.
    ///
    /// # Errors
    ///
    /// See [`Representation::build`].
    pub fn represent(&self, series: TimeSeries) -> Result<Representation, IndexError> {
        Representation::build(series, self.window_size, self.num_segments)
    }

    /// Build an MBR tree over `database`.
    ///
    /// # Errors
    ///
    /// See [`MbrTree::build`].
    pub fn build_tree(&self, database: &[TimeSeries]) -> Result<MbrTree, IndexError> {
        MbrTree::build(database, self)
    }
}
