//! DTW distance newtype.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Accumulated absolute-difference cost of an optimal warping path.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DtwDistance(f64);

impl DtwDistance {
    /// Sentinel for "no alignment" or "abandoned above the cutoff".
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw distance value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// True unless the computation was abandoned or no path exists.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Total ordering via [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for DtwDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
