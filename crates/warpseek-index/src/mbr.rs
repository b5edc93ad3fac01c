//! Minimum bounding rectangles over PAA vectors.

use crate::bounds::node_distance;
use crate::error::IndexError;
use crate::representation::Representation;

/// Per-segment `(min, max)` of the PAA values of every series under a node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingRect {
    lows: Vec<f64>,
    highs: Vec<f64>,
}

impl BoundingRect {
    /// Rectangle spanning the PAA vectors of `members`.
    ///
    /// An empty slice yields a zero-dimensional rectangle.
    #[must_use]
    pub fn covering(members: &[Representation]) -> Self {
        let dims = members.first().map_or(0, Representation::segment_count);
        let mut rect = Self {
            lows: vec![f64::INFINITY; dims],
            highs: vec![f64::NEG_INFINITY; dims],
        };
        for member in members {
            for ((lo, hi), &v) in rect.lows.iter_mut().zip(rect.highs.iter_mut()).zip(member.paa()) {
                *lo = lo.min(v);
                *hi = hi.max(v);
            }
        }
        rect
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            lows: self.lows.iter().zip(&other.lows).map(|(a, b)| a.min(*b)).collect(),
            highs: self.highs.iter().zip(&other.highs).map(|(a, b)| a.max(*b)).collect(),
        }
    }

    /// True if `other` lies inside `self` in every segment.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.dims() == other.dims()
            && self.lows.iter().zip(&other.lows).all(|(a, b)| a <= b)
            && self.highs.iter().zip(&other.highs).all(|(a, b)| a >= b)
    }

    /// Lower corner.
    #[must_use]
    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    /// Upper corner.
    #[must_use]
    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    /// Number of segments.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.lows.len()
    }

    /// MINDIST from a query PAA vector to this rectangle.
    ///
    /// # Errors
    ///
    /// [`IndexError::DimensionMismatch`] if `paa` has a different dimension.
    pub fn min_distance(&self, paa: &[f64]) -> Result<f64, IndexError> {
        node_distance(paa, &self.lows, &self.highs)
    }
}
