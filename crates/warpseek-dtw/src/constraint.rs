//! Warping-window constraints shared by envelopes and DTW.

use std::ops::Range;

/// Limit on how far the warping path may stray from the diagonal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BandConstraint {
    /// Any alignment is allowed.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell (i, j) is reachable only if |i - j| <= radius.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Band whose radius equals an envelope half-width.
    ///
    /// A window of zero still yields a band (the diagonal only), so LB_Keogh
    /// over a zero-width envelope stays a lower bound of the banded distance.
    #[must_use]
    pub fn from_window(window_size: usize) -> Self {
        Self::SakoeChibaRadius(window_size)
    }

    /// Effective radius for a series of length `n`.
    #[must_use]
    pub fn radius(&self, n: usize) -> usize {
        match self {
            Self::Unconstrained => n,
            Self::SakoeChibaRadius(r) => *r,
        }
    }

    /// Valid column range for `row` in an `n_rows x n_cols` cost table.
    #[must_use]
    pub fn column_range(&self, row: usize, n_cols: usize) -> Range<usize> {
        match self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChibaRadius(r) => {
                let start = row.saturating_sub(*r).min(n_cols);
                let end = (row + r + 1).min(n_cols);
                start..end
            }
        }
    }

    /// Widest column range across all rows.
    #[must_use]
    pub fn band_width(&self, n_cols: usize) -> usize {
        match self {
            Self::Unconstrained => n_cols,
            Self::SakoeChibaRadius(r) => (2 * r + 1).min(n_cols),
        }
    }
}
