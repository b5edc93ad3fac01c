//! DTW distance computation.

use tracing::instrument;

use crate::constraint::BandConstraint;
use crate::distance::DtwDistance;
use crate::series::TimeSeriesView;

/// Immutable DTW configuration. Thread-safe and copyable.
///
/// The local cost of aligning `a[i]` with `b[j]` is `|a[i] - b[j]|` and the
/// distance is the sum of local costs along the cheapest warping path, with
/// steps restricted to up, left and diagonal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtw {
    constraint: BandConstraint,
}

impl Dtw {
    /// DTW over the full cost table.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::new(BandConstraint::Unconstrained)
    }

    /// DTW restricted to a Sakoe-Chiba band of the given radius.
    #[must_use]
    pub fn with_sakoe_chiba(radius: usize) -> Self {
        Self::new(BandConstraint::SakoeChibaRadius(radius))
    }

    /// DTW under an explicit [`BandConstraint`].
    #[must_use]
    pub fn new(constraint: BandConstraint) -> Self {
        Self { constraint }
    }

    /// Band constraint in use.
    #[must_use]
    pub fn constraint(&self) -> BandConstraint {
        self.constraint
    }

    /// DTW distance between two series.
    ///
    /// Runs in O(n * bw) time and O(bw) space with a rolling two-row buffer,
    /// where `bw` is the band width. Returns [`DtwDistance::INFINITY`] when the
    /// band leaves no path to the final cell.
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(n = a.len(), m = b.len()))]
    pub fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> DtwDistance {
        DtwDistance::new(self.rolling(a.as_slice(), b.as_slice(), None))
    }

    /// DTW distance with early abandoning.
    ///
    /// Returns [`DtwDistance::INFINITY`] as soon as the distance is known to
    /// exceed `cutoff`. Any finite result equals [`distance`](Self::distance).
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(n = a.len(), m = b.len()))]
    pub fn distance_with_cutoff(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
    ) -> DtwDistance {
        DtwDistance::new(self.rolling(a.as_slice(), b.as_slice(), Some(cutoff)))
    }

    /// Rolling-row DP.
    ///
    /// Each row buffer holds `bw + 2` slots: slot 0 and slot `bw + 1` stay at
    /// infinity, column `j` of a row starting at `start` lives in slot
    /// `j - start + 1`. Out-of-band reads land on infinity.
    fn rolling(&self, a: &[f64], b: &[f64], cutoff: Option<f64>) -> f64 {
        let n = a.len();
        let m = b.len();
        if n == 0 || m == 0 {
            return f64::INFINITY;
        }

        let width = self.constraint.band_width(m) + 2;
        let mut prev = vec![f64::INFINITY; width];
        let mut curr = vec![f64::INFINITY; width];
        let mut prev_start = 0usize;

        let read = |row: &[f64], start: usize, j: usize| -> f64 {
            if j < start {
                return f64::INFINITY;
            }
            row.get(j - start + 1).copied().unwrap_or(f64::INFINITY)
        };

        for (i, &ai) in a.iter().enumerate() {
            curr.fill(f64::INFINITY);
            let cols = self.constraint.column_range(i, m);
            let start = cols.start;
            let mut row_min = f64::INFINITY;

            for j in cols {
                let cost = (ai - b[j]).abs();
                let slot = j - start + 1;
                let best_prev = if i == 0 && j == 0 {
                    0.0
                } else {
                    let left = curr[slot - 1];
                    let (up, diag) = if i > 0 {
                        let diag = if j > 0 {
                            read(&prev, prev_start, j - 1)
                        } else {
                            f64::INFINITY
                        };
                        (read(&prev, prev_start, j), diag)
                    } else {
                        (f64::INFINITY, f64::INFINITY)
                    };
                    left.min(up).min(diag)
                };
                let value = cost + best_prev;
                curr[slot] = value;
                row_min = row_min.min(value);
            }

            // Every path crosses every row, so the row minimum bounds the
            // final cost from below. The last row is checked at its end cell.
            if let Some(c) = cutoff
                && i + 1 < n
                && row_min > c
            {
                return f64::INFINITY;
            }

            prev_start = start;
            std::mem::swap(&mut prev, &mut curr);
        }

        let total = read(&prev, prev_start, m - 1);
        match cutoff {
            Some(c) if total > c => f64::INFINITY,
            _ => total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;

    /// Textbook (n+1) x (m+1) table with infinite borders and a zero origin.
    fn table_dtw(a: &[f64], b: &[f64], constraint: BandConstraint) -> f64 {
        let (n, m) = (a.len(), b.len());
        let mut table = vec![vec![f64::INFINITY; m + 1]; n + 1];
        table[0][0] = 0.0;
        for i in 1..=n {
            for j in constraint.column_range(i - 1, m) {
                let j = j + 1;
                let best = table[i - 1][j].min(table[i][j - 1]).min(table[i - 1][j - 1]);
                table[i][j] = (a[i - 1] - b[j - 1]).abs() + best;
            }
        }
        table[n][m]
    }

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn identical_series_distance_zero() {
        let s = ts(&[1.0, 2.0, 3.0, 2.0]);
        assert_eq!(Dtw::unconstrained().distance(s.as_view(), s.as_view()).value(), 0.0);
        assert_eq!(Dtw::with_sakoe_chiba(0).distance(s.as_view(), s.as_view()).value(), 0.0);
    }

    #[test]
    fn hand_computed_2x2() {
        // |0-1| = 1 at the origin, then (1,1) costs 1 + min(1, 1, 1) = 2
        let a = ts(&[0.0, 1.0]);
        let b = ts(&[1.0, 0.0]);
        let d = Dtw::unconstrained().distance(a.as_view(), b.as_view());
        assert!((d.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_band_is_pointwise_l1() {
        let a = ts(&[0.0, 0.0, 0.0]);
        let b = ts(&[1.0, 2.0, 1.0]);
        let d = Dtw::with_sakoe_chiba(0).distance(a.as_view(), b.as_view());
        assert!((d.value() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn symmetric() {
        let a = ts(&[1.0, 5.0, 2.0, 8.0, 3.0]);
        let b = ts(&[2.0, 4.0, 7.0, 1.0, 0.0]);
        for dtw in [Dtw::unconstrained(), Dtw::with_sakoe_chiba(1)] {
            let ab = dtw.distance(a.as_view(), b.as_view()).value();
            let ba = dtw.distance(b.as_view(), a.as_view()).value();
            assert!((ab - ba).abs() < 1e-12);
        }
    }

    #[test]
    fn rolling_matches_full_table() {
        let pairs: [(&[f64], &[f64]); 4] = [
            (&[1.0, 3.0, 5.0, 2.0], &[2.0, 4.0, 1.0]),
            (&[0.0, 5.0, 0.0, 5.0], &[5.0, 0.0, 5.0, 0.0]),
            (&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[6.0, 1.0, 2.0, 2.0, 3.0, 9.0]),
            (&[3.0], &[1.0, 2.0, 3.0]),
        ];
        for constraint in [
            BandConstraint::Unconstrained,
            BandConstraint::SakoeChibaRadius(1),
            BandConstraint::SakoeChibaRadius(2),
        ] {
            let dtw = Dtw::new(constraint);
            for (a, b) in pairs {
                let expected = table_dtw(a, b, constraint);
                let got = dtw.distance(ts(a).as_view(), ts(b).as_view()).value();
                if expected.is_infinite() {
                    assert!(got.is_infinite());
                } else {
                    assert!((got - expected).abs() < 1e-10, "{a:?} vs {b:?}: {got} != {expected}");
                }
            }
        }
    }

    #[test]
    fn band_never_beats_unconstrained() {
        let a = ts(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        let b = ts(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let free = Dtw::unconstrained().distance(a.as_view(), b.as_view()).value();
        let banded = Dtw::with_sakoe_chiba(1).distance(a.as_view(), b.as_view()).value();
        assert!(banded >= free - 1e-12);
    }

    #[test]
    fn unreachable_end_cell_is_infinite() {
        let a = ts(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = ts(&[1.0, 2.0]);
        let d = Dtw::with_sakoe_chiba(1).distance(a.as_view(), b.as_view());
        assert!(!d.is_finite());
    }

    #[test]
    fn cutoff_abandons_and_preserves() {
        let dtw = Dtw::unconstrained();
        let a = ts(&[0.0, 0.0, 0.0, 0.0]);
        let b = ts(&[10.0, 10.0, 10.0, 10.0]);
        let exact = dtw.distance(a.as_view(), b.as_view()).value();
        assert!((exact - 40.0).abs() < 1e-12);

        assert!(!dtw.distance_with_cutoff(a.as_view(), b.as_view(), 5.0).is_finite());
        assert!(!dtw.distance_with_cutoff(a.as_view(), b.as_view(), exact - 1e-6).is_finite());
        let kept = dtw.distance_with_cutoff(a.as_view(), b.as_view(), exact);
        assert!((kept.value() - exact).abs() < 1e-12);
    }
}
