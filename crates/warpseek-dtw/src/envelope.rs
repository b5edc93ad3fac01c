//! Keogh envelopes and the LB_Keogh lower bound.

use std::collections::VecDeque;

use crate::constraint::BandConstraint;
use crate::series::TimeSeriesView;

/// Per-index running maximum and minimum over a centered window.
///
/// `upper[i]` is the maximum of `series[j]` for `|i - j| <= radius` and
/// `lower[i]` the minimum, with the window clamped to the series bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEnvelope {
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl SeriesEnvelope {
    /// Compute both envelopes in O(n) with monotonic deques.
    #[must_use]
    pub fn compute(series: TimeSeriesView<'_>, constraint: BandConstraint) -> Self {
        let data = series.as_slice();
        let radius = constraint.radius(data.len());
        Self {
            upper: sliding_extreme(data, radius, |kept, incoming| kept > incoming),
            lower: sliding_extreme(data, radius, |kept, incoming| kept < incoming),
        }
    }

    /// Upper envelope.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Lower envelope.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Length of the enveloped series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// True if the envelope covers no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

/// Centered sliding-window extreme.
///
/// `dominates(kept, incoming)` decides whether an older value stays in the
/// deque when a newer one arrives. Indices in the deque are increasing and the
/// front always holds the window's extreme.
fn sliding_extreme(data: &[f64], radius: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = data.len();
    let mut out = Vec::with_capacity(n);
    let mut deque: VecDeque<usize> = VecDeque::new();
    let mut next = 0usize;

    for i in 0..n {
        let hi = i.saturating_add(radius).min(n - 1);
        while next <= hi {
            while deque.back().is_some_and(|&b| !dominates(data[b], data[next])) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }

        let lo = i.saturating_sub(radius);
        while deque.front().is_some_and(|&f| f < lo) {
            deque.pop_front();
        }

        // Index i itself is always inside its own window.
        if let Some(&front) = deque.front() {
            out.push(data[front]);
        }
    }
    out
}

/// LB_Keogh: distance from `query` to the region enclosed by `envelope`.
///
/// Squared excursions above the upper or below the lower envelope are summed
/// over the common length and the square root returned.
#[must_use]
pub fn lb_keogh(query: &[f64], envelope: &SeriesEnvelope) -> f64 {
    query
        .iter()
        .zip(envelope.upper.iter().zip(&envelope.lower))
        .map(|(&q, (&u, &l))| {
            let gap = if q > u {
                q - u
            } else if q < l {
                l - q
            } else {
                0.0
            };
            gap * gap
        })
        .sum::<f64>()
        .sqrt()
}
