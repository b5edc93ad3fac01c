//! Per-series feature representation: Keogh envelope, segment bounds and PAA.

use std::ops::Range;

use warpseek_dtw::{BandConstraint, SeriesEnvelope, TimeSeries};

use crate::error::IndexError;

/// Partition `0..n` into `num_segments` chunks of `n / num_segments` indices,
/// plus one trailing chunk for the remainder when `n` is not evenly divisible.
pub(crate) fn segment_ranges(n: usize, num_segments: usize) -> Vec<Range<usize>> {
    let seg_len = n / num_segments;
    let mut ranges: Vec<Range<usize>> = (0..num_segments)
        .map(|s| s * seg_len..(s + 1) * seg_len)
        .collect();
    if n % num_segments != 0 {
        ranges.push(seg_len * num_segments..n);
    }
    ranges
}

/// A raw series together with the summaries every lower bound is computed from.
///
/// All derived vectors are computed once in [`Representation::build`] and are
/// read-only afterwards, so they can also be handed to an external renderer.
///
/// Invariants:
/// - `envelope.lower()[i] <= raw[i] <= envelope.upper()[i]`
/// - `segment_lower[s] <= paa[s] <= segment_upper[s]`
#[derive(Debug, Clone)]
pub struct Representation {
    series: TimeSeries,
    window_size: usize,
    num_segments: usize,
    envelope: SeriesEnvelope,
    segment_lengths: Vec<usize>,
    segment_upper: Vec<f64>,
    segment_lower: Vec<f64>,
    paa: Vec<f64>,
}

impl Representation {
    /// Wrap `series` and compute its envelope, segment bounds and PAA.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::InvalidConfig`] | `num_segments` is zero or exceeds the series length |
    pub fn build(
        series: TimeSeries,
        window_size: usize,
        num_segments: usize,
    ) -> Result<Self, IndexError> {
        let n = series.len();
        if num_segments == 0 {
            return Err(IndexError::InvalidConfig {
                parameter: "num_segments",
                value: num_segments,
                reason: "at least one segment is required",
            });
        }
        if num_segments > n {
            return Err(IndexError::InvalidConfig {
                parameter: "num_segments",
                value: num_segments,
                reason: "more segments than time steps",
            });
        }

        let view = series.as_view();
        let envelope = SeriesEnvelope::compute(view, BandConstraint::from_window(window_size));
        let ranges = segment_ranges(n, num_segments);

        let segment_upper = ranges
            .iter()
            .map(|r| envelope.upper()[r.clone()].iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        let segment_lower = ranges
            .iter()
            .map(|r| envelope.lower()[r.clone()].iter().copied().fold(f64::INFINITY, f64::min))
            .collect();
        let paa = ranges.iter().map(|r| view.range_mean(r.clone())).collect();
        let segment_lengths = ranges.iter().map(Range::len).collect();

        Ok(Self {
            series,
            window_size,
            num_segments,
            envelope,
            segment_lengths,
            segment_upper,
            segment_lower,
            paa,
        })
    }

    /// The wrapped raw series.
    #[must_use]
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Raw values.
    #[must_use]
    pub fn raw(&self) -> &[f64] {
        self.series.as_ref()
    }

    /// Number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always `false`; a representation wraps a non-empty series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Envelope half-width this representation was built with.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Requested segment count. The actual count may be one higher, see
    /// [`segment_count`](Self::segment_count).
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Number of segments including a trailing remainder segment, if any.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.paa.len()
    }

    /// Keogh envelope of the raw series.
    #[must_use]
    pub fn envelope(&self) -> &SeriesEnvelope {
        &self.envelope
    }

    /// Number of raw indices in each segment.
    #[must_use]
    pub fn segment_lengths(&self) -> &[usize] {
        &self.segment_lengths
    }

    /// Maximum of the upper envelope over each segment.
    #[must_use]
    pub fn segment_upper(&self) -> &[f64] {
        &self.segment_upper
    }

    /// Minimum of the lower envelope over each segment.
    #[must_use]
    pub fn segment_lower(&self) -> &[f64] {
        &self.segment_lower
    }

    /// Piecewise aggregate approximation: the mean of each segment.
    #[must_use]
    pub fn paa(&self) -> &[f64] {
        &self.paa
    }
}
