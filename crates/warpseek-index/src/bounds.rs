//! Lower-bound estimators for the DTW distance between two representations.
//!
//! Every function returns a non-negative value. [`envelope_bound`] and
//! [`segment_bound`] never exceed the absolute-cost DTW distance restricted to
//! a Sakoe-Chiba band whose radius equals the envelope window.

use warpseek_dtw::lb_keogh;

use crate::error::IndexError;
use crate::representation::Representation;

/// Absolute difference of the single PAA values of two one-segment representations.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] unless both have exactly one segment.
pub fn raw_point_distance(
    query: &Representation,
    candidate: &Representation,
) -> Result<f64, IndexError> {
    IndexError::check_dims("segment count", 1, query.segment_count())?;
    IndexError::check_dims("segment count", 1, candidate.segment_count())?;
    Ok((query.paa()[0] - candidate.paa()[0]).abs())
}

/// LB_Keogh: the query's raw values against the candidate's envelope.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if the series lengths differ.
pub fn envelope_bound(
    query: &Representation,
    candidate: &Representation,
) -> Result<f64, IndexError> {
    IndexError::check_dims("series length", query.len(), candidate.len())?;
    Ok(lb_keogh(query.raw(), candidate.envelope()))
}

/// LB_PAA: the candidate's PAA values against the query's segment bounds.
///
/// Each segment outside `[segment_lower, segment_upper]` contributes its squared
/// gap weighted by the fraction of the series the segment covers.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if the lengths or segment counts differ.
pub fn segment_bound(
    query: &Representation,
    candidate: &Representation,
) -> Result<f64, IndexError> {
    IndexError::check_dims("series length", query.len(), candidate.len())?;
    IndexError::check_dims("segment count", query.segment_count(), candidate.segment_count())?;

    let n = query.len() as f64;
    let sum: f64 = candidate
        .paa()
        .iter()
        .zip(query.segment_upper())
        .zip(query.segment_lower())
        .zip(query.segment_lengths())
        .map(|(((&c, &upper), &lower), &len)| {
            let gap = if c > upper {
                c - upper
            } else if c < lower {
                lower - c
            } else {
                0.0
            };
            (len as f64 / n) * gap * gap
        })
        .sum();
    Ok(sum.sqrt())
}

/// MINDIST between a PAA vector and a bounding rectangle `[lows, highs]`.
///
/// # Errors
///
/// [`IndexError::DimensionMismatch`] if the three slices differ in length.
pub fn node_distance(paa: &[f64], lows: &[f64], highs: &[f64]) -> Result<f64, IndexError> {
    IndexError::check_dims("rectangle dimension", paa.len(), lows.len())?;
    IndexError::check_dims("rectangle dimension", paa.len(), highs.len())?;

    let sum: f64 = paa
        .iter()
        .zip(lows.iter().zip(highs))
        .map(|(&q, (&lo, &hi))| {
            let gap = if q < lo {
                lo - q
            } else if q > hi {
                q - hi
            } else {
                0.0
            };
            gap * gap
        })
        .sum();
    Ok(sum.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpseek_dtw::TimeSeries;

    fn rep(values: &[f64], window: usize, segments: usize) -> Representation {
        Representation::build(TimeSeries::new(values.to_vec()).unwrap(), window, segments).unwrap()
    }

    #[test]
    fn identical_series_give_zero() {
        let values = [1.0, 4.0, 2.0, 8.0, 5.0, 7.0];
        let q = rep(&values, 1, 3);
        let c = rep(&values, 1, 3);
        assert_eq!(envelope_bound(&q, &c).unwrap(), 0.0);
        assert_eq!(segment_bound(&q, &c).unwrap(), 0.0);
        assert_eq!(node_distance(q.paa(), c.paa(), c.paa()).unwrap(), 0.0);

        let q1 = rep(&values, 1, 1);
        let c1 = rep(&values, 1, 1);
        assert_eq!(raw_point_distance(&q1, &c1).unwrap(), 0.0);
    }

    #[test]
    fn segment_bound_hand_computed() {
        // Query [0,0,0,0] with window 0: segment bounds are all zero.
        // Candidate [2,2,-1,-1] has PAA [2, -1], each segment half of the series:
        // sqrt(0.5 * 4 + 0.5 * 1) = sqrt(2.5)
        let q = rep(&[0.0, 0.0, 0.0, 0.0], 0, 2);
        let c = rep(&[2.0, 2.0, -1.0, -1.0], 0, 2);
        let lb = segment_bound(&q, &c).unwrap();
        assert!((lb - 2.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn envelope_bound_hand_computed() {
        // Candidate [0,0,0] has a flat zero envelope; query [3,0,-4] → 5.
        let q = rep(&[3.0, 0.0, -4.0], 1, 1);
        let c = rep(&[0.0, 0.0, 0.0], 1, 1);
        assert!((envelope_bound(&q, &c).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn raw_point_distance_needs_one_segment() {
        let q = rep(&[1.0, 3.0], 0, 1);
        let c = rep(&[5.0, 7.0], 0, 1);
        assert_eq!(raw_point_distance(&q, &c).unwrap(), 4.0);

        let two = rep(&[1.0, 3.0], 0, 2);
        assert!(matches!(
            raw_point_distance(&two, &c),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn node_distance_hand_computed() {
        // below, inside, above → sqrt(1 + 0 + 4)
        let d = node_distance(&[0.0, 5.0, 10.0], &[1.0, 4.0, 6.0], &[2.0, 6.0, 8.0]).unwrap();
        assert!((d - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mismatches_are_reported() {
        let short = rep(&[1.0, 2.0, 3.0, 4.0], 1, 2);
        let long = rep(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1, 2);
        assert!(matches!(
            envelope_bound(&short, &long),
            Err(IndexError::DimensionMismatch { what: "series length", expected: 4, got: 6 })
        ));
        assert!(segment_bound(&short, &long).is_err());

        let other_segments = rep(&[1.0, 2.0, 3.0, 4.0], 1, 4);
        assert!(matches!(
            segment_bound(&short, &other_segments),
            Err(IndexError::DimensionMismatch { what: "segment count", .. })
        ));
        assert!(node_distance(&[1.0, 2.0], &[0.0], &[3.0]).is_err());
    }
}
