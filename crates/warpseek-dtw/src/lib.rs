//! Validated time series, Keogh envelopes and Dynamic Time Warping.
//!
//! Pure math library with no I/O. The DTW metric accumulates absolute
//! differences along the cheapest warping path and can be restricted to a
//! Sakoe-Chiba band; [`lb_keogh`] gives a cheap admissible lower bound on the
//! banded distance when the envelope radius matches the band radius.

mod constraint;
mod distance;
mod dtw;
mod envelope;
mod error;
mod series;

pub use constraint::BandConstraint;
pub use distance::DtwDistance;
pub use dtw::Dtw;
pub use envelope::{SeriesEnvelope, lb_keogh};
pub use error::DtwError;
pub use series::{TimeSeries, TimeSeriesView};
