//! Error types for series validation.

/// Errors raised while validating raw values into a [`TimeSeries`](crate::TimeSeries).
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Returned when a series has no time steps.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a value is NaN or infinite.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first offending value.
        index: usize,
    },
}
