use warpseek_dtw::DtwError;

/// Errors from building representations, the tree, or running a search.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Returned when a configuration parameter is out of range.
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidConfig {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: usize,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// Returned when two inputs that must agree in shape do not.
    #[error("{what} mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which dimension disagreed (series length, segment count, ...).
        what: &'static str,
        /// Value required by the reference side.
        expected: usize,
        /// Value found on the other side.
        got: usize,
    },

    /// Wraps a validation error raised while wrapping raw values.
    #[error("invalid series: {0}")]
    Series(#[from] DtwError),
}

impl IndexError {
    pub(crate) fn check_dims(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { what, expected, got })
        }
    }
}
