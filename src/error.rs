use thiserror::Error;

/// Result type used across the crate.
pub type SpaceResult<T> = std::result::Result<T, SpaceError>;

/// Errors raised while building or reading a semantic space.
///
/// Unknown keys are not errors, see [`crate::BasisMapping::dimension_of`].
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index {index} is out of range for {len} allocated entries")]
    OutOfRange { index: usize, len: usize },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    #[error("no assignments available, cluster the points first")]
    NotClustered,

    #[error("key {key} is not part of the space")]
    UnknownKey { key: String },

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl SpaceError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        SpaceError::Configuration { reason: reason.into() }
    }

    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        SpaceError::Unsupported { operation: operation.into() }
    }

    /// Whether the error marks an operation the receiver can never perform,
    /// as opposed to a bad input.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SpaceError::Unsupported { .. })
    }
}

/// Fails with a [`SpaceError::DimensionMismatch`] unless both lengths agree.
pub(crate) fn check_length(expected: usize, actual: usize) -> SpaceResult<()> {
    if expected != actual {
        return Err(SpaceError::DimensionMismatch { expected, actual });
    }
    Ok(())
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn unsupported_is_detectable() {
        assert!(SpaceError::unsupported("column view").is_unsupported());
        assert!(!SpaceError::configuration("zero scale").is_unsupported());
        assert!(!SpaceError::NotClustered.is_unsupported());
    }

    #[test]
    fn length_check() {
        assert!(check_length(4, 4).is_ok());
        match check_length(4, 5) {
            Err(SpaceError::DimensionMismatch { expected: 4, actual: 5 }) => {},
            other => panic!("unexpected {:?}", other)
        }
    }
}
