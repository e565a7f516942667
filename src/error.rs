use thiserror::Error;

/// Failures raised while turning the raw grid into a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleaningError {
    #[error("source returned no header row")]
    MissingHeader,
    #[error("required column '{0}' is missing from the header")]
    MissingColumn(String),
}

/// Error taxonomy for the fetch → clean → cache pipeline.
#[derive(Debug, Clone, Error)]
pub enum ForageError {
    #[error("data source is unavailable: {0}")]
    SourceUnavailable(String),
    #[error(transparent)]
    Cleaning(#[from] CleaningError),
    #[error("no data available: {0}")]
    DataUnavailable(Box<ForageError>),
}

impl ForageError {
    /// Wraps a failure that left the cache with nothing to serve.
    pub fn unavailable(cause: ForageError) -> Self {
        match cause {
            already @ ForageError::DataUnavailable(_) => already,
            other => ForageError::DataUnavailable(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_does_not_nest() {
        let once = ForageError::unavailable(ForageError::SourceUnavailable("timeout".into()));
        let twice = ForageError::unavailable(once);
        assert_eq!(
            twice.to_string(),
            "no data available: data source is unavailable: timeout"
        );
    }

    #[test]
    fn cleaning_error_names_the_column() {
        let err: ForageError = CleaningError::MissingColumn("Total Foraged".into()).into();
        assert_eq!(
            err.to_string(),
            "required column 'Total Foraged' is missing from the header"
        );
    }
}
