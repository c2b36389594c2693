use thiserror::Error;

/// Errors raised by a race record supplier
///
/// These are recovered locally: the affected race or season is skipped and
/// assembly continues with the rest.
#[derive(Debug, Error)]
pub enum SupplierError {
    #[cfg(feature = "openf1")]
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Request to {url} failed after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("No race session found for {0}")]
    NoRaceSession(String),

    #[error("CSV load failed: {0}")]
    Csv(#[from] polars::error::PolarsError),

    #[error("No races available for season {0}")]
    NoData(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading or writing a cached dataset
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache file is inconsistent: {0}")]
    Invalid(String),
}

/// Fatal errors surfaced to the caller of the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No usable rows were produced from {races} races; nothing to train on")]
    EmptyDataset { races: usize },

    #[error("Dataset export failed: {0}")]
    Export(#[from] polars::error::PolarsError),

    #[error("Dataset I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::EmptyDataset { races: 3 };
        assert!(err.to_string().contains("No usable rows"));
        assert!(err.to_string().contains("3 races"));

        let err = SupplierError::NoRaceSession("2024 R1 (Sakhir)".to_string());
        assert!(err.to_string().contains("Sakhir"));

        let err = CacheError::Invalid("row 3 has 23 features".to_string());
        assert!(err.to_string().contains("inconsistent"));
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = SupplierError::RetriesExhausted {
            url: "https://api.openf1.org/v1/meetings".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "Request to https://api.openf1.org/v1/meetings failed after 3 attempts"
        );
    }
}
