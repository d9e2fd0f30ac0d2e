//! Error types

use thiserror::Error;

/// Upstream fetch errors.
///
/// All variants are recoverable: the poller logs them and retries on
/// the next tick, nothing is surfaced to a client.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Upstream returned status {0}")]
    BadStatus(u16),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Connection admission errors
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Connection attempt without a valid session")]
    Unauthenticated,
}

/// Result type aliases
pub type FetchResult<T> = Result<T, FetchError>;
pub type AdmissionResult<T> = Result<T, AdmissionError>;
