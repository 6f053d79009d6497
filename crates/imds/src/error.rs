use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request failed or timed out.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The metadata service answered with a non-success status.
    #[error("unexpected status from metadata service: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}
