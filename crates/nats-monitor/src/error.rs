use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request failed, timed out, or answered non-2xx.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
