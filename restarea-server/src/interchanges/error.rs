//! Interchange catalog error types.

/// Errors that can occur while loading the interchange catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check HIGHWAY_API_KEY")]
    Unauthorized,

    /// API returned an error status or an error code in the body
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Disk cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Reading a local catalog file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source returned no usable interchanges
    #[error("interchange source returned no usable entries")]
    Empty,

    /// Loading did not finish in time
    #[error("interchange catalog load timed out")]
    Timeout,
}
