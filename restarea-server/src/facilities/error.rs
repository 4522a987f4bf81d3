//! Facility lookup error types.

/// Errors that can occur while fetching facility details.
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status or an error code in the body
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
