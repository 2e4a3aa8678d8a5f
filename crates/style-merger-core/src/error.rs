use std::time::Duration;
use thiserror::Error;

use crate::host::HostError;
use crate::types::StyleId;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the style-merger library
#[derive(Error, Debug)]
pub enum Error {
    /// The Designer API is missing or does not expose the needed capability
    #[error("Designer API unavailable: {0}")]
    HostUnavailable(String),

    /// User input failed validation (empty query, incomplete selection)
    #[error("{0}")]
    Validation(String),

    /// A selected id no longer resolves to a known style
    #[error("{0}")]
    SelectionInvalid(String),

    /// Style properties could not be fetched for comparison
    #[error("Failed to compare styles: {0}")]
    Comparison(String),

    /// Duplicate discovery could not list the site's styles
    #[error("Failed to find duplicate styles: {0}")]
    Discovery(String),

    /// A duplicate style could not be folded into its base
    #[error("Failed to merge style {style}: {message}")]
    MergeExecution { style: StyleId, message: String },

    /// A Designer API call failed
    #[error("Designer API error: {0}")]
    Host(#[from] HostError),

    /// A Designer API call did not answer in time
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout { operation: String, after: Duration },

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Custom code service request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Text suitable for showing next to the action that failed
    pub fn user_message(&self) -> String {
        match self {
            Error::Host(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
