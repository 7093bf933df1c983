//! Unified error handling for the calendar core.
//!
//! Every fallible operation in this crate returns [`CalendarResult`]. The
//! variants mirror how the orchestrator reacts: transport failures are
//! retried with backoff, unsuccessful responses move on to the next endpoint,
//! and everything else surfaces to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    /// Network-level failure: connection refused, timeout, 5xx
    #[error("Transport error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The endpoint answered but refused or could not serve the request
    #[error("Unsuccessful response from {endpoint}: {message}")]
    Unsuccessful { endpoint: String, message: String },

    /// All retries exhausted and no cached data to fall back on
    #[error("Failed to load calendar data after {attempts} attempts: {last_error}")]
    FetchFailed { attempts: u32, last_error: String },

    /// The request was cancelled or superseded by a newer one
    #[error("Request cancelled")]
    Cancelled,

    /// Export requested with an empty event list
    #[error("No data to export")]
    NoData,

    /// Export serialization failure
    #[error("Export failed: {0}")]
    Export(String),

    /// Local state storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalendarError {
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        CalendarError::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn unsuccessful(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        CalendarError::Unsuccessful {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether the failure warrants a backoff retry
    pub fn is_transport(&self) -> bool {
        matches!(self, CalendarError::Transport { .. })
    }
}

impl From<csv::Error> for CalendarError {
    fn from(err: csv::Error) -> Self {
        CalendarError::Export(err.to_string())
    }
}

/// Result type alias for calendar operations
pub type CalendarResult<T> = Result<T, CalendarError>;
