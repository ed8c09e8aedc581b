use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
///
/// Provider lookups never surface this type to callers of the engine; it is
/// settled into a [`ProviderOutcome`](crate::ProviderOutcome) at the adapter
/// boundary. It is returned directly only by client construction and request
/// validation.
#[derive(Debug, Error)]
pub enum EsgError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A JSON body could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The provider answered with a 5xx status.
    #[error("Server error {status} at {url}")]
    ServerError {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The provider answered 404.
    #[error("Not found at {url}")]
    NotFound {
        /// The URL that returned the error.
        url: String,
    },

    /// The provider answered 429.
    #[error("Rate limited at {url}")]
    RateLimited {
        /// The URL that returned the error.
        url: String,
    },

    /// The data received was in an unexpected format or was missing a required field.
    #[error("Data format unexpected or missing field: {0}")]
    Data(String),

    /// Invalid parameters were supplied to a builder or request.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A provider name could not be recognized.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
}

impl EsgError {
    /// Maps a non-success status code to the matching error variant.
    pub(crate) fn from_status(status: u16, url: &url::Url) -> Self {
        let url = url.to_string();
        match status {
            404 => Self::NotFound { url },
            429 => Self::RateLimited { url },
            500..=599 => Self::ServerError { status, url },
            _ => Self::Status { status, url },
        }
    }
}
