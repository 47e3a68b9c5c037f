use thiserror::Error;

/// Main error type for Everyplay API operations
#[derive(Debug, Error)]
pub enum RestError {
    /// HTTP verb outside get/post/put/delete/head
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Non-success HTTP status returned by the API
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A success response whose body is not valid JSON
    #[error("failed to parse response body: {source}")]
    ResponseParse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Parameters that cannot be encoded
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport error (connection, DNS, TLS), passed through unmodified
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// IO error while reading a file upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestError {
    /// Create a new HTTP status error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        RestError::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Get the HTTP status code if this is a status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RestError::HttpStatus { status, .. } => Some(*status),
            RestError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::HttpStatus { status: 404, .. })
    }

    /// Check if this error is a 301/302 that was not suppressed
    pub fn is_redirect(&self) -> bool {
        matches!(self, RestError::HttpStatus { status: 301 | 302, .. })
    }
}

/// Result type for Everyplay API operations
pub type Result<T> = std::result::Result<T, RestError>;
