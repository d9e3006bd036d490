// src/error.rs

//! Unified error handling for the lineup scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Classified failure of a single HTTP request.
///
/// Callers match on the kind to decide whether the failure leaves a record
/// unresolved or aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, DNS or protocol failure
    #[error("network error for {url}: {cause}")]
    Network { url: String, cause: String },

    /// The request did not complete within the client timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The body arrived but could not be decoded
    #[error("invalid payload from {url}: {cause}")]
    Decode { url: String, cause: String },
}

impl FetchError {
    /// Classify a transport error raised by `reqwest`.
    pub fn from_reqwest(url: impl Into<String>, err: &reqwest::Error) -> Self {
        let url = url.into();
        if err.is_timeout() {
            return Self::Timeout { url };
        }
        if let Some(status) = err.status() {
            return Self::Status {
                url,
                status: status.as_u16(),
            };
        }
        Self::Network {
            url,
            cause: err.to_string(),
        }
    }

    /// HTTP status if the failure was a status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A classified request failure
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Expected page structure is missing
    #[error("Structure error: {0}")]
    Structure(String),

    /// The lineup could not be retrieved at all, most likely a login wall
    #[error("Lineup could not be accessed (login may be required): {0}")]
    LoginOrAccess(String),

    /// Headless browser rendering failed
    #[error("Render error: {0}")]
    Render(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Create a render error.
    pub fn render(message: impl fmt::Display) -> Self {
        Self::Render(message.to_string())
    }

    /// Whether this error means the lineup itself was unreachable.
    pub fn is_access_failure(&self) -> bool {
        matches!(self, Self::LoginOrAccess(_))
    }
}
