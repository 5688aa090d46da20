//! Error types and HTTP error classification for Proofroom

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProofroomError>;

#[derive(Error, Debug)]
pub enum ProofroomError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProofroomError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ProofroomError::InvalidInput(_) => 3,
            ProofroomError::Api(ApiError::Status { code: 401 | 403, .. }) => 2,
            ProofroomError::Api(_) => 1,
            ProofroomError::Config(_) => 1,
            ProofroomError::Storage(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keychain operation failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Refusing to use symlinked storage file: {0}")]
    SymlinkRejected(String),
}

/// Failures produced by the HTTP layer. These carry enough structure for
/// [`ErrorInfo::from_api_error`] to classify them without re-parsing strings.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection aborted: {0}")]
    Aborted(String),

    #[error("HTTP {code}: {}", .detail.as_deref().unwrap_or("request failed"))]
    Status { code: u16, detail: Option<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Connectivity checks come before the timeout check: a connect
        // timeout carries both signals and counts as no-connectivity.
        if err.is_connect() {
            ApiError::Connect(err.to_string())
        } else if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_request() || err.is_body() {
            ApiError::Aborted(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                code: status.as_u16(),
                detail: None,
            }
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Other(err.to_string())
        }
    }
}

/// Closed taxonomy of user-facing error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Server,
    NotFound,
    Unauthorized,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Server => write!(f, "server"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classification record driving user-facing error presentation.
///
/// Derived from an [`ApiError`] at the moment a request fails; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub code: Option<u16>,
}

impl ErrorInfo {
    /// Classify an API failure into exactly one `ErrorInfo`.
    ///
    /// Total over every `ApiError`; first matching rule wins:
    /// no-connectivity signals, then status 401/403, 404, 5xx, any other
    /// status, then timeouts, then everything else.
    pub fn from_api_error(error: &ApiError) -> Self {
        match error {
            ApiError::Connect(_) | ApiError::Aborted(_) => ErrorInfo {
                kind: ErrorKind::Network,
                message: "Unable to reach the server. Check your connection and try again."
                    .to_string(),
                code: None,
            },
            ApiError::Status { code: code @ (401 | 403), .. } => ErrorInfo {
                kind: ErrorKind::Unauthorized,
                message: "Your session has expired. Please sign in again.".to_string(),
                code: Some(*code),
            },
            ApiError::Status { code: 404, .. } => ErrorInfo {
                kind: ErrorKind::NotFound,
                message: "The requested resource could not be found.".to_string(),
                code: Some(404),
            },
            ApiError::Status { code, .. } if (500..600).contains(code) => ErrorInfo {
                kind: ErrorKind::Server,
                message: "The server ran into a problem. Please try again later.".to_string(),
                code: Some(*code),
            },
            ApiError::Status { code, detail } => ErrorInfo {
                kind: ErrorKind::Unknown,
                message: detail
                    .clone()
                    .unwrap_or_else(|| format!("The request failed with status {}.", code)),
                code: Some(*code),
            },
            ApiError::Timeout(_) => ErrorInfo {
                kind: ErrorKind::Network,
                message: "The request timed out. Check your connection and try again."
                    .to_string(),
                code: None,
            },
            other => {
                let message = other.to_string();
                ErrorInfo {
                    kind: ErrorKind::Unknown,
                    message: if message.is_empty() {
                        "An unexpected error occurred.".to_string()
                    } else {
                        message
                    },
                    code: None,
                }
            }
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
