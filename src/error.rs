// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Each variant tells the story of what went wrong and where, carries a
//! stable [`ErrorCode`], and chains its cause instead of swallowing it.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded; back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            404 => Self::ObjectNotFound,
            429 => Self::RateLimited,
            other => Self::HttpStatus(other),
        }
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Stable, machine-readable kind code for every [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PageNotFound,
    BlockNotFound,
    FetchArticleError,
    MaxRetriesExceeded,
    ConversionError,
    PageConversionError,
    InvalidUrl,
    InvalidProtocol,
    DownloadError,
    DirectoryCreateError,
    ProcessFailed,
    MissingCredential,
    InvalidConfig,
    NetworkFailure,
    RemoteServiceError,
    MalformedResponse,
    IoError,
    ValidationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageNotFound => "PAGE_NOT_FOUND",
            Self::BlockNotFound => "BLOCK_NOT_FOUND",
            Self::FetchArticleError => "FETCH_ARTICLE_ERROR",
            Self::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
            Self::ConversionError => "CONVERSION_ERROR",
            Self::PageConversionError => "PAGE_CONVERSION_ERROR",
            Self::InvalidUrl => "INVALID_URL",
            Self::InvalidProtocol => "INVALID_PROTOCOL",
            Self::DownloadError => "DOWNLOAD_ERROR",
            Self::DirectoryCreateError => "DIRECTORY_CREATE_ERROR",
            Self::ProcessFailed => "PROCESS_FAILED",
            Self::MissingCredential => "MISSING_API_KEY",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::NetworkFailure => "NETWORK_FAILURE",
            Self::RemoteServiceError => "REMOTE_SERVICE_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::IoError => "IO_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Page not found: {id}")]
    PageNotFound {
        id: String,
        #[source]
        source: Option<Box<AppError>>,
    },

    #[error("Block not found: {id}")]
    BlockNotFound {
        id: String,
        #[source]
        source: Option<Box<AppError>>,
    },

    #[error("Failed to fetch article {id}: {source}")]
    FetchArticle { id: String, source: Box<AppError> },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        operation: String,
        attempts: u32,
        source: Box<AppError>,
    },

    #[error("Conversion failed: {message}")]
    Conversion {
        message: String,
        #[source]
        source: Option<Box<AppError>>,
    },

    #[error("Failed to convert page {id}: {source}")]
    PageConversion { id: String, source: Box<AppError> },

    #[error("Invalid media URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid protocol '{scheme}' for media URL {url}")]
    InvalidProtocol { url: String, scheme: String },

    #[error("Download failed for {url}: {reason}")]
    Download {
        url: String,
        reason: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<AppError>>,
    },

    #[error("Failed to create media directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to process article {id}: {source}")]
    ProcessFailed { id: String, source: Box<AppError> },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: u16,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl AppError {
    /// The stable kind code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PageNotFound { .. } => ErrorCode::PageNotFound,
            Self::BlockNotFound { .. } => ErrorCode::BlockNotFound,
            Self::FetchArticle { .. } => ErrorCode::FetchArticleError,
            Self::MaxRetriesExceeded { .. } => ErrorCode::MaxRetriesExceeded,
            Self::Conversion { .. } => ErrorCode::ConversionError,
            Self::PageConversion { .. } => ErrorCode::PageConversionError,
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::InvalidProtocol { .. } => ErrorCode::InvalidProtocol,
            Self::Download { .. } => ErrorCode::DownloadError,
            Self::DirectoryCreate { .. } => ErrorCode::DirectoryCreateError,
            Self::ProcessFailed { .. } => ErrorCode::ProcessFailed,
            Self::MissingCredential(_) => ErrorCode::MissingCredential,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::NetworkFailure(_) => ErrorCode::NetworkFailure,
            Self::NotionService { .. } => ErrorCode::RemoteServiceError,
            Self::MalformedResponse(_) => ErrorCode::MalformedResponse,
            Self::Io(_) => ErrorCode::IoError,
            Self::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Whether the remote store reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotionService { code, .. } => code.is_not_found(),
            Self::PageNotFound { .. } | Self::BlockNotFound { .. } => true,
            _ => false,
        }
    }

    /// Errors already typed by the fetch stage; these pass through unwrapped.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::PageNotFound { .. }
                | Self::BlockNotFound { .. }
                | Self::FetchArticle { .. }
                | Self::MaxRetriesExceeded { .. }
        )
    }

    /// Errors already typed by the conversion stage; these pass through unwrapped.
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            Self::Conversion { .. }
                | Self::PageConversion { .. }
                | Self::InvalidUrl { .. }
                | Self::InvalidProtocol { .. }
                | Self::Download { .. }
                | Self::DirectoryCreate { .. }
        )
    }

    /// Wraps `self` as the cause of a retry exhaustion.
    pub fn exhausted(self, operation: impl Into<String>, attempts: u32) -> Self {
        Self::MaxRetriesExceeded {
            operation: operation.into(),
            attempts,
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
