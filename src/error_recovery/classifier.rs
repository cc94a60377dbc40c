// src/error_recovery/classifier.rs
//! Maps failures onto a closed set of kinds with a retry verdict.

use crate::constants::{API_LIMIT_COOLDOWN, NETWORK_COOLDOWN};
use crate::error::{AppError, NotionErrorCode};
use std::error::Error as _;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkError,
    ApiLimit,
    PermissionDenied,
    InvalidData,
    Unknown,
}

impl ErrorKind {
    /// Only transient kinds are worth another attempt.
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::NetworkError | ErrorKind::ApiLimit)
    }

    /// Cool-down to observe before the caller's own retry.
    pub fn recovery_delay(&self) -> Duration {
        match self {
            ErrorKind::ApiLimit => API_LIMIT_COOLDOWN,
            ErrorKind::NetworkError => NETWORK_COOLDOWN,
            _ => Duration::ZERO,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::ApiLimit => "API_LIMIT",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::InvalidData => "INVALID_DATA",
            ErrorKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Case-insensitive keyword match on a failure message.
pub fn classify_message(message: &str) -> ErrorKind {
    let message = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if has(&["rate limit", "too many requests"]) {
        ErrorKind::ApiLimit
    } else if has(&["network", "timeout", "connection"]) {
        ErrorKind::NetworkError
    } else if has(&["unauthorized", "forbidden"]) {
        ErrorKind::PermissionDenied
    } else if has(&["invalid", "not found", "bad request"]) {
        ErrorKind::InvalidData
    } else {
        ErrorKind::Unknown
    }
}

/// Classifies an error by its rendered message.
///
/// Typed store errors anywhere in the cause chain take precedence, since
/// their messages carry codes like `rate_limited` rather than prose.
pub fn classify(error: &AppError) -> ErrorKind {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        let typed = err
            .downcast_ref::<AppError>()
            .or_else(|| err.downcast_ref::<Box<AppError>>().map(|boxed| boxed.as_ref()));
        if let Some(AppError::NotionService { code, .. }) = typed {
            match code {
                NotionErrorCode::RateLimited => return ErrorKind::ApiLimit,
                NotionErrorCode::Unauthorized | NotionErrorCode::RestrictedResource => {
                    return ErrorKind::PermissionDenied
                }
                _ => {}
            }
        }
        current = err.source();
    }
    classify_message(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_classification() {
        let cases = [
            ("Rate limit exceeded", ErrorKind::ApiLimit),
            ("429 Too Many Requests", ErrorKind::ApiLimit),
            ("Network unreachable", ErrorKind::NetworkError),
            ("request TIMEOUT", ErrorKind::NetworkError),
            ("Unauthorized access", ErrorKind::PermissionDenied),
            ("Forbidden", ErrorKind::PermissionDenied),
            ("Page not found: abc", ErrorKind::InvalidData),
            ("Bad Request", ErrorKind::InvalidData),
            ("something odd", ErrorKind::Unknown),
        ];
        for (message, kind) in cases {
            assert_eq!(classify_message(message), kind, "{message}");
        }
    }

    #[test]
    fn retry_verdicts_and_cooldowns() {
        assert!(classify_message("Rate limit exceeded").should_retry());
        assert!(!classify_message("Unauthorized access").should_retry());
        assert_eq!(ErrorKind::ApiLimit.recovery_delay(), Duration::from_millis(5000));
        assert_eq!(ErrorKind::NetworkError.recovery_delay(), Duration::from_millis(1000));
        assert_eq!(ErrorKind::InvalidData.recovery_delay(), Duration::ZERO);
    }

    #[test]
    fn typed_store_errors_in_the_chain_win() {
        let err = AppError::ProcessFailed {
            id: "abc".into(),
            source: Box::new(AppError::NotionService {
                code: NotionErrorCode::RateLimited,
                message: "slow down".into(),
                status: 429,
            }),
        };
        assert_eq!(classify(&err), ErrorKind::ApiLimit);

        let plain = AppError::MalformedResponse("connection reset".into());
        assert_eq!(classify(&plain), ErrorKind::NetworkError);
    }
}
