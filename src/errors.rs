// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Error taxonomy with transient/critical classification for retry decisions
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Coarse failure classification driving retry and backoff policy.
///
/// Transient errors are retried locally and never surface to detection
/// logic; Critical errors are reported once and not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timeouts, connection reset/refused, 429/502/503/504
    Transient,
    /// 500/501/401/403 and anything unclassified
    Critical,
}

impl ErrorKind {
    /// Classify an HTTP status code. Statuses outside the overload/failure
    /// set return None: a 404 page is a response, not an engine failure.
    pub fn from_status(status: u16) -> Option<ErrorKind> {
        match status {
            429 | 502 | 503 | 504 => Some(ErrorKind::Transient),
            500 | 501 | 401 | 403 => Some(ErrorKind::Critical),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Request to {url} failed ({kind}): {reason}")]
    Request {
        url: String,
        kind: ErrorKind,
        reason: String,
    },

    #[error("Request to {url} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported scan type: {0}")]
    UnsupportedScanType(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scan aborted: {0}")]
    ScanAborted(String),
}

impl ScannerError {
    /// The transient/critical kind behind this error, where one applies
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScannerError::Request { kind, .. } => *kind,
            ScannerError::Timeout { .. } => ErrorKind::Transient,
            ScannerError::RetriesExhausted { .. } => ErrorKind::Transient,
            _ => ErrorKind::Critical,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ScannerError::Timeout { .. })
    }
}

/// Classify a reqwest failure into the transient/critical taxonomy
pub fn classify_reqwest_error(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        return ErrorKind::Transient;
    }
    if err.is_connect() {
        // Covers refused, reset and unreachable peers
        return ErrorKind::Transient;
    }
    if let Some(status) = err.status() {
        return ErrorKind::from_status(status.as_u16()).unwrap_or(ErrorKind::Critical);
    }
    ErrorKind::Critical
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_status(429), Some(ErrorKind::Transient));
        assert_eq!(ErrorKind::from_status(502), Some(ErrorKind::Transient));
        assert_eq!(ErrorKind::from_status(503), Some(ErrorKind::Transient));
        assert_eq!(ErrorKind::from_status(504), Some(ErrorKind::Transient));
        assert_eq!(ErrorKind::from_status(500), Some(ErrorKind::Critical));
        assert_eq!(ErrorKind::from_status(501), Some(ErrorKind::Critical));
        assert_eq!(ErrorKind::from_status(401), Some(ErrorKind::Critical));
        assert_eq!(ErrorKind::from_status(403), Some(ErrorKind::Critical));
        assert_eq!(ErrorKind::from_status(200), None);
        assert_eq!(ErrorKind::from_status(302), None);
    }

    #[test]
    fn plain_client_errors_are_responses_not_failures() {
        assert_eq!(ErrorKind::from_status(404), None);
        assert_eq!(ErrorKind::from_status(418), None);
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(!ErrorKind::Critical.is_retryable());
    }

    #[test]
    fn timeout_error_is_transient() {
        let err = ScannerError::Timeout {
            duration: Duration::from_secs(15),
        };
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_timeout());
    }
}
