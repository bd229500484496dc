use std::fmt;
use std::time::Duration;

use anyhow::Error;
use thiserror::Error;

use crate::types::CommunityId;

/// Application-level error types for dcrm-rs.
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 0: Non-error conditions (Cancelled)
/// - 1: General errors (CommunityNotFound, Resolution, Connection, JobRunning, BridgeClosed)
/// - 2: Configuration errors (InvalidConfig, AuthorNotFound)
/// - 3: Partial failure (some channels failed)
#[derive(Error, Debug, PartialEq)]
pub enum DcrmError {
    /// Configuration error (non-retryable).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The acting identity is not a member of the requested community.
    #[error("Community not found: {0}")]
    CommunityNotFound(CommunityId),

    /// Communities or channels could not be enumerated.
    #[error("Failed to resolve community: {0}")]
    Resolution(String),

    /// The target author could not be resolved to a single account.
    #[error("Target author not found: {0}")]
    AuthorNotFound(String),

    /// The client could not verify its connection.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A job is already running on this bridge.
    #[error("A deletion job is already running")]
    JobRunning,

    /// The bridge worker is gone.
    #[error("Control bridge has been shut down")]
    BridgeClosed,

    /// Operation cancelled by user.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Some channels failed during the job.
    #[error("Partial failure: {deleted} deleted, {failed} channels failed")]
    PartialFailure { deleted: u64, failed: u64 },
}

impl DcrmError {
    /// Get the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DcrmError::Cancelled => 0,
            DcrmError::InvalidConfig(_) | DcrmError::AuthorNotFound(_) => 2,
            DcrmError::PartialFailure { .. } => 3,
            _ => 1,
        }
    }
}

/// Failures reported by a chat client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Missing access: {0}")]
    Forbidden(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform refused a bulk deletion (e.g. a message past the bulk age limit).
    #[error("Bulk deletion rejected: {0}")]
    BulkDeleteRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Classification of a per-channel failure, carried in outcomes and events.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Forbidden,
    RateLimited { retry_after: Duration },
    Transport,
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::RateLimited { retry_after } => {
                write!(f, "rate limited (retry after {}ms)", retry_after.as_millis())
            }
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Classify an error raised while processing a channel.
///
/// Anything that is not an [`ApiError`] is `Unexpected`.
pub fn classify_error(e: &Error) -> ErrorKind {
    match e.downcast_ref::<ApiError>() {
        Some(ApiError::Forbidden(_)) => ErrorKind::Forbidden,
        Some(ApiError::RateLimited { retry_after }) => ErrorKind::RateLimited {
            retry_after: *retry_after,
        },
        Some(ApiError::Transport(_))
        | Some(ApiError::BulkDeleteRejected(_))
        | Some(ApiError::NotFound(_)) => ErrorKind::Transport,
        None => ErrorKind::Unexpected,
    }
}

/// Check if an anyhow::Error wraps an [`ApiError::NotFound`].
pub fn is_not_found_error(e: &Error) -> bool {
    matches!(e.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_)))
}

/// Check if an anyhow::Error wraps an [`ApiError::BulkDeleteRejected`].
pub fn is_bulk_delete_rejected_error(e: &Error) -> bool {
    matches!(
        e.downcast_ref::<ApiError>(),
        Some(ApiError::BulkDeleteRejected(_))
    )
}

/// Check if an anyhow::Error wraps a cancellation error.
pub fn is_cancelled_error(e: &Error) -> bool {
    if let Some(err) = e.downcast_ref::<DcrmError>() {
        return *err == DcrmError::Cancelled;
    }
    false
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<DcrmError>() {
        return err.exit_code();
    }
    1
}
