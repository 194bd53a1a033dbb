//! Error types for the sync layer.
//!
//! DESIGN
//! ======
//! One enum per concern: the remote record store, the board session, and
//! change-feed decoding. Each carries a grepable `E_*` code through
//! [`ErrorCode`] so the host UI can branch without matching on messages.
//!
//! None of these are fatal. Write failures are logged and counted by the
//! session; decode failures skip the offending event.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use uuid::Uuid;

/// Grepable error code plus a retry hint.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: Uuid },
    #[error("not authorized")]
    Unauthorized,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("record decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
            Self::Rejected(_) => "E_WRITE_REJECTED",
            Self::Decode(_) => "E_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("not authorized to open board {board_id}")]
    Unauthorized { board_id: Uuid },
    #[error("board not found: {0}")]
    BoardNotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("change feed closed")]
    FeedClosed,
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::BoardNotFound(_) => "E_BOARD_NOT_FOUND",
            Self::Store(e) => e.error_code(),
            Self::FeedClosed => "E_FEED_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::FeedClosed => true,
            Self::Unauthorized { .. } | Self::BoardNotFound(_) => false,
        }
    }
}

// =============================================================================
// FEED
// =============================================================================

/// A raw change payload that could not be turned into a typed event.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("{collection} delete event carries no id")]
    MissingId { collection: &'static str },
    #[error("change record decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ErrorCode for FeedError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCollection(_) => "E_UNKNOWN_COLLECTION",
            Self::UnknownOperation(_) => "E_UNKNOWN_OPERATION",
            Self::MissingId { .. } => "E_MISSING_ID",
            Self::Decode(_) => "E_DECODE",
        }
    }
}
