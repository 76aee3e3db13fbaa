//! # Sync Error Types
//!
//! Error types for the draft synchronizer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Rejected (4xx/5xx)     │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  NotFound               │ │
//! │  │  ConfigLoad/Save│  │  RemoteDisabled │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Store       │  │     Draft       │  │      Domain             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  StoreFailed    │  │  NothingToSave  │  │  Core (CoreError)       │ │
//! │  │  Serialization  │  │  AlreadyPersist.│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tavola_core::CoreError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all synchronizer failures.
///
/// ## Design Principles
/// - Each variant includes enough context for the log line
/// - Errors are categorized so the caller can decide whether to retry
/// - All errors are `Send + Sync` so they can cross the background save task
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote base URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the remote order service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// No remote base URL is configured; the terminal runs offline.
    #[error("Remote order service is not configured")]
    RemoteDisabled,

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote service answered with an error status.
    #[error("Remote service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The remote service does not know the order.
    #[error("Order not found on remote service: {0}")]
    NotFound(String),

    /// Credentials missing or refused.
    #[error("Unauthorized")]
    Unauthorized,

    /// The response body could not be read as the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// The local snapshot store failed.
    #[error("Snapshot store error: {0}")]
    StoreFailed(String),

    /// Failed to serialize a payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Draft Errors
    // =========================================================================
    /// Draft save refused: no guest has any item.
    #[error("Order {0} has no items to save")]
    NothingToSave(String),

    /// Draft save refused: the order already has a durable id.
    #[error("Order {0} is already persisted remotely")]
    AlreadyPersisted(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// An order transition was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<tavola_db::DbError> for SyncError {
    fn from(err: tavola_db::DbError) -> Self {
        SyncError::StoreFailed(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the operation may succeed when tried again later.
    ///
    /// ## Retryable Errors
    /// - Connection failures (network issues)
    /// - Timeouts
    /// - Server-side failures (5xx)
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Client errors (4xx), including unknown orders
    /// - Draft guards
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
                | SyncError::RemoteDisabled
        )
    }

    /// Returns true if the remote service was involved in the failure.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_)
                | SyncError::Timeout(_)
                | SyncError::RemoteDisabled
                | SyncError::Rejected { .. }
                | SyncError::NotFound(_)
                | SyncError::Unauthorized
                | SyncError::InvalidResponse(_)
        )
    }
}
