//! Error types for Folio

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using Folio's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Folio error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors (E001-E099)
    #[error("Post '{0}' not found. Run `folio posts show <id>` with an existing post id.")]
    ContentNotFound(Uuid),

    #[error("Version {version} of post '{content_id}' not found. Run `folio versions list {content_id}` to see all versions.")]
    VersionNotFound { content_id: Uuid, version: i64 },

    #[error("Version '{version_id}' does not belong to post '{content_id}'. Run `folio versions list {content_id}` to see all versions.")]
    VersionIdNotFound { content_id: Uuid, version_id: Uuid },

    // Concurrency errors (E100-E199)
    #[error("Version number allocation for post '{content_id}' collided {attempts} times. Try again.")]
    Conflict { content_id: Uuid, attempts: u32 },

    #[error("Transaction failed and was rolled back: {0}")]
    TransactionFailed(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentNotFound(_) => "E001",
            Self::VersionNotFound { .. } => "E002",
            Self::VersionIdNotFound { .. } => "E003",
            Self::Conflict { .. } => "E100",
            Self::TransactionFailed(_) => "E101",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Parse(_) => "E801",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::VersionNotFound { content_id, .. } | Self::VersionIdNotFound { content_id, .. } => {
                Some(format!("folio versions list {}", content_id))
            }
            Self::Conflict { .. } => Some("Retry the operation".to_string()),
            Self::ConfigError(_) => Some("folio config list".to_string()),
            _ => None,
        }
    }

    /// Whether the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether this error means a post or version does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContentNotFound(_) | Self::VersionNotFound { .. } | Self::VersionIdNotFound { .. }
        )
    }
}
