//! Error types for the campaign variant workflow.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Encoding error: {0}")]
    Codec(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn database(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::Database(format!("{}: {}", context, err))
    }

    pub(crate) fn codec(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::Codec(format!("{}: {}", context, err))
    }
}

/// Workflow-level errors surfaced to callers of the engine and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Entity not found: '{0}'")]
    EntityNotFound(String),

    #[error("Content slot not found: {0}")]
    SlotNotFound(u32),

    #[error("Variant {index} not found for slot {slot_id} / '{entity}'. Run regenerate first.")]
    VariantNotFound {
        slot_id: u32,
        entity: String,
        index: u32,
    },

    #[error("No finalized variant for slot {slot_id} / '{entity}'. Run finalize first.")]
    SelectionNotFound { slot_id: u32, entity: String },

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Backend not configured: {0}")]
    BackendNotConfigured(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),
}

impl ApiError {
    /// The kind of record that failed to resolve, for not-found errors.
    pub fn not_found_kind(&self) -> Option<&'static str> {
        match self {
            ApiError::EntityNotFound(_) => Some("entity"),
            ApiError::SlotNotFound(_) => Some("slot"),
            ApiError::VariantNotFound { .. } => Some("variant"),
            ApiError::SelectionNotFound { .. } => Some("selection"),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.not_found_kind().is_some()
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
