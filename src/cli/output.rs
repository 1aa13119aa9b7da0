//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e.not_found_kind() {
        Some(kind) => format!("Not found ({}): {}", kind, e),
        None => e.to_string(),
    }
}

/// Process exit code per error category
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        _ if e.is_not_found() => 2,
        ApiError::InvalidRequest(_) => 64,
        ApiError::BackendError(_) | ApiError::BackendNotConfigured(_) => 69,
        ApiError::StorageError(_) | ApiError::RenderFailed(_) => 74,
        ApiError::ConfigError(_) => 78,
        _ => 1,
    }
}
