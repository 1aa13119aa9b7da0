//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, workspace files and
//! `CANVASS_*` environment variables, deserialized into [`CanvassConfig`].

use crate::backend::BackendConfig;
use crate::logging::{validate_logging_config, LoggingConfig};
use crate::slot::ContentSlot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvassConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Generation backend
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Extra or overriding content slots, keyed by a free-form name
    #[serde(default)]
    pub slots: HashMap<String, ContentSlot>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sled database directory, relative to the workspace root unless absolute
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".canvass/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// What happens to a batch when one backend call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFailurePolicy {
    /// Record `[LLM ERROR] <cause>` as the variant text and keep going
    #[default]
    Lenient,
    /// Abort the batch before any store mutation
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    #[serde(default)]
    pub backend_failure_policy: BackendFailurePolicy,

    /// Fixed seed for pool draws; entropy when unset
    #[serde(default)]
    pub pool_seed: Option<u64>,
}

fn default_backend_timeout_secs() -> u64 {
    120
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            backend_timeout_secs: default_backend_timeout_secs(),
            backend_failure_policy: BackendFailurePolicy::default(),
            pool_seed: None,
        }
    }
}

impl WorkflowConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Storage(String),
    Backend(String),
    Workflow(String),
    Slot(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
            ValidationError::Workflow(msg) => write!(f, "Workflow: {}", msg),
            ValidationError::Slot(name, msg) => write!(f, "Slot '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CanvassConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }

        if self.workflow.backend_timeout_secs == 0 {
            errors.push(ValidationError::Workflow(
                "backend_timeout_secs must be at least 1".to_string(),
            ));
        }

        let mut slot_ids = HashMap::new();
        for (name, slot) in &self.slots {
            if let Err(e) = slot.validate() {
                errors.push(ValidationError::Slot(name.clone(), e));
            }
            if let Some(existing) = slot_ids.insert(slot.id, name) {
                errors.push(ValidationError::Slot(
                    name.clone(),
                    format!("Duplicate slot id {} (also defined in '{}')", slot.id, existing),
                ));
            }
        }

        if let Err(e) = validate_logging_config(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Store path resolved against the workspace root
    pub fn store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.store_path.is_absolute() {
            self.storage.store_path.clone()
        } else {
            workspace_root.join(&self.storage.store_path)
        }
    }
}
