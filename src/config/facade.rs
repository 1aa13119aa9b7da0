//! Public loading entry points.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::CanvassConfig;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the layered configuration for a workspace.
    ///
    /// Precedence (highest first): `CANVASS_*` environment, `config/{CANVASS_ENV}.toml`,
    /// `config/config.toml`, the global file, built-in defaults.
    pub fn load(workspace_root: &Path) -> Result<CanvassConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: CanvassConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            slots = config.slots.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load exactly one file over the built-in defaults
    pub fn load_from_file(path: &Path) -> Result<CanvassConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Path of the user-level configuration file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
