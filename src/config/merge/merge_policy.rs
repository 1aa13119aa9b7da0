//! Built-in defaults every layer overrides.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace scalar values and merge tables key by key, so a
/// workspace file can override one slot without restating the others.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.store_path", ".canvass/store")?
        .set_default("workflow.backend_timeout_secs", 120)?
        .set_default("workflow.backend_failure_policy", "lenient")?
        .set_default("logging.level", "info")?
        .set_default("logging.output", "stderr")
}
