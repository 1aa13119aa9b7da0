//! CLI route: single route table and run context. Dispatches to the workflow engine and presentation.

use crate::artifact::{write_artifact, ArtifactRenderer, JsonBundleRenderer, TextCardRenderer};
use crate::backend::BackendFactory;
use crate::config::{CanvassConfig, ConfigLoader};
use crate::directory::persistence::{load_seed_file, SledCampaignDirectory};
use crate::error::{ApiError, StorageError};
use crate::slot::SlotRegistry;
use crate::store::SledVariantStore;
use crate::workflow::{VariantWorkflow, WorkflowMode, WorkflowRequest, WorkflowSettings};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::cli::{command_name, uses_backend};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_batch, format_entities, format_export_summary, format_finalized, format_outcome,
    format_seed_summary, format_slots, format_state, format_variant_list, pick_item_label,
};

/// Runtime context for CLI execution: workspace, config, and the workflow engine.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workflow: VariantWorkflow,
    directory: Arc<SledCampaignDirectory>,
    workspace_root: PathBuf,
    store_path: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: CanvassConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let store_path = config.store_path(&workspace_root);
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let db = sled::open(&store_path)
            .map_err(|e| StorageError::database("Failed to open sled database", e))?;

        let directory = Arc::new(SledCampaignDirectory::from_db(&db)?);
        let store = Arc::new(SledVariantStore::from_db(&db)?);
        let backend = BackendFactory::create(&config.backend)?;
        let slots = SlotRegistry::from_config(&config.slots, &workspace_root);

        let workflow = VariantWorkflow::new(
            slots,
            directory.clone(),
            store,
            backend,
            WorkflowSettings::from(&config.workflow),
        );
        debug!(store = %store_path.display(), "Run context ready");

        Ok(Self {
            workflow,
            directory,
            workspace_root,
            store_path,
        })
    }

    pub fn workflow(&self) -> &VariantWorkflow {
        &self.workflow
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, backend = uses_backend(command), "Command started");
        let result = self.execute_inner(command);
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Slots { format } => format_slots(&self.workflow.slots(), format),
            Commands::Entities { format } => format_entities(&self.workflow.entities()?, format),
            Commands::Seed { file } => {
                let seed = load_seed_file(file)?;
                let imported = self.directory.import(&seed)?;
                Ok(format_seed_summary(imported, file))
            }
            Commands::Regenerate {
                slot,
                entity,
                format,
            } => {
                let batch = block_on(self.workflow.regenerate(*slot, entity))??;
                format_batch(&batch, format)
            }
            Commands::Variants {
                slot,
                entity,
                format,
            } => {
                let variants = self.workflow.list_variants(*slot, entity)?;
                let rationale = self.workflow.rationale(*slot, entity)?;
                let state = self.workflow.state(*slot, entity)?;
                format_variant_list(&variants, rationale.as_deref(), state, format)
            }
            Commands::Finalize {
                slot,
                entity,
                index,
                format,
            } => {
                let result = self.workflow.finalize(*slot, entity, *index)?;
                format_finalized(&result, format)
            }
            Commands::Pick { slot, entity } => self.handle_pick(*slot, entity),
            Commands::Run {
                slot,
                entity,
                mode,
                format,
            } => {
                let mode: WorkflowMode = mode.parse()?;
                let request = WorkflowRequest::new(*slot, entity.clone(), mode);
                let outcome = block_on(self.workflow.run(&request))??;
                format_outcome(&outcome, format)
            }
            Commands::Status {
                slot,
                entity,
                format,
            } => {
                let state = self.workflow.state(*slot, entity)?;
                format_state(*slot, entity, state, format)
            }
            Commands::Export {
                slot,
                entity,
                output,
                format,
            } => self.handle_export(*slot, entity, output.as_deref(), format),
        }
    }

    fn handle_pick(&self, slot_id: u32, entity: &str) -> Result<String, ApiError> {
        use dialoguer::Select;

        let variants = self.workflow.list_variants(slot_id, entity)?;
        if variants.is_empty() {
            return Err(ApiError::VariantNotFound {
                slot_id,
                entity: entity.trim().to_string(),
                index: 1,
            });
        }
        let mut prompt = format!("Choose the final text for {}", entity.trim());
        if let Some(rationale) = self.workflow.rationale(slot_id, entity)? {
            prompt.push_str(&format!(" ({})", rationale));
        }
        let items: Vec<String> = variants.iter().map(pick_item_label).collect();

        let selection = Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to get user input: {}", e)))?;
        let chosen = variants
            .get(selection)
            .ok_or_else(|| ApiError::InvalidRequest(format!("No variant at position {}", selection)))?;

        let result = self.workflow.finalize(slot_id, entity, chosen.index)?;
        format_finalized(&result, "text")
    }

    fn handle_export(
        &self,
        slot_id: u32,
        entity: &str,
        output: Option<&Path>,
        format: &str,
    ) -> Result<String, ApiError> {
        let renderer: Box<dyn ArtifactRenderer> = match format {
            "json" => Box::new(JsonBundleRenderer { pretty: true }),
            "text" => Box::new(TextCardRenderer),
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "Unknown export format '{}' (expected json or text)",
                    other
                )))
            }
        };
        let bundle = self.workflow.finalized_bundle(slot_id, entity)?;
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self
                .workspace_root
                .join(format!("{}.{}", bundle.file_stem(), renderer.extension())),
        };
        let written = write_artifact(renderer.as_ref(), &bundle, &path)?;
        Ok(format_export_summary(&written, bundle.selection.index))
    }
}

/// Drive one async workflow call on a runtime built for this command.
fn block_on<F: Future>(future: F) -> Result<F::Output, ApiError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ApiError::BackendError(format!("Failed to create runtime: {}", e)))?;
    Ok(rt.block_on(future))
}
