//! Variant Workflow Engine
//!
//! Drafts, lists and finalizes text variants per (content slot, target entity).
//! `regenerate` produces a fresh batch of three and overwrites whatever was stored;
//! `finalize` re-affirms one stored variant and marks it canonical without ever
//! calling the backend.

use crate::artifact::ArtifactBundle;
use crate::backend::{GenerationBackend, LLM_ERROR_PREFIX};
use crate::concurrency::KeyLockManager;
use crate::config::{BackendFailurePolicy, WorkflowConfig};
use crate::directory::{resolve_context, CampaignDirectory, EntityRecord};
use crate::error::ApiError;
use crate::prompt::{normalize_completion, render_template};
use crate::similarity::pick_unique;
use crate::slot::{load_pool, ContentSlot, SlotRegistry, SlotSource};
use crate::store::{FinalizedSelection, Variant, VariantStore};
use crate::types::{SlotId, VariantIndex, VariantKey, VARIANTS_PER_BATCH};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of "now" for variant and selection timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Engine knobs taken from `[workflow]`
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub backend_timeout: Duration,
    pub failure_policy: BackendFailurePolicy,
    pub pool_seed: Option<u64>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        WorkflowSettings::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            backend_timeout: config.backend_timeout(),
            failure_policy: config.backend_failure_policy,
            pool_seed: config.pool_seed,
        }
    }
}

/// Outcome of one regeneration
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub key: VariantKey,
    pub entity_name: String,
    pub theme: String,
    pub rationale: String,
    /// Stored variants, indices 1..=len
    pub variants: Vec<Variant>,
    /// Positions whose backend call failed (lenient policy only)
    pub failed: usize,
    /// Pool ran out of sufficiently distinct candidates
    pub short_batch: bool,
}

/// Outcome of one finalization
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedResult {
    pub key: VariantKey,
    pub variant: Variant,
    pub selection: FinalizedSelection,
}

/// Lifecycle position of one (slot, entity) key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum KeyState {
    Empty,
    Drafted { count: usize },
    Finalized { index: VariantIndex, count: usize },
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Empty => write!(f, "empty"),
            KeyState::Drafted { count } => write!(f, "drafted ({} variants)", count),
            KeyState::Finalized { index, count } => {
                write!(f, "finalized (variant {} of {})", index, count)
            }
        }
    }
}

/// What a request asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMode", into = "RawMode")]
pub enum WorkflowMode {
    Regenerate,
    Finalize(VariantIndex),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMode {
    Index(i64),
    Text(String),
}

impl FromStr for WorkflowMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = s.trim().to_lowercase();
        if mode == "r" || mode == "regenerate" {
            return Ok(WorkflowMode::Regenerate);
        }
        match mode.parse::<VariantIndex>() {
            Ok(index) if index > 0 => Ok(WorkflowMode::Finalize(index)),
            _ => Err(ApiError::InvalidRequest(format!(
                "mode must be 'regenerate' or a variant index >= 1, got '{}'",
                s.trim()
            ))),
        }
    }
}

impl TryFrom<RawMode> for WorkflowMode {
    type Error = ApiError;

    fn try_from(raw: RawMode) -> Result<Self, Self::Error> {
        match raw {
            RawMode::Text(text) => text.parse(),
            RawMode::Index(index) => match VariantIndex::try_from(index) {
                Ok(index) if index > 0 => Ok(WorkflowMode::Finalize(index)),
                _ => Err(ApiError::InvalidRequest(format!(
                    "variant index must be >= 1, got {}",
                    index
                ))),
            },
        }
    }
}

impl From<WorkflowMode> for RawMode {
    fn from(mode: WorkflowMode) -> Self {
        match mode {
            WorkflowMode::Regenerate => RawMode::Text("regenerate".to_string()),
            WorkflowMode::Finalize(index) => RawMode::Index(i64::from(index)),
        }
    }
}

/// Immutable per-call request record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub slot_id: SlotId,
    pub entity_key: String,
    pub mode: WorkflowMode,
}

impl WorkflowRequest {
    pub fn new(slot_id: SlotId, entity_key: impl Into<String>, mode: WorkflowMode) -> Self {
        Self {
            slot_id,
            entity_key: entity_key.into(),
            mode,
        }
    }
}

/// Result of dispatching a [`WorkflowRequest`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum WorkflowOutcome {
    Drafted(BatchResult),
    Finalized(FinalizedResult),
}

/// The workflow engine
pub struct VariantWorkflow {
    slots: SlotRegistry,
    directory: Arc<dyn CampaignDirectory + Send + Sync>,
    store: Arc<dyn VariantStore + Send + Sync>,
    backend: Arc<dyn GenerationBackend>,
    lock_manager: KeyLockManager,
    settings: WorkflowSettings,
    rng: Mutex<StdRng>,
    clock: Clock,
}

impl VariantWorkflow {
    pub fn new(
        slots: SlotRegistry,
        directory: Arc<dyn CampaignDirectory + Send + Sync>,
        store: Arc<dyn VariantStore + Send + Sync>,
        backend: Arc<dyn GenerationBackend>,
        settings: WorkflowSettings,
    ) -> Self {
        let rng = match settings.pool_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            slots,
            directory,
            store,
            backend,
            lock_manager: KeyLockManager::new(),
            settings,
            rng: Mutex::new(rng),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn slots(&self) -> Vec<&ContentSlot> {
        self.slots.list()
    }

    pub fn slot(&self, slot_id: SlotId) -> Result<&ContentSlot, ApiError> {
        self.slots.get(slot_id)
    }

    pub fn entities(&self) -> Result<Vec<EntityRecord>, ApiError> {
        Ok(self.directory.list_entities()?)
    }

    /// Produce a fresh batch for the key, replacing every stored variant.
    pub async fn regenerate(
        &self,
        slot_id: SlotId,
        entity_key: &str,
    ) -> Result<BatchResult, ApiError> {
        let slot = self.slots.get(slot_id)?.clone();
        let context = resolve_context(self.directory.as_ref(), entity_key)?;
        let key = VariantKey::new(slot_id, &context.entity_name);
        let rationale = render_template(slot.rationale_template(), &context);

        debug!(key = %key, theme = %slot.theme, kind = slot.kind_name(), "Regenerating variants");

        let (texts, failed, source) = match &slot.source {
            SlotSource::Generated { template, .. } => {
                let prompt = render_template(template, &context);
                let (texts, failed) = self.generate_batch(&key, &prompt).await?;
                (texts, failed, format!("generated:{}", self.backend.name()))
            }
            SlotSource::Pool {
                pool_file,
                similarity_threshold,
                max_draws,
                ..
            } => {
                let pool = load_pool(pool_file)?;
                let picks = {
                    let mut rng = self.rng.lock();
                    pick_unique(
                        &pool,
                        VARIANTS_PER_BATCH,
                        *similarity_threshold,
                        *max_draws,
                        &mut *rng,
                    )
                };
                let file_name = pool_file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| pool_file.display().to_string());
                (picks, 0, format!("pool:{}", file_name))
            }
        };

        let now = (self.clock)();
        let variants: Vec<Variant> = texts
            .into_iter()
            .zip(1..)
            .map(|(text, index)| Variant {
                index,
                text,
                rationale: rationale.clone(),
                created_at: now,
                source: source.clone(),
                theme: slot.theme.clone(),
                entity_name: context.entity_name.clone(),
            })
            .collect();

        self.with_key_lock(&key, || Ok(self.store.replace_all(&key, &variants)?))?;

        let short_batch = variants.len() < VARIANTS_PER_BATCH;
        if short_batch {
            warn!(key = %key, count = variants.len(), "Pool exhausted before a full batch");
        }
        info!(
            key = %key,
            count = variants.len(),
            failed,
            source = %source,
            "Variants regenerated"
        );

        Ok(BatchResult {
            key,
            entity_name: context.entity_name,
            theme: slot.theme,
            rationale,
            variants,
            failed,
            short_batch,
        })
    }

    async fn generate_batch(
        &self,
        key: &VariantKey,
        prompt: &str,
    ) -> Result<(Vec<String>, usize), ApiError> {
        let mut texts = Vec::with_capacity(VARIANTS_PER_BATCH);
        let mut failed = 0;
        for position in 1..=VARIANTS_PER_BATCH {
            match self.generate_once(prompt).await {
                Ok(raw) => texts.push(normalize_completion(&raw)),
                Err(err) => match self.settings.failure_policy {
                    BackendFailurePolicy::Strict => {
                        warn!(key = %key, position, error = %err, "Generation failed, batch aborted");
                        return Err(err);
                    }
                    BackendFailurePolicy::Lenient => {
                        warn!(key = %key, position, error = %err, "Generation failed, recording error text");
                        failed += 1;
                        texts.push(format!("{} {}", LLM_ERROR_PREFIX, backend_cause(&err)));
                    }
                },
            }
        }
        Ok((texts, failed))
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, ApiError> {
        match tokio::time::timeout(self.settings.backend_timeout, self.backend.generate(prompt))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::BackendError(format!(
                "Generation timed out after {}s",
                self.settings.backend_timeout.as_secs_f64()
            ))),
        }
    }

    /// Stored variants for the key in ascending index order; empty when none exist.
    pub fn list_variants(&self, slot_id: SlotId, entity_key: &str) -> Result<Vec<Variant>, ApiError> {
        self.slots.get(slot_id)?;
        let key = VariantKey::new(slot_id, entity_key);
        Ok(self.store.list(&key)?)
    }

    /// Re-affirm the stored variant at `index` as the canonical pick.
    ///
    /// Idempotent apart from the timestamp. Sibling variants stay in place.
    pub fn finalize(
        &self,
        slot_id: SlotId,
        entity_key: &str,
        index: VariantIndex,
    ) -> Result<FinalizedResult, ApiError> {
        self.slots.get(slot_id)?;
        let entity = self
            .directory
            .find_entity(entity_key)?
            .ok_or_else(|| ApiError::EntityNotFound(entity_key.trim().to_string()))?;
        let key = VariantKey::new(slot_id, &entity.name);

        let (variant, selection) = self.with_key_lock(&key, || {
            let stored = self
                .store
                .get(&key, index)?
                .ok_or_else(|| ApiError::VariantNotFound {
                    slot_id,
                    entity: entity.name.clone(),
                    index,
                })?;

            let now = (self.clock)();
            let variant = Variant {
                created_at: now,
                ..stored
            };
            let selection = FinalizedSelection {
                index,
                finalized_at: now,
            };
            self.store.reaffirm(&key, &variant, &selection)?;
            Ok((variant, selection))
        })?;

        info!(key = %key, index, "Variant finalized");
        Ok(FinalizedResult {
            key,
            variant,
            selection,
        })
    }

    /// Run `f` under the write lock for `key`, then let the lock table drop the
    /// entry if no other caller is waiting on it.
    fn with_key_lock<T>(
        &self,
        key: &VariantKey,
        f: impl FnOnce() -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let result = {
            let lock = self.lock_manager.get_lock(key);
            let _guard = lock.write();
            f()
        };
        self.lock_manager.release(key);
        result
    }

    /// Dispatch an operator request to regenerate or finalize
    pub async fn run(&self, request: &WorkflowRequest) -> Result<WorkflowOutcome, ApiError> {
        match request.mode {
            WorkflowMode::Regenerate => self
                .regenerate(request.slot_id, &request.entity_key)
                .await
                .map(WorkflowOutcome::Drafted),
            WorkflowMode::Finalize(index) => self
                .finalize(request.slot_id, &request.entity_key, index)
                .map(WorkflowOutcome::Finalized),
        }
    }

    pub fn state(&self, slot_id: SlotId, entity_key: &str) -> Result<KeyState, ApiError> {
        let variants = self.list_variants(slot_id, entity_key)?;
        if variants.is_empty() {
            return Ok(KeyState::Empty);
        }
        let key = VariantKey::new(slot_id, entity_key);
        let count = variants.len();
        match self.store.selection(&key)? {
            Some(selection) if variants.iter().any(|v| v.index == selection.index) => {
                Ok(KeyState::Finalized {
                    index: selection.index,
                    count,
                })
            }
            _ => Ok(KeyState::Drafted { count }),
        }
    }

    /// Rationale of the most recently written variant, if any
    pub fn rationale(&self, slot_id: SlotId, entity_key: &str) -> Result<Option<String>, ApiError> {
        let variants = self.list_variants(slot_id, entity_key)?;
        Ok(variants
            .into_iter()
            .max_by_key(|v| v.created_at)
            .map(|v| v.rationale))
    }

    /// Everything a renderer needs for a finalized key
    pub fn finalized_bundle(
        &self,
        slot_id: SlotId,
        entity_key: &str,
    ) -> Result<ArtifactBundle, ApiError> {
        let slot = self.slots.get(slot_id)?;
        let context = resolve_context(self.directory.as_ref(), entity_key)?;
        let key = VariantKey::new(slot_id, &context.entity_name);
        let not_finalized = || ApiError::SelectionNotFound {
            slot_id,
            entity: context.entity_name.clone(),
        };

        let selection = self.store.selection(&key)?.ok_or_else(not_finalized)?;
        let variant = self
            .store
            .get(&key, selection.index)?
            .ok_or_else(not_finalized)?;
        Ok(ArtifactBundle::new(slot, context.clone(), variant, selection))
    }
}

fn backend_cause(err: &ApiError) -> String {
    match err {
        ApiError::BackendError(cause) => cause.clone(),
        other => other.to_string(),
    }
}
