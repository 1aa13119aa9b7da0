//! Content slots: the kinds of generated text the workflow can produce.

use crate::error::ApiError;
use crate::similarity::{DEFAULT_MAX_DRAWS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::types::SlotId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const CALL_TO_VOTE_SLOT: SlotId = 4;
pub const SLOGAN_SLOT: SlotId = 6;

const CALL_TO_VOTE_TEMPLATE: &str = "Write a motivating call-to-action campaign message for voters in {entity}.
It should inspire them to vote and support {candidate} from {party}.
Use the following format:
- Campaign Slogan
- 3-4 line paragraph
- 3 bullet points (why voting matters)
- Powerful closing vote appeal
Candidate SWOT: {swot}
Sentiment: {sentiment}";

const CALL_TO_VOTE_RATIONALE: &str = "Call to action for voters in {entity}, urging participation and civic duty. Sentiment: {sentiment}. SWOT: {swot}.";

const SLOGAN_RATIONALE: &str =
    "Slogans selected from curated pool based on uniqueness and top issue: {top_issue}.";

/// Where a slot's variants come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SlotSource {
    /// Backend completion of a rendered prompt, once per variant
    Generated { template: String, rationale: String },
    /// Random, mutually dissimilar picks from a fixed pool file
    Pool {
        pool_file: PathBuf,
        rationale: String,
        #[serde(default = "default_similarity_threshold")]
        similarity_threshold: f64,
        #[serde(default = "default_max_draws")]
        max_draws: usize,
    },
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_max_draws() -> usize {
    DEFAULT_MAX_DRAWS
}

/// A parameterized kind of generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSlot {
    pub id: SlotId,
    pub theme: String,
    /// Short menu label; defaults to the theme
    #[serde(default)]
    pub label: Option<String>,
    pub source: SlotSource,
}

impl ContentSlot {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.theme)
    }

    pub fn rationale_template(&self) -> &str {
        match &self.source {
            SlotSource::Generated { rationale, .. } => rationale,
            SlotSource::Pool { rationale, .. } => rationale,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.source {
            SlotSource::Generated { .. } => "generated",
            SlotSource::Pool { .. } => "pool",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.theme.trim().is_empty() {
            return Err("Theme cannot be empty".to_string());
        }
        match &self.source {
            SlotSource::Generated { template, .. } => {
                if template.trim().is_empty() {
                    return Err("Template cannot be empty".to_string());
                }
            }
            SlotSource::Pool {
                pool_file,
                similarity_threshold,
                max_draws,
                ..
            } => {
                if pool_file.as_os_str().is_empty() {
                    return Err("Pool file cannot be empty".to_string());
                }
                if !(*similarity_threshold > 0.0 && *similarity_threshold <= 1.0) {
                    return Err(format!(
                        "Similarity threshold must be in (0, 1], got {}",
                        similarity_threshold
                    ));
                }
                if *max_draws == 0 {
                    return Err("max_draws must be at least 1".to_string());
                }
            }
        }
        Ok(())
    }

    fn call_to_vote() -> Self {
        Self {
            id: CALL_TO_VOTE_SLOT,
            theme: "Call to Vote".to_string(),
            label: Some("Call to Action".to_string()),
            source: SlotSource::Generated {
                template: CALL_TO_VOTE_TEMPLATE.to_string(),
                rationale: CALL_TO_VOTE_RATIONALE.to_string(),
            },
        }
    }

    fn slogan() -> Self {
        Self {
            id: SLOGAN_SLOT,
            theme: "Slogan Generator".to_string(),
            label: Some("Slogans".to_string()),
            source: SlotSource::Pool {
                pool_file: PathBuf::from("data/slogan_pool.json"),
                rationale: SLOGAN_RATIONALE.to_string(),
                similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
                max_draws: DEFAULT_MAX_DRAWS,
            },
        }
    }
}

/// Content slots by id
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    slots: BTreeMap<SlotId, ContentSlot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in call-to-vote and slogan slots
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ContentSlot::call_to_vote());
        registry.register(ContentSlot::slogan());
        registry
    }

    /// Built-in slots overlaid with configured ones (same id replaces).
    ///
    /// Relative pool files are resolved against `base_dir`.
    pub fn from_config(slots: &HashMap<String, ContentSlot>, base_dir: &Path) -> Self {
        let mut registry = Self::with_defaults();
        for slot in slots.values() {
            registry.register(slot.clone());
        }
        for slot in registry.slots.values_mut() {
            if let SlotSource::Pool { pool_file, .. } = &mut slot.source {
                if pool_file.is_relative() {
                    *pool_file = base_dir.join(&*pool_file);
                }
            }
        }
        registry
    }

    pub fn register(&mut self, slot: ContentSlot) {
        self.slots.insert(slot.id, slot);
    }

    pub fn get(&self, id: SlotId) -> Result<&ContentSlot, ApiError> {
        self.slots.get(&id).ok_or(ApiError::SlotNotFound(id))
    }

    /// Slots in ascending id order
    pub fn list(&self) -> Vec<&ContentSlot> {
        self.slots.values().collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PoolEntry {
    Text(String),
    Object { text: String },
}

/// Load a candidate pool: a JSON array of strings or of `{"text": ...}` objects
pub fn load_pool(path: &Path) -> Result<Vec<String>, ApiError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApiError::ConfigError(format!("Failed to read pool file {}: {}", path.display(), e))
    })?;
    let entries: Vec<PoolEntry> = serde_json::from_str(&raw).map_err(|e| {
        ApiError::ConfigError(format!("Invalid pool file {}: {}", path.display(), e))
    })?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            PoolEntry::Text(text) | PoolEntry::Object { text } => text,
        })
        .collect())
}
