//! Shared test utilities for integration tests
//!
//! Scripted generation backend, seeded campaign directory and workflow fixtures.

use async_trait::async_trait;
use canvass::backend::GenerationBackend;
use canvass::directory::persistence::{DirectorySeed, SledCampaignDirectory};
use canvass::directory::{CandidateRecord, EntityKind, EntityProfile, IssueMention, SentimentRow};
use canvass::error::ApiError;
use canvass::slot::{ContentSlot, SlotRegistry, SlotSource, SLOGAN_SLOT};
use canvass::store::SledVariantStore;
use canvass::workflow::{VariantWorkflow, WorkflowSettings};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with XDG_CONFIG_HOME pointed into `test_dir` and CANVASS_ENV unset,
/// restoring the previous values afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ["XDG_CONFIG_HOME", "CANVASS_ENV"]
        .iter()
        .map(|k| (*k, std::env::var(k).ok()))
        .collect();

    let config_home = test_dir.path().join("xdg-config");
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.to_str().unwrap());
    std::env::remove_var("CANVASS_ENV");

    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Backend answering from a script; once exhausted it returns "Variant <n>"
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Every call sleeps before answering
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(cause)) => Err(ApiError::BackendError(cause)),
            None => Ok(format!("Variant {}", call)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub const SLOGANS: &[&str] = &[
    "Water for every field, work for every hand",
    "Your vote, your village, your voice",
    "Roads that reach every doorstep",
    "Clean water today, healthy children tomorrow",
    "Jobs at home, not journeys away",
    "Fair prices for the farmer who feeds us",
    "Schools that open doors, not close them",
    "Power in every home, light in every lane",
];

pub fn mandya_seed() -> DirectorySeed {
    DirectorySeed {
        entities: vec![
            EntityProfile {
                name: "Mandya".to_string(),
                code: "KA-186".to_string(),
                kind: EntityKind::Constituency,
                candidates: vec![
                    CandidateRecord {
                        candidate_id: Some("C-101".to_string()),
                        name: "Opponent Gowda".to_string(),
                        party: "Rival Front".to_string(),
                        caste: None,
                        religion: None,
                        age: None,
                        gender: None,
                        education: None,
                        profession: None,
                        swot: None,
                        is_opponent: true,
                    },
                    CandidateRecord {
                        candidate_id: Some("C-102".to_string()),
                        name: "Lakshmi Rao".to_string(),
                        party: "People's Alliance".to_string(),
                        caste: Some("Vokkaliga".to_string()),
                        religion: Some("Hindu".to_string()),
                        age: Some(46),
                        gender: Some("Female".to_string()),
                        education: Some("M.Sc. Agriculture".to_string()),
                        profession: Some("Agronomist".to_string()),
                        swot: Some("Strong farmer outreach.".to_string()),
                        is_opponent: false,
                    },
                ],
                sentiment: Some(SentimentRow {
                    avg_sentiment_score: 0.2144,
                    positive_pct: 0.5834,
                    negative_pct: 0.17,
                }),
                issues: vec![
                    IssueMention {
                        issue: "roads".to_string(),
                        post_count: 120,
                    },
                    IssueMention {
                        issue: "irrigation".to_string(),
                        post_count: 412,
                    },
                ],
            },
            EntityProfile {
                name: "Hassan".to_string(),
                code: "KA-193".to_string(),
                kind: EntityKind::Constituency,
                candidates: vec![],
                sentiment: None,
                issues: vec![],
            },
        ],
    }
}

pub fn write_pool(dir: &Path, file: &str, entries: &[&str]) {
    let json: Vec<serde_json::Value> = entries
        .iter()
        .map(|text| serde_json::json!({ "text": text }))
        .collect();
    std::fs::write(dir.join(file), serde_json::to_string(&json).unwrap()).unwrap();
}

/// Slot registry whose slogan slot reads `<base_dir>/<pool_file>`
pub fn registry_with_pool(base_dir: &Path, pool_file: &str) -> SlotRegistry {
    let mut configured = HashMap::new();
    configured.insert(
        "slogan".to_string(),
        ContentSlot {
            id: SLOGAN_SLOT,
            theme: "Slogan Generator".to_string(),
            label: Some("Slogans".to_string()),
            source: SlotSource::Pool {
                pool_file: pool_file.into(),
                rationale:
                    "Slogans selected from curated pool based on uniqueness and top issue: {top_issue}."
                        .to_string(),
                similarity_threshold: 0.6,
                max_draws: 100,
            },
        },
    );
    SlotRegistry::from_config(&configured, base_dir)
}

pub struct Fixture {
    pub dir: TempDir,
    pub workflow: VariantWorkflow,
    pub store: Arc<SledVariantStore>,
}

pub fn settings(seed: u64) -> WorkflowSettings {
    WorkflowSettings {
        pool_seed: Some(seed),
        ..WorkflowSettings::default()
    }
}

/// Seeded directory, a slogan pool and a fresh sled store in a temp dir
pub fn fixture(backend: Arc<dyn GenerationBackend>, settings: WorkflowSettings) -> Fixture {
    fixture_with_pool(SLOGANS, backend, settings)
}

pub fn fixture_with_pool(
    pool: &[&str],
    backend: Arc<dyn GenerationBackend>,
    settings: WorkflowSettings,
) -> Fixture {
    let dir = TempDir::new().unwrap();
    write_pool(dir.path(), "slogans.json", pool);
    let registry = registry_with_pool(dir.path(), "slogans.json");

    let db = sled::open(dir.path().join("store")).unwrap();
    let directory = SledCampaignDirectory::from_db(&db).unwrap();
    directory.import(&mandya_seed()).unwrap();
    let store = Arc::new(SledVariantStore::from_db(&db).unwrap());
    let workflow = VariantWorkflow::new(
        registry,
        Arc::new(directory),
        store.clone(),
        backend,
        settings,
    );
    Fixture {
        dir,
        workflow,
        store,
    }
}
