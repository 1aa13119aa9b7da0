//! Campaign Directory
//!
//! Read-only view of target entities (constituencies and voters), their candidates,
//! sentiment and issue rows, plus context resolution for prompt rendering.
//! Missing candidate or sentiment data is not an error: deterministic placeholders
//! keep regeneration usable for entities that are still being onboarded.

pub mod persistence;

pub use persistence::{load_seed_file, DirectorySeed, SledCampaignDirectory};

use crate::error::{ApiError, StorageError};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_CANDIDATE: &str = "Candidate X";
pub const PLACEHOLDER_PARTY: &str = "Party X";
pub const PLACEHOLDER_SWOT: &str = "Trusted and visionary.";
pub const DEFAULT_TOP_ISSUE: &str = "development";
pub const NEUTRAL_SENTIMENT: &str = "Neutral";

/// Kind of target entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Constituency,
    Voter,
}

/// Candidate row as held by the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub candidate_id: Option<String>,
    pub name: String,
    pub party: String,
    #[serde(default)]
    pub caste: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub swot: Option<String>,
    #[serde(default)]
    pub is_opponent: bool,
}

/// Aggregated sentiment; percentages are fractions in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentRow {
    pub avg_sentiment_score: f64,
    pub positive_pct: f64,
    pub negative_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueMention {
    pub issue: String,
    pub post_count: u64,
}

/// One directory entry: the entity together with its related rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub sentiment: Option<SentimentRow>,
    #[serde(default)]
    pub issues: Vec<IssueMention>,
}

/// Resolved identity of a target entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub code: String,
    pub kind: EntityKind,
}

impl From<&EntityProfile> for EntityRecord {
    fn from(profile: &EntityProfile) -> Self {
        EntityRecord {
            name: profile.name.clone(),
            code: profile.code.clone(),
            kind: profile.kind,
        }
    }
}

/// Read interface to the entity/candidate/sentiment store
pub trait CampaignDirectory {
    /// Case-insensitive exact match on the natural name.
    fn find_entity(&self, key: &str) -> Result<Option<EntityRecord>, StorageError>;

    /// First non-opponent candidate for the entity, if any.
    fn active_candidate(
        &self,
        entity: &EntityRecord,
    ) -> Result<Option<CandidateRecord>, StorageError>;

    fn sentiment(&self, entity: &EntityRecord) -> Result<Option<SentimentRow>, StorageError>;

    /// Issue with the highest mention count, if any.
    fn top_issue(&self, entity: &EntityRecord) -> Result<Option<String>, StorageError>;

    fn list_entities(&self) -> Result<Vec<EntityRecord>, StorageError>;
}

/// Candidate identity used in prompts; placeholder values when none is on file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: Option<String>,
    pub name: String,
    pub party: String,
    pub swot: String,
    pub caste: Option<String>,
    pub religion: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub education: Option<String>,
    pub profession: Option<String>,
    pub placeholder: bool,
}

impl CandidateProfile {
    pub fn placeholder() -> Self {
        Self {
            candidate_id: None,
            name: PLACEHOLDER_CANDIDATE.to_string(),
            party: PLACEHOLDER_PARTY.to_string(),
            swot: PLACEHOLDER_SWOT.to_string(),
            caste: None,
            religion: None,
            age: None,
            gender: None,
            education: None,
            profession: None,
            placeholder: true,
        }
    }
}

impl From<CandidateRecord> for CandidateProfile {
    fn from(record: CandidateRecord) -> Self {
        Self {
            candidate_id: record.candidate_id,
            name: record.name,
            party: record.party,
            swot: record
                .swot
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_SWOT.to_string()),
            caste: record.caste,
            religion: record.religion,
            age: record.age,
            gender: record.gender,
            education: record.education,
            profession: record.profession,
            placeholder: false,
        }
    }
}

/// Sentiment as presented to prompts: score to three decimals, percentages scaled
/// to 0–100 with one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub avg_score: f64,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral: bool,
}

impl SentimentSummary {
    pub fn neutral() -> Self {
        Self {
            avg_score: 0.0,
            positive_pct: 0.0,
            negative_pct: 0.0,
            neutral: true,
        }
    }

    pub fn label(&self) -> String {
        if self.neutral {
            NEUTRAL_SENTIMENT.to_string()
        } else {
            format!(
                "{:.3} ({:.1}% positive, {:.1}% negative)",
                self.avg_score, self.positive_pct, self.negative_pct
            )
        }
    }
}

impl From<SentimentRow> for SentimentSummary {
    fn from(row: SentimentRow) -> Self {
        Self {
            avg_score: round_to(row.avg_sentiment_score, 3),
            positive_pct: round_to(row.positive_pct * 100.0, 1),
            negative_pct: round_to(row.negative_pct * 100.0, 1),
            neutral: false,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Everything a slot template may reference about a target entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityContext {
    pub entity_name: String,
    pub entity_code: String,
    pub kind: EntityKind,
    pub candidate: CandidateProfile,
    pub sentiment: SentimentSummary,
    pub top_issue: String,
}

/// Resolve an entity key into a prompt context.
///
/// Fails with `EntityNotFound` only when the entity itself is unknown.
pub fn resolve_context(
    directory: &dyn CampaignDirectory,
    entity_key: &str,
) -> Result<EntityContext, ApiError> {
    let entity = directory
        .find_entity(entity_key)?
        .ok_or_else(|| ApiError::EntityNotFound(entity_key.trim().to_string()))?;

    let candidate = directory
        .active_candidate(&entity)?
        .map(CandidateProfile::from)
        .unwrap_or_else(CandidateProfile::placeholder);

    let sentiment = directory
        .sentiment(&entity)?
        .map(SentimentSummary::from)
        .unwrap_or_else(SentimentSummary::neutral);

    let top_issue = directory
        .top_issue(&entity)?
        .unwrap_or_else(|| DEFAULT_TOP_ISSUE.to_string());

    Ok(EntityContext {
        entity_name: entity.name,
        entity_code: entity.code,
        kind: entity.kind,
        candidate,
        sentiment,
        top_issue,
    })
}
