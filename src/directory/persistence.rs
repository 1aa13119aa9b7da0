//! Sled-backed campaign directory and JSON seed import

use crate::directory::{
    CampaignDirectory, CandidateRecord, EntityProfile, EntityRecord, SentimentRow,
};
use crate::error::{ApiError, StorageError};
use crate::types::normalize_entity_key;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ENTITIES_TREE: &str = "entities";

/// Seed document for the directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub entities: Vec<EntityProfile>,
}

/// Read a JSON seed document from disk
pub fn load_seed_file(path: &Path) -> Result<DirectorySeed, ApiError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApiError::InvalidRequest(format!("Failed to read seed file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        ApiError::InvalidRequest(format!("Invalid seed file {}: {}", path.display(), e))
    })
}

/// Directory stored in a sled tree, one record per entity keyed by normalized name
pub struct SledCampaignDirectory {
    entities: sled::Tree,
}

impl SledCampaignDirectory {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::database("Failed to open sled database", e))?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        let entities = db
            .open_tree(ENTITIES_TREE)
            .map_err(|e| StorageError::database("Failed to open entities tree", e))?;
        Ok(Self { entities })
    }

    /// Insert or replace every entity in the seed. Returns the number written.
    pub fn import(&self, seed: &DirectorySeed) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        for profile in &seed.entities {
            let value = bincode::serialize(profile)
                .map_err(|e| StorageError::codec("Failed to serialize entity", e))?;
            batch.insert(normalize_entity_key(&profile.name).as_bytes(), value);
        }
        self.entities
            .apply_batch(batch)
            .map_err(|e| StorageError::database("Failed to apply entity batch", e))?;
        self.entities
            .flush()
            .map_err(|e| StorageError::database("Failed to flush entities", e))?;
        info!(count = seed.entities.len(), "Imported directory entities");
        Ok(seed.entities.len())
    }

    fn profile(&self, name: &str) -> Result<Option<EntityProfile>, StorageError> {
        let key = normalize_entity_key(name);
        match self
            .entities
            .get(key.as_bytes())
            .map_err(|e| StorageError::database("Failed to get entity", e))?
        {
            Some(value) => {
                let profile = bincode::deserialize(&value)
                    .map_err(|e| StorageError::codec("Failed to deserialize entity", e))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }
}

impl CampaignDirectory for SledCampaignDirectory {
    fn find_entity(&self, key: &str) -> Result<Option<EntityRecord>, StorageError> {
        let found = self.profile(key)?.map(|p| EntityRecord::from(&p));
        debug!(key, found = found.is_some(), "Entity lookup");
        Ok(found)
    }

    fn active_candidate(
        &self,
        entity: &EntityRecord,
    ) -> Result<Option<CandidateRecord>, StorageError> {
        Ok(self
            .profile(&entity.name)?
            .and_then(|p| p.candidates.into_iter().find(|c| !c.is_opponent)))
    }

    fn sentiment(&self, entity: &EntityRecord) -> Result<Option<SentimentRow>, StorageError> {
        Ok(self.profile(&entity.name)?.and_then(|p| p.sentiment))
    }

    fn top_issue(&self, entity: &EntityRecord) -> Result<Option<String>, StorageError> {
        Ok(self.profile(&entity.name)?.and_then(|p| {
            // max_by_key keeps the last maximum; iterate in reverse so ties go to
            // the first listed issue
            p.issues
                .into_iter()
                .rev()
                .max_by_key(|i| i.post_count)
                .map(|i| i.issue)
        }))
    }

    fn list_entities(&self) -> Result<Vec<EntityRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.entities.iter() {
            let (_, value) =
                item.map_err(|e| StorageError::database("Failed to iterate entities", e))?;
            let profile: EntityProfile = bincode::deserialize(&value)
                .map_err(|e| StorageError::codec("Failed to deserialize entity", e))?;
            records.push(EntityRecord::from(&profile));
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}
