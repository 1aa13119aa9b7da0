//! Variant Store
//!
//! Durable mapping from (content slot, target entity, variant index) to generated
//! text plus provenance. All mutation is delete-then-insert inside one transaction;
//! rows are never updated in place.

pub mod persistence;

pub use persistence::SledVariantStore;

use crate::error::StorageError;
use crate::types::{VariantIndex, VariantKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One generated text for a (slot, entity) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub index: VariantIndex,
    pub text: String,
    /// Human-readable provenance note
    pub rationale: String,
    pub created_at: DateTime<Utc>,
    /// Where the text came from, e.g. `generated:local` or `pool:slogans.json`
    pub source: String,
    pub theme: String,
    /// Canonical entity name as resolved from the directory
    pub entity_name: String,
}

/// Marker recording which variant index is canonical for a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedSelection {
    pub index: VariantIndex,
    pub finalized_at: DateTime<Utc>,
}

/// Variant Store interface
pub trait VariantStore {
    /// All variants for the key, ordered by ascending index.
    fn list(&self, key: &VariantKey) -> Result<Vec<Variant>, StorageError>;

    fn get(&self, key: &VariantKey, index: VariantIndex) -> Result<Option<Variant>, StorageError>;

    /// Atomically delete every variant and the selection marker for the key, then
    /// insert `variants`.
    fn replace_all(&self, key: &VariantKey, variants: &[Variant]) -> Result<(), StorageError>;

    /// Atomically delete the row at `variant.index`, reinsert `variant`, and record
    /// `selection` as the canonical pick for the key.
    fn reaffirm(
        &self,
        key: &VariantKey,
        variant: &Variant,
        selection: &FinalizedSelection,
    ) -> Result<(), StorageError>;

    fn selection(&self, key: &VariantKey) -> Result<Option<FinalizedSelection>, StorageError>;
}
