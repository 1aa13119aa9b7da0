//! Shared identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content slot identifier
pub type SlotId = u32;

/// Variant index within one (slot, entity) pair, starting at 1
pub type VariantIndex = u32;

/// Number of variants produced by one regeneration
pub const VARIANTS_PER_BATCH: usize = 3;

/// Normalize an operator-supplied entity key for case-insensitive matching.
pub fn normalize_entity_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Storage key for the variants of one content slot and target entity.
///
/// The entity part is always the normalized (trimmed, lowercased) natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub slot_id: SlotId,
    pub entity: String,
}

impl VariantKey {
    pub fn new(slot_id: SlotId, entity_key: &str) -> Self {
        Self {
            slot_id,
            entity: normalize_entity_key(entity_key),
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slot_id, self.entity)
    }
}
