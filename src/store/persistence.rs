//! Persistence layer for the Variant Store

use crate::error::StorageError;
use crate::store::{FinalizedSelection, Variant, VariantStore};
use crate::types::{VariantIndex, VariantKey};
use bincode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use std::path::Path;

const VARIANTS_TREE: &str = "variants";
const SELECTIONS_TREE: &str = "selections";

/// Sled-based implementation of VariantStore
///
/// Keys are `slot_id (u32 BE) ++ entity ++ 0x00` for the per-key prefix, with the
/// variant index (u32 BE) appended for variant rows, so a prefix scan yields rows
/// in ascending index order.
pub struct SledVariantStore {
    variants: sled::Tree,
    selections: sled::Tree,
}

impl SledVariantStore {
    /// Open (or create) a store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::database("Failed to open sled database", e))?;
        Self::from_db(&db)
    }

    /// Use trees of an already opened database
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        let variants = db
            .open_tree(VARIANTS_TREE)
            .map_err(|e| StorageError::database("Failed to open variants tree", e))?;
        let selections = db
            .open_tree(SELECTIONS_TREE)
            .map_err(|e| StorageError::database("Failed to open selections tree", e))?;
        Ok(Self {
            variants,
            selections,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.variants
            .flush()
            .map_err(|e| StorageError::database("Failed to flush variants", e))?;
        self.selections
            .flush()
            .map_err(|e| StorageError::database("Failed to flush selections", e))?;
        Ok(())
    }
}

fn key_prefix(key: &VariantKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + key.entity.len() + 1);
    out.extend_from_slice(&key.slot_id.to_be_bytes());
    out.extend_from_slice(key.entity.as_bytes());
    out.push(0);
    out
}

fn variant_row_key(key: &VariantKey, index: VariantIndex) -> Vec<u8> {
    let mut out = key_prefix(key);
    out.extend_from_slice(&index.to_be_bytes());
    out
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| StorageError::codec("Failed to serialize record", e))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::codec("Failed to deserialize record", e))
}

fn map_transaction_error(err: TransactionError<StorageError>) -> StorageError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StorageError::database("Transaction failed", e),
    }
}

impl VariantStore for SledVariantStore {
    fn list(&self, key: &VariantKey) -> Result<Vec<Variant>, StorageError> {
        let mut variants = Vec::new();
        for item in self.variants.scan_prefix(key_prefix(key)) {
            let (_, value) =
                item.map_err(|e| StorageError::database("Failed to scan variants", e))?;
            variants.push(decode::<Variant>(&value)?);
        }
        variants.sort_by_key(|v| v.index);
        Ok(variants)
    }

    fn get(&self, key: &VariantKey, index: VariantIndex) -> Result<Option<Variant>, StorageError> {
        match self
            .variants
            .get(variant_row_key(key, index))
            .map_err(|e| StorageError::database("Failed to get variant", e))?
        {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    fn replace_all(&self, key: &VariantKey, variants: &[Variant]) -> Result<(), StorageError> {
        let prefix = key_prefix(key);
        let stale: Vec<sled::IVec> = self
            .variants
            .scan_prefix(&prefix)
            .keys()
            .collect::<Result<_, _>>()
            .map_err(|e| StorageError::database("Failed to scan variants", e))?;

        let rows: Vec<(Vec<u8>, Vec<u8>)> = variants
            .iter()
            .map(|v| Ok((variant_row_key(key, v.index), encode(v)?)))
            .collect::<Result<_, StorageError>>()?;

        (&self.variants, &self.selections)
            .transaction(|(tx_variants, tx_selections)| {
                for stale_key in &stale {
                    tx_variants.remove(&stale_key[..])?;
                }
                for (row_key, value) in &rows {
                    tx_variants.insert(row_key.as_slice(), value.as_slice())?;
                }
                tx_selections.remove(prefix.as_slice())?;
                Ok::<(), ConflictableTransactionError<StorageError>>(())
            })
            .map_err(map_transaction_error)
    }

    fn reaffirm(
        &self,
        key: &VariantKey,
        variant: &Variant,
        selection: &FinalizedSelection,
    ) -> Result<(), StorageError> {
        let prefix = key_prefix(key);
        let row_key = variant_row_key(key, variant.index);
        let value = encode(variant)?;
        let marker = encode(selection)?;

        (&self.variants, &self.selections)
            .transaction(|(tx_variants, tx_selections)| {
                tx_variants.remove(row_key.as_slice())?;
                tx_variants.insert(row_key.as_slice(), value.as_slice())?;
                tx_selections.insert(prefix.as_slice(), marker.as_slice())?;
                Ok::<(), ConflictableTransactionError<StorageError>>(())
            })
            .map_err(map_transaction_error)
    }

    fn selection(&self, key: &VariantKey) -> Result<Option<FinalizedSelection>, StorageError> {
        match self
            .selections
            .get(key_prefix(key))
            .map_err(|e| StorageError::database("Failed to get selection", e))?
        {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }
}
