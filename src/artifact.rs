//! Finalized artifact bundles and the renderer seam.
//!
//! A bundle carries everything a downstream document renderer needs for one
//! (slot, entity) pair: the canonical variant, its selection marker and the
//! resolved entity context. Page layout is the renderer's business.

use crate::directory::EntityContext;
use crate::error::ApiError;
use crate::slot::ContentSlot;
use crate::store::{FinalizedSelection, Variant};
use crate::types::SlotId;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub slot_id: SlotId,
    pub theme: String,
    pub label: String,
    pub context: EntityContext,
    pub variant: Variant,
    pub selection: FinalizedSelection,
}

impl ArtifactBundle {
    pub fn new(
        slot: &ContentSlot,
        context: EntityContext,
        variant: Variant,
        selection: FinalizedSelection,
    ) -> Self {
        Self {
            slot_id: slot.id,
            theme: slot.theme.clone(),
            label: slot.label().to_string(),
            context,
            variant,
            selection,
        }
    }

    /// Default export file stem, e.g. `mandya_slot6`
    pub fn file_stem(&self) -> String {
        let entity: String = self
            .context
            .entity_name
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("{}_slot{}", entity, self.slot_id)
    }
}

/// Consumer of finalized bundles
pub trait ArtifactRenderer {
    fn render(&self, bundle: &ArtifactBundle, out: &mut dyn Write) -> Result<(), ApiError>;

    /// File extension without the dot
    fn extension(&self) -> &str;
}

/// Machine-readable bundle for external document generators
#[derive(Debug, Clone, Default)]
pub struct JsonBundleRenderer {
    pub pretty: bool,
}

impl ArtifactRenderer for JsonBundleRenderer {
    fn render(&self, bundle: &ArtifactBundle, out: &mut dyn Write) -> Result<(), ApiError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut *out, bundle)
        } else {
            serde_json::to_writer(&mut *out, bundle)
        };
        result.map_err(|e| ApiError::RenderFailed(format!("JSON encoding failed: {}", e)))?;
        writeln!(out).map_err(|e| ApiError::RenderFailed(e.to_string()))
    }

    fn extension(&self) -> &str {
        "json"
    }
}

/// Plain text card: theme heading, entity line, finalized text and rationale
#[derive(Debug, Clone, Default)]
pub struct TextCardRenderer;

impl ArtifactRenderer for TextCardRenderer {
    fn render(&self, bundle: &ArtifactBundle, out: &mut dyn Write) -> Result<(), ApiError> {
        let ctx = &bundle.context;
        let card = format!(
            "{theme}\n{rule}\n{entity} ({code}) | {candidate}, {party}\n\n{text}\n\nRationale: {rationale}\nFinalized: {at}\n",
            theme = bundle.theme,
            rule = "=".repeat(bundle.theme.chars().count()),
            entity = ctx.entity_name,
            code = ctx.entity_code,
            candidate = ctx.candidate.name,
            party = ctx.candidate.party,
            text = bundle.variant.text,
            rationale = bundle.variant.rationale,
            at = bundle.selection.finalized_at.to_rfc3339(),
        );
        out.write_all(card.as_bytes())
            .map_err(|e| ApiError::RenderFailed(e.to_string()))
    }

    fn extension(&self) -> &str {
        "txt"
    }
}

/// Render `bundle` into `path`, creating parent directories
pub fn write_artifact(
    renderer: &dyn ArtifactRenderer,
    bundle: &ArtifactBundle,
    path: &Path,
) -> Result<PathBuf, ApiError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::RenderFailed(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }
    let mut buffer = Vec::new();
    renderer.render(bundle, &mut buffer)?;
    std::fs::write(path, buffer)
        .map_err(|e| ApiError::RenderFailed(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(path.to_path_buf())
}
