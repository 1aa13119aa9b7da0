//! Variant, batch and finalization output.

use super::shared::{format_section_heading, preview, to_pretty_json};
use crate::error::ApiError;
use crate::store::Variant;
use crate::workflow::{BatchResult, FinalizedResult, KeyState, WorkflowOutcome};
use comfy_table::{ContentArrangement, Table};
use serde_json::json;
use std::path::Path;

fn variant_table(variants: &[Variant], finalized: Option<u32>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Text", "Source", "Created"]);
    for variant in variants {
        let marker = if finalized == Some(variant.index) {
            format!("{} *", variant.index)
        } else {
            variant.index.to_string()
        };
        table.add_row(vec![
            marker,
            variant.text.clone(),
            variant.source.clone(),
            variant.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table
}

pub fn format_batch(batch: &BatchResult, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(batch);
    }
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("{} | {}", batch.theme, batch.entity_name))
    );
    out.push_str(&format!("Rationale: {}\n\n", batch.rationale));
    out.push_str(&variant_table(&batch.variants, None).to_string());
    if batch.failed > 0 {
        out.push_str(&format!(
            "\n\n{} of {} generations failed; their text records the error.",
            batch.failed,
            batch.variants.len()
        ));
    }
    if batch.short_batch {
        out.push_str(&format!(
            "\n\nOnly {} sufficiently distinct variants were available.",
            batch.variants.len()
        ));
    }
    out.push_str(&format!(
        "\n\nFinalize one with: canvass finalize --slot {} --entity \"{}\" --index <n>",
        batch.key.slot_id, batch.entity_name
    ));
    Ok(out)
}

pub fn format_variant_list(
    variants: &[Variant],
    rationale: Option<&str>,
    state: KeyState,
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(&json!({
            "state": state,
            "rationale": rationale,
            "variants": variants,
        }));
    }
    if variants.is_empty() {
        return Ok("No variants stored. Run regenerate first.".to_string());
    }
    let finalized = match state {
        KeyState::Finalized { index, .. } => Some(index),
        _ => None,
    };
    let mut out = String::new();
    if let Some(rationale) = rationale {
        out.push_str(&format!("Rationale: {}\n\n", rationale));
    }
    out.push_str(&variant_table(variants, finalized).to_string());
    if finalized.is_some() {
        out.push_str("\n\n* finalized");
    }
    Ok(out)
}

pub fn format_finalized(result: &FinalizedResult, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(result);
    }
    Ok(format!(
        "Finalized variant {} for {} at {}\n\n{}",
        result.selection.index,
        result.key,
        result.selection.finalized_at.to_rfc3339(),
        result.variant.text
    ))
}

pub fn format_outcome(outcome: &WorkflowOutcome, format: &str) -> Result<String, ApiError> {
    match (outcome, format) {
        (_, "json") => to_pretty_json(outcome),
        (WorkflowOutcome::Drafted(batch), _) => format_batch(batch, format),
        (WorkflowOutcome::Finalized(result), _) => format_finalized(result, format),
    }
}

pub fn format_state(
    slot_id: u32,
    entity: &str,
    state: KeyState,
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(&json!({
            "slot": slot_id,
            "entity": entity,
            "status": state,
        }));
    }
    Ok(format!("Slot {} / {}: {}", slot_id, entity, state))
}

pub fn format_export_summary(path: &Path, index: u32) -> String {
    format!("Exported finalized variant {} to {}", index, path.display())
}

/// One line per variant in the interactive picker
pub fn pick_item_label(variant: &Variant) -> String {
    format!("{}. {}", variant.index, preview(&variant.text, 72))
}
