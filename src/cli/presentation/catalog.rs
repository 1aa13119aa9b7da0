//! Slot and entity listings.

use super::shared::{format_section_heading, to_pretty_json};
use crate::directory::{EntityKind, EntityRecord};
use crate::error::ApiError;
use crate::slot::{ContentSlot, SlotSource};
use comfy_table::Table;

pub fn format_slots(slots: &[&ContentSlot], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(slots);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Slot", "Theme", "Label", "Source"]);
    for slot in slots {
        let source = match &slot.source {
            SlotSource::Generated { .. } => "generated".to_string(),
            SlotSource::Pool { pool_file, .. } => format!("pool ({})", pool_file.display()),
        };
        table.add_row(vec![
            slot.id.to_string(),
            slot.theme.clone(),
            slot.label().to_string(),
            source,
        ]);
    }
    Ok(format!(
        "{}\n\n{}",
        format_section_heading("Content Slots"),
        table
    ))
}

pub fn format_entities(entities: &[EntityRecord], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(entities);
    }
    if entities.is_empty() {
        return Ok("No entities. Import some with `canvass seed <file>`.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Name", "Code", "Kind"]);
    for entity in entities {
        let kind = match entity.kind {
            EntityKind::Constituency => "constituency",
            EntityKind::Voter => "voter",
        };
        table.add_row(vec![entity.name.as_str(), entity.code.as_str(), kind]);
    }
    Ok(table.to_string())
}

pub fn format_seed_summary(imported: usize, source: &std::path::Path) -> String {
    format!("Imported {} entities from {}", imported, source.display())
}
