//! CLI presentation: text and json formatters per command family.

mod catalog;
mod shared;
mod variants;

pub use catalog::{format_entities, format_seed_summary, format_slots};
pub use shared::{format_section_heading, to_pretty_json};
pub use variants::{
    format_batch, format_export_summary, format_finalized, format_outcome, format_state,
    format_variant_list, pick_item_label,
};
