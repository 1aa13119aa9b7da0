//! CLI parse: clap types for canvass. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// canvass - campaign content variants: generate, review, finalize
#[derive(Parser)]
#[command(name = "canvass")]
#[command(about = "Generate, review and finalize campaign content variants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List content slots
    Slots {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List target entities in the campaign directory
    Entities {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Import entities, candidates, sentiment and issues from a JSON seed file
    Seed {
        /// Seed file path
        file: PathBuf,
    },
    /// Draft a fresh batch of variants, replacing stored ones
    Regenerate {
        /// Content slot id
        #[arg(long)]
        slot: u32,
        /// Target entity name (case-insensitive)
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show stored variants and the current rationale
    Variants {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Mark one stored variant as final
    Finalize {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
        /// Variant index (1-based)
        #[arg(long)]
        index: u32,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Choose a stored variant interactively, then finalize it
    Pick {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
    },
    /// Run one workflow request: mode "r"/"regenerate" or a variant index
    Run {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
        #[arg(long)]
        mode: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the lifecycle state of a slot/entity pair
    Status {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the finalized bundle for a renderer
    Export {
        #[arg(long)]
        slot: u32,
        #[arg(long)]
        entity: String,
        /// Output file (default: <entity>_slot<id>.<ext> in the workspace)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Bundle format (json or text)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
