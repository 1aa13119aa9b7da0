//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Stable command name used in log events (e.g. "regenerate", "finalize").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Slots { .. } => "slots",
        Commands::Entities { .. } => "entities",
        Commands::Seed { .. } => "seed",
        Commands::Regenerate { .. } => "regenerate",
        Commands::Variants { .. } => "variants",
        Commands::Finalize { .. } => "finalize",
        Commands::Pick { .. } => "pick",
        Commands::Run { .. } => "run",
        Commands::Status { .. } => "status",
        Commands::Export { .. } => "export",
    }
}

/// Whether the command may call the generation backend
pub fn uses_backend(command: &Commands) -> bool {
    matches!(command, Commands::Regenerate { .. } | Commands::Run { .. })
}
