//! Integration tests for the campaign variant workflow

mod cli_commands;
mod config_integration;
mod store_integration;
mod test_utils;
