//! Configuration loading through files, environment and the run context

use super::test_utils::with_isolated_env;
use canvass::backend::BackendConfig;
use canvass::cli::{Commands, RunContext};
use canvass::config::{BackendFailurePolicy, CanvassConfig, ConfigLoader};
use canvass::slot::SlotSource;
use std::fs;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[storage]
store_path = "state/db"

[backend]
type = "command"
program = "llama-cli"
args = ["-m", "model.gguf", "-f", "{prompt_file}", "-n", "200"]

[workflow]
backend_timeout_secs = 30
backend_failure_policy = "strict"
pool_seed = 42

[slots.rally]
id = 7
theme = "Rally Invite"
label = "Rally"

[slots.rally.source]
kind = "generated"
template = "Invite voters in {entity} to meet {candidate} of {party}."
rationale = "Rally invitation for {entity}."

[logging]
level = "warn"
output = "stdout"
"#;

#[test]
fn test_load_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("canvass.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.storage.store_path.to_str(), Some("state/db"));
    assert_eq!(config.workflow.backend_timeout_secs, 30);
    assert_eq!(config.workflow.backend_failure_policy, BackendFailurePolicy::Strict);
    assert_eq!(config.workflow.pool_seed, Some(42));
    assert_eq!(config.logging.level, "warn");
    match &config.backend {
        BackendConfig::Command { program, args } => {
            assert_eq!(program.to_str(), Some("llama-cli"));
            assert!(args.contains(&"{prompt_file}".to_string()));
        }
        other => panic!("expected command backend, got {:?}", other),
    }
    let rally = &config.slots["rally"];
    assert_eq!(rally.id, 7);
    assert!(matches!(rally.source, SlotSource::Generated { .. }));
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_run_context_lists_configured_slot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("canvass.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let ctx = RunContext::new(dir.path().to_path_buf(), Some(path)).unwrap();
    assert_eq!(ctx.store_path(), dir.path().join("state/db"));
    assert!(ctx.store_path().exists());

    let out = ctx
        .execute(&Commands::Slots {
            format: "json".to_string(),
        })
        .unwrap();
    let slots: serde_json::Value = serde_json::from_str(&out).unwrap();
    let ids: Vec<u64> = slots
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 6, 7]);
}

#[test]
fn test_invalid_config_rejected_by_run_context() {
    let dir = TempDir::new().unwrap();
    let mut config = CanvassConfig::default();
    config.storage.store_path = dir.path().join("store");
    config.backend = BackendConfig::Command {
        program: "llama-cli".into(),
        args: vec!["-p".to_string(), "hello".to_string()],
    };
    config.logging.level = "loud".to_string();

    let err = RunContext::from_config(dir.path().to_path_buf(), config)
        .err()
        .expect("validation should fail");
    let msg = err.to_string();
    assert!(msg.contains("Backend"));
    assert!(msg.contains("Logging"));
}

#[test]
fn test_workspace_layers_and_environment() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config/config.toml"),
        "[workflow]\nbackend_timeout_secs = 45\npool_seed = 3\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("config/staging.toml"),
        "[workflow]\nbackend_timeout_secs = 60\n",
    )
    .unwrap();

    let config = with_isolated_env(&dir, || {
        std::env::set_var("CANVASS_ENV", "staging");
        std::env::set_var("CANVASS_WORKFLOW__BACKEND_FAILURE_POLICY", "strict");
        let loaded = ConfigLoader::load(dir.path());
        std::env::remove_var("CANVASS_WORKFLOW__BACKEND_FAILURE_POLICY");
        loaded
    })
    .unwrap();

    assert_eq!(config.workflow.backend_timeout_secs, 60);
    assert_eq!(config.workflow.pool_seed, Some(3));
    assert_eq!(config.workflow.backend_failure_policy, BackendFailurePolicy::Strict);
}
