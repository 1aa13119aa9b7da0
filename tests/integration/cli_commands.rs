//! Command routing end to end through the run context

use canvass::backend::BackendConfig;
use canvass::cli::{exit_code, map_error, Commands, RunContext};
use canvass::config::CanvassConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn repo_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Workspace with the bundled slogan pool and a shell command standing in for a model
fn workspace() -> (TempDir, RunContext) {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::copy(
        repo_file("data/slogan_pool.json"),
        dir.path().join("data/slogan_pool.json"),
    )
    .unwrap();

    let mut config = CanvassConfig::default();
    config.storage.store_path = dir.path().join(".canvass/store");
    config.workflow.pool_seed = Some(17);
    config.backend = BackendConfig::Command {
        program: "sh".into(),
        args: vec![
            "-c".to_string(),
            "cat {prompt_file}; echo 'Your vote builds Mandya. Vote on polling day!'".to_string(),
        ],
    };
    let ctx = RunContext::from_config(dir.path().to_path_buf(), config).unwrap();
    (dir, ctx)
}

fn seed(ctx: &RunContext) {
    let out = ctx
        .execute(&Commands::Seed {
            file: repo_file("data/directory_seed.json"),
        })
        .unwrap();
    assert!(out.starts_with("Imported 2 entities"));
}

fn text(s: &str) -> String {
    s.to_string()
}

#[cfg(unix)]
#[test]
fn test_call_to_vote_lifecycle() {
    let (dir, ctx) = workspace();
    seed(&ctx);

    let out = ctx
        .execute(&Commands::Regenerate {
            slot: 4,
            entity: text("Mandya"),
            format: text("json"),
        })
        .unwrap();
    let batch: serde_json::Value = serde_json::from_str(&out).unwrap();
    let variants = batch["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 3);
    for v in variants {
        assert_eq!(v["text"], "Your vote builds Mandya. Vote on polling day!");
        assert_eq!(v["source"], "generated:command");
    }

    let out = ctx
        .execute(&Commands::Status {
            slot: 4,
            entity: text("mandya"),
            format: text("text"),
        })
        .unwrap();
    assert!(out.contains("drafted"), "unexpected status: {}", out);

    ctx.execute(&Commands::Finalize {
        slot: 4,
        entity: text("Mandya"),
        index: 2,
        format: text("text"),
    })
    .unwrap();

    let out = ctx
        .execute(&Commands::Variants {
            slot: 4,
            entity: text("Mandya"),
            format: text("json"),
        })
        .unwrap();
    let listing: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(listing["state"]["state"], "finalized");
    assert_eq!(listing["state"]["index"], 2);
    assert_eq!(listing["variants"].as_array().unwrap().len(), 3);

    let out = ctx
        .execute(&Commands::Export {
            slot: 4,
            entity: text("Mandya"),
            output: None,
            format: text("json"),
        })
        .unwrap();
    let exported = dir.path().join("mandya_slot4.json");
    assert!(out.contains("mandya_slot4.json"));
    let bundle: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(exported).unwrap()).unwrap();
    assert_eq!(bundle["selection"]["index"], 2);
    assert_eq!(bundle["context"]["candidate"]["name"], "Lakshmi Rao");
}

#[test]
fn test_slogan_run_modes() {
    let (_dir, ctx) = workspace();
    seed(&ctx);

    let out = ctx
        .execute(&Commands::Run {
            slot: 6,
            entity: text("Mandya"),
            mode: text("r"),
            format: text("json"),
        })
        .unwrap();
    let outcome: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(outcome["outcome"], "drafted");
    let first = outcome["variants"][0]["text"].as_str().unwrap().to_string();
    assert!(outcome["variants"][0]["source"]
        .as_str()
        .unwrap()
        .starts_with("pool:"));

    let out = ctx
        .execute(&Commands::Run {
            slot: 6,
            entity: text("Mandya"),
            mode: text("1"),
            format: text("text"),
        })
        .unwrap();
    assert!(out.contains(&first));
}

#[test]
fn test_errors_map_to_exit_codes() {
    let (_dir, ctx) = workspace();
    seed(&ctx);

    let err = ctx
        .execute(&Commands::Finalize {
            slot: 6,
            entity: text("Nonexistent"),
            index: 1,
            format: text("text"),
        })
        .unwrap_err();
    assert!(map_error(&err).starts_with("Not found (entity)"));
    assert_eq!(exit_code(&err), 2);

    let err = ctx
        .execute(&Commands::Finalize {
            slot: 6,
            entity: text("Hassan"),
            index: 1,
            format: text("text"),
        })
        .unwrap_err();
    assert!(map_error(&err).starts_with("Not found (variant)"));

    let err = ctx
        .execute(&Commands::Run {
            slot: 6,
            entity: text("Mandya"),
            mode: text("0"),
            format: text("text"),
        })
        .unwrap_err();
    assert_eq!(exit_code(&err), 64);
}
