//! Persistence tests: data survives reopening the sled database

use super::test_utils::mandya_seed;
use canvass::directory::persistence::SledCampaignDirectory;
use canvass::directory::{resolve_context, CampaignDirectory};
use canvass::store::{FinalizedSelection, SledVariantStore, Variant, VariantStore};
use canvass::types::VariantKey;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn variant(index: u32, text: &str) -> Variant {
    Variant {
        index,
        text: text.to_string(),
        rationale: "Call to action for voters in Mandya.".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
        source: "generated:http".to_string(),
        theme: "Call to Vote".to_string(),
        entity_name: "Mandya".to_string(),
    }
}

#[test]
fn test_variants_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store");
    let key = VariantKey::new(4, "Mandya");

    {
        let store = SledVariantStore::new(&path).unwrap();
        store
            .replace_all(&key, &[variant(1, "One"), variant(2, "Two"), variant(3, "Three")])
            .unwrap();
        let selection = FinalizedSelection {
            index: 2,
            finalized_at: Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap(),
        };
        store.reaffirm(&key, &variant(2, "Two"), &selection).unwrap();
        store.flush().unwrap();
    }

    let store = SledVariantStore::new(&path).unwrap();
    let texts: Vec<String> = store.list(&key).unwrap().into_iter().map(|v| v.text).collect();
    assert_eq!(texts, vec!["One", "Two", "Three"]);
    assert_eq!(store.selection(&key).unwrap().map(|s| s.index), Some(2));
}

#[test]
fn test_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store = SledVariantStore::new(dir.path().join("store")).unwrap();
    let cta = VariantKey::new(4, "Mandya");
    let slogan = VariantKey::new(6, "Mandya");
    let other = VariantKey::new(4, "Hassan");

    store.replace_all(&cta, &[variant(1, "CTA")]).unwrap();
    store.replace_all(&slogan, &[variant(1, "Slogan")]).unwrap();
    store.replace_all(&other, &[variant(1, "Hassan CTA")]).unwrap();
    store.replace_all(&cta, &[]).unwrap();

    assert!(store.list(&cta).unwrap().is_empty());
    assert_eq!(store.list(&slogan).unwrap()[0].text, "Slogan");
    assert_eq!(store.list(&other).unwrap()[0].text, "Hassan CTA");
}

#[test]
fn test_directory_import_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store");

    {
        let directory = SledCampaignDirectory::new(&path).unwrap();
        assert_eq!(directory.import(&mandya_seed()).unwrap(), 2);
    }

    let directory = SledCampaignDirectory::new(&path).unwrap();
    let names: Vec<String> = directory
        .list_entities()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Mandya".to_string()));

    let ctx = resolve_context(&directory, "mandya").unwrap();
    assert_eq!(ctx.candidate.name, "Lakshmi Rao");
    assert_eq!(ctx.top_issue, "irrigation");
    assert!(!ctx.sentiment.neutral);
}
