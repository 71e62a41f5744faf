//! Configuration And Persistence Tests
//!
//! - `BindConfig` files on disk
//! - `MemoryStore::open` reloads saved records, values and relationships

mod common;

use std::fs;

use common::*;
use recordbind::config::{BindConfig, ConfigError};
use recordbind::observability::{LogStream, Severity};
use recordbind::store::{MemoryStore, SharedContext, StoreContext, StoreError};
use recordbind::DatabaseModel;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> (std::sync::Arc<MemoryStore>, SharedContext) {
    let store = MemoryStore::open(dir.path().join("store.json")).unwrap();
    store.register::<PlayerEntity>();
    store.register::<TeamEntity>();
    let context: SharedContext = store.clone();
    (store, context)
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recordbind.json");
    fs::write(&path, r#"{ "log_level": "warn", "log_stream": "stderr" }"#).unwrap();

    let config = BindConfig::load(&path).unwrap();
    assert_eq!(config.log_level, Severity::Warn);
    assert_eq!(config.log_stream, LogStream::Stderr);
    config.install();
}

#[test]
fn test_load_malformed_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recordbind.json");
    fs::write(&path, "log_level = warn").unwrap();

    let err = BindConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("Invalid config JSON"));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_restores_saved_records() {
    let dir = TempDir::new().unwrap();
    {
        let (_store, context) = open_store(&dir);
        seed_ducks(&context).unwrap();
        let fifi = Player::find_first_in(&context, Player::name().eq("Fifi"))
            .unwrap()
            .unwrap();
        fifi.set(&Player::stats(), Some(Stats { goals: 2, assists: 7 }))
            .unwrap();
        fifi.assign(&Player::role(), Role::Keeper).unwrap();
    }

    let (store, context) = open_store(&dir);
    assert_eq!(store.count("PlayerEntity"), 4);

    let players = Player::request().all().fetch_in(&context).unwrap();
    assert_eq!(names(&players), ["Riri", "Fifi", "Loulou", "Donald"]);
    assert_eq!(players[1].current(&Player::score()).unwrap(), 10.0);
    assert_eq!(players[1].current(&Player::role()).unwrap(), Role::Keeper);
    assert_eq!(
        players[1].current(&Player::stats()).unwrap(),
        Some(Stats { goals: 2, assists: 7 })
    );
    assert_eq!(players[0].current(&Player::level()).unwrap(), 1);
}

#[test]
fn test_unsaved_changes_are_not_persisted() {
    let dir = TempDir::new().unwrap();
    {
        let (_store, context) = open_store(&dir);
        saved_player(&context, "Donald", 20.0).unwrap();
        new_player(&context, "Daisy", 30.0).unwrap();
    }

    let (_store, context) = open_store(&dir);
    let players = Player::request().all().fetch_in(&context).unwrap();
    assert_eq!(names(&players), ["Donald"]);
}

#[test]
fn test_relationships_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (_store, context) = open_store(&dir);
        let team = saved_team(&context, "Nephews").unwrap();
        for name in ["Riri", "Fifi"] {
            let player = saved_player(&context, name, 10.0).unwrap();
            team.add_child(&Team::players(), &player).unwrap();
            player.set_parent(&Player::team(), Some(&team)).unwrap();
        }
        team.save().unwrap();
    }

    let (_store, context) = open_store(&dir);
    let team = Team::find_first_in(&context, Team::name().eq("Nephews"))
        .unwrap()
        .unwrap();
    let children = team.children(&Team::players()).unwrap();
    assert_eq!(names(&children), ["Riri", "Fifi"]);
    assert_eq!(children[0].parent(&Player::team()).unwrap(), Some(team));
}

#[test]
fn test_failed_save_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    {
        let (_store, context) = open_store(&dir);
        saved_player(&context, "Donald", 20.0).unwrap();
    }
    let before = fs::read_to_string(&path).unwrap();

    {
        let (_store, context) = open_store(&dir);
        let player = Player::create_in(&context).unwrap();
        player.set(&Player::name(), "Incomplete".to_string()).unwrap();
        assert!(player.save().is_err());
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_open_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();

    let err = MemoryStore::open(&path).err().unwrap();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn test_reopened_records_are_attached() {
    let dir = TempDir::new().unwrap();
    {
        let (_store, context) = open_store(&dir);
        saved_player(&context, "Donald", 20.0).unwrap();
    }

    let (store, context) = open_store(&dir);
    let donald = Player::find_first_in(&context, Player::name().eq("Donald"))
        .unwrap()
        .unwrap();
    assert!(!donald.record().is_detached());
    donald.assign(&Player::score(), 25.0).unwrap();
    assert!(!store.has_changes());
}
