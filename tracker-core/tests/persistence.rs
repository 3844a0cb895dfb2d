//! Integration tests for saving and loading the setup.
//!
//! Run with: `cargo test -p tracker-core --test persistence`

use std::sync::Arc;
use tempfile::TempDir;
use tracker_core::persist::PersistError;
use tracker_core::world::Opponent;
use tracker_core::{Catalog, CombatSession, Phase, SetupSnapshot, Stat, TrackerConfig};

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::standard())
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("setup.json");

    let mut session = CombatSession::new(catalog());
    session.add_member("Lord Ti\u{2019}quon").expect("hero");
    session.set_stat(0, Stat::Charisma, 3).expect("charisma");
    session.add_equipment(0, "Steel Greatsword").expect("sword");
    session
        .set_spell(0, 0, Some("Armour of Heaven"))
        .expect("spell");
    session.set_notes(0, "Owes the ferryman").expect("notes");
    session
        .import_opponents("Troll\n5(4+) + 1 Auto\n5+\n15")
        .expect("import");
    session.set_silver_coins(120);

    session.save(&save_path).await.expect("save");
    assert!(save_path.exists());

    let config = TrackerConfig::default();
    let loaded = CombatSession::load(&save_path, &config, catalog())
        .await
        .expect("load");
    assert_eq!(loaded.party(), session.party());
    assert_eq!(loaded.mobs(), session.mobs());
    assert_eq!(loaded.silver_coins(), 120);
    assert_eq!(loaded.phase(), Phase::Setup);
    assert!(loaded.battle_seed().is_none());
}

#[tokio::test]
async fn test_save_mid_combat_keeps_setup_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("setup.json");

    let mut session = CombatSession::starter(catalog());
    assert!(session.start_combat());
    session.save(&save_path).await.expect("save");

    let loaded = CombatSession::load(&save_path, &TrackerConfig::default(), catalog())
        .await
        .expect("load");
    assert_eq!(loaded.phase(), Phase::Setup);
    assert!(loaded.log().is_empty());
    assert_eq!(loaded.mobs(), &[Opponent::goblin()]);
}

#[tokio::test]
async fn test_corrupt_save_falls_back_to_starter() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("setup.json");
    tokio::fs::write(&save_path, "{ not json")
        .await
        .expect("write");

    let err = SetupSnapshot::load_json(&save_path)
        .await
        .expect_err("corrupt");
    assert!(matches!(err, PersistError::Json(_)));

    let session =
        CombatSession::load_or_starter(&save_path, &TrackerConfig::default(), catalog()).await;
    assert_eq!(session.party()[0].name, "Akihiro of Chalice");
    assert_eq!(session.party()[0].stat(Stat::Fighting), 4);
    assert_eq!(session.mobs(), &[Opponent::goblin()]);
}

#[tokio::test]
async fn test_missing_save_falls_back_to_starter() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("missing.json");

    let session =
        CombatSession::load_or_starter(&save_path, &TrackerConfig::default(), catalog()).await;
    assert_eq!(session.party().len(), 1);
    assert_eq!(session.silver_coins(), 0);
}

#[tokio::test]
async fn test_loosely_typed_save_is_coerced() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("setup.json");
    let json = r#"{
        "silverCoins": "250",
        "party": [
            {"name": "Brash", "fighting": "5", "lore": 2.7, "armour": null,
             "health": 8.0, "maxHealth": "12", "equipment": [null, 7, "Shield"]}
        ],
        "mobs": [null, {"name": "Ogre", "atkDice": "3", "atkTarget": 4.0,
                        "auto": "2 Auto", "health": "99999999999"}, "junk"]
    }"#;
    tokio::fs::write(&save_path, json).await.expect("write");

    let session =
        CombatSession::load_or_starter(&save_path, &TrackerConfig::default(), catalog()).await;
    assert_eq!(session.silver_coins(), 250);

    let brash = &session.party()[0];
    assert_eq!(brash.name, "Brash");
    assert_eq!(brash.stat(Stat::Fighting), 5);
    assert_eq!(brash.stat(Stat::Lore), 2);
    assert_eq!(brash.stat(Stat::Armour), 0);
    assert_eq!((brash.health, brash.max_health), (8, 12));
    assert_eq!(brash.equipment.len(), 1);

    let mobs = session.mobs();
    assert_eq!(mobs.len(), 1);
    assert_eq!(mobs[0].name, "Ogre");
    assert_eq!(
        (mobs[0].atk_dice, mobs[0].atk_target, mobs[0].auto),
        (3, 4, 2)
    );
    assert_eq!((mobs[0].health, mobs[0].max_health), (6, 6));
}

#[test]
fn test_non_array_party_reads_as_empty() {
    let snapshot = SetupSnapshot::from_json(r#"{"party": null, "mobs": {"name": "Rat"}}"#)
        .expect("coerced");
    assert!(snapshot.party.is_empty());
    assert!(snapshot.mobs.is_empty());

    let mut session = CombatSession::new(catalog());
    session.apply_snapshot(&snapshot);
    assert!(session.party().is_empty());
    assert_eq!(session.phase(), Phase::Setup);
}
