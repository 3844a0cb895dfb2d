//! Integration tests for setup editing, equipment modifiers and text import.
//!
//! Run with: `cargo test -p tracker-core --test setup_and_import`

use std::sync::Arc;
use tracker_core::modifiers::{displayed_stats, effective_stat, fighting_dice};
use tracker_core::testing::TestHarness;
use tracker_core::world::{ItemRef, Opponent};
use tracker_core::{
    parse_encounter, Catalog, CombatSession, ImportError, Outcome, SetupError, Stat,
};

#[test]
fn test_unarmed_fighting_penalty() {
    let mut harness = TestHarness::new();
    harness.hero("Brash");
    let catalog = Catalog::standard();
    let dice = fighting_dice(&catalog, &harness.session.party()[0]);
    assert_eq!(dice.dice, 2);
    assert!(!dice.has_weapon);

    harness
        .session
        .add_equipment(0, "Iron Shortsword")
        .expect("sword");
    let dice = fighting_dice(&catalog, &harness.session.party()[0]);
    assert_eq!(dice.dice, 4);
    assert!(dice.has_weapon);
}

#[test]
fn test_two_handed_weapon_exceeds_hand_budget() {
    let mut harness = TestHarness::new();
    harness.hero("Brash");
    harness.session.add_equipment(0, "Shield").expect("shield");
    harness.session.add_equipment(0, "maul").expect("maul");

    let hero = &harness.session.party()[0];
    assert_eq!(hero.equipment[0].item, ItemRef::Catalog("shield".into()));
    assert!(hero.equipment[0].equipped);
    assert_eq!(hero.equipment[1].item, ItemRef::Catalog("maul".into()));
    assert!(!hero.equipment[1].equipped);

    // Re-equipping the maul is refused while the shield holds a hand.
    assert_eq!(harness.session.set_equipped(0, 1, true), Ok(false));

    let catalog = harness.session.catalog();
    let hero = &harness.session.party()[0];
    assert_eq!(effective_stat(catalog, hero, Stat::Armour), 2);
    assert_eq!(effective_stat(catalog, hero, Stat::Fighting), 3);
}

#[test]
fn test_countable_items_multiply() {
    let mut harness = TestHarness::new();
    harness.hero("Brash");
    harness.session.add_equipment(0, "Warm cloak").expect("cloak");
    harness
        .session
        .set_equipment_count(0, 0, 3)
        .expect("count");
    // Cloaks are not countable: the count does not scale the bonus.
    let catalog = harness.session.catalog();
    let hero = &harness.session.party()[0];
    assert_eq!(effective_stat(catalog, hero, Stat::Survival), 1);

    let survival = displayed_stats(catalog, hero)
        .into_iter()
        .find(|d| d.stat == Stat::Survival)
        .expect("survival");
    assert_eq!((survival.base, survival.modified), (0, 1));
}

#[test]
fn test_custom_items_have_no_effect() {
    let mut harness = TestHarness::new();
    harness.hero("Brash");
    harness
        .session
        .add_equipment(0, "Grandmother's spoon")
        .expect("spoon");
    let hero = &harness.session.party()[0];
    assert_eq!(
        hero.equipment[0].item,
        ItemRef::Custom("Grandmother's spoon".into())
    );
    assert_eq!(
        harness.session.catalog().describe_entry(&hero.equipment[0]),
        "Custom item"
    );
}

#[test]
fn test_roster_rules() {
    let mut session = CombatSession::new(Arc::new(Catalog::standard()));
    assert_eq!(
        session.add_member("Nobody"),
        Err(SetupError::UnknownHero("Nobody".into()))
    );
    for hero in [
        "Brash",
        "Tasha",
        "Amelia Pass-Dayne",
        "Sar Jessica Dayne",
    ] {
        session.add_member(hero).expect("hero");
    }
    assert_eq!(session.add_member("brash"), Err(SetupError::DuplicateHero("Brash".into())));
    assert_eq!(session.add_member("Akihiro of Chalice"), Err(SetupError::PartyFull));
    assert_eq!(
        session.set_spell(0, 0, Some("ice_bolt")),
        Err(SetupError::NotSpellcaster("Brash".into()))
    );
}

#[test]
fn test_goblin_import() {
    let mobs = parse_encounter("Goblin\n4(5+)\n4+\n6").expect("parse");
    assert_eq!(mobs, vec![Opponent::goblin()]);
}

#[test]
fn test_import_replaces_opponents_atomically() {
    let mut harness = TestHarness::new();
    harness.goblin();

    let err = harness
        .session
        .import_opponents("Ogre\n3(4+) + 2 Auto\n5+\n12\n\nRat\n1(6+)")
        .expect_err("incomplete");
    assert_eq!(err, SetupError::Import(ImportError::IncompleteBlock));
    assert_eq!(harness.session.mobs(), &[Opponent::goblin()]);

    let count = harness
        .session
        .import_opponents("Ogre\n3(4+) + 2 Auto\n5+\n12\n\nRat\n1(6+)\n2+\n1\n")
        .expect("import");
    assert_eq!(count, 2);
    let ogre = &harness.session.mobs()[0];
    assert_eq!(
        (ogre.atk_dice, ogre.atk_target, ogre.auto, ogre.def_target),
        (3, 4, 2, 5)
    );
    assert_eq!((ogre.health, ogre.max_health), (12, 12));
    assert_eq!(harness.session.mobs()[1].name, "Rat");
}

#[test]
fn test_skill_check_from_commands() {
    let mut harness = TestHarness::new();
    harness.hero("Brash").hero("Tasha");
    harness
        .session
        .execute_line("stat 0 lore 2")
        .expect("lore");
    harness
        .session
        .execute_line("stat 1 lore 1")
        .expect("lore");
    harness
        .session
        .execute_line("check team lore 5 2 Ancient runes")
        .expect("configure");

    harness.roll(&[5, 2, 6]);
    let outcome = harness
        .session
        .execute_line("check-roll 0 1")
        .expect("roll");
    let Outcome::Report(lines) = outcome else {
        panic!("expected a report, got {outcome:?}");
    };
    assert_eq!(lines[0], "Ancient runes: SUCCESS (2/2 successes)");
    // Skill checks stay out of the combat log and undo.
    assert!(harness.session.log().is_empty());
    assert!(!harness.session.can_undo());
}
