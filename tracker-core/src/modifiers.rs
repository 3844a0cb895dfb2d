//! Effective stats: base stats plus equipment plus battle buffs.

use crate::catalog::Catalog;
use crate::world::{PartyMember, Stat, StatBlock};

/// Hands a hero can hold equipment in.
pub const HAND_BUDGET: u32 = 2;

/// Summed equipment modifiers for every stat.
///
/// Items that need equipping only count while equipped; everything else
/// always counts. Countable items multiply by their stack size.
pub fn equipment_modifiers(catalog: &Catalog, member: &PartyMember) -> StatBlock<i32> {
    let mut mods = StatBlock::default();
    for entry in &member.equipment {
        let Some(item) = catalog.entry_item(entry) else {
            continue;
        };
        if item.requires_equip() && !entry.equipped {
            continue;
        }
        let stack = if item.countable {
            entry.count.max(1) as i32
        } else {
            1
        };
        for (stat, amount) in &item.modifiers {
            mods.set(*stat, mods.get(*stat) + amount * stack);
        }
    }
    mods
}

pub fn has_equipped_weapon(catalog: &Catalog, member: &PartyMember) -> bool {
    member.equipment.iter().any(|entry| {
        entry.equipped && catalog.entry_item(entry).is_some_and(|i| i.is_weapon())
    })
}

/// Base stat plus equipment; armour also adds battle buffs.
pub fn effective_stat(catalog: &Catalog, member: &PartyMember, stat: Stat) -> i32 {
    let mods = equipment_modifiers(catalog, member);
    effective_with(member, &mods, stat)
}

fn effective_with(member: &PartyMember, mods: &StatBlock<i32>, stat: Stat) -> i32 {
    let value = member.stat(stat) as i32 + mods.get(stat);
    if stat == Stat::Armour {
        value + member.armour_buff()
    } else {
        value
    }
}

pub fn effective_armour(catalog: &Catalog, member: &PartyMember) -> i32 {
    effective_stat(catalog, member, Stat::Armour)
}

/// Dice a hero rolls for a melee attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FightingDice {
    pub dice: u32,
    pub has_weapon: bool,
    /// Effective Fighting before the unarmed penalty.
    pub fighting: i32,
}

/// Effective Fighting, one die fewer without an equipped weapon, never negative.
pub fn fighting_dice(catalog: &Catalog, member: &PartyMember) -> FightingDice {
    let fighting = effective_stat(catalog, member, Stat::Fighting);
    let has_weapon = has_equipped_weapon(catalog, member);
    let dice = if has_weapon { fighting } else { fighting - 1 };
    FightingDice {
        dice: dice.max(0) as u32,
        has_weapon,
        fighting,
    }
}

/// A stat as shown on a hero card: base and modified value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedStat {
    pub stat: Stat,
    pub base: u32,
    pub modified: i32,
}

/// Every stat with its modified value. Fighting includes the unarmed penalty.
pub fn displayed_stats(catalog: &Catalog, member: &PartyMember) -> Vec<DisplayedStat> {
    let mods = equipment_modifiers(catalog, member);
    let armed = has_equipped_weapon(catalog, member);
    Stat::all()
        .into_iter()
        .map(|stat| {
            let mut modified = effective_with(member, &mods, stat);
            if stat == Stat::Fighting && !armed {
                modified = (modified - 1).max(0);
            }
            DisplayedStat {
                stat,
                base: member.stat(stat),
                modified,
            }
        })
        .collect()
}

/// Walk equipment in slot order and unequip anything that would exceed the
/// hand budget. First come, first served. Returns how many slots were
/// unequipped.
pub fn enforce_hand_limit(catalog: &Catalog, member: &mut PartyMember) -> usize {
    let mut used = 0;
    let mut dropped = 0;
    for entry in member.equipment.iter_mut() {
        let Some(item) = catalog.entry_item(entry) else {
            continue;
        };
        if !item.requires_equip() || !entry.equipped {
            continue;
        }
        let cost = item.hand_cost();
        if used + cost > HAND_BUDGET {
            entry.equipped = false;
            dropped += 1;
        } else {
            used += cost;
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Buff, EquipmentEntry};

    fn hero_with(catalog: &Catalog, items: &[&str]) -> PartyMember {
        let mut hero = PartyMember::new("Brash");
        hero.equipment = items.iter().map(|i| catalog.new_entry(i)).collect();
        hero
    }

    #[test]
    fn test_unarmed_penalty() {
        let catalog = Catalog::standard();
        let hero = PartyMember::new("Brash");
        let dice = fighting_dice(&catalog, &hero);
        assert_eq!(dice.dice, 2);
        assert!(!dice.has_weapon);
        assert_eq!(dice.fighting, 3);
    }

    #[test]
    fn test_unarmed_penalty_floors_at_zero() {
        let catalog = Catalog::standard();
        let hero = PartyMember::new("Brash").with_stat(Stat::Fighting, 0);
        assert_eq!(fighting_dice(&catalog, &hero).dice, 0);
    }

    #[test]
    fn test_weapon_adds_fighting() {
        let catalog = Catalog::standard();
        let hero = hero_with(&catalog, &["steel_longsword"]);
        let dice = fighting_dice(&catalog, &hero);
        assert_eq!(dice.dice, 5);
        assert!(dice.has_weapon);
    }

    #[test]
    fn test_unequipped_weapon_contributes_nothing() {
        let catalog = Catalog::standard();
        let mut hero = hero_with(&catalog, &["steel_longsword"]);
        hero.equipment[0].equipped = false;
        assert_eq!(effective_stat(&catalog, &hero, Stat::Fighting), 3);
        assert_eq!(fighting_dice(&catalog, &hero).dice, 2);
    }

    #[test]
    fn test_wearables_always_count() {
        let catalog = Catalog::standard();
        let mut hero = hero_with(&catalog, &["bronze_armour", "soft_boots"]);
        hero.equipment[0].equipped = false;
        assert_eq!(effective_armour(&catalog, &hero), 4);
        assert_eq!(effective_stat(&catalog, &hero, Stat::Stealth), 1);
    }

    #[test]
    fn test_armour_includes_buffs() {
        let catalog = Catalog::standard();
        let mut hero = hero_with(&catalog, &["hide_armour"]).with_stat(Stat::Armour, 1);
        hero.add_buff(Buff::battle_armour(3));
        assert_eq!(effective_armour(&catalog, &hero), 5);
    }

    #[test]
    fn test_countable_stack_multiplies() {
        let mut catalog = Catalog::standard();
        catalog.items.push(
            crate::items::ItemDef::gear("lucky_charm", "Lucky Charm")
                .with_modifier(Stat::Charisma, 1)
                .countable(),
        );
        let mut hero = hero_with(&catalog, &["lucky_charm"]);
        hero.equipment[0].count = 3;
        assert_eq!(effective_stat(&catalog, &hero, Stat::Charisma), 3);
    }

    #[test]
    fn test_second_two_hander_is_unequipped() {
        let catalog = Catalog::standard();
        let mut hero = hero_with(&catalog, &["shield", "maul"]);
        assert!(hero.equipment.iter().all(|e| e.equipped));
        assert_eq!(enforce_hand_limit(&catalog, &mut hero), 1);
        assert!(hero.equipment[0].equipped);
        assert!(!hero.equipment[1].equipped);
    }

    #[test]
    fn test_two_one_handers_fit() {
        let catalog = Catalog::standard();
        let mut hero = hero_with(&catalog, &["crude_blade", "steel_scimitar", "iron_shortsword"]);
        assert_eq!(enforce_hand_limit(&catalog, &mut hero), 1);
        let equipped: Vec<bool> = hero.equipment.iter().map(|e| e.equipped).collect();
        assert_eq!(equipped, vec![true, true, false]);
    }

    #[test]
    fn test_displayed_stats() {
        let catalog = Catalog::standard();
        let hero = hero_with(&catalog, &["tome_of_knowledge"]).with_stat(Stat::Lore, 2);
        let stats = displayed_stats(&catalog, &hero);
        let lore = stats.iter().find(|s| s.stat == Stat::Lore).expect("lore");
        assert_eq!((lore.base, lore.modified), (2, 4));
        let fighting = stats.iter().find(|s| s.stat == Stat::Fighting).expect("fighting");
        assert_eq!((fighting.base, fighting.modified), (3, 2));
    }

    #[test]
    fn test_empty_slots_ignored() {
        let catalog = Catalog::standard();
        let mut hero = PartyMember::new("Brash");
        hero.equipment.push(EquipmentEntry::empty());
        assert_eq!(effective_stat(&catalog, &hero, Stat::Fighting), 3);
        assert_eq!(enforce_hand_limit(&catalog, &mut hero), 0);
    }
}
