//! Spell catalog and spell effect definitions.
//!
//! Spells are static reference data: the engine reads a [`SpellDef`] to
//! decide who may cast it, what it targets, and which effect steps run.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// When a spell may be cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpellTiming {
    Combat,
    CombatOrAdventure,
    Adventure,
}

impl SpellTiming {
    pub fn in_combat(&self) -> bool {
        !matches!(self, SpellTiming::Adventure)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpellTiming::Combat => "Combat",
            SpellTiming::CombatOrAdventure => "Combat or adventure",
            SpellTiming::Adventure => "Adventure",
        }
    }
}

/// What a spell's targets are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetMode {
    SingleEnemy,
    /// `count` enemies, each at most once.
    MultiEnemyDistinct { count: usize },
    SingleAlly,
}

impl TargetMode {
    pub fn enemy_count(&self) -> usize {
        match self {
            TargetMode::SingleEnemy => 1,
            TargetMode::MultiEnemyDistinct { count } => *count,
            TargetMode::SingleAlly => 0,
        }
    }

    pub fn targets_ally(&self) -> bool {
        matches!(self, TargetMode::SingleAlly)
    }
}

/// One effect a spell applies, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SpellStep {
    /// Roll `fighting` dice against an enemy's defence, once per target up to `times`.
    AttackFixed { fighting: u32, times: usize },
    /// Flat damage that ignores defence.
    DamageFixed { amount: u32 },
    /// Armour bonus on an ally until the battle ends.
    BuffArmour { amount: i32 },
    /// Restore health on an ally, capped at maximum.
    HealFixed { amount: u32 },
}

/// A spell definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    pub timing: SpellTiming,
    pub once_per_battle: bool,
    pub target_mode: TargetMode,
    pub steps: Vec<SpellStep>,
    /// Cost to ready the spell again after it is exhausted.
    pub recharge: u32,
}

impl SpellDef {
    fn new(id: &str, name: &str, target_mode: TargetMode, recharge: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            timing: SpellTiming::Combat,
            once_per_battle: true,
            target_mode,
            steps: Vec::new(),
            recharge,
        }
    }

    fn with_timing(mut self, timing: SpellTiming) -> Self {
        self.timing = timing;
        self
    }

    fn with_step(mut self, step: SpellStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Label for spell pickers: `Ice Bolt (Combat • Recharge 3)`.
    pub fn option_label(&self) -> String {
        format!(
            "{} ({} • Recharge {})",
            self.name,
            self.timing.label(),
            self.recharge
        )
    }
}

/// Every spell a caster can prepare.
pub static SPELLS: LazyLock<Vec<SpellDef>> = LazyLock::new(build_spell_list);

/// Get a spell by id.
pub fn get_spell(id: &str) -> Option<&'static SpellDef> {
    resolve_spell(&SPELLS, id)
}

/// Resolve a spell by id, then case-insensitive name.
pub fn resolve_spell<'a>(spells: &'a [SpellDef], id_or_name: &str) -> Option<&'a SpellDef> {
    let needle = id_or_name.trim();
    if needle.is_empty() {
        return None;
    }
    spells.iter().find(|s| s.id == needle).or_else(|| {
        let lower = needle.to_lowercase();
        spells.iter().find(|s| s.name.to_lowercase() == lower)
    })
}

fn build_spell_list() -> Vec<SpellDef> {
    vec![
        SpellDef::new(
            "poison_stream",
            "Poison Stream",
            TargetMode::MultiEnemyDistinct { count: 2 },
            2,
        )
        .with_step(SpellStep::AttackFixed {
            fighting: 5,
            times: 2,
        }),
        SpellDef::new("unfailing_strike", "Unfailing Strike", TargetMode::SingleEnemy, 1)
            .with_step(SpellStep::DamageFixed { amount: 3 }),
        SpellDef::new("armour_of_heaven", "Armour of Heaven", TargetMode::SingleAlly, 2)
            .with_step(SpellStep::BuffArmour { amount: 3 }),
        SpellDef::new("ice_bolt", "Ice Bolt", TargetMode::SingleEnemy, 3).with_step(
            SpellStep::AttackFixed {
                fighting: 8,
                times: 1,
            },
        ),
        SpellDef::new("soothing_touch", "Soothing Touch", TargetMode::SingleAlly, 1)
            .with_timing(SpellTiming::CombatOrAdventure)
            .with_step(SpellStep::HealFixed { amount: 5 }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_lookup() {
        assert_eq!(get_spell("ice_bolt").map(|s| s.name.as_str()), Some("Ice Bolt"));
        assert_eq!(
            get_spell("Soothing Touch").map(|s| s.id.as_str()),
            Some("soothing_touch")
        );
        assert!(get_spell("fireball").is_none());
    }

    #[test]
    fn test_every_spell_is_combat_eligible() {
        assert_eq!(SPELLS.len(), 5);
        assert!(SPELLS.iter().all(|s| s.timing.in_combat()));
        assert!(SPELLS.iter().all(|s| s.once_per_battle));
        assert!(!SpellTiming::Adventure.in_combat());
    }

    #[test]
    fn test_poison_stream_targets_two() {
        let spell = get_spell("poison_stream").expect("poison stream");
        assert_eq!(spell.target_mode.enemy_count(), 2);
        assert_eq!(
            spell.steps,
            vec![SpellStep::AttackFixed {
                fighting: 5,
                times: 2
            }]
        );
    }

    #[test]
    fn test_option_label() {
        let spell = get_spell("ice_bolt").expect("ice bolt");
        assert_eq!(spell.option_label(), "Ice Bolt (Combat • Recharge 3)");
    }
}
