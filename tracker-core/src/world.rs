//! Combat entities: party members, opponents and their equipment and spells.
//!
//! Numeric fields are clamped on every external write; out-of-range input is
//! coerced to the nearest bound rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Limits
// ============================================================================

/// Largest value a stored stat may hold.
pub const STAT_MAX: i64 = 99;
/// Largest value the stat editor accepts.
pub const EDITOR_STAT_MAX: i64 = 50;
pub const HEALTH_MAX: i64 = 999;
pub const DICE_MAX: i64 = 99;
pub const AUTO_MAX: i64 = 99;
pub const TARGET_MIN: i64 = 2;
pub const TARGET_MAX: i64 = 6;
pub const COUNT_MAX: i64 = 999;
pub const SILVER_MAX: i64 = 999_999;

pub const EQUIPMENT_SLOTS: usize = 10;
pub const SPELL_SLOTS: usize = 6;
pub const PARTY_MAX: usize = 4;

/// Clamp `value` into `lo..=hi`.
pub fn clamp_int(value: i64, lo: i64, hi: i64) -> i64 {
    value.max(lo).min(hi)
}

pub(crate) fn clamp_stat(value: i64, hi: i64) -> u32 {
    clamp_int(value, 0, hi) as u32
}

pub(crate) fn clamp_target(value: i64) -> u8 {
    clamp_int(value, TARGET_MIN, TARGET_MAX) as u8
}

// ============================================================================
// Stats
// ============================================================================

/// The six party-member statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Fighting,
    Stealth,
    Lore,
    Survival,
    Charisma,
    Armour,
}

impl Stat {
    pub fn all() -> [Stat; 6] {
        [
            Stat::Fighting,
            Stat::Stealth,
            Stat::Lore,
            Stat::Survival,
            Stat::Charisma,
            Stat::Armour,
        ]
    }

    /// The five stats a skill check may test.
    pub fn skills() -> [Stat; 5] {
        [
            Stat::Fighting,
            Stat::Stealth,
            Stat::Lore,
            Stat::Survival,
            Stat::Charisma,
        ]
    }

    pub fn is_skill(&self) -> bool {
        !matches!(self, Stat::Armour)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Fighting => "Fighting",
            Stat::Stealth => "Stealth",
            Stat::Lore => "Lore",
            Stat::Survival => "Survival",
            Stat::Charisma => "Charisma",
            Stat::Armour => "Armour",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Stat> {
        let name = name.trim();
        Stat::all()
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One value per [`Stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock<T> {
    values: [T; 6],
}

impl<T: Copy> StatBlock<T> {
    pub fn get(&self, stat: Stat) -> T {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: T) {
        self.values[stat.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, T)> + '_ {
        Stat::all().into_iter().map(|s| (s, self.get(s)))
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// What an equipment slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ItemRef {
    #[default]
    Empty,
    /// A catalog item, by id.
    Catalog(String),
    /// Free text with no catalog match; never carries modifiers.
    Custom(String),
}

impl ItemRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, ItemRef::Empty)
    }

    pub fn catalog_id(&self) -> Option<&str> {
        match self {
            ItemRef::Catalog(id) => Some(id),
            _ => None,
        }
    }
}

/// One equipment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentEntry {
    pub item: ItemRef,
    /// Stack size, used by countable items.
    pub count: u32,
    /// Meaningful only for items that occupy hands.
    pub equipped: bool,
}

impl EquipmentEntry {
    pub fn empty() -> Self {
        Self {
            item: ItemRef::Empty,
            count: 1,
            equipped: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
    }
}

impl Default for EquipmentEntry {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Spells and buffs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellStatus {
    #[default]
    Ready,
    Exhausted,
}

/// A prepared-spell slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpellSlot {
    pub spell_id: Option<String>,
    pub status: SpellStatus,
}

impl SpellSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn prepared(spell_id: impl Into<String>) -> Self {
        Self {
            spell_id: Some(spell_id.into()),
            status: SpellStatus::Ready,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.status == SpellStatus::Exhausted
    }
}

fn empty_spell_slots() -> [SpellSlot; SPELL_SLOTS] {
    std::array::from_fn(|_| SpellSlot::empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffKind {
    Armour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuffDuration {
    BattleEnd,
}

/// A transient battle effect. Buffs stack additively without a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    pub kind: BuffKind,
    pub amount: i32,
    pub until: BuffDuration,
}

impl Buff {
    pub fn battle_armour(amount: i32) -> Self {
        Self {
            kind: BuffKind::Armour,
            amount,
            until: BuffDuration::BattleEnd,
        }
    }
}

// ============================================================================
// Vitals
// ============================================================================

/// Health bookkeeping shared by party members and opponents.
pub trait Vitals {
    fn name(&self) -> &str;
    fn health(&self) -> i32;
    fn max_health(&self) -> i32;
    fn is_dead(&self) -> bool;
    fn set_health(&mut self, health: i32);
    fn set_dead(&mut self, dead: bool);

    fn is_alive(&self) -> bool {
        !self.is_dead() && self.health() > 0
    }

    /// Lose `amount` health, never dropping below zero. Returns the new health.
    fn take_damage(&mut self, amount: u32) -> i32 {
        let health = (self.health() - amount as i32).max(0);
        self.set_health(health);
        health
    }

    /// Restore up to `amount` health, capped at maximum. Returns the amount healed.
    fn heal(&mut self, amount: u32) -> i32 {
        let before = self.health();
        let health = (before + amount as i32).min(self.max_health());
        self.set_health(health);
        health - before
    }

    /// Flag the entity dead if its health is gone. Returns true on a new death.
    fn settle_death(&mut self) -> bool {
        if !self.is_dead() && self.health() <= 0 {
            self.set_dead(true);
            self.set_health(0);
            true
        } else {
            false
        }
    }

    fn hp_display(&self) -> String {
        format!("{}/{}", self.health().max(0), self.max_health())
    }
}

// ============================================================================
// Party members
// ============================================================================

/// A hero in the party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyMember {
    pub name: String,
    pub stats: StatBlock<u32>,
    pub health: i32,
    pub max_health: i32,
    pub dead: bool,
    pub acted_this_round: bool,
    pub buffs: Vec<Buff>,
    pub equipment: Vec<EquipmentEntry>,
    pub notes: String,
    pub spells: [SpellSlot; SPELL_SLOTS],
    pub spells_used: BTreeSet<String>,
}

impl PartyMember {
    /// A fresh hero with the starting statline: Fighting 3, Health 8/8.
    pub fn new(name: impl Into<String>) -> Self {
        let mut stats = StatBlock::default();
        stats.set(Stat::Fighting, 3);
        Self {
            name: name.into(),
            stats,
            health: 8,
            max_health: 8,
            dead: false,
            acted_this_round: false,
            buffs: Vec::new(),
            equipment: Vec::new(),
            notes: String::new(),
            spells: empty_spell_slots(),
            spells_used: BTreeSet::new(),
        }
    }

    pub fn with_stat(mut self, stat: Stat, value: i64) -> Self {
        self.set_stat(stat, value, STAT_MAX);
        self
    }

    pub fn with_health(mut self, health: i64, max_health: i64) -> Self {
        self.set_max_health(max_health);
        self.set_current_health(health);
        self
    }

    pub fn stat(&self, stat: Stat) -> u32 {
        self.stats.get(stat)
    }

    /// Set a base stat, clamped to `0..=hi`.
    pub fn set_stat(&mut self, stat: Stat, value: i64, hi: i64) {
        self.stats.set(stat, clamp_stat(value, hi));
    }

    /// Set maximum health (1–999), pulling current health down if needed.
    pub fn set_max_health(&mut self, value: i64) {
        self.max_health = clamp_int(value, 1, HEALTH_MAX) as i32;
        self.health = self.health.min(self.max_health);
    }

    /// Set current health (0–maximum); the dead flag follows.
    pub fn set_current_health(&mut self, value: i64) {
        self.health = clamp_int(value, 0, self.max_health as i64) as i32;
        self.dead = self.health <= 0;
    }

    /// Alive and still holding an action this round.
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.acted_this_round
    }

    /// Total armour granted by active buffs.
    pub fn armour_buff(&self) -> i32 {
        self.buffs
            .iter()
            .filter(|b| b.kind == BuffKind::Armour)
            .map(|b| b.amount)
            .sum()
    }

    pub fn add_buff(&mut self, buff: Buff) {
        self.buffs.push(buff);
    }

    /// The occupied slot holding `spell_id`, if the hero knows it.
    pub fn known_spell(&self, spell_id: &str) -> Option<&SpellSlot> {
        self.spells
            .iter()
            .find(|s| s.spell_id.as_deref() == Some(spell_id))
    }

    pub fn known_spell_mut(&mut self, spell_id: &str) -> Option<&mut SpellSlot> {
        self.spells
            .iter_mut()
            .find(|s| s.spell_id.as_deref() == Some(spell_id))
    }

    pub fn clear_spells(&mut self) {
        self.spells = empty_spell_slots();
    }

    /// Forget everything that only lasts one battle.
    pub fn reset_battle_state(&mut self) {
        self.acted_this_round = false;
        self.buffs.clear();
        self.spells_used.clear();
    }
}

impl Vitals for PartyMember {
    fn name(&self) -> &str {
        &self.name
    }
    fn health(&self) -> i32 {
        self.health
    }
    fn max_health(&self) -> i32 {
        self.max_health
    }
    fn is_dead(&self) -> bool {
        self.dead
    }
    fn set_health(&mut self, health: i32) {
        self.health = health;
    }
    fn set_dead(&mut self, dead: bool) {
        self.dead = dead;
    }
}

// ============================================================================
// Opponents
// ============================================================================

/// Editable opponent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentField {
    AtkDice,
    AtkTarget,
    Auto,
    DefTarget,
    Health,
    MaxHealth,
}

impl OpponentField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "atkdice" | "atk-dice" | "dice" => Some(OpponentField::AtkDice),
            "atktarget" | "atk-target" => Some(OpponentField::AtkTarget),
            "auto" => Some(OpponentField::Auto),
            "deftarget" | "def-target" | "def" => Some(OpponentField::DefTarget),
            "health" | "hp" => Some(OpponentField::Health),
            "maxhealth" | "max-health" | "maxhp" => Some(OpponentField::MaxHealth),
            _ => None,
        }
    }
}

/// A monster on the other side of the fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    pub name: String,
    pub atk_dice: u32,
    /// Face each attack die needs to hit.
    pub atk_target: u8,
    /// Guaranteed extra damage per attack.
    pub auto: u32,
    /// Face a party attack die needs to hit this opponent.
    pub def_target: u8,
    pub health: i32,
    pub max_health: i32,
    pub dead: bool,
}

impl Opponent {
    /// Build an opponent, clamping every field into range.
    pub fn new(
        name: impl Into<String>,
        atk_dice: i64,
        atk_target: i64,
        auto: i64,
        def_target: i64,
        health: i64,
        max_health: i64,
    ) -> Self {
        let mut name = name.into();
        if name.trim().is_empty() {
            name = "Mob".to_string();
        }
        let max_health = clamp_int(max_health, 1, HEALTH_MAX) as i32;
        let health = clamp_int(health, 0, max_health as i64) as i32;
        Self {
            name,
            atk_dice: clamp_stat(atk_dice, DICE_MAX),
            atk_target: clamp_target(atk_target),
            auto: clamp_stat(auto, AUTO_MAX),
            def_target: clamp_target(def_target),
            health,
            max_health,
            dead: health <= 0,
        }
    }

    /// The default opponent: `Goblin 4(5+) 4+ 6`.
    pub fn goblin() -> Self {
        Self::new("Goblin", 4, 5, 0, 4, 6, 6)
    }

    pub fn set_field(&mut self, field: OpponentField, value: i64) {
        match field {
            OpponentField::AtkDice => self.atk_dice = clamp_stat(value, DICE_MAX),
            OpponentField::AtkTarget => self.atk_target = clamp_target(value),
            OpponentField::Auto => self.auto = clamp_stat(value, AUTO_MAX),
            OpponentField::DefTarget => self.def_target = clamp_target(value),
            OpponentField::MaxHealth => {
                self.max_health = clamp_int(value, 1, HEALTH_MAX) as i32;
                self.health = self.health.min(self.max_health);
                self.dead = self.health <= 0;
            }
            OpponentField::Health => {
                self.health = clamp_int(value, 0, self.max_health as i64) as i32;
                self.dead = self.health <= 0;
            }
        }
    }

    pub fn set_name(&mut self, name: &str) {
        let name = name.trim();
        self.name = if name.is_empty() { "Mob" } else { name }.to_string();
    }

    /// The attack profile as imported: `4(5+)` or `3(4+) + 2 Auto`.
    pub fn attack_display(&self) -> String {
        if self.auto > 0 {
            format!("{}({}+) + {} Auto", self.atk_dice, self.atk_target, self.auto)
        } else {
            format!("{}({}+)", self.atk_dice, self.atk_target)
        }
    }
}

impl Vitals for Opponent {
    fn name(&self) -> &str {
        &self.name
    }
    fn health(&self) -> i32 {
        self.health
    }
    fn max_health(&self) -> i32 {
        self.max_health
    }
    fn is_dead(&self) -> bool {
        self.dead
    }
    fn set_health(&mut self, health: i32) {
        self.health = health;
    }
    fn set_dead(&mut self, dead: bool) {
        self.dead = dead;
    }
}
