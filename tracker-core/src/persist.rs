//! Setup persistence for save/load.
//!
//! Only the setup is saved: silver, party and opponents. Loading is lenient.
//! Out-of-range numbers are clamped and unknown heroes dropped, and equipment
//! may be a bare string or an object. A file that cannot be read at all is
//! treated as "no saved data".

use crate::catalog::Catalog;
use crate::config::TrackerConfig;
use crate::modifiers::enforce_hand_limit;
use crate::session::{CombatSession, CombatState};
use crate::world::{
    clamp_int, EquipmentEntry, ItemRef, Opponent, PartyMember, SpellSlot, SpellStatus, Stat,
    COUNT_MAX, EQUIPMENT_SLOTS, HEALTH_MAX, PARTY_MAX, SILVER_MAX, SPELL_SLOTS, STAT_MAX,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

fn current_version() -> u32 {
    SAVE_VERSION
}

/// Deserializers for hand-edited or older saves.
///
/// Numbers may arrive as ints, floats or numeric strings and are read like a
/// leading-integer parse. Anything unreadable becomes "missing", so the usual
/// fallbacks and clamps apply instead of the whole file being rejected.
mod lenient {
    use serde::de::{DeserializeOwned, Deserializer};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => leading_int(s),
            _ => None,
        }
    }

    fn leading_int(text: &str) -> Option<i64> {
        let text = text.trim_start();
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, text.strip_prefix('+').unwrap_or(text)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        // Too many digits for i64: saturate, the caller clamps anyway.
        let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        Some(sign * magnitude)
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(to_int(&Value::deserialize(d)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(d)?.unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            _ => None,
        })
    }

    /// Array entries that parse. A non-array reads as empty; nulls and
    /// malformed entries are skipped.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter(|v| !v.is_null())
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Positional slots: an entry that does not parse keeps its place as `None`.
    pub fn slots<'de, D, T>(d: D) -> Result<Vec<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(optional_slots(d)?.unwrap_or_default())
    }

    pub fn optional_slots<'de, D, T>(d: D) -> Result<Option<Vec<Option<T>>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(|v| serde_json::from_value(v).ok())
                    .collect(),
            ),
            _ => None,
        })
    }
}

/// An equipment slot as stored: a bare item name, or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEquipment {
    Text(String),
    Entry {
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        id: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        name: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        custom: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient::int",
            skip_serializing_if = "Option::is_none"
        )]
        count: Option<i64>,
        #[serde(
            default,
            deserialize_with = "lenient::flag",
            skip_serializing_if = "Option::is_none"
        )]
        equipped: Option<bool>,
    },
}

/// A spell slot as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpellSlot {
    #[serde(default, alias = "spellId", deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
}

/// A saved hero. Missing fields fall back to the starting statline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSetup {
    #[serde(default, deserialize_with = "lenient::name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub fighting: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub stealth: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub lore: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub survival: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub charisma: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub armour: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub health: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub max_health: Option<i64>,
    #[serde(default, deserialize_with = "lenient::slots")]
    pub equipment: Vec<Option<RawEquipment>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_slots")]
    pub spells: Option<Vec<Option<RawSpellSlot>>>,
}

/// A saved opponent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentSetup {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub atk_dice: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub atk_target: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub auto: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub def_target: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub health: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub max_health: Option<i64>,
}

/// The saved setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub silver_coins: Option<i64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub party: Vec<MemberSetup>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub mobs: Vec<OpponentSetup>,
}

impl SetupSnapshot {
    /// The default table: Akihiro of Chalice (Fighting 4) against a Goblin.
    pub fn starter() -> Self {
        Self {
            version: SAVE_VERSION,
            silver_coins: Some(0),
            party: vec![MemberSetup {
                name: "Akihiro of Chalice".to_string(),
                fighting: Some(4),
                armour: Some(0),
                health: Some(8),
                max_health: Some(8),
                ..MemberSetup::default()
            }],
            mobs: vec![OpponentSetup::from(&Opponent::goblin())],
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let snapshot: Self = serde_json::from_str(content)?;
        if snapshot.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json()?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

// ============================================================================
// Live state -> snapshot
// ============================================================================

impl From<&Opponent> for OpponentSetup {
    fn from(mob: &Opponent) -> Self {
        Self {
            name: Some(mob.name.clone()),
            atk_dice: Some(mob.atk_dice as i64),
            atk_target: Some(mob.atk_target as i64),
            auto: Some(mob.auto as i64),
            def_target: Some(mob.def_target as i64),
            health: Some(mob.health as i64),
            max_health: Some(mob.max_health as i64),
        }
    }
}

fn equipment_to_raw(entry: &EquipmentEntry) -> Option<RawEquipment> {
    let (id, custom) = match &entry.item {
        ItemRef::Empty => return None,
        ItemRef::Catalog(id) => (Some(id.clone()), None),
        ItemRef::Custom(text) => (None, Some(text.clone())),
    };
    Some(RawEquipment::Entry {
        id,
        name: None,
        custom,
        count: Some(entry.count as i64),
        equipped: Some(entry.equipped),
    })
}

impl From<&PartyMember> for MemberSetup {
    fn from(member: &PartyMember) -> Self {
        let stat = |s: Stat| Some(member.stat(s) as i64);
        Self {
            name: member.name.clone(),
            fighting: stat(Stat::Fighting),
            stealth: stat(Stat::Stealth),
            lore: stat(Stat::Lore),
            survival: stat(Stat::Survival),
            charisma: stat(Stat::Charisma),
            armour: stat(Stat::Armour),
            health: Some(member.health as i64),
            max_health: Some(member.max_health as i64),
            equipment: member.equipment.iter().map(equipment_to_raw).collect(),
            notes: Some(member.notes.clone()),
            spells: Some(
                member
                    .spells
                    .iter()
                    .map(|slot| {
                        Some(RawSpellSlot {
                            id: slot.spell_id.clone(),
                            status: Some(
                                match slot.status {
                                    SpellStatus::Ready => "ready",
                                    SpellStatus::Exhausted => "exhausted",
                                }
                                .to_string(),
                            ),
                        })
                    })
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Snapshot -> live state
// ============================================================================

fn equipment_from_raw(catalog: &Catalog, raw: &RawEquipment) -> EquipmentEntry {
    match raw {
        RawEquipment::Text(text) => catalog.new_entry(text),
        RawEquipment::Entry {
            id,
            name,
            custom,
            count,
            equipped,
        } => {
            let key = [id, name, custom]
                .into_iter()
                .flatten()
                .find(|s| !s.trim().is_empty())
                .map(String::as_str)
                .unwrap_or("");
            let mut entry = catalog.new_entry(key);
            if let Some(equipped) = equipped {
                entry.equipped = *equipped;
            }
            entry.count = clamp_int(count.unwrap_or(1), 1, COUNT_MAX) as u32;
            entry
        }
    }
}

fn spells_from_raw(
    catalog: &Catalog,
    raw: Option<&Vec<Option<RawSpellSlot>>>,
) -> [SpellSlot; SPELL_SLOTS] {
    std::array::from_fn(|i| {
        let Some(Some(slot)) = raw.and_then(|slots| slots.get(i)) else {
            return SpellSlot::empty();
        };
        let spell_id = slot
            .id
            .as_deref()
            .and_then(|id| catalog.spell(id))
            .map(|s| s.id.clone());
        SpellSlot {
            status: match (&spell_id, slot.status.as_deref()) {
                (Some(_), Some("exhausted")) => SpellStatus::Exhausted,
                _ => SpellStatus::Ready,
            },
            spell_id,
        }
    })
}

fn member_from_setup(catalog: &Catalog, setup: &MemberSetup) -> PartyMember {
    let mut member = PartyMember::new(setup.name.clone());
    let stats = [
        (Stat::Fighting, setup.fighting, 3),
        (Stat::Stealth, setup.stealth, 0),
        (Stat::Lore, setup.lore, 0),
        (Stat::Survival, setup.survival, 0),
        (Stat::Charisma, setup.charisma, 0),
        (Stat::Armour, setup.armour, 0),
    ];
    for (stat, value, fallback) in stats {
        member.set_stat(stat, value.unwrap_or(fallback), STAT_MAX);
    }
    member.set_max_health(clamp_int(setup.max_health.unwrap_or(8), 1, HEALTH_MAX));
    member.set_current_health(setup.health.unwrap_or(8));
    member.equipment = setup
        .equipment
        .iter()
        .flatten()
        .map(|raw| equipment_from_raw(catalog, raw))
        .filter(|entry| !entry.is_empty())
        .take(EQUIPMENT_SLOTS)
        .collect();
    enforce_hand_limit(catalog, &mut member);
    member.notes = setup.notes.clone().unwrap_or_default();
    if catalog.roster.is_spellcaster(&member.name) {
        member.spells = spells_from_raw(catalog, setup.spells.as_ref());
    }
    member
}

fn opponent_from_setup(setup: &OpponentSetup) -> Opponent {
    Opponent::new(
        setup.name.clone().unwrap_or_else(|| "Mob".to_string()),
        setup.atk_dice.unwrap_or(3),
        setup.atk_target.unwrap_or(4),
        setup.auto.unwrap_or(0),
        setup.def_target.unwrap_or(4),
        setup.health.unwrap_or(6),
        setup.max_health.unwrap_or(6),
    )
}

impl CombatSession {
    /// The current setup in savable form.
    pub fn snapshot_setup(&self) -> SetupSnapshot {
        SetupSnapshot {
            version: SAVE_VERSION,
            silver_coins: Some(self.silver_coins as i64),
            party: self.state.party.iter().map(MemberSetup::from).collect(),
            mobs: self.state.mobs.iter().map(OpponentSetup::from).collect(),
        }
    }

    /// Replace the session's setup with a snapshot, back in the setup phase.
    ///
    /// Unknown or repeated heroes are dropped and the party is cut to four.
    pub fn apply_snapshot(&mut self, snapshot: &SetupSnapshot) {
        let catalog = Arc::clone(&self.catalog);
        let mut seen = HashSet::new();
        let party: Vec<PartyMember> = snapshot
            .party
            .iter()
            .filter(|m| catalog.roster.contains(&m.name))
            .filter(|m| seen.insert(m.name.clone()))
            .take(PARTY_MAX)
            .map(|m| member_from_setup(&catalog, m))
            .collect();
        let dropped = snapshot.party.len() - party.len();
        if dropped > 0 {
            tracing::warn!(dropped, "ignored unknown, duplicate or extra heroes in save");
        }

        self.silver_coins = clamp_int(snapshot.silver_coins.unwrap_or(0), 0, SILVER_MAX) as u32;
        self.state = CombatState {
            party,
            mobs: snapshot.mobs.iter().map(opponent_from_setup).collect(),
            ..CombatState::default()
        };
        self.history.clear();
        self.reset_skill_check();
    }

    /// Load a saved setup, falling back to the starter table if the file is
    /// missing or unreadable.
    pub async fn load_or_starter(
        path: impl AsRef<Path>,
        config: &TrackerConfig,
        catalog: Arc<Catalog>,
    ) -> Self {
        let path = path.as_ref();
        match Self::load(path, config, Arc::clone(&catalog)).await {
            Ok(session) => {
                tracing::info!(path = %path.display(), "loaded setup");
                session
            }
            Err(PersistError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no saved setup, using starter");
                Self::starter_with_config(config, catalog)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "saved setup unusable, using starter");
                Self::starter_with_config(config, catalog)
            }
        }
    }

    fn starter_with_config(config: &TrackerConfig, catalog: Arc<Catalog>) -> Self {
        let mut session = Self::with_config(config, catalog);
        session.apply_snapshot(&SetupSnapshot::starter());
        session
    }
}
