//! Setup editing: roster, stats, equipment, spells and opponents.
//!
//! Every edit clamps its input and invalidates the battle seed, so the next
//! start re-seeds from the edited setup. Adding or removing combatants is
//! refused while combat is running.

use crate::import::{parse_encounter, ImportError};
use crate::modifiers::enforce_hand_limit;
use crate::session::{CombatSession, Phase};
use crate::world::{
    clamp_int, Opponent, OpponentField, PartyMember, SpellSlot, SpellStatus, Stat, COUNT_MAX,
    EDITOR_STAT_MAX, EQUIPMENT_SLOTS, PARTY_MAX, SILVER_MAX, SPELL_SLOTS,
};
use std::sync::Arc;
use thiserror::Error;

/// Rejected setup edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Unknown hero: {0}")]
    UnknownHero(String),

    #[error("{0} is already in the party")]
    DuplicateHero(String),

    #[error("The party is full (4 heroes)")]
    PartyFull,

    #[error("No party member at index {0}")]
    NoSuchMember(usize),

    #[error("No opponent at index {0}")]
    NoSuchOpponent(usize),

    #[error("No equipment slot {0}")]
    NoSuchSlot(usize),

    #[error("All 10 equipment slots are in use")]
    EquipmentFull,

    #[error("{0} cannot prepare spells")]
    NotSpellcaster(String),

    #[error("Unknown spell: {0}")]
    UnknownSpell(String),

    #[error("Cannot change combatants during combat")]
    InCombat,

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl CombatSession {
    fn invalidate_seed(&mut self) {
        if self.state.battle_seed.take().is_some() {
            tracing::debug!("battle seed invalidated by setup edit");
        }
    }

    fn ensure_not_in_combat(&self) -> Result<(), SetupError> {
        if self.state.phase == Phase::Combat {
            Err(SetupError::InCombat)
        } else {
            Ok(())
        }
    }

    fn member_mut(&mut self, index: usize) -> Result<&mut PartyMember, SetupError> {
        self.state
            .party
            .get_mut(index)
            .ok_or(SetupError::NoSuchMember(index))
    }

    fn opponent_mut(&mut self, index: usize) -> Result<&mut Opponent, SetupError> {
        self.state
            .mobs
            .get_mut(index)
            .ok_or(SetupError::NoSuchOpponent(index))
    }

    // ========================================================================
    // Party
    // ========================================================================

    /// Add a roster hero with the starting statline. Returns their index.
    pub fn add_member(&mut self, name: &str) -> Result<usize, SetupError> {
        self.ensure_not_in_combat()?;
        let name = self
            .catalog
            .roster
            .canonical(name)
            .ok_or_else(|| SetupError::UnknownHero(name.trim().to_string()))?
            .to_string();
        if self.state.party.iter().any(|p| p.name == name) {
            return Err(SetupError::DuplicateHero(name));
        }
        if self.state.party.len() >= PARTY_MAX {
            return Err(SetupError::PartyFull);
        }
        self.state.party.push(PartyMember::new(name));
        self.invalidate_seed();
        Ok(self.state.party.len() - 1)
    }

    pub fn remove_member(&mut self, index: usize) -> Result<PartyMember, SetupError> {
        self.ensure_not_in_combat()?;
        if index >= self.state.party.len() {
            return Err(SetupError::NoSuchMember(index));
        }
        let removed = self.state.party.remove(index);
        self.invalidate_seed();
        Ok(removed)
    }

    pub fn clear_party(&mut self) -> Result<(), SetupError> {
        self.ensure_not_in_combat()?;
        self.state.party.clear();
        self.invalidate_seed();
        Ok(())
    }

    /// Set a base stat, clamped to the editor range 0-50.
    pub fn set_stat(&mut self, index: usize, stat: Stat, value: i64) -> Result<u32, SetupError> {
        let member = self.member_mut(index)?;
        member.set_stat(stat, value, EDITOR_STAT_MAX);
        let stored = member.stat(stat);
        self.invalidate_seed();
        Ok(stored)
    }

    /// Set maximum health (1-999); current health is pulled down to fit.
    pub fn set_max_health(&mut self, index: usize, value: i64) -> Result<i32, SetupError> {
        let member = self.member_mut(index)?;
        member.set_max_health(value);
        member.dead = member.health <= 0;
        let stored = member.max_health;
        self.invalidate_seed();
        Ok(stored)
    }

    /// Set current health (0-maximum). Zero marks the hero dead.
    pub fn set_health(&mut self, index: usize, value: i64) -> Result<i32, SetupError> {
        let member = self.member_mut(index)?;
        member.set_current_health(value);
        let stored = member.health;
        self.invalidate_seed();
        Ok(stored)
    }

    pub fn set_notes(&mut self, index: usize, notes: &str) -> Result<(), SetupError> {
        self.member_mut(index)?.notes = notes.to_string();
        self.invalidate_seed();
        Ok(())
    }

    pub fn set_silver_coins(&mut self, value: i64) -> u32 {
        self.silver_coins = clamp_int(value, 0, SILVER_MAX) as u32;
        self.silver_coins
    }

    // ========================================================================
    // Equipment
    // ========================================================================

    /// Put an item (catalog id, catalog name or free text) in a new slot.
    pub fn add_equipment(&mut self, index: usize, text: &str) -> Result<usize, SetupError> {
        let entry = self.catalog.new_entry(text);
        let catalog = Arc::clone(&self.catalog);
        let member = self.member_mut(index)?;
        if member.equipment.len() >= EQUIPMENT_SLOTS {
            return Err(SetupError::EquipmentFull);
        }
        member.equipment.push(entry);
        enforce_hand_limit(&catalog, member);
        let slot = member.equipment.len() - 1;
        self.invalidate_seed();
        Ok(slot)
    }

    pub fn remove_equipment(&mut self, index: usize, slot: usize) -> Result<(), SetupError> {
        let member = self.member_mut(index)?;
        if slot >= member.equipment.len() {
            return Err(SetupError::NoSuchSlot(slot));
        }
        member.equipment.remove(slot);
        self.invalidate_seed();
        Ok(())
    }

    /// Replace what a slot holds. Count resets to 1.
    pub fn set_equipment_item(
        &mut self,
        index: usize,
        slot: usize,
        text: &str,
    ) -> Result<(), SetupError> {
        let entry = self.catalog.new_entry(text);
        let catalog = Arc::clone(&self.catalog);
        let member = self.member_mut(index)?;
        let current = member
            .equipment
            .get_mut(slot)
            .ok_or(SetupError::NoSuchSlot(slot))?;
        *current = entry;
        enforce_hand_limit(&catalog, member);
        self.invalidate_seed();
        Ok(())
    }

    pub fn set_equipment_count(
        &mut self,
        index: usize,
        slot: usize,
        count: i64,
    ) -> Result<u32, SetupError> {
        let member = self.member_mut(index)?;
        let entry = member
            .equipment
            .get_mut(slot)
            .ok_or(SetupError::NoSuchSlot(slot))?;
        entry.count = clamp_int(count, 1, COUNT_MAX) as u32;
        let stored = entry.count;
        self.invalidate_seed();
        Ok(stored)
    }

    /// Equip or unequip a slot, then re-run the hand allocator.
    ///
    /// Returns whether the slot ended up equipped.
    pub fn set_equipped(
        &mut self,
        index: usize,
        slot: usize,
        equipped: bool,
    ) -> Result<bool, SetupError> {
        let catalog = Arc::clone(&self.catalog);
        let member = self.member_mut(index)?;
        member
            .equipment
            .get_mut(slot)
            .ok_or(SetupError::NoSuchSlot(slot))?
            .equipped = equipped;
        enforce_hand_limit(&catalog, member);
        let result = member.equipment[slot].equipped;
        self.invalidate_seed();
        Ok(result)
    }

    // ========================================================================
    // Spells
    // ========================================================================

    /// Prepare a spell (by id or name) in a slot, or clear it with `None`.
    pub fn set_spell(
        &mut self,
        index: usize,
        slot: usize,
        spell: Option<&str>,
    ) -> Result<(), SetupError> {
        if slot >= SPELL_SLOTS {
            return Err(SetupError::NoSuchSlot(slot));
        }
        let spell_id = match spell {
            Some(text) => Some(
                self.catalog
                    .resolve_spell(text)
                    .map(|s| s.id.clone())
                    .ok_or_else(|| SetupError::UnknownSpell(text.trim().to_string()))?,
            ),
            None => None,
        };
        let is_caster = {
            let member = self
                .state
                .party
                .get(index)
                .ok_or(SetupError::NoSuchMember(index))?;
            self.catalog.roster.is_spellcaster(&member.name)
        };
        let member = self.member_mut(index)?;
        if !is_caster {
            return Err(SetupError::NotSpellcaster(member.name.clone()));
        }
        member.spells[slot] = match spell_id {
            Some(id) => SpellSlot::prepared(id),
            None => SpellSlot::empty(),
        };
        self.invalidate_seed();
        Ok(())
    }

    pub fn set_spell_status(
        &mut self,
        index: usize,
        slot: usize,
        status: SpellStatus,
    ) -> Result<(), SetupError> {
        let member = self.member_mut(index)?;
        let spell = member
            .spells
            .get_mut(slot)
            .ok_or(SetupError::NoSuchSlot(slot))?;
        spell.status = status;
        self.invalidate_seed();
        Ok(())
    }

    // ========================================================================
    // Opponents
    // ========================================================================

    /// Add a default Goblin. Returns its index.
    pub fn add_opponent(&mut self) -> Result<usize, SetupError> {
        self.ensure_not_in_combat()?;
        self.state.mobs.push(Opponent::goblin());
        self.invalidate_seed();
        Ok(self.state.mobs.len() - 1)
    }

    pub fn remove_opponent(&mut self, index: usize) -> Result<Opponent, SetupError> {
        self.ensure_not_in_combat()?;
        if index >= self.state.mobs.len() {
            return Err(SetupError::NoSuchOpponent(index));
        }
        let removed = self.state.mobs.remove(index);
        self.invalidate_seed();
        Ok(removed)
    }

    pub fn clear_opponents(&mut self) -> Result<(), SetupError> {
        self.ensure_not_in_combat()?;
        self.state.mobs.clear();
        self.invalidate_seed();
        Ok(())
    }

    pub fn set_opponent_name(&mut self, index: usize, name: &str) -> Result<(), SetupError> {
        self.opponent_mut(index)?.set_name(name);
        self.invalidate_seed();
        Ok(())
    }

    pub fn set_opponent_field(
        &mut self,
        index: usize,
        field: OpponentField,
        value: i64,
    ) -> Result<(), SetupError> {
        self.opponent_mut(index)?.set_field(field, value);
        self.invalidate_seed();
        Ok(())
    }

    /// Replace every opponent with a parsed encounter block.
    ///
    /// Nothing changes unless the whole text parses.
    pub fn import_opponents(&mut self, text: &str) -> Result<usize, SetupError> {
        self.ensure_not_in_combat()?;
        let mobs = parse_encounter(text)?;
        let count = mobs.len();
        self.state.mobs = mobs;
        self.invalidate_seed();
        tracing::info!(count, "imported opponents");
        Ok(count)
    }
}
