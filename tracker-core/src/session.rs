//! CombatSession - the primary public API for running an encounter.
//!
//! A session owns the authoritative [`CombatState`], the undo history, the
//! dice source and a shared read-only [`Catalog`]. Setup edits live in
//! `setup`, combat actions in `actions`; this module holds the turn and phase
//! state machine plus start, restart and undo.

use crate::actions::CastRejection;
use crate::catalog::Catalog;
use crate::command::CommandError;
use crate::config::TrackerConfig;
use crate::dice::{DiceRoller, RngDice};
use crate::history::History;
use crate::import::ImportError;
use crate::modifiers::enforce_hand_limit;
use crate::persist::{PersistError, SetupSnapshot};
use crate::setup::SetupError;
use crate::skill_check::{SkillCheckError, SkillCheckPanel};
use crate::world::{Opponent, PartyMember, Vitals};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the operator console.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Save error: {0}")]
    Persist(#[from] PersistError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("{0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Setup(#[from] SetupError),

    #[error("{0}")]
    Cast(#[from] CastRejection),

    #[error("{0}")]
    SkillCheck(#[from] SkillCheckError),
}

/// Logged when combat cannot start.
pub const START_REFUSED: &str = "(!) Need at least 1 party member and 1 opponent to start.";

/// Encounter phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Setup,
    Combat,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Combat => "combat",
            Phase::Ended => "ended",
        };
        write!(f, "{}", name)
    }
}

/// Whose turn it is during combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    #[default]
    Party,
    Enemies,
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turn::Party => write!(f, "party"),
            Turn::Enemies => write!(f, "enemies"),
        }
    }
}

/// The clean starting point of a battle, kept so it can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSeed {
    pub party: Vec<PartyMember>,
    pub mobs: Vec<Opponent>,
    pub round: u32,
    pub turn: Turn,
    pub enemy_index: usize,
}

/// Everything an undo restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub phase: Phase,
    pub round: u32,
    pub turn: Turn,
    pub party: Vec<PartyMember>,
    pub mobs: Vec<Opponent>,
    /// Next opponent to act; always a living mob or past the end.
    pub enemy_index: usize,
    pub log: Vec<String>,
    pub battle_seed: Option<BattleSeed>,
}

impl Default for CombatState {
    fn default() -> Self {
        Self {
            phase: Phase::Setup,
            round: 1,
            turn: Turn::Party,
            party: Vec::new(),
            mobs: Vec::new(),
            enemy_index: 0,
            log: Vec::new(),
            battle_seed: None,
        }
    }
}

impl CombatState {
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn in_combat(&self) -> bool {
        self.phase == Phase::Combat
    }

    pub fn is_party_turn(&self) -> bool {
        self.phase == Phase::Combat && self.turn == Turn::Party
    }

    pub fn is_enemy_turn(&self) -> bool {
        self.phase == Phase::Combat && self.turn == Turn::Enemies
    }

    pub fn living_party(&self) -> impl Iterator<Item = (usize, &PartyMember)> {
        self.party.iter().enumerate().filter(|(_, p)| p.is_alive())
    }

    pub fn living_mobs(&self) -> impl Iterator<Item = (usize, &Opponent)> {
        self.mobs.iter().enumerate().filter(|(_, m)| m.is_alive())
    }

    pub fn first_living_member(&self) -> Option<usize> {
        self.living_party().map(|(i, _)| i).next()
    }

    /// First living mob at or after `from`.
    pub fn next_living_mob(&self, from: usize) -> Option<usize> {
        self.mobs
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, m)| m.is_alive())
            .map(|(i, _)| i)
    }

    /// The opponent whose attack is next, skipping the dead.
    pub fn current_enemy(&self) -> Option<usize> {
        self.next_living_mob(self.enemy_index)
    }

    /// Flag and log every entity whose health ran out since the last check.
    pub fn check_deaths(&mut self) {
        let mut fallen = Vec::new();
        for member in self.party.iter_mut() {
            if member.settle_death() {
                fallen.push(format!("☠ Party member defeated: {}", member.name));
            }
        }
        for mob in self.mobs.iter_mut() {
            if mob.settle_death() {
                fallen.push(format!("☠ Opponent defeated: {}", mob.name));
            }
        }
        for line in fallen {
            tracing::debug!(%line, "entity defeated");
            self.log.push(line);
        }
    }

    /// End the encounter if either side is wiped out. Returns true if it ended.
    pub fn check_end(&mut self) -> bool {
        if self.living_party().next().is_none() {
            self.phase = Phase::Ended;
            self.push_log("=== DEFEAT: entire party killed ===");
            tracing::info!(round = self.round, "defeat");
            return true;
        }
        if self.living_mobs().next().is_none() {
            self.phase = Phase::Ended;
            self.push_log("=== VICTORY: all opponents defeated ===");
            tracing::info!(round = self.round, "victory");
            return true;
        }
        false
    }

    /// The first living mob, or past the end when none is left.
    fn first_enemy_index(&self) -> usize {
        self.next_living_mob(0).unwrap_or(self.mobs.len())
    }

    /// Hand the turn to the enemies, pointing at the first living mob.
    pub(crate) fn begin_enemy_turn(&mut self) {
        self.turn = Turn::Enemies;
        self.enemy_index = self.first_enemy_index();
        self.push_log(format!("--- Enemies turn (Round {}) ---", self.round));
    }

    fn begin_next_round(&mut self) {
        self.round += 1;
        self.turn = Turn::Party;
        self.enemy_index = self.first_enemy_index();
        for member in self.party.iter_mut() {
            member.acted_this_round = false;
        }
        self.push_log(format!("--- Round {} (Party turn) ---", self.round));
    }

    /// Move the turn cycle forward if the side on turn has nobody left to act.
    pub fn advance_turn(&mut self) {
        if self.phase != Phase::Combat {
            return;
        }
        match self.turn {
            Turn::Party => {
                if self.check_end() {
                    return;
                }
                if !self.party.iter().any(|p| p.can_act()) {
                    self.begin_enemy_turn();
                }
            }
            Turn::Enemies => {
                if self.living_mobs().next().is_none() {
                    self.check_end();
                    return;
                }
                match self.current_enemy() {
                    Some(index) => self.enemy_index = index,
                    None => self.begin_next_round(),
                }
            }
        }
    }

    /// Return every party member to a clean battle-start condition.
    fn normalize_for_combat(&mut self, catalog: &Catalog) {
        for member in self.party.iter_mut() {
            member.set_max_health(member.max_health as i64);
            member.set_current_health(member.health as i64);
            member.reset_battle_state();
            member.equipment.truncate(crate::world::EQUIPMENT_SLOTS);
            enforce_hand_limit(catalog, member);
        }
        for mob in self.mobs.iter_mut() {
            let max = mob.max_health as i64;
            mob.set_field(crate::world::OpponentField::MaxHealth, max);
            let health = mob.health as i64;
            mob.set_field(crate::world::OpponentField::Health, health);
        }
    }

    fn seed(&self) -> BattleSeed {
        BattleSeed {
            party: self.party.clone(),
            mobs: self.mobs.clone(),
            round: 1,
            turn: Turn::Party,
            enemy_index: self.first_enemy_index(),
        }
    }
}

/// A running encounter tracker.
pub struct CombatSession {
    pub(crate) state: CombatState,
    pub(crate) silver_coins: u32,
    pub(crate) history: History<CombatState>,
    pub(crate) skill_check: SkillCheckPanel,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) dice: Box<dyn DiceRoller>,
}

impl fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSession")
            .field("state", &self.state)
            .field("silver_coins", &self.silver_coins)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl CombatSession {
    /// An empty session in setup, rolling with the thread RNG.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(&TrackerConfig::default(), catalog)
    }

    /// A session built from a config: history size and dice seed.
    pub fn with_config(config: &TrackerConfig, catalog: Arc<Catalog>) -> Self {
        let dice: Box<dyn DiceRoller> = match config.dice_seed {
            Some(seed) => Box::new(RngDice::seeded(seed)),
            None => Box::new(RngDice::thread()),
        };
        Self {
            state: CombatState::default(),
            silver_coins: 0,
            history: History::new(config.history_limit),
            skill_check: SkillCheckPanel::default(),
            catalog,
            dice,
        }
    }

    /// The default table: Akihiro of Chalice against a Goblin.
    pub fn starter(catalog: Arc<Catalog>) -> Self {
        let mut session = Self::new(catalog);
        session.apply_snapshot(&SetupSnapshot::starter());
        session
    }

    /// Replace the dice source.
    pub fn with_dice(mut self, dice: impl DiceRoller + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn set_dice(&mut self, dice: impl DiceRoller + 'static) {
        self.dice = Box::new(dice);
    }

    /// Load a setup saved with [`CombatSession::save`].
    pub async fn load(
        path: impl AsRef<Path>,
        config: &TrackerConfig,
        catalog: Arc<Catalog>,
    ) -> Result<Self, PersistError> {
        let snapshot = SetupSnapshot::load_json(path).await?;
        let mut session = Self::with_config(config, catalog);
        session.apply_snapshot(&snapshot);
        Ok(session)
    }

    /// Save the current setup to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        self.snapshot_setup().save_json(path).await
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn turn(&self) -> Turn {
        self.state.turn
    }

    pub fn party(&self) -> &[PartyMember] {
        &self.state.party
    }

    pub fn mobs(&self) -> &[Opponent] {
        &self.state.mobs
    }

    pub fn log(&self) -> &[String] {
        &self.state.log
    }

    pub fn silver_coins(&self) -> u32 {
        self.silver_coins
    }

    pub fn battle_seed(&self) -> Option<&BattleSeed> {
        self.state.battle_seed.as_ref()
    }

    pub fn current_enemy(&self) -> Option<usize> {
        if self.state.is_enemy_turn() {
            self.state.current_enemy()
        } else {
            None
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Index of a party member by exact name.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.state.party.iter().position(|p| p.name == name)
    }

    // ========================================================================
    // Combat lifecycle
    // ========================================================================

    /// Start combat, or restart the same battle from its seed.
    ///
    /// Refuses (and logs why) without at least one hero and one opponent.
    pub fn start_combat(&mut self) -> bool {
        if self.state.party.is_empty() || self.state.mobs.is_empty() {
            self.state.push_log(START_REFUSED);
            tracing::debug!("start refused: empty side");
            return false;
        }

        if self.state.battle_seed.is_some()
            && matches!(self.state.phase, Phase::Combat | Phase::Ended)
        {
            return self.restart_from_seed();
        }

        self.history.clear();
        self.state.phase = Phase::Combat;
        self.state.round = 1;
        self.state.turn = Turn::Party;
        let catalog = Arc::clone(&self.catalog);
        self.state.normalize_for_combat(&catalog);
        self.state.enemy_index = self.state.first_enemy_index();
        self.state.battle_seed = Some(self.state.seed());

        self.state.log.clear();
        self.state.push_log("=== Combat started ===");
        self.state.push_log("--- Round 1 (Party turn) ---");
        tracing::info!(
            party = self.state.party.len(),
            mobs = self.state.mobs.len(),
            "combat started"
        );
        true
    }

    /// Replay the current battle from its seed, discarding everything since.
    pub fn restart_from_seed(&mut self) -> bool {
        let Some(seed) = self.state.battle_seed.clone() else {
            return false;
        };
        self.history.clear();
        self.state.phase = Phase::Combat;
        self.state.round = seed.round;
        self.state.turn = seed.turn;
        self.state.enemy_index = seed.enemy_index;
        self.state.party = seed.party;
        self.state.mobs = seed.mobs;
        self.state.log.clear();
        self.state.push_log("=== Combat restarted ===");
        self.state
            .push_log(format!("--- Round {} (Party turn) ---", self.state.round));
        tracing::info!("combat restarted from seed");
        true
    }

    /// Push the current state onto the undo stack.
    pub(crate) fn snapshot(&mut self) {
        self.history.push(self.state.clone());
    }

    /// Restore the state from before the most recent action.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.state = previous;
                tracing::debug!(remaining = self.history.len(), "undo");
                true
            }
            None => false,
        }
    }

    /// Run death and end checks, then move the turn cycle on.
    pub(crate) fn settle(&mut self) {
        self.state.check_deaths();
        self.state.check_end();
        self.state.advance_turn();
    }

    // ========================================================================
    // Log
    // ========================================================================

    pub fn clear_log(&mut self) {
        self.state.log.clear();
    }

    /// The whole log as one newline-joined block.
    pub fn copy_log(&self) -> String {
        self.state.log.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDice;

    fn session() -> CombatSession {
        CombatSession::starter(Arc::new(Catalog::standard())).with_dice(ScriptedDice::new(&[]))
    }

    #[test]
    fn test_starter_setup() {
        let session = session();
        assert_eq!(session.phase(), Phase::Setup);
        assert_eq!(session.party().len(), 1);
        assert_eq!(session.party()[0].name, "Akihiro of Chalice");
        assert_eq!(session.party()[0].stat(crate::world::Stat::Fighting), 4);
        assert_eq!(session.mobs(), &[Opponent::goblin()]);
    }

    #[test]
    fn test_start_refused_without_opponents() {
        let mut session = session();
        session.state.mobs.clear();
        assert!(!session.start_combat());
        assert_eq!(session.phase(), Phase::Setup);
        assert_eq!(session.log(), &[START_REFUSED.to_string()]);
    }

    #[test]
    fn test_start_combat() {
        let mut session = session();
        assert!(session.start_combat());
        assert_eq!(session.phase(), Phase::Combat);
        assert_eq!(session.round(), 1);
        assert_eq!(session.turn(), Turn::Party);
        assert!(session.battle_seed().is_some());
        assert_eq!(
            session.log(),
            &[
                "=== Combat started ===".to_string(),
                "--- Round 1 (Party turn) ---".to_string()
            ]
        );
        assert!(!session.can_undo());
    }

    #[test]
    fn test_start_points_past_dead_first_mob() {
        let mut session = session();
        session
            .state
            .mobs
            .insert(0, Opponent::new("Fallen goblin", 4, 5, 0, 4, 0, 6));
        assert!(session.start_combat());
        assert_eq!(session.state().enemy_index, 1);
        assert_eq!(session.battle_seed().map(|s| s.enemy_index), Some(1));
    }

    #[test]
    fn test_advance_turn_to_enemies_and_next_round() {
        let mut state = CombatState {
            phase: Phase::Combat,
            party: vec![PartyMember::new("Brash")],
            mobs: vec![Opponent::goblin(), Opponent::goblin()],
            ..CombatState::default()
        };
        state.mobs[0].dead = true;
        state.mobs[0].health = 0;

        state.party[0].acted_this_round = true;
        state.advance_turn();
        assert_eq!(state.turn, Turn::Enemies);
        assert_eq!(state.enemy_index, 1);
        assert_eq!(state.log.last().map(String::as_str), Some("--- Enemies turn (Round 1) ---"));

        state.enemy_index = 2;
        state.advance_turn();
        assert_eq!(state.turn, Turn::Party);
        assert_eq!(state.round, 2);
        // Mob 0 is still dead, so the next sweep starts at mob 1.
        assert_eq!(state.enemy_index, 1);
        assert!(!state.party[0].acted_this_round);
        assert_eq!(state.log.last().map(String::as_str), Some("--- Round 2 (Party turn) ---"));
    }

    #[test]
    fn test_check_deaths_logs_once() {
        let mut state = CombatState {
            phase: Phase::Combat,
            party: vec![PartyMember::new("Brash")],
            mobs: vec![Opponent::goblin()],
            ..CombatState::default()
        };
        state.mobs[0].health = 0;
        state.check_deaths();
        state.check_deaths();
        assert_eq!(state.log, vec!["☠ Opponent defeated: Goblin".to_string()]);
        assert!(state.check_end());
        assert_eq!(state.phase, Phase::Ended);
        assert_eq!(
            state.log.last().map(String::as_str),
            Some("=== VICTORY: all opponents defeated ===")
        );
    }

    #[test]
    fn test_defeat_checked_first() {
        let mut state = CombatState {
            phase: Phase::Combat,
            party: vec![PartyMember::new("Brash").with_health(0, 8)],
            mobs: vec![Opponent::goblin()],
            ..CombatState::default()
        };
        assert!(state.check_end());
        assert_eq!(
            state.log.last().map(String::as_str),
            Some("=== DEFEAT: entire party killed ===")
        );
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut session = session();
        let before = session.state().clone();
        assert!(!session.undo());
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_copy_and_clear_log() {
        let mut session = session();
        session.start_combat();
        assert_eq!(
            session.copy_log(),
            "=== Combat started ===\n--- Round 1 (Party turn) ---"
        );
        session.clear_log();
        assert!(session.log().is_empty());
    }
}
