//! Testing utilities for the combat tracker.
//!
//! This module provides tools for integration testing:
//! - `ScriptedDice` for deterministic rolls
//! - `TestHarness` for scripted encounters
//! - Assertion helpers for verifying combat state

use crate::catalog::Catalog;
use crate::dice::DiceRoller;
use crate::session::{CombatSession, Phase, Turn};
use crate::world::Vitals;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Dice that return queued faces in order.
///
/// Clones share one queue, so a test can keep a handle and push more faces
/// after the session has taken ownership of its copy.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: Arc<Mutex<VecDeque<u8>>>,
}

impl ScriptedDice {
    pub fn new(faces: &[u8]) -> Self {
        let dice = Self::default();
        dice.push(faces);
        dice
    }

    /// Queue more faces.
    pub fn push(&self, faces: &[u8]) {
        self.queue().extend(faces.iter().copied());
    }

    /// Faces not yet rolled.
    pub fn remaining(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<u8>> {
        self.faces.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        match self.queue().pop_front() {
            Some(face) => face,
            None => panic!("ScriptedDice ran out of faces"),
        }
    }
}

/// Test harness for running encounters.
pub struct TestHarness {
    /// The session under test.
    pub session: CombatSession,
    /// Shared handle to the session's dice.
    pub dice: ScriptedDice,
}

impl TestHarness {
    /// An empty setup with scripted dice.
    pub fn new() -> Self {
        let dice = ScriptedDice::default();
        let session = CombatSession::new(Arc::new(Catalog::standard())).with_dice(dice.clone());
        Self { session, dice }
    }

    /// A harness with the given heroes and `mobs` Goblins, already in combat.
    pub fn fight(heroes: &[&str], mobs: usize) -> Self {
        let mut harness = Self::new();
        for hero in heroes {
            harness.hero(hero);
        }
        for _ in 0..mobs {
            harness.goblin();
        }
        harness.start();
        harness
    }

    /// Add a hero by roster name.
    pub fn hero(&mut self, name: &str) -> &mut Self {
        if let Err(e) = self.session.add_member(name) {
            panic!("could not add {name}: {e}");
        }
        self
    }

    /// Add a default Goblin.
    pub fn goblin(&mut self) -> &mut Self {
        if let Err(e) = self.session.add_opponent() {
            panic!("could not add opponent: {e}");
        }
        self
    }

    /// Start combat, asserting it was allowed.
    pub fn start(&mut self) -> &mut Self {
        assert!(self.session.start_combat(), "combat refused to start");
        self
    }

    /// Queue dice faces.
    pub fn roll(&mut self, faces: &[u8]) -> &mut Self {
        self.dice.push(faces);
        self
    }

    /// Hero health as (current, max).
    pub fn member_hp(&self, index: usize) -> (i32, i32) {
        let member = &self.session.party()[index];
        (member.health(), member.max_health())
    }

    /// Opponent health as (current, max).
    pub fn mob_hp(&self, index: usize) -> (i32, i32) {
        let mob = &self.session.mobs()[index];
        (mob.health(), mob.max_health())
    }

    /// The last log line.
    pub fn last_log(&self) -> Option<&str> {
        self.session.log().last().map(String::as_str)
    }

    /// Whether any log line contains `needle`.
    pub fn log_contains(&self, needle: &str) -> bool {
        self.session.log().iter().any(|line| line.contains(needle))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is in the given phase.
#[track_caller]
pub fn assert_phase(harness: &TestHarness, phase: Phase) {
    assert_eq!(
        harness.session.phase(),
        phase,
        "Expected phase {phase}, got {}",
        harness.session.phase()
    );
}

/// Assert whose turn it is.
#[track_caller]
pub fn assert_turn(harness: &TestHarness, turn: Turn) {
    assert_eq!(
        harness.session.turn(),
        turn,
        "Expected {turn} turn, got {}",
        harness.session.turn()
    );
}

/// Assert a hero's health.
#[track_caller]
pub fn assert_member_hp(harness: &TestHarness, index: usize, current: i32, max: i32) {
    let (actual_current, actual_max) = harness.member_hp(index);
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected HP {current}/{max}, got {actual_current}/{actual_max}"
    );
}

/// Assert some log line contains `needle`.
#[track_caller]
pub fn assert_logged(harness: &TestHarness, needle: &str) {
    assert!(
        harness.log_contains(needle),
        "Expected log to contain '{needle}', log was:\n{}",
        harness.session.copy_log()
    );
}

/// Assert every queued die was consumed.
#[track_caller]
pub fn assert_dice_spent(harness: &TestHarness) {
    assert_eq!(
        harness.dice.remaining(),
        0,
        "Expected all scripted dice to be rolled"
    );
}
