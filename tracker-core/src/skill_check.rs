//! Skill checks: an individual or team dice pool against a target face.
//!
//! A check is configured once, then rolled for one (individual) or two
//! (team) living heroes. The last result stays on the panel until the next
//! roll or a reset. Skill checks are not part of combat state and are not
//! undone.

use crate::dice::{format_rolls, TargetRoll};
use crate::import::{parse_skill_check, ImportError};
use crate::modifiers::effective_stat;
use crate::rules::{skill_pool, SkillPool};
use crate::session::CombatSession;
use crate::world::{clamp_int, clamp_target, Stat, Vitals};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest number of successes a check may require.
pub const REQUIRED_MAX: i64 = 99;

/// Individual or team check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Individual,
    Team,
}

impl CheckKind {
    /// Heroes who contribute to the pool.
    pub fn participants(&self) -> usize {
        match self {
            CheckKind::Individual => 1,
            CheckKind::Team => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Individual => "Individual check",
            CheckKind::Team => "Team check",
        }
    }
}

/// A configured skill check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCheck {
    pub name: String,
    pub kind: CheckKind,
    pub skill: Stat,
    /// Face each die must reach, 2-6.
    pub target: u8,
    /// Successes needed to pass.
    pub required: u32,
}

impl SkillCheck {
    /// Build a check, clamping the target face and required successes.
    pub fn new(
        name: impl Into<String>,
        kind: CheckKind,
        skill: Stat,
        target: i64,
        required: i64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            skill,
            target: clamp_target(target),
            required: clamp_int(required, 0, REQUIRED_MAX) as u32,
        }
    }
}

impl fmt::Display for SkillCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {}+, {} success{} required",
            self.name,
            self.kind.label(),
            self.skill,
            self.target,
            self.required,
            if self.required == 1 { "" } else { "es" }
        )
    }
}

/// One hero's share of the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub name: String,
    pub value: i32,
}

/// A rolled skill check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCheckResult {
    pub check: SkillCheck,
    pub contributions: Vec<Contribution>,
    pub pool: SkillPool,
    pub roll: TargetRoll,
    pub passed: bool,
}

impl SkillCheckResult {
    pub fn successes(&self) -> u32 {
        self.roll.successes
    }

    /// `SUCCESS` or `FAILURE` with the counts.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} ({}/{} successes)",
            self.check.name,
            if self.passed { "SUCCESS" } else { "FAILURE" },
            self.roll.successes,
            self.check.required
        )
    }

    /// Lines for display: contributions, pool, rolls and each die.
    pub fn breakdown(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .contributions
            .iter()
            .map(|c| format!("{} {} {}", c.name, self.check.skill, c.value))
            .collect();
        let mut pool = format!("Pool: {}d6", self.pool.dice);
        if self.pool.capped_from_raw {
            pool.push_str(&format!(" (capped from {})", self.pool.raw));
        }
        lines.push(pool);
        lines.push(format!(
            "Rolls: {} vs {}+",
            format_rolls(&self.roll.rolls),
            self.check.target
        ));
        for (i, face) in self.roll.rolls.iter().enumerate() {
            let mark = if *face >= self.check.target { "✓" } else { "✗" };
            lines.push(format!("  Die {}: {} {}", i + 1, face, mark));
        }
        lines.push(self.summary());
        lines
    }
}

/// Why a skill check could not be rolled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkillCheckError {
    #[error("No skill check configured")]
    NoCheck,

    #[error("{kind} needs {expected} participant(s), got {got}")]
    WrongParticipantCount {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("No party member named {0}")]
    UnknownParticipant(String),

    #[error("{0} is dead")]
    DeadParticipant(String),

    #[error("{0} is listed twice")]
    DuplicateParticipant(String),

    #[error("{0} is not a skill")]
    NotASkill(Stat),
}

/// The configured check and its last result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillCheckPanel {
    pub check: Option<SkillCheck>,
    pub last: Option<SkillCheckResult>,
}

impl CombatSession {
    /// Configure a check. Any previous result is discarded.
    pub fn configure_skill_check(&mut self, check: SkillCheck) -> Result<(), SkillCheckError> {
        if !check.skill.is_skill() {
            return Err(SkillCheckError::NotASkill(check.skill));
        }
        self.skill_check = SkillCheckPanel {
            check: Some(check),
            last: None,
        };
        Ok(())
    }

    /// Configure a check from pasted text.
    pub fn import_skill_check(&mut self, text: &str) -> Result<&SkillCheck, ImportError> {
        let check = parse_skill_check(text)?;
        self.skill_check = SkillCheckPanel::default();
        Ok(self.skill_check.check.insert(check))
    }

    pub fn skill_check(&self) -> Option<&SkillCheck> {
        self.skill_check.check.as_ref()
    }

    pub fn last_skill_check(&self) -> Option<&SkillCheckResult> {
        self.skill_check.last.as_ref()
    }

    pub fn reset_skill_check(&mut self) {
        self.skill_check = SkillCheckPanel::default();
    }

    /// Roll the configured check for the named living heroes.
    pub fn roll_skill_check(
        &mut self,
        participants: &[&str],
    ) -> Result<&SkillCheckResult, SkillCheckError> {
        let check = self
            .skill_check
            .check
            .clone()
            .ok_or(SkillCheckError::NoCheck)?;
        let expected = check.kind.participants();
        if participants.len() != expected {
            return Err(SkillCheckError::WrongParticipantCount {
                kind: check.kind.label(),
                expected,
                got: participants.len(),
            });
        }

        let mut contributions: Vec<Contribution> = Vec::with_capacity(expected);
        for name in participants {
            let name = name.trim();
            let member = self
                .state
                .party
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| SkillCheckError::UnknownParticipant(name.to_string()))?;
            if !member.is_alive() {
                return Err(SkillCheckError::DeadParticipant(member.name.clone()));
            }
            if contributions.iter().any(|c| c.name == member.name) {
                return Err(SkillCheckError::DuplicateParticipant(member.name.clone()));
            }
            contributions.push(Contribution {
                name: member.name.clone(),
                value: effective_stat(&self.catalog, member, check.skill),
            });
        }

        let pool = skill_pool(contributions.iter().map(|c| c.value).sum());
        let roll = TargetRoll::roll(self.dice.as_mut(), pool.dice, check.target);
        let passed = roll.successes >= check.required;
        tracing::debug!(
            check = %check.name,
            dice = pool.dice,
            successes = roll.successes,
            passed,
            "skill check rolled"
        );
        let result = SkillCheckResult {
            check,
            contributions,
            pool,
            roll,
            passed,
        };
        Ok(self.skill_check.last.insert(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::testing::ScriptedDice;
    use std::sync::Arc;

    fn party() -> (CombatSession, ScriptedDice) {
        let dice = ScriptedDice::new(&[]);
        let mut session =
            CombatSession::new(Arc::new(Catalog::standard())).with_dice(dice.clone());
        session.add_member("Tasha").expect("tasha");
        session.add_member("Brash").expect("brash");
        session.set_stat(0, Stat::Stealth, 3).expect("stealth");
        session.set_stat(1, Stat::Stealth, 2).expect("stealth");
        session.add_equipment(1, "fine_boots").expect("boots");
        (session, dice)
    }

    #[test]
    fn test_team_check() {
        let (mut session, dice) = party();
        session
            .configure_skill_check(SkillCheck::new("Sneak past", CheckKind::Team, Stat::Stealth, 5, 2))
            .expect("configure");
        dice.push(&[5, 6, 1, 2, 3, 4, 4]);
        let result = session.roll_skill_check(&["Tasha", "brash"]).expect("roll");
        assert_eq!(result.pool.dice, 7);
        assert_eq!(result.successes(), 2);
        assert!(result.passed);
        assert_eq!(result.contributions[1].value, 4);
        assert_eq!(result.summary(), "Sneak past: SUCCESS (2/2 successes)");
        assert!(session.last_skill_check().is_some());
    }

    #[test]
    fn test_individual_check_fails() {
        let (mut session, dice) = party();
        session
            .configure_skill_check(SkillCheck::new("Recall", CheckKind::Individual, Stat::Lore, 4, 1))
            .expect("configure");
        let result = session.roll_skill_check(&["Tasha"]).expect("roll");
        assert_eq!(result.pool.dice, 0);
        assert!(!result.passed);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_participant_errors() {
        let (mut session, _dice) = party();
        assert_eq!(
            session.roll_skill_check(&["Tasha"]).err(),
            Some(SkillCheckError::NoCheck)
        );
        session
            .configure_skill_check(SkillCheck::new("Haggle", CheckKind::Team, Stat::Charisma, 4, 1))
            .expect("configure");
        assert!(matches!(
            session.roll_skill_check(&["Tasha"]),
            Err(SkillCheckError::WrongParticipantCount { expected: 2, got: 1, .. })
        ));
        assert_eq!(
            session.roll_skill_check(&["Tasha", "Tasha"]).err(),
            Some(SkillCheckError::DuplicateParticipant("Tasha".into()))
        );
        assert_eq!(
            session.roll_skill_check(&["Tasha", "Zed"]).err(),
            Some(SkillCheckError::UnknownParticipant("Zed".into()))
        );
        session.set_health(1, 0).expect("kill");
        assert_eq!(
            session.roll_skill_check(&["Tasha", "Brash"]).err(),
            Some(SkillCheckError::DeadParticipant("Brash".into()))
        );
    }

    #[test]
    fn test_pool_is_capped() {
        let (mut session, dice) = party();
        session.set_stat(0, Stat::Survival, 15).expect("survival");
        session.set_stat(1, Stat::Survival, 12).expect("survival");
        session
            .configure_skill_check(SkillCheck::new("Forage", CheckKind::Team, Stat::Survival, 6, 3))
            .expect("configure");
        dice.push(&[6; 20]);
        let result = session.roll_skill_check(&["Tasha", "Brash"]).expect("roll");
        assert_eq!(result.pool.dice, 20);
        assert!(result.pool.capped_from_raw);
        assert_eq!(result.pool.raw, 27);
        assert!(result
            .breakdown()
            .contains(&"Pool: 20d6 (capped from 27)".to_string()));
    }

    #[test]
    fn test_armour_is_not_a_skill() {
        let (mut session, _dice) = party();
        let check = SkillCheck::new("Brace", CheckKind::Individual, Stat::Armour, 4, 1);
        assert_eq!(
            session.configure_skill_check(check),
            Err(SkillCheckError::NotASkill(Stat::Armour))
        );
    }

    #[test]
    fn test_check_clamps() {
        let check = SkillCheck::new("X", CheckKind::Individual, Stat::Lore, 9, -2);
        assert_eq!(check.target, 6);
        assert_eq!(check.required, 0);
        assert_eq!(
            check.to_string(),
            "X (Individual check): Lore 6+, 0 successes required"
        );
    }

    #[test]
    fn test_zero_required_passes_on_empty_pool() {
        let (mut session, dice) = party();
        session
            .configure_skill_check(SkillCheck::new("Look around", CheckKind::Individual, Stat::Lore, 4, 0))
            .expect("configure");
        let result = session.roll_skill_check(&["Tasha"]).expect("roll");
        assert_eq!(result.pool.dice, 0);
        assert!(result.passed);
        assert_eq!(dice.remaining(), 0);
    }
}
