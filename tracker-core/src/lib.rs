//! Party-vs-monsters combat engine.
//!
//! This crate provides:
//! - d6 dice pools resolved against a target face
//! - Equipment and buff modifiers feeding attack, armour and skill rolls
//! - A setup → combat → ended state machine with party and enemy turns
//! - Undo history and battle restart from a captured seed
//! - Bulk opponent and skill-check import, and setup persistence
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracker_core::{Catalog, CombatSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = CombatSession::starter(Arc::new(Catalog::standard()));
//!
//!     session.start_combat();
//!     session.party_attack(0, 0);
//!     session.resolve_all_enemy_attacks(0);
//!     for line in session.log() {
//!         println!("{line}");
//!     }
//!
//!     session.save("tracker_setup.json").await?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod catalog;
pub mod command;
pub mod config;
pub mod dice;
pub mod history;
pub mod import;
pub mod items;
pub mod modifiers;
pub mod persist;
pub mod roster;
pub mod rules;
pub mod session;
pub mod setup;
pub mod skill_check;
pub mod spells;
pub mod testing;
pub mod world;

// Primary public API
pub use actions::{AttackOutcome, CastRejection, EnemyAttackOutcome, SpellTargets};
pub use catalog::Catalog;
pub use command::{Command, CommandError, Outcome};
pub use config::TrackerConfig;
pub use dice::{DiceRoller, RngDice, TargetRoll};
pub use import::{parse_encounter, parse_skill_check, ImportError};
pub use persist::{PersistError, SetupSnapshot};
pub use session::{CombatSession, CombatState, Phase, TrackerError, Turn};
pub use setup::SetupError;
pub use skill_check::{CheckKind, SkillCheck, SkillCheckError, SkillCheckResult};
pub use testing::{ScriptedDice, TestHarness};
pub use world::{Opponent, PartyMember, Stat, Vitals};
