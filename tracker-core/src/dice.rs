//! Six-sided dice for combat resolution.
//!
//! Every roll in the engine goes through a [`DiceRoller`], so a session can be
//! driven by the thread RNG, a seeded RNG for reproducible replays, or a
//! scripted sequence in tests.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of faces on the only die the engine uses.
pub const D6_FACES: u8 = 6;

/// Source of d6 results.
pub trait DiceRoller {
    /// Roll a single d6, returning a face in `1..=6`.
    fn roll_d6(&mut self) -> u8;

    /// Roll `count` independent d6.
    fn roll_d6s(&mut self, count: u32) -> Vec<u8> {
        (0..count).map(|_| self.roll_d6()).collect()
    }
}

/// Dice backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R: Rng> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<ThreadRng> {
    /// Dice drawing from the thread-local RNG.
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl RngDice<StdRng> {
    /// Deterministic dice: the same seed always yields the same faces.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceRoller for RngDice<R> {
    fn roll_d6(&mut self) -> u8 {
        self.rng.gen_range(1..=D6_FACES)
    }
}

/// Roll `count` d6 with the thread RNG.
pub fn roll_d6(count: u32) -> Vec<u8> {
    RngDice::thread().roll_d6s(count)
}

/// Count the faces meeting or beating `target`.
pub fn count_successes(rolls: &[u8], target: u8) -> u32 {
    rolls.iter().filter(|&&face| face >= target).count() as u32
}

/// A batch of d6 rolled against a single target face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRoll {
    pub rolls: Vec<u8>,
    pub target: u8,
    pub successes: u32,
}

impl TargetRoll {
    /// Roll `count` d6 and count the faces at or above `target`.
    ///
    /// This is the one mechanic behind party attacks, enemy attacks, spell
    /// attacks, armour saves and skill checks.
    pub fn roll<D: DiceRoller + ?Sized>(dice: &mut D, count: u32, target: u8) -> Self {
        let rolls = dice.roll_d6s(count);
        let successes = count_successes(&rolls, target);
        Self {
            rolls,
            target,
            successes,
        }
    }

    /// Number of dice rolled.
    pub fn dice(&self) -> u32 {
        self.rolls.len() as u32
    }

    pub fn dice_display(&self) -> String {
        format_rolls(&self.rolls)
    }
}

impl fmt::Display for TargetRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {}+ => {}",
            self.dice_display(),
            self.target,
            self.successes
        )
    }
}

/// Format faces the way the combat log prints them: `[6, 2, 4]`, or `[]`.
pub fn format_rolls(rolls: &[u8]) -> String {
    let faces: Vec<String> = rolls.iter().map(|r| r.to_string()).collect();
    format!("[{}]", faces.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_range() {
        let rolls = roll_d6(500);
        assert_eq!(rolls.len(), 500);
        assert!(rolls.iter().all(|&r| (1..=6).contains(&r)));
    }

    #[test]
    fn test_roll_zero_dice() {
        assert!(roll_d6(0).is_empty());
    }

    #[test]
    fn test_seeded_dice_repeat() {
        let mut a = RngDice::seeded(7);
        let mut b = RngDice::seeded(7);
        assert_eq!(a.roll_d6s(50), b.roll_d6s(50));
    }

    #[test]
    fn test_count_successes() {
        assert_eq!(count_successes(&[1, 4, 5, 6, 3], 4), 3);
        assert_eq!(count_successes(&[1, 1, 1], 2), 0);
        assert_eq!(count_successes(&[], 4), 0);
        assert_eq!(count_successes(&[6, 6], 6), 2);
    }

    #[test]
    fn test_format_rolls() {
        assert_eq!(format_rolls(&[]), "[]");
        assert_eq!(format_rolls(&[3]), "[3]");
        assert_eq!(format_rolls(&[6, 2, 4]), "[6, 2, 4]");
    }

    #[test]
    fn test_target_roll_display() {
        let roll = TargetRoll {
            rolls: vec![5, 1],
            target: 4,
            successes: 1,
        };
        assert_eq!(roll.to_string(), "[5, 1] vs 4+ => 1");
        assert_eq!(roll.dice(), 2);
    }
}
