//! Combat resolution: attack hits, armour saves and skill-check pools.
//!
//! Every roll here is the same mechanic: independent d6 against a target
//! face, counting the faces that meet or beat it. See [`TargetRoll`].

use crate::dice::{DiceRoller, TargetRoll};

/// Face an armour save die must reach.
pub const ARMOUR_SAVE_FACE: u8 = 4;

/// Most dice a skill check may roll.
pub const SKILL_POOL_CAP: u32 = 20;

/// Roll a party attack (melee or spell) against an opponent's defence.
pub fn compute_attack_hits<D: DiceRoller + ?Sized>(
    dice: &mut D,
    dice_count: u32,
    target_face: u8,
) -> TargetRoll {
    TargetRoll::roll(dice, dice_count, target_face)
}

/// Roll an opponent's attack.
pub fn compute_enemy_hits<D: DiceRoller + ?Sized>(
    dice: &mut D,
    atk_dice: u32,
    atk_target: u8,
) -> TargetRoll {
    TargetRoll::roll(dice, atk_dice, atk_target)
}

/// Outcome of an armour save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmourSave {
    pub dice: u32,
    pub rolls: Vec<u8>,
    pub saved: u32,
    pub final_damage: u32,
}

/// Roll `min(armour, incoming)` dice at 4+; each success stops one damage.
///
/// No dice are rolled when either side is zero.
pub fn armour_save_rolls<D: DiceRoller + ?Sized>(
    dice: &mut D,
    armour: i32,
    incoming: u32,
) -> ArmourSave {
    let count = armour.max(0).min(incoming as i32);
    if count <= 0 {
        return ArmourSave {
            dice: 0,
            rolls: Vec::new(),
            saved: 0,
            final_damage: incoming,
        };
    }
    let roll = TargetRoll::roll(dice, count as u32, ARMOUR_SAVE_FACE);
    ArmourSave {
        dice: roll.dice(),
        final_damage: incoming.saturating_sub(roll.successes),
        saved: roll.successes,
        rolls: roll.rolls,
    }
}

/// A skill check's dice pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillPool {
    pub dice: u32,
    pub raw: i32,
    /// The raw sum exceeded [`SKILL_POOL_CAP`].
    pub capped_from_raw: bool,
}

/// Size a skill-check pool from the participants' summed effective stat.
pub fn skill_pool(raw: i32) -> SkillPool {
    let floored = raw.max(0) as u32;
    SkillPool {
        dice: floored.min(SKILL_POOL_CAP),
        raw,
        capped_from_raw: floored > SKILL_POOL_CAP,
    }
}
