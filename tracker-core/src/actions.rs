//! Combat actions.
//!
//! Each action checks its preconditions first and does nothing if they fail.
//! Otherwise it snapshots for undo, rolls, applies damage, writes the log,
//! and settles deaths and the turn cycle.

use crate::dice::{format_rolls, TargetRoll};
use crate::modifiers::{effective_armour, fighting_dice};
use crate::rules::{armour_save_rolls, compute_attack_hits, compute_enemy_hits, ArmourSave};
use crate::session::{CombatSession, Phase};
use crate::spells::{SpellDef, SpellStep, TargetMode};
use crate::world::{Buff, SpellStatus, Vitals};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result of a party member's melee attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attacker: usize,
    pub target: usize,
    pub roll: TargetRoll,
    pub damage: u32,
}

/// Result of one opponent's attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyAttackOutcome {
    pub mob: usize,
    pub victim: usize,
    pub roll: TargetRoll,
    pub auto: u32,
    /// Hits plus auto damage, before armour.
    pub raw_damage: u32,
    pub save: Option<ArmourSave>,
    pub final_damage: u32,
}

/// Targets chosen for a spell, by index into opponents and party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpellTargets {
    pub enemies: Vec<usize>,
    pub allies: Vec<usize>,
}

impl SpellTargets {
    pub fn enemy(index: usize) -> Self {
        Self {
            enemies: vec![index],
            allies: Vec::new(),
        }
    }

    pub fn enemies(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            enemies: indices.into_iter().collect(),
            allies: Vec::new(),
        }
    }

    pub fn ally(index: usize) -> Self {
        Self {
            enemies: Vec::new(),
            allies: vec![index],
        }
    }
}

/// Why a spell cannot be cast right now.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CastRejection {
    #[error("Unknown caster.")]
    UnknownCaster,
    #[error("Unknown spell.")]
    UnknownSpell,
    #[error("Not on party turn.")]
    NotPartyTurn,
    #[error("This hero cannot cast spells.")]
    NotSpellcaster,
    #[error("Caster is dead.")]
    CasterDead,
    #[error("Caster already acted this round.")]
    AlreadyActed,
    #[error("Spell is not prepared.")]
    NotPrepared,
    #[error("Spell is exhausted.")]
    Exhausted,
    #[error("This spell cannot be cast in combat.")]
    NotCombatSpell,
    #[error("Spell already used this battle.")]
    AlreadyUsed,
    #[error("Targets must be different.")]
    DuplicateTargets,
}

fn hp(health: i32, max_health: i32) -> String {
    format!("HP {}/{}", health.max(0), max_health)
}

impl CombatSession {
    // ========================================================================
    // Party turn
    // ========================================================================

    /// A living, unacted hero attacks a living opponent.
    pub fn party_attack(&mut self, attacker: usize, target: usize) -> Option<AttackOutcome> {
        if !self.state.is_party_turn() {
            return None;
        }
        let hero = self.state.party.get(attacker).filter(|p| p.can_act())?;
        let mob = self.state.mobs.get(target).filter(|m| m.is_alive())?;
        let dice = fighting_dice(&self.catalog, hero);
        let defence = mob.def_target;

        self.snapshot();

        let roll = compute_attack_hits(self.dice.as_mut(), dice.dice, defence);
        let hero_name = self.state.party[attacker].name.clone();
        let mob = &mut self.state.mobs[target];
        let mut lines = vec![format!(
            "[Party] {} attacks {} | dice={} rolls={} vs Def {}+ => hits={}",
            hero_name,
            mob.name,
            dice.dice,
            roll.dice_display(),
            defence,
            roll.successes
        )];
        if roll.successes > 0 {
            mob.take_damage(roll.successes);
            lines.push(format!(
                "        {} takes {} damage ({})",
                mob.name,
                roll.successes,
                hp(mob.health, mob.max_health)
            ));
        } else {
            lines.push("        No damage.".to_string());
        }
        self.state.log.extend(lines);
        self.state.party[attacker].acted_this_round = true;

        tracing::debug!(
            attacker = %hero_name,
            dice = dice.dice,
            hits = roll.successes,
            armed = dice.has_weapon,
            "party attack"
        );
        let damage = roll.successes;
        self.settle();
        Some(AttackOutcome {
            attacker,
            target,
            roll,
            damage,
        })
    }

    /// Spend a hero's action without doing anything.
    pub fn skip(&mut self, member: usize) -> bool {
        if !self.state.is_party_turn() {
            return false;
        }
        if !self.state.party.get(member).is_some_and(|p| p.can_act()) {
            return false;
        }
        self.snapshot();
        let hero = &mut self.state.party[member];
        hero.acted_this_round = true;
        let line = format!("[Party] {} skips their action", hero.name);
        self.state.push_log(line);
        self.settle();
        true
    }

    /// Force the party turn to end, whoever has yet to act.
    pub fn end_party_turn(&mut self) -> bool {
        if !self.state.is_party_turn() {
            return false;
        }
        self.snapshot();
        self.state.begin_enemy_turn();
        tracing::debug!(round = self.state.round, "party turn ended manually");
        true
    }

    // ========================================================================
    // Enemies turn
    // ========================================================================

    /// The current opponent attacks `victim`.
    ///
    /// If no living opponent is left to act, the turn passes (snapshotted)
    /// and `None` is returned.
    pub fn enemy_attack(&mut self, victim: usize) -> Option<EnemyAttackOutcome> {
        if !self.state.is_enemy_turn() {
            return None;
        }
        let Some(mob_index) = self.state.current_enemy() else {
            self.snapshot();
            self.state.enemy_index = self.state.mobs.len();
            self.state.advance_turn();
            return None;
        };
        let target = self.state.party.get(victim).filter(|p| p.is_alive())?;
        let armour = effective_armour(&self.catalog, target);

        self.snapshot();

        let mob = self.state.mobs[mob_index].clone();
        let roll = compute_enemy_hits(self.dice.as_mut(), mob.atk_dice, mob.atk_target);
        let raw_damage = roll.successes + mob.auto;
        let hero = &mut self.state.party[victim];
        let mut lines = vec![format!(
            "[Enemy] {} attacks {} | rolls={} vs {}+ => hits={}{} => damage={}",
            mob.name,
            hero.name,
            roll.dice_display(),
            mob.atk_target,
            roll.successes,
            if mob.auto > 0 {
                format!(" + auto={}", mob.auto)
            } else {
                String::new()
            },
            raw_damage
        )];

        let mut save = None;
        let mut final_damage = 0;
        if raw_damage > 0 {
            let result = armour_save_rolls(self.dice.as_mut(), armour, raw_damage);
            final_damage = result.final_damage;
            if result.rolls.is_empty() {
                lines.push(format!("        No armour save. Final={}", final_damage));
            } else {
                lines.push(format!(
                    "        Armour save ({}d6 @4+) rolls={} => saved={} => final={}",
                    result.dice,
                    format_rolls(&result.rolls),
                    result.saved,
                    final_damage
                ));
            }
            hero.take_damage(final_damage);
            lines.push(format!(
                "        {} {}",
                hero.name,
                hp(hero.health, hero.max_health)
            ));
            save = Some(result);
        } else {
            lines.push("        No damage.".to_string());
        }
        self.state.log.extend(lines);

        tracing::debug!(
            mob = %mob.name,
            hits = roll.successes,
            raw = raw_damage,
            armour,
            final_damage,
            "enemy attack"
        );

        let outcome = EnemyAttackOutcome {
            mob: mob_index,
            victim,
            roll,
            auto: mob.auto,
            raw_damage,
            save,
            final_damage,
        };

        self.state.check_deaths();
        if self.state.check_end() {
            return Some(outcome);
        }
        self.state.enemy_index = mob_index + 1;
        self.state.advance_turn();
        Some(outcome)
    }

    /// Run every remaining opponent's attack against `victim`.
    ///
    /// If the victim falls, later attacks go to the first living hero.
    pub fn resolve_all_enemy_attacks(&mut self, victim: usize) -> Vec<EnemyAttackOutcome> {
        let mut outcomes = Vec::new();
        while self.state.is_enemy_turn() {
            let target = if self.state.party.get(victim).is_some_and(|p| p.is_alive()) {
                victim
            } else {
                match self.state.first_living_member() {
                    Some(index) => index,
                    None => break,
                }
            };
            if self.state.current_enemy().is_none() {
                self.snapshot();
                self.state.enemy_index = self.state.mobs.len();
                self.state.advance_turn();
                break;
            }
            match self.enemy_attack(target) {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        outcomes
    }

    // ========================================================================
    // Spells
    // ========================================================================

    /// Check whether `caster` may cast `spell_id` right now.
    pub fn can_cast_spell(&self, caster: usize, spell_id: &str) -> Result<(), CastRejection> {
        let hero = self
            .state
            .party
            .get(caster)
            .ok_or(CastRejection::UnknownCaster)?;
        let spell = self
            .catalog
            .spell(spell_id)
            .ok_or(CastRejection::UnknownSpell)?;
        if !self.state.is_party_turn() {
            return Err(CastRejection::NotPartyTurn);
        }
        if !self.catalog.roster.is_spellcaster(&hero.name) {
            return Err(CastRejection::NotSpellcaster);
        }
        if !hero.is_alive() {
            return Err(CastRejection::CasterDead);
        }
        if hero.acted_this_round {
            return Err(CastRejection::AlreadyActed);
        }
        let slot = hero
            .known_spell(&spell.id)
            .ok_or(CastRejection::NotPrepared)?;
        if slot.is_exhausted() {
            return Err(CastRejection::Exhausted);
        }
        if !spell.timing.in_combat() {
            return Err(CastRejection::NotCombatSpell);
        }
        if spell.once_per_battle && hero.spells_used.contains(&spell.id) {
            return Err(CastRejection::AlreadyUsed);
        }
        Ok(())
    }

    /// Cast a prepared spell. A rejected cast changes nothing.
    ///
    /// Steps that hit a missing or dead target are logged as skipped; the
    /// caster's action and the spell are spent either way.
    pub fn cast_spell(
        &mut self,
        caster: usize,
        spell_id: &str,
        targets: &SpellTargets,
    ) -> Result<(), CastRejection> {
        if let Err(reason) = self.can_cast_spell(caster, spell_id) {
            tracing::debug!(caster, spell_id, %reason, "cast rejected");
            return Err(reason);
        }
        let catalog = Arc::clone(&self.catalog);
        let spell = catalog.spell(spell_id).ok_or(CastRejection::UnknownSpell)?;
        if let TargetMode::MultiEnemyDistinct { count } = spell.target_mode {
            let chosen: Vec<usize> = targets.enemies.iter().take(count).copied().collect();
            let distinct: BTreeSet<usize> = chosen.iter().copied().collect();
            if distinct.len() != chosen.len() {
                return Err(CastRejection::DuplicateTargets);
            }
        }

        self.snapshot();
        let caster_name = self.state.party[caster].name.clone();
        self.state
            .push_log(format!("[Spell] {} casts {}", caster_name, spell.name));
        for step in &spell.steps {
            self.apply_spell_step(step, targets);
        }

        let hero = &mut self.state.party[caster];
        hero.acted_this_round = true;
        hero.spells_used.insert(spell.id.clone());
        if let Some(slot) = hero.known_spell_mut(&spell.id) {
            slot.status = SpellStatus::Exhausted;
        }
        tracing::debug!(caster = %caster_name, spell = %spell.id, "spell cast");
        self.settle();
        Ok(())
    }

    fn apply_spell_step(&mut self, step: &SpellStep, targets: &SpellTargets) {
        match *step {
            SpellStep::AttackFixed { fighting, times } => {
                for k in 0..times {
                    let mob_index = targets
                        .enemies
                        .get(k)
                        .copied()
                        .filter(|&i| self.state.mobs.get(i).is_some_and(|m| m.is_alive()));
                    let Some(mob_index) = mob_index else {
                        self.state
                            .push_log(format!("        (skipped) target {} invalid/dead", k + 1));
                        continue;
                    };
                    let defence = self.state.mobs[mob_index].def_target;
                    let roll = compute_attack_hits(self.dice.as_mut(), fighting, defence);
                    let mob = &mut self.state.mobs[mob_index];
                    let mut lines = vec![format!(
                        "        Attack {}: vs {} | dice={} rolls={} vs Def {}+ => hits={}",
                        k + 1,
                        mob.name,
                        fighting,
                        roll.dice_display(),
                        defence,
                        roll.successes
                    )];
                    if roll.successes > 0 {
                        mob.take_damage(roll.successes);
                        lines.push(format!(
                            "                 {} takes {} damage ({})",
                            mob.name,
                            roll.successes,
                            hp(mob.health, mob.max_health)
                        ));
                    } else {
                        lines.push("                 No damage.".to_string());
                    }
                    self.state.log.extend(lines);
                }
            }
            SpellStep::DamageFixed { amount } => {
                let mob = targets
                    .enemies
                    .first()
                    .and_then(|&i| self.state.mobs.get_mut(i))
                    .filter(|m| m.is_alive());
                let line = match mob {
                    Some(mob) => {
                        mob.take_damage(amount);
                        format!(
                            "        {} loses {} Health ({})",
                            mob.name,
                            amount,
                            hp(mob.health, mob.max_health)
                        )
                    }
                    None => "        (skipped) invalid/dead target".to_string(),
                };
                self.state.push_log(line);
            }
            SpellStep::BuffArmour { amount } => {
                let ally = targets
                    .allies
                    .first()
                    .copied()
                    .filter(|&i| self.state.party.get(i).is_some_and(|p| p.is_alive()));
                let line = match ally {
                    Some(index) => {
                        self.state.party[index].add_buff(Buff::battle_armour(amount));
                        let ally = &self.state.party[index];
                        format!(
                            "        {} gains +{} Armour until end of battle (effective armour now {})",
                            ally.name,
                            amount,
                            effective_armour(&self.catalog, ally)
                        )
                    }
                    None => "        (skipped) invalid/dead ally".to_string(),
                };
                self.state.push_log(line);
            }
            SpellStep::HealFixed { amount } => {
                let ally = targets
                    .allies
                    .first()
                    .and_then(|&i| self.state.party.get_mut(i))
                    .filter(|p| p.is_alive());
                let line = match ally {
                    Some(ally) => {
                        let healed = ally.heal(amount);
                        format!(
                            "        {} restores {} Health (HP {}/{})",
                            ally.name, healed, ally.health, ally.max_health
                        )
                    }
                    None => "        (skipped) invalid/dead ally".to_string(),
                };
                self.state.push_log(line);
            }
        }
    }

    /// Spells `caster` could cast this turn.
    pub fn castable_spells(&self, caster: usize) -> Vec<&SpellDef> {
        let Some(hero) = self.state.party.get(caster) else {
            return Vec::new();
        };
        hero.spells
            .iter()
            .filter_map(|slot| slot.spell_id.as_deref())
            .filter(|id| self.can_cast_spell(caster, id).is_ok())
            .filter_map(|id| self.catalog.spell(id))
            .collect()
    }

    // ========================================================================
    // Ending
    // ========================================================================

    /// Stop the fight now, whoever's turn it is.
    pub fn end_combat(&mut self) -> bool {
        if self.state.phase != Phase::Combat {
            return false;
        }
        self.snapshot();
        self.state.phase = Phase::Ended;
        self.state.push_log("=== Combat ended manually ===");
        tracing::info!(round = self.state.round, "combat ended manually");
        true
    }
}
