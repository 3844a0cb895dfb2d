//! Operator commands.
//!
//! A [`Command`] is one line of console input, parsed with `FromStr`.
//! [`CombatSession::execute`] applies it and reports what happened. Indices
//! are zero-based positions in the party and opponent lists.

use crate::actions::{CastRejection, SpellTargets};
use crate::session::{CombatSession, TrackerError};
use crate::skill_check::{CheckKind, SkillCheck};
use crate::world::{OpponentField, SpellStatus, Stat};
use std::str::FromStr;
use thiserror::Error;

/// Unparseable command text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    BadNumber(String),

    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    #[error("Unknown opponent field: {0}")]
    UnknownField(String),
}

/// One operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Party setup
    AddHero(String),
    RemoveHero(usize),
    ClearParty,
    SetStat { member: usize, stat: Stat, value: i64 },
    SetMaxHealth { member: usize, value: i64 },
    SetHealth { member: usize, value: i64 },
    SetNotes { member: usize, notes: String },
    SetSilver(i64),

    // Equipment
    AddItem { member: usize, item: String },
    RemoveItem { member: usize, slot: usize },
    SetItem { member: usize, slot: usize, item: String },
    SetItemCount { member: usize, slot: usize, count: i64 },
    SetEquipped { member: usize, slot: usize, equipped: bool },

    // Spell slots
    SetSpell { member: usize, slot: usize, spell: Option<String> },
    SetSpellStatus { member: usize, slot: usize, status: SpellStatus },

    // Opponents
    AddOpponent,
    RemoveOpponent(usize),
    ClearOpponents,
    SetOpponentName { mob: usize, name: String },
    SetOpponentField { mob: usize, field: OpponentField, value: i64 },

    // Combat
    Start,
    Restart,
    Attack { attacker: usize, target: usize },
    Skip(usize),
    EndPartyTurn,
    EnemyAttack { victim: usize },
    ResolveEnemies { victim: usize },
    Cast { caster: usize, spell: String, targets: Vec<usize> },
    EndCombat,
    Undo,
    ClearLog,

    // Skill checks
    ConfigureCheck(SkillCheck),
    RollCheck(Vec<usize>),
    ResetCheck,
}

/// What executing a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed; new log lines say how.
    Applied,
    /// A precondition failed, so nothing changed.
    Ignored,
    /// Text for the operator that is not part of the combat log.
    Report(Vec<String>),
}

fn index(token: Option<&str>, usage: &'static str) -> Result<usize, CommandError> {
    let token = token.ok_or(CommandError::Usage(usage))?;
    token
        .parse()
        .map_err(|_| CommandError::BadNumber(token.to_string()))
}

fn number(token: Option<&str>, usage: &'static str) -> Result<i64, CommandError> {
    let token = token.ok_or(CommandError::Usage(usage))?;
    token
        .trim_end_matches('+')
        .parse()
        .map_err(|_| CommandError::BadNumber(token.to_string()))
}

fn rest(tokens: &[&str], usage: &'static str) -> Result<String, CommandError> {
    if tokens.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(tokens.join(" "))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };
        let arg = |i: usize| args.get(i).copied();

        let command = match verb.to_lowercase().as_str() {
            "add-hero" => Command::AddHero(rest(args, "add-hero <name>")?),
            "remove-hero" => Command::RemoveHero(index(arg(0), "remove-hero <member>")?),
            "clear-party" => Command::ClearParty,
            "stat" => {
                const USAGE: &str = "stat <member> <stat> <value>";
                let member = index(arg(0), USAGE)?;
                let name = arg(1).ok_or(CommandError::Usage(USAGE))?;
                let stat =
                    Stat::from_name(name).ok_or_else(|| CommandError::UnknownStat(name.into()))?;
                Command::SetStat {
                    member,
                    stat,
                    value: number(arg(2), USAGE)?,
                }
            }
            "max-hp" => Command::SetMaxHealth {
                member: index(arg(0), "max-hp <member> <value>")?,
                value: number(arg(1), "max-hp <member> <value>")?,
            },
            "hp" => Command::SetHealth {
                member: index(arg(0), "hp <member> <value>")?,
                value: number(arg(1), "hp <member> <value>")?,
            },
            "notes" => Command::SetNotes {
                member: index(arg(0), "notes <member> [text]")?,
                notes: args.get(1..).unwrap_or_default().join(" "),
            },
            "silver" => Command::SetSilver(number(arg(0), "silver <coins>")?),

            "item-add" => {
                const USAGE: &str = "item-add <member> <item>";
                Command::AddItem {
                    member: index(arg(0), USAGE)?,
                    item: rest(args.get(1..).unwrap_or_default(), USAGE)?,
                }
            }
            "item-remove" => Command::RemoveItem {
                member: index(arg(0), "item-remove <member> <slot>")?,
                slot: index(arg(1), "item-remove <member> <slot>")?,
            },
            "item-set" => {
                const USAGE: &str = "item-set <member> <slot> <item>";
                Command::SetItem {
                    member: index(arg(0), USAGE)?,
                    slot: index(arg(1), USAGE)?,
                    item: rest(args.get(2..).unwrap_or_default(), USAGE)?,
                }
            }
            "item-count" => {
                const USAGE: &str = "item-count <member> <slot> <count>";
                Command::SetItemCount {
                    member: index(arg(0), USAGE)?,
                    slot: index(arg(1), USAGE)?,
                    count: number(arg(2), USAGE)?,
                }
            }
            verb @ ("equip" | "unequip") => Command::SetEquipped {
                member: index(arg(0), "equip|unequip <member> <slot>")?,
                slot: index(arg(1), "equip|unequip <member> <slot>")?,
                equipped: verb == "equip",
            },

            "spell" => {
                const USAGE: &str = "spell <member> <slot> <spell|none>";
                let member = index(arg(0), USAGE)?;
                let slot = index(arg(1), USAGE)?;
                let spell = rest(args.get(2..).unwrap_or_default(), USAGE)?;
                Command::SetSpell {
                    member,
                    slot,
                    spell: (!spell.eq_ignore_ascii_case("none")).then_some(spell),
                }
            }
            "spell-status" => {
                const USAGE: &str = "spell-status <member> <slot> ready|exhausted";
                let member = index(arg(0), USAGE)?;
                let slot = index(arg(1), USAGE)?;
                let status = match arg(2).map(str::to_lowercase).as_deref() {
                    Some("ready") => SpellStatus::Ready,
                    Some("exhausted") => SpellStatus::Exhausted,
                    _ => return Err(CommandError::Usage(USAGE)),
                };
                Command::SetSpellStatus {
                    member,
                    slot,
                    status,
                }
            }

            "add-mob" => Command::AddOpponent,
            "remove-mob" => Command::RemoveOpponent(index(arg(0), "remove-mob <mob>")?),
            "clear-mobs" => Command::ClearOpponents,
            "mob-name" => {
                const USAGE: &str = "mob-name <mob> <name>";
                Command::SetOpponentName {
                    mob: index(arg(0), USAGE)?,
                    name: rest(args.get(1..).unwrap_or_default(), USAGE)?,
                }
            }
            "mob" => {
                const USAGE: &str = "mob <mob> <field> <value>";
                let mob = index(arg(0), USAGE)?;
                let name = arg(1).ok_or(CommandError::Usage(USAGE))?;
                let field = OpponentField::from_name(name)
                    .ok_or_else(|| CommandError::UnknownField(name.into()))?;
                Command::SetOpponentField {
                    mob,
                    field,
                    value: number(arg(2), USAGE)?,
                }
            }

            "start" => Command::Start,
            "restart" => Command::Restart,
            "attack" => Command::Attack {
                attacker: index(arg(0), "attack <member> <mob>")?,
                target: index(arg(1), "attack <member> <mob>")?,
            },
            "skip" => Command::Skip(index(arg(0), "skip <member>")?),
            "end-turn" => Command::EndPartyTurn,
            "enemy" => Command::EnemyAttack {
                victim: index(arg(0), "enemy <member>")?,
            },
            "enemy-all" => Command::ResolveEnemies {
                victim: index(arg(0), "enemy-all <member>")?,
            },
            "cast" => {
                const USAGE: &str = "cast <member> <spell> [target...]";
                let caster = index(arg(0), USAGE)?;
                let spell = arg(1).ok_or(CommandError::Usage(USAGE))?.to_string();
                let targets: Vec<usize> = args
                    .get(2..)
                    .unwrap_or_default()
                    .iter()
                    .map(|&t| index(Some(t), USAGE))
                    .collect::<Result<_, _>>()?;
                Command::Cast {
                    caster,
                    spell,
                    targets,
                }
            }
            "end-combat" => Command::EndCombat,
            "undo" => Command::Undo,
            "clear-log" => Command::ClearLog,

            "check" => {
                const USAGE: &str = "check individual|team <skill> <face> <required> <name>";
                let kind = match arg(0).map(str::to_lowercase).as_deref() {
                    Some("individual") => CheckKind::Individual,
                    Some("team") => CheckKind::Team,
                    _ => return Err(CommandError::Usage(USAGE)),
                };
                let skill_name = arg(1).ok_or(CommandError::Usage(USAGE))?;
                let skill = Stat::from_name(skill_name)
                    .filter(Stat::is_skill)
                    .ok_or_else(|| CommandError::UnknownStat(skill_name.into()))?;
                let target = number(arg(2), USAGE)?;
                let required = number(arg(3), USAGE)?;
                let name = rest(args.get(4..).unwrap_or_default(), USAGE)?;
                Command::ConfigureCheck(SkillCheck::new(name, kind, skill, target, required))
            }
            "check-roll" => {
                const USAGE: &str = "check-roll <member> [member]";
                if args.is_empty() {
                    return Err(CommandError::Usage(USAGE));
                }
                let members: Vec<usize> = args
                    .iter()
                    .map(|&t| index(Some(t), USAGE))
                    .collect::<Result<_, _>>()?;
                Command::RollCheck(members)
            }
            "check-reset" => Command::ResetCheck,

            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn applied(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}

impl CombatSession {
    /// Parse and run one line of operator input.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome, TrackerError> {
        let command: Command = line.parse()?;
        self.execute(command)
    }

    /// Run one command.
    ///
    /// Combat actions whose preconditions fail return [`Outcome::Ignored`].
    /// Rejected setup edits, spellcasts and skill checks return the reason as
    /// an error; none of them change state.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, TrackerError> {
        let outcome = match command {
            Command::AddHero(name) => {
                self.add_member(&name)?;
                Outcome::Applied
            }
            Command::RemoveHero(member) => {
                self.remove_member(member)?;
                Outcome::Applied
            }
            Command::ClearParty => {
                self.clear_party()?;
                Outcome::Applied
            }
            Command::SetStat {
                member,
                stat,
                value,
            } => {
                self.set_stat(member, stat, value)?;
                Outcome::Applied
            }
            Command::SetMaxHealth { member, value } => {
                self.set_max_health(member, value)?;
                Outcome::Applied
            }
            Command::SetHealth { member, value } => {
                self.set_health(member, value)?;
                Outcome::Applied
            }
            Command::SetNotes { member, notes } => {
                self.set_notes(member, &notes)?;
                Outcome::Applied
            }
            Command::SetSilver(value) => {
                self.set_silver_coins(value);
                Outcome::Applied
            }

            Command::AddItem { member, item } => {
                self.add_equipment(member, &item)?;
                Outcome::Applied
            }
            Command::RemoveItem { member, slot } => {
                self.remove_equipment(member, slot)?;
                Outcome::Applied
            }
            Command::SetItem { member, slot, item } => {
                self.set_equipment_item(member, slot, &item)?;
                Outcome::Applied
            }
            Command::SetItemCount {
                member,
                slot,
                count,
            } => {
                self.set_equipment_count(member, slot, count)?;
                Outcome::Applied
            }
            Command::SetEquipped {
                member,
                slot,
                equipped,
            } => {
                let now = self.set_equipped(member, slot, equipped)?;
                if equipped && !now {
                    Outcome::Report(vec!["Not enough free hands; item left unequipped.".into()])
                } else {
                    Outcome::Applied
                }
            }

            Command::SetSpell {
                member,
                slot,
                spell,
            } => {
                self.set_spell(member, slot, spell.as_deref())?;
                Outcome::Applied
            }
            Command::SetSpellStatus {
                member,
                slot,
                status,
            } => {
                self.set_spell_status(member, slot, status)?;
                Outcome::Applied
            }

            Command::AddOpponent => {
                self.add_opponent()?;
                Outcome::Applied
            }
            Command::RemoveOpponent(mob) => {
                self.remove_opponent(mob)?;
                Outcome::Applied
            }
            Command::ClearOpponents => {
                self.clear_opponents()?;
                Outcome::Applied
            }
            Command::SetOpponentName { mob, name } => {
                self.set_opponent_name(mob, &name)?;
                Outcome::Applied
            }
            Command::SetOpponentField { mob, field, value } => {
                self.set_opponent_field(mob, field, value)?;
                Outcome::Applied
            }

            Command::Start => {
                // A refused start still logs why.
                self.start_combat();
                Outcome::Applied
            }
            Command::Restart => applied(self.restart_from_seed()),
            Command::Attack { attacker, target } => {
                applied(self.party_attack(attacker, target).is_some())
            }
            Command::Skip(member) => applied(self.skip(member)),
            Command::EndPartyTurn => applied(self.end_party_turn()),
            // Passing an empty enemy turn returns nothing but still logs.
            Command::EnemyAttack { victim } => {
                let before = self.state.log.len();
                self.enemy_attack(victim);
                applied(self.state.log.len() != before)
            }
            Command::ResolveEnemies { victim } => {
                let before = self.state.log.len();
                self.resolve_all_enemy_attacks(victim);
                applied(self.state.log.len() != before)
            }
            Command::Cast {
                caster,
                spell,
                targets,
            } => {
                let spell = self
                    .catalog
                    .resolve_spell(&spell)
                    .map(|s| (s.id.clone(), s.target_mode.targets_ally()));
                let Some((spell_id, ally)) = spell else {
                    return Err(CastRejection::UnknownSpell.into());
                };
                let targets = if ally {
                    SpellTargets {
                        enemies: Vec::new(),
                        allies: targets,
                    }
                } else {
                    SpellTargets::enemies(targets)
                };
                self.cast_spell(caster, &spell_id, &targets)?;
                Outcome::Applied
            }
            Command::EndCombat => applied(self.end_combat()),
            Command::Undo => applied(self.undo()),
            Command::ClearLog => {
                self.clear_log();
                Outcome::Applied
            }

            Command::ConfigureCheck(check) => {
                let line = check.to_string();
                self.configure_skill_check(check)?;
                Outcome::Report(vec![line])
            }
            Command::RollCheck(members) => {
                let names: Vec<String> = members
                    .iter()
                    .map(|&i| {
                        self.state
                            .party
                            .get(i)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| format!("#{i}"))
                    })
                    .collect();
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                let result = self.roll_skill_check(&names)?;
                let mut lines = vec![result.summary()];
                lines.extend(result.breakdown());
                Outcome::Report(lines)
            }
            Command::ResetCheck => {
                self.reset_skill_check();
                Outcome::Applied
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_parse_setup_commands() {
        assert_eq!(
            "add-hero Sar Jessica Dayne".parse::<Command>(),
            Ok(Command::AddHero("Sar Jessica Dayne".into()))
        );
        assert_eq!(
            "stat 0 lore 4".parse::<Command>(),
            Ok(Command::SetStat {
                member: 0,
                stat: Stat::Lore,
                value: 4
            })
        );
        assert_eq!(
            "mob 1 def 5+".parse::<Command>(),
            Ok(Command::SetOpponentField {
                mob: 1,
                field: OpponentField::DefTarget,
                value: 5
            })
        );
        assert_eq!(
            "spell 0 2 none".parse::<Command>(),
            Ok(Command::SetSpell {
                member: 0,
                slot: 2,
                spell: None
            })
        );
        assert_eq!(
            "unequip 0 1".parse::<Command>(),
            Ok(Command::SetEquipped {
                member: 0,
                slot: 1,
                equipped: false
            })
        );
    }

    #[test]
    fn test_parse_combat_commands() {
        assert_eq!(
            "cast 1 poison_stream 0 2".parse::<Command>(),
            Ok(Command::Cast {
                caster: 1,
                spell: "poison_stream".into(),
                targets: vec![0, 2]
            })
        );
        assert_eq!("END-TURN".parse::<Command>(), Ok(Command::EndPartyTurn));
        assert_eq!(
            "check team lore 5 2 Ancient runes".parse::<Command>(),
            Ok(Command::ConfigureCheck(SkillCheck::new(
                "Ancient runes",
                CheckKind::Team,
                Stat::Lore,
                5,
                2
            )))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".into()))
        );
        assert_eq!(
            "attack x 0".parse::<Command>(),
            Err(CommandError::BadNumber("x".into()))
        );
        assert!(matches!(
            "attack 0".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
        assert_eq!(
            "stat 0 luck 3".parse::<Command>(),
            Err(CommandError::UnknownStat("luck".into()))
        );
        assert_eq!(
            "check individual armour 4 1 Brace".parse::<Command>(),
            Err(CommandError::UnknownStat("armour".into()))
        );
    }

    #[test]
    fn test_execute_drives_a_fight() {
        let mut harness = TestHarness::new();
        let session = &mut harness.session;
        session.execute_line("add-hero Brash").expect("hero");
        session.execute_line("add-mob").expect("mob");
        assert_eq!(session.execute_line("start").expect("start"), Outcome::Applied);

        harness.dice.push(&[6, 6]);
        let session = &mut harness.session;
        assert_eq!(
            session.execute_line("attack 0 0").expect("attack"),
            Outcome::Applied
        );
        assert_eq!(session.mobs()[0].health, 4);
        // Brash has acted; a second attack is ignored.
        assert_eq!(session.execute_line("attack 0 0").expect("again"), Outcome::Ignored);
        assert_eq!(session.execute_line("undo").expect("undo"), Outcome::Applied);
        assert_eq!(session.mobs()[0].health, 6);
    }

    #[test]
    fn test_execute_surfaces_rejections() {
        let mut harness = TestHarness::fight(&["Brash"], 1);
        let err = harness
            .session
            .execute_line("cast 0 ice_bolt 0")
            .expect_err("not a caster");
        assert_eq!(err.to_string(), "This hero cannot cast spells.");

        let err = harness
            .session
            .execute_line("add-hero Tasha")
            .expect_err("in combat");
        assert_eq!(err.to_string(), "Cannot change combatants during combat");
    }
}
