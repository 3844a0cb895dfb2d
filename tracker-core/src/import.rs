//! Bulk import of opponents and skill checks from pasted text.
//!
//! Encounter text is blocks of four non-blank lines per opponent:
//!
//! ```text
//! Goblin
//! 4(5+)
//! 4+
//! 6
//! ```
//!
//! The attack line may carry guaranteed damage: `3(4+) + 2 Auto`.
//! Parsing is all-or-nothing; any bad block fails the whole import.

use crate::skill_check::{CheckKind, SkillCheck};
use crate::world::{Opponent, Stat};
use thiserror::Error;

/// Errors from parsing import text. Messages are shown to the operator as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Incomplete block (need 4 lines per opponent).")]
    IncompleteBlock,

    #[error("Bad attack line for \"{name}\": \"{line}\"")]
    BadAttackLine { name: String, line: String },

    #[error("Bad defence line for \"{name}\": \"{line}\"")]
    BadDefenceLine { name: String, line: String },

    #[error("Bad health line for \"{name}\": \"{line}\"")]
    BadHealthLine { name: String, line: String },

    #[error("No opponents parsed.")]
    NoOpponents,

    #[error("Missing check header, e.g. \"Locked door (Individual check)\".")]
    MissingHeader,

    #[error("Unknown check type: \"{0}\"")]
    BadCheckKind(String),

    #[error("Missing \"Skill and DC: <Skill> (<N>+)\" line.")]
    MissingSkillLine,

    #[error("Bad skill line: \"{0}\"")]
    BadSkillLine(String),

    #[error("Unknown skill: \"{0}\"")]
    UnknownSkill(String),

    #[error("Missing \"Successes required: <N>\" line.")]
    MissingSuccessesLine,

    #[error("Bad successes line: \"{0}\"")]
    BadSuccessesLine(String),
}

/// Trimmed, non-blank lines.
fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// A small token reader. Whitespace is allowed between tokens, not inside numbers.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Digits as a number. Overlong runs saturate; callers clamp.
    fn number(&mut self) -> Option<i64> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let value = self.rest[..end].parse().unwrap_or(i64::MAX);
        self.rest = &self.rest[end..];
        Some(value)
    }

    /// A single digit from 2 to 6.
    fn face(&mut self) -> Option<u8> {
        self.skip_ws();
        let c = self.rest.chars().next()?;
        let face = c.to_digit(10)? as u8;
        if !(2..=6).contains(&face) {
            return None;
        }
        self.rest = &self.rest[1..];
        Some(face)
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(ch) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        self.skip_ws();
        match self.rest.get(..word.len()) {
            Some(head) if head.eq_ignore_ascii_case(word) => {
                self.rest = &self.rest[word.len()..];
                true
            }
            _ => false,
        }
    }

    fn done(&mut self) -> bool {
        self.skip_ws();
        self.rest.is_empty()
    }
}

/// `4(5+)` or `3(4+) + 2 Auto` into (dice, target, auto).
fn parse_attack(line: &str) -> Option<(i64, u8, i64)> {
    let mut c = Cursor::new(line);
    let dice = c.number()?;
    if !c.eat('(') {
        return None;
    }
    let target = c.face()?;
    if !(c.eat('+') && c.eat(')')) {
        return None;
    }
    let mut auto = 0;
    if c.eat('+') {
        auto = c.number()?;
        if !c.eat_word("auto") {
            return None;
        }
    }
    c.done().then_some((dice, target, auto))
}

/// `4+`
fn parse_defence(line: &str) -> Option<u8> {
    let mut c = Cursor::new(line);
    let face = c.face()?;
    (c.eat('+') && c.done()).then_some(face)
}

fn parse_health(line: &str) -> Option<i64> {
    let mut c = Cursor::new(line);
    let hp = c.number()?;
    c.done().then_some(hp)
}

/// Parse encounter text into opponents, each at full health.
pub fn parse_encounter(text: &str) -> Result<Vec<Opponent>, ImportError> {
    let lines = content_lines(text);
    let mut mobs = Vec::new();
    for block in lines.chunks(4) {
        let [name, attack, defence, health] = block else {
            return Err(ImportError::IncompleteBlock);
        };
        let (atk_dice, atk_target, auto) =
            parse_attack(attack).ok_or_else(|| ImportError::BadAttackLine {
                name: name.to_string(),
                line: attack.to_string(),
            })?;
        let def_target = parse_defence(defence).ok_or_else(|| ImportError::BadDefenceLine {
            name: name.to_string(),
            line: defence.to_string(),
        })?;
        let hp = parse_health(health).ok_or_else(|| ImportError::BadHealthLine {
            name: name.to_string(),
            line: health.to_string(),
        })?;
        mobs.push(Opponent::new(
            *name,
            atk_dice,
            atk_target as i64,
            auto,
            def_target as i64,
            hp,
            hp,
        ));
    }
    if mobs.is_empty() {
        return Err(ImportError::NoOpponents);
    }
    Ok(mobs)
}

/// `Name (Individual check)` into (name, kind).
fn parse_check_header(line: &str) -> Result<(String, CheckKind), ImportError> {
    let inner = line
        .strip_suffix(')')
        .and_then(|head| head.rfind('(').map(|open| (head[..open].trim(), &head[open + 1..])))
        .filter(|(name, _)| !name.is_empty())
        .ok_or(ImportError::MissingHeader)?;
    let (name, kind_text) = inner;
    let kind = match kind_text.trim().to_lowercase().as_str() {
        "individual check" | "individual" => CheckKind::Individual,
        "team check" | "team" => CheckKind::Team,
        other => return Err(ImportError::BadCheckKind(other.to_string())),
    };
    Ok((name.to_string(), kind))
}

/// Text after a case-insensitive `label:` prefix.
fn labelled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    line[label.len()..].trim_start().strip_prefix(':')
}

/// `Stealth (5+)` into (skill, face).
fn parse_skill_and_dc(rest: &str) -> Result<(Stat, u8), ImportError> {
    let bad = || ImportError::BadSkillLine(rest.trim().to_string());
    let open = rest.find('(').ok_or_else(bad)?;
    let skill_name = rest[..open].trim();
    let mut c = Cursor::new(&rest[open + 1..]);
    let face = c.face().ok_or_else(bad)?;
    if !(c.eat('+') && c.eat(')') && c.done()) {
        return Err(bad());
    }
    let skill = Stat::from_name(skill_name)
        .filter(|s| s.is_skill())
        .ok_or_else(|| ImportError::UnknownSkill(skill_name.to_string()))?;
    Ok((skill, face))
}

/// Parse a pasted skill check.
///
/// ```text
/// Locked door (Individual check)
/// Skill and DC: Lore (5+)
/// Successes required: 2
/// ```
///
/// Lines beyond these three are ignored.
pub fn parse_skill_check(text: &str) -> Result<SkillCheck, ImportError> {
    let lines = content_lines(text);
    let header = lines.first().ok_or(ImportError::MissingHeader)?;
    let (name, kind) = parse_check_header(header)?;

    let skill_rest = lines[1..]
        .iter()
        .find_map(|l| labelled(l, "skill and dc"))
        .ok_or(ImportError::MissingSkillLine)?;
    let (skill, face) = parse_skill_and_dc(skill_rest)?;

    let successes_rest = lines[1..]
        .iter()
        .find_map(|l| labelled(l, "successes required"))
        .ok_or(ImportError::MissingSuccessesLine)?;
    let mut c = Cursor::new(successes_rest);
    let required = c
        .number()
        .filter(|_| c.done())
        .ok_or_else(|| ImportError::BadSuccessesLine(successes_rest.trim().to_string()))?;

    Ok(SkillCheck::new(name, kind, skill, face as i64, required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goblin() {
        let mobs = parse_encounter("Goblin\n4(5+)\n4+\n6").expect("parse");
        assert_eq!(mobs.len(), 1);
        let goblin = &mobs[0];
        assert_eq!(goblin.name, "Goblin");
        assert_eq!(
            (goblin.atk_dice, goblin.atk_target, goblin.auto, goblin.def_target),
            (4, 5, 0, 4)
        );
        assert_eq!((goblin.health, goblin.max_health), (6, 6));
        assert!(!goblin.dead);
    }

    #[test]
    fn test_parse_auto_and_spacing() {
        let text = "\r\n  Ogre Chief \r\n3 ( 4 + ) + 2 auto\n\n 5 +\n12\nRat\n1(6+)\n6+\n1\n";
        let mobs = parse_encounter(text).expect("parse");
        assert_eq!(mobs.len(), 2);
        assert_eq!(mobs[0].name, "Ogre Chief");
        assert_eq!((mobs[0].atk_dice, mobs[0].atk_target, mobs[0].auto), (3, 4, 2));
        assert_eq!(mobs[0].def_target, 5);
        assert_eq!(mobs[1].health, 1);
    }

    #[test]
    fn test_oversized_numbers_clamp() {
        let mobs = parse_encounter("Titan\n99999999999(4+) + 123456789012345678901234 Auto\n2+\n99999999999")
            .expect("parse");
        let titan = &mobs[0];
        assert_eq!((titan.atk_dice, titan.auto), (99, 99));
        assert_eq!((titan.health, titan.max_health), (999, 999));

        let check = parse_skill_check(
            "Endless (Team check)\nSkill and DC: Lore (4+)\nSuccesses required: 99999999999",
        )
        .expect("parse");
        assert_eq!(check.required, 99);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_encounter(""), Err(ImportError::NoOpponents));
        assert_eq!(
            parse_encounter("Goblin\n4(5+)\n4+"),
            Err(ImportError::IncompleteBlock)
        );
        assert_eq!(
            parse_encounter("Goblin\n4(7+)\n4+\n6"),
            Err(ImportError::BadAttackLine {
                name: "Goblin".into(),
                line: "4(7+)".into()
            })
        );
        assert!(matches!(
            parse_encounter("Goblin\n4(5+)\n1+\n6"),
            Err(ImportError::BadDefenceLine { .. })
        ));
        assert!(matches!(
            parse_encounter("Goblin\n4(5+)\n4+\nsix"),
            Err(ImportError::BadHealthLine { .. })
        ));
        assert!(matches!(
            parse_encounter("Goblin\n4(56+)\n4+\n6"),
            Err(ImportError::BadAttackLine { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = parse_encounter("Goblin\n4(7+)\n4+\n6").expect_err("bad");
        assert_eq!(err.to_string(), "Bad attack line for \"Goblin\": \"4(7+)\"");
        assert_eq!(ImportError::NoOpponents.to_string(), "No opponents parsed.");
    }

    #[test]
    fn test_second_block_failure_rejects_all() {
        let text = "Goblin\n4(5+)\n4+\n6\nOrc\nlots\n4+\n6";
        assert!(parse_encounter(text).is_err());
    }

    #[test]
    fn test_parse_skill_check() {
        let text = "Locked door (Individual check)\nSkill and DC: lore (5+)\nSuccesses required: 2\nFlavour text";
        let check = parse_skill_check(text).expect("parse");
        assert_eq!(check.name, "Locked door");
        assert_eq!(check.kind, CheckKind::Individual);
        assert_eq!(check.skill, Stat::Lore);
        assert_eq!(check.target, 5);
        assert_eq!(check.required, 2);
    }

    #[test]
    fn test_parse_team_check() {
        let text = "Climb the cliff (Team check)\nSuccesses required: 4\nSkill and DC: Survival (4+)";
        let check = parse_skill_check(text).expect("parse");
        assert_eq!(check.kind, CheckKind::Team);
        assert_eq!(check.skill, Stat::Survival);
        assert_eq!(check.required, 4);
    }

    #[test]
    fn test_skill_check_errors() {
        assert_eq!(parse_skill_check(""), Err(ImportError::MissingHeader));
        assert_eq!(
            parse_skill_check("Door\nSkill and DC: Lore (5+)"),
            Err(ImportError::MissingHeader)
        );
        assert_eq!(
            parse_skill_check("Door (Solo check)"),
            Err(ImportError::BadCheckKind("solo check".into()))
        );
        assert_eq!(
            parse_skill_check("Door (Team check)\nSuccesses required: 1"),
            Err(ImportError::MissingSkillLine)
        );
        assert_eq!(
            parse_skill_check("Door (Team check)\nSkill and DC: Armour (4+)\nSuccesses required: 1"),
            Err(ImportError::UnknownSkill("Armour".into()))
        );
        assert_eq!(
            parse_skill_check("Door (Team check)\nSkill and DC: Magic (4+)\nSuccesses required: 1"),
            Err(ImportError::UnknownSkill("Magic".into()))
        );
        assert_eq!(
            parse_skill_check("Door (Team check)\nSkill and DC: Lore (4+)"),
            Err(ImportError::MissingSuccessesLine)
        );
        assert_eq!(
            parse_skill_check("Door (Team check)\nSkill and DC: Lore (4+)\nSuccesses required: many"),
            Err(ImportError::BadSuccessesLine("many".into()))
        );
    }
}
