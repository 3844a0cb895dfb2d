//! The fixed hero roster.

use serde::{Deserialize, Serialize};

/// Heroes a party may be drawn from, in picker order.
pub const HERO_NAMES: [&str; 6] = [
    "Sar Jessica Dayne",
    "Lord Ti\u{2019}quon",
    "Tasha",
    "Amelia Pass-Dayne",
    "Akihiro of Chalice",
    "Brash",
];

/// Heroes allowed to prepare and cast spells.
pub const SPELLCASTER_NAMES: [&str; 2] = ["Amelia Pass-Dayne", "Lord Ti\u{2019}quon"];

/// A roster: valid hero names plus the spellcaster allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub heroes: Vec<String>,
    pub spellcasters: Vec<String>,
}

impl Roster {
    pub fn standard() -> Self {
        Self {
            heroes: HERO_NAMES.iter().map(|s| s.to_string()).collect(),
            spellcasters: SPELLCASTER_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.heroes.iter().any(|h| h == name)
    }

    pub fn is_spellcaster(&self, name: &str) -> bool {
        self.spellcasters.iter().any(|h| h == name)
    }

    /// Match a typed name to a roster entry, ignoring case.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let needle = name.trim();
        self.heroes
            .iter()
            .find(|h| h.as_str() == needle)
            .or_else(|| {
                let lower = needle.to_lowercase();
                self.heroes.iter().find(|h| h.to_lowercase() == lower)
            })
            .map(|h| h.as_str())
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}
