//! Read-only reference tables handed to a session.

use crate::items::{resolve_item, ItemDef, ITEMS};
use crate::roster::Roster;
use crate::spells::{resolve_spell, SpellDef, SPELLS};
use crate::world::{EquipmentEntry, ItemRef};

/// Items, spells and heroes a session consults by id.
///
/// The session never mutates the catalog; share one via `Arc` between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub items: Vec<ItemDef>,
    pub spells: Vec<SpellDef>,
    pub roster: Roster,
}

impl Catalog {
    /// The standard tables.
    pub fn standard() -> Self {
        Self {
            items: ITEMS.clone(),
            spells: SPELLS.clone(),
            roster: Roster::standard(),
        }
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Resolve an item by id, then by case-insensitive name.
    pub fn resolve(&self, id_or_name: &str) -> Option<&ItemDef> {
        resolve_item(&self.items, id_or_name)
    }

    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.iter().find(|s| s.id == id)
    }

    pub fn resolve_spell(&self, id_or_name: &str) -> Option<&SpellDef> {
        resolve_spell(&self.spells, id_or_name)
    }

    /// The catalog item an equipment slot points at. Custom text matching a
    /// catalog name counts as that item.
    pub fn entry_item(&self, entry: &EquipmentEntry) -> Option<&ItemDef> {
        match &entry.item {
            ItemRef::Empty => None,
            ItemRef::Catalog(id) => self.item(id),
            ItemRef::Custom(text) => {
                let lower = text.to_lowercase();
                self.items.iter().find(|i| i.name.to_lowercase() == lower)
            }
        }
    }

    /// Turn typed text into an item reference: a catalog match if one
    /// exists, otherwise custom text.
    pub fn match_item(&self, text: &str) -> ItemRef {
        let text = text.trim();
        if text.is_empty() {
            return ItemRef::Empty;
        }
        match self.resolve(text) {
            Some(item) => ItemRef::Catalog(item.id.clone()),
            None => ItemRef::Custom(text.to_string()),
        }
    }

    /// A fresh slot for `text`. Items that need equipping start equipped.
    pub fn new_entry(&self, text: &str) -> EquipmentEntry {
        let item = self.match_item(text);
        let equipped = match &item {
            ItemRef::Catalog(id) => self.item(id).is_some_and(|i| i.requires_equip()),
            _ => false,
        };
        EquipmentEntry {
            item,
            count: 1,
            equipped,
        }
    }

    /// Display text for a slot: the item summary, `Custom item`, or `No item`.
    pub fn describe_entry(&self, entry: &EquipmentEntry) -> String {
        match self.entry_item(entry) {
            Some(item) => item.describe(Some(entry)),
            None if matches!(entry.item, ItemRef::Custom(_)) => "Custom item".to_string(),
            None => "No item".to_string(),
        }
    }

    /// Display name for a slot.
    pub fn entry_name(&self, entry: &EquipmentEntry) -> String {
        match (&entry.item, self.entry_item(entry)) {
            (_, Some(item)) => item.name.clone(),
            (ItemRef::Custom(text), None) => text.clone(),
            _ => String::new(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
