//! Item catalog.
//!
//! Static reference data the engine consults by id: stat-boosting gear,
//! shields, weapons, armour and inert key items.

use crate::world::{EquipmentEntry, Stat};
use serde::{Deserialize, Serialize};

/// Broad item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Gear,
    Weapon,
    Wearable,
}

/// A catalog item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub modifiers: Vec<(Stat, i32)>,
    /// Hands the item occupies when equipped; 0 for items that need none.
    pub hands: u8,
    /// Stackable items multiply their modifiers by the slot count.
    pub countable: bool,
}

impl ItemDef {
    fn new(id: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            modifiers: Vec::new(),
            hands: 0,
            countable: false,
        }
    }

    pub fn gear(id: &str, name: &str) -> Self {
        Self::new(id, name, ItemKind::Gear)
    }

    pub fn weapon(id: &str, name: &str, hands: u8) -> Self {
        Self::new(id, name, ItemKind::Weapon).with_hands(hands)
    }

    pub fn wearable(id: &str, name: &str) -> Self {
        Self::new(id, name, ItemKind::Wearable)
    }

    pub fn with_modifier(mut self, stat: Stat, amount: i32) -> Self {
        self.modifiers.push((stat, amount));
        self
    }

    pub fn with_hands(mut self, hands: u8) -> Self {
        self.hands = hands;
        self
    }

    pub fn countable(mut self) -> Self {
        self.countable = true;
        self
    }

    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon
    }

    /// Weapons and anything occupying hands only count while equipped.
    pub fn requires_equip(&self) -> bool {
        self.is_weapon() || self.hands > 0
    }

    /// Hands consumed against the two-hand budget.
    pub fn hand_cost(&self) -> u32 {
        match self.hands {
            0 if self.is_weapon() => 1,
            0 => 0,
            1 => 1,
            _ => 2,
        }
    }

    pub fn modifier(&self, stat: Stat) -> i32 {
        self.modifiers
            .iter()
            .filter(|(s, _)| *s == stat)
            .map(|(_, v)| *v)
            .sum()
    }

    /// One-line summary for display, e.g. `Fighting+2 • One-handed • Weapon • Equipped`.
    pub fn describe(&self, entry: Option<&EquipmentEntry>) -> String {
        let mut details = Vec::new();
        let mods: Vec<String> = self
            .modifiers
            .iter()
            .filter(|(_, v)| *v != 0)
            .map(|(s, v)| format!("{}{}{}", s.name(), if *v >= 0 { "+" } else { "" }, v))
            .collect();
        if !mods.is_empty() {
            details.push(mods.join(", "));
        }
        match self.hands {
            0 => {}
            1 => details.push("One-handed".to_string()),
            _ => details.push("Two-handed".to_string()),
        }
        if self.is_weapon() {
            details.push("Weapon".to_string());
            let equipped = entry.is_some_and(|e| e.equipped);
            details.push(if equipped { "Equipped" } else { "Unequipped" }.to_string());
        }
        if mods.is_empty() && self.hands == 0 && self.kind == ItemKind::Gear {
            details.push("No stat effect".to_string());
        }
        if self.countable {
            details.push(format!("Count: {}", entry.map_or(1, |e| e.count.max(1))));
        }
        details.join(" • ")
    }
}

/// Get a standard item by id.
pub fn get_item(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|i| i.id == id)
}

/// Find a standard item by id, then by case-insensitive name.
pub fn find_item(id_or_name: &str) -> Option<&'static ItemDef> {
    resolve_item(&ITEMS, id_or_name)
}

/// Resolve `id_or_name` against any item table: exact id first, then name.
pub fn resolve_item<'a>(items: &'a [ItemDef], id_or_name: &str) -> Option<&'a ItemDef> {
    let needle = id_or_name.trim();
    if needle.is_empty() {
        return None;
    }
    items.iter().find(|i| i.id == needle).or_else(|| {
        let lower = needle.to_lowercase();
        items.iter().find(|i| i.name.to_lowercase() == lower)
    })
}

// ============================================================================
// Catalog
// ============================================================================

lazy_static::lazy_static! {
    /// Every item a hero can carry.
    pub static ref ITEMS: Vec<ItemDef> = vec![
        // Stealth
        ItemDef::gear("soft_boots", "Soft Boots").with_modifier(Stat::Stealth, 1),
        ItemDef::gear("fine_boots", "Fine Boots").with_modifier(Stat::Stealth, 2),
        // Survival
        ItemDef::gear("warm_cloak", "Warm cloak").with_modifier(Stat::Survival, 1),
        ItemDef::gear("rugged_cloak", "Rugged cloak").with_modifier(Stat::Survival, 2),
        // Charisma
        ItemDef::gear("handsome_brooch", "Handsome brooch").with_modifier(Stat::Charisma, 1),
        ItemDef::gear("glittering_necklace", "Glittering Necklace").with_modifier(Stat::Charisma, 2),
        // Lore
        ItemDef::gear("reference_book", "Reference book").with_modifier(Stat::Lore, 1),
        ItemDef::gear("tome_of_knowledge", "Tome of knowledge").with_modifier(Stat::Lore, 2),
        // Shields
        ItemDef::gear("shield", "Shield").with_modifier(Stat::Armour, 2).with_hands(1),
        // One-handed weapons
        ItemDef::weapon("crude_blade", "Crude Blade", 1).with_modifier(Stat::Fighting, 0),
        ItemDef::weapon("iron_shortsword", "Iron Shortsword", 1).with_modifier(Stat::Fighting, 1),
        ItemDef::weapon("steel_longsword", "Steel Longsword", 1).with_modifier(Stat::Fighting, 2),
        ItemDef::weapon("steel_scimitar", "Steel Scimitar", 1).with_modifier(Stat::Fighting, 2),
        ItemDef::weapon("skallos_runeblade", "Skallos Runeblade", 1)
            .with_modifier(Stat::Fighting, 3)
            .with_modifier(Stat::Lore, 2),
        // Two-handed weapons
        ItemDef::weapon("maul", "Maul", 2).with_modifier(Stat::Fighting, 1),
        ItemDef::weapon("iron_greataxe", "Iron Greataxe", 2).with_modifier(Stat::Fighting, 2),
        ItemDef::weapon("steel_greatsword", "Steel Greatsword", 2).with_modifier(Stat::Fighting, 3),
        // Armour
        ItemDef::wearable("hide_armour", "Hide Armour").with_modifier(Stat::Armour, 1),
        ItemDef::wearable("bone_armour", "Bone Armour").with_modifier(Stat::Armour, 2),
        ItemDef::wearable("bronze_armour", "Bronze Armour").with_modifier(Stat::Armour, 4),
        ItemDef::wearable("black_plate_armour", "Black Plate Armour").with_modifier(Stat::Armour, 3),
        ItemDef::gear("amulet_of_defence", "Amulet of Defence").with_modifier(Stat::Armour, 1),
        // Key items
        ItemDef::gear("black_prism", "Black Prism"),
        ItemDef::gear("bluestone", "Bluestone"),
        ItemDef::gear("bronze_locket", "Bronze Locket"),
        ItemDef::gear("bronze_scorpion", "Bronze Scorpion"),
        ItemDef::gear("calligraphy_ink", "Calligraphy Ink"),
        ItemDef::gear("dragon_head", "Dragon Head"),
        ItemDef::gear("dragonyak_horn", "Dragonyak Horn"),
        ItemDef::gear("engagement_ring", "Engagement Ring"),
        ItemDef::gear("fairbrother_family_crest", "Fairbrother Family Crest"),
        ItemDef::gear("gold_portrait", "Gold Portrait"),
        ItemDef::gear("golden_candlestick", "Golden Candlestick"),
        ItemDef::gear("grey_talisman", "Grey Talisman"),
        ItemDef::gear("hygliph_flower", "Hygliph flower"),
        ItemDef::gear("incense", "Incense"),
        ItemDef::gear("iron_key", "Iron Key"),
        ItemDef::gear("iron_sceptre", "Iron Sceptre"),
        ItemDef::gear("jewellery_box", "Jewellery Box"),
        ItemDef::gear("lizard_hide", "Lizard Hide"),
        ItemDef::gear("precious_tomes", "Precious Tomes"),
        ItemDef::gear("prybar", "Prybar"),
        ItemDef::gear("quicksilver", "Quicksilver"),
        ItemDef::gear("silver_idol", "Silver Idol"),
        ItemDef::gear("talisman_saint_elias", "Talisman of Saint Elias"),
        ItemDef::gear("troglodyte_heads", "Troglodyte Heads").countable(),
        ItemDef::gear("vial_of_poison", "Vial of poison"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ItemRef;

    #[test]
    fn test_find_item_by_id_and_name() {
        assert_eq!(find_item("maul").map(|i| i.name.as_str()), Some("Maul"));
        assert_eq!(
            find_item("steel greatsword").map(|i| i.id.as_str()),
            Some("steel_greatsword")
        );
        assert!(find_item("lightsaber").is_none());
        assert!(find_item("  ").is_none());
    }

    #[test]
    fn test_requires_equip() {
        assert!(find_item("maul").is_some_and(|i| i.requires_equip()));
        assert!(find_item("shield").is_some_and(|i| i.requires_equip()));
        assert!(!find_item("bronze_armour").is_some_and(|i| i.requires_equip()));
        assert!(!find_item("soft_boots").is_some_and(|i| i.requires_equip()));
    }

    #[test]
    fn test_hand_cost() {
        assert_eq!(get_item("maul").map(|i| i.hand_cost()), Some(2));
        assert_eq!(get_item("crude_blade").map(|i| i.hand_cost()), Some(1));
        assert_eq!(get_item("shield").map(|i| i.hand_cost()), Some(1));
        assert_eq!(get_item("hide_armour").map(|i| i.hand_cost()), Some(0));
    }

    #[test]
    fn test_modifier_sums() {
        let runeblade = get_item("skallos_runeblade").expect("runeblade");
        assert_eq!(runeblade.modifier(Stat::Fighting), 3);
        assert_eq!(runeblade.modifier(Stat::Lore), 2);
        assert_eq!(runeblade.modifier(Stat::Armour), 0);
    }

    #[test]
    fn test_describe() {
        let sword = get_item("steel_longsword").expect("sword");
        let entry = EquipmentEntry {
            item: ItemRef::Catalog("steel_longsword".into()),
            count: 1,
            equipped: true,
        };
        assert_eq!(
            sword.describe(Some(&entry)),
            "Fighting+2 • One-handed • Weapon • Equipped"
        );

        let prism = get_item("black_prism").expect("prism");
        assert_eq!(prism.describe(None), "No stat effect");

        let heads = get_item("troglodyte_heads").expect("heads");
        let stack = EquipmentEntry {
            item: ItemRef::Catalog("troglodyte_heads".into()),
            count: 3,
            equipped: false,
        };
        assert_eq!(heads.describe(Some(&stack)), "No stat effect • Count: 3");

        let plate = get_item("black_plate_armour").expect("plate");
        assert_eq!(plate.describe(None), "Armour+3");
    }
}
