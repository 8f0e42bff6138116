//! Adapter traits implemented by the host simulation.
//!
//! The engine never touches host internals directly. A host binding implements
//! these traits over its own item registry, potion and enchantment catalogs,
//! players, and command senders.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::ItemIdentity;

/// Handle to a status effect in the host's effect catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectHandle(pub i32);

/// Handle to an enchantment in the host's enchantment catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnchantHandle(pub usize);

/// Built-in effect an item definition carries by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultEffect {
    pub effect: EffectHandle,
    pub duration: i32,
    pub amplifier: i32,
    pub chance: f32,
}

/// Nutrition and default effect declared by an item definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FoodDefaults {
    pub hunger: i32,
    pub saturation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_effect: Option<DefaultEffect>,
}

/// Ad-hoc effect carried by a single item instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbeddedEffect {
    pub id: i32,
    pub duration: i32,
    #[serde(default)]
    pub amplifier: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<f32>,
}

/// Host-side failures: unexpected item shapes and rejected grants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("item {item} has no `{field}` field")]
    MissingField { item: ItemIdentity, field: &'static str },
    #[error("item {0} is not registered with the host")]
    UnknownItem(ItemIdentity),
    #[error("host rejected change to {item}: {reason}")]
    Rejected { item: ItemIdentity, reason: String },
}

/// Enumerable catalog of consumable item definitions.
pub trait FoodCatalog {
    /// Identities of every item the host considers consumable.
    fn food_items(&self) -> Vec<ItemIdentity>;

    /// Current static defaults of one item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is unknown or has an unexpected shape.
    fn defaults(&self, item: &ItemIdentity) -> Result<FoodDefaults, HostError>;
}

/// Mutable access to static item definitions, used once at startup.
pub trait FoodDefinitions: FoodCatalog {
    /// # Errors
    ///
    /// Returns an error if the item cannot be patched.
    fn set_nutrition(
        &mut self,
        item: &ItemIdentity,
        hunger: i32,
        saturation: f32,
    ) -> Result<(), HostError>;

    /// Reset the built-in effect slot to "no effect".
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be patched.
    fn clear_default_effect(&mut self, item: &ItemIdentity) -> Result<(), HostError>;

    /// # Errors
    ///
    /// Returns an error if the item cannot be patched.
    fn set_default_effect(
        &mut self,
        item: &ItemIdentity,
        effect: DefaultEffect,
    ) -> Result<(), HostError>;
}

/// Status effect catalog.
pub trait EffectCatalog {
    /// Exact catalog-name lookup.
    fn effect_by_name(&self, name: &str) -> Option<EffectHandle>;
    /// Numeric-id lookup, as used by embedded effect entries.
    fn effect_by_id(&self, id: i32) -> Option<EffectHandle>;
    fn effect_name(&self, effect: EffectHandle) -> Option<String>;
}

/// Enchantment catalog, indexable by position.
pub trait EnchantmentCatalog {
    fn enchantment_count(&self) -> usize;
    fn enchantment_at(&self, index: usize) -> Option<EnchantHandle>;
    /// Registry and display names of an enchantment.
    fn enchantment_names(&self, enchantment: EnchantHandle) -> Vec<String>;
}

/// One concrete item instance that was just consumed.
pub trait ConsumedItem {
    /// Identity of the item, or `None` when the host does not consider it consumable.
    fn identity(&self) -> Option<ItemIdentity>;

    /// Nutrition currently declared for this item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item has an unexpected shape.
    fn nutrition(&self) -> Result<FoodDefaults, HostError>;

    fn embedded_effects(&self) -> Vec<EmbeddedEffect>;

    /// # Errors
    ///
    /// Returns an error if the host refuses the enchantment.
    fn add_enchantment(&mut self, enchantment: EnchantHandle, level: i32) -> Result<(), HostError>;
}

/// Entity that consumed an item.
pub trait Consumer {
    fn food_level(&self) -> i32;
    fn max_food_level(&self) -> i32;
    /// Add (or subtract, when negative) nutrition and satiety.
    fn apply_nutrition(&mut self, hunger: i32, saturation: f32);
    fn add_effect(&mut self, effect: EffectHandle, duration: i32, amplifier: i32);
}

/// Issuer of an administrative command.
pub trait CommandSender {
    fn is_console(&self) -> bool;
    fn is_operator(&self) -> bool;
    fn send_message(&mut self, message: &str);
}
