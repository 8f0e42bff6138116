//! In-memory host for rehearsing overrides outside a running simulation.
//!
//! The sandbox implements every host adapter trait over plain data and can be
//! loaded from a JSON fixture, so operators can preview a rebalance and tests
//! can drive the engine end to end.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::host::{
    CommandSender, ConsumedItem, Consumer, DefaultEffect, EffectCatalog, EffectHandle,
    EmbeddedEffect, EnchantHandle, EnchantmentCatalog, FoodCatalog, FoodDefaults, FoodDefinitions,
    HostError,
};
use crate::identity::ItemIdentity;

/// Enchantment entry: registry key and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEnchantment {
    pub key: String,
    pub name: String,
}

/// Item registry plus effect and enchantment catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxHost {
    #[serde(default = "SandboxHost::vanilla_effects")]
    pub effects: BTreeMap<i32, String>,
    #[serde(default = "SandboxHost::vanilla_enchantments")]
    pub enchantments: Vec<SandboxEnchantment>,
    #[serde(default)]
    pub items: BTreeMap<ItemIdentity, FoodDefaults>,
}

impl Default for SandboxHost {
    fn default() -> Self {
        Self {
            effects: Self::vanilla_effects(),
            enchantments: Self::vanilla_enchantments(),
            items: BTreeMap::new(),
        }
    }
}

impl SandboxHost {
    fn vanilla_effects() -> BTreeMap<i32, String> {
        [
            (1, "speed"),
            (2, "slowness"),
            (3, "haste"),
            (4, "mining_fatigue"),
            (5, "strength"),
            (6, "instant_health"),
            (7, "instant_damage"),
            (8, "jump_boost"),
            (9, "nausea"),
            (10, "regeneration"),
            (11, "resistance"),
            (12, "fire_resistance"),
            (13, "water_breathing"),
            (14, "invisibility"),
            (15, "blindness"),
            (16, "night_vision"),
            (17, "hunger"),
            (18, "weakness"),
            (19, "poison"),
            (20, "wither"),
            (21, "health_boost"),
            (22, "absorption"),
            (23, "saturation"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect()
    }

    fn vanilla_enchantments() -> Vec<SandboxEnchantment> {
        [
            ("protection", "Protection"),
            ("fire_protection", "Fire Protection"),
            ("feather_falling", "Feather Falling"),
            ("blast_protection", "Blast Protection"),
            ("projectile_protection", "Projectile Protection"),
            ("respiration", "Respiration"),
            ("aqua_affinity", "Aqua Affinity"),
            ("thorns", "Thorns"),
            ("sharpness", "Sharpness"),
            ("smite", "Smite"),
            ("bane_of_arthropods", "Bane of Arthropods"),
            ("knockback", "Knockback"),
            ("fire_aspect", "Fire Aspect"),
            ("looting", "Looting"),
            ("efficiency", "Efficiency"),
            ("silk_touch", "Silk Touch"),
            ("unbreaking", "Unbreaking"),
            ("fortune", "Fortune"),
            ("power", "Power"),
            ("punch", "Punch"),
            ("flame", "Flame"),
            ("infinity", "Infinity"),
            ("luck_of_the_sea", "Luck of the Sea"),
            ("lure", "Lure"),
        ]
        .into_iter()
        .map(|(key, name)| SandboxEnchantment {
            key: format!("enchantment.{key}"),
            name: name.to_string(),
        })
        .collect()
    }

    /// Host preloaded with the classic food roster.
    #[must_use]
    pub fn vanilla() -> Self {
        let mut host = Self::default();
        let plain: [(&str, i32, f32); 18] = [
            ("apple", 4, 0.3),
            ("mushroom_stew", 6, 0.6),
            ("bread", 5, 0.6),
            ("porkchop", 3, 0.3),
            ("cooked_porkchop", 8, 0.8),
            ("fish", 2, 0.1),
            ("cooked_fish", 5, 0.6),
            ("cookie", 2, 0.1),
            ("melon", 2, 0.3),
            ("beef", 3, 0.3),
            ("cooked_beef", 8, 0.8),
            ("cooked_chicken", 6, 0.6),
            ("carrot", 3, 0.6),
            ("potato", 1, 0.3),
            ("baked_potato", 5, 0.6),
            ("golden_carrot", 6, 1.2),
            ("pumpkin_pie", 8, 0.3),
            ("cake", 2, 0.1),
        ];
        for (name, hunger, saturation) in plain {
            host.add_food(&format!("minecraft:{name}"), hunger, saturation, None);
        }

        let with_effect: [(&str, i32, f32, i32, i32, i32, f32); 5] = [
            ("chicken", 2, 0.3, 17, 600, 0, 0.3),
            ("rotten_flesh", 4, 0.1, 17, 600, 0, 0.8),
            ("spider_eye", 2, 0.8, 19, 100, 0, 1.0),
            ("poisonous_potato", 2, 0.3, 19, 100, 0, 0.6),
            ("golden_apple", 4, 1.2, 10, 100, 1, 1.0),
        ];
        for (name, hunger, saturation, effect, duration, amplifier, chance) in with_effect {
            host.add_food(
                &format!("minecraft:{name}"),
                hunger,
                saturation,
                Some(DefaultEffect {
                    effect: EffectHandle(effect),
                    duration,
                    amplifier,
                    chance,
                }),
            );
        }
        host
    }

    /// Parse a host fixture; missing catalogs fall back to the vanilla ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn add_food(
        &mut self,
        id: &str,
        hunger: i32,
        saturation: f32,
        default_effect: Option<DefaultEffect>,
    ) {
        self.items.insert(
            ItemIdentity::new(id),
            FoodDefaults {
                hunger,
                saturation,
                default_effect,
            },
        );
    }

    /// A fresh item instance of `identity`; non-food identities are not consumable.
    #[must_use]
    pub fn stack(&self, identity: &ItemIdentity) -> SandboxStack {
        SandboxStack {
            identity: identity.clone(),
            defaults: self.items.get(identity).copied(),
            embedded: Vec::new(),
            enchantments: Vec::new(),
        }
    }

    fn entry_mut(&mut self, item: &ItemIdentity) -> Result<&mut FoodDefaults, HostError> {
        self.items
            .get_mut(item)
            .ok_or_else(|| HostError::UnknownItem(item.clone()))
    }
}

impl FoodCatalog for SandboxHost {
    fn food_items(&self) -> Vec<ItemIdentity> {
        self.items.keys().cloned().collect()
    }

    fn defaults(&self, item: &ItemIdentity) -> Result<FoodDefaults, HostError> {
        self.items
            .get(item)
            .copied()
            .ok_or_else(|| HostError::UnknownItem(item.clone()))
    }
}

impl FoodDefinitions for SandboxHost {
    fn set_nutrition(
        &mut self,
        item: &ItemIdentity,
        hunger: i32,
        saturation: f32,
    ) -> Result<(), HostError> {
        let entry = self.entry_mut(item)?;
        entry.hunger = hunger;
        entry.saturation = saturation;
        Ok(())
    }

    fn clear_default_effect(&mut self, item: &ItemIdentity) -> Result<(), HostError> {
        self.entry_mut(item)?.default_effect = None;
        Ok(())
    }

    fn set_default_effect(
        &mut self,
        item: &ItemIdentity,
        effect: DefaultEffect,
    ) -> Result<(), HostError> {
        self.entry_mut(item)?.default_effect = Some(effect);
        Ok(())
    }
}

impl EffectCatalog for SandboxHost {
    fn effect_by_name(&self, name: &str) -> Option<EffectHandle> {
        self.effects
            .iter()
            .find(|(_, candidate)| candidate.as_str() == name)
            .map(|(&id, _)| EffectHandle(id))
    }

    fn effect_by_id(&self, id: i32) -> Option<EffectHandle> {
        self.effects.contains_key(&id).then_some(EffectHandle(id))
    }

    fn effect_name(&self, effect: EffectHandle) -> Option<String> {
        self.effects.get(&effect.0).cloned()
    }
}

impl EnchantmentCatalog for SandboxHost {
    fn enchantment_count(&self) -> usize {
        self.enchantments.len()
    }

    fn enchantment_at(&self, index: usize) -> Option<EnchantHandle> {
        (index < self.enchantments.len()).then_some(EnchantHandle(index))
    }

    fn enchantment_names(&self, enchantment: EnchantHandle) -> Vec<String> {
        self.enchantments
            .get(enchantment.0)
            .map(|entry| vec![entry.key.clone(), entry.name.clone()])
            .unwrap_or_default()
    }
}

/// One item instance. Nutrition is captured from the host when the stack is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxStack {
    pub identity: ItemIdentity,
    pub defaults: Option<FoodDefaults>,
    #[serde(default)]
    pub embedded: Vec<EmbeddedEffect>,
    #[serde(default)]
    pub enchantments: Vec<(EnchantHandle, i32)>,
}

impl SandboxStack {
    #[must_use]
    pub fn with_embedded(mut self, effect: EmbeddedEffect) -> Self {
        self.embedded.push(effect);
        self
    }
}

impl ConsumedItem for SandboxStack {
    fn identity(&self) -> Option<ItemIdentity> {
        self.defaults.map(|_| self.identity.clone())
    }

    fn nutrition(&self) -> Result<FoodDefaults, HostError> {
        self.defaults.ok_or_else(|| HostError::MissingField {
            item: self.identity.clone(),
            field: "food",
        })
    }

    fn embedded_effects(&self) -> Vec<EmbeddedEffect> {
        self.embedded.clone()
    }

    fn add_enchantment(&mut self, enchantment: EnchantHandle, level: i32) -> Result<(), HostError> {
        // Same enchantment twice is incompatible.
        if self.enchantments.iter().any(|(existing, _)| *existing == enchantment) {
            return Err(HostError::Rejected {
                item: self.identity.clone(),
                reason: format!("enchantment {} already applied", enchantment.0),
            });
        }
        self.enchantments.push((enchantment, level));
        Ok(())
    }
}

/// Active status effect on a sandbox consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect: EffectHandle,
    pub duration: i32,
    pub amplifier: i32,
}

/// Player with a clamped food bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConsumer {
    pub food_level: i32,
    pub saturation: f32,
    pub max_food_level: i32,
    #[serde(default)]
    pub effects: Vec<ActiveEffect>,
}

impl SandboxConsumer {
    pub const MAX_FOOD_LEVEL: i32 = 20;

    #[must_use]
    pub fn with_food_level(food_level: i32) -> Self {
        Self {
            food_level: food_level.clamp(0, Self::MAX_FOOD_LEVEL),
            saturation: 0.0,
            max_food_level: Self::MAX_FOOD_LEVEL,
            effects: Vec::new(),
        }
    }

    /// Whether `effect` is currently active.
    #[must_use]
    pub fn has_effect(&self, effect: EffectHandle) -> bool {
        self.effects.iter().any(|active| active.effect == effect)
    }
}

impl Default for SandboxConsumer {
    fn default() -> Self {
        Self::with_food_level(Self::MAX_FOOD_LEVEL / 2)
    }
}

impl Consumer for SandboxConsumer {
    fn food_level(&self) -> i32 {
        self.food_level
    }

    fn max_food_level(&self) -> i32 {
        self.max_food_level
    }

    fn apply_nutrition(&mut self, hunger: i32, saturation: f32) {
        self.food_level = self
            .food_level
            .saturating_add(hunger)
            .clamp(0, self.max_food_level);
        // Food level is small and non-negative after the clamp.
        #[allow(clippy::cast_precision_loss)]
        let ceiling = self.food_level as f32;
        self.saturation = (self.saturation + saturation).clamp(0.0, ceiling);
    }

    fn add_effect(&mut self, effect: EffectHandle, duration: i32, amplifier: i32) {
        // Re-applying refreshes the entry rather than stacking it.
        self.effects.retain(|active| active.effect != effect);
        self.effects.push(ActiveEffect {
            effect,
            duration,
            amplifier,
        });
    }
}

/// Command sender that records replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SandboxSender {
    pub console: bool,
    pub operator: bool,
    pub messages: Vec<String>,
}

impl SandboxSender {
    #[must_use]
    pub fn console() -> Self {
        Self {
            console: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn player(operator: bool) -> Self {
        Self {
            operator,
            ..Self::default()
        }
    }
}

impl CommandSender for SandboxSender {
    fn is_console(&self) -> bool {
        self.console
    }

    fn is_operator(&self) -> bool {
        self.operator
    }

    fn send_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_roster_has_builtin_effects() {
        let host = SandboxHost::vanilla();
        let flesh = host
            .defaults(&ItemIdentity::new("minecraft:rotten_flesh"))
            .unwrap();
        assert_eq!(flesh.hunger, 4);
        let effect = flesh.default_effect.unwrap();
        assert_eq!(host.effect_name(effect.effect).as_deref(), Some("hunger"));
        assert_eq!(host.food_items().len(), 23);
    }

    #[test]
    fn fixture_without_catalogs_uses_vanilla_catalogs() {
        let host = SandboxHost::from_json(
            r#"{"items": {"mod:berry": {"hunger": 3, "saturation": 0.4}}}"#,
        )
        .unwrap();
        assert_eq!(host.food_items(), vec![ItemIdentity::new("mod:berry")]);
        assert_eq!(host.effect_by_name("poison"), Some(EffectHandle(19)));
        assert_eq!(host.enchantment_count(), 24);
    }

    #[test]
    fn stacks_of_unknown_items_are_not_consumable() {
        let host = SandboxHost::vanilla();
        let stick = host.stack(&ItemIdentity::new("minecraft:stick"));
        assert_eq!(stick.identity(), None);
        assert!(stick.nutrition().is_err());
    }

    #[test]
    fn consumer_food_bar_is_clamped() {
        let mut consumer = SandboxConsumer::with_food_level(18);
        consumer.apply_nutrition(5, 3.0);
        assert_eq!(consumer.food_level, 20);
        consumer.apply_nutrition(-30, -10.0);
        assert_eq!(consumer.food_level, 0);
        consumer.apply_nutrition(i32::MAX, 0.0);
        assert_eq!(consumer.food_level, 20);
        consumer.apply_nutrition(i32::MIN, 0.0);
        assert_eq!(consumer.food_level, 0);
        assert!(consumer.saturation.abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_enchantment_is_rejected() {
        let host = SandboxHost::vanilla();
        let mut apple = host.stack(&ItemIdentity::new("minecraft:apple"));
        assert!(apple.add_enchantment(EnchantHandle(16), 1).is_ok());
        assert!(apple.add_enchantment(EnchantHandle(16), 2).is_err());
        assert_eq!(apple.enchantments, vec![(EnchantHandle(16), 1)]);
    }
}
