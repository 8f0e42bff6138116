//! Per-consumption processing: nutrition replacement, effect rolls, enchantments.
use rand::Rng;
use serde::Serialize;

use crate::host::{
    ConsumedItem, Consumer, EffectCatalog, EffectHandle, EnchantHandle, EnchantmentCatalog,
};
use crate::identity::ItemIdentity;
use crate::record::{EffectSpec, EnchantSpec, OverrideRecord};
use crate::resolver::{resolve_effect, resolve_enchantment};
use crate::store::{OverrideStore, default_record};

/// What the nutrition step did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum NutritionChange {
    /// Vanilla contribution replaced by the override; values are the net delta.
    Applied { hunger: i32, saturation: f32 },
    /// Consumer was above the nutrition ceiling.
    SkippedFull,
    /// Item nutrition could not be read.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectGrant {
    pub effect: EffectHandle,
    pub duration: i32,
    pub amplifier: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnchantGrant {
    pub enchantment: EnchantHandle,
    pub level: i32,
}

/// Result of processing one consumption event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionOutcome {
    pub item: ItemIdentity,
    /// The item had no record and one was registered for it.
    pub discovered: bool,
    pub nutrition: NutritionChange,
    pub effects: Vec<EffectGrant>,
    pub enchantments: Vec<EnchantGrant>,
}

/// Applies stored overrides when a consumer finishes eating.
#[derive(Clone, Copy)]
pub struct ConsumptionProcessor<'s> {
    store: &'s OverrideStore,
}

impl<'s> ConsumptionProcessor<'s> {
    #[must_use]
    pub const fn new(store: &'s OverrideStore) -> Self {
        Self { store }
    }

    /// Process one event with the thread-local generator.
    pub fn process<I, P, E, N>(
        &self,
        item: &mut I,
        consumer: &mut P,
        effects: &E,
        enchantments: &N,
    ) -> Option<ConsumptionOutcome>
    where
        I: ConsumedItem + ?Sized,
        P: Consumer + ?Sized,
        E: EffectCatalog + ?Sized,
        N: EnchantmentCatalog + ?Sized,
    {
        self.process_with_rng(item, consumer, effects, enchantments, &mut rand::thread_rng())
    }

    /// Process one event. Returns `None` when the item is not consumable or has
    /// no usable record.
    pub fn process_with_rng<I, P, E, N, R>(
        &self,
        item: &mut I,
        consumer: &mut P,
        effects: &E,
        enchantments: &N,
        rng: &mut R,
    ) -> Option<ConsumptionOutcome>
    where
        I: ConsumedItem + ?Sized,
        P: Consumer + ?Sized,
        E: EffectCatalog + ?Sized,
        N: EnchantmentCatalog + ?Sized,
        R: Rng + ?Sized,
    {
        let identity = item.identity()?.normalized(self.store.track_variants());
        let (record, discovered) = self.ensure_record(&identity, item, effects)?;

        let nutrition = self.apply_nutrition(&identity, item, consumer, &record);
        let granted_effects = self.roll_effects(&record.effects, consumer, effects, rng);
        let granted_enchantments =
            self.grant_enchantments(&identity, &record.enchantments, item, enchantments);

        Some(ConsumptionOutcome {
            item: identity,
            discovered,
            nutrition,
            effects: granted_effects,
            enchantments: granted_enchantments,
        })
    }

    fn ensure_record<I, E>(
        &self,
        identity: &ItemIdentity,
        item: &I,
        effects: &E,
    ) -> Option<(OverrideRecord, bool)>
    where
        I: ConsumedItem + ?Sized,
        E: EffectCatalog + ?Sized,
    {
        if let Some(record) = self.store.get(identity) {
            return Some((record, false));
        }

        let defaults = match item.nutrition() {
            Ok(defaults) => defaults,
            Err(err) => {
                log::error!("Cannot register {identity}: {err}");
                return None;
            }
        };
        let synthesized = default_record(
            &defaults,
            &item.embedded_effects(),
            effects,
            self.store.namespace(),
        );
        Some(self.store.register_if_absent(identity.clone(), synthesized))
    }

    fn apply_nutrition<I, P>(
        &self,
        identity: &ItemIdentity,
        item: &I,
        consumer: &mut P,
        record: &OverrideRecord,
    ) -> NutritionChange
    where
        I: ConsumedItem + ?Sized,
        P: Consumer + ?Sized,
    {
        let vanilla = match item.nutrition() {
            Ok(vanilla) => vanilla,
            Err(err) => {
                log::error!("Skipping nutrition override for {identity}: {err}");
                return NutritionChange::Unavailable;
            }
        };
        if consumer.food_level() > consumer.max_food_level() {
            return NutritionChange::SkippedFull;
        }

        // Net delta: take back the vanilla contribution, add the override.
        let hunger = record
            .hunger
            .unwrap_or(vanilla.hunger)
            .saturating_sub(vanilla.hunger);
        let saturation = record.saturation.unwrap_or(vanilla.saturation) - vanilla.saturation;
        if hunger != 0 || saturation != 0.0 {
            consumer.apply_nutrition(hunger, saturation);
        }
        NutritionChange::Applied { hunger, saturation }
    }

    fn roll_effects<P, E, R>(
        &self,
        specs: &[EffectSpec],
        consumer: &mut P,
        catalog: &E,
        rng: &mut R,
    ) -> Vec<EffectGrant>
    where
        P: Consumer + ?Sized,
        E: EffectCatalog + ?Sized,
        R: Rng + ?Sized,
    {
        let mut granted = Vec::new();
        for spec in specs {
            if spec.id.trim().is_empty() {
                continue;
            }
            if rng.r#gen::<f32>() > spec.effective_chance() {
                continue;
            }
            let Some(effect) = resolve_effect(catalog, self.store.namespace(), &spec.id) else {
                continue;
            };
            let duration = spec.duration.unwrap_or(0);
            if duration <= 0 {
                continue;
            }
            let amplifier = spec.amplifier_or_default();
            consumer.add_effect(effect, duration, amplifier);
            granted.push(EffectGrant {
                effect,
                duration,
                amplifier,
            });
        }
        granted
    }

    fn grant_enchantments<I, N>(
        &self,
        identity: &ItemIdentity,
        specs: &[EnchantSpec],
        item: &mut I,
        catalog: &N,
    ) -> Vec<EnchantGrant>
    where
        I: ConsumedItem + ?Sized,
        N: EnchantmentCatalog + ?Sized,
    {
        let mut granted = Vec::new();
        for spec in specs {
            if spec.id.trim().is_empty() {
                continue;
            }
            let Some(enchantment) = resolve_enchantment(catalog, self.store.namespace(), &spec.id)
            else {
                continue;
            };
            let Some(level) = spec.level else {
                log::debug!("Enchantment `{}` on {identity} has no level", spec.id);
                continue;
            };
            match item.add_enchantment(enchantment, level) {
                Ok(()) => granted.push(EnchantGrant { enchantment, level }),
                Err(err) => log::debug!("Enchantment `{}` not applied: {err}", spec.id),
            }
        }
        granted
    }
}
