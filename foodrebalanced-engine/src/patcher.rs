//! One-shot startup pass that writes overrides into static item definitions.
use serde::Serialize;

use crate::host::{DefaultEffect, EffectCatalog, FoodDefinitions, HostError};
use crate::identity::ItemIdentity;
use crate::record::OverrideRecord;
use crate::resolver::resolve_effect;
use crate::store::OverrideStore;

/// Counts from one patch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub patched: usize,
    /// Catalog items with no override record.
    pub unrecorded: usize,
    pub failed: usize,
}

/// Push every stored override into the matching item definition.
///
/// The host binding supplies both the mutable definitions and the effect
/// catalog used to resolve the built-in effect. A failure on one item is logged
/// and the pass moves on.
pub fn apply_overrides<H>(host: &mut H, store: &OverrideStore) -> PatchReport
where
    H: FoodDefinitions + EffectCatalog + ?Sized,
{
    let mut report = PatchReport::default();
    for item in host.food_items() {
        let Some(record) = store.get(&item) else {
            report.unrecorded += 1;
            continue;
        };
        match patch_item(host, &item, &record, store.namespace()) {
            Ok(()) => report.patched += 1,
            Err(err) => {
                log::error!("Failed to apply food data for {item}: {err}");
                report.failed += 1;
            }
        }
    }
    log::info!(
        "Applied food overrides to {} items ({} failed)",
        report.patched,
        report.failed
    );
    report
}

fn patch_item<H>(
    host: &mut H,
    item: &ItemIdentity,
    record: &OverrideRecord,
    namespace: &str,
) -> Result<(), HostError>
where
    H: FoodDefinitions + EffectCatalog + ?Sized,
{
    // An absent field inherits: the definition keeps its declared value and is
    // never zeroed, matching how consumption treats the same record.
    if record.hunger.is_some() || record.saturation.is_some() {
        let current = host.defaults(item)?;
        host.set_nutrition(
            item,
            record.hunger.unwrap_or(current.hunger),
            record.saturation.unwrap_or(current.saturation),
        )?;
    }

    host.clear_default_effect(item)?;

    // The definition holds a single built-in effect; the rest are rolled per consumption.
    let Some(first) = record.effects.first() else {
        return Ok(());
    };
    let Some(effect) = resolve_effect(&*host, namespace, &first.id) else {
        return Ok(());
    };
    host.set_default_effect(
        item,
        DefaultEffect {
            effect,
            duration: first.duration.unwrap_or(0),
            amplifier: first.amplifier_or_default(),
            chance: first.effective_chance(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::host::{EffectHandle, FoodCatalog, FoodDefaults};
    use crate::store::MemorySource;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Definitions {
        items: BTreeMap<ItemIdentity, FoodDefaults>,
        broken: Option<ItemIdentity>,
    }

    impl FoodCatalog for Definitions {
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

    impl FoodDefinitions for Definitions {
        fn set_nutrition(
            &mut self,
            item: &ItemIdentity,
            hunger: i32,
            saturation: f32,
        ) -> Result<(), HostError> {
            if self.broken.as_ref() == Some(item) {
                return Err(HostError::MissingField {
                    item: item.clone(),
                    field: "healAmount",
                });
            }
            let entry = self
                .items
                .get_mut(item)
                .ok_or_else(|| HostError::UnknownItem(item.clone()))?;
            entry.hunger = hunger;
            entry.saturation = saturation;
            Ok(())
        }

        fn clear_default_effect(&mut self, item: &ItemIdentity) -> Result<(), HostError> {
            let entry = self
                .items
                .get_mut(item)
                .ok_or_else(|| HostError::UnknownItem(item.clone()))?;
            entry.default_effect = None;
            Ok(())
        }

        fn set_default_effect(
            &mut self,
            item: &ItemIdentity,
            effect: DefaultEffect,
        ) -> Result<(), HostError> {
            let entry = self
                .items
                .get_mut(item)
                .ok_or_else(|| HostError::UnknownItem(item.clone()))?;
            entry.default_effect = Some(effect);
            Ok(())
        }
    }

    impl EffectCatalog for Definitions {
        fn effect_by_name(&self, name: &str) -> Option<EffectHandle> {
            match name {
                "poison" => Some(EffectHandle(19)),
                "hunger" => Some(EffectHandle(17)),
                _ => None,
            }
        }

        fn effect_by_id(&self, _id: i32) -> Option<EffectHandle> {
            None
        }

        fn effect_name(&self, _effect: EffectHandle) -> Option<String> {
            None
        }
    }

    fn defaults(hunger: i32, saturation: f32) -> FoodDefaults {
        FoodDefaults {
            hunger,
            saturation,
            default_effect: Some(DefaultEffect {
                effect: EffectHandle(17),
                duration: 600,
                amplifier: 0,
                chance: 0.8,
            }),
        }
    }

    fn store_with(json: &str) -> OverrideStore {
        let store = OverrideStore::new(MemorySource::with_contents(json), &EngineConfig::default());
        let empty = Definitions::default();
        store.load(&empty, &empty);
        store
    }

    #[test]
    fn writes_nutrition_and_first_effect_only() {
        let berry = ItemIdentity::new("mod:berry");
        let mut definitions = Definitions::default();
        definitions.items.insert(berry.clone(), defaults(1, 0.1));
        let store = store_with(
            r#"{"mod:berry": {"hunger": 5, "saturation": 0.8, "effects": [
                {"id": "poison", "duration": 100, "chance": 0.5},
                {"id": "hunger", "duration": 200}
            ]}}"#,
        );

        let report = apply_overrides(&mut definitions, &store);
        assert_eq!(report.patched, 1);

        let patched = definitions.items[&berry];
        assert_eq!(patched.hunger, 5);
        assert!((patched.saturation - 0.8).abs() < f32::EPSILON);
        let effect = patched.default_effect.unwrap();
        assert_eq!(effect.effect, EffectHandle(19));
        assert_eq!(effect.duration, 100);
        assert_eq!(effect.amplifier, 0);
        assert!((effect.chance - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_effect_list_clears_builtin_effect() {
        let berry = ItemIdentity::new("mod:berry");
        let mut definitions = Definitions::default();
        definitions.items.insert(berry.clone(), defaults(3, 0.6));
        let store = store_with(r#"{"mod:berry": {"saturation": 0.0}}"#);

        apply_overrides(&mut definitions, &store);
        let patched = definitions.items[&berry];
        assert_eq!(patched.hunger, 3, "absent hunger keeps the definition value");
        assert!(patched.saturation.abs() < f32::EPSILON, "explicit zero wins");
        assert_eq!(patched.default_effect, None);
    }

    #[test]
    fn unresolved_first_effect_leaves_slot_empty() {
        let berry = ItemIdentity::new("mod:berry");
        let mut definitions = Definitions::default();
        definitions.items.insert(berry.clone(), defaults(3, 0.6));
        let store = store_with(
            r#"{"mod:berry": {"effects": [{"id": "mystery", "duration": 20}]}}"#,
        );

        apply_overrides(&mut definitions, &store);
        assert_eq!(definitions.items[&berry].default_effect, None);
    }

    #[test]
    fn failing_item_does_not_stop_the_pass() {
        let apple = ItemIdentity::new("minecraft:apple");
        let bread = ItemIdentity::new("minecraft:bread");
        let mut definitions = Definitions::default();
        definitions.items.insert(apple.clone(), defaults(4, 0.3));
        definitions.items.insert(bread.clone(), defaults(5, 0.6));
        definitions.broken = Some(apple.clone());
        let store = store_with(
            r#"{"minecraft:apple": {"hunger": 1}, "minecraft:bread": {"hunger": 9}}"#,
        );
        let loose = ItemIdentity::new("mod:unlisted");
        definitions.items.insert(loose, defaults(1, 0.1));

        let report = apply_overrides(&mut definitions, &store);
        assert_eq!(
            report,
            PatchReport {
                patched: 1,
                unrecorded: 1,
                failed: 1
            }
        );
        assert_eq!(definitions.items[&bread].hunger, 9);
        assert_eq!(definitions.items[&apple].hunger, 4);
    }
}
