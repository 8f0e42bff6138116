//! Name lookup for effects and enchantments.
use crate::host::{EffectCatalog, EffectHandle, EnchantHandle, EnchantmentCatalog};

/// Legacy prefix some hosts put in front of effect names.
const POTION_PREFIX: &str = "potion.";

/// Lower-case `name` and strip the namespace and legacy potion prefixes.
#[must_use]
pub fn normalize_name(name: &str, namespace: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let without_namespace = strip_namespace(&lowered, &namespace.to_lowercase()).to_string();
    without_namespace
        .strip_prefix(POTION_PREFIX)
        .unwrap_or(&without_namespace)
        .to_string()
}

fn strip_namespace<'a>(name: &'a str, namespace: &str) -> &'a str {
    name.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix(':'))
        .or_else(|| name.strip_prefix("minecraft:"))
        .unwrap_or(name)
}

/// Canonical effect name for a normalized alias.
#[must_use]
pub fn canonical_effect_name(normalized: &str) -> Option<&'static str> {
    let canonical = match normalized {
        "regeneration" => "regeneration",
        "absorption" => "absorption",
        "hunger" => "hunger",
        "strength" | "damage_boost" | "damageboost" => "strength",
        "instant_health" | "heal" => "instant_health",
        "instant_damage" | "harm" => "instant_damage",
        "fire_resistance" | "fireresistance" => "fire_resistance",
        "resistance" => "resistance",
        "speed" | "move_speed" | "movespeed" => "speed",
        "slowness" | "move_slowdown" | "moveslowdown" => "slowness",
        "poison" => "poison",
        "wither" => "wither",
        "night_vision" | "nightvision" => "night_vision",
        "invisibility" => "invisibility",
        "water_breathing" | "waterbreathing" => "water_breathing",
        "jump_boost" | "jump" => "jump_boost",
        "haste" | "dig_speed" | "digspeed" => "haste",
        "mining_fatigue" | "dig_slowdown" | "digslowdown" => "mining_fatigue",
        "nausea" | "confusion" => "nausea",
        "blindness" => "blindness",
        "weakness" => "weakness",
        "health_boost" | "healthboost" => "health_boost",
        "saturation" => "saturation",
        _ => return None,
    };
    Some(canonical)
}

/// Resolve an effect id such as `minecraft:Regeneration` or `potion.poison`.
///
/// Tries the canonical alias table first, then an exact catalog-name lookup.
pub fn resolve_effect<C>(catalog: &C, namespace: &str, name: &str) -> Option<EffectHandle>
where
    C: EffectCatalog + ?Sized,
{
    let normalized = normalize_name(name, namespace);
    if normalized.is_empty() {
        log::warn!("Empty effect id in food overrides");
        return None;
    }

    let found = canonical_effect_name(&normalized)
        .and_then(|canonical| catalog.effect_by_name(canonical))
        .or_else(|| catalog.effect_by_name(raw_tail(name)))
        .or_else(|| catalog.effect_by_name(&normalized));

    if found.is_none() {
        log::warn!("Unknown effect `{name}` in food overrides");
    }
    found
}

/// Name with namespace and potion prefix removed, original case kept.
fn raw_tail(name: &str) -> &str {
    let trimmed = name.trim();
    let tail = trimmed.rsplit_once(':').map_or(trimmed, |(_, tail)| tail);
    tail.strip_prefix(POTION_PREFIX).unwrap_or(tail)
}

/// Resolve an enchantment by catalog index (`"34"`) or name fragment (`"unbreaking"`).
pub fn resolve_enchantment<C>(catalog: &C, namespace: &str, name: &str) -> Option<EnchantHandle>
where
    C: EnchantmentCatalog + ?Sized,
{
    let lowered = name.trim().to_lowercase();
    let needle = strip_namespace(&lowered, &namespace.to_lowercase());
    if needle.is_empty() {
        log::warn!("Empty enchantment id in food overrides");
        return None;
    }

    if let Ok(index) = needle.parse::<i64>() {
        let found = usize::try_from(index)
            .ok()
            .filter(|&index| index < catalog.enchantment_count())
            .and_then(|index| catalog.enchantment_at(index));
        if found.is_none() {
            log::warn!("Enchantment index {index} is outside the catalog");
        }
        return found;
    }

    let found = (0..catalog.enchantment_count())
        .filter_map(|index| catalog.enchantment_at(index))
        .find(|&handle| {
            catalog
                .enchantment_names(handle)
                .iter()
                .any(|candidate| candidate.to_lowercase().contains(needle))
        });
    if found.is_none() {
        log::warn!("Unknown enchantment `{name}` in food overrides");
    }
    found
}
