//! Override records and the backing file document format.
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::identity::ItemIdentity;

/// In-memory override map, at most one record per identity.
pub type OverrideMap = BTreeMap<ItemIdentity, OverrideRecord>;

/// File entries the engine cannot use, keyed by their original text and
/// written back exactly as read.
pub type RetainedEntries = BTreeMap<String, Value>;

/// Integer field that also accepts a whole-number float such as `9.0`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!(
            "expected a whole number in i32 range, found {value}"
        )));
    }
    Ok(Some(value as i32))
}

/// List field where `null` reads as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Secondary status effect rolled on consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectSpec {
    #[serde(default)]
    pub id: String,
    /// Duration in host time units (ticks).
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<i32>,
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amplifier: Option<i32>,
    /// Probability in `[0, 1]`. Absent or non-positive means certain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<f32>,
}

impl EffectSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, duration: i32, amplifier: i32, chance: Option<f32>) -> Self {
        Self {
            id: id.into(),
            duration: Some(duration),
            amplifier: Some(amplifier),
            chance,
        }
    }

    /// Probability actually used for the roll.
    #[must_use]
    pub fn effective_chance(&self) -> f32 {
        match self.chance {
            Some(chance) if chance > 0.0 => chance.min(1.0),
            _ => 1.0,
        }
    }

    #[must_use]
    pub fn amplifier_or_default(&self) -> i32 {
        self.amplifier.unwrap_or(0)
    }
}

/// Enchantment granted to the consumed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnchantSpec {
    /// Namespaced name, display-name fragment, or numeric catalog index.
    #[serde(default)]
    pub id: String,
    /// Entries without a level are skipped when applied.
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<i32>,
}

impl EnchantSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, level: i32) -> Self {
        Self {
            id: id.into(),
            level: Some(level),
        }
    }
}

/// Configured replacement values for one item kind.
///
/// Absent nutrition fields inherit the host default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverrideRecord {
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub hunger: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub effects: Vec<EffectSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub enchantments: Vec<EnchantSpec>,
    /// Variant of the keyed item, written only when variants are tracked.
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<i32>,
}

impl OverrideRecord {
    /// Record carrying explicit nutrition values and nothing else.
    #[must_use]
    pub fn with_nutrition(hunger: i32, saturation: f32) -> Self {
        Self {
            hunger: Some(hunger),
            saturation: Some(saturation),
            ..Self::default()
        }
    }
}

/// A parsed backing file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideDocument {
    pub records: OverrideMap,
    /// Unreadable, duplicate, or untracked-variant entries.
    pub retained: RetainedEntries,
}

/// Parse a backing file document.
///
/// Entries that cannot be read, that repeat an identity, or that name a variant
/// while variants are not tracked are kept aside in
/// [`OverrideDocument::retained`] rather than dropped.
///
/// # Errors
///
/// Returns an error if the document is not valid JSON or not an object.
pub fn parse_overrides(
    json: &str,
    track_variants: bool,
) -> Result<OverrideDocument, serde_json::Error> {
    let document: Map<String, Value> = serde_json::from_str(json)?;
    let mut parsed = OverrideDocument::default();

    for (key, value) in document {
        let identity = match key.parse::<ItemIdentity>() {
            Ok(identity) => identity,
            Err(err) => {
                log::warn!("Keeping override entry `{key}` as written: {err}");
                parsed.retained.insert(key, value);
                continue;
            }
        };
        let record: OverrideRecord = match OverrideRecord::deserialize(&value) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Keeping override entry `{key}` as written: {err}");
                parsed.retained.insert(key, value);
                continue;
            }
        };

        let identity = match (identity.variant(), record.meta) {
            (None, Some(meta)) => ItemIdentity::with_variant(identity.id(), meta),
            _ => identity,
        };
        if identity.variant().is_some() && !track_variants {
            log::debug!("Variant entry `{key}` is ignored while variants are not tracked");
            parsed.retained.insert(key, value);
            continue;
        }
        if parsed.records.contains_key(&identity) {
            log::warn!("Duplicate override entry `{key}` for {identity}; the first one applies");
            parsed.retained.insert(key, value);
            continue;
        }
        parsed.records.insert(identity, record);
    }

    Ok(parsed)
}

#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Record(OverrideRecord),
    Retained(&'a Value),
}

/// Render the override map as a backing file document.
///
/// Retained entries are written back unchanged and win over a record rendered
/// under the same key.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_overrides(
    records: &OverrideMap,
    retained: &RetainedEntries,
    pretty: bool,
) -> Result<String, serde_json::Error> {
    let mut document: BTreeMap<String, Entry<'_>> = records
        .iter()
        .map(|(identity, record)| {
            let mut record = record.clone();
            record.meta = identity.variant();
            (identity.to_string(), Entry::Record(record))
        })
        .collect();
    document.extend(
        retained
            .iter()
            .map(|(key, value)| (key.clone(), Entry::Retained(value))),
    );

    if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
}
