//! Stable keys for item kinds.
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the namespaced identifier and the variant in textual keys.
pub const VARIANT_SEPARATOR: char = '@';

/// Identity of one consumable item kind.
///
/// Textual form is `"<namespace>:<name>"`, or `"<namespace>:<name>@<variant>"`
/// when the host distinguishes sub-kinds of the same identifier. An untracked
/// variant is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIdentity {
    id: String,
    variant: Option<i32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityParseError {
    #[error("item identity is empty")]
    Empty,
    #[error("item identity `{0}` has no name after the namespace")]
    MissingName(String),
}

impl ItemIdentity {
    /// Identity without a tracked variant.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            variant: None,
        }
    }

    #[must_use]
    pub fn with_variant(id: impl Into<String>, variant: i32) -> Self {
        Self {
            variant: Some(variant),
            ..Self::new(id)
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn variant(&self) -> Option<i32> {
        self.variant
    }

    /// Namespace part of the identifier, if one is present.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.id.split_once(':').map(|(ns, _)| ns)
    }

    /// Drop the variant unless the engine tracks variants.
    #[must_use]
    pub fn normalized(self, track_variants: bool) -> Self {
        if track_variants {
            self
        } else {
            Self {
                id: self.id,
                variant: None,
            }
        }
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(variant) => write!(f, "{}{VARIANT_SEPARATOR}{variant}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

impl FromStr for ItemIdentity {
    type Err = IdentityParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityParseError::Empty);
        }

        // A suffix only counts as a variant when it is an integer.
        let (id, variant) = match trimmed.rsplit_once(VARIANT_SEPARATOR) {
            Some((head, tail)) => match tail.parse::<i32>() {
                Ok(variant) => (head, Some(variant)),
                Err(_) => (trimmed, None),
            },
            None => (trimmed, None),
        };

        if id.is_empty() || id.ends_with(':') {
            return Err(IdentityParseError::MissingName(trimmed.to_string()));
        }

        Ok(Self {
            id: id.to_string(),
            variant,
        })
    }
}

impl Serialize for ItemIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
