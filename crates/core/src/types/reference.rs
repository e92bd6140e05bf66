//! References to other records that may arrive populated or bare.
//!
//! Depending on the endpoint, the backend sends `"providerId": "665f…"` or
//! `"providerId": { "_id": "665f…", "name": "Tasty Bites" }`. Both shapes
//! deserialize into [`Reference`].

use serde::{Deserialize, Serialize};

/// Fallback display name when a reference carries nothing usable.
pub const UNKNOWN_PROVIDER: &str = "Unknown Provider";

/// A bare id or a populated sub-document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Only the id was sent.
    Id(String),
    /// The referenced document was populated.
    Populated {
        /// Document id.
        #[serde(rename = "_id", alias = "id", default)]
        id: String,
        /// Display name, when present.
        #[serde(default)]
        name: Option<String>,
        /// Contact email, when present.
        #[serde(default)]
        email: Option<String>,
    },
}

/// Reference to the provider (kitchen) behind a meal or order.
pub type ProviderRef = Reference;

/// Reference to a meal inside an order line.
pub type MealRef = Reference;

impl Reference {
    /// The referenced id (may be empty for malformed populated documents).
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Populated { id, .. } => id,
        }
    }

    /// The populated name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated { name, .. } => name.as_deref().filter(|n| !n.is_empty()),
        }
    }

    /// Name used in filters and listings: populated name, else the bare id,
    /// else [`UNKNOWN_PROVIDER`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Id(id) if !id.is_empty() => id,
            Self::Populated { .. } => self.name().unwrap_or(UNKNOWN_PROVIDER),
            Self::Id(_) => UNKNOWN_PROVIDER,
        }
    }
}
