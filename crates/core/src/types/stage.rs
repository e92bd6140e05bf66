//! Order stages and user roles.

use serde::{Deserialize, Deserializer, Serialize};

/// Delivery stage of an order.
///
/// Stages progress `placed → approved → processed → delivered`, but the
/// platform does not enforce direction: a provider may set any stage from
/// any other. [`OrderStage::is_forward_from`] lets callers detect backward
/// moves without rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStage {
    /// Order was placed at checkout.
    Placed,
    /// Provider accepted the order.
    Approved,
    /// Meal is being prepared.
    Processed,
    /// Order reached the customer. Terminal.
    Delivered,
}

impl OrderStage {
    /// All stages in progression order.
    pub const ALL: [Self; 4] = [Self::Placed, Self::Approved, Self::Processed, Self::Delivered];

    /// Wire name (lowercase), as sent in tracking update bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Approved => "approved",
            Self::Processed => "processed",
            Self::Delivered => "delivered",
        }
    }

    /// Capitalised label for notifications.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Approved => "Approved",
            Self::Processed => "Processed",
            Self::Delivered => "Delivered",
        }
    }

    /// Position in the progression, starting at 0.
    #[must_use]
    pub const fn ordinal(&self) -> u8 {
        match self {
            Self::Placed => 0,
            Self::Approved => 1,
            Self::Processed => 2,
            Self::Delivered => 3,
        }
    }

    /// Whether no further stage follows.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether moving from `previous` to `self` keeps or advances progress.
    #[must_use]
    pub const fn is_forward_from(&self, previous: Self) -> bool {
        self.ordinal() >= previous.ordinal()
    }
}

impl std::fmt::Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placed" => Ok(Self::Placed),
            "approved" => Ok(Self::Approved),
            "processed" => Ok(Self::Processed),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order stage: {s}")),
        }
    }
}

// The backend is not consistent about casing ("Delivered" vs "delivered").
impl<'de> Deserialize<'de> for OrderStage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator.
    Admin,
    /// Meal provider (kitchen).
    Provider,
    /// Ordering customer. Older accounts carry the role `user`.
    #[default]
    #[serde(alias = "user")]
    Customer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Provider => write!(f, "provider"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "provider" => Ok(Self::Provider),
            "customer" | "user" => Ok(Self::Customer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Sort direction for date-ordered lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}
