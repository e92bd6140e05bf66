//! Order domain types and current-stage resolution.
//!
//! An order's *current* stage is the stage of its most recent tracking update
//! by timestamp. Array position means nothing: the backend may return updates
//! in any order. When no updates exist the raw `status` field is used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de::{lenient_datetime, lenient_vec, null_default};
use crate::types::{MealRef, OrderId, OrderStage, Price, ProviderRef};

// =============================================================================
// Tracking
// =============================================================================

/// An appended, timestamped record of a stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingUpdate {
    /// Stage the order moved to.
    pub stage: OrderStage,
    /// Human-readable note shown to the customer.
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
    /// When the update was recorded.
    pub timestamp: DateTime<Utc>,
}

impl TrackingUpdate {
    /// Create a tracking update.
    #[must_use]
    pub fn new(stage: OrderStage, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            stage,
            message: message.into(),
            timestamp,
        }
    }
}

/// The resolved current stage of an order.
///
/// `Status` carries the raw fallback string because legacy orders hold
/// labels such as `"Pending"` that are not tracking stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRef<'a> {
    /// Stage of the latest tracking update.
    Tracked(OrderStage),
    /// No tracking updates; the order's `status` field.
    Status(&'a str),
}

impl StageRef<'_> {
    /// The stage, when the fallback status names a known one.
    #[must_use]
    pub fn stage(&self) -> Option<OrderStage> {
        match self {
            Self::Tracked(stage) => Some(*stage),
            Self::Status(status) => status.parse().ok(),
        }
    }

    /// Display form: the wire name or the raw status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tracked(stage) => stage.as_str(),
            Self::Status(status) => status,
        }
    }
}

impl std::fmt::Display for StageRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line items and payment
// =============================================================================

/// Per-line meal customization chosen at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    /// Requested spice level.
    #[serde(default)]
    pub spice_level: Option<String>,
    /// Ingredients the customer asked to leave out.
    #[serde(default, deserialize_with = "null_default")]
    pub removed_ingredients: Vec<String>,
    /// Paid extras.
    #[serde(default, deserialize_with = "null_default")]
    pub add_ons: Vec<String>,
}

/// One meal in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// The ordered meal.
    #[serde(alias = "mealId")]
    pub meal: MealRef,
    /// Quantity ordered.
    #[serde(default = "one")]
    pub quantity: u32,
    /// Unit price at checkout.
    #[serde(default, deserialize_with = "null_default")]
    pub price: Price,
    /// Customization options.
    #[serde(default, deserialize_with = "null_default")]
    pub customization: Customization,
}

const fn one() -> u32 {
    1
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Payment sub-record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Payment gateway transaction id.
    #[serde(default, alias = "transactionId")]
    pub id: Option<String>,
    /// Payment method (card, cash on delivery, ...).
    #[serde(default)]
    pub method: Option<String>,
    /// Gateway status string.
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A customer order as returned by the orders endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id.
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    /// Customer name.
    #[serde(default, alias = "customer", deserialize_with = "null_default")]
    pub name: String,
    /// Customer email.
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    /// Customer phone.
    #[serde(default, deserialize_with = "null_default")]
    pub phone: String,
    /// Delivery address.
    #[serde(default, deserialize_with = "null_default")]
    pub address: String,
    /// Provider fulfilling the order.
    #[serde(default, alias = "providerId")]
    pub provider: Option<ProviderRef>,
    /// Ordered meals.
    #[serde(default, alias = "meals", deserialize_with = "lenient_vec")]
    pub items: Vec<LineItem>,
    /// Payment details.
    #[serde(default)]
    pub transaction: Option<Transaction>,
    /// Requested delivery date.
    #[serde(default)]
    pub delivery_date: Option<String>,
    /// Requested delivery slot.
    #[serde(default)]
    pub delivery_slot: Option<String>,
    /// Order total.
    #[serde(default, alias = "amount", deserialize_with = "null_default")]
    pub total_price: Price,
    /// Courier tracking number.
    #[serde(default)]
    pub tracking_number: Option<String>,
    /// Raw status; stage name or legacy label.
    #[serde(default = "default_status", deserialize_with = "status_or_default")]
    pub status: String,
    /// Stage history, append-only.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tracking_updates: Vec<TrackingUpdate>,
    /// Checkout time.
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    OrderStage::Placed.as_str().to_owned()
}

fn status_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let status = Option::<String>::deserialize(deserializer)?;
    Ok(status
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_status))
}

impl Order {
    /// Create an order with only an id and status, as checkout would.
    #[must_use]
    pub fn new(id: impl Into<OrderId>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            provider: None,
            items: Vec::new(),
            transaction: None,
            delivery_date: None,
            delivery_slot: None,
            total_price: Price::ZERO,
            tracking_number: None,
            status: status.into(),
            tracking_updates: Vec::new(),
            created_at: None,
        }
    }

    /// The latest tracking update by timestamp.
    ///
    /// Equal timestamps resolve to the earlier entry in the list.
    #[must_use]
    pub fn latest_update(&self) -> Option<&TrackingUpdate> {
        self.tracking_updates
            .iter()
            .rev()
            .max_by_key(|update| update.timestamp)
    }

    /// The order's current stage.
    #[must_use]
    pub fn current_stage(&self) -> StageRef<'_> {
        self.latest_update().map_or_else(
            || StageRef::Status(&self.status),
            |update| StageRef::Tracked(update.stage),
        )
    }

    /// Append a tracking update client-side (optimistic) and mirror it into
    /// `status`.
    pub fn append_tracking_update(
        &mut self,
        stage: OrderStage,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> TrackingUpdate {
        let update = TrackingUpdate::new(stage, message, timestamp);
        self.status = stage.as_str().to_owned();
        self.tracking_updates.push(update.clone());
        update
    }

    /// Sum of line totals. Falls back to `total_price` when no items were sent.
    #[must_use]
    pub fn items_total(&self) -> Price {
        if self.items.is_empty() {
            self.total_price
        } else {
            self.items.iter().map(LineItem::line_total).sum()
        }
    }

    /// Case-insensitive match over id, customer name, email, status and
    /// tracking number. An empty term matches every order.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let contains = |field: &str| field.to_lowercase().contains(&term);
        contains(self.id.as_str())
            || contains(&self.name)
            || contains(&self.email)
            || contains(&self.status)
            || self.tracking_number.as_deref().is_some_and(contains)
    }
}
