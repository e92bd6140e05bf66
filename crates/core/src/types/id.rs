//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies every record with an opaque document id string.
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing a meal id where an order id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `is_empty()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use feedme_core::define_id;
/// define_id!(KitchenId);
/// define_id!(DriverId);
///
/// let kitchen = KitchenId::new("665f1c2e9b1d");
/// let driver = DriverId::new("665f1c2e9b1d");
///
/// // These are different types, so this won't compile:
/// // let _: KitchenId = driver;
/// assert_eq!(kitchen.as_str(), driver.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is empty (missing in the backend payload).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(OrderId);
define_id!(MealId);
define_id!(UserId);
define_id!(ProviderId);
define_id!(BlogId);
define_id!(ReviewId);
define_id!(SubscriberId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = OrderId::new("6650aa01");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"6650aa01\"");

        let parsed: OrderId = serde_json::from_str("\"6650aa01\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_blank_id_is_empty() {
        assert!(UserId::new("   ").is_empty());
        assert!(UserId::default().is_empty());
        assert!(!UserId::new("u1").is_empty());
    }

    #[test]
    fn test_display_matches_inner() {
        let id = MealId::from("meal-9");
        assert_eq!(id.to_string(), "meal-9");
        assert_eq!(String::from(id), "meal-9");
    }
}
