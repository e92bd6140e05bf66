//! Adapter for the backend's response envelope.
//!
//! Most endpoints answer `{ success, statusCode, message, data }` (some use
//! `status` instead of `success`); a few return the payload bare. The
//! adapter accepts either and hands typed payloads to the rest of the
//! client.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{ApiError, json_message};

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope(Value);

impl Envelope {
    #[must_use]
    pub const fn new(body: Value) -> Self {
        Self(body)
    }

    /// The raw body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_body(self) -> Value {
        self.0
    }

    /// The envelope's `message`, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        json_message(&self.0)
    }

    /// The success flag (`success` or boolean `status`), if present.
    #[must_use]
    pub fn success_flag(&self) -> Option<bool> {
        self.0
            .get("success")
            .and_then(Value::as_bool)
            .or_else(|| self.0.get("status").and_then(Value::as_bool))
    }

    /// Fail when the envelope explicitly reports failure.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unsuccessful` for `success: false` or `status: false`.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.success_flag() == Some(false) {
            return Err(ApiError::Unsuccessful(self.failure_message()));
        }
        Ok(())
    }

    /// Fail unless the envelope explicitly reports success.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unsuccessful` unless `success` (or `status`) is `true`.
    pub fn require_success(&self) -> Result<(), ApiError> {
        if self.success_flag() == Some(true) {
            Ok(())
        } else {
            Err(ApiError::Unsuccessful(self.failure_message()))
        }
    }

    fn failure_message(&self) -> String {
        self.message()
            .unwrap_or_else(|| "backend reported failure".to_string())
    }

    /// The `data` payload, or the whole body when there is none.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unsuccessful` for failed envelopes and
    /// `ApiError::Parse` when the payload does not match `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        self.check()?;
        let payload = match self.0 {
            Value::Object(mut map) => match map.remove("data") {
                Some(data) if !data.is_null() => data,
                _ => Value::Object(map),
            },
            other => other,
        };
        Ok(serde_json::from_value(payload)?)
    }

    /// A list payload: a bare array, `data` as an array, or the single array
    /// field inside `data`. Entries that do not match `T` are skipped.
    ///
    /// Bodies without any list yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unsuccessful` for failed envelopes.
    pub fn into_list<T: DeserializeOwned>(self) -> Result<Vec<T>, ApiError> {
        self.check()?;
        let Some(items) = find_list(self.0) else {
            warn!("Response contained no list; treating as empty");
            return Ok(Vec::new());
        };
        let total = items.len();
        let parsed: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if parsed.len() < total {
            warn!(
                skipped = total - parsed.len(),
                total, "Skipped malformed list entries"
            );
        }
        Ok(parsed)
    }
}

fn find_list(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("data")? {
            Value::Array(items) => Some(items),
            Value::Object(data) => {
                let mut arrays = data.into_iter().filter_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                });
                let first = arrays.next()?;
                arrays.next().is_none().then_some(first)
            }
            _ => None,
        },
        _ => None,
    }
}
