//! Service-binding document model and type-safe credential lookup.
//!
//! Pure functions only; no I/O. The document is the platform's
//! `VCAP_SERVICES` JSON: a map from service group to a list of bindings.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::error::{BindingParseError, FieldTypeError};

/// Credentials of a single binding, keyed by field name.
pub type Credentials = Map<String, Value>;

/// A named service instance bound to the application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceBinding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credentials: Credentials,
}

/// All bindings visible to the build, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceBindingSet {
    groups: Vec<(String, Vec<ServiceBinding>)>,
}

impl ServiceBindingSet {
    /// Parse a raw binding document.
    ///
    /// # Errors
    ///
    /// Returns `BindingParseError` when the input is not a JSON object of
    /// binding lists.
    pub fn parse(raw: &str) -> Result<Self, BindingParseError> {
        let document: Map<String, Value> = serde_json::from_str(raw)?;
        let mut groups = Vec::with_capacity(document.len());
        for (group, bindings) in document {
            let bindings: Vec<ServiceBinding> = if bindings.is_null() {
                Vec::new()
            } else {
                serde_json::from_value(bindings)?
            };
            groups.push((group, bindings));
        }
        Ok(Self { groups })
    }

    /// Iterate every binding across all groups, in document order.
    pub fn bindings(&self) -> impl Iterator<Item = &ServiceBinding> {
        self.groups.iter().flat_map(|(_, bindings)| bindings.iter())
    }

    /// First binding whose name contains `needle`, ignoring ASCII case.
    #[must_use]
    pub fn find(&self, needle: &str) -> Option<&ServiceBinding> {
        let needle = needle.to_lowercase();
        self.bindings()
            .find(|b| b.name.to_lowercase().contains(&needle))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Typed field lookup ────────────────────────────────────────────────────────

/// A credential value shape that can be decoded from JSON without panicking.
pub trait CredentialField: Sized {
    /// Human-readable type name used in `FieldTypeError`.
    const EXPECTED: &'static str;

    /// Decode `value`, or `None` when it has another shape.
    fn decode(value: &Value) -> Option<Self>;
}

impl CredentialField for String {
    const EXPECTED: &'static str = "a string";

    fn decode(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl CredentialField for bool {
    const EXPECTED: &'static str = "a boolean";

    fn decode(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// A flat object of string values, e.g. the `cli` and `env` sections.
impl CredentialField for BTreeMap<String, String> {
    const EXPECTED: &'static str = "an object of strings";

    fn decode(value: &Value) -> Option<Self> {
        value
            .as_object()?
            .iter()
            .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    }
}

/// Look up `key` in `credentials` as a `T`.
///
/// A missing or `null` key is `Ok(None)`.
///
/// # Errors
///
/// Returns `FieldTypeError` when the key holds a value of another type.
pub fn field<T: CredentialField>(
    credentials: &Credentials,
    key: &str,
) -> Result<Option<T>, FieldTypeError> {
    match credentials.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::decode(value).map(Some).ok_or_else(|| FieldTypeError {
            key: key.to_string(),
            expected: T::EXPECTED,
        }),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
