use std::fmt;

use serde_json::{Map, Value as Json};

/// A JSON object mixing recognized fields with free-form custom fields.
///
/// Recognized fields are read and written through [TypedField] implementations;
/// everything else is reachable through the custom-field methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(pub(crate) Map<String, Json>);

/// A strongly typed, recognized field of a [FieldMap].
pub trait TypedField:
    TryFrom<Json, Error = anyhow::Error> + Into<Json> + Clone + fmt::Debug
{
    const KEY: &'static str;

    /// Whether the value has been emptied out and should be dropped from the
    /// map instead of stored (empty string, empty list, `essential: false`).
    fn is_vacant(&self) -> bool;
}

impl FieldMap {
    /// Get a [TypedField], treating a malformed stored value as absent.
    ///
    /// Note that this method clones the underlying data.
    pub fn get<T: TypedField>(&self) -> Option<T> {
        self.0.get(T::KEY).cloned().and_then(|v| T::try_from(v).ok())
    }

    /// Set a [TypedField], removing the key when the value is vacant.
    ///
    /// This is the single place the field-omission rule is enforced: an
    /// emptied optional field is deleted, never serialized as `""` or `[]`.
    pub fn set<T: TypedField>(&mut self, t: T) {
        if t.is_vacant() {
            self.0.remove(T::KEY);
        } else {
            self.0.insert(T::KEY.to_owned(), t.into());
        }
    }

    /// Remove a [TypedField] unconditionally.
    pub fn unset<T: TypedField>(&mut self) {
        self.0.remove(T::KEY);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Add a custom field with an empty initial value.
    ///
    /// The key must be non-empty after trimming and must not already be
    /// present (recognized keys count as present). Returns `false` and leaves
    /// the map unchanged otherwise.
    pub fn add_custom(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || self.0.contains_key(key) {
            tracing::debug!(key, "rejected custom field");
            return false;
        }
        self.0.insert(key.to_owned(), Json::String(String::new()));
        true
    }

    /// Update a custom field from free-form text.
    ///
    /// Text that parses as JSON is stored structurally; anything else is
    /// stored as a plain string, so one text box can hold either.
    pub fn set_custom(&mut self, key: &str, text: &str) {
        let value =
            serde_json::from_str(text).unwrap_or_else(|_| Json::String(text.to_owned()));
        self.0.insert(key.to_owned(), value);
    }

    pub fn remove_custom(&mut self, key: &str) {
        self.0.remove(key);
    }

    /// Iterate over the fields that are not in `recognized`.
    pub fn custom_entries<'a>(
        &'a self,
        recognized: &'static [&'static str],
    ) -> impl Iterator<Item = (&'a str, &'a Json)> {
        self.0
            .iter()
            .filter(move |(k, _)| !recognized.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Json> {
        &self.0
    }
}

impl From<Map<String, Json>> for FieldMap {
    fn from(value: Map<String, Json>) -> Self {
        Self(value)
    }
}

impl From<FieldMap> for Json {
    fn from(value: FieldMap) -> Self {
        value.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_custom_rejects_duplicates_and_empty_keys() {
        let mut map = FieldMap::default();
        assert!(map.add_custom("foo"));
        assert!(!map.add_custom("foo"));
        assert!(!map.add_custom("  "));
        assert_eq!(map.as_map().get("foo"), Some(&json!("")));
    }

    #[test]
    fn set_custom_stores_json_when_valid() {
        let mut map = FieldMap::default();
        map.set_custom("structured", r#"{"a": [1, 2]}"#);
        map.set_custom("plain", "not json at all");
        assert_eq!(map.as_map().get("structured"), Some(&json!({"a": [1, 2]})));
        assert_eq!(map.as_map().get("plain"), Some(&json!("not json at all")));
    }
}
