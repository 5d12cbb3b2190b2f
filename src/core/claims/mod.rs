use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Error, Result};
use serde_json::{Map, Value as Json};

use super::codec::ParamValue;
use super::object::{FieldMap, TypedField};

const USERINFO: &str = "userinfo";
const ID_TOKEN: &str = "id_token";

/// Recognized keys of a claim's constraint object; everything else is a
/// custom field.
pub const RECOGNIZED: &[&str] = &[Essential::KEY, ClaimValue::KEY, ClaimValues::KEY];

/// Top-level section of the `claims` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Userinfo,
    IdToken,
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Section::Userinfo => USERINFO,
            Section::IdToken => ID_TOKEN,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

/// `essential` field of a claim's constraint object. Only the literal `true`
/// is ever stored; `false` is vacant and deletes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Essential(pub bool);

impl TypedField for Essential {
    const KEY: &'static str = "essential";

    fn is_vacant(&self) -> bool {
        !self.0
    }
}

impl TryFrom<Json> for Essential {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<Essential> for Json {
    fn from(value: Essential) -> Self {
        Json::Bool(value.0)
    }
}

/// `value` field of a claim's constraint object: a single requested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimValue(pub String);

impl TypedField for ClaimValue {
    const KEY: &'static str = "value";

    fn is_vacant(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl TryFrom<Json> for ClaimValue {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<ClaimValue> for Json {
    fn from(value: ClaimValue) -> Self {
        Json::String(value.0)
    }
}

/// `values` field of a claim's constraint object: either a single string
/// request or a sequence of strings for multi-value requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValues {
    One(String),
    Many(Vec<String>),
}

impl ClaimValues {
    pub fn len(&self) -> usize {
        match self {
            ClaimValues::One(_) => 1,
            ClaimValues::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            ClaimValues::One(s) => vec![s],
            ClaimValues::Many(v) => v,
        }
    }
}

impl TypedField for ClaimValues {
    const KEY: &'static str = "values";

    fn is_vacant(&self) -> bool {
        match self {
            ClaimValues::One(s) => s.trim().is_empty(),
            ClaimValues::Many(v) => v.is_empty(),
        }
    }
}

impl TryFrom<Json> for ClaimValues {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(Self::One(s)),
            Json::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Json::String(s) => Ok(s),
                    other => bail!("expected a string, found {other}"),
                })
                .collect::<Result<_>>()
                .map(Self::Many),
            other => bail!("expected a string or array of strings, found {other}"),
        }
    }
}

impl From<ClaimValues> for Json {
    fn from(value: ClaimValues) -> Self {
        match value {
            ClaimValues::One(s) => Json::String(s),
            ClaimValues::Many(v) => v.into(),
        }
    }
}

/// Which of the mutually exclusive `value`/`values` keys a claim uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    Value,
    Values,
}

/// How a single claim is requested: explicitly with null constraints, or
/// with a constraint object.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimSpec {
    Null,
    Constraints(FieldMap),
}

impl ClaimSpec {
    /// The default for a newly added claim: an empty constraint object.
    pub fn empty() -> Self {
        Self::Constraints(FieldMap::default())
    }

    fn from_json(value: Json) -> Option<Self> {
        match value {
            Json::Null => Some(Self::Null),
            Json::Object(mut map) => {
                // `value` and `values` are mutually exclusive; a wire
                // document carrying both is normalized in favor of `values`.
                if map.contains_key(ClaimValues::KEY) {
                    map.remove(ClaimValue::KEY);
                }
                Some(Self::Constraints(map.into()))
            }
            // Anything else is not a valid claim request; treated as absent.
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Constraints(fields) => fields.clone().into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn fields(&self) -> Option<&FieldMap> {
        match self {
            Self::Null => None,
            Self::Constraints(fields) => Some(fields),
        }
    }

    fn fields_mut(&mut self) -> Option<&mut FieldMap> {
        match self {
            Self::Null => None,
            Self::Constraints(fields) => Some(fields),
        }
    }

    pub fn essential(&self) -> bool {
        self.fields()
            .and_then(FieldMap::get::<Essential>)
            .map(|e| e.0)
            .unwrap_or(false)
    }

    /// Store `essential: true`, or delete the key. No-op on a null claim.
    pub fn set_essential(&mut self, essential: bool) {
        if let Some(fields) = self.fields_mut() {
            fields.set(Essential(essential));
        }
    }

    /// `Values` when the `values` key is present, `Value` otherwise.
    pub fn mode(&self) -> ValueMode {
        if self
            .fields()
            .is_some_and(|fields| fields.contains_key(ClaimValues::KEY))
        {
            ValueMode::Values
        } else {
            ValueMode::Value
        }
    }

    pub fn requested_values(&self) -> Option<ClaimValues> {
        self.fields().and_then(FieldMap::get::<ClaimValues>)
    }

    fn values_len(&self) -> usize {
        self.requested_values().map(|v| v.len()).unwrap_or(0)
    }

    /// The scalar text currently held by whichever of `value`/`values` is in
    /// use, when it holds at most one entry.
    pub fn scalar_text(&self) -> Option<String> {
        let fields = self.fields()?;
        match self.mode() {
            ValueMode::Value => fields.get::<ClaimValue>().map(|v| v.0),
            ValueMode::Values => match fields.get::<ClaimValues>()? {
                ClaimValues::One(s) => Some(s),
                ClaimValues::Many(v) if v.len() == 1 => v.into_iter().next(),
                ClaimValues::Many(_) => None,
            },
        }
    }

    /// Write scalar text into the current mode's key; empty text deletes it.
    ///
    /// No-op while `values` holds more than one entry (the multi-value list
    /// is edited as a list, never silently collapsed).
    pub fn set_scalar(&mut self, text: &str) {
        if self.values_len() > 1 {
            tracing::debug!("ignoring scalar edit of a multi-value claim");
            return;
        }
        let mode = self.mode();
        let Some(fields) = self.fields_mut() else {
            return;
        };
        match mode {
            ValueMode::Value => {
                fields.unset::<ClaimValues>();
                fields.set(ClaimValue(text.trim().to_owned()));
            }
            ValueMode::Values => {
                fields.unset::<ClaimValue>();
                fields.set(ClaimValues::One(text.trim().to_owned()));
            }
        }
    }

    /// Switch between the `value` and `values` representations, carrying the
    /// current scalar text across. Exactly one of the two keys remains.
    ///
    /// No-op while `values` holds more than one entry: a multi-value claim
    /// cannot be collapsed to single-value.
    pub fn set_mode(&mut self, mode: ValueMode) {
        if self.mode() == mode {
            return;
        }
        if self.values_len() > 1 {
            tracing::debug!("refusing to collapse a multi-value claim");
            return;
        }
        let text = self.scalar_text();
        let Some(fields) = self.fields_mut() else {
            return;
        };
        match mode {
            ValueMode::Value => {
                fields.unset::<ClaimValues>();
                if let Some(text) = text {
                    fields.set(ClaimValue(text));
                }
            }
            ValueMode::Values => {
                fields.unset::<ClaimValue>();
                if let Some(text) = text {
                    fields.set(ClaimValues::One(text));
                }
            }
        }
    }

    /// Replace the requested values list: empty deletes the key, a single
    /// item is stored as the single-string form, more as a sequence.
    pub fn set_values(&mut self, mut items: Vec<String>) {
        let Some(fields) = self.fields_mut() else {
            return;
        };
        fields.unset::<ClaimValue>();
        match items.len() {
            0 => fields.unset::<ClaimValues>(),
            1 => fields.set(ClaimValues::One(items.remove(0))),
            _ => fields.set(ClaimValues::Many(items)),
        }
    }

    pub fn add_custom_field(&mut self, key: &str) -> bool {
        self.fields_mut().is_some_and(|fields| fields.add_custom(key))
    }

    pub fn set_custom_field(&mut self, key: &str, text: &str) {
        if let Some(fields) = self.fields_mut() {
            fields.set_custom(key, text);
        }
    }

    pub fn remove_custom_field(&mut self, key: &str) {
        if let Some(fields) = self.fields_mut() {
            fields.remove_custom(key);
        }
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.fields()
            .into_iter()
            .flat_map(|fields| fields.custom_entries(RECOGNIZED))
    }
}

/// The OpenID Connect `claims` request parameter: a `userinfo` section and an
/// `id_token` section, each mapping claim names to [ClaimSpec]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimsDocument {
    userinfo: BTreeMap<String, ClaimSpec>,
    id_token: BTreeMap<String, ClaimSpec>,
}

impl ClaimsDocument {
    pub fn section(&self, section: Section) -> &BTreeMap<String, ClaimSpec> {
        match section {
            Section::Userinfo => &self.userinfo,
            Section::IdToken => &self.id_token,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, ClaimSpec> {
        match section {
            Section::Userinfo => &mut self.userinfo,
            Section::IdToken => &mut self.id_token,
        }
    }

    pub fn claim(&self, section: Section, name: &str) -> Option<&ClaimSpec> {
        self.section(section).get(name)
    }

    pub fn claim_mut(&mut self, section: Section, name: &str) -> Option<&mut ClaimSpec> {
        self.section_mut(section).get_mut(name)
    }

    pub fn is_empty(&self) -> bool {
        self.userinfo.is_empty() && self.id_token.is_empty()
    }

    fn section_from_json(value: &Json) -> BTreeMap<String, ClaimSpec> {
        let Some(map) = value.as_object() else {
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(name, spec)| {
                ClaimSpec::from_json(spec.clone()).map(|spec| (name.clone(), spec))
            })
            .collect()
    }

    fn section_to_json(section: &BTreeMap<String, ClaimSpec>) -> Json {
        Json::Object(
            section
                .iter()
                .map(|(name, spec)| (name.clone(), spec.to_json()))
                .collect::<Map<String, Json>>(),
        )
    }
}

impl ParamValue for ClaimsDocument {
    const PARAM: &'static str = "claims";

    fn from_json(json: Json) -> Result<Self> {
        let Json::Object(map) = json else {
            bail!("expected a JSON object")
        };
        Ok(Self {
            userinfo: map
                .get(USERINFO)
                .map(Self::section_from_json)
                .unwrap_or_default(),
            id_token: map
                .get(ID_TOKEN)
                .map(Self::section_from_json)
                .unwrap_or_default(),
        })
    }

    /// Empty sections are omitted; a document with both sections empty
    /// serializes to nothing and removes the `claims` parameter.
    fn to_json(&self) -> Option<Json> {
        if self.is_empty() {
            return None;
        }
        let mut map = Map::new();
        if !self.userinfo.is_empty() {
            map.insert(USERINFO.to_owned(), Self::section_to_json(&self.userinfo));
        }
        if !self.id_token.is_empty() {
            map.insert(ID_TOKEN.to_owned(), Self::section_to_json(&self.id_token));
        }
        Some(Json::Object(map))
    }

    fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_and_values_are_mutually_exclusive() {
        let mut spec = ClaimSpec::empty();
        spec.set_scalar("urn:mace:incommon:iap:silver");
        assert_eq!(spec.mode(), ValueMode::Value);

        spec.set_mode(ValueMode::Values);
        let json = spec.to_json();
        assert_eq!(json, json!({"values": "urn:mace:incommon:iap:silver"}));

        spec.set_mode(ValueMode::Value);
        let json = spec.to_json();
        assert_eq!(json, json!({"value": "urn:mace:incommon:iap:silver"}));
    }

    #[test]
    fn multi_value_claims_cannot_be_collapsed() {
        let mut spec = ClaimSpec::empty();
        spec.set_values(vec!["silver".into(), "bronze".into()]);
        assert_eq!(spec.mode(), ValueMode::Values);

        spec.set_mode(ValueMode::Value);
        assert_eq!(spec.mode(), ValueMode::Values);
        assert_eq!(
            spec.requested_values(),
            Some(ClaimValues::Many(vec!["silver".into(), "bronze".into()]))
        );

        spec.set_scalar("gold");
        assert_eq!(
            spec.requested_values(),
            Some(ClaimValues::Many(vec!["silver".into(), "bronze".into()]))
        );
    }

    #[test]
    fn essential_stores_only_true() {
        let mut spec = ClaimSpec::empty();
        spec.set_essential(true);
        assert_eq!(spec.to_json(), json!({"essential": true}));

        spec.set_essential(false);
        assert_eq!(spec.to_json(), json!({}));
    }

    #[test]
    fn single_committed_value_uses_the_string_form() {
        let mut spec = ClaimSpec::empty();
        spec.set_values(vec!["silver".into()]);
        assert_eq!(spec.to_json(), json!({"values": "silver"}));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut doc = ClaimsDocument::empty();
        doc.section_mut(Section::IdToken)
            .insert("sub".into(), ClaimSpec::empty());
        assert_eq!(doc.to_json(), Some(json!({"id_token": {"sub": {}}})));

        doc.section_mut(Section::IdToken).remove("sub");
        assert_eq!(doc.to_json(), None);
    }

    #[test]
    fn decode_normalizes_a_claim_carrying_both_value_keys() {
        let doc = ClaimsDocument::from_json(json!({
            "id_token": {"acr": {"value": "a", "values": "b"}}
        }))
        .unwrap();
        let claim = doc.claim(Section::IdToken, "acr").unwrap();
        assert_eq!(claim.to_json(), json!({"values": "b"}));
        assert_eq!(claim.mode(), ValueMode::Values);
    }

    #[test]
    fn scalar_edit_never_leaves_both_value_keys() {
        let mut spec = ClaimSpec::Constraints(FieldMap::default());
        if let ClaimSpec::Constraints(fields) = &mut spec {
            fields.set(ClaimValue("a".into()));
            fields.set(ClaimValues::One("b".into()));
        }
        spec.set_scalar("c");
        assert_eq!(spec.to_json(), json!({"values": "c"}));
    }

    #[test]
    fn non_claim_values_are_dropped_on_decode() {
        let doc = ClaimsDocument::from_json(json!({
            "userinfo": {
                "email": null,
                "name": {"essential": true},
                "broken": 42
            }
        }))
        .unwrap();
        let section = doc.section(Section::Userinfo);
        assert!(section.get("email").is_some_and(ClaimSpec::is_null));
        assert!(section.get("name").is_some());
        assert!(section.get("broken").is_none());
    }
}
