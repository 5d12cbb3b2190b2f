use anyhow::{bail, Result};
use serde_json::Value as Json;

use self::parameters::{
    CredentialConfigurationId, CredentialFormat, CredentialTypes, DetailType, Locations,
    RECOGNIZED,
};
use super::codec::ParamValue;
use super::object::FieldMap;

pub mod parameters;

/// One entry of the `authorization_details` array (OAuth Rich Authorization
/// Requests shape): a `type`, a handful of recognized optional fields, and
/// arbitrary custom fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationDetailEntry(FieldMap);

impl AuthorizationDetailEntry {
    /// A fresh entry: `{"type": "openid_credential"}`, no optional fields.
    pub fn new() -> Self {
        let mut fields = FieldMap::default();
        fields.set(DetailType::default());
        Self(fields)
    }

    pub fn detail_type(&self) -> Option<String> {
        self.0.get::<DetailType>().map(|t| t.0)
    }

    /// Trimmed non-empty text sets the `type` field, empty text deletes it.
    pub fn set_detail_type(&mut self, text: &str) {
        self.0.set(DetailType(text.trim().to_owned()));
    }

    pub fn credential_configuration_id(&self) -> Option<String> {
        self.0.get::<CredentialConfigurationId>().map(|id| id.0)
    }

    pub fn set_credential_configuration_id(&mut self, text: &str) {
        self.0.set(CredentialConfigurationId(text.trim().to_owned()));
    }

    pub fn format(&self) -> Option<String> {
        self.0.get::<CredentialFormat>().map(|f| f.0)
    }

    pub fn set_format(&mut self, text: &str) {
        self.0.set(CredentialFormat(text.trim().to_owned()));
    }

    pub fn types(&self) -> Option<Vec<String>> {
        self.0.get::<CredentialTypes>().map(|t| t.0)
    }

    /// An empty list deletes the `types` field.
    pub fn set_types(&mut self, types: Vec<String>) {
        self.0.set(CredentialTypes(types));
    }

    pub fn locations(&self) -> Option<Vec<String>> {
        self.0.get::<Locations>().map(|l| l.0)
    }

    pub fn set_locations(&mut self, locations: Vec<String>) {
        self.0.set(Locations(locations));
    }

    pub fn add_custom_field(&mut self, key: &str) -> bool {
        self.0.add_custom(key)
    }

    pub fn set_custom_field(&mut self, key: &str, text: &str) {
        self.0.set_custom(key, text);
    }

    pub fn remove_custom_field(&mut self, key: &str) {
        self.0.remove_custom(key);
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.0.custom_entries(RECOGNIZED)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }
}

/// The ordered `authorization_details` array. Order is user-visible add
/// order and is preserved across edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationDetails(pub Vec<AuthorizationDetailEntry>);

impl AuthorizationDetails {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[AuthorizationDetailEntry] {
        &self.0
    }
}

impl ParamValue for AuthorizationDetails {
    const PARAM: &'static str = "authorization_details";

    fn from_json(json: Json) -> Result<Self> {
        let Json::Array(items) = json else {
            bail!("expected a JSON array")
        };
        // Array elements that are not plain objects are dropped, not fatal.
        Ok(Self(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Json::Object(map) => Some(AuthorizationDetailEntry(map.into())),
                    _ => None,
                })
                .collect(),
        ))
    }

    fn to_json(&self) -> Option<Json> {
        if self.0.is_empty() {
            return None;
        }
        Some(Json::Array(
            self.0.iter().map(|entry| entry.0.clone().into()).collect(),
        ))
    }

    fn empty() -> Self {
        Self::default()
    }
}
