use anyhow::{bail, Error};
use serde_json::Value as Json;

use crate::core::object::TypedField;

pub const OPENID_CREDENTIAL: &str = "openid_credential";

/// Recognized keys of an authorization detail entry; everything else on an
/// entry is a custom field.
pub const RECOGNIZED: &[&str] = &[
    DetailType::KEY,
    CredentialConfigurationId::KEY,
    CredentialFormat::KEY,
    CredentialTypes::KEY,
    Locations::KEY,
];

fn string_from_json(value: Json) -> Result<String, Error> {
    Ok(serde_json::from_value(value)?)
}

fn string_list_from_json(value: Json) -> Result<Vec<String>, Error> {
    let Json::Array(items) = value else {
        bail!("expected a JSON array of strings")
    };
    items
        .into_iter()
        .map(|v| match v {
            Json::String(s) => Ok(s),
            other => bail!("expected a string, found {other}"),
        })
        .collect()
}

/// `type` field of an authorization detail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailType(pub String);

impl Default for DetailType {
    fn default() -> Self {
        Self(OPENID_CREDENTIAL.to_owned())
    }
}

impl TypedField for DetailType {
    const KEY: &'static str = "type";

    fn is_vacant(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl TryFrom<Json> for DetailType {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        string_from_json(value).map(Self)
    }
}

impl From<DetailType> for Json {
    fn from(value: DetailType) -> Self {
        Json::String(value.0)
    }
}

/// `credential_configuration_id` field of an authorization detail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfigurationId(pub String);

impl TypedField for CredentialConfigurationId {
    const KEY: &'static str = "credential_configuration_id";

    fn is_vacant(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl TryFrom<Json> for CredentialConfigurationId {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        string_from_json(value).map(Self)
    }
}

impl From<CredentialConfigurationId> for Json {
    fn from(value: CredentialConfigurationId) -> Self {
        Json::String(value.0)
    }
}

/// `format` field of an authorization detail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFormat(pub String);

impl TypedField for CredentialFormat {
    const KEY: &'static str = "format";

    fn is_vacant(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl TryFrom<Json> for CredentialFormat {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        string_from_json(value).map(Self)
    }
}

impl From<CredentialFormat> for Json {
    fn from(value: CredentialFormat) -> Self {
        Json::String(value.0)
    }
}

/// `types` field of an authorization detail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialTypes(pub Vec<String>);

impl TypedField for CredentialTypes {
    const KEY: &'static str = "types";

    fn is_vacant(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Json> for CredentialTypes {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        string_list_from_json(value).map(Self)
    }
}

impl From<CredentialTypes> for Json {
    fn from(value: CredentialTypes) -> Self {
        value.0.into()
    }
}

/// `locations` field of an authorization detail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations(pub Vec<String>);

impl TypedField for Locations {
    const KEY: &'static str = "locations";

    fn is_vacant(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Json> for Locations {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        string_list_from_json(value).map(Self)
    }
}

impl From<Locations> for Json {
    fn from(value: Locations) -> Self {
        value.0.into()
    }
}
