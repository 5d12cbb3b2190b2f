use std::borrow::Cow;

use anyhow::{Error, Result};
use percent_encoding::percent_decode_str;
use serde_json::Value as Json;

use super::query::QueryString;

/// Number of extra percent-decode passes attempted on a parameter value that
/// does not parse as-is. Legacy producers are known to encode the JSON up to
/// two extra times.
const MAX_DECODE_PASSES: usize = 2;

/// A typed JSON value carried in a single named query parameter.
pub trait ParamValue: Clone + Sized {
    const PARAM: &'static str;

    /// Parse from JSON, rejecting values of the wrong shape.
    fn from_json(json: Json) -> Result<Self>;

    /// Serialize to JSON, returning `None` when the value is semantically
    /// empty and the parameter should be omitted from the query string.
    fn to_json(&self) -> Option<Json>;

    /// The empty default decoded from an absent or unreadable parameter.
    fn empty() -> Self;
}

/// A recoverable decode failure. The caller gets the empty default alongside
/// this warning; nothing about it blocks further edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not read '{param}' from the query string: {reason}")]
pub struct DecodeWarning {
    pub param: &'static str,
    pub reason: String,
}

impl DecodeWarning {
    pub(crate) fn new(param: &'static str, reason: impl Into<String>) -> Self {
        Self {
            param,
            reason: reason.into(),
        }
    }
}

/// Extract `T` from its query parameter.
///
/// An absent parameter decodes to the empty default without a warning. A
/// present value is tried raw first, then through up to two percent-decode
/// passes; the first candidate parsing as JSON of the expected shape wins.
pub fn decode<T: ParamValue>(query: &QueryString) -> (T, Option<DecodeWarning>) {
    let Some(raw) = query.get(T::PARAM) else {
        return (T::empty(), None);
    };

    let mut candidate = Cow::Borrowed(raw);
    let mut last_error: Option<Error> = None;
    for pass in 0..=MAX_DECODE_PASSES {
        if pass > 0 {
            let decoded = percent_decode_str(&candidate).decode_utf8_lossy().into_owned();
            if decoded == *candidate {
                break;
            }
            candidate = Cow::Owned(decoded);
        }
        match serde_json::from_str::<Json>(&candidate)
            .map_err(Error::from)
            .and_then(T::from_json)
        {
            Ok(value) => return (value, None),
            Err(e) => last_error = Some(e),
        }
    }

    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "value is not valid JSON".to_owned());
    tracing::warn!(param = T::PARAM, %reason, "falling back to empty value");
    (T::empty(), Some(DecodeWarning::new(T::PARAM, reason)))
}

/// Write `value` back into its query parameter, deleting the parameter when
/// the value is semantically empty.
///
/// The JSON text is passed to the urlencoded serializer as-is and therefore
/// encoded exactly once; `decode(encode(q, v)) == v` for canonical values.
pub fn encode<T: ParamValue>(query: &QueryString, value: &T) -> QueryString {
    let mut next = query.clone();
    match value.to_json() {
        Some(json) => next.set(T::PARAM, json.to_string()),
        None => next.remove(T::PARAM),
    }
    next
}
