use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// An ordered multi-map of query parameters, as found after the `?` of a URL.
///
/// Parameter order is preserved across edits so that rewriting one parameter
/// does not reshuffle the rest of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryString(Vec<(String, String)>);

impl QueryString {
    /// The value of the first occurrence of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set `name` to `value`, keeping the position of an existing occurrence.
    ///
    /// Repeated occurrences beyond the first are dropped.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => {
                slot.1 = value;
                let mut seen = false;
                self.0.retain(|(k, _)| {
                    if k == name {
                        if seen {
                            return false;
                        }
                        seen = true;
                    }
                    true
                });
            }
            None => self.0.push((name.to_owned(), value)),
        }
    }

    /// Remove all occurrences of `name`.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| k != name);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the query component of a [Url]. A URL without a query component
    /// parses as the empty query string.
    pub fn from_url(url: &Url) -> Result<Self> {
        url.query().unwrap_or_default().parse()
    }

    /// Replace the query component of `url` with this query string, removing
    /// it entirely when there are no parameters.
    pub fn apply_to(&self, url: &mut Url) {
        if self.0.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.to_string()));
        }
    }
}

impl FromStr for QueryString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix('?').unwrap_or(s);
        serde_urlencoded::from_str(s)
            .map(Self)
            .context("unable to parse urlencoded query string")
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_urlencoded::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl TryFrom<String> for QueryString {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<QueryString> for String {
    fn from(value: QueryString) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_urlencoded() {
        let query: QueryString = "client_id=xyz&scope=openid%20email".parse().unwrap();
        assert_eq!(query.get("client_id"), Some("xyz"));
        assert_eq!(query.get("scope"), Some("openid email"));
        assert_eq!(query.to_string(), "client_id=xyz&scope=openid+email");
    }

    #[test]
    fn tolerates_leading_question_mark() {
        let query: QueryString = "?a=1&b=2".parse().unwrap();
        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get("b"), Some("2"));
    }

    #[test]
    fn set_keeps_position_and_deduplicates() {
        let mut query: QueryString = "a=1&b=2&a=3&c=4".parse().unwrap();
        query.set("a", "9");
        assert_eq!(query.to_string(), "a=9&b=2&c=4");
    }

    #[test]
    fn set_appends_when_absent() {
        let mut query: QueryString = "a=1".parse().unwrap();
        query.set("b", "2");
        assert_eq!(query.to_string(), "a=1&b=2");
    }

    #[test]
    fn remove_drops_all_occurrences() {
        let mut query: QueryString = "a=1&b=2&a=3".parse().unwrap();
        query.remove("a");
        assert_eq!(query.to_string(), "b=2");
        assert!(query.get("a").is_none());
    }

    #[test]
    fn url_round_trip() {
        let url: Url = "https://rp.example.com/authorize?client_id=xyz"
            .parse()
            .unwrap();
        let mut query = QueryString::from_url(&url).unwrap();
        query.set("state", "abc");

        let mut url = url;
        query.apply_to(&mut url);
        assert_eq!(url.query(), Some("client_id=xyz&state=abc"));

        query.remove("client_id");
        query.remove("state");
        query.apply_to(&mut url);
        assert_eq!(url.query(), None);
    }
}
