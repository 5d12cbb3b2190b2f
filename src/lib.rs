//! Editors for structured OAuth/OIDC request parameters carried inside a URL
//! query string: the `authorization_details` array ([RFC 9396] Rich
//! Authorization Requests, OID4VCI shape) and the OpenID Connect [`claims`]
//! request parameter.
//!
//! [RFC 9396]: <https://www.rfc-editor.org/rfc/rfc9396.html>
//! [`claims`]: <https://openid.net/specs/openid-connect-core-1_0.html#ClaimsParameter>
//!
//! The crate never owns the query string. A hosting form owns it; this crate
//! decodes a typed view of one parameter, applies edits to a copy, re-encodes
//! against the latest known query string, and hands the result back through a
//! [`QuerySink`] callback. Malformed parameter values never fail hard: they
//! decode to an empty default plus an inline [`DecodeWarning`].
//!
//! [`QuerySink`]: crate::core::reconciler::QuerySink
//! [`DecodeWarning`]: crate::core::codec::DecodeWarning
//!
//! # Usage
//!
//! ```
//! use oidc_query_editor::core::claims::Section;
//! use oidc_query_editor::editor::ClaimsEditor;
//!
//! // The hosting form owns the canonical query string.
//! let mut editor = ClaimsEditor::new("client_id=xyz");
//! let mut query = String::new();
//! {
//!     let mut sink = |_param: &str, next: &str| query = next.to_owned();
//!     editor.add_claim(Section::Userinfo, "email", &mut sink);
//!     editor.set_essential(Section::Userinfo, "email", true, &mut sink);
//! }
//! assert_eq!(
//!     query,
//!     "client_id=xyz&claims=%7B%22userinfo%22%3A%7B%22email%22%3A%7B%22essential%22%3Atrue%7D%7D%7D"
//! );
//!
//! // Removing the last claim removes the parameter entirely.
//! {
//!     let mut sink = |_param: &str, next: &str| query = next.to_owned();
//!     editor.remove_claim(Section::Userinfo, "email", &mut sink);
//! }
//! assert_eq!(query, "client_id=xyz");
//! ```
//!
//! The same pattern applies to [`AuthorizationDetailsEditor`] for the
//! `authorization_details` parameter.
//!
//! [`AuthorizationDetailsEditor`]: crate::editor::AuthorizationDetailsEditor
//!
//! # Decoding legacy values
//!
//! Some producers percent-encode the JSON before handing it to their query
//! serializer, so values arrive encoded once or twice more than expected.
//! [`core::codec::decode`] tries the raw value first and then up to two
//! percent-decode passes, using the first candidate that parses as JSON of
//! the expected shape.

pub mod core;
pub mod editor;
pub mod utils;
