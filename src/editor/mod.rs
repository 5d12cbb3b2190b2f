pub mod authorization_details;
pub mod claims;

pub use authorization_details::{AuthorizationDetailsEditor, ListField};
pub use claims::ClaimsEditor;
