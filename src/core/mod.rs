pub mod authorization_detail;
pub mod claims;
pub mod codec;
pub mod object;
pub mod query;
pub mod reconciler;
