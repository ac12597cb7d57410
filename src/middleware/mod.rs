pub mod auth;
pub mod http;

pub use auth::{AuthIdentity, RecordedOutcome, apply};
