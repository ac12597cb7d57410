/*
 * Responsibility
 * - Credential extraction, the authorization check, and its configuration
 * - Session/identity data model shared with the provider and cache layers
 */
pub mod config;
pub mod extract;
pub mod plugin;
pub mod session;

pub use config::{AuthConfig, Messages};
pub use extract::{BearerHeaderExtractor, TokenExtractor};
pub use plugin::{AuthOutcome, BearerAuthPlugin};
pub use session::{AuthorizedIdentity, Session, SessionClient, SessionData, User};
