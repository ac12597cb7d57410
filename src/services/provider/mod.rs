/*
 * Responsibility
 * - Boundary to the external identity provider: one capability,
 *   `get_session(token) -> SessionData | failure`
 * - Every ProviderError is classified at the authorization boundary;
 *   nothing here maps to HTTP statuses directly
 */
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::session::SessionData;

pub use http::HttpIdentityProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider returned an unreadable session payload: {0}")]
    InvalidPayload(String),

    /// The provider reported the session as expired (distinct from a plain
    /// rejection so the caller can surface the expired-token message).
    #[error("session expired")]
    SessionExpired,

    #[error("provider rejected the credential: {0}")]
    Rejected(String),
}

/// The identity-provider client, reduced to the single call this plugin
/// makes. One invocation per authorization attempt, no retries.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self, token: &str) -> Result<SessionData, ProviderError>;

    /// Whether this provider is expected to populate `user.role`.
    /// Only consulted by the startup diagnostic when an allow-list is set.
    fn exposes_roles(&self) -> bool {
        false
    }
}
