/*
 * Responsibility
 * - Data model for session lookup results and the authorized identity
 * - Serde shapes double as the cache entry format, so unknown provider
 *   fields must survive a round-trip (flattened `extra` maps)
 */
use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::services::provider::IdentityProvider;

/// Role assumed when the provider attaches none to the user record.
pub const DEFAULT_ROLE: &str = "user";

/// What the provider returns for a credential. Presence of `session` is the
/// validity marker; `user` may be missing entirely and defaults to an empty
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Provider-specific fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// The role used for allow-list checks, defaulting to `"user"`.
    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }
}

/// Provider-client handle bound to one credential. Downstream resolvers can
/// keep calling the provider for the same token through this handle.
#[derive(Clone)]
pub struct SessionClient {
    provider: Arc<dyn IdentityProvider>,
    token: String,
}

impl SessionClient {
    pub fn new(provider: Arc<dyn IdentityProvider>, token: impl Into<String>) -> Self {
        Self {
            provider,
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the credential itself.
        f.debug_struct("SessionClient")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// The result of a successful authorization check. Immutable after
/// construction; lives in the request extensions and dies with the request.
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub client: SessionClient,
    pub session: Session,
    pub user: User,
}

impl AuthorizedIdentity {
    /// The value merged into the shared context under the configured field.
    pub fn to_context_value(&self) -> Value {
        serde_json::json!({
            "session": self.session,
            "user": self.user,
        })
    }
}
