/*
 * Responsibility
 * - Plugin configuration and its defaults
 * - User-facing rejection messages, overridable per deployment
 */
use std::time::Duration;

/// User-facing text for each rejection kind. The machine-readable code on
/// the wire stays fixed; only these messages are overridable.
#[derive(Debug, Clone)]
pub struct Messages {
    pub invalid_token: String,
    pub expired_token: String,
    pub invalid_permissions: String,
    pub auth_required: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_token: "invalid or missing session".into(),
            expired_token: "session has expired".into(),
            invalid_permissions: "insufficient permissions".into(),
            auth_required: "authentication required".into(),
        }
    }
}

/// Plugin configuration. `Default` gives the documented defaults; builders
/// override individual fields.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base endpoint of the identity provider (informational here; the
    /// `HttpIdentityProvider` is constructed from it).
    pub base_url: String,
    /// Namespace for cache keys: entries are stored as `<prefix>:<token>`.
    pub cache_prefix: String,
    /// TTL for cached session data.
    pub cache_expiration: Duration,
    /// Role allow-list. Empty disables the role check entirely.
    pub allowed_roles: Vec<String>,
    /// Reject requests that present no credential at all.
    pub require_auth: bool,
    /// Field name the identity is merged under in the shared context.
    pub extend_context_field: String,
    pub messages: Messages,
    /// Silences the startup warning emitted when `allowed_roles` is set but
    /// the provider does not expose role claims.
    pub suppress_role_warning: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            cache_prefix: "tokens".into(),
            cache_expiration: Duration::from_secs(5),
            allowed_roles: Vec::new(),
            require_auth: false,
            extend_context_field: "auth".into(),
            messages: Messages::default(),
            suppress_role_warning: false,
        }
    }
}

impl AuthConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_cache_expiration(mut self, ttl: Duration) -> Self {
        self.cache_expiration = ttl;
        self
    }

    #[must_use]
    pub fn with_allowed_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_require_auth(mut self, required: bool) -> Self {
        self.require_auth = required;
        self
    }

    #[must_use]
    pub fn with_extend_context_field(mut self, field: impl Into<String>) -> Self {
        self.extend_context_field = field.into();
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    #[must_use]
    pub fn with_suppress_role_warning(mut self, suppress: bool) -> Self {
        self.suppress_role_warning = suppress;
        self
    }
}
