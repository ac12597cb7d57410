/*
 * Responsibility
 * - The authorization check itself: session lookup (direct or through the
 *   cache), role enforcement, identity construction
 * - The two host-facing hooks: on_request (pre-parse) and extend_context
 *   (context build), host-agnostic so they can run without axum
 */
use std::sync::Arc;

use axum::http::request::Parts;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{AuthError, UnauthorizedKind};
use crate::services::auth::config::AuthConfig;
use crate::services::auth::extract::{BearerHeaderExtractor, TokenExtractor};
use crate::services::auth::session::{AuthorizedIdentity, SessionClient, SessionData};
use crate::services::cache::{CacheClient, MemoryCache};
use crate::services::provider::{IdentityProvider, ProviderError};

/// Terminal state of the pre-parse hook for one request. Stored in the
/// request extensions (write-once there, point-read by the context-build
/// step), so nothing outlives the request and nothing crosses requests.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authorized(AuthorizedIdentity),
    /// No credential was presented and authentication is not mandatory.
    Anonymous,
}

/// Request-scoped, optionally-cached, role-gated authorization check.
///
/// One algorithm for both the cached and the uncached form: the cache is an
/// optional step, not a separate code path.
pub struct BearerAuthPlugin<C: CacheClient = MemoryCache> {
    config: AuthConfig,
    provider: Arc<dyn IdentityProvider>,
    cache: Option<C>,
    extractor: Arc<dyn TokenExtractor>,
}

impl BearerAuthPlugin<MemoryCache> {
    pub fn new(config: AuthConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        if !config.allowed_roles.is_empty()
            && !provider.exposes_roles()
            && !config.suppress_role_warning
        {
            // Diagnostic only. An allow-list against a provider that never
            // populates `user.role` rejects everyone but "user".
            tracing::warn!(
                roles = ?config.allowed_roles,
                "allowed_roles is set but the provider does not expose role claims; \
                 set suppress_role_warning to silence this"
            );
        }

        Self {
            config,
            provider,
            cache: None,
            extractor: Arc::new(BearerHeaderExtractor),
        }
    }
}

impl<C: CacheClient> BearerAuthPlugin<C> {
    /// Enables session caching on the given backend.
    #[must_use]
    pub fn with_cache<D: CacheClient>(self, cache: D) -> BearerAuthPlugin<D> {
        BearerAuthPlugin {
            config: self.config,
            provider: self.provider,
            cache: Some(cache),
            extractor: self.extractor,
        }
    }

    /// Replaces the default bearer-header extractor (the `getToken` hook).
    #[must_use]
    pub fn with_token_extractor(mut self, extractor: Arc<dyn TokenExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Pre-parse hook: extract a credential and run the check.
    ///
    /// Returns `Anonymous` when no credential is present and authentication
    /// is optional; fails with `AUTH_REQUIRED` when it is mandatory.
    pub async fn on_request(&self, parts: &Parts) -> Result<AuthOutcome, AuthError> {
        match self.extractor.extract(parts).await? {
            Some(token) => Ok(AuthOutcome::Authorized(self.authorize(&token).await?)),
            None if self.config.require_auth => Err(AuthError::unauthorized(
                UnauthorizedKind::AuthRequired,
                &self.config.messages.auth_required,
            )),
            None => Ok(AuthOutcome::Anonymous),
        }
    }

    /// Context-build hook: merge a recorded outcome into the shared context.
    ///
    /// `outcome: None` means the pre-parse hook never ran for this request.
    /// That is a host wiring bug, reported as `Misconfigured` (500), never
    /// as an authorization failure.
    pub fn extend_context(
        &self,
        outcome: Option<&AuthOutcome>,
        ctx: &mut Map<String, Value>,
    ) -> Result<(), AuthError> {
        let outcome = outcome.ok_or(AuthError::Misconfigured(
            "request carries no auth outcome; is the auth middleware applied to this route?",
        ))?;

        if let AuthOutcome::Authorized(identity) = outcome {
            ctx.insert(
                self.config.extend_context_field.clone(),
                identity.to_context_value(),
            );
        }

        Ok(())
    }

    /// The core check. Standalone-invokable: at most one cache read, one
    /// cache write and one provider call per invocation; zero provider
    /// calls on a cache hit; no retries.
    pub async fn authorize(&self, token: &str) -> Result<AuthorizedIdentity, AuthError> {
        let client = SessionClient::new(Arc::clone(&self.provider), token);

        let data = match &self.cache {
            Some(cache) => self.lookup_cached(cache, token).await?,
            None => self.lookup(token).await?,
        };

        // Presence of the session record is the validity marker, whichever
        // path produced the data.
        let session = data
            .session
            .ok_or_else(|| self.invalid_token("session marker missing"))?;

        if let Some(expires_at) = session.expires_at
            && expires_at <= Utc::now()
        {
            tracing::debug!(%expires_at, "session past expiry");
            return Err(AuthError::unauthorized(
                UnauthorizedKind::ExpiredToken,
                &self.config.messages.expired_token,
            ));
        }

        let user = data.user;

        if !self.config.allowed_roles.is_empty() {
            let role = user.role();
            if !self.config.allowed_roles.iter().any(|r| r == role) {
                tracing::debug!(role, "role not in allow-list");
                return Err(AuthError::unauthorized(
                    UnauthorizedKind::InvalidPermissions,
                    &self.config.messages.invalid_permissions,
                ));
            }
        }

        Ok(AuthorizedIdentity {
            client,
            session,
            user,
        })
    }

    /// One provider call, classified. No retry: a failed lookup is terminal
    /// for this request.
    async fn lookup(&self, token: &str) -> Result<SessionData, AuthError> {
        self.provider.get_session(token).await.map_err(|err| {
            if matches!(err, ProviderError::SessionExpired) {
                return AuthError::unauthorized(
                    UnauthorizedKind::ExpiredToken,
                    &self.config.messages.expired_token,
                );
            }
            self.invalid_token(&err.to_string())
        })
    }

    async fn lookup_cached(&self, cache: &C, token: &str) -> Result<SessionData, AuthError> {
        let key = format!("{}:{}", self.config.cache_prefix, token);

        // Cache failures are fail-closed: a backend outage must not let an
        // unverifiable credential through.
        let hit = cache
            .get_string(&key)
            .await
            .map_err(|err| self.invalid_token(&format!("cache read failed: {err}")))?;

        if let Some(raw) = hit {
            tracing::debug!(backend = cache.backend_name(), "session cache hit");
            return serde_json::from_str(&raw)
                .map_err(|err| self.invalid_token(&format!("unreadable cache entry: {err}")));
        }

        // Miss: one lookup, then publish for concurrent requests with the
        // same token. Racing writers store the same value, so plain SET.
        let data = self.lookup(token).await?;

        let raw = serde_json::to_string(&data)
            .map_err(|err| self.invalid_token(&format!("unserializable session: {err}")))?;

        cache
            .set_with_ttl(&key, &raw, self.config.cache_expiration)
            .await
            .map_err(|err| self.invalid_token(&format!("cache write failed: {err}")))?;

        Ok(data)
    }

    fn invalid_token(&self, detail: &str) -> AuthError {
        // Detail goes to the log, never to the client.
        tracing::debug!(detail, "authorization rejected");
        AuthError::unauthorized(
            UnauthorizedKind::InvalidToken,
            &self.config.messages.invalid_token,
        )
    }
}
