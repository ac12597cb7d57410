/*
 * Responsibility
 * - Wire the two plugin hooks into the axum request lifecycle
 * - Pre-parse: run the check, record the outcome in the request extensions
 * - Context build: point-read the recorded outcome via extractors
 *
 * The extensions map is the per-request store. The middleware writes one
 * entry for its own request, the extractor reads only that entry, and the
 * whole map is dropped with the request. Nothing leaks across requests.
 */
use std::{convert::Infallible, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AuthError;
use crate::services::auth::{AuthOutcome, AuthorizedIdentity, BearerAuthPlugin};
use crate::services::cache::CacheClient;

/// Applies the pre-parse hook to every route of `router`.
///
/// Example:
/// ```ignore
/// let plugin = Arc::new(BearerAuthPlugin::new(config, provider));
/// let app = middleware::auth::apply(router, plugin);
/// ```
pub fn apply<S, C>(router: Router<S>, plugin: Arc<BearerAuthPlugin<C>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    C: CacheClient,
{
    // axum 0.8 `from_fn` cannot take a State extractor on its own, so the
    // plugin is passed explicitly via `from_fn_with_state`.
    router.layer(middleware::from_fn_with_state(
        plugin,
        bearer_auth_middleware::<C>,
    ))
}

async fn bearer_auth_middleware<C: CacheClient>(
    State(plugin): State<Arc<BearerAuthPlugin<C>>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // The extractor contract works on the request head only, so split,
    // check, record, reassemble.
    let (mut parts, body) = req.into_parts();

    let outcome = match plugin.on_request(&parts).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // Expected client-side condition, not a server error.
            tracing::debug!(code = err.code(), "request rejected");
            return Err(err);
        }
    };

    parts.extensions.insert(outcome);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Typed handler-side view of the recorded outcome.
///
/// - `AuthIdentity(Some(_))`: the request carried a valid credential.
/// - `AuthIdentity(None)`: anonymous request (allowed when `require_auth`
///   is off).
/// - Rejection: the middleware never ran for this route, which is a wiring
///   bug and surfaces as a 500, not a 401.
pub struct AuthIdentity(pub Option<AuthorizedIdentity>);

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthOutcome>() {
            Some(AuthOutcome::Authorized(identity)) => Ok(Self(Some(identity.clone()))),
            Some(AuthOutcome::Anonymous) => Ok(Self(None)),
            None => {
                tracing::error!("auth outcome missing from request extensions");
                Err(AuthError::Misconfigured(
                    "request carries no auth outcome; is the auth middleware applied to this route?",
                ))
            }
        }
    }
}

/// Raw recorded outcome, for callers that feed `extend_context` themselves.
/// Infallible on purpose: the misconfiguration check belongs to
/// `extend_context`, which reports `None` as `Misconfigured`.
pub struct RecordedOutcome(pub Option<AuthOutcome>);

impl<S> FromRequestParts<S> for RecordedOutcome
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthOutcome>().cloned()))
    }
}
