//! Bearer authorization for GraphQL-style request lifecycles.
//!
//! A thin shim between an external identity provider and a hosting request
//! lifecycle: per request it extracts a bearer credential, exchanges it for
//! session data (optionally through a shared cache), enforces a role
//! allow-list and records the result so a later lifecycle phase can attach
//! the identity to the shared context.
//!
//! The host is opaque: the two hooks (`on_request`, `extend_context`) are
//! plain async methods, with axum glue in [`middleware`] for convenience.

pub mod error;
pub mod middleware;
pub mod services;

pub use error::{AuthError, UnauthorizedKind};
pub use middleware::{AuthIdentity, RecordedOutcome};
pub use services::auth::{
    AuthConfig, AuthOutcome, AuthorizedIdentity, BearerAuthPlugin, BearerHeaderExtractor, Messages,
    Session, SessionClient, SessionData, TokenExtractor, User,
};
pub use services::cache::{CacheClient, CacheError, MemoryCache, ValkeyClient};
pub use services::provider::{HttpIdentityProvider, IdentityProvider, ProviderError};
