/*
 * Responsibility
 * - Config loading → dependency construction → Router assembly
 * - Middleware wiring (auth hook + transport layers)
 * - axum::serve() startup
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graphql_bearer_auth::{
    AuthConfig, AuthError, AuthIdentity, BearerAuthPlugin, CacheClient, HttpIdentityProvider,
    RecordedOutcome, ValkeyClient, middleware,
};

use crate::config::Config;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,graphql_bearer_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched.)
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice
        // immediately. In production, keep the default behavior.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting auth demo in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let provider = Arc::new(HttpIdentityProvider::new(&config.auth_base_url));

    let auth_config = AuthConfig::new(&config.auth_base_url)
        .with_cache_prefix(&config.cache_prefix)
        .with_cache_expiration(std::time::Duration::from_secs(config.cache_ttl_seconds))
        .with_allowed_roles(config.allowed_roles.clone())
        .with_require_auth(config.require_auth)
        .with_extend_context_field(&config.context_field);

    // The cache backend decides the plugin's concrete type, so the router is
    // assembled inside each branch.
    let app = match &config.redis_url {
        Some(url) => {
            let cache = ValkeyClient::new(url).await?;
            let plugin = Arc::new(BearerAuthPlugin::new(auth_config, provider).with_cache(cache));
            build_router(plugin)
        }
        None => {
            let plugin = Arc::new(BearerAuthPlugin::new(auth_config, provider));
            build_router(plugin)
        }
    };

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router<C: CacheClient>(plugin: Arc<BearerAuthPlugin<C>>) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let guarded = Router::new()
        .route("/graphql", post(graphql::<C>))
        .route("/whoami", get(whoami));
    let guarded = middleware::auth::apply(guarded, plugin.clone());

    let router = Router::new()
        .route("/health", get(health))
        .merge(guarded)
        .with_state(plugin);

    middleware::http::apply(router)
}

/// Stand-in for the GraphQL executor: builds the shared context the way the
/// context-build hook would and echoes it back.
async fn graphql<C: CacheClient>(
    State(plugin): State<Arc<BearerAuthPlugin<C>>>,
    RecordedOutcome(outcome): RecordedOutcome,
    Json(_request): Json<Value>,
) -> Result<Json<Value>, AuthError> {
    let mut ctx = Map::new();
    plugin.extend_context(outcome.as_ref(), &mut ctx)?;

    Ok(Json(Value::Object(ctx)))
}

async fn whoami(AuthIdentity(identity): AuthIdentity) -> Json<Value> {
    match identity {
        Some(identity) => Json(serde_json::json!({ "user": identity.user })),
        None => Json(serde_json::json!({ "user": null })),
    }
}
