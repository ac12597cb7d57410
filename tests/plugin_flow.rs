//! End-to-end tests of the request lifecycle wiring:
//! pre-parse middleware → recorded outcome → context build / extractor.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tower::ServiceExt;

use graphql_bearer_auth::{
    AuthConfig, AuthError, AuthIdentity, BearerAuthPlugin, CacheClient, IdentityProvider,
    MemoryCache, ProviderError, RecordedOutcome, Session, SessionData, User, middleware,
};

struct MockProvider {
    sessions: Mutex<HashMap<String, SessionData>>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn insert(&self, token: &str, role: Option<&str>) {
        let data = SessionData {
            session: Some(Session {
                id: Some(format!("session-{token}")),
                ..Session::default()
            }),
            user: User {
                id: Some("u-1".into()),
                role: role.map(Into::into),
                ..User::default()
            },
        };
        self.sessions.lock().unwrap().insert(token.into(), data);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn get_session(&self, token: &str) -> Result<SessionData, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown token".into()))
    }
}

/// Context-build handler: the stand-in for the GraphQL executor.
async fn context<C: CacheClient>(
    State(plugin): State<Arc<BearerAuthPlugin<C>>>,
    RecordedOutcome(outcome): RecordedOutcome,
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

fn build_app<C: CacheClient>(plugin: Arc<BearerAuthPlugin<C>>) -> Router {
    let guarded = Router::new()
        .route("/context", post(context::<C>))
        .route("/whoami", get(whoami));
    let guarded = middleware::auth::apply(guarded, plugin.clone());

    Router::new().merge(guarded).with_state(plugin)
}

fn post_context(auth_header: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/context")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(v) = auth_header {
        builder = builder.header(header::AUTHORIZATION, v);
    }
    builder.body(Body::from("{}")).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn valid_bearer_request_gets_the_identity_in_context() {
    let provider = MockProvider::new();
    provider.insert("t-ok", Some("editor"));

    let plugin = Arc::new(BearerAuthPlugin::new(AuthConfig::default(), provider));
    let app = build_app(plugin);

    let resp = app.oneshot(post_context(Some("Bearer t-ok"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["auth"]["user"]["role"], "editor");
    assert_eq!(body["auth"]["session"]["id"], "session-t-ok");
}

#[tokio::test]
async fn context_field_name_is_configurable() {
    let provider = MockProvider::new();
    provider.insert("t-ok", None);

    let config = AuthConfig::default().with_extend_context_field("viewer");
    let plugin = Arc::new(BearerAuthPlugin::new(config, provider));
    let app = build_app(plugin);

    let resp = app.oneshot(post_context(Some("Bearer t-ok"))).await.unwrap();
    let body = json_body(resp).await;

    assert!(body.get("auth").is_none());
    assert_eq!(body["viewer"]["user"]["id"], "u-1");
}

#[tokio::test]
async fn basic_scheme_is_rejected_before_any_provider_call() {
    let provider = MockProvider::new();

    let plugin = Arc::new(BearerAuthPlugin::new(
        AuthConfig::default(),
        provider.clone(),
    ));
    let app = build_app(plugin);

    let resp = app
        .oneshot(post_context(Some("Basic dXNlcjpwYXNz")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN_SCHEME");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn anonymous_request_passes_with_empty_context() {
    let provider = MockProvider::new();
    let plugin = Arc::new(BearerAuthPlugin::new(
        AuthConfig::default(),
        provider.clone(),
    ));
    let app = build_app(plugin);

    let resp = app.oneshot(post_context(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body, serde_json::json!({}));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_credential_is_rejected_when_auth_is_required() {
    let provider = MockProvider::new();
    let config = AuthConfig::default().with_require_auth(true);
    let plugin = Arc::new(BearerAuthPlugin::new(config, provider));
    let app = build_app(plugin);

    let resp = app.oneshot(post_context(None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn unknown_token_is_a_401_invalid_token() {
    let provider = MockProvider::new();
    let plugin = Arc::new(BearerAuthPlugin::new(AuthConfig::default(), provider));
    let app = build_app(plugin);

    let resp = app
        .oneshot(post_context(Some("Bearer nope")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn cached_requests_hit_the_provider_once() {
    let provider = MockProvider::new();
    provider.insert("t-cache", None);

    let plugin = Arc::new(
        BearerAuthPlugin::new(AuthConfig::default(), provider.clone())
            .with_cache(MemoryCache::new()),
    );
    let app = build_app(plugin);

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(post_context(Some("Bearer t-cache")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn disallowed_role_is_a_401_invalid_permissions() {
    let provider = MockProvider::new();
    provider.insert("t-editor", Some("editor"));

    let config = AuthConfig::default()
        .with_allowed_roles(["admin"])
        .with_suppress_role_warning(true);
    let plugin = Arc::new(BearerAuthPlugin::new(config, provider));
    let app = build_app(plugin);

    let resp = app
        .oneshot(post_context(Some("Bearer t-editor")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_PERMISSIONS");
}

#[tokio::test]
async fn whoami_reports_the_authenticated_user() {
    let provider = MockProvider::new();
    provider.insert("t-ok", Some("admin"));

    let plugin = Arc::new(BearerAuthPlugin::new(AuthConfig::default(), provider));
    let app = build_app(plugin);

    let req = Request::builder()
        .uri("/whoami")
        .header(header::AUTHORIZATION, "Bearer t-ok")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn extractor_without_middleware_is_a_500_not_a_401() {
    // The auth middleware is deliberately not applied here: reading the
    // identity on such a route is an integration bug.
    let app: Router = Router::new().route("/whoami", get(whoami));

    let req = Request::builder()
        .uri("/whoami")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "MISCONFIGURED");
}
