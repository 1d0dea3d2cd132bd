//! HTTP gateway for Shoplist.
//!
//! Exposes the login/logout flow, the embedded single-page frontend, and
//! the JSON API under `/api`. Every route except `/health`, `/login`,
//! `/logout` and the static assets passes through the [`AuthGate`].
//!
//! Built on Axum.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{
    Form, Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use shoplist_config::AppConfig;
use shoplist_core::{ListRepository, Store};
use shoplist_security::{AuthGate, Decision, SessionStore};
use shoplist_store::SqliteStore;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Maximum accepted request body.
const BODY_LIMIT: usize = 16 * 1024;

/// Shared application state.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthGate,
}

pub type SharedState = Arc<AppState>;

/// Build the full router.
///
/// Layers applied:
/// - Session check on the app page (redirect to `/login`) and on `/api` (401)
/// - Request body size limit (16 KiB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let api = api::api_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        api_auth_middleware,
    ));

    let pages = frontend::app_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        page_auth_middleware,
    ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/logout", get(logout_handler))
        .merge(frontend::static_router())
        .merge(pages)
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the HTTP server.
///
/// Opens the database, creates the default list if needed, and serves
/// until the process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = SqliteStore::new(&config.database.path).await?;
    if let Some(list) = store.ensure_default(&config.lists.default_name).await? {
        info!(list_id = list.id, name = %list.name, "Bootstrapped default list");
    }

    let sessions = Arc::new(SessionStore::with_ttl(chrono::Duration::hours(i64::from(
        config.auth.session_ttl_hours,
    ))));
    let auth = AuthGate::new(config.auth.effective_pin().map(String::from), sessions);
    if !auth.is_enabled() {
        warn!("No PIN configured, authentication is disabled");
    }

    let state = Arc::new(AppState {
        store: Arc::new(store),
        auth,
    });
    let app = build_router(state.clone());

    info!(addr = %addr, pin_enabled = state.auth.is_enabled(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Session cookie ---

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}; SameSite=Lax")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

// --- Middleware ---

/// Gate for `/api`: denied requests get `401 Unauthorized`.
async fn api_auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    if let Err(e) = state.auth.require(token.as_deref()) {
        warn!(path = %req.uri().path(), "Unauthorized API request");
        return api::ApiError::from(e).into_response();
    }
    next.run(req).await
}

/// Gate for pages: denied requests are sent to the login page.
///
/// Admitted page loads re-issue the cookie so the browser's `Max-Age`
/// follows the sliding server-side expiry.
async fn page_auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    if state.auth.authorize(token.as_deref()) == Decision::Deny {
        return Redirect::to("/login").into_response();
    }

    let mut response = next.run(req).await;
    if let Some(token) = token.filter(|_| state.auth.is_enabled()) {
        let max_age = state.auth.sessions().ttl().num_seconds();
        if let Ok(value) = HeaderValue::from_str(&session_cookie(&token, max_age)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

// --- Handlers ---

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        backend: state.store.backend_name().into(),
    })
}

async fn login_page_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let signed_in = session_token(&headers).is_some_and(|t| state.auth.sessions().is_valid(&t));
    if !state.auth.is_enabled() || signed_in {
        return Redirect::to("/").into_response();
    }
    Html(frontend::login_page(None)).into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    pin: String,
}

async fn login_handler(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth.authenticate(&form.pin) {
        Ok(token) => {
            let max_age = state.auth.sessions().ttl().num_seconds();
            info!("Session opened");
            (
                [(header::SET_COOKIE, session_cookie(&token, max_age))],
                Redirect::to("/"),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Html(frontend::login_page(Some("Incorrect PIN"))),
        )
            .into_response(),
    }
}

async fn logout_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token);
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use shoplist_store::InMemoryStore;
    use tower::ServiceExt;

    async fn test_state(pin: Option<&str>) -> SharedState {
        let store = InMemoryStore::new();
        store.ensure_default("Main List").await.unwrap();
        Arc::new(AppState {
            store: Arc::new(store),
            auth: AuthGate::new(pin.map(String::from), Arc::new(SessionStore::new())),
        })
    }

    fn login_request(pin: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("pin={pin}")))
            .unwrap()
    }

    fn cookie_value(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie
            .split(';')
            .next()
            .unwrap()
            .trim_start_matches("session_token=")
            .to_string()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(Some("4242")).await);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.backend, "in_memory");
    }

    #[tokio::test]
    async fn unauthenticated_page_redirects_to_login() {
        let app = build_router(test_state(Some("4242")).await);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn unauthenticated_api_is_401() {
        let app = build_router(test_state(Some("4242")).await);
        let req = Request::builder()
            .uri("/api/lists")
            .header(header::COOKIE, "session_token=garbage")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_pin_shows_generic_error() {
        let app = build_router(test_state(Some("4242")).await);

        let response = app.oneshot(login_request("0000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("Incorrect PIN"));
    }

    #[tokio::test]
    async fn login_cookie_admits_until_logout() {
        let state = test_state(Some("4242")).await;
        let app = build_router(state.clone());

        let response = app.clone().oneshot(login_request("4242")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=86400"));
        let token = cookie_value(&response);

        let req = Request::builder()
            .uri("/api/lists")
            .header(header::COOKIE, format!("theme=dark; session_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/logout")
            .header(header::COOKIE, format!("session_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(
            response
                .headers()
                .get(header::SET_COOKIE)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );

        let req = Request::builder()
            .uri("/api/lists")
            .header(header::COOKIE, format!("session_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.auth.sessions().is_empty());
    }

    #[tokio::test]
    async fn page_load_reissues_session_cookie() {
        let state = test_state(Some("4242")).await;
        let app = build_router(state.clone());

        let response = app.clone().oneshot(login_request("4242")).await.unwrap();
        let token = cookie_value(&response);

        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, format!("session_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with(&format!("session_token={token};")));
        assert!(set_cookie.contains("Max-Age=86400"));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn signed_in_login_page_redirects_home() {
        let app = build_router(test_state(Some("4242")).await);

        let response = app.clone().oneshot(login_request("4242")).await.unwrap();
        let token = cookie_value(&response);

        let req = Request::builder()
            .uri("/login")
            .header(header::COOKIE, format!("session_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let req = Request::builder()
            .uri("/login")
            .header(header::COOKIE, "session_token=stale")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn open_gate_sets_no_cookie() {
        let app = build_router(test_state(None).await);
        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, "session_token=anything")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn open_gate_needs_no_cookie() {
        let app = build_router(test_state(None).await);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::builder().uri("/login").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn session_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, "a=1; session_token=abc-_9; b=2".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("abc-_9"));

        headers.insert(header::COOKIE, "session_token=".parse().unwrap());
        assert_eq!(session_token(&headers), None);
    }
}
