pub mod auth;
pub mod error;
pub mod hearts;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tracing::error;

use heartdraw_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session: SessionConfig,
}

/// How session tokens are signed and how long they live.
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl: chrono::Duration,
    /// Mark the cookie `Secure`. Off for plain-HTTP development.
    pub secure_cookie: bool,
}

/// All `/api` routes. Static assets and transport layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/user", get(auth::current_user))
        .route("/hearts", get(hearts::list_hearts).post(hearts::create_heart))
        .route(
            "/hearts/{id}",
            get(hearts::get_heart)
                .put(hearts::update_heart)
                .delete(hearts::delete_heart),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(from_fn(middleware::log_api_requests))
        .with_state(state)
}

/// Run a blocking DB closure off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::Internal)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, Response, StatusCode, header},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    pub const SECRET: &str = "test-secret";

    pub fn app() -> (AppState, Router) {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            session: SessionConfig {
                secret: SECRET.into(),
                ttl: chrono::Duration::days(1),
                secure_cookie: false,
            },
        });
        (state.clone(), router(state))
    }

    /// Insert a user directly and return a `Cookie` header value for them.
    pub fn login_as(state: &AppState, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        state.db.create_user(&id.to_string(), username, "unused").unwrap();
        let token = auth::create_token(&state.session, id, username).unwrap();
        (id, format!("{}={}", auth::SESSION_COOKIE, token))
    }

    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let resp = send_raw(app, method, uri, cookie, body.map(|b| b.to_string())).await;
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn send_raw(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<String>,
    ) -> Response<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(req).await.unwrap()
    }
}
