use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{info, warn};

use heartdraw_types::api::Claims;

use crate::{AppState, run_db};
use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;

const MAX_LOG_LINE: usize = 80;

/// Resolve the session cookie (or a `Bearer` header) into [`Claims`] and
/// stash them in the request extensions. A validly signed token whose user
/// no longer exists is treated like no session at all.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(str::to_owned)
        })
        .ok_or(ApiError::Unauthorized)?;

    let claims = decode_token(&state.session.secret, &token)?;

    let user_id = claims.sub.to_string();
    if run_db(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .is_none()
    {
        warn!("Rejected session for unknown user {}", claims.sub);
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub(crate) fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    Ok(token_data.claims)
}

/// One summary line per `/api` request, with the JSON body when there is
/// one: `GET /api/user 200 in 3ms :: {"id":...}`.
pub async fn log_api_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let resp = next.run(req).await;
    if !path.starts_with("/api") {
        return resp;
    }

    let mut line = format!(
        "{} {} {} in {}ms",
        method,
        path,
        resp.status().as_u16(),
        start.elapsed().as_millis()
    );

    let is_json = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        info!("{}", truncate_log_line(line));
        return resp;
    }

    let (parts, body) = resp.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not buffer response for {}: {}", path, e);
            info!("{}", truncate_log_line(line));
            return Response::from_parts(parts, Body::empty());
        }
    };
    append_body(&mut line, &bytes);
    info!("{}", truncate_log_line(line));

    Response::from_parts(parts, Body::from(bytes))
}

/// Only the head of the body can survive truncation, so only that is decoded.
fn append_body(line: &mut String, body: &[u8]) {
    if body.is_empty() {
        return;
    }
    let head = &body[..body.len().min(MAX_LOG_LINE * 4)];
    line.push_str(" :: ");
    line.push_str(&String::from_utf8_lossy(head));
}

fn truncate_log_line(line: String) -> String {
    if line.chars().count() <= MAX_LOG_LINE {
        return line;
    }
    let mut short: String = line.chars().take(MAX_LOG_LINE - 1).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SECRET, app, login_as, send};
    use axum::http::StatusCode;

    #[test]
    fn long_log_lines_are_truncated() {
        let short = "GET /api/hearts 200 in 1ms".to_string();
        assert_eq!(truncate_log_line(short.clone()), short);

        let long = format!("GET /api/hearts/{} 404 in 1ms", "x".repeat(100));
        let cut = truncate_log_line(long);
        assert_eq!(cut.chars().count(), MAX_LOG_LINE);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn json_body_follows_the_summary() {
        let mut line = "GET /api/user 200 in 2ms".to_string();
        append_body(&mut line, br#"{"username":"alice"}"#);
        assert_eq!(line, r#"GET /api/user 200 in 2ms :: {"username":"alice"}"#);

        let mut line = "DELETE /api/hearts/x 204 in 1ms".to_string();
        append_body(&mut line, b"");
        assert_eq!(line, "DELETE /api/hearts/x 204 in 1ms");
    }

    #[tokio::test]
    async fn logged_responses_keep_their_body() {
        let (state, app) = app();
        let (id, cookie) = login_as(&state, "alice");
        let (status, me) = send(&app, "GET", "/api/user", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, serde_json::json!({ "id": id, "username": "alice" }));
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let (state, _) = app();
        let (_, cookie) = login_as(&state, "alice");
        let token = cookie.split_once('=').unwrap().1;
        assert!(decode_token(SECRET, token).is_ok());
        assert!(decode_token("other-secret", token).is_err());
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");
        let token = cookie.split_once('=').unwrap().1.to_string();

        let req = axum::http::Request::builder()
            .uri("/api/hearts")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = tower::ServiceExt::oneshot(app, req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn session_for_a_vanished_user_is_unauthorized() {
        let (state, app) = app();
        let ghost = uuid::Uuid::new_v4();
        let token = crate::auth::create_token(&state.session, ghost, "ghost").unwrap();
        let cookie = format!("{SESSION_COOKIE}={token}");

        let (status, body) = send(
            &app,
            "POST",
            "/api/hearts",
            Some(&cookie),
            Some(serde_json::json!({ "image": "data:image/png;base64,AA==" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "message": "Unauthorized" }));

        let (status, _) = send(&app, "GET", "/api/hearts", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_cookie_is_unauthorized() {
        let (_, app) = app();
        let (status, body) =
            send(&app, "GET", "/api/hearts", Some("heartdraw_session=nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "message": "Unauthorized" }));
    }
}
