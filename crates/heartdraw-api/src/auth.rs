use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use heartdraw_db::models::UserRow;
use heartdraw_types::api::Claims;
use heartdraw_types::models::User;
use heartdraw_types::validation::validate_credentials;

use crate::error::ApiError;
use crate::{AppState, SessionConfig, run_db};

pub const SESSION_COOKIE: &str = "heartdraw_session";

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let creds = validate_credentials(&body, true)
        .map_err(|errors| ApiError::validation("Invalid registration data", errors))?;

    let username = creds.username.clone();
    let taken = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .is_some();
    if taken {
        return Err(ApiError::Conflict("Username already exists"));
    }

    let password_hash = hash_password(&creds.password)?;
    let user_id = Uuid::new_v4();

    // A concurrent registration can take the name after the check above.
    let username = creds.username.clone();
    let inserted = run_db(&state, move |db| {
        db.create_user(&user_id.to_string(), &username, &password_hash)
    })
    .await?;
    if !inserted {
        return Err(ApiError::Conflict("Username already exists"));
    }

    info!("Registered user {} ({})", creds.username, user_id);

    let jar = jar.add(session_cookie(&state.session, user_id, &creds.username)?);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(User {
            id: user_id,
            username: creds.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let creds = validate_credentials(&body, false)
        .map_err(|errors| ApiError::validation("Invalid login data", errors))?;

    let username = creds.username.clone();
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.username, e))?;

    Argon2::default()
        .verify_password(creds.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("Failed login for {}", user.username);
            ApiError::Unauthorized
        })?;

    let user = public_user(user)?;
    let jar = jar.add(session_cookie(&state.session, user.id, &user.username)?);
    Ok((jar, Json(user)))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), StatusCode::OK)
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let id = claims.sub.to_string();
    let user = run_db(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(public_user(user)?))
}

/// Argon2id with a fresh salt, PHC string format.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub(crate) fn create_token(
    session: &SessionConfig,
    user_id: Uuid,
    username: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + session.ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(session.secret.as_bytes()),
    )?;

    Ok(token)
}

fn session_cookie(
    session: &SessionConfig,
    user_id: Uuid,
    username: &str,
) -> anyhow::Result<Cookie<'static>> {
    let token = create_token(session, user_id, username)?;
    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(session.secure_cookie)
        .build())
}

fn public_user(row: UserRow) -> anyhow::Result<User> {
    let id = row
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", row.id, e))?;
    Ok(User {
        id,
        username: row.username,
    })
}
