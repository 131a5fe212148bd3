//! Heart CRUD. Every handler runs behind `require_auth`, checks the path id
//! and the payload shape first, then existence, then ownership.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use heartdraw_db::models::HeartRow;
use heartdraw_types::api::Claims;
use heartdraw_types::models::Heart;
use heartdraw_types::validation::{validate_create, validate_update};

use crate::error::ApiError;
use crate::{AppState, run_db};

pub async fn list_hearts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Heart>>, ApiError> {
    let owner = claims.sub.to_string();
    let rows = run_db(&state, move |db| db.list_hearts(&owner)).await?;
    Ok(Json(rows.into_iter().map(to_heart).collect()))
}

pub async fn get_heart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Heart>, ApiError> {
    let id = parse_heart_id(&id)?;
    let row = load_owned(&state, id, &claims).await?;
    Ok(Json(to_heart(row)))
}

pub async fn create_heart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req = validate_create(&body)
        .map_err(|errors| ApiError::validation("Invalid heart data", errors))?;

    let now = Utc::now();
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let row = HeartRow {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        name: req
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(now)),
        image: req.image,
        created_at: timestamp,
    };

    let stored = row.clone();
    run_db(&state, move |db| db.insert_heart(&stored)).await?;

    info!("Heart {} saved by {}", row.id, claims.username);
    Ok((StatusCode::CREATED, Json(to_heart(row))))
}

pub async fn update_heart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<Json<Heart>, ApiError> {
    let id = parse_heart_id(&id)?;
    let req = validate_update(&body)
        .map_err(|errors| ApiError::validation("Invalid update data", errors))?;

    let existing = load_owned(&state, id, &claims).await?;
    if req.is_empty() {
        return Ok(Json(to_heart(existing)));
    }

    let key = id.to_string();
    let row = run_db(&state, move |db| {
        db.update_heart(&key, req.name.as_deref(), req.image.as_deref())
    })
    .await?
    // Deleted between the ownership check and the write.
    .ok_or(ApiError::NotFound("Heart not found"))?;

    Ok(Json(to_heart(row)))
}

pub async fn delete_heart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let id = parse_heart_id(&id)?;
    load_owned(&state, id, &claims).await?;

    let key = id.to_string();
    if !run_db(&state, move |db| db.delete_heart(&key)).await? {
        return Err(ApiError::NotFound("Heart not found"));
    }

    info!("Heart {} deleted by {}", id, claims.username);
    Ok(StatusCode::NO_CONTENT)
}

fn parse_heart_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest("Invalid heart ID"))
}

/// Existence is checked before ownership, so a stranger's heart is 403, not 404.
async fn load_owned(state: &AppState, id: Uuid, claims: &Claims) -> Result<HeartRow, ApiError> {
    let key = id.to_string();
    let row = run_db(state, move |db| db.get_heart(&key))
        .await?
        .ok_or(ApiError::NotFound("Heart not found"))?;

    if row.user_id != claims.sub.to_string() {
        warn!("{} tried to access heart {} owned by {}", claims.username, id, row.user_id);
        return Err(ApiError::Forbidden);
    }

    Ok(row)
}

fn default_name(now: DateTime<Utc>) -> String {
    format!("Heart {}", now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn to_heart(row: HeartRow) -> Heart {
    Heart {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt heart id '{}': {}", row.id, e);
            Uuid::default()
        }),
        user_id: row.user_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user_id '{}' on heart '{}': {}", row.user_id, row.id, e);
            Uuid::default()
        }),
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on heart '{}': {}", row.created_at, row.id, e);
            DateTime::default()
        }),
        name: row.name,
        image: row.image,
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    raw.parse::<DateTime<Utc>>().or_else(|_| {
        // SQLite's datetime('now') has no timezone; treat it as UTC.
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app, login_as, send};
    use serde_json::json;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn timestamps_parse_in_both_formats() {
        assert!(parse_timestamp("2024-02-14T10:00:00.000Z").is_ok());
        assert!(parse_timestamp("2024-02-14 10:00:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn list_without_session_is_401() {
        let (_, app) = app();
        let (status, body) = send(&app, "GET", "/api/hearts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Unauthorized" }));
    }

    #[tokio::test]
    async fn create_assigns_owner_id_and_default_name() {
        let (state, app) = app();
        let (user_id, cookie) = login_as(&state, "alice");

        let (status, heart) =
            send(&app, "POST", "/api/hearts", Some(&cookie), Some(json!({ "image": IMAGE }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(heart["userId"], user_id.to_string());
        assert_eq!(heart["image"], IMAGE);
        assert!(heart["id"].as_str().unwrap().parse::<Uuid>().is_ok());

        let name = heart["name"].as_str().unwrap();
        let stamp = name.strip_prefix("Heart ").unwrap();
        assert!(stamp.parse::<DateTime<Utc>>().is_ok());
        assert!(stamp.ends_with('Z'));

        let (status, list) = send(&app, "GET", "/api/hearts", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_payloads() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");

        let (status, body) =
            send(&app, "POST", "/api/hearts", Some(&cookie), Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid heart data");
        assert_eq!(body["errors"][0]["path"], "image");
    }

    #[tokio::test]
    async fn strangers_get_403_and_missing_is_404() {
        let (state, app) = app();
        let (_, alice) = login_as(&state, "alice");
        let (_, bob) = login_as(&state, "bob");

        let (_, heart) =
            send(&app, "POST", "/api/hearts", Some(&alice), Some(json!({ "image": IMAGE }))).await;
        let uri = format!("/api/hearts/{}", heart["id"].as_str().unwrap());

        let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "name": "mine" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let missing = format!("/api/hearts/{}", Uuid::new_v4());
        let (status, body) = send(&app, "GET", &missing, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Heart not found");

        let (status, body) = send(&app, "GET", "/api/hearts/42", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid heart ID");
    }

    #[tokio::test]
    async fn empty_update_changes_nothing() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");
        let (_, created) = send(
            &app,
            "POST",
            "/api/hearts",
            Some(&cookie),
            Some(json!({ "image": IMAGE, "name": "Valentine" })),
        )
        .await;
        let uri = format!("/api/hearts/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(&app, "PUT", &uri, Some(&cookie), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated, created);

        let (status, renamed) =
            send(&app, "PUT", &uri, Some(&cookie), Some(json!({ "name": "Galentine" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["name"], "Galentine");
        assert_eq!(renamed["image"], IMAGE);
    }

    #[tokio::test]
    async fn update_validates_before_looking_up() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");
        let missing = format!("/api/hearts/{}", Uuid::new_v4());

        let (status, body) =
            send(&app, "PUT", &missing, Some(&cookie), Some(json!({ "name": 7 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid update data");
    }

    #[tokio::test]
    async fn malformed_ids_are_400_for_update_and_delete() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");

        let (status, body) =
            send(&app, "PUT", "/api/hearts/42", Some(&cookie), Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid heart ID");

        let (status, body) = send(&app, "DELETE", "/api/hearts/42", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid heart ID");
    }

    #[tokio::test]
    async fn valid_update_of_missing_heart_is_404() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");
        let missing = format!("/api/hearts/{}", Uuid::new_v4());

        let (status, body) =
            send(&app, "PUT", &missing, Some(&cookie), Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Heart not found");
    }

    #[tokio::test]
    async fn second_delete_is_404() {
        let (state, app) = app();
        let (_, cookie) = login_as(&state, "alice");
        let (_, heart) =
            send(&app, "POST", "/api/hearts", Some(&cookie), Some(json!({ "image": IMAGE }))).await;
        let uri = format!("/api/hearts/{}", heart["id"].as_str().unwrap());

        let (status, body) = send(&app, "DELETE", &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        let (status, _) = send(&app, "DELETE", &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
