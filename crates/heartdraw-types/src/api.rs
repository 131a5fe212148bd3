use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Session claims --

/// Claims carried by the session token. Shared by the API middleware and
/// anything else that needs to resolve the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// -- Errors --

/// One failed field check. `path` is empty when the whole body is at fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// JSON body of every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

// -- Hearts --

/// Body for `POST /api/hearts` as the client sends it.
#[derive(Debug, Clone, Serialize)]
pub struct CreateHeartRequest {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body for `PUT /api/hearts/{id}` as the client sends it. Both fields optional.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateHeartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
