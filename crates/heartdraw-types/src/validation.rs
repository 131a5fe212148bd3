//! Shape checks for inbound JSON bodies.
//!
//! Bodies are parsed as loose JSON first and then checked field by field so
//! the caller gets one [`FieldError`] per problem instead of a single serde
//! message. Unknown fields are ignored.

use serde_json::{Map, Value};

use crate::api::{Credentials, FieldError};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// A validated create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateHeart {
    pub image: String,
    pub name: Option<String>,
}

/// A validated update payload. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateHeart {
    pub name: Option<String>,
    pub image: Option<String>,
}

impl UpdateHeart {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none()
    }
}

pub type Validated<T> = Result<T, Vec<FieldError>>;

pub fn validate_create(body: &[u8]) -> Validated<CreateHeart> {
    let obj = parse_object(body)?;
    let mut errors = Vec::new();

    let image = required_string(&obj, "image", &mut errors);
    let name = optional_string(&obj, "name", &mut errors);

    match image {
        Some(image) if errors.is_empty() => Ok(CreateHeart { image, name }),
        _ => Err(errors),
    }
}

pub fn validate_update(body: &[u8]) -> Validated<UpdateHeart> {
    let obj = parse_object(body)?;
    let mut errors = Vec::new();

    let name = optional_string(&obj, "name", &mut errors);
    let image = optional_string(&obj, "image", &mut errors);

    if errors.is_empty() {
        Ok(UpdateHeart { name, image })
    } else {
        Err(errors)
    }
}

/// Registration and login share one shape. Length rules only apply when
/// `enforce_lengths` is set, since login should not leak the policy.
pub fn validate_credentials(body: &[u8], enforce_lengths: bool) -> Validated<Credentials> {
    let obj = parse_object(body)?;
    let mut errors = Vec::new();

    let username = required_string(&obj, "username", &mut errors);
    let password = required_string(&obj, "password", &mut errors);

    if enforce_lengths {
        if let Some(u) = &username {
            if u.chars().count() < MIN_USERNAME_LEN {
                errors.push(FieldError::new(
                    "username",
                    format!("Username must be at least {MIN_USERNAME_LEN} characters"),
                ));
            }
        }
        if let Some(p) = &password {
            if p.chars().count() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
        }
    }

    match (username, password) {
        (Some(username), Some(password)) if errors.is_empty() => {
            Ok(Credentials { username, password })
        }
        _ => Err(errors),
    }
}

fn parse_object(body: &[u8]) -> Validated<Map<String, Value>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| vec![FieldError::new("", "Expected a JSON object")])?;

    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(vec![FieldError::new(
            "",
            format!("Expected object, received {}", type_name(&other)),
        )]),
    }
}

fn required_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::new(field, "Required"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_image() {
        let errors = validate_create(br#"{"name":"x"}"#).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("image", "Required")]);
    }

    #[test]
    fn create_accepts_optional_name() {
        let parsed = validate_create(br#"{"image":"data:image/png;base64,AA=="}"#).unwrap();
        assert_eq!(parsed.name, None);

        let named = validate_create(br#"{"image":"data:","name":"Mine","extra":1}"#).unwrap();
        assert_eq!(named.name.as_deref(), Some("Mine"));
    }

    #[test]
    fn create_reports_every_bad_field() {
        let errors = validate_create(br#"{"image":5,"name":null}"#).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Expected string, received number");
        assert_eq!(errors[1].path, "name");
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert_eq!(validate_create(b"[]").unwrap_err()[0].path, "");
        assert!(validate_update(b"not json").is_err());
        assert!(validate_update(b"").is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        let parsed = validate_update(b"{}").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn credential_lengths_only_checked_on_register() {
        let body = br#"{"username":"ab","password":"123"}"#;
        let errors = validate_credentials(body, true).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(validate_credentials(body, false).is_ok());
    }
}
