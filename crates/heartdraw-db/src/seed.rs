//! Demo account for local development.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::models::HeartRow;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password";

// 1x1 PNGs, enough to show up in a gallery.
const RED_PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";
const PINK_PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

/// Create the demo user and two sample hearts, but only into an empty
/// users table. `password_hash` must already be hashed by the caller.
/// Returns whether anything was written.
pub fn seed_demo(db: &Database, password_hash: &str) -> Result<bool> {
    if db.count_users()? > 0 {
        info!("Users already exist, skipping seed");
        return Ok(false);
    }

    let user_id = Uuid::new_v4().to_string();
    if !db.create_user(&user_id, DEMO_USERNAME, password_hash)? {
        info!("Demo user already exists, skipping seed");
        return Ok(false);
    }
    info!("Created demo user with id {}", user_id);

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    for (name, image) in [("Simple Red Heart", RED_PIXEL), ("Gradient Heart", PINK_PIXEL)] {
        db.insert_heart(&HeartRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            created_at: now.clone(),
        })?;
    }

    info!("Seeded sample hearts");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_once() {
        let db = Database::open_in_memory().unwrap();
        assert!(seed_demo(&db, "hash").unwrap());
        assert!(!seed_demo(&db, "hash").unwrap());

        let user = db.get_user_by_username(DEMO_USERNAME).unwrap().unwrap();
        assert_eq!(db.list_hearts(&user.id).unwrap().len(), 2);
    }
}
