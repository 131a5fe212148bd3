//! Row types that map one-to-one onto SQLite rows. Timestamps and ids stay
//! as stored text; converting to `heartdraw-types` models is the API's job.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct HeartRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub image: String,
    pub created_at: String,
}
