use crate::models::{HeartRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const HEART_COLUMNS: &str = "id, user_id, name, image, created_at";

impl Database {
    // -- Users --

    /// Returns `false` without writing when `username` is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    // -- Hearts --

    pub fn insert_heart(&self, heart: &HeartRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO hearts (id, user_id, name, image, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![heart.id, heart.user_id, heart.name, heart.image, heart.created_at],
            )?;
            Ok(())
        })
    }

    /// All hearts owned by `user_id`, newest first.
    pub fn list_hearts(&self, user_id: &str) -> Result<Vec<HeartRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HEART_COLUMNS} FROM hearts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], heart_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_heart(&self, id: &str) -> Result<Option<HeartRow>> {
        self.with_conn(|conn| query_heart(conn, id))
    }

    /// Overwrite whichever of `name`/`image` is `Some` and return the stored
    /// row, or `None` when no heart has that id.
    pub fn update_heart(
        &self,
        id: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<Option<HeartRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE hearts SET name = COALESCE(?2, name), image = COALESCE(?3, image) WHERE id = ?1",
                rusqlite::params![id, name, image],
            )?;
            query_heart(conn, id)
        })
    }

    /// Returns whether a row was actually removed.
    pub fn delete_heart(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM hearts WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_heart(conn: &Connection, id: &str) -> Result<Option<HeartRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {HEART_COLUMNS} FROM hearts WHERE id = ?1"))?;
    let row = stmt.query_row([id], heart_from_row).optional()?;
    Ok(row)
}

fn heart_from_row(row: &Row<'_>) -> rusqlite::Result<HeartRow> {
    Ok(HeartRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
