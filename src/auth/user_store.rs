//! User Storage
//! Mission: Store and manage soft-deletable user accounts with SQLite

use crate::auth::models::User;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, warn};
use uuid::Uuid;

/// User storage with SQLite backend.
///
/// Username uniqueness is enforced by the `UNIQUE` column constraint, so
/// concurrent duplicate registrations resolve at the store rather than in a
/// check-then-insert race.
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create users table")?;

        Ok(())
    }

    /// Create a new user with a bcrypt-hashed password.
    ///
    /// Returns `Ok(None)` when the username is already taken: the UNIQUE
    /// constraint is the authority, making the insert a single atomic step.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            active: true,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.active,
                user.created_at,
            ],
        );

        match inserted {
            Ok(_) => {
                info!("✅ Created user: {} ({})", user.username, user.id);
                Ok(Some(user))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                warn!("Registration rejected, username taken: {}", username);
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Get a user by username, regardless of active state.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, active, created_at
             FROM users WHERE username = ?1",
        )?;

        let user = stmt.query_row(params![username], Self::row_to_user);
        match user {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by id, regardless of active state.
    pub fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, active, created_at
             FROM users WHERE id = ?1",
        )?;

        let user = stmt.query_row(params![id.to_string()], Self::row_to_user);
        match user {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve login credentials to an active user.
    ///
    /// Returns `Ok(None)` for an unknown username, a deactivated account, or
    /// a wrong password. The cases are logged distinctly but deliberately not
    /// distinguishable through the return value.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_username(username)? else {
            warn!("Login attempt for unknown username: {}", username);
            return Ok(None);
        };

        if !user.active {
            warn!("Login attempt for deactivated user: {}", username);
            return Ok(None);
        }

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        if !valid {
            warn!("Wrong password for user: {}", username);
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Flip a user's active flag. Soft delete sets it to false; the record
    /// itself is never removed. Returns false when the id matches no user.
    pub fn set_active(&self, id: &Uuid, active: bool) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute(
            "UPDATE users SET active = ?1 WHERE id = ?2",
            params![active, id.to_string()],
        )?;

        if rows > 0 {
            info!(user_id = %id, active, "Updated user active flag");
        }
        Ok(rows > 0)
    }

    /// Partial profile update. Returns the updated user, or `None` when the
    /// id matches no user. Fields left as `None` are untouched.
    pub fn update_user(
        &self,
        id: &Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        if let Some(username) = username {
            let rows = conn.execute(
                "UPDATE users SET username = ?1 WHERE id = ?2",
                params![username, id.to_string()],
            )?;
            if rows == 0 {
                return Ok(None);
            }
        }
        if let Some(email) = email {
            let rows = conn.execute(
                "UPDATE users SET email = ?1 WHERE id = ?2",
                params![email, id.to_string()],
            )?;
            if rows == 0 {
                return Ok(None);
            }
        }

        self.find_by_id(id)
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let id_str: String = row.get(0)?;
        Ok(User {
            id: Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
