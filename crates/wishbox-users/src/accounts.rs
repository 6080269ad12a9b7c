use std::sync::{Arc, Mutex, MutexGuard};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wishbox_core::clock::to_db_timestamp;

use crate::db::{row_to_user, USER_COLUMNS};
use crate::error::{Result, UserError};
use crate::types::User;

const MIN_PASSWORD_LEN: usize = 6;

/// Account registration and password login.
pub struct AccountManager {
    db: Arc<Mutex<Connection>>,
}

impl AccountManager {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create an account. The email is trimmed and lowercased before the
    /// uniqueness check, so `Ann@Example.com` and `ann@example.com` collide.
    #[instrument(skip(self, name, password))]
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = normalise_email(email);
        if name.is_empty() {
            return Err(UserError::InvalidInput("name is required".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(UserError::InvalidInput("a valid email is required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let conn = self.conn();
        if find_by_email(&conn, &email)?.is_some() {
            return Err(UserError::AlreadyExists(email));
        }

        let password_hash = hash_password(password)?;
        let now = to_db_timestamp(Utc::now());
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            email,
            created_at: now.clone(),
            updated_at: now,
        };

        match conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user.id, user.name, user.email, password_hash, user.created_at, user.updated_at],
        ) {
            Ok(_) => {}
            // Lost a race with another registration for the same email.
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                return Err(UserError::AlreadyExists(user.email));
            }
            Err(e) => return Err(UserError::DatabaseError(e)),
        }

        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Verify credentials and return the account.
    #[instrument(skip(self, password))]
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = normalise_email(email);
        let conn = self.conn();
        let found = conn.query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            params![email],
            |row| Ok((row_to_user(row)?, row.get::<_, String>(5)?)),
        );
        let (user, stored_hash) = match found {
            Ok(pair) => pair,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(UserError::InvalidCredentials),
            Err(e) => return Err(UserError::DatabaseError(e)),
        };

        if !verify_password(password, &stored_hash) {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(UserError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Load an account by id. Returns None instead of an error when absent
    /// so callers decide whether missing is exceptional in their context.
    pub fn get(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        match conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            row_to_user,
        ) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(UserError::DatabaseError(e)),
        }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        find_by_email(&conn, &normalise_email(email))
    }

    /// Delete an account. Owned rows go with it through ON DELETE CASCADE.
    pub fn delete(&self, user_id: &str) -> Result<()> {
        let conn = self.conn();
        let n = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if n == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }
        info!(user_id, "account deleted");
        Ok(())
    }
}

fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    match conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        row_to_user,
    ) {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(UserError::DatabaseError(e)),
    }
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// argon2id with a fresh random salt, encoded as a PHC string.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("stored password hash is malformed: {e}");
            false
        }
    }
}
