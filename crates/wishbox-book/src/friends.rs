use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, instrument};
use uuid::Uuid;
use wishbox_core::clock::{to_db_date, to_db_timestamp};

use crate::db::{clean_opt, date_col, required};
use crate::error::{BookError, Result};
use crate::types::{Friend, FriendInput, DEFAULT_TIMEZONE};

pub(crate) const FRIEND_COLUMNS: &str = "id, user_id, full_name, nickname, relationship, timezone, \
     birth_date, notes, photo_url, created_at, updated_at";

pub(crate) fn row_to_friend(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friend> {
    Ok(Friend {
        id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        nickname: row.get(3)?,
        relationship: row.get(4)?,
        timezone: row.get(5)?,
        birth_date: date_col(row, 6)?,
        notes: row.get(7)?,
        photo_url: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Load a friend by id on an already-locked connection.
pub(crate) fn load_friend(conn: &Connection, friend_id: &str) -> Result<Option<Friend>> {
    Ok(conn
        .query_row(
            &format!("SELECT {FRIEND_COLUMNS} FROM friends WHERE id = ?1"),
            params![friend_id],
            row_to_friend,
        )
        .optional()?)
}

/// Load a friend that must belong to `owner_id`; anything else is
/// [`BookError::InvalidFriend`]. Used when a wish or card names its friend.
pub(crate) fn owned_friend(conn: &Connection, owner_id: &str, friend_id: &str) -> Result<Friend> {
    match load_friend(conn, friend_id)? {
        Some(f) if f.user_id == owner_id => Ok(f),
        _ => Err(BookError::InvalidFriend(friend_id.to_string())),
    }
}

/// Friends CRUD, scoped to the owning account.
pub struct FriendManager {
    db: Arc<Mutex<Connection>>,
}

impl FriendManager {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[instrument(skip(self, input))]
    pub fn create(&self, owner_id: &str, input: &FriendInput, now: DateTime<Utc>) -> Result<Friend> {
        let full_name = required("full_name", &input.full_name)?;
        let ts = to_db_timestamp(now);
        let friend = Friend {
            id: Uuid::now_v7().to_string(),
            user_id: owner_id.to_string(),
            full_name,
            nickname: clean_opt(input.nickname.as_deref()),
            relationship: clean_opt(input.relationship.as_deref()),
            timezone: clean_opt(input.timezone.as_deref()).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            birth_date: input.birth_date,
            notes: clean_opt(input.notes.as_deref()),
            photo_url: clean_opt(input.photo_url.as_deref()),
            created_at: ts.clone(),
            updated_at: ts,
        };

        self.conn().execute(
            &format!("INSERT INTO friends ({FRIEND_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                friend.id,
                friend.user_id,
                friend.full_name,
                friend.nickname,
                friend.relationship,
                friend.timezone,
                to_db_date(friend.birth_date),
                friend.notes,
                friend.photo_url,
                friend.created_at,
                friend.updated_at,
            ],
        )?;
        info!(friend_id = %friend.id, "friend added");
        Ok(friend)
    }

    /// All of the owner's friends, alphabetical.
    pub fn list(&self, owner_id: &str) -> Result<Vec<Friend>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FRIEND_COLUMNS} FROM friends WHERE user_id = ?1 ORDER BY full_name COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map(params![owner_id], row_to_friend)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Load a friend, enforcing ownership: missing is `NotFound`, another
    /// account's friend is `Forbidden`.
    pub fn get(&self, owner_id: &str, friend_id: &str) -> Result<Friend> {
        let conn = self.conn();
        match load_friend(&conn, friend_id)? {
            None => Err(BookError::NotFound {
                kind: "friend",
                id: friend_id.to_string(),
            }),
            Some(f) if f.user_id != owner_id => Err(BookError::Forbidden {
                kind: "friend",
                id: friend_id.to_string(),
            }),
            Some(f) => Ok(f),
        }
    }

    #[instrument(skip(self, input))]
    pub fn update(&self, owner_id: &str, friend_id: &str, input: &FriendInput, now: DateTime<Utc>) -> Result<Friend> {
        let mut friend = self.get(owner_id, friend_id)?;
        friend.full_name = required("full_name", &input.full_name)?;
        friend.nickname = clean_opt(input.nickname.as_deref());
        friend.relationship = clean_opt(input.relationship.as_deref());
        if let Some(tz) = clean_opt(input.timezone.as_deref()) {
            friend.timezone = tz;
        }
        friend.birth_date = input.birth_date;
        friend.notes = clean_opt(input.notes.as_deref());
        friend.photo_url = clean_opt(input.photo_url.as_deref());
        friend.updated_at = to_db_timestamp(now);

        self.conn().execute(
            "UPDATE friends SET full_name = ?1, nickname = ?2, relationship = ?3, timezone = ?4,
                    birth_date = ?5, notes = ?6, photo_url = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                friend.full_name,
                friend.nickname,
                friend.relationship,
                friend.timezone,
                to_db_date(friend.birth_date),
                friend.notes,
                friend.photo_url,
                friend.updated_at,
                friend.id,
            ],
        )?;
        Ok(friend)
    }

    /// Delete a friend. Their wishes and cards go with them.
    #[instrument(skip(self))]
    pub fn delete(&self, owner_id: &str, friend_id: &str) -> Result<()> {
        self.get(owner_id, friend_id)?;
        self.conn()
            .execute("DELETE FROM friends WHERE id = ?1", params![friend_id])?;
        info!(friend_id, "friend deleted");
        Ok(())
    }
}
