use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{types::Type, Connection};
use wishbox_core::clock::{parse_db_date, parse_db_timestamp};

use crate::error::Result;

/// How long a connection waits on another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection with the pragmas every connection needs.
///
/// `foreign_keys` is per-connection in SQLite, so it is set here rather than
/// once at startup.
pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Initialise the book tables. Safe to call on every startup: uses
/// `IF NOT EXISTS` throughout. Expects the `users` table to exist.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS friends (
            id           TEXT PRIMARY KEY NOT NULL,
            user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            full_name    TEXT NOT NULL,
            nickname     TEXT,
            relationship TEXT,
            timezone     TEXT NOT NULL DEFAULT 'Europe/Dublin',
            birth_date   TEXT NOT NULL,          -- YYYY-MM-DD
            notes        TEXT,
            photo_url    TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_friends_user ON friends (user_id, full_name);

        CREATE TABLE IF NOT EXISTS wish_templates (
            id         TEXT PRIMARY KEY NOT NULL,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title      TEXT NOT NULL,
            tone       TEXT NOT NULL DEFAULT 'warm',
            body       TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wishes (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            friend_id       TEXT NOT NULL REFERENCES friends(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            body            TEXT NOT NULL,
            tone            TEXT NOT NULL DEFAULT 'warm',
            image_url       TEXT,
            is_time_capsule INTEGER NOT NULL DEFAULT 0,
            scheduled_for   TEXT,                -- fixed-width RFC 3339 UTC or NULL
            sent_at         TEXT,                -- set once, never cleared
            reveal_token    TEXT NOT NULL UNIQUE,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_wishes_user ON wishes (user_id, created_at DESC);
        -- Sweep query: WHERE sent_at IS NULL AND scheduled_for <= ?
        CREATE INDEX IF NOT EXISTS idx_wishes_due ON wishes (sent_at, scheduled_for);

        CREATE TABLE IF NOT EXISTS group_cards (
            id                   TEXT PRIMARY KEY NOT NULL,
            user_id              TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            friend_id            TEXT NOT NULL REFERENCES friends(id) ON DELETE CASCADE,
            title                TEXT NOT NULL,
            description          TEXT,
            theme                TEXT NOT NULL DEFAULT 'cloud',
            slug                 TEXT NOT NULL UNIQUE,
            is_locked_until_bday INTEGER NOT NULL DEFAULT 0,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS card_contributions (
            id          TEXT PRIMARY KEY NOT NULL,
            card_id     TEXT NOT NULL REFERENCES group_cards(id) ON DELETE CASCADE,
            author_name TEXT NOT NULL,
            message     TEXT NOT NULL,
            reaction    TEXT,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_contributions_card
            ON card_contributions (card_id, created_at);",
    )?;
    Ok(())
}

// ── column helpers ───────────────────────────────────────────────────────────

pub(crate) fn date_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_db_date(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn ts_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => parse_db_timestamp(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

/// Trim an optional free-text field, mapping blank to `None`.
pub(crate) fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Trim a required field, rejecting blank input.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(crate::error::BookError::InvalidInput(format!("{field} is required")));
    }
    Ok(v.to_string())
}

/// Resolve an optional row against its owner: missing is `NotFound`, another
/// account's row is `Forbidden`.
pub(crate) fn check_owner<T>(
    found: Option<T>,
    owner_of: impl Fn(&T) -> &str,
    owner_id: &str,
    kind: &'static str,
    id: &str,
) -> Result<T> {
    use crate::error::BookError;
    match found {
        None => Err(BookError::NotFound { kind, id: id.to_string() }),
        Some(row) if owner_of(&row) != owner_id => Err(BookError::Forbidden { kind, id: id.to_string() }),
        Some(row) => Ok(row),
    }
}
