use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{error, info, instrument};
use uuid::Uuid;
use wishbox_core::clock::{parse_db_timestamp, to_db_timestamp};
use wishbox_core::token::generate_token;
use wishbox_core::visibility::evaluate;
use wishbox_core::LeapDayPolicy;
use wishbox_scheduler::{DueWish, DueWishStore, SchedulerError};

use crate::db::{check_owner, clean_opt, date_col, required, ts_col};
use crate::error::{BookError, Result};
use crate::friends::owned_friend;
use crate::types::{Wish, WishInput, WishView};

/// Random bytes in a reveal token (16 URL-safe characters).
const REVEAL_TOKEN_BYTES: usize = 12;

/// Wish columns followed by the friend's name and birth date.
const WISH_SELECT: &str = "SELECT w.id, w.user_id, w.friend_id, w.title, w.body, w.tone, w.image_url, \
     w.is_time_capsule, w.scheduled_for, w.sent_at, w.reveal_token, w.created_at, w.updated_at, \
     f.full_name, f.birth_date \
     FROM wishes w JOIN friends f ON f.id = w.friend_id";

/// A wish with the two friend fields every view needs.
struct WishRow {
    wish: Wish,
    friend_name: String,
    birth_date: NaiveDate,
}

fn row_to_wish(row: &rusqlite::Row<'_>) -> rusqlite::Result<WishRow> {
    let tone: String = row.get(5)?;
    Ok(WishRow {
        wish: Wish {
            id: row.get(0)?,
            user_id: row.get(1)?,
            friend_id: row.get(2)?,
            title: row.get(3)?,
            body: row.get(4)?,
            tone: tone.parse().unwrap_or_default(),
            image_url: row.get(6)?,
            is_time_capsule: row.get(7)?,
            scheduled_for: ts_col(row, 8)?,
            sent_at: ts_col(row, 9)?,
            reveal_token: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        },
        friend_name: row.get(13)?,
        birth_date: date_col(row, 14)?,
    })
}

fn load_wish(conn: &Connection, wish_id: &str) -> Result<Option<WishRow>> {
    Ok(conn
        .query_row(&format!("{WISH_SELECT} WHERE w.id = ?1"), params![wish_id], row_to_wish)
        .optional()?)
}

fn owned_wish(conn: &Connection, owner_id: &str, wish_id: &str) -> Result<WishRow> {
    check_owner(load_wish(conn, wish_id)?, |r| r.wish.user_id.as_str(), owner_id, "wish", wish_id)
}

/// Outcome of the owner's "mark as sent" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSent {
    /// This call set `sent_at`.
    Marked(DateTime<Utc>),
    /// The wish was already sent (manually or by the sweeper); nothing changed.
    AlreadySent(DateTime<Utc>),
}

impl MarkSent {
    pub fn sent_at(&self) -> DateTime<Utc> {
        match *self {
            MarkSent::Marked(at) | MarkSent::AlreadySent(at) => at,
        }
    }
}

/// Wishes: CRUD for the owner, the public reveal lookup, and the storage
/// side of the due-wish sweep.
pub struct WishManager {
    db: Arc<Mutex<Connection>>,
    policy: LeapDayPolicy,
}

impl WishManager {
    pub fn new(db: Arc<Mutex<Connection>>, policy: LeapDayPolicy) -> Self {
        Self { db, policy }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn view(&self, row: WishRow, now: DateTime<Utc>, for_owner: bool) -> WishView {
        let vis = evaluate(row.wish.is_time_capsule, row.birth_date, now, self.policy);
        let w = row.wish;
        WishView {
            id: w.id,
            friend_id: w.friend_id,
            friend_name: row.friend_name,
            title: w.title,
            tone: w.tone,
            image_url: w.image_url,
            body: (!vis.hidden).then_some(w.body),
            is_time_capsule: w.is_time_capsule,
            scheduled_for: w.scheduled_for,
            sent_at: w.sent_at,
            reveal_token: for_owner.then_some(w.reveal_token),
            hidden: vis.hidden,
            is_birthday_today: vis.is_birthday_today,
        }
    }

    #[instrument(skip(self, input), fields(friend_id = %input.friend_id))]
    pub fn create(&self, owner_id: &str, input: &WishInput, now: DateTime<Utc>) -> Result<Wish> {
        let title = required("title", &input.title)?;
        let body = required("body", &input.body)?;
        let conn = self.conn();
        owned_friend(&conn, owner_id, &input.friend_id)?;

        let ts = to_db_timestamp(now);
        let wish = Wish {
            id: Uuid::now_v7().to_string(),
            user_id: owner_id.to_string(),
            friend_id: input.friend_id.clone(),
            title,
            body,
            tone: input.tone,
            image_url: clean_opt(input.image_url.as_deref()),
            is_time_capsule: input.is_time_capsule,
            scheduled_for: input.scheduled_for,
            sent_at: None,
            reveal_token: generate_token(REVEAL_TOKEN_BYTES),
            created_at: ts.clone(),
            updated_at: ts,
        };
        conn.execute(
            "INSERT INTO wishes (id, user_id, friend_id, title, body, tone, image_url, is_time_capsule,
                                 scheduled_for, sent_at, reveal_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?11, ?12)",
            params![
                wish.id,
                wish.user_id,
                wish.friend_id,
                wish.title,
                wish.body,
                wish.tone.to_string(),
                wish.image_url,
                wish.is_time_capsule,
                wish.scheduled_for.map(to_db_timestamp),
                wish.reveal_token,
                wish.created_at,
                wish.updated_at,
            ],
        )?;
        info!(wish_id = %wish.id, scheduled = wish.scheduled_for.is_some(), "wish created");
        Ok(wish)
    }

    /// The owner's wishes, newest first, as seen at `now`.
    pub fn list(&self, owner_id: &str, now: DateTime<Utc>) -> Result<Vec<WishView>> {
        let rows = {
            let conn = self.conn();
            let mut stmt =
                conn.prepare_cached(&format!("{WISH_SELECT} WHERE w.user_id = ?1 ORDER BY w.created_at DESC, w.id DESC"))?;
            let rows = stmt.query_map(params![owner_id], row_to_wish)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows.into_iter().map(|r| self.view(r, now, true)).collect())
    }

    /// Wishes for one of the owner's friends, newest first.
    pub fn list_for_friend(&self, owner_id: &str, friend_id: &str, now: DateTime<Utc>) -> Result<Vec<WishView>> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare_cached(&format!(
                "{WISH_SELECT} WHERE w.user_id = ?1 AND w.friend_id = ?2 ORDER BY w.created_at DESC, w.id DESC"
            ))?;
            let rows = stmt.query_map(params![owner_id, friend_id], row_to_wish)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows.into_iter().map(|r| self.view(r, now, true)).collect())
    }

    /// The stored record, unredacted. For edit forms.
    pub fn get(&self, owner_id: &str, wish_id: &str) -> Result<Wish> {
        let conn = self.conn();
        Ok(owned_wish(&conn, owner_id, wish_id)?.wish)
    }

    /// The owner's view of one wish, with the body withheld while sealed.
    pub fn view_for_owner(&self, owner_id: &str, wish_id: &str, now: DateTime<Utc>) -> Result<WishView> {
        let row = {
            let conn = self.conn();
            owned_wish(&conn, owner_id, wish_id)?
        };
        Ok(self.view(row, now, true))
    }

    /// Public lookup by reveal token. The token is the only credential.
    pub fn reveal(&self, token: &str, now: DateTime<Utc>) -> Result<WishView> {
        let found = self
            .conn()
            .query_row(&format!("{WISH_SELECT} WHERE w.reveal_token = ?1"), params![token], row_to_wish)
            .optional()?;
        let row = found.ok_or_else(|| BookError::NotFound {
            kind: "wish",
            id: token.to_string(),
        })?;
        Ok(self.view(row, now, false))
    }

    /// Replace the editable fields. `sent_at` and the reveal token are kept.
    #[instrument(skip(self, input))]
    pub fn update(&self, owner_id: &str, wish_id: &str, input: &WishInput, now: DateTime<Utc>) -> Result<Wish> {
        let title = required("title", &input.title)?;
        let body = required("body", &input.body)?;
        let conn = self.conn();
        let mut wish = owned_wish(&conn, owner_id, wish_id)?.wish;
        owned_friend(&conn, owner_id, &input.friend_id)?;

        wish.friend_id = input.friend_id.clone();
        wish.title = title;
        wish.body = body;
        wish.tone = input.tone;
        wish.image_url = clean_opt(input.image_url.as_deref());
        wish.is_time_capsule = input.is_time_capsule;
        wish.scheduled_for = input.scheduled_for;
        wish.updated_at = to_db_timestamp(now);

        conn.execute(
            "UPDATE wishes SET friend_id = ?1, title = ?2, body = ?3, tone = ?4, image_url = ?5,
                    is_time_capsule = ?6, scheduled_for = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                wish.friend_id,
                wish.title,
                wish.body,
                wish.tone.to_string(),
                wish.image_url,
                wish.is_time_capsule,
                wish.scheduled_for.map(to_db_timestamp),
                wish.updated_at,
                wish.id,
            ],
        )?;
        Ok(wish)
    }

    pub fn delete(&self, owner_id: &str, wish_id: &str) -> Result<()> {
        let conn = self.conn();
        owned_wish(&conn, owner_id, wish_id)?;
        conn.execute("DELETE FROM wishes WHERE id = ?1", params![wish_id])?;
        info!(wish_id, "wish deleted");
        Ok(())
    }

    /// Owner-initiated "mark as sent".
    ///
    /// Shares the `sent_at IS NULL` guard with the sweeper and runs in an
    /// IMMEDIATE transaction, so whichever writer commits first sets the
    /// timestamp and the other changes nothing.
    #[instrument(skip(self))]
    pub fn mark_sent(&self, owner_id: &str, wish_id: &str, now: DateTime<Utc>) -> Result<MarkSent> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let wish = owned_wish(&tx, owner_id, wish_id)?.wish;
        if let Some(at) = wish.sent_at {
            return Ok(MarkSent::AlreadySent(at));
        }
        tx.execute(
            "UPDATE wishes SET sent_at = ?1, updated_at = ?1 WHERE id = ?2 AND sent_at IS NULL",
            params![to_db_timestamp(now), wish_id],
        )?;
        tx.commit()?;
        info!(wish_id, "wish marked sent");
        Ok(MarkSent::Marked(now))
    }

    pub fn count(&self, owner_id: &str) -> Result<usize> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM wishes WHERE user_id = ?1", params![owner_id], |r| r.get(0))?;
        Ok(n as usize)
    }

    fn query_due(&self, now: DateTime<Utc>) -> rusqlite::Result<Vec<DueWish>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, friend_id, title, scheduled_for FROM wishes
             WHERE scheduled_for IS NOT NULL AND sent_at IS NULL AND scheduled_for <= ?1",
        )?;
        let rows = stmt.query_map(params![to_db_timestamp(now)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut due = Vec::new();
        for row in rows {
            let (id, user_id, friend_id, title, raw) = row?;
            match parse_db_timestamp(&raw) {
                Ok(scheduled_for) => due.push(DueWish {
                    id,
                    user_id,
                    friend_id,
                    title,
                    scheduled_for,
                }),
                Err(e) => error!(wish_id = %id, scheduled_for = %raw, "unparsable scheduled_for, skipping: {e}"),
            }
        }
        Ok(due)
    }

    fn commit_sent(&self, wish_ids: &[String], now: DateTime<Utc>) -> rusqlite::Result<Vec<String>> {
        let ts = to_db_timestamp(now);
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut changed = Vec::with_capacity(wish_ids.len());
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE wishes SET sent_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND sent_at IS NULL
                   AND scheduled_for IS NOT NULL AND scheduled_for <= ?1",
            )?;
            for id in wish_ids {
                if stmt.execute(params![ts, id])? == 1 {
                    changed.push(id.clone());
                }
            }
        }
        tx.commit()?;
        Ok(changed)
    }
}

impl DueWishStore for WishManager {
    fn due_wishes(&self, now: DateTime<Utc>) -> wishbox_scheduler::Result<Vec<DueWish>> {
        self.query_due(now).map_err(SchedulerError::store)
    }

    /// One IMMEDIATE transaction for the whole batch; any failure rolls
    /// every row back.
    fn mark_batch_sent(&self, wish_ids: &[String], now: DateTime<Utc>) -> wishbox_scheduler::Result<Vec<String>> {
        self.commit_sent(wish_ids, now).map_err(SchedulerError::store)
    }
}
