use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wishbox_core::clock::to_db_timestamp;
use wishbox_core::token::generate_token;
use wishbox_core::visibility::evaluate;
use wishbox_core::LeapDayPolicy;

use crate::db::{check_owner, clean_opt, date_col, required};
use crate::error::{BookError, Result};
use crate::friends::owned_friend;
use crate::types::{CardContribution, CardInput, CardView, ContributionInput, GroupCard};

/// Random bytes in a share slug (14 URL-safe characters).
const SLUG_BYTES: usize = 10;

const CARD_SELECT: &str = "SELECT c.id, c.user_id, c.friend_id, c.title, c.description, c.theme, c.slug, \
     c.is_locked_until_bday, c.created_at, c.updated_at, f.full_name, f.birth_date \
     FROM group_cards c JOIN friends f ON f.id = c.friend_id";

struct CardRow {
    card: GroupCard,
    friend_name: String,
    birth_date: NaiveDate,
}

fn row_to_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<CardRow> {
    let theme: String = row.get(5)?;
    Ok(CardRow {
        card: GroupCard {
            id: row.get(0)?,
            user_id: row.get(1)?,
            friend_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            theme: theme.parse().unwrap_or_default(),
            slug: row.get(6)?,
            is_locked_until_bday: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        },
        friend_name: row.get(10)?,
        birth_date: date_col(row, 11)?,
    })
}

fn row_to_contribution(row: &rusqlite::Row<'_>) -> rusqlite::Result<CardContribution> {
    Ok(CardContribution {
        id: row.get(0)?,
        card_id: row.get(1)?,
        author_name: row.get(2)?,
        message: row.get(3)?,
        reaction: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn load_card(conn: &Connection, clause: &str, key: &str) -> Result<Option<CardRow>> {
    Ok(conn
        .query_row(&format!("{CARD_SELECT} WHERE {clause}"), params![key], row_to_card)
        .optional()?)
}

fn contributions(conn: &Connection, card_id: &str) -> Result<Vec<CardContribution>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, card_id, author_name, message, reaction, created_at
         FROM card_contributions WHERE card_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![card_id], row_to_contribution)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Group cards: the owner's CRUD plus the public share page and its
/// contribution form, both gated by `is_locked_until_bday`.
pub struct CardManager {
    db: Arc<Mutex<Connection>>,
    policy: LeapDayPolicy,
}

impl CardManager {
    pub fn new(db: Arc<Mutex<Connection>>, policy: LeapDayPolicy) -> Self {
        Self { db, policy }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build the reader's view. Existing contributions are withheld while
    /// the card is locked; only their count is disclosed.
    fn view(&self, conn: &Connection, row: CardRow, now: DateTime<Utc>) -> Result<CardView> {
        let vis = evaluate(row.card.is_locked_until_bday, row.birth_date, now, self.policy);
        let all = contributions(conn, &row.card.id)?;
        let contribution_count = all.len();
        Ok(CardView {
            card: row.card,
            friend_name: row.friend_name,
            locked: vis.hidden,
            is_birthday_today: vis.is_birthday_today,
            contribution_count,
            contributions: if vis.hidden { Vec::new() } else { all },
        })
    }

    #[instrument(skip(self, input), fields(friend_id = %input.friend_id))]
    pub fn create(&self, owner_id: &str, input: &CardInput, now: DateTime<Utc>) -> Result<GroupCard> {
        let title = required("title", &input.title)?;
        let conn = self.conn();
        owned_friend(&conn, owner_id, &input.friend_id)?;

        let ts = to_db_timestamp(now);
        let card = GroupCard {
            id: Uuid::now_v7().to_string(),
            user_id: owner_id.to_string(),
            friend_id: input.friend_id.clone(),
            title,
            description: clean_opt(input.description.as_deref()),
            theme: input.theme,
            slug: generate_token(SLUG_BYTES),
            is_locked_until_bday: input.is_locked_until_bday,
            created_at: ts.clone(),
            updated_at: ts,
        };
        conn.execute(
            "INSERT INTO group_cards (id, user_id, friend_id, title, description, theme, slug,
                                      is_locked_until_bday, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                card.id,
                card.user_id,
                card.friend_id,
                card.title,
                card.description,
                card.theme.to_string(),
                card.slug,
                card.is_locked_until_bday,
                card.created_at,
                card.updated_at,
            ],
        )?;
        info!(card_id = %card.id, slug = %card.slug, "card created");
        Ok(card)
    }

    /// The owner's cards, newest first.
    pub fn list(&self, owner_id: &str, now: DateTime<Utc>) -> Result<Vec<CardView>> {
        self.list_where("c.user_id = ?1", &[owner_id], now)
    }

    pub fn list_for_friend(&self, owner_id: &str, friend_id: &str, now: DateTime<Utc>) -> Result<Vec<CardView>> {
        self.list_where("c.user_id = ?1 AND c.friend_id = ?2", &[owner_id, friend_id], now)
    }

    fn list_where(&self, clause: &str, keys: &[&str], now: DateTime<Utc>) -> Result<Vec<CardView>> {
        let conn = self.conn();
        let rows = {
            let mut stmt =
                conn.prepare_cached(&format!("{CARD_SELECT} WHERE {clause} ORDER BY c.created_at DESC, c.id DESC"))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(keys), row_to_card)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(|r| self.view(&conn, r, now)).collect()
    }

    pub fn view_for_owner(&self, owner_id: &str, card_id: &str, now: DateTime<Utc>) -> Result<CardView> {
        let conn = self.conn();
        let row = check_owner(
            load_card(&conn, "c.id = ?1", card_id)?,
            |r| r.card.user_id.as_str(),
            owner_id,
            "card",
            card_id,
        )?;
        self.view(&conn, row, now)
    }

    /// Public share page. The slug is the only credential.
    pub fn view_by_slug(&self, slug: &str, now: DateTime<Utc>) -> Result<CardView> {
        let conn = self.conn();
        let row = load_card(&conn, "c.slug = ?1", slug)?.ok_or_else(|| BookError::NotFound {
            kind: "card",
            id: slug.to_string(),
        })?;
        self.view(&conn, row, now)
    }

    pub fn delete(&self, owner_id: &str, card_id: &str) -> Result<()> {
        let conn = self.conn();
        check_owner(
            load_card(&conn, "c.id = ?1", card_id)?,
            |r| r.card.user_id.as_str(),
            owner_id,
            "card",
            card_id,
        )?;
        conn.execute("DELETE FROM group_cards WHERE id = ?1", params![card_id])?;
        info!(card_id, "card deleted");
        Ok(())
    }

    /// Add a contribution through the public share link.
    ///
    /// The lock check and the insert run in one transaction, so a card
    /// cannot accept a message on the strength of a stale lock state.
    #[instrument(skip(self, input))]
    pub fn add_contribution(
        &self,
        slug: &str,
        input: &ContributionInput,
        now: DateTime<Utc>,
    ) -> Result<CardContribution> {
        let author_name = required("author_name", &input.author_name)?;
        let message = required("message", &input.message)?;

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = load_card(&tx, "c.slug = ?1", slug)?.ok_or_else(|| BookError::NotFound {
            kind: "card",
            id: slug.to_string(),
        })?;
        if evaluate(row.card.is_locked_until_bday, row.birth_date, now, self.policy).hidden {
            warn!(slug, "contribution rejected: card locked until birthday");
            return Err(BookError::CardLocked { slug: slug.to_string() });
        }

        let contribution = CardContribution {
            id: Uuid::now_v7().to_string(),
            card_id: row.card.id,
            author_name,
            message,
            reaction: clean_opt(input.reaction.as_deref()),
            created_at: to_db_timestamp(now),
        };
        tx.execute(
            "INSERT INTO card_contributions (id, card_id, author_name, message, reaction, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                contribution.id,
                contribution.card_id,
                contribution.author_name,
                contribution.message,
                contribution.reaction,
                contribution.created_at,
            ],
        )?;
        tx.commit()?;
        info!(card_id = %contribution.card_id, "contribution added");
        Ok(contribution)
    }

    pub fn count(&self, owner_id: &str) -> Result<usize> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM group_cards WHERE user_id = ?1",
            params![owner_id],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }
}
