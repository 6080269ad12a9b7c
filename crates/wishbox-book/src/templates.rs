use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;
use wishbox_core::clock::to_db_timestamp;

use crate::db::required;
use crate::error::{BookError, Result};
use crate::types::{TemplateInput, WishTemplate};

const TEMPLATE_COLUMNS: &str = "id, user_id, title, tone, body, created_at, updated_at";

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<WishTemplate> {
    let tone: String = row.get(3)?;
    Ok(WishTemplate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        tone: tone.parse().unwrap_or_default(),
        body: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Reusable wish texts. A template pre-fills a new wish's title, tone and
/// body; nothing links the two afterwards.
pub struct TemplateManager {
    db: Arc<Mutex<Connection>>,
}

impl TemplateManager {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create(&self, owner_id: &str, input: &TemplateInput, now: DateTime<Utc>) -> Result<WishTemplate> {
        let ts = to_db_timestamp(now);
        let template = WishTemplate {
            id: Uuid::now_v7().to_string(),
            user_id: owner_id.to_string(),
            title: required("title", &input.title)?,
            tone: input.tone,
            body: required("body", &input.body)?,
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.conn().execute(
            &format!("INSERT INTO wish_templates ({TEMPLATE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                template.id,
                template.user_id,
                template.title,
                template.tone.to_string(),
                template.body,
                template.created_at,
                template.updated_at,
            ],
        )?;
        info!(template_id = %template.id, "template created");
        Ok(template)
    }

    /// Newest first.
    pub fn list(&self, owner_id: &str) -> Result<Vec<WishTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM wish_templates WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id], row_to_template)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(&self, owner_id: &str, template_id: &str) -> Result<WishTemplate> {
        let found = self
            .conn()
            .query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM wish_templates WHERE id = ?1"),
                params![template_id],
                row_to_template,
            )
            .optional()?;
        match found {
            None => Err(BookError::NotFound {
                kind: "template",
                id: template_id.to_string(),
            }),
            Some(t) if t.user_id != owner_id => Err(BookError::Forbidden {
                kind: "template",
                id: template_id.to_string(),
            }),
            Some(t) => Ok(t),
        }
    }

    pub fn update(
        &self,
        owner_id: &str,
        template_id: &str,
        input: &TemplateInput,
        now: DateTime<Utc>,
    ) -> Result<WishTemplate> {
        let mut template = self.get(owner_id, template_id)?;
        template.title = required("title", &input.title)?;
        template.tone = input.tone;
        template.body = required("body", &input.body)?;
        template.updated_at = to_db_timestamp(now);
        self.conn().execute(
            "UPDATE wish_templates SET title = ?1, tone = ?2, body = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                template.title,
                template.tone.to_string(),
                template.body,
                template.updated_at,
                template.id,
            ],
        )?;
        Ok(template)
    }

    pub fn delete(&self, owner_id: &str, template_id: &str) -> Result<()> {
        self.get(owner_id, template_id)?;
        self.conn()
            .execute("DELETE FROM wish_templates WHERE id = ?1", params![template_id])?;
        Ok(())
    }
}
