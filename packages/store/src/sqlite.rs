//! SQLite-backed template store.
//!
//! Schema:
//! - templates: one row per template, `blocks` as serialized JSON text,
//!   `updated_at` as RFC 3339 text (fixed precision, so it sorts as text)

use crate::{StoreError, TemplateStore};
use chrono::{DateTime, SecondsFormat, Utc};
use mailforge_model::{
    Document, DocumentId, DocumentRecord, DocumentSummary, FieldUpdate, UserId, Visibility,
};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    subject TEXT NOT NULL,
    description TEXT,
    visibility TEXT NOT NULL,
    forked_from TEXT,
    blocks TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const COLUMNS: &str =
    "id, owner, name, category, subject, description, visibility, forked_from, blocks, updated_at";

#[derive(Clone, Debug)]
pub struct SqliteStore {
    /// rusqlite::Connection is !Sync
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a database file, creating the schema if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        tracing::info!(path = %path.display(), "opened template database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_templates_updated ON templates(updated_at)",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }

    /// Write raw blocks text for a row. Used to reproduce damaged data.
    pub fn overwrite_blocks_text(&self, id: &DocumentId, text: &str) -> Result<usize, StoreError> {
        Ok(self.conn()?.execute(
            "UPDATE templates SET blocks = ?1 WHERE id = ?2",
            params![text, id.as_str()],
        )?)
    }

    fn update(
        &self,
        id: &DocumentId,
        owner: Option<&UserId>,
        update: &FieldUpdate,
    ) -> Result<usize, StoreError> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(SqlValue::Text(name.clone()));
        }
        if let Some(category) = &update.category {
            assignments.push("category = ?");
            values.push(SqlValue::Text(category.clone()));
        }
        if let Some(subject) = &update.subject {
            assignments.push("subject = ?");
            values.push(SqlValue::Text(subject.clone()));
        }
        if let Some(description) = &update.description {
            assignments.push("description = ?");
            values.push(match description {
                Some(text) => SqlValue::Text(text.clone()),
                None => SqlValue::Null,
            });
        }
        if let Some(blocks) = &update.blocks {
            assignments.push("blocks = ?");
            values.push(SqlValue::Text(serde_json::to_string(blocks)?));
        }
        if let Some(visibility) = update.visibility {
            assignments.push("visibility = ?");
            values.push(SqlValue::Text(visibility.as_str().to_string()));
        }
        assignments.push("updated_at = ?");
        values.push(SqlValue::Text(timestamp(Utc::now())));

        let mut sql = format!("UPDATE templates SET {} WHERE id = ?", assignments.join(", "));
        values.push(SqlValue::Text(id.as_str().to_string()));
        if let Some(owner) = owner {
            sql.push_str(" AND owner = ?");
            values.push(SqlValue::Text(owner.as_str().to_string()));
        }

        let affected = self.conn()?.execute(&sql, params_from_iter(values.iter()))?;
        tracing::debug!(id = %id, affected, "template update");
        Ok(affected)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    index: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

fn parse_visibility(row: &Row<'_>, index: usize) -> rusqlite::Result<Visibility> {
    let raw: String = row.get(index)?;
    raw.parse().map_err(|e: String| conversion_error(index, e))
}

fn parse_timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: DocumentId::new(row.get::<_, String>(0)?),
        owner: UserId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        category: row.get(3)?,
        subject: row.get(4)?,
        description: row.get(5)?,
        visibility: parse_visibility(row, 6)?,
        forked_from: row.get::<_, Option<String>>(7)?.map(DocumentId::new),
        // Left as text; decoding happens where the caller can report it.
        blocks: Value::String(row.get(8)?),
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentSummary> {
    Ok(DocumentSummary {
        id: DocumentId::new(row.get::<_, String>(0)?),
        owner: UserId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        category: row.get(3)?,
        subject: row.get(4)?,
        visibility: parse_visibility(row, 5)?,
        forked_from: row.get::<_, Option<String>>(6)?.map(DocumentId::new),
        updated_at: parse_timestamp(row, 7)?,
    })
}

impl TemplateStore for SqliteStore {
    fn get_by_id(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM templates WHERE id = ?1", COLUMNS),
                params![id.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_visible_to(&self, requester: &UserId) -> Result<Vec<DocumentSummary>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner, name, category, subject, visibility, forked_from, updated_at
             FROM templates
             WHERE visibility = 'public' OR owner = ?1
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![requester.as_str()], summary_from_row)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    fn insert(&self, document: &Document) -> Result<DocumentId, StoreError> {
        let blocks = serde_json::to_string(&document.blocks)?;
        self.conn()?.execute(
            &format!(
                "INSERT INTO templates ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                COLUMNS
            ),
            params![
                document.id.as_str(),
                document.owner.as_str(),
                document.name,
                document.category,
                document.subject,
                document.description,
                document.visibility.as_str(),
                document.forked_from.as_ref().map(DocumentId::as_str),
                blocks,
                timestamp(document.updated_at),
            ],
        )?;
        tracing::debug!(id = %document.id, owner = %document.owner, "template inserted");
        Ok(document.id.clone())
    }

    fn update_fields(&self, id: &DocumentId, update: &FieldUpdate) -> Result<usize, StoreError> {
        self.update(id, None, update)
    }

    fn update_where_owner(
        &self,
        id: &DocumentId,
        owner: &UserId,
        update: &FieldUpdate,
    ) -> Result<usize, StoreError> {
        self.update(id, Some(owner), update)
    }

    fn delete_where_owner(&self, id: &DocumentId, owner: &UserId) -> Result<usize, StoreError> {
        let affected = self.conn()?.execute(
            "DELETE FROM templates WHERE id = ?1 AND owner = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        tracing::debug!(id = %id, affected, "template delete");
        Ok(affected)
    }
}
