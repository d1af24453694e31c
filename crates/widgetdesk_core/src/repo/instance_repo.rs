//! Widget placement repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist placements (page, position, widget class) and their overlays.
//! - Serve the `load`/`save` contract the widget core consumes.
//!
//! # Invariants
//! - `save` replaces the stored overlay of one placement atomically.
//! - Deleting a placement removes its overlay rows (cascade).
//! - New placements are appended after the last position of their page.

use crate::db::DbError;
use crate::widget::instance::{Overlay, WidgetInstance};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Placement persistence errors.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(String),
    InvalidInput(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "widget instance not found: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid placement input: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidInput(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store contract for widget placements.
pub trait WidgetInstanceRepository {
    /// Places a widget on a page and returns the assigned instance id.
    fn create_instance(&self, page: &str, widget_class_name: &str) -> RepoResult<String>;
    fn load(&self, instance_id: &str) -> RepoResult<Option<WidgetInstance>>;
    /// Replaces the stored overlay of an existing placement.
    fn save(&self, instance_id: &str, overlay: &Overlay) -> RepoResult<()>;
    fn delete_instance(&self, instance_id: &str) -> RepoResult<()>;
    /// Lists placements of one page ordered by position.
    fn list_page(&self, page: &str) -> RepoResult<Vec<WidgetInstance>>;
}

/// SQLite-backed placement repository.
pub struct SqliteWidgetInstanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWidgetInstanceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_overlay(&self, instance_id: &str) -> RepoResult<Overlay> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value
             FROM widget_settings
             WHERE instance_id = ?1
             ORDER BY key ASC;",
        )?;
        let rows = stmt.query_map([instance_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut overlay = Overlay::new();
        for row in rows {
            let (key, value) = row?;
            overlay.insert(key, value);
        }
        Ok(overlay)
    }
}

impl WidgetInstanceRepository for SqliteWidgetInstanceRepository<'_> {
    fn create_instance(&self, page: &str, widget_class_name: &str) -> RepoResult<String> {
        let page = page.trim();
        if page.is_empty() {
            return Err(RepoError::InvalidInput("page must not be empty".to_string()));
        }
        let widget_class_name = widget_class_name.trim();
        if widget_class_name.is_empty() {
            return Err(RepoError::InvalidInput(
                "widget class name must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO widget_instances (id, page, position, widget_class_name)
             VALUES (
                ?1,
                ?2,
                (SELECT COALESCE(MAX(position), -1) + 1 FROM widget_instances WHERE page = ?2),
                ?3
             );",
            params![id, page, widget_class_name],
        )?;

        info!(
            "event=widget_place module=repo status=ok widget={} instance_id={}",
            widget_class_name, id
        );
        Ok(id)
    }

    fn load(&self, instance_id: &str) -> RepoResult<Option<WidgetInstance>> {
        let widget_class_name = self
            .conn
            .query_row(
                "SELECT widget_class_name FROM widget_instances WHERE id = ?1;",
                [instance_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(widget_class_name) = widget_class_name else {
            return Ok(None);
        };

        Ok(Some(WidgetInstance {
            id: instance_id.to_string(),
            widget_class_name,
            overlay: self.load_overlay(instance_id)?,
        }))
    }

    fn save(&self, instance_id: &str, overlay: &Overlay) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE widget_instances
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [instance_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(instance_id.to_string()));
        }

        tx.execute(
            "DELETE FROM widget_settings WHERE instance_id = ?1;",
            [instance_id],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO widget_settings (instance_id, key, value) VALUES (?1, ?2, ?3);",
            )?;
            for (key, value) in overlay {
                insert.execute(params![instance_id, key, value])?;
            }
        }
        tx.commit()?;

        info!(
            "event=widget_save module=repo status=ok instance_id={} overlay_keys={}",
            instance_id,
            overlay.len()
        );
        Ok(())
    }

    fn delete_instance(&self, instance_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM widget_instances WHERE id = ?1;", [instance_id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(instance_id.to_string()));
        }
        info!(
            "event=widget_remove module=repo status=ok instance_id={}",
            instance_id
        );
        Ok(())
    }

    fn list_page(&self, page: &str) -> RepoResult<Vec<WidgetInstance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, widget_class_name
             FROM widget_instances
             WHERE page = ?1
             ORDER BY position ASC, id ASC;",
        )?;
        let rows = stmt.query_map([page.trim()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut instances = Vec::new();
        for row in rows {
            let (id, widget_class_name) = row?;
            let overlay = self.load_overlay(&id)?;
            instances.push(WidgetInstance {
                id,
                widget_class_name,
                overlay,
            });
        }
        Ok(instances)
    }
}
