//! DailySession persistence

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::{Store, StoreResult};
use crate::domain::{DEFAULT_THEME, DailySession};

const SESSION_COLUMNS: &str = "id, owner, date, palace_theme, is_completed, palace_image";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<DailySession> {
    let date: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(DailySession {
        id: row.get(0)?,
        owner: row.get(1)?,
        date,
        palace_theme: row.get(3)?,
        is_completed: row.get(4)?,
        palace_image: row.get(5)?,
    })
}

impl Store {
    /// Fetch the owner's session for `date`, creating it with the default theme
    pub fn get_or_create_session(&self, owner: &str, date: NaiveDate) -> StoreResult<DailySession> {
        debug!(%owner, %date, "Store::get_or_create_session: called");
        self.conn.execute(
            "INSERT OR IGNORE INTO sessions (owner, date, palace_theme, created_ts) VALUES (?1, ?2, ?3, ?4)",
            params![owner, date.to_string(), DEFAULT_THEME, chrono::Utc::now().timestamp()],
        )?;
        let session = self.conn.query_row(
            &format!("SELECT {} FROM sessions WHERE owner = ?1 AND date = ?2", SESSION_COLUMNS),
            params![owner, date.to_string()],
            session_from_row,
        )?;
        Ok(session)
    }

    /// Fetch the owner's session for `date` without creating one
    pub fn get_session_for(&self, owner: &str, date: NaiveDate) -> StoreResult<Option<DailySession>> {
        debug!(%owner, %date, "Store::get_session_for: called");
        let session = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE owner = ?1 AND date = ?2", SESSION_COLUMNS),
                params![owner, date.to_string()],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    pub fn get_session(&self, id: i64) -> StoreResult<Option<DailySession>> {
        debug!(id, "Store::get_session: called");
        let session = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
                [id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Delete a session and, through the cascade, all of its tasks
    pub fn delete_session(&self, id: i64) -> StoreResult<bool> {
        debug!(id, "Store::delete_session: called");
        Ok(self.conn.execute("DELETE FROM sessions WHERE id = ?1", [id])? > 0)
    }

    pub fn set_session_image(&self, id: i64, path: Option<&str>) -> StoreResult<bool> {
        debug!(id, ?path, "Store::set_session_image: called");
        Ok(self
            .conn
            .execute("UPDATE sessions SET palace_image = ?1 WHERE id = ?2", params![path, id])?
            > 0)
    }

    pub fn set_session_completed(&self, id: i64, completed: bool) -> StoreResult<bool> {
        debug!(id, completed, "Store::set_session_completed: called");
        Ok(self
            .conn
            .execute("UPDATE sessions SET is_completed = ?1 WHERE id = ?2", params![completed, id])?
            > 0)
    }
}
