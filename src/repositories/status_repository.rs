// src/repositories/status_repository.rs
//
// Status Repository
//
// The store behind the status cache. Three batch primitives and nothing else:
// - fetch rows for a key set
// - insert rows, silently skipping keys that already exist
// - set one flag on a key set
//
// Decoding is NOT done here: rows come back raw and the domain decides
// whether they are usable.

use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Row};
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::ConnectionPool;
use crate::domain::{StatusFlag, StatusRow};
use crate::error::AppResult;

/// Keeps every statement under SQLite's bound-parameter limit
const MAX_BATCH_PARAMETERS: usize = 500;

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
#[cfg_attr(test, mockall::automock)]
pub trait StatusRepository: Send + Sync {
    /// Rows for the given ids. Unknown ids yield nothing; order is unspecified.
    fn fetch_rows_by_key(&self, article_ids: &HashSet<String>) -> AppResult<Vec<StatusRow>>;

    /// Insert rows; a row whose article id already exists is skipped.
    /// Returns the ids of the rows actually written.
    fn insert_rows_ignore_conflict(&self, rows: &[StatusRow]) -> AppResult<Vec<String>>;

    /// Set `flag = value` on every row whose id is in `article_ids`.
    fn update_rows(
        &self,
        value: bool,
        flag: &StatusFlag,
        article_ids: &HashSet<String>,
    ) -> AppResult<()>;

    fn count(&self) -> AppResult<usize>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
pub struct SqliteStatusRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteStatusRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_status_row(row: &Row) -> rusqlite::Result<StatusRow> {
        Ok(StatusRow {
            article_id: text_column(row, 0)?,
            date_arrived: text_column(row, 1)?,
            flags: text_column(row, 2)?,
        })
    }
}

/// Text value of a column, or None when it is NULL or not text
fn text_column(row: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(row.get_ref(idx)?.as_str().ok().map(str::to_string))
}

/// "?first, ?first+1, ..." for `count` parameters
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("?{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

impl StatusRepository for SqliteStatusRepository {
    fn fetch_rows_by_key(&self, article_ids: &HashSet<String>) -> AppResult<Vec<StatusRow>> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.pool.get()?;
        let ids: Vec<&String> = article_ids.iter().collect();
        let mut rows = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_BATCH_PARAMETERS) {
            let sql = format!(
                "SELECT article_id, date_arrived, flags FROM statuses WHERE article_id IN ({})",
                placeholders(1, chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let chunk_rows = stmt
                .query_map(params_from_iter(chunk.iter().copied()), Self::row_to_status_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.extend(chunk_rows);
        }

        Ok(rows)
    }

    fn insert_rows_ignore_conflict(&self, rows: &[StatusRow]) -> AppResult<Vec<String>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO statuses (article_id, date_arrived, flags)
                 VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                let written = stmt.execute(params![
                    row.article_id,
                    row.date_arrived,
                    row.flags.as_deref().unwrap_or("{}"),
                ])?;
                if written > 0 {
                    if let Some(article_id) = &row.article_id {
                        inserted.push(article_id.clone());
                    }
                }
            }
        }
        tx.commit()?;

        log::debug!(
            "Inserted {} of {} status rows ({} already present)",
            inserted.len(),
            rows.len(),
            rows.len() - inserted.len()
        );
        Ok(inserted)
    }

    fn update_rows(
        &self,
        value: bool,
        flag: &StatusFlag,
        article_ids: &HashSet<String>,
    ) -> AppResult<()> {
        if article_ids.is_empty() {
            return Ok(());
        }

        // Flag names are validated identifiers, safe inside a JSON path
        let path = format!("$.{}", flag.as_str());
        let json_value = if value { "true" } else { "false" };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let ids: Vec<&String> = article_ids.iter().collect();

        let mut updated = 0;

        for chunk in ids.chunks(MAX_BATCH_PARAMETERS) {
            // A flags column that is not a JSON object is replaced, never allowed
            // to fail the statement for the whole chunk
            let sql = format!(
                "UPDATE statuses SET flags = json_set(
                     CASE WHEN json_valid(flags)
                          THEN CASE WHEN json_type(flags) = 'object' THEN flags ELSE '{{}}' END
                          ELSE '{{}}' END,
                     ?1, json(?2))
                 WHERE article_id IN ({})",
                placeholders(3, chunk.len())
            );
            let mut values: Vec<&dyn ToSql> = vec![&path, &json_value];
            values.extend(chunk.iter().map(|id| *id as &dyn ToSql));
            updated += tx.execute(&sql, values.as_slice())?;
        }
        tx.commit()?;

        if updated != ids.len() {
            log::warn!(
                "Set {} on {} of {} status rows (the rest are not stored)",
                flag,
                updated,
                ids.len()
            );
        }

        Ok(())
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM statuses", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
