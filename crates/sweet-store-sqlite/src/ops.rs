//! Synchronous row operations run inside a `tokio_rusqlite` call, usually on
//! an open transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};
use sweet_core::cascade::CascadeOps;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{decode_uuid, encode_dt, encode_uuid},
  sql::placeholders,
};

/// Keeps every statement well under SQLite's bound-parameter limit.
const CHUNK: usize = 500;

/// Cascade primitives over a borrowed connection or transaction.
pub struct SqlOps<'c> {
  pub conn: &'c Connection,
}

impl CascadeOps for SqlOps<'_> {
  type Error = Error;

  fn mark_deleted(
    &mut self,
    model: &str,
    ids: &[Uuid],
    at: DateTime<Utc>,
  ) -> Result<usize> {
    let at_str = encode_dt(at);
    let mut touched = 0;
    for chunk in ids.chunks(CHUNK) {
      let sql = format!(
        "UPDATE \"{model}\" SET is_deleted = 1, updated_at = ? WHERE id IN ({})",
        placeholders(chunk.len())
      );
      let params = std::iter::once(SqlValue::Text(at_str.clone()))
        .chain(chunk.iter().map(|id| SqlValue::Text(encode_uuid(*id))));
      touched += self.conn.execute(&sql, params_from_iter(params))?;
    }
    tracing::debug!(model, count = touched, "soft-deleted rows");
    Ok(touched)
  }

  fn dependents(
    &mut self,
    model: &str,
    column: &str,
    owners: &[Uuid],
  ) -> Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for chunk in owners.chunks(CHUNK) {
      let sql = format!(
        "SELECT id FROM \"{model}\" WHERE \"{column}\" IN ({})",
        placeholders(chunk.len())
      );
      let mut stmt = self.conn.prepare(&sql)?;
      let rows = stmt
        .query_map(
          params_from_iter(chunk.iter().map(|id| encode_uuid(*id))),
          |row| row.get::<_, String>(0),
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      for raw in rows {
        ids.push(decode_uuid(&raw)?);
      }
    }
    Ok(ids)
  }
}

/// Physically delete `ids` of `model`. Returns rows removed from `model`
/// itself; descendants go through `ON DELETE CASCADE`.
pub fn delete_ids(conn: &Connection, model: &str, ids: &[Uuid]) -> Result<usize> {
  let mut removed = 0;
  for chunk in ids.chunks(CHUNK) {
    let sql = format!(
      "DELETE FROM \"{model}\" WHERE id IN ({})",
      placeholders(chunk.len())
    );
    removed += conn.execute(
      &sql,
      params_from_iter(chunk.iter().map(|id| encode_uuid(*id))),
    )?;
  }
  Ok(removed)
}
