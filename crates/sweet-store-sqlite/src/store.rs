//! [`SqliteStore`] — the SQLite implementation of [`EntityStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value as SqlValue};
use uuid::Uuid;

use sweet_core::{
  cascade::{self, CascadeReport},
  model::{Meta, Model},
  query::Query,
  record::Record,
  schema::{ModelInfo, Schema},
  store::EntityStore,
};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, decode_dt, decode_uuid, encode_dt, encode_uuid},
  ops::{SqlOps, delete_ids},
  schema::{PRAGMAS, schema_ddl},
  sql::{Clause, page, where_clause},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An entity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection and schema are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  schema: Arc<Schema>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and create a table for every model
  /// in `schema`.
  pub async fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, schema: Arc::new(schema) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(schema: Schema) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, schema: Arc::new(schema) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let ddl = schema_ddl(&self.schema);
    self
      .with_conn(move |conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await
  }

  /// Run `f` on the connection thread, keeping our own error type.
  async fn with_conn<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  fn info(&self, model: &str) -> Result<ModelInfo> {
    Ok(self.schema.model(model)?.clone())
  }

  async fn select<T: Model>(&self, query: &Query) -> Result<Vec<T>> {
    let info = self.info(T::NAME)?;
    let clause = where_clause(&info, query)?;
    let (limit, offset) = page(query)?;

    let raws: Vec<RawRecord> = self
      .with_conn(move |conn| {
        let sql = format!(
          "SELECT {RECORD_COLUMNS} FROM \"{}\" {}
           ORDER BY created_at, id
           LIMIT ? OFFSET ?",
          info.name, clause.sql
        );
        let params = clause
          .params
          .into_iter()
          .chain([SqlValue::Integer(limit), SqlValue::Integer(offset)]);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| Ok(raw.into_record()?.into_model()?))
      .collect()
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run raw SQL; lets tests break the schema underneath the store.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .with_conn(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await
  }
}

// ─── Synchronous helpers ─────────────────────────────────────────────────────

/// Insert `meta`/`data` as a new row, or update the existing row with the
/// same id. Returns the meta as persisted.
fn upsert(
  conn: &Connection,
  info: &ModelInfo,
  mut meta: Meta,
  data: String,
  owners: Vec<(&'static str, Option<String>)>,
  now: DateTime<Utc>,
) -> Result<Meta> {
  let name = info.name;
  let id_str = encode_uuid(meta.id);
  let now_str = encode_dt(now);

  let created: Option<String> = conn
    .query_row(
      &format!("SELECT created_at FROM \"{name}\" WHERE id = ?1"),
      rusqlite::params![id_str],
      |r| r.get(0),
    )
    .optional()?;

  let owner_cols: Vec<&str> = owners.iter().map(|(col, _)| *col).collect();
  let owner_vals = owners
    .into_iter()
    .map(|(_, v)| v.map_or(SqlValue::Null, SqlValue::Text));

  match created {
    Some(created_at) => {
      let sets: String = owner_cols
        .iter()
        .map(|col| format!(", \"{col}\" = ?"))
        .collect();
      let sql = format!(
        "UPDATE \"{name}\" SET updated_at = ?, is_deleted = ?, data = ?{sets} WHERE id = ?"
      );
      let params = [
        SqlValue::Text(now_str),
        SqlValue::Integer(i64::from(meta.is_deleted)),
        SqlValue::Text(data),
      ]
      .into_iter()
      .chain(owner_vals)
      .chain([SqlValue::Text(id_str)]);
      conn.execute(&sql, params_from_iter(params))?;
      meta.created_at = Some(decode_dt(&created_at)?);
    }
    None => {
      let cols: String = owner_cols.iter().map(|col| format!(", \"{col}\"")).collect();
      let marks: String = owner_cols.iter().map(|_| ", ?").collect();
      let sql = format!(
        "INSERT INTO \"{name}\" (id, created_at, updated_at, is_deleted, data{cols})
         VALUES (?, ?, ?, ?, ?{marks})"
      );
      let params = [
        SqlValue::Text(id_str),
        SqlValue::Text(now_str.clone()),
        SqlValue::Text(now_str),
        SqlValue::Integer(i64::from(meta.is_deleted)),
        SqlValue::Text(data),
      ]
      .into_iter()
      .chain(owner_vals);
      conn.execute(&sql, params_from_iter(params))?;
      meta.created_at = Some(now);
    }
  }

  meta.updated_at = Some(now);
  Ok(meta)
}

fn select_ids(conn: &Connection, model: &str, clause: Clause, page: (i64, i64)) -> Result<Vec<Uuid>> {
  let sql = format!(
    "SELECT id FROM \"{model}\" {} ORDER BY created_at, id LIMIT ? OFFSET ?",
    clause.sql
  );
  let params = clause
    .params
    .into_iter()
    .chain([SqlValue::Integer(page.0), SqlValue::Integer(page.1)]);
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(params), |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.iter().map(|s| decode_uuid(s)).collect()
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  type Error = Error;

  fn schema(&self) -> &Schema { &self.schema }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn save<T: Model>(&self, mut entity: T) -> Result<T> {
    let info = self.info(T::NAME)?;
    let record = Record::from_model(&entity)?;
    let owners = info
      .relations
      .iter()
      .map(|rel| Ok((rel.column, record.owner_id(rel.column)?.map(encode_uuid))))
      .collect::<Result<Vec<_>>>()?;
    let data = serde_json::to_string(&record.data)?;
    let meta = record.meta;
    let schema = Arc::clone(&self.schema);
    let now = Utc::now();

    let (meta, report) = self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        let meta = upsert(&tx, &info, meta, data, owners, now)?;
        let report = if meta.is_deleted {
          cascade::cascade(&mut SqlOps { conn: &tx }, &schema, info.name, &[meta.id], now)?
        } else {
          CascadeReport::default()
        };
        tx.commit()?;
        Ok((meta, report))
      })
      .await?;

    tracing::debug!(model = T::NAME, id = %meta.id, is_deleted = meta.is_deleted, "saved");
    if report.total() > 0 {
      tracing::debug!(model = T::NAME, id = %meta.id, cascaded = report.total(), "cascaded soft delete");
    }

    *entity.meta_mut() = meta;
    Ok(entity)
  }

  async fn soft_delete_where<T: Model>(&self, query: &Query) -> Result<CascadeReport> {
    let info = self.info(T::NAME)?;
    let clause = where_clause(&info, query)?;
    let page = page(query)?;
    let schema = Arc::clone(&self.schema);
    let now = Utc::now();

    let report = self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        let ids = select_ids(&tx, info.name, clause, page)?;
        let report = cascade::soft_delete(&mut SqlOps { conn: &tx }, &schema, info.name, &ids, now)?;
        tx.commit()?;
        Ok(report)
      })
      .await?;

    tracing::debug!(model = T::NAME, marked = report.total(), "soft-deleted matching rows");
    Ok(report)
  }

  async fn hard_delete<T: Model>(&self, id: Uuid) -> Result<bool> {
    Ok(self.hard_delete_ids(T::NAME, &[id]).await? > 0)
  }

  async fn hard_delete_where<T: Model>(&self, query: &Query) -> Result<usize> {
    let info = self.info(T::NAME)?;
    let clause = where_clause(&info, query)?;
    let page = page(query)?;

    let removed = self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        let ids = select_ids(&tx, info.name, clause, page)?;
        let removed = delete_ids(&tx, info.name, &ids)?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    tracing::info!(model = T::NAME, removed, "hard-deleted matching rows");
    Ok(removed)
  }

  async fn hard_delete_ids(&self, model: &str, ids: &[Uuid]) -> Result<usize> {
    let info = self.info(model)?;
    let ids = ids.to_vec();

    let removed = self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        let removed = delete_ids(&tx, info.name, &ids)?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    tracing::info!(model, removed, "hard-deleted rows");
    Ok(removed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get<T: Model>(&self, id: Uuid) -> Result<T> {
    self
      .get_or_none(&Query::by_id(id))
      .await?
      .ok_or(Error::NotFound { model: T::NAME, id })
  }

  async fn get_or_none<T: Model>(&self, query: &Query) -> Result<Option<T>> {
    let pair = Query { limit: Some(2), ..query.clone() };
    let mut found: Vec<T> = self.select(&pair).await?;
    match found.len() {
      0 => Ok(None),
      1 => Ok(found.pop()),
      _ => Err(Error::MultipleReturned(T::NAME)),
    }
  }

  async fn list<T: Model>(&self, query: &Query) -> Result<Vec<T>> {
    self.select(query).await
  }

  async fn count<T: Model>(&self, query: &Query) -> Result<usize> {
    let info = self.info(T::NAME)?;
    let clause = where_clause(&info, query)?;

    let n: i64 = self
      .with_conn(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM \"{}\" {}", info.name, clause.sql);
        Ok(conn.query_row(&sql, params_from_iter(clause.params), |r| r.get(0))?)
      })
      .await?;

    Ok(n as usize)
  }
}
