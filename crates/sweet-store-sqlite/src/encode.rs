//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Model fields are stored as compact JSON.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};
use sweet_core::{model::Meta, record::Record};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Filter values ────────────────────────────────────────────────────────────

/// Bind a JSON filter value the way `json_extract` would return it: booleans
/// as integers, strings as text, compound values as their JSON text.
pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or_default()),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read directly from a model table.
pub struct RawRecord {
  pub id:         String,
  pub created_at: String,
  pub updated_at: String,
  pub is_deleted: bool,
  pub data:       String,
}

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "id, created_at, updated_at, is_deleted, data";

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      updated_at: row.get(2)?,
      is_deleted: row.get(3)?,
      data:       row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let data: Map<String, Value> = serde_json::from_str(&self.data)?;
    Ok(Record {
      meta: Meta {
        id:         decode_uuid(&self.id)?,
        created_at: Some(decode_dt(&self.created_at)?),
        updated_at: Some(decode_dt(&self.updated_at)?),
        is_deleted: self.is_deleted,
      },
      data,
    })
  }
}
