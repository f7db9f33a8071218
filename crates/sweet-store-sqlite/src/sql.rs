//! `WHERE` clause construction for [`Query`].
//!
//! Field names are validated as plain identifiers before they reach SQL;
//! values are always bound as parameters.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use sweet_core::{
  Error as CoreError,
  model::META_FIELDS,
  query::{Filter, Query},
  schema::{ModelInfo, validate_identifier},
};

use crate::{
  Result,
  encode::{encode_uuid, encode_value},
};

/// A rendered `WHERE ...` (possibly empty) and its bound values.
#[derive(Debug, Default, PartialEq)]
pub struct Clause {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

/// Column expression for a filterable field of `info`.
fn column_expr(info: &ModelInfo, field: &str) -> Result<String> {
  validate_identifier(field).map_err(|_| CoreError::InvalidField(field.to_owned()))?;
  if META_FIELDS.contains(&field) || info.is_relation_column(field) {
    Ok(format!("\"{field}\""))
  } else {
    Ok(format!("json_extract(data, '$.{field}')"))
  }
}

pub fn where_clause(info: &ModelInfo, query: &Query) -> Result<Clause> {
  let mut conds = Vec::new();
  let mut params = Vec::new();

  for filter in &query.filters {
    match filter {
      Filter::Id(id) => {
        conds.push("id = ?".to_owned());
        params.push(SqlValue::Text(encode_uuid(*id)));
      }
      Filter::IdIn(ids) if ids.is_empty() => conds.push("0".to_owned()),
      Filter::IdIn(ids) => {
        conds.push(format!("id IN ({})", placeholders(ids.len())));
        params.extend(ids.iter().map(|id| SqlValue::Text(encode_uuid(*id))));
      }
      Filter::Eq { field, value: Value::Null } => {
        conds.push(format!("{} IS NULL", column_expr(info, field)?));
      }
      Filter::Eq { field, value } => {
        conds.push(format!("{} = ?", column_expr(info, field)?));
        params.push(encode_value(value));
      }
      Filter::Deleted(deleted) => {
        conds.push("is_deleted = ?".to_owned());
        params.push(SqlValue::Integer(i64::from(*deleted)));
      }
    }
  }

  let sql = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  Ok(Clause { sql, params })
}

/// `LIMIT ? OFFSET ?` with SQLite's "no limit" sentinel when unset.
///
/// Counts that do not fit SQLite's signed 64-bit integers are rejected.
pub fn page(query: &Query) -> Result<(i64, i64)> {
  let limit = match query.limit {
    Some(l) => i64::try_from(l).map_err(|_| CoreError::InvalidField("limit".into()))?,
    None => -1,
  };
  let offset =
    i64::try_from(query.offset.unwrap_or(0)).map_err(|_| CoreError::InvalidField("offset".into()))?;
  Ok((limit, offset))
}

pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }
