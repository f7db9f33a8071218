//! Error type for `sweet-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sweet_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("{model} not found: {id}")]
  NotFound { model: &'static str, id: uuid::Uuid },

  /// A single-object lookup matched more than one row.
  #[error("lookup on {0} returned more than one row")]
  MultipleReturned(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
