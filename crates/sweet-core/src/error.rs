//! Error types for `sweet-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown model: {0:?}")]
  UnknownModel(String),

  #[error("model {model:?} belongs to unregistered owner {owner:?}")]
  UnknownOwner { model: String, owner: String },

  #[error("model {0:?} is registered twice")]
  DuplicateModel(String),

  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  #[error("invalid field: {0:?}")]
  InvalidField(String),

  #[error("expected a JSON object for {0}")]
  NotAnObject(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
