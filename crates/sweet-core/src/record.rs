//! The untyped form of a model: its [`Meta`] plus the remaining serialised
//! fields as a JSON object.
//!
//! Backends persist records; handlers use them to apply partial updates
//! without knowing the concrete model type.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  model::{META_FIELDS, Meta, Model},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
  pub meta: Meta,
  /// Serialised model fields, without the meta keys.
  pub data: Map<String, Value>,
}

impl Record {
  pub fn from_model<T: Model>(model: &T) -> Result<Self> {
    let Value::Object(mut data) = serde_json::to_value(model)? else {
      return Err(Error::NotAnObject(T::NAME.to_owned()));
    };
    let mut meta_obj = Map::new();
    for key in META_FIELDS {
      if let Some(v) = data.remove(key) {
        meta_obj.insert(key.to_owned(), v);
      }
    }
    let meta = serde_json::from_value(Value::Object(meta_obj))?;
    Ok(Self { meta, data })
  }

  pub fn into_model<T: Model>(self) -> Result<T> {
    let Value::Object(meta_obj) = serde_json::to_value(&self.meta)? else {
      return Err(Error::NotAnObject("meta".to_owned()));
    };
    let mut obj = self.data;
    obj.extend(meta_obj);
    Ok(serde_json::from_value(Value::Object(obj))?)
  }

  /// The owner id stored in an ownership column. Missing and `null` are
  /// both `None`.
  pub fn owner_id(&self, column: &str) -> Result<Option<Uuid>> {
    match self.data.get(column) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Uuid::parse_str(s)
        .map(Some)
        .map_err(|_| Error::InvalidField(column.to_owned())),
      Some(_) => Err(Error::InvalidField(column.to_owned())),
    }
  }

  /// Apply a partial update. Identity and timestamps are not caller-editable
  /// and are skipped; `is_deleted` is applied to the meta.
  pub fn merge_patch(&mut self, patch: Map<String, Value>) -> Result<()> {
    for (key, value) in patch {
      match key.as_str() {
        "id" | "created_at" | "updated_at" => {}
        "is_deleted" => {
          self.meta.is_deleted = value
            .as_bool()
            .ok_or_else(|| Error::InvalidField(key.clone()))?;
        }
        _ => {
          self.data.insert(key, value);
        }
      }
    }
    Ok(())
  }
}
