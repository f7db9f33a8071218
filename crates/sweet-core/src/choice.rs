//! Choice fields with a human-readable label.
//!
//! A set choice serialises as `{"value": ..., "display_name": ...}` so a
//! client can render the label without its own lookup table; an unset choice
//! serialises as `null`. Deserialisation is unchanged and expects the bare
//! value.
//!
//! ```rust,ignore
//! #[serde(serialize_with = "sweet_core::choice::serialize")]
//! status: Status,
//!
//! #[serde(serialize_with = "sweet_core::choice::option::serialize")]
//! priority: Option<Priority>,
//! ```

use serde::{Serialize, Serializer, ser::SerializeStruct as _};

/// An enumerated value with a display label.
pub trait Choice: Serialize {
  fn display_name(&self) -> &'static str;
}

/// The wire form of a set choice.
pub struct Labelled<'a, T: Choice>(pub &'a T);

impl<T: Choice> Serialize for Labelled<'_, T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Choice", 2)?;
    s.serialize_field("value", self.0)?;
    s.serialize_field("display_name", self.0.display_name())?;
    s.end()
  }
}

pub fn serialize<T: Choice, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
  Labelled(value).serialize(serializer)
}

pub mod option {
  use serde::Serializer;

  use super::{Choice, Labelled};

  pub fn serialize<T: Choice, S: Serializer>(
    value: &Option<T>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(v) => serializer.serialize_some(&Labelled(v)),
      None => serializer.serialize_none(),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde::{Deserialize, Serialize};
  use serde_json::json;

  use super::*;

  #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
  #[serde(rename_all = "snake_case")]
  enum Status {
    Active,
    OnHold,
  }

  impl Choice for Status {
    fn display_name(&self) -> &'static str {
      match self {
        Self::Active => "Active",
        Self::OnHold => "On hold",
      }
    }
  }

  #[derive(Serialize)]
  struct Row {
    #[serde(serialize_with = "serialize")]
    status: Status,
    #[serde(serialize_with = "option::serialize")]
    next:   Option<Status>,
  }

  #[test]
  fn set_value_carries_display_name() {
    let row = Row { status: Status::OnHold, next: Some(Status::Active) };
    assert_eq!(
      serde_json::to_value(&row).unwrap(),
      json!({
        "status": { "value": "on_hold", "display_name": "On hold" },
        "next": { "value": "active", "display_name": "Active" },
      })
    );
  }

  #[test]
  fn unset_value_is_null() {
    let row = Row { status: Status::Active, next: None };
    assert_eq!(serde_json::to_value(&row).unwrap()["next"], json!(null));
  }
}
