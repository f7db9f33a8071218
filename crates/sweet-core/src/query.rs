//! Query restrictions shared by every store backend.
//!
//! A [`Query`] is a conjunction of [`Filter`]s. Restrictions compose: calling
//! [`Query::existing`] on a query that already filters by a field yields the
//! intersection of both, never a replacement.

use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Id(Uuid),
  /// Matches nothing when empty.
  IdIn(Vec<Uuid>),
  /// Equality on a serialised field (or a meta/ownership column).
  /// `Value::Null` matches missing and null values.
  Eq { field: String, value: Value },
  Deleted(bool),
}

/// Parameters for list, lookup and set-level delete operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
  pub filters: Vec<Filter>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

impl Query {
  /// An unrestricted query over every row, deleted or not.
  pub fn new() -> Self { Self::default() }

  pub fn by_id(id: Uuid) -> Self { Self::new().id(id) }

  pub fn ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
    Self::new().with(Filter::IdIn(ids.into_iter().collect()))
  }

  pub fn id(self, id: Uuid) -> Self { self.with(Filter::Id(id)) }

  /// Restrict to rows whose soft-delete flag is clear.
  pub fn existing(self) -> Self { self.with(Filter::Deleted(false)) }

  /// Restrict to soft-deleted rows.
  pub fn deleted(self) -> Self { self.with(Filter::Deleted(true)) }

  pub fn filter(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.with(Filter::Eq { field: field.into(), value: value.into() })
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn with(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  /// `true` if some filter excludes soft-deleted rows.
  pub fn is_existing_only(&self) -> bool {
    self.filters.iter().any(|f| match f {
      Filter::Deleted(deleted) => !deleted,
      Filter::Eq { field, value } => field == "is_deleted" && value == &Value::Bool(false),
      _ => false,
    })
  }
}
