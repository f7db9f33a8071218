//! The cascading soft delete.
//!
//! Given a set of rows of one model, every dependent registered in the
//! [`Schema`] is fetched and soft-deleted in turn, level by level, until no
//! new rows are reached. The walk is backend-agnostic: a store supplies the
//! two primitives in [`CascadeOps`], usually bound to one open transaction so
//! the whole cascade commits or rolls back together.
//!
//! Dependents are fetched regardless of their current flag, so repeating a
//! cascade re-marks rows that were restored in between. Each `(model, id)`
//! pair is visited at most once per walk, which bounds the work and makes
//! cyclic ownership terminate.

use std::collections::{BTreeMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::Schema;

/// Storage primitives the cascade is driven by.
pub trait CascadeOps {
  type Error: From<crate::Error>;

  /// Set the flag on `ids` of `model` and refresh their `updated_at` to
  /// `at`. Returns the number of rows touched.
  fn mark_deleted(
    &mut self,
    model: &str,
    ids: &[Uuid],
    at: DateTime<Utc>,
  ) -> Result<usize, Self::Error>;

  /// Ids of `model` rows whose `column` holds one of `owners`.
  fn dependents(
    &mut self,
    model: &str,
    column: &str,
    owners: &[Uuid],
  ) -> Result<Vec<Uuid>, Self::Error>;
}

/// Rows marked by one cascade, per model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
  pub marked: BTreeMap<String, usize>,
}

impl CascadeReport {
  pub fn marked(&self, model: &str) -> usize {
    self.marked.get(model).copied().unwrap_or(0)
  }

  pub fn total(&self) -> usize { self.marked.values().sum() }

  fn record(&mut self, model: &str, count: usize) {
    *self.marked.entry(model.to_owned()).or_default() += count;
  }
}

/// Soft-delete `ids` of `model`, then everything they own.
pub fn soft_delete<O: CascadeOps>(
  ops: &mut O,
  schema: &Schema,
  model: &str,
  ids: &[Uuid],
  at: DateTime<Utc>,
) -> Result<CascadeReport, O::Error> {
  walk(ops, schema, model, ids, at, true)
}

/// Soft-delete everything `ids` of `model` own. The roots themselves are
/// assumed already persisted with the flag set.
pub fn cascade<O: CascadeOps>(
  ops: &mut O,
  schema: &Schema,
  model: &str,
  ids: &[Uuid],
  at: DateTime<Utc>,
) -> Result<CascadeReport, O::Error> {
  walk(ops, schema, model, ids, at, false)
}

fn walk<O: CascadeOps>(
  ops: &mut O,
  schema: &Schema,
  model: &str,
  ids: &[Uuid],
  at: DateTime<Utc>,
  mark_roots: bool,
) -> Result<CascadeReport, O::Error> {
  let root = schema.model(model)?.name;
  let mut report = CascadeReport::default();
  let mut seen: HashSet<(&'static str, Uuid)> = HashSet::new();
  let mut queue = VecDeque::new();

  let roots = unseen(&mut seen, root, ids.iter().copied());
  if !roots.is_empty() {
    queue.push_back((root, roots, mark_roots));
  }

  while let Some((model, ids, mark)) = queue.pop_front() {
    if mark {
      let count = ops.mark_deleted(model, &ids, at)?;
      report.record(model, count);
    }
    for dep in schema.dependents_of(model) {
      let children = ops.dependents(dep.model, dep.column, &ids)?;
      let children = unseen(&mut seen, dep.model, children);
      if !children.is_empty() {
        queue.push_back((dep.model, children, true));
      }
    }
  }

  Ok(report)
}

fn unseen(
  seen: &mut HashSet<(&'static str, Uuid)>,
  model: &'static str,
  ids: impl IntoIterator<Item = Uuid>,
) -> Vec<Uuid> {
  ids.into_iter().filter(|id| seen.insert((model, *id))).collect()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use serde::{Deserialize, Serialize};

  use super::*;
  use crate::model::{Meta, Model, Relation};

  macro_rules! model {
    ($ty:ident, $name:literal, [$($rel:expr),*]) => {
      #[derive(Serialize, Deserialize)]
      struct $ty {
        #[serde(flatten)]
        meta: Meta,
      }

      impl Model for $ty {
        const NAME: &'static str = $name;
        const RELATIONS: &'static [Relation] = &[$($rel),*];

        fn meta(&self) -> &Meta { &self.meta }
        fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
      }
    };
  }

  model!(Parent, "parent", []);
  model!(Child, "child", [Relation::belongs_to("parent", "parent_id")]);
  model!(Grandchild, "grandchild", [Relation::belongs_to("child", "child_id")]);
  model!(Node, "node", [Relation::belongs_to("node", "parent_id")]);

  /// In-memory rows: model → id → (owner column values, deleted flag).
  #[derive(Default)]
  struct Memory {
    rows:    HashMap<&'static str, HashMap<Uuid, (HashMap<&'static str, Uuid>, bool)>>,
    fail_on: Option<&'static str>,
  }

  impl Memory {
    fn insert(&mut self, model: &'static str, id: Uuid, owners: &[(&'static str, Uuid)]) {
      self
        .rows
        .entry(model)
        .or_default()
        .insert(id, (owners.iter().copied().collect(), false));
    }

    fn is_deleted(&self, model: &str, id: Uuid) -> bool { self.rows[model][&id].1 }
  }

  impl CascadeOps for Memory {
    type Error = crate::Error;

    fn mark_deleted(
      &mut self,
      model: &str,
      ids: &[Uuid],
      _at: DateTime<Utc>,
    ) -> Result<usize, Self::Error> {
      if self.fail_on == Some(model) {
        return Err(crate::Error::UnknownModel(model.to_owned()));
      }
      let table = self.rows.get_mut(model).expect("table");
      let mut n = 0;
      for id in ids {
        if let Some(row) = table.get_mut(id) {
          row.1 = true;
          n += 1;
        }
      }
      Ok(n)
    }

    fn dependents(
      &mut self,
      model: &str,
      column: &str,
      owners: &[Uuid],
    ) -> Result<Vec<Uuid>, Self::Error> {
      Ok(
        self
          .rows
          .get(model)
          .into_iter()
          .flatten()
          .filter(|(_, (cols, _))| cols.get(column).is_some_and(|o| owners.contains(o)))
          .map(|(id, _)| *id)
          .collect(),
      )
    }
  }

  fn family() -> Schema {
    Schema::builder()
      .register::<Parent>()
      .register::<Child>()
      .register::<Grandchild>()
      .build()
      .unwrap()
  }

  #[test]
  fn soft_delete_reaches_every_level() {
    let schema = family();
    let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
    let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let g1 = Uuid::new_v4();

    let mut mem = Memory::default();
    mem.insert("parent", p1, &[]);
    mem.insert("parent", p2, &[]);
    mem.insert("child", c1, &[("parent_id", p1)]);
    mem.insert("child", c2, &[("parent_id", p1)]);
    mem.insert("child", c3, &[("parent_id", p2)]);
    mem.insert("grandchild", g1, &[("child_id", c2)]);

    let report = soft_delete(&mut mem, &schema, "parent", &[p1], Utc::now()).unwrap();

    assert!(mem.is_deleted("parent", p1));
    assert!(mem.is_deleted("child", c1));
    assert!(mem.is_deleted("child", c2));
    assert!(mem.is_deleted("grandchild", g1));
    assert!(!mem.is_deleted("parent", p2));
    assert!(!mem.is_deleted("child", c3));

    assert_eq!(report.marked("parent"), 1);
    assert_eq!(report.marked("child"), 2);
    assert_eq!(report.marked("grandchild"), 1);
    assert_eq!(report.total(), 4);
  }

  #[test]
  fn cascade_leaves_roots_to_the_caller() {
    let schema = family();
    let (p, c) = (Uuid::new_v4(), Uuid::new_v4());
    let mut mem = Memory::default();
    mem.insert("parent", p, &[]);
    mem.insert("child", c, &[("parent_id", p)]);

    let report = cascade(&mut mem, &schema, "parent", &[p], Utc::now()).unwrap();

    assert!(!mem.is_deleted("parent", p));
    assert!(mem.is_deleted("child", c));
    assert_eq!(report.marked("parent"), 0);
  }

  #[test]
  fn no_dependents_is_a_no_op() {
    let schema = family();
    let g = Uuid::new_v4();
    let mut mem = Memory::default();
    mem.insert("grandchild", g, &[]);

    let report = cascade(&mut mem, &schema, "grandchild", &[g], Utc::now()).unwrap();
    assert_eq!(report.total(), 0);
  }

  #[test]
  fn cyclic_ownership_terminates() {
    let schema = Schema::builder().register::<Node>().build().unwrap();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut mem = Memory::default();
    mem.insert("node", a, &[("parent_id", b)]);
    mem.insert("node", b, &[("parent_id", a)]);

    let report = soft_delete(&mut mem, &schema, "node", &[a], Utc::now()).unwrap();
    assert!(mem.is_deleted("node", a));
    assert!(mem.is_deleted("node", b));
    assert_eq!(report.marked("node"), 2);
  }

  #[test]
  fn repeated_cascade_is_idempotent() {
    let schema = family();
    let (p, c) = (Uuid::new_v4(), Uuid::new_v4());
    let mut mem = Memory::default();
    mem.insert("parent", p, &[]);
    mem.insert("child", c, &[("parent_id", p)]);

    let first = soft_delete(&mut mem, &schema, "parent", &[p], Utc::now()).unwrap();
    let second = soft_delete(&mut mem, &schema, "parent", &[p], Utc::now()).unwrap();
    assert_eq!(first, second);
    assert!(mem.is_deleted("child", c));
  }

  #[test]
  fn unknown_model_fails() {
    let schema = family();
    let mut mem = Memory::default();
    let err = soft_delete(&mut mem, &schema, "nope", &[Uuid::new_v4()], Utc::now());
    assert!(matches!(err, Err(crate::Error::UnknownModel(_))));
  }

  #[test]
  fn failures_propagate() {
    let schema = family();
    let (p, c) = (Uuid::new_v4(), Uuid::new_v4());
    let mut mem = Memory { fail_on: Some("child"), ..Default::default() };
    mem.insert("parent", p, &[]);
    mem.insert("child", c, &[("parent_id", p)]);

    assert!(soft_delete(&mut mem, &schema, "parent", &[p], Utc::now()).is_err());
  }
}
