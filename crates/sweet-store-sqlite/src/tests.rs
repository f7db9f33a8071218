//! Integration tests for `SqliteStore` against an in-memory database.

use serde::{Deserialize, Serialize};
use sweet_core::{
  Error as CoreError,
  model::{Meta, Model, Relation},
  query::Query,
  schema::Schema,
  store::EntityStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Project {
  #[serde(flatten)]
  meta:   Meta,
  name:   String,
  status: String,
}

impl Model for Project {
  const NAME: &'static str = "project";
  const VERBOSE_NAME_PLURAL: &'static str = "projects";

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Task {
  #[serde(flatten)]
  meta:       Meta,
  project_id: Uuid,
  title:      String,
  done:       bool,
}

impl Model for Task {
  const NAME: &'static str = "task";
  const RELATIONS: &'static [Relation] = &[Relation::belongs_to("project", "project_id")];

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Comment {
  #[serde(flatten)]
  meta:    Meta,
  task_id: Uuid,
  body:    String,
}

impl Model for Comment {
  const NAME: &'static str = "comment";
  const RELATIONS: &'static [Relation] = &[Relation::belongs_to("task", "task_id")];

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

/// An optional owner: unowned labels are never reached by a cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Label {
  #[serde(flatten)]
  meta:       Meta,
  project_id: Option<Uuid>,
  text:       String,
}

impl Model for Label {
  const NAME: &'static str = "label";
  const RELATIONS: &'static [Relation] = &[Relation::belongs_to("project", "project_id")];

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

/// Never registered with the store's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stranger {
  #[serde(flatten)]
  meta: Meta,
}

impl Model for Stranger {
  const NAME: &'static str = "stranger";

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

async fn store() -> SqliteStore {
  let schema = Schema::builder()
    .register::<Project>()
    .register::<Task>()
    .register::<Comment>()
    .register::<Label>()
    .build()
    .expect("schema");
  SqliteStore::open_in_memory(schema)
    .await
    .expect("in-memory store")
}

fn project(name: &str, status: &str) -> Project {
  Project { meta: Meta::new(), name: name.into(), status: status.into() }
}

fn task(project_id: Uuid, title: &str) -> Task {
  Task { meta: Meta::new(), project_id, title: title.into(), done: false }
}

fn comment(task_id: Uuid) -> Comment {
  Comment { meta: Meta::new(), task_id, body: "looks good".into() }
}

/// A saved project owning two saved tasks.
async fn family(s: &SqliteStore) -> (Project, Task, Task) {
  let p = s.save(project("Apollo", "active")).await.unwrap();
  let c1 = s.save(task(p.meta.id, "one")).await.unwrap();
  let c2 = s.save(task(p.meta.id, "two")).await.unwrap();
  (p, c1, c2)
}

// ─── Identity & timestamps ───────────────────────────────────────────────────

#[tokio::test]
async fn first_save_stamps_equal_timestamps() {
  let s = store().await;
  let unsaved = project("Apollo", "active");
  let id = unsaved.meta.id;

  let saved = s.save(unsaved).await.unwrap();
  assert_eq!(saved.meta.id, id);
  assert!(saved.meta.created_at.is_some());
  assert_eq!(saved.meta.created_at, saved.meta.updated_at);
  assert!(!saved.meta.is_deleted);

  let fetched: Project = s.get(id).await.unwrap();
  assert_eq!(fetched, saved);
}

#[tokio::test]
async fn later_saves_keep_created_at_and_refresh_updated_at() {
  let s = store().await;
  let mut p = s.save(project("Apollo", "active")).await.unwrap();
  let created = p.meta.created_at;

  p.name = "Gemini".into();
  // A caller cannot rewrite the creation stamp.
  p.meta.created_at = None;
  let p = s.save(p).await.unwrap();

  assert_eq!(p.meta.created_at, created);
  assert!(p.meta.updated_at >= created);

  let fetched: Project = s.get(p.meta.id).await.unwrap();
  assert_eq!(fetched.name, "Gemini");
  assert_eq!(fetched.meta.created_at, created);
}

#[tokio::test]
async fn caller_supplied_id_is_kept() {
  let s = store().await;
  let id = Uuid::new_v4();
  let p = Project { meta: Meta::with_id(id), name: "Fixed".into(), status: "active".into() };
  s.save(p).await.unwrap();

  let fetched: Project = s.get(id).await.unwrap();
  assert_eq!(fetched.meta.id, id);
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_or_none_finds_or_returns_none() {
  let s = store().await;
  let p = s.save(project("Apollo", "active")).await.unwrap();

  let found: Option<Project> = s.get_or_none(&Query::by_id(p.meta.id)).await.unwrap();
  assert_eq!(found.map(|p| p.meta.id), Some(p.meta.id));

  let missing: Option<Project> = s.get_or_none(&Query::by_id(Uuid::new_v4())).await.unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn get_or_none_by_field() {
  let s = store().await;
  s.save(project("Apollo", "active")).await.unwrap();
  s.save(project("Gemini", "archived")).await.unwrap();

  let found: Option<Project> = s
    .get_or_none(&Query::new().filter("name", "Gemini"))
    .await
    .unwrap();
  assert_eq!(found.unwrap().status, "archived");
}

#[tokio::test]
async fn get_or_none_with_several_matches_is_an_error() {
  let s = store().await;
  s.save(project("Apollo", "active")).await.unwrap();
  s.save(project("Gemini", "active")).await.unwrap();

  let result = s
    .get_or_none::<Project>(&Query::new().filter("status", "active"))
    .await;
  assert!(matches!(result, Err(Error::MultipleReturned("project"))));
}

#[tokio::test]
async fn get_missing_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let result = s.get::<Project>(id).await;
  assert!(matches!(result, Err(Error::NotFound { model: "project", id: e }) if e == id));
}

// ─── Existing-only queries ───────────────────────────────────────────────────

#[tokio::test]
async fn existing_composes_with_field_filters() {
  let s = store().await;
  let a = s.save(project("A", "active")).await.unwrap();
  let b = s.save(project("B", "active")).await.unwrap();
  s.save(project("C", "archived")).await.unwrap();
  s.mark_deleted(b).await.unwrap();

  let active: Vec<Project> = s
    .list(&Query::new().filter("status", "active").existing())
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].meta.id, a.meta.id);

  // Without the restriction the deleted row is still stored.
  let all_active: Vec<Project> = s
    .list(&Query::new().filter("status", "active"))
    .await
    .unwrap();
  assert_eq!(all_active.len(), 2);
}

#[tokio::test]
async fn boolean_fields_are_filterable() {
  let s = store().await;
  let p = s.save(project("A", "active")).await.unwrap();
  let mut t = task(p.meta.id, "done");
  t.done = true;
  s.save(t).await.unwrap();
  s.save(task(p.meta.id, "open")).await.unwrap();

  let done: Vec<Task> = s.list(&Query::new().filter("done", true)).await.unwrap();
  assert_eq!(done.len(), 1);
  assert_eq!(done[0].title, "done");
}

#[tokio::test]
async fn list_pages_in_creation_order() {
  let s = store().await;
  for name in ["a", "b", "c", "d"] {
    s.save(project(name, "active")).await.unwrap();
  }

  let page: Vec<Project> = s.list(&Query::new().limit(2).offset(1)).await.unwrap();
  let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, ["b", "c"]);
  assert_eq!(s.count::<Project>(&Query::new()).await.unwrap(), 4);
}

#[tokio::test]
async fn invalid_filter_field_is_rejected() {
  let s = store().await;
  let result = s
    .list::<Project>(&Query::new().filter("name') OR 1=1 --", "x"))
    .await;
  assert!(matches!(result, Err(Error::Core(CoreError::InvalidField(_)))));
}

// ─── Soft delete & cascade ───────────────────────────────────────────────────

#[tokio::test]
async fn mark_deleted_sets_flag_and_hides_from_existing() {
  let s = store().await;
  let p = s.save(project("Apollo", "active")).await.unwrap();
  let id = p.meta.id;

  let p = s.mark_deleted(p).await.unwrap();
  assert!(p.meta.is_deleted);

  let hidden: Option<Project> = s.get_or_none(&Query::by_id(id).existing()).await.unwrap();
  assert!(hidden.is_none());

  // Still physically present.
  let stored: Project = s.get(id).await.unwrap();
  assert!(stored.meta.is_deleted);
}

#[tokio::test]
async fn deleting_parent_cascades_to_children() {
  let s = store().await;
  let (p, c1, c2) = family(&s).await;

  s.mark_deleted(p.clone()).await.unwrap();

  for id in [c1.meta.id, c2.meta.id] {
    let child: Task = s.get(id).await.unwrap();
    assert!(child.meta.is_deleted);
  }
  let existing: Vec<Task> = s
    .list(&Query::new().filter("project_id", p.meta.id.to_string()).existing())
    .await
    .unwrap();
  assert!(existing.is_empty());
}

#[tokio::test]
async fn cascade_refreshes_child_updated_at() {
  let s = store().await;
  let (p, c1, _) = family(&s).await;

  let p = s.mark_deleted(p).await.unwrap();
  let child: Task = s.get(c1.meta.id).await.unwrap();
  assert_eq!(child.meta.updated_at, p.meta.updated_at);
  assert_eq!(child.meta.created_at, c1.meta.created_at);
}

#[tokio::test]
async fn cascade_reaches_grandchildren() {
  let s = store().await;
  let (p, c1, _) = family(&s).await;
  let g = s.save(comment(c1.meta.id)).await.unwrap();

  s.mark_deleted(p).await.unwrap();

  let g: Comment = s.get(g.meta.id).await.unwrap();
  assert!(g.meta.is_deleted);
}

#[tokio::test]
async fn cascade_leaves_other_owners_alone() {
  let s = store().await;
  let (p, _, _) = family(&s).await;
  let (_, other, _) = family(&s).await;
  let unowned = s
    .save(Label { meta: Meta::new(), project_id: None, text: "loose".into() })
    .await
    .unwrap();

  s.mark_deleted(p).await.unwrap();

  let other: Task = s.get(other.meta.id).await.unwrap();
  assert!(!other.meta.is_deleted);
  let unowned: Label = s.get(unowned.meta.id).await.unwrap();
  assert!(!unowned.meta.is_deleted);
}

#[tokio::test]
async fn saving_a_deleted_entity_cascades_again() {
  let s = store().await;
  let (p, c1, _) = family(&s).await;
  let p = s.mark_deleted(p).await.unwrap();

  // Clearing a child's flag does not touch its owner.
  let child: Task = s.get(c1.meta.id).await.unwrap();
  s.restore(child).await.unwrap();
  let child: Task = s.get(c1.meta.id).await.unwrap();
  assert!(!child.meta.is_deleted);

  // Any later save of the deleted owner re-marks its dependents.
  let mut p = p;
  p.name = "renamed".into();
  s.save(p).await.unwrap();

  let child: Task = s.get(c1.meta.id).await.unwrap();
  assert!(child.meta.is_deleted);
}

#[tokio::test]
async fn restore_does_not_undelete_children() {
  let s = store().await;
  let (p, c1, c2) = family(&s).await;
  let p = s.mark_deleted(p).await.unwrap();

  let p = s.restore(p).await.unwrap();
  assert!(!p.meta.is_deleted);

  for id in [c1.meta.id, c2.meta.id] {
    let child: Task = s.get(id).await.unwrap();
    assert!(child.meta.is_deleted);
  }
}

#[tokio::test]
async fn soft_delete_where_marks_the_set_and_cascades() {
  let s = store().await;
  let (p1, _, _) = family(&s).await;
  let (p2, _, _) = family(&s).await;
  let keep = s.save(project("Keep", "active")).await.unwrap();
  let mut archived = p2.clone();
  archived.status = "archived".into();
  s.save(archived).await.unwrap();
  let mut archived = p1.clone();
  archived.status = "archived".into();
  s.save(archived).await.unwrap();

  let report = s
    .soft_delete_where::<Project>(&Query::new().filter("status", "archived"))
    .await
    .unwrap();

  assert_eq!(report.marked("project"), 2);
  assert_eq!(report.marked("task"), 4);
  assert_eq!(s.count::<Task>(&Query::new().existing()).await.unwrap(), 0);

  let keep: Project = s.get(keep.meta.id).await.unwrap();
  assert!(!keep.meta.is_deleted);
}

#[tokio::test]
async fn failed_cascade_rolls_back() {
  let s = store().await;
  let (p, c1, _) = family(&s).await;
  s.save(comment(c1.meta.id)).await.unwrap();
  s.execute_raw("DROP TABLE comment;")
    .await
    .unwrap();

  let result = s.mark_deleted(p.clone()).await;
  assert!(result.is_err());

  let p: Project = s.get(p.meta.id).await.unwrap();
  assert!(!p.meta.is_deleted);
  let c1: Task = s.get(c1.meta.id).await.unwrap();
  assert!(!c1.meta.is_deleted);
}

// ─── Hard delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn hard_delete_removes_row_and_descendants() {
  let s = store().await;
  let (p, c1, c2) = family(&s).await;
  let g = s.save(comment(c1.meta.id)).await.unwrap();

  assert!(s.hard_delete::<Project>(p.meta.id).await.unwrap());

  assert!(s.get_or_none::<Project>(&Query::by_id(p.meta.id)).await.unwrap().is_none());
  assert!(
    s.get_or_none::<Project>(&Query::by_id(p.meta.id).existing())
      .await
      .unwrap()
      .is_none()
  );
  for id in [c1.meta.id, c2.meta.id] {
    assert!(s.get_or_none::<Task>(&Query::by_id(id)).await.unwrap().is_none());
  }
  assert!(s.get_or_none::<Comment>(&Query::by_id(g.meta.id)).await.unwrap().is_none());
}

#[tokio::test]
async fn hard_delete_missing_returns_false() {
  let s = store().await;
  assert!(!s.hard_delete::<Project>(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn hard_delete_where_counts_matches() {
  let s = store().await;
  let a = s.save(project("A", "active")).await.unwrap();
  let b = s.save(project("B", "active")).await.unwrap();
  s.save(project("C", "active")).await.unwrap();

  let removed = s
    .hard_delete_where::<Project>(&Query::ids([a.meta.id, b.meta.id]))
    .await
    .unwrap();
  assert_eq!(removed, 2);
  assert_eq!(s.count::<Project>(&Query::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn hard_delete_ids_by_model_name() {
  let s = store().await;
  let a = s.save(project("A", "active")).await.unwrap();

  assert_eq!(s.hard_delete_ids("project", &[a.meta.id]).await.unwrap(), 1);
  assert!(matches!(
    s.hard_delete_ids("nope", &[a.meta.id]).await,
    Err(Error::Core(CoreError::UnknownModel(_)))
  ));
}

// ─── Misconfiguration ────────────────────────────────────────────────────────

#[tokio::test]
async fn unregistered_model_is_rejected() {
  let s = store().await;
  let result = s.save(Stranger { meta: Meta::new() }).await;
  assert!(matches!(result, Err(Error::Core(CoreError::UnknownModel(_)))));
}

#[tokio::test]
async fn dangling_owner_is_a_persistence_failure() {
  let s = store().await;
  let result = s.save(task(Uuid::new_v4(), "orphan")).await;
  assert!(matches!(result, Err(Error::Sqlite(_))));
}
