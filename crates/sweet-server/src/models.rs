//! The demo tracker schema served by the binary.
//!
//! Projects own tasks; tasks own comments. Deleting a project through the
//! API soft-deletes its tasks and their comments.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sweet_api::ApiRouter;
use sweet_core::{
  Meta, Model, Relation, Schema,
  choice::{self, Choice, Labelled},
  store::EntityStore,
};
use uuid::Uuid;

// ─── Choices ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  #[default]
  Active,
  OnHold,
  Archived,
}

impl Status {
  pub const ALL: [Self; 3] = [Self::Active, Self::OnHold, Self::Archived];
}

impl Choice for Status {
  fn display_name(&self) -> &'static str {
    match self {
      Self::Active => "Active",
      Self::OnHold => "On hold",
      Self::Archived => "Archived",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
  Low,
  Normal,
  High,
}

impl Priority {
  pub const ALL: [Self; 3] = [Self::Low, Self::Normal, Self::High];
}

impl Choice for Priority {
  fn display_name(&self) -> &'static str {
    match self {
      Self::Low => "Low",
      Self::Normal => "Normal",
      Self::High => "High",
    }
  }
}

/// Every choice set with its labels, keyed by `{model}_{field}`.
pub fn choices() -> Value {
  json!({
    "project_status": Status::ALL.iter().map(Labelled).collect::<Vec<_>>(),
    "task_priority": Priority::ALL.iter().map(Labelled).collect::<Vec<_>>(),
  })
}

// ─── Models ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  #[serde(flatten)]
  pub meta:   Meta,
  pub name:   String,
  #[serde(default)]
  pub status: Status,
}

/// Client-facing [`Project`] with a labelled status.
#[derive(Serialize)]
struct ProjectRepr<'a> {
  #[serde(flatten)]
  meta:   &'a Meta,
  name:   &'a str,
  #[serde(serialize_with = "choice::serialize")]
  status: Status,
}

impl Model for Project {
  const NAME: &'static str = "project";
  const VERBOSE_NAME_PLURAL: &'static str = "projects";

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

  fn to_representation(&self) -> serde_json::Result<Value> {
    serde_json::to_value(ProjectRepr { meta: &self.meta, name: &self.name, status: self.status })
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
  #[serde(flatten)]
  pub meta:       Meta,
  pub project_id: Uuid,
  pub title:      String,
  #[serde(default)]
  pub priority:   Option<Priority>,
  #[serde(default)]
  pub done:       bool,
}

#[derive(Serialize)]
struct TaskRepr<'a> {
  #[serde(flatten)]
  meta:       &'a Meta,
  project_id: Uuid,
  title:      &'a str,
  #[serde(serialize_with = "choice::option::serialize")]
  priority:   Option<Priority>,
  done:       bool,
}

impl Model for Task {
  const NAME: &'static str = "task";
  const VERBOSE_NAME_PLURAL: &'static str = "tasks";
  const RELATIONS: &'static [Relation] = &[Relation::belongs_to("project", "project_id")];

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

  fn to_representation(&self) -> serde_json::Result<Value> {
    serde_json::to_value(TaskRepr {
      meta:       &self.meta,
      project_id: self.project_id,
      title:      &self.title,
      priority:   self.priority,
      done:       self.done,
    })
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  #[serde(flatten)]
  pub meta:    Meta,
  pub task_id: Uuid,
  pub body:    String,
}

impl Model for Comment {
  const NAME: &'static str = "comment";
  const VERBOSE_NAME_PLURAL: &'static str = "comments";
  const RELATIONS: &'static [Relation] = &[Relation::belongs_to("task", "task_id")];

  fn meta(&self) -> &Meta { &self.meta }
  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
}

/// The ownership registry for the demo models.
pub fn schema() -> sweet_core::Result<Schema> {
  Schema::builder()
    .register::<Project>()
    .register::<Task>()
    .register::<Comment>()
    .build()
}

/// Mount a resource for every demo model.
pub fn resources<S: EntityStore + 'static>(api: ApiRouter<S>) -> ApiRouter<S> {
  api
    .resource::<Project>()
    .resource::<Task>()
    .resource::<Comment>()
}
