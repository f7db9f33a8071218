//! The entity contract every persisted model composes.
//!
//! A model embeds a [`Meta`] (flattened into its serialised form) and
//! declares which owner models it belongs to. Timestamps are written by the
//! store, never by caller code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

/// Keys owned by [`Meta`] inside a model's serialised object.
pub const META_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "is_deleted"];

// ─── Meta ────────────────────────────────────────────────────────────────────

/// Identity, timestamps and the soft-delete flag.
///
/// Embed with `#[serde(flatten)]` so the fields sit next to the model's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
  /// Assigned at construction; never rewritten by the store.
  #[serde(default = "Uuid::new_v4")]
  pub id:         Uuid,
  /// Written once, on the first successful save.
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  /// Rewritten on every successful save.
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub is_deleted: bool,
}

impl Meta {
  /// A fresh, unsaved identity with a random v4 id.
  pub fn new() -> Self { Self::with_id(Uuid::new_v4()) }

  /// An unsaved identity with a caller-supplied id, for deterministic
  /// construction.
  pub fn with_id(id: Uuid) -> Self {
    Self { id, created_at: None, updated_at: None, is_deleted: false }
  }

  /// `true` once the store has persisted the entity at least once.
  pub fn is_persisted(&self) -> bool { self.created_at.is_some() }
}

impl Default for Meta {
  fn default() -> Self { Self::new() }
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// An ownership link declared on the dependent side: rows of the declaring
/// model whose `column` holds an owner's id are bound to that owner's
/// lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
  /// [`Model::NAME`] of the owning model.
  pub owner:  &'static str,
  /// Serialised field of the dependent holding the owner's id.
  pub column: &'static str,
}

impl Relation {
  pub const fn belongs_to(owner: &'static str, column: &'static str) -> Self {
    Self { owner, column }
  }
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// A persisted entity type.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Task {
///   #[serde(flatten)]
///   meta:       Meta,
///   project_id: Uuid,
///   title:      String,
/// }
///
/// impl Model for Task {
///   const NAME: &'static str = "task";
///   const RELATIONS: &'static [Relation] =
///     &[Relation::belongs_to("project", "project_id")];
///
///   fn meta(&self) -> &Meta { &self.meta }
///   fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
  /// Table and route name. Must be a plain identifier.
  const NAME: &'static str;

  /// Used in admin action descriptions.
  const VERBOSE_NAME_PLURAL: &'static str = Self::NAME;

  /// Owners this model belongs to.
  const RELATIONS: &'static [Relation] = &[];

  fn meta(&self) -> &Meta;

  fn meta_mut(&mut self) -> &mut Meta;

  fn id(&self) -> Uuid { self.meta().id }

  fn is_deleted(&self) -> bool { self.meta().is_deleted }

  /// The form handed to API clients. Defaults to the stored form; override
  /// to label [`Choice`](crate::choice::Choice) fields.
  fn to_representation(&self) -> serde_json::Result<Value> { serde_json::to_value(self) }
}
