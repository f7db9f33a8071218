//! The `EntityStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `sweet-store-sqlite`).
//! Higher layers (`sweet-api`, the server binary) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{cascade::CascadeReport, model::Model, query::Query, schema::Schema};

/// Abstraction over a soft-deleting entity store.
///
/// Every write stamps timestamps itself; callers never set `created_at` or
/// `updated_at`. Saving an entity whose flag is set re-runs the cascade over
/// its dependents, whether or not the flag changed in this save.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EntityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The ownership registry this store was opened with.
  fn schema(&self) -> &Schema;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or update `entity` and return it with its timestamps as
  /// persisted. `created_at` is written only on first save.
  fn save<T: Model>(
    &self,
    entity: T,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_;

  /// Set the flag, save, and cascade to everything the entity owns.
  fn mark_deleted<T: Model>(
    &self,
    mut entity: T,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_ {
    entity.meta_mut().is_deleted = true;
    self.save(entity)
  }

  /// Clear the flag and save. Dependents deleted by an earlier cascade stay
  /// deleted.
  fn restore<T: Model>(
    &self,
    mut entity: T,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_ {
    entity.meta_mut().is_deleted = false;
    self.save(entity)
  }

  /// Soft-delete every row matching `query`, then cascade.
  fn soft_delete_where<'a, T: Model>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<CascadeReport, Self::Error>> + Send + 'a;

  /// Physically remove one row. Returns `false` if it did not exist.
  fn hard_delete<T: Model>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Physically remove every row matching `query`; returns the count.
  fn hard_delete_where<'a, T: Model>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Physically remove rows of a model known only by name. Used by
  /// administrative tooling.
  fn hard_delete_ids<'a>(
    &'a self,
    model: &'a str,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fetch by id, deleted or not. Absence is an error.
  fn get<T: Model>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_;

  /// Single-object lookup. `Ok(None)` when nothing matches; more than one
  /// match is an error.
  fn get_or_none<'a, T: Model>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + 'a;

  /// Every row matching `query`, oldest first.
  fn list<'a, T: Model>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send + 'a;

  fn count<'a, T: Model>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
