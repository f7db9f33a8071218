//! JSON REST API over a soft-deleting [`EntityStore`].
//!
//! Every registered model gets the same set of routes. Reads only ever see
//! entities whose flag is clear; deleting through the API is always a soft
//! delete. Physical removal is only reachable through the admin action.
//!
//! Auth and transport concerns are the caller's responsibility: the host
//! inserts a [`Principal`] into request extensions before these routes run.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let api = ApiRouter::new(store, "tracker")
//!   .resource::<Project>()
//!   .resource::<Task>()
//!   .build();
//! app.nest("/api", api)
//! ```
//!
//! | Method          | Path                                          | Notes |
//! |-----------------|-----------------------------------------------|-------|
//! | `GET`           | `/{name}`                                     | Existing only; `?field=value&limit=&offset=` |
//! | `POST`          | `/{name}`                                     | 201 + stored entity |
//! | `GET`           | `/{name}/{id}`                                | 404 when absent or deleted |
//! | `POST`, `PATCH` | `/{name}/{id}/update`                         | Partial update |
//! | `POST`, `DELETE`| `/{name}/{id}/delete`                         | Soft delete + cascade; 204 |
//! | `GET`           | `/admin/{name}/actions`                       | Available bulk actions |
//! | `POST`          | `/admin/{name}/actions/hard_delete_selected`  | Body `{"ids":[...]}` |

pub mod admin;
pub mod error;
pub mod permissions;
pub mod query_string;
pub mod views;


use std::sync::Arc;

use axum::Router;
use sweet_core::{model::Model, store::EntityStore};

pub use error::ApiError;
pub use permissions::{ModelPermissions, Principal};

/// Shared handler state for one model's routes.
pub struct Resource<S> {
  pub store:       Arc<S>,
  pub permissions: Arc<ModelPermissions>,
}

impl<S> Clone for Resource<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      permissions: Arc::clone(&self.permissions),
    }
  }
}

/// Builder that mounts the CRUD and admin routes of each registered model.
pub struct ApiRouter<S> {
  store:     Arc<S>,
  app_label: String,
  router:    Router,
}

impl<S> ApiRouter<S>
where
  S: EntityStore + 'static,
{
  pub fn new(store: Arc<S>, app_label: impl Into<String>) -> Self {
    Self { store, app_label: app_label.into(), router: Router::new() }
  }

  /// Mount the routes for `T`.
  pub fn resource<T: Model>(mut self) -> Self {
    let resource = Resource {
      store:       Arc::clone(&self.store),
      permissions: Arc::new(ModelPermissions::new(&self.app_label, T::NAME)),
    };
    self.router = self
      .router
      .merge(views::routes::<S, T>(resource.clone()))
      .merge(admin::routes::<S, T>(resource));
    self
  }

  /// The materialised `Router<()>`; nest it into any parent router.
  pub fn build(self) -> Router { self.router }
}
