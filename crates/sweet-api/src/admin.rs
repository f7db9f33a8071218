//! Administrative bulk actions.
//!
//! The only action is a permanent delete of the selected rows, bypassing the
//! soft-delete flag. It is the one way to physically remove data through the
//! API; owned rows go with their owners.

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sweet_core::{model::Model, query::Query, store::EntityStore};
use uuid::Uuid;

use crate::{
  Resource,
  error::ApiError,
  permissions::{Action, Principal},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
  HardDeleteSelected,
}

impl AdminAction {
  pub const ALL: [Self; 1] = [Self::HardDeleteSelected];

  pub fn name(self) -> &'static str {
    match self {
      Self::HardDeleteSelected => "hard_delete_selected",
    }
  }

  /// Human-readable label, e.g. "Delete selected tasks (hard)".
  pub fn description(self, verbose_name_plural: &str) -> String {
    match self {
      Self::HardDeleteSelected => format!("Delete selected {verbose_name_plural} (hard)"),
    }
  }

  pub fn required(self) -> Action {
    match self {
      Self::HardDeleteSelected => Action::Delete,
    }
  }
}

/// One entry of `GET /admin/{name}/actions`.
#[derive(Debug, Serialize)]
pub struct ActionInfo {
  pub name:        &'static str,
  pub description: String,
}

/// Body of an action request: the selected primary keys.
#[derive(Debug, Deserialize)]
pub struct Selection {
  pub ids: Vec<Uuid>,
}

pub fn routes<S, T>(resource: Resource<S>) -> Router
where
  S: EntityStore + 'static,
  T: Model,
{
  let name = T::NAME;
  Router::new()
    .route(&format!("/admin/{name}/actions"), get(list_actions::<S, T>))
    .route(
      &format!("/admin/{name}/actions/hard_delete_selected"),
      post(hard_delete_selected::<S, T>),
    )
    .with_state(resource)
}

/// `GET /admin/{name}/actions` — actions the caller may run on `T`.
pub async fn list_actions<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
) -> Result<Json<Vec<ActionInfo>>, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check(&caller, &[Action::View])?;

  let actions = AdminAction::ALL
    .into_iter()
    .filter(|a| caller.has_perm(&res.permissions.permission(a.required())))
    .map(|a| ActionInfo {
      name:        a.name(),
      description: a.description(T::VERBOSE_NAME_PLURAL),
    })
    .collect();
  Ok(Json(actions))
}

/// `POST /admin/{name}/actions/hard_delete_selected` — body `{"ids":[...]}`.
///
/// Ids that do not exist are ignored; the response counts rows of `T`
/// actually removed.
pub async fn hard_delete_selected<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  Json(selection): Json<Selection>,
) -> Result<Json<Value>, ApiError>
where
  S: EntityStore,
  T: Model,
{
  let action = AdminAction::HardDeleteSelected;
  res.permissions.check(&caller, &[action.required()])?;

  if selection.ids.is_empty() {
    return Err(ApiError::BadRequest(
      "items must be selected in order to perform actions on them".into(),
    ));
  }

  let query = Query::ids(selection.ids);
  let deleted = res
    .store
    .hard_delete_where::<T>(&query)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    model = T::NAME,
    action = action.name(),
    deleted,
    user = %caller.username,
    "admin action"
  );
  Ok(Json(json!({ "deleted": deleted })))
}
