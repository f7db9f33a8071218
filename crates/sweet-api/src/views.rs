//! CRUD handlers shared by every registered model.
//!
//! Reads go through [`Query::existing`]: a soft-deleted entity is
//! indistinguishable from a missing one. The update and destroy views accept
//! `POST` as an alias for `PATCH`/`DELETE` so plain HTML forms can drive them;
//! their permission is fixed by the view, not by the method.

use axum::{
  Json, Router,
  extract::{OriginalUri, Path, Query as QueryParams, State},
  http::{HeaderValue, Method, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use serde_json::{Map, Number, Value};
use sweet_core::{
  model::Model,
  query::Query,
  record::Record,
  schema::validate_identifier,
  store::EntityStore,
};
use uuid::Uuid;

use crate::{
  Resource,
  error::ApiError,
  permissions::{Action, Principal},
  query_string::set_query_string_param,
};

/// Meta fields the server owns; stripped from create bodies.
const SERVER_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

pub fn routes<S, T>(resource: Resource<S>) -> Router
where
  S: EntityStore + 'static,
  T: Model,
{
  let name = T::NAME;
  Router::new()
    .route(&format!("/{name}"), get(list::<S, T>).post(create::<S, T>))
    .route(&format!("/{name}/{{id}}"), get(retrieve::<S, T>))
    .route(
      &format!("/{name}/{{id}}/update"),
      post(update::<S, T>).patch(update::<S, T>),
    )
    .route(
      &format!("/{name}/{{id}}/delete"),
      post(destroy::<S, T>).delete(destroy::<S, T>),
    )
    .with_state(resource)
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn fetch_existing<S, T>(res: &Resource<S>, id: Uuid) -> Result<T, ApiError>
where
  S: EntityStore,
  T: Model,
{
  let query = Query::by_id(id).existing();
  res
    .store
    .get_or_none::<T>(&query)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", T::NAME)))
}

fn into_object(body: Value) -> Result<Map<String, Value>, ApiError> {
  match body {
    Value::Object(map) => Ok(map),
    _ => Err(ApiError::BadRequest("request body must be a JSON object".into())),
  }
}

/// Interpret a query-string value: booleans and integers are typed, anything
/// else stays a string.
fn parse_filter_value(raw: &str) -> Value {
  match raw {
    "true" => Value::Bool(true),
    "false" => Value::Bool(false),
    _ => raw
      .parse::<i64>()
      .map(|n| Value::Number(Number::from(n)))
      .unwrap_or_else(|_| Value::String(raw.to_owned())),
  }
}

/// Limits and offsets end up as SQL integers, so they are capped at `i64::MAX`.
fn parse_count(key: &str, raw: &str) -> Result<usize, ApiError> {
  raw
    .parse::<i64>()
    .ok()
    .and_then(|n| usize::try_from(n).ok())
    .ok_or_else(|| ApiError::BadRequest(format!("{key} must be a non-negative integer")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{name}[?field=value...][&limit=N][&offset=M]`
///
/// When a full page comes back, a `Link: <...>; rel="next"` header points at
/// the following page.
pub async fn list<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  method: Method,
  OriginalUri(uri): OriginalUri,
  QueryParams(params): QueryParams<Vec<(String, String)>>,
) -> Result<Response, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check_method(&caller, &method)?;

  let mut query = Query::new().existing();
  for (key, raw) in &params {
    match key.as_str() {
      "limit" => query = query.limit(parse_count(key, raw)?),
      "offset" => query = query.offset(parse_count(key, raw)?),
      field => {
        validate_identifier(field)?;
        query = query.filter(field, parse_filter_value(raw));
      }
    }
  }

  let items: Vec<T> = res.store.list(&query).await.map_err(ApiError::store)?;

  let next = match query.limit {
    Some(limit) if limit > 0 && items.len() == limit => query
      .offset
      .unwrap_or(0)
      .checked_add(limit)
      .filter(|&next| i64::try_from(next).is_ok())
      .map(|next| {
        let offset = next.to_string();
        let qs = set_query_string_param(uri.query().unwrap_or(""), &[("offset", Some(&offset))]);
        format!("<{}{qs}>; rel=\"next\"", uri.path())
      }),
    _ => None,
  };

  let body = items
    .iter()
    .map(Model::to_representation)
    .collect::<serde_json::Result<Vec<_>>>()
    .map_err(ApiError::store)?;
  let mut response = Json(body).into_response();
  if let Some(link) = next.and_then(|l| HeaderValue::from_str(&l).ok()) {
    response.headers_mut().insert(header::LINK, link);
  }
  Ok(response)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /{name}` — returns 201 + the stored entity.
pub async fn create<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check(&caller, &[Action::Add])?;

  let mut object = into_object(body)?;
  for field in SERVER_FIELDS {
    object.remove(field);
  }
  let entity: T = serde_json::from_value(Value::Object(object))
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let saved = res.store.save(entity).await.map_err(ApiError::store)?;
  tracing::info!(model = T::NAME, id = %saved.id(), user = %caller.username, "created");
  Ok((StatusCode::CREATED, Json(saved.to_representation().map_err(ApiError::store)?)))
}

// ─── Retrieve ─────────────────────────────────────────────────────────────────

/// `GET /{name}/{id}`
pub async fn retrieve<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check(&caller, &[Action::View])?;
  let entity: T = fetch_existing(&res, id).await?;
  Ok(Json(entity.to_representation().map_err(ApiError::store)?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /{name}/{id}/update`, or `POST` to the same path.
///
/// The body is merged over the stored entity; `id` and the timestamps cannot
/// be overwritten. Setting `is_deleted` to `true` here cascades like a delete.
pub async fn update<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check(&caller, &[Action::Change])?;

  let entity: T = fetch_existing(&res, id).await?;
  let mut record = Record::from_model(&entity)?;
  record.merge_patch(into_object(body)?)?;
  let patched: T = record.into_model()?;

  let saved = res.store.save(patched).await.map_err(ApiError::store)?;
  tracing::info!(model = T::NAME, %id, user = %caller.username, "updated");
  Ok(Json(saved.to_representation().map_err(ApiError::store)?))
}

// ─── Destroy ──────────────────────────────────────────────────────────────────

/// `DELETE /{name}/{id}/delete`, or `POST` to the same path. Soft delete;
/// returns 204.
pub async fn destroy<S, T>(
  State(res): State<Resource<S>>,
  caller: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore,
  T: Model,
{
  res.permissions.check(&caller, &[Action::Delete])?;

  let entity: T = fetch_existing(&res, id).await?;
  res.store.mark_deleted(entity).await.map_err(ApiError::store)?;
  tracing::info!(model = T::NAME, %id, user = %caller.username, "soft-deleted");
  Ok(StatusCode::NO_CONTENT)
}
