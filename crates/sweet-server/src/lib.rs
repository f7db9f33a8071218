//! HTTP server hosting the Sweet API over a SQLite store.
//!
//! The binary in `main.rs` reads [`ServerConfig`], opens the store with the
//! demo [`models::schema`], and serves [`router`].

pub mod auth;
pub mod models;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use sweet_api::ApiRouter;
use sweet_core::store::EntityStore;
use tower_http::trace::TraceLayer;

use auth::{UserConfig, Users};

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `SWEET_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Prefix of every permission string.
  #[serde(default = "default_app_label")]
  pub app_label:  String,
  /// Written to the `app` key of JSON log lines.
  #[serde(default = "default_app_name")]
  pub app_name:   String,
  #[serde(default)]
  pub log_format: LogFormat,
  /// Restrict JSON log output to one target subtree; empty keeps everything.
  #[serde(default)]
  pub log_target: String,
  /// Enables debug-level logs by default. Only an explicit `false` turns it
  /// off.
  #[serde(default = "default_debug")]
  pub debug:      bool,
  #[serde(default)]
  pub users:      Vec<UserConfig>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("sweet.db") }
fn default_app_label() -> String { "tracker".into() }
fn default_app_name() -> String { "sweet".into() }
fn default_debug() -> bool { true }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router: the API under `/api`, behind Basic auth and
/// request tracing.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: EntityStore + 'static,
{
  let api = models::resources(ApiRouter::new(store, config.app_label.clone()))
    .build()
    .route("/choices", get(|| async { Json(models::choices()) }));
  let users = Arc::new(Users::new(config.users.clone()));

  Router::new()
    .nest("/api", api)
    .layer(middleware::from_fn_with_state(users, auth::authenticate))
    .layer(TraceLayer::new_for_http())
}
