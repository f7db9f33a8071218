//! HTTP Basic authentication that turns configured users into
//! [`Principal`]s.
//!
//! A request without credentials passes through anonymously; the API then
//! answers 401. Credentials that are present but wrong are rejected here.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;
use serde_json::json;
use sweet_api::Principal;
use thiserror::Error;

/// One account from the `[[users]]` config table.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub is_superuser:  bool,
  /// Permission strings such as `tracker.view_project`.
  #[serde(default)]
  pub permissions:   Vec<String>,
}

impl UserConfig {
  fn principal(&self) -> Principal {
    Principal {
      username:     self.username.clone(),
      is_superuser: self.is_superuser,
      permissions:  self.permissions.iter().cloned().collect(),
    }
  }
}

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("invalid credentials")]
  Unauthorized,
}

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    let mut res = (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.to_string() })))
      .into_response();
    res.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"sweet\""),
    );
    res
  }
}

/// The configured accounts.
#[derive(Debug, Clone, Default)]
pub struct Users(Vec<UserConfig>);

impl Users {
  pub fn new(users: Vec<UserConfig>) -> Self { Self(users) }

  /// `Ok(None)` when no credentials were sent.
  pub fn verify(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
      return Ok(None);
    };
    let encoded = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Basic "))
      .ok_or(AuthError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| AuthError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| AuthError::Unauthorized)?;
    let (username, password) = creds.split_once(':').ok_or(AuthError::Unauthorized)?;

    let user = self
      .0
      .iter()
      .find(|u| u.username == username)
      .ok_or(AuthError::Unauthorized)?;

    let parsed_hash =
      PasswordHash::new(&user.password_hash).map_err(|_| AuthError::Unauthorized)?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| AuthError::Unauthorized)?;

    Ok(Some(user.principal()))
  }
}

/// Middleware: attach the caller's [`Principal`] to the request.
pub async fn authenticate(
  State(users): State<Arc<Users>>,
  mut req: Request,
  next: Next,
) -> Result<Response, AuthError> {
  match users.verify(req.headers()) {
    Ok(Some(principal)) => {
      req.extensions_mut().insert(principal);
    }
    Ok(None) => {}
    Err(e) => {
      tracing::warn!(path = %req.uri().path(), "rejected credentials");
      return Err(e);
    }
  }
  Ok(next.run(req).await)
}
