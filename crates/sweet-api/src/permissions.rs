//! Model-level permissions.
//!
//! Permission strings have the form `{app_label}.{action}_{model}`, e.g.
//! `tracker.view_project`. Reads require the `view` permission; there is no
//! anonymous read access.
//!
//! The caller arrives as a [`Principal`] request extension inserted by the
//! host's authentication layer. Auth itself is the caller's responsibility.

use std::collections::BTreeSet;

use axum::{
  extract::FromRequestParts,
  http::{Method, request::Parts},
};

use crate::error::ApiError;

// ─── Principal ────────────────────────────────────────────────────────────────

/// The authenticated caller of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
  pub username:     String,
  /// Holds every permission.
  pub is_superuser: bool,
  pub permissions:  BTreeSet<String>,
}

impl Principal {
  pub fn new(username: impl Into<String>) -> Self {
    Self { username: username.into(), ..Default::default() }
  }

  pub fn superuser(username: impl Into<String>) -> Self {
    Self { is_superuser: true, ..Self::new(username) }
  }

  pub fn with_permission(mut self, perm: impl Into<String>) -> Self {
    self.permissions.insert(perm.into());
    self
  }

  pub fn has_perm(&self, perm: &str) -> bool {
    self.is_superuser || self.permissions.contains(perm)
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Principal>()
      .cloned()
      .ok_or(ApiError::Unauthenticated)
  }
}

// ─── Actions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  View,
  Add,
  Change,
  Delete,
}

impl Action {
  pub fn codename(self) -> &'static str {
    match self {
      Self::View => "view",
      Self::Add => "add",
      Self::Change => "change",
      Self::Delete => "delete",
    }
  }
}

/// Actions required per HTTP method. `None` for methods the API never
/// serves.
pub fn perms_map(method: &Method) -> Option<&'static [Action]> {
  match method.as_str() {
    "GET" | "HEAD" => Some(&[Action::View]),
    "OPTIONS" => Some(&[]),
    "POST" => Some(&[Action::Add]),
    "PUT" | "PATCH" => Some(&[Action::Change]),
    "DELETE" => Some(&[Action::Delete]),
    _ => None,
  }
}

// ─── ModelPermissions ─────────────────────────────────────────────────────────

/// Permission checks for one model.
#[derive(Debug, Clone)]
pub struct ModelPermissions {
  app_label:  String,
  model_name: String,
}

impl ModelPermissions {
  pub fn new(app_label: impl Into<String>, model_name: &str) -> Self {
    Self { app_label: app_label.into(), model_name: model_name.to_lowercase() }
  }

  pub fn permission(&self, action: Action) -> String {
    format!("{}.{}_{}", self.app_label, action.codename(), self.model_name)
  }

  /// Permission strings a request with `method` needs.
  pub fn required_for(&self, method: &Method) -> Result<Vec<String>, ApiError> {
    let actions = perms_map(method).ok_or(ApiError::MethodNotAllowed)?;
    Ok(actions.iter().map(|a| self.permission(*a)).collect())
  }

  /// Fail with 403 unless `principal` holds every permission for `actions`.
  pub fn check(&self, principal: &Principal, actions: &[Action]) -> Result<(), ApiError> {
    for action in actions {
      let perm = self.permission(*action);
      if !principal.has_perm(&perm) {
        tracing::warn!(user = %principal.username, %perm, "permission denied");
        return Err(ApiError::Forbidden(perm));
      }
    }
    Ok(())
  }

  /// [`check`](Self::check) with the actions mapped from `method`.
  pub fn check_method(&self, principal: &Principal, method: &Method) -> Result<(), ApiError> {
    let actions = perms_map(method).ok_or(ApiError::MethodNotAllowed)?;
    self.check(principal, actions)
  }
}
