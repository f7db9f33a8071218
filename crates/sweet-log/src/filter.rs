//! Target-prefix filtering.

use tracing::Metadata;
use tracing_subscriber::filter::{FilterFn, filter_fn};

/// `true` when `name` is empty, equals `target`, or names a parent module of
/// `target` (`sweet_api` matches `sweet_api::views` but not `sweet_apix`).
pub fn matches_name(name: &str, target: &str) -> bool {
  if name.is_empty() || name == target {
    return true;
  }
  target
    .strip_prefix(name)
    .is_some_and(|rest| rest.starts_with("::"))
}

/// A per-layer filter accepting only events under `name`.
pub fn name_filter(name: impl Into<String>) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
  let name = name.into();
  filter_fn(move |meta| matches_name(&name, meta.target()))
}
