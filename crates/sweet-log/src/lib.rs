//! Structured log output for Sweet services.
//!
//! [`JsonFormat`] renders every `tracing` event as one JSON object per line,
//! suitable for shipping to a log collector. [`name_filter`] restricts a layer
//! to one target subtree.
//!
//! ```rust,ignore
//! tracing_subscriber::registry()
//!   .with(EnvFilter::from_default_env())
//!   .with(sweet_log::layer("tracker").with_filter(sweet_log::name_filter("sweet_api")))
//!   .init();
//! ```

pub mod filter;
pub mod format;

pub use filter::{matches_name, name_filter};
pub use format::JsonFormat;

use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan};

/// A `fmt` layer writing [`JsonFormat`] lines to stdout.
pub fn layer<S>(app: impl Into<String>) -> fmt::Layer<S, fmt::format::DefaultFields, JsonFormat>
where
  S: Subscriber + for<'a> LookupSpan<'a>,
{
  fmt::layer().event_format(JsonFormat::new(app))
}
