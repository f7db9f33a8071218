//! [`JsonFormat`] — a one-object-per-line event formatter.
//!
//! Each line carries `time`, `level`, `name` (the event target), `app`,
//! `message`, and every other event field. A `request` field is never
//! written. `ERROR` events with an `error` field also get a `trace` holding
//! the error and its source chain.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{
  Event, Level, Subscriber,
  field::{Field, Visit},
};
use tracing_subscriber::{
  fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
  registry::LookupSpan,
};

/// Fields never copied into the output.
const DROPPED_FIELDS: [&str; 1] = ["request"];

#[derive(Debug, Clone)]
pub struct JsonFormat {
  app: String,
}

impl JsonFormat {
  pub fn new(app: impl Into<String>) -> Self { Self { app: app.into() } }
}

// ─── Field visitor ────────────────────────────────────────────────────────────

#[derive(Default)]
struct JsonVisitor {
  message: Option<String>,
  error:   Option<String>,
  fields:  Map<String, Value>,
}

impl JsonVisitor {
  fn insert(&mut self, field: &Field, value: Value) {
    match field.name() {
      "message" => {
        self.message = Some(match value {
          Value::String(s) => s,
          other => other.to_string(),
        })
      }
      name if DROPPED_FIELDS.contains(&name) => {}
      name => {
        if name == "error" {
          if let Value::String(s) = &value {
            self.error.get_or_insert_with(|| s.clone());
          }
        }
        self.fields.insert(name.to_owned(), value);
      }
    }
  }
}

impl Visit for JsonVisitor {
  fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
    self.insert(field, Value::String(format!("{value:?}")));
  }

  fn record_str(&mut self, field: &Field, value: &str) {
    self.insert(field, Value::String(value.to_owned()));
  }

  fn record_i64(&mut self, field: &Field, value: i64) { self.insert(field, value.into()); }

  fn record_u64(&mut self, field: &Field, value: u64) { self.insert(field, value.into()); }

  fn record_f64(&mut self, field: &Field, value: f64) { self.insert(field, value.into()); }

  fn record_bool(&mut self, field: &Field, value: bool) { self.insert(field, value.into()); }

  fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
    let mut chain = value.to_string();
    let mut source = value.source();
    while let Some(cause) = source {
      chain.push_str("\ncaused by: ");
      chain.push_str(&cause.to_string());
      source = cause.source();
    }
    if field.name() == "error" {
      self.error = Some(chain);
    }
    self.insert(field, Value::String(value.to_string()));
  }
}

// ─── FormatEvent ──────────────────────────────────────────────────────────────

impl<S, N> FormatEvent<S, N> for JsonFormat
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(
    &self,
    ctx: &FmtContext<'_, S, N>,
    mut writer: Writer<'_>,
    event: &Event<'_>,
  ) -> fmt::Result {
    let meta = event.metadata();
    let mut visitor = JsonVisitor::default();
    event.record(&mut visitor);

    let mut line = Map::new();
    line.insert("time".into(), chrono::Utc::now().to_rfc3339().into());
    line.insert("level".into(), meta.level().as_str().into());
    line.insert("name".into(), meta.target().into());
    line.insert("app".into(), self.app.clone().into());
    line.insert("message".into(), visitor.message.unwrap_or_default().into());

    if let Some(scope) = ctx.event_scope() {
      let spans: Vec<Value> = scope.from_root().map(|span| span.name().into()).collect();
      line.insert("spans".into(), spans.into());
    }

    if *meta.level() == Level::ERROR {
      if let Some(trace) = visitor.error {
        line.insert("trace".into(), trace.into());
      }
    }

    for (key, value) in visitor.fields {
      line.entry(key).or_insert(value);
    }

    let json = serde_json::to_string(&line).map_err(|_| fmt::Error)?;
    writeln!(writer, "{json}")
  }
}
