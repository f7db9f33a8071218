//! Query-string rewriting for links such as pagination and filters.
//!
//! [`set_query_string_param`] sets, replaces, or removes parameters of the
//! current query string. [`parse_tag_args`] and [`render`] accept the same
//! operation written as template-style arguments, where each name and value
//! is either a quoted literal or a variable looked up in a JSON context:
//!
//! ```text
//! set_query_string_param 'page' page_num filter_name None
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
  #[error("{0:?} tag requires even number of argument (min 2)")]
  ArgumentCount(String),

  #[error("unterminated quote in {0:?}")]
  UnterminatedQuote(String),

  #[error("variable {0:?} does not exist")]
  UnknownVariable(String),
}

// ─── Arguments ────────────────────────────────────────────────────────────────

/// One tag argument: a quoted literal or a context variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagArg {
  Literal(String),
  Variable(String),
}

impl TagArg {
  fn parse(token: &str) -> Self {
    let quoted = token.len() >= 2
      && (token.starts_with('"') || token.starts_with('\''))
      && token.ends_with(&token[..1]);
    if quoted {
      Self::Literal(token[1..token.len() - 1].to_owned())
    } else {
      Self::Variable(token.to_owned())
    }
  }

  /// Evaluate against `context`. `None` means "remove the parameter".
  ///
  /// Variables are dotted paths into `context` (object keys or array
  /// indices); `None`, `True`, and `False` are built in.
  pub fn resolve(&self, context: &Value) -> Result<Option<String>, TagError> {
    let name = match self {
      Self::Literal(s) => return Ok(Some(s.clone())),
      Self::Variable(name) => name,
    };

    match name.as_str() {
      "None" => return Ok(None),
      "True" => return Ok(Some("True".into())),
      "False" => return Ok(Some("False".into())),
      _ => {}
    }
    let numeric = name.starts_with(|c: char| c.is_ascii_digit() || c == '-');
    if numeric && name.parse::<f64>().is_ok() {
      return Ok(Some(name.clone()));
    }

    let mut current = context;
    for part in name.split('.') {
      let next = match current {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
      };
      current = next.ok_or_else(|| TagError::UnknownVariable(name.clone()))?;
    }

    Ok(match current {
      Value::Null => None,
      Value::String(s) => Some(s.clone()),
      Value::Bool(true) => Some("True".into()),
      Value::Bool(false) => Some("False".into()),
      other => Some(other.to_string()),
    })
  }
}

/// Split tag contents on whitespace, keeping quoted arguments whole.
fn split_contents(contents: &str) -> Result<Vec<String>, TagError> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut quote: Option<char> = None;

  for c in contents.chars() {
    match quote {
      Some(q) => {
        current.push(c);
        if c == q {
          quote = None;
        }
      }
      None if c.is_whitespace() => {
        if !current.is_empty() {
          tokens.push(std::mem::take(&mut current));
        }
      }
      None => {
        if c == '"' || c == '\'' {
          quote = Some(c);
        }
        current.push(c);
      }
    }
  }

  if quote.is_some() {
    return Err(TagError::UnterminatedQuote(contents.to_owned()));
  }
  if !current.is_empty() {
    tokens.push(current);
  }
  Ok(tokens)
}

/// Parse `tag_name name1 value1 name2 value2 ...` into argument pairs.
pub fn parse_tag_args(contents: &str) -> Result<Vec<(TagArg, TagArg)>, TagError> {
  let mut tokens = split_contents(contents)?;
  if tokens.is_empty() {
    return Err(TagError::ArgumentCount(String::new()));
  }
  let tag = tokens.remove(0);
  if tokens.len() < 2 || tokens.len() % 2 != 0 {
    return Err(TagError::ArgumentCount(tag));
  }

  Ok(
    tokens
      .chunks(2)
      .map(|pair| (TagArg::parse(&pair[0]), TagArg::parse(&pair[1])))
      .collect(),
  )
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// Resolve `args` in `context` and apply them to `current_query`.
///
/// When a name appears more than once the last value wins. A name that
/// resolves to `None` falls back to the literal `"None"`.
pub fn render(
  current_query: &str,
  args: &[(TagArg, TagArg)],
  context: &Value,
) -> Result<String, TagError> {
  let mut resolved: Vec<(String, Option<String>)> = Vec::new();
  for (name, value) in args {
    let name = name.resolve(context)?.unwrap_or_else(|| "None".into());
    let value = value.resolve(context)?;
    match resolved.iter_mut().find(|(n, _)| *n == name) {
      Some(slot) => slot.1 = value,
      None => resolved.push((name, value)),
    }
  }

  let pairs: Vec<(&str, Option<&str>)> = resolved
    .iter()
    .map(|(n, v)| (n.as_str(), v.as_deref()))
    .collect();
  Ok(set_query_string_param(current_query, &pairs))
}

/// Apply `params` to `current_query` (with or without a leading `?`).
///
/// A missing or empty value removes every occurrence of the name; anything
/// else replaces it, keeping its position, or appends it. Returns `""` when
/// nothing is left, otherwise `?` followed by the encoded parameters.
pub fn set_query_string_param(current_query: &str, params: &[(&str, Option<&str>)]) -> String {
  let current = current_query.strip_prefix('?').unwrap_or(current_query);
  let parsed: Vec<(String, String)> = serde_urlencoded::from_str(current).unwrap_or_default();

  let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
  for (name, value) in parsed {
    match grouped.iter_mut().find(|(n, _)| *n == name) {
      Some((_, values)) => values.push(value),
      None => grouped.push((name, vec![value])),
    }
  }

  for (name, value) in params {
    match value.filter(|v| !v.is_empty()) {
      None => grouped.retain(|(n, _)| n != name),
      Some(v) => match grouped.iter_mut().find(|(n, _)| n == name) {
        Some((_, values)) => *values = vec![v.to_owned()],
        None => grouped.push(((*name).to_owned(), vec![v.to_owned()])),
      },
    }
  }

  let flat: Vec<(&str, &str)> = grouped
    .iter()
    .flat_map(|(n, values)| values.iter().map(move |v| (n.as_str(), v.as_str())))
    .collect();
  if flat.is_empty() {
    return String::new();
  }
  match serde_urlencoded::to_string(&flat) {
    Ok(encoded) => format!("?{encoded}"),
    Err(_) => String::new(),
  }
}

/// Replace every `%s` in `s` with `new`.
pub fn format_string(s: &str, new: &str) -> String { s.replace("%s", new) }
