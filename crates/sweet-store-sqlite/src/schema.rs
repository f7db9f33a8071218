//! SQL schema for the Sweet SQLite store.
//!
//! Tables are generated from the registered models at connection startup.
//! Every statement is idempotent thanks to `IF NOT EXISTS`.

use sweet_core::schema::{ModelInfo, Schema};

/// Connection-level settings. `foreign_keys` must be on for hard deletes to
/// reach descendants; it is a no-op inside a transaction, so it runs first.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// DDL for every model in `schema`.
pub fn schema_ddl(schema: &Schema) -> String {
  schema.models().map(table_ddl).collect::<Vec<_>>().join("\n")
}

/// One table per model:
///
/// - meta columns (`id`, `created_at`, `updated_at`, `is_deleted`),
/// - `data`: the remaining serialised fields as JSON,
/// - one nullable foreign key column per ownership relation, mirrored from
///   `data` on every save.
pub fn table_ddl(info: &ModelInfo) -> String {
  let name = info.name;
  let mut columns = vec![
    "id          TEXT PRIMARY KEY".to_owned(),
    "created_at  TEXT NOT NULL".to_owned(),
    "updated_at  TEXT NOT NULL".to_owned(),
    "is_deleted  INTEGER NOT NULL DEFAULT 0".to_owned(),
    "data        TEXT NOT NULL".to_owned(),
  ];
  for rel in info.relations {
    columns.push(format!(
      "\"{}\" TEXT REFERENCES \"{}\"(id) ON DELETE CASCADE",
      rel.column, rel.owner
    ));
  }

  let mut ddl = format!(
    "CREATE TABLE IF NOT EXISTS \"{name}\" (\n    {}\n);\n\
     CREATE INDEX IF NOT EXISTS \"{name}_is_deleted_idx\" ON \"{name}\"(is_deleted);\n",
    columns.join(",\n    ")
  );
  for rel in info.relations {
    ddl.push_str(&format!(
      "CREATE INDEX IF NOT EXISTS \"{name}_{col}_idx\" ON \"{name}\"(\"{col}\");\n",
      col = rel.column
    ));
  }
  ddl
}
