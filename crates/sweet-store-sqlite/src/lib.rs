//! SQLite backend for the Sweet entity layer.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each registered model gets its own
//! table; ownership columns are real foreign keys with `ON DELETE CASCADE`,
//! so hard deletes of owners physically remove their descendants.

mod encode;
mod ops;
mod schema;
mod sql;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
