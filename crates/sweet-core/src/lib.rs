//! Core types and trait definitions for the Sweet entity layer.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the entity contract, the ownership schema registry, the query type and the
//! cascade algorithm that storage backends drive.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cascade;
pub mod choice;
pub mod error;
pub mod model;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use model::{Meta, Model, Relation};
pub use query::{Filter, Query};
pub use schema::Schema;
