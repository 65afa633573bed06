// src/db/mod.rs

//! Database capability consumed by the save pipeline.
//!
//! The pipeline talks to a `Database` instead of a concrete pool, so tests
//! can swap in a fake that records statements. [`mysql`] holds the
//! production implementation on top of an `sqlx` MySQL pool.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub mod mysql;

pub use mysql::MySqlDatabase;

/// Boxed future returned by [`Database`] methods.
pub type DbFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Narrow execute/query capability over a shared connection pool.
///
/// Implementations must be safe to use from many source tasks at once.
pub trait Database: Send + Sync {
    /// Run a read-only statement and discard any rows.
    fn query<'a>(&'a self, sql: &'a str) -> DbFuture<'a, ()>;

    /// Run a statement with positional string parameters, returning the
    /// number of affected rows.
    fn execute<'a>(&'a self, sql: &'a str, params: &'a [String]) -> DbFuture<'a, u64>;
}
