//! Storage layer for pricetrail
//!
//! Durable product record collection with an atomic read-merge-write per
//! identity. SQLite (default) and PostgreSQL backends sit behind the same
//! async traits and are selected at runtime through [`StorageBackend`].

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one of the `sqlite` or `postgres` features");

mod backend;
pub mod error;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
mod sqlite_async;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;
mod types;

pub use backend::{StorageBackend, StorageSettings};
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
pub use traits::{MaintenanceStore, ProductQueryStore, ProductStore};
pub use types::ProductStats;
