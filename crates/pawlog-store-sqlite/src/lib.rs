//! SQLite backend for the Pawlog pet-care journal.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements the core's
//! care, pet and notification-sink traits over one database file.

mod encode;
mod notify;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
