//! SQLite backend for the Agora social store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each store operation runs inside one
//! [`uow::UnitOfWork`] transaction.

mod encode;
mod schema;
mod store;
mod uow;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
