//! Storage crate: the Data Access Layer boundary for the messaging module.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`events`] – Change-feed event types
//! - [`store`] – [`MessagingStore`] trait (the backend contract)
//! - [`models`] – Row models mapping the SQLite tables
//! - [`sqlite_store`] – [`SqliteStore`] (SQLite implementation)
//! - [`sqlite_pool`] – [`SqlitePoolManager`]
//! - [`config`] – [`StorageConfig`] environment loading

mod config;
mod error;
mod events;
mod models;
mod sqlite_pool;
mod sqlite_store;
mod store;

pub use config::StorageConfig;
pub use error::StorageError;
pub use events::{ChangeEvent, ChangeOp, ChangeTable};
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteStore;
pub use store::MessagingStore;
