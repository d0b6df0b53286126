//! Persistence for Quire documentation trees.
//!
//! This crate provides a [`Storage`] trait for reading documentations and a
//! [`Transaction`] trait through which every write goes. This enables:
//!
//! - **Atomic multi-step writes** such as forking a whole tree
//! - **Unit testing** against an in-memory backend
//! - **Backend flexibility** behind a small set of row-level operations
//!
//! # Architecture
//!
//! The crate provides:
//! - [`model`] types for documentations, page groups, pages and users
//! - [`SqliteStorage`] backed by a sqlx connection pool
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use quire_storage::{Associations, SqliteStorage, Storage, Transaction};
//!
//! let storage = SqliteStorage::open(Path::new("quire.db"), 5).await?;
//! let mut tx = storage.begin().await?;
//! let id = tx.create_documentation(&new_documentation).await?;
//! tx.commit().await?;
//! let doc = storage.load_documentation(id, Associations::DISPLAY).await?;
//! ```

#[cfg(feature = "mock")]
mod mock;
pub mod model;
mod sqlite;
mod storage;

#[cfg(feature = "mock")]
pub use mock::{MockStorage, MockTransaction, Operation};
pub use model::{
    Associations, DisplayMetadata, Documentation, DocumentationId, EntityKind, EntityRef,
    NewDocumentation, NewPage, NewPageGroup, NewUser, Page, PageGroup, PageGroupId, PageId,
    UserId, UserSummary,
};
pub use sqlite::{SqliteStorage, SqliteTransaction};
pub use storage::{Storage, StorageError, StorageErrorKind, Transaction};
