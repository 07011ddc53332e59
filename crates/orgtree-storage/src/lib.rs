//! Storage abstraction for the organization hierarchy.
//!
//! Provides the [`HierarchyStore`] trait defining the storage contract that
//! all backends implement, plus [`InMemoryStore`] and [`SqliteStore`] as
//! first-class backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: HierarchyStore trait definition
//! - [`types`]: NodeUpdate, the outcome of an update
//! - [`memory`]: InMemoryStore implementation (petgraph)
//! - [`schema`]: migrations and SQLite connection setup
//! - [`sqlite`]: SqliteStore implementation (recursive CTEs)

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::HierarchyStore;
pub use types::NodeUpdate;
