//! Storage error types for orgtree-storage.
//!
//! [`StorageError`] covers every failure mode of a hierarchy backend:
//! database and migration failures, missing nodes, and the structural
//! rejections (depth, cycles, root deletion) a store enforces itself.

use orgtree_core::{CoreError, NodeId};
use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite returned an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON encoding of query parameters failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The node being read or mutated does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested parent does not exist.
    #[error("parent node not found: {0}")]
    ParentNotFound(NodeId),

    /// A node name failed validation.
    #[error("invalid name: {reason}")]
    InvalidName { reason: String },

    /// The mutation would place a node deeper than the maximum level.
    #[error("depth limit exceeded: level {level} is beyond the maximum of {max}")]
    DepthExceeded { level: u32, max: u32 },

    /// The mutation would make a node its own ancestor.
    #[error("circular reference: {parent} cannot become the parent of {node}")]
    CircularReference { node: NodeId, parent: NodeId },

    /// Level-1 nodes cannot be deleted.
    #[error("root node {0} cannot be deleted")]
    RootDeletionRejected(NodeId),
}

impl From<CoreError> for StorageError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidName { reason } => StorageError::InvalidName { reason },
            CoreError::DepthExceeded { level, max } => StorageError::DepthExceeded { level, max },
            CoreError::CircularReference { node, parent } => {
                StorageError::CircularReference { node, parent }
            }
        }
    }
}
