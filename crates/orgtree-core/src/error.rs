//! Core error types for orgtree-core.
//!
//! Uses `thiserror` for structured, matchable variants covering the pure
//! (storage-independent) rules of the hierarchy model.

use thiserror::Error;

use crate::id::NodeId;

/// Errors produced by the pure hierarchy rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A node name failed validation (empty or too long).
    #[error("invalid name: {reason}")]
    InvalidName { reason: String },

    /// A child would land deeper than the maximum hierarchy level.
    #[error("depth limit exceeded: level {level} is beyond the maximum of {max}")]
    DepthExceeded { level: u32, max: u32 },

    /// A node would become its own ancestor.
    #[error("circular reference: {parent} cannot become the parent of {node}")]
    CircularReference { node: NodeId, parent: NodeId },
}
