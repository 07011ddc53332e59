//! The [`HierarchyStore`] trait defining the storage contract for the
//! organization hierarchy.
//!
//! Two groups of methods:
//! - **Reads**: point lookup, flat listing, and the two recursive
//!   primitives (ancestor path, descendant ids) whose contract is the
//!   transitive closure over the parent edge.
//! - **Writes**: create, update, delete. Each write is one atomic unit of
//!   work: a reparent updates the node and every descendant's level
//!   together or not at all.
//!
//! All backends ([`InMemoryStore`](crate::InMemoryStore),
//! [`SqliteStore`](crate::SqliteStore)) implement this trait and are
//! swappable behind the service layer.

use std::collections::{BTreeSet, HashMap};

use orgtree_core::{AncestorEntry, FlatNode, NodeId, OrganizationNode};

use crate::error::StorageError;
use crate::types::NodeUpdate;

/// The storage contract for organization nodes.
///
/// The trait is synchronous: every operation is request-scoped and runs to
/// completion on the caller's thread.
pub trait HierarchyStore {
    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    /// Retrieves a node by ID.
    fn get_node(&self, id: NodeId) -> Result<OrganizationNode, StorageError>;

    /// Lists every node as a flat row, ordered by level then id.
    fn list_nodes(&self) -> Result<Vec<FlatNode>, StorageError>;

    /// Returns the chain of ancestors of `id`, root first and `id` itself
    /// last. Empty if the node does not exist.
    fn get_ancestor_path(&self, id: NodeId) -> Result<Vec<AncestorEntry>, StorageError>;

    /// Resolves the space-joined ancestor path of every id in one bounded
    /// operation. Every requested id is a key of the result; ids with no
    /// resolvable path map to the empty string.
    fn get_ancestor_paths_batch(
        &self,
        ids: &BTreeSet<NodeId>,
    ) -> Result<HashMap<NodeId, String>, StorageError>;

    /// Returns every node transitively parented under `id`, excluding `id`.
    /// No ordering is guaranteed.
    fn get_descendant_ids(&self, id: NodeId) -> Result<Vec<NodeId>, StorageError>;

    // -------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------

    /// Inserts a node. Its level is 1 for a root, otherwise one below the
    /// parent.
    ///
    /// Fails with [`StorageError::ParentNotFound`] for an unknown parent and
    /// [`StorageError::DepthExceeded`] when the parent is at the maximum
    /// level.
    fn create_node(
        &mut self,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<OrganizationNode, StorageError>;

    /// Renames and/or reparents a node.
    ///
    /// An unchanged `parent_id` only renames. A changed parent recomputes
    /// the node's level and shifts every descendant by the same delta in a
    /// single transaction. The returned [`NodeUpdate`] lists the moved
    /// descendants as seen by that transaction.
    fn update_node(
        &mut self,
        id: NodeId,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<NodeUpdate, StorageError>;

    /// Deletes a node together with its whole subtree and returns the ids
    /// removed, `id` first.
    ///
    /// Level-1 nodes are rejected with [`StorageError::RootDeletionRejected`].
    fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, StorageError>;
}
