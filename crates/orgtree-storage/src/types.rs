//! Result types returned by store writes.

use orgtree_core::{NodeId, OrganizationNode};

/// Outcome of [`HierarchyStore::update_node`](crate::HierarchyStore::update_node),
/// captured inside the write itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUpdate {
    /// The node as stored after the write.
    pub node: OrganizationNode,
    /// The node's level before the write.
    pub previous_level: u32,
    /// `true` if the parent changed.
    pub reparented: bool,
    /// Every node below the updated one whose path changed with it. Empty
    /// for a rename.
    pub descendants: Vec<NodeId>,
}

impl NodeUpdate {
    pub fn level_delta(&self) -> i64 {
        i64::from(self.node.level) - i64::from(self.previous_level)
    }
}
