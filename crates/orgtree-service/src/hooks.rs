//! Change notification for committed mutations.
//!
//! The service calls every registered [`ChangeHook`] after a mutation
//! commits. Hooks observe; they cannot veto or fail the mutation.

use orgtree_core::NodeId;
use serde::Serialize;

/// A committed change to the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyChange {
    /// A node was inserted.
    Created { id: NodeId },
    /// A node was renamed or reparented. `descendants` lists the nodes
    /// whose levels shifted along with it (empty for a rename).
    Updated {
        id: NodeId,
        reparented: bool,
        descendants: Vec<NodeId>,
    },
    /// A node and its subtree were removed. `removed` includes `id`.
    Deleted { id: NodeId, removed: Vec<NodeId> },
}

impl HierarchyChange {
    /// Every node id whose cached data this change invalidates.
    pub fn affected_ids(&self) -> Vec<NodeId> {
        match self {
            HierarchyChange::Created { id } => vec![*id],
            HierarchyChange::Updated {
                id, descendants, ..
            } => std::iter::once(*id).chain(descendants.iter().copied()).collect(),
            HierarchyChange::Deleted { removed, .. } => removed.clone(),
        }
    }

    /// Returns `true` if `id` no longer exists after this change.
    pub fn removes(&self, id: NodeId) -> bool {
        matches!(self, HierarchyChange::Deleted { removed, .. } if removed.contains(&id))
    }
}

/// Observer of committed hierarchy changes.
pub trait ChangeHook {
    fn on_change(&self, change: &HierarchyChange);
}

impl<F> ChangeHook for F
where
    F: Fn(&HierarchyChange),
{
    fn on_change(&self, change: &HierarchyChange) {
        self(change)
    }
}
