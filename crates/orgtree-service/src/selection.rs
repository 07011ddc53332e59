//! Which organization an editor currently has selected.

use orgtree_core::NodeId;

use crate::hooks::HierarchyChange;

/// Single-node selection for an editing session.
///
/// The selection is a plain id; [`reconcile`](SelectionState::reconcile)
/// keeps it from pointing at a node a committed delete has removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<NodeId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: NodeId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// Applies a committed change. Returns `true` if the selection was
    /// dropped because the selected node no longer exists.
    pub fn reconcile(&mut self, change: &HierarchyChange) -> bool {
        match self.selected {
            Some(id) if change.removes(id) => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_clear() {
        let mut selection = SelectionState::new();
        assert_eq!(selection.selected(), None);
        selection.select(NodeId(2));
        assert!(selection.is_selected(NodeId(2)));
        selection.select(NodeId(3));
        assert_eq!(selection.selected(), Some(NodeId(3)));
        selection.clear();
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn deleting_a_selected_subtree_drops_the_selection() {
        let mut selection = SelectionState::new();
        selection.select(NodeId(4));

        let rename = HierarchyChange::Updated {
            id: NodeId(4),
            reparented: false,
            descendants: Vec::new(),
        };
        assert!(!selection.reconcile(&rename));
        assert_eq!(selection.selected(), Some(NodeId(4)));

        let delete = HierarchyChange::Deleted {
            id: NodeId(3),
            removed: vec![NodeId(3), NodeId(4)],
        };
        assert!(selection.reconcile(&delete));
        assert_eq!(selection.selected(), None);
    }
}
