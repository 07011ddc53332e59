//! Tree codec: flat hierarchy rows to a nested tree and back.
//!
//! [`build_tree`] nests rows under their parents and [`flatten_tree`] walks
//! the result depth-first, pre-order. Both are pure.
//!
//! Rows whose parent is missing from the input are promoted to roots with a
//! warning instead of being dropped, so a partial listing still renders.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::node::FlatNode;

/// A read-only nested projection of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationTree {
    pub id: NodeId,
    pub name: String,
    pub level: u32,
    pub children: Vec<OrganizationTree>,
}

impl OrganizationTree {
    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(OrganizationTree::size).sum::<usize>()
    }
}

/// One row of a flattened tree. `level` drives indentation when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTreeRow {
    pub id: NodeId,
    pub name: String,
    pub level: u32,
}

/// Nests `rows` into a forest.
///
/// Sibling lists are stable-sorted ascending by level, so rows of equal level
/// keep their input order. Roots stay in input order. Duplicate ids keep the
/// first occurrence.
pub fn build_tree(rows: &[FlatNode]) -> Vec<OrganizationTree> {
    // id -> position in `rows`
    let mut index: IndexMap<NodeId, usize> = IndexMap::with_capacity(rows.len());
    for (pos, row) in rows.iter().enumerate() {
        if index.contains_key(&row.id) {
            tracing::warn!(node_id = %row.id, "duplicate node row ignored while building tree");
            continue;
        }
        index.insert(row.id, pos);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();

    for &pos in index.values() {
        let row = &rows[pos];
        match row.parent_id {
            Some(parent) if parent != row.id && index.contains_key(&parent) => {
                children[index[&parent]].push(pos);
            }
            Some(parent) => {
                tracing::warn!(
                    node_id = %row.id,
                    parent_id = %parent,
                    "parent not present in row set; treating node as root"
                );
                roots.push(pos);
            }
            None => roots.push(pos),
        }
    }

    for list in children.iter_mut() {
        list.sort_by_key(|&pos| rows[pos].level);
    }

    let mut visited = HashSet::with_capacity(rows.len());
    let mut forest: Vec<OrganizationTree> = roots
        .iter()
        .map(|&pos| materialize(rows, &children, pos, &mut visited))
        .collect();

    // Rows caught in a parent cycle are unreachable from any root. Surface
    // them rather than losing them.
    for &pos in index.values() {
        if !visited.contains(&pos) {
            tracing::warn!(node_id = %rows[pos].id, "node is part of a parent cycle; treating as root");
            forest.push(materialize(rows, &children, pos, &mut visited));
        }
    }

    forest
}

fn materialize(
    rows: &[FlatNode],
    children: &[Vec<usize>],
    pos: usize,
    visited: &mut HashSet<usize>,
) -> OrganizationTree {
    visited.insert(pos);
    let row = &rows[pos];
    let mut nested = Vec::with_capacity(children[pos].len());
    for &child in &children[pos] {
        if visited.contains(&child) {
            continue;
        }
        nested.push(materialize(rows, children, child, visited));
    }
    OrganizationTree {
        id: row.id,
        name: row.name.clone(),
        level: row.level,
        children: nested,
    }
}

/// Flattens a forest depth-first, pre-order: every parent precedes its
/// descendants and siblings keep their tree order.
pub fn flatten_tree(forest: &[OrganizationTree]) -> Vec<FlatTreeRow> {
    let mut out = Vec::new();
    for tree in forest {
        push_preorder(tree, &mut out);
    }
    out
}

fn push_preorder(tree: &OrganizationTree, out: &mut Vec<FlatTreeRow>) {
    out.push(FlatTreeRow {
        id: tree.id,
        name: tree.name.clone(),
        level: tree.level,
    });
    for child in &tree.children {
        push_preorder(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(id: i64, name: &str, parent: Option<i64>, level: u32) -> FlatNode {
        FlatNode {
            id: NodeId(id),
            name: name.to_string(),
            parent_id: parent.map(NodeId),
            level,
        }
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        assert!(build_tree(&[]).is_empty());
        assert!(flatten_tree(&[]).is_empty());
    }

    #[test]
    fn nests_children_under_parents() {
        let rows = vec![
            row(1, "Co", None, 1),
            row(2, "DivA", Some(1), 2),
            row(3, "DivB", Some(1), 2),
            row(4, "Dept", Some(3), 3),
        ];
        let forest = build_tree(&rows);

        assert_eq!(forest.len(), 1);
        let co = &forest[0];
        assert_eq!(co.name, "Co");
        assert_eq!(co.children.len(), 2);
        assert_eq!(co.children[0].name, "DivA");
        assert_eq!(co.children[1].name, "DivB");
        assert_eq!(co.children[1].children[0].name, "Dept");
        assert_eq!(co.size(), 4);
    }

    #[test]
    fn children_listed_before_parent_still_attach() {
        let rows = vec![
            row(4, "Team", Some(3), 3),
            row(3, "Div", Some(1), 2),
            row(1, "Co", None, 1),
        ];
        let forest = build_tree(&rows);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].children[0].id, NodeId(4));
    }

    #[test]
    fn equal_level_siblings_keep_input_order() {
        let rows = vec![
            row(1, "Co", None, 1),
            row(9, "Zeta", Some(1), 2),
            row(5, "Alpha", Some(1), 2),
            row(7, "Mid", Some(1), 2),
        ];
        let forest = build_tree(&rows);
        let names: Vec<_> = forest[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn dangling_parent_is_promoted_to_root() {
        let rows = vec![row(1, "Co", None, 1), row(5, "Orphan", Some(99), 3)];
        let forest = build_tree(&rows);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, NodeId(1));
        assert_eq!(forest[1].id, NodeId(5));
        assert_eq!(forest[1].level, 3);
    }

    #[test]
    fn promoted_roots_keep_input_order() {
        let rows = vec![row(5, "Orphan", Some(99), 3), row(1, "Co", None, 1)];
        let forest = build_tree(&rows);

        let ids: Vec<_> = forest.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![NodeId(5), NodeId(1)]);
    }

    #[test]
    fn multiple_roots_are_allowed() {
        let rows = vec![row(1, "A", None, 1), row(2, "B", None, 1)];
        assert_eq!(build_tree(&rows).len(), 2);
    }

    #[test]
    fn cyclic_rows_are_surfaced_not_dropped() {
        let rows = vec![row(1, "A", Some(2), 2), row(2, "B", Some(1), 2)];
        let forest = build_tree(&rows);
        let flat = flatten_tree(&forest);
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn flatten_is_preorder() {
        let rows = vec![
            row(1, "Co", None, 1),
            row(2, "DivA", Some(1), 2),
            row(3, "DivB", Some(1), 2),
            row(4, "DeptA", Some(2), 3),
            row(5, "DeptB", Some(3), 3),
        ];
        let flat = flatten_tree(&build_tree(&rows));
        let ids: Vec<i64> = flat.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4, 3, 5]);
    }

    /// Generates a well-formed forest: every row's parent appears earlier.
    fn arb_rows() -> impl Strategy<Value = Vec<FlatNode>> {
        prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..40).prop_map(
            |picks| {
                let mut rows: Vec<FlatNode> = Vec::with_capacity(picks.len());
                for (i, (pick, make_root)) in picks.into_iter().enumerate() {
                    let id = NodeId(i as i64 + 1);
                    let candidates: Vec<&FlatNode> =
                        rows.iter().filter(|r| r.level < 4).collect();
                    let parent = if make_root || candidates.is_empty() {
                        None
                    } else {
                        Some(candidates[pick.index(candidates.len())])
                    };
                    let (parent_id, level) = match parent {
                        Some(p) => (Some(p.id), p.level + 1),
                        None => (None, 1),
                    };
                    rows.push(FlatNode {
                        id,
                        name: format!("unit-{i}"),
                        parent_id,
                        level,
                    });
                }
                rows
            },
        )
    }

    proptest! {
        #[test]
        fn flatten_preserves_triples_and_ancestry(rows in arb_rows()) {
            let flat = flatten_tree(&build_tree(&rows));

            let mut expected: Vec<(i64, String, u32)> =
                rows.iter().map(|r| (r.id.0, r.name.clone(), r.level)).collect();
            let mut actual: Vec<(i64, String, u32)> =
                flat.iter().map(|r| (r.id.0, r.name.clone(), r.level)).collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);

            let position: std::collections::HashMap<NodeId, usize> =
                flat.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
            for r in &rows {
                if let Some(parent) = r.parent_id {
                    prop_assert!(position[&parent] < position[&r.id]);
                }
            }
        }
    }
}
