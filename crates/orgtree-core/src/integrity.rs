//! Invariant audit over a flat listing of the hierarchy.
//!
//! [`verify_rows`] checks the stored rows against the hierarchy invariants
//! (level consistency, depth bound, referential integrity, acyclicity) and
//! reports every violation it finds. An empty result means the rows are
//! healthy.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::node::{FlatNode, MAX_LEVEL, ROOT_LEVEL};

/// One invariant violation found by [`verify_rows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityFinding {
    /// The cached level disagrees with the parent's level.
    LevelMismatch {
        id: NodeId,
        stored: u32,
        expected: u32,
    },
    /// The node sits deeper than [`MAX_LEVEL`].
    DepthOverflow { id: NodeId, level: u32 },
    /// The parent id does not exist.
    DanglingParent { id: NodeId, parent: NodeId },
    /// Following parent pointers from the node loops back to it.
    Cycle { id: NodeId },
}

impl fmt::Display for IntegrityFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityFinding::LevelMismatch { id, stored, expected } => write!(
                f,
                "node {id}: stored level {stored}, expected {expected}"
            ),
            IntegrityFinding::DepthOverflow { id, level } => {
                write!(f, "node {id}: level {level} exceeds maximum {MAX_LEVEL}")
            }
            IntegrityFinding::DanglingParent { id, parent } => {
                write!(f, "node {id}: parent {parent} does not exist")
            }
            IntegrityFinding::Cycle { id } => write!(f, "node {id}: parent chain forms a cycle"),
        }
    }
}

/// Audits `rows` and returns every invariant violation, in row order.
pub fn verify_rows(rows: &[FlatNode]) -> Vec<IntegrityFinding> {
    let by_id: HashMap<NodeId, &FlatNode> = rows.iter().map(|r| (r.id, r)).collect();
    let mut findings = Vec::new();

    for row in rows {
        if row.level > MAX_LEVEL {
            findings.push(IntegrityFinding::DepthOverflow {
                id: row.id,
                level: row.level,
            });
        }

        let expected = match row.parent_id {
            None => Some(ROOT_LEVEL),
            Some(parent) => match by_id.get(&parent) {
                Some(p) => Some(p.level + 1),
                None => {
                    findings.push(IntegrityFinding::DanglingParent {
                        id: row.id,
                        parent,
                    });
                    None
                }
            },
        };
        if let Some(expected) = expected {
            if expected != row.level {
                findings.push(IntegrityFinding::LevelMismatch {
                    id: row.id,
                    stored: row.level,
                    expected,
                });
            }
        }

        if in_cycle(row.id, &by_id) {
            findings.push(IntegrityFinding::Cycle { id: row.id });
        }
    }

    findings
}

fn in_cycle(start: NodeId, by_id: &HashMap<NodeId, &FlatNode>) -> bool {
    let mut seen = HashSet::new();
    let mut current = by_id.get(&start).and_then(|r| r.parent_id);
    while let Some(id) = current {
        if id == start {
            return true;
        }
        if !seen.insert(id) {
            // Loops above `start` without passing through it.
            return false;
        }
        current = by_id.get(&id).and_then(|r| r.parent_id);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, parent: Option<i64>, level: u32) -> FlatNode {
        FlatNode {
            id: NodeId(id),
            name: format!("n{id}"),
            parent_id: parent.map(NodeId),
            level,
        }
    }

    #[test]
    fn healthy_rows_have_no_findings() {
        let rows = vec![row(1, None, 1), row(2, Some(1), 2), row(3, Some(2), 3)];
        assert!(verify_rows(&rows).is_empty());
    }

    #[test]
    fn stale_level_is_reported() {
        let rows = vec![row(1, None, 1), row(2, Some(1), 3)];
        assert_eq!(
            verify_rows(&rows),
            vec![IntegrityFinding::LevelMismatch {
                id: NodeId(2),
                stored: 3,
                expected: 2
            }]
        );
    }

    #[test]
    fn overflow_dangling_and_cycles_are_reported() {
        let rows = vec![
            row(1, Some(2), 2),
            row(2, Some(1), 3),
            row(3, Some(77), 5),
        ];
        let findings = verify_rows(&rows);

        assert!(findings.contains(&IntegrityFinding::Cycle { id: NodeId(1) }));
        assert!(findings.contains(&IntegrityFinding::Cycle { id: NodeId(2) }));
        assert!(findings.contains(&IntegrityFinding::DepthOverflow {
            id: NodeId(3),
            level: 5
        }));
        assert!(findings.contains(&IntegrityFinding::DanglingParent {
            id: NodeId(3),
            parent: NodeId(77)
        }));
    }

    #[test]
    fn findings_render_readably() {
        let finding = IntegrityFinding::DanglingParent {
            id: NodeId(3),
            parent: NodeId(9),
        };
        assert_eq!(finding.to_string(), "node 3: parent 9 does not exist");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "dangling_parent");
    }
}
