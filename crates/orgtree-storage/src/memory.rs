//! In-memory implementation of [`HierarchyStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and ephemeral
//! sessions. The hierarchy lives in a petgraph `StableGraph` with one
//! parent -> child edge per relationship, so the parent pointer and the
//! children lists cannot disagree. Semantics match the SQLite backend.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Dfs;
use petgraph::Direction;

use orgtree_core::{
    child_level, join_path, normalize_name, shift_level, AncestorEntry, FlatNode, NodeId,
    OrganizationNode, ROOT_LEVEL,
};

use crate::error::StorageError;
use crate::traits::HierarchyStore;
use crate::types::NodeUpdate;

/// Node payload stored in the graph. The parent is the graph's incoming edge.
#[derive(Debug, Clone)]
struct StoredNode {
    id: NodeId,
    name: String,
    level: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// In-memory implementation of [`HierarchyStore`].
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    graph: StableDiGraph<StoredNode, ()>,
    index: HashMap<NodeId, NodeIndex>,
    next_id: i64,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        InMemoryStore {
            graph: StableDiGraph::default(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no nodes are stored.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn node_index(&self, id: NodeId) -> Result<NodeIndex, StorageError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(StorageError::NodeNotFound(id))
    }

    fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    fn materialize(&self, idx: NodeIndex) -> OrganizationNode {
        let stored = &self.graph[idx];
        OrganizationNode {
            id: stored.id,
            name: stored.name.clone(),
            parent_id: self.parent_of(idx).map(|p| self.graph[p].id),
            level: stored.level,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// Every node below `idx`, excluding `idx`.
    fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut dfs = Dfs::new(&self.graph, idx);
        let mut out = Vec::new();
        while let Some(nx) = dfs.next(&self.graph) {
            if nx != idx {
                out.push(nx);
            }
        }
        out
    }

    /// `idx` and its ancestors, root first.
    fn chain(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![idx];
        let mut current = idx;
        while let Some(parent) = self.parent_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyStore for InMemoryStore {
    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    fn get_node(&self, id: NodeId) -> Result<OrganizationNode, StorageError> {
        let idx = self.node_index(id)?;
        Ok(self.materialize(idx))
    }

    fn list_nodes(&self) -> Result<Vec<FlatNode>, StorageError> {
        let mut rows: Vec<FlatNode> = self
            .index
            .values()
            .map(|&idx| self.materialize(idx).to_flat())
            .collect();
        rows.sort_by_key(|r| (r.level, r.id));
        Ok(rows)
    }

    fn get_ancestor_path(&self, id: NodeId) -> Result<Vec<AncestorEntry>, StorageError> {
        let Some(&idx) = self.index.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .chain(idx)
            .into_iter()
            .map(|nx| AncestorEntry {
                name: self.graph[nx].name.clone(),
                level: self.graph[nx].level,
            })
            .collect())
    }

    fn get_ancestor_paths_batch(
        &self,
        ids: &BTreeSet<NodeId>,
    ) -> Result<HashMap<NodeId, String>, StorageError> {
        let mut paths = HashMap::with_capacity(ids.len());
        for &id in ids {
            let path = match self.index.get(&id) {
                Some(&idx) => {
                    let chain = self.chain(idx);
                    join_path(chain.iter().map(|&nx| self.graph[nx].name.as_str()))
                }
                None => String::new(),
            };
            paths.insert(id, path);
        }
        Ok(paths)
    }

    fn get_descendant_ids(&self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
        let idx = self.node_index(id)?;
        Ok(self
            .descendants(idx)
            .into_iter()
            .map(|nx| self.graph[nx].id)
            .collect())
    }

    // -------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------

    fn create_node(
        &mut self,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<OrganizationNode, StorageError> {
        let name = normalize_name(name)?;
        let parent_idx = match parent_id {
            Some(pid) => Some(
                self.index
                    .get(&pid)
                    .copied()
                    .ok_or(StorageError::ParentNotFound(pid))?,
            ),
            None => None,
        };
        let level = child_level(parent_idx.map(|p| self.graph[p].level))?;

        let id = NodeId(self.next_id);
        self.next_id += 1;
        let now = Utc::now();
        let idx = self.graph.add_node(StoredNode {
            id,
            name,
            level,
            created_at: now,
            updated_at: now,
        });
        if let Some(parent) = parent_idx {
            self.graph.add_edge(parent, idx, ());
        }
        self.index.insert(id, idx);

        tracing::info!(node_id = %id, level, "organization node created");
        Ok(self.materialize(idx))
    }

    fn update_node(
        &mut self,
        id: NodeId,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<NodeUpdate, StorageError> {
        let name = normalize_name(name)?;
        let idx = self.node_index(id)?;
        let current_parent = self.parent_of(idx).map(|p| self.graph[p].id);
        let old_level = self.graph[idx].level;
        let now = Utc::now();

        if current_parent == parent_id {
            let stored = &mut self.graph[idx];
            stored.name = name;
            stored.updated_at = now;
            tracing::info!(node_id = %id, "organization node renamed");
            return Ok(NodeUpdate {
                node: self.materialize(idx),
                previous_level: old_level,
                reparented: false,
                descendants: Vec::new(),
            });
        }

        // Every check runs before the first write, so a rejected reparent
        // leaves the graph untouched.
        let new_parent_idx = match parent_id {
            Some(pid) if pid == id => {
                return Err(StorageError::CircularReference { node: id, parent: pid });
            }
            Some(pid) => Some(
                self.index
                    .get(&pid)
                    .copied()
                    .ok_or(StorageError::ParentNotFound(pid))?,
            ),
            None => None,
        };
        let descendants = self.descendants(idx);
        if let Some(parent) = new_parent_idx {
            if descendants.contains(&parent) {
                return Err(StorageError::CircularReference {
                    node: id,
                    parent: self.graph[parent].id,
                });
            }
        }

        let new_level = child_level(new_parent_idx.map(|p| self.graph[p].level))?;
        let delta = i64::from(new_level) - i64::from(old_level);
        let shifted: Vec<(NodeIndex, u32)> = descendants
            .iter()
            .map(|&nx| shift_level(self.graph[nx].level, delta).map(|level| (nx, level)))
            .collect::<Result<_, _>>()?;

        if let Some(old_parent) = self.parent_of(idx) {
            if let Some(edge) = self.graph.find_edge(old_parent, idx) {
                self.graph.remove_edge(edge);
            }
        }
        if let Some(parent) = new_parent_idx {
            self.graph.add_edge(parent, idx, ());
        }
        {
            let stored = &mut self.graph[idx];
            stored.name = name;
            stored.level = new_level;
            stored.updated_at = now;
        }
        for (nx, level) in shifted {
            let stored = &mut self.graph[nx];
            stored.level = level;
            stored.updated_at = now;
        }

        tracing::info!(
            node_id = %id,
            level = new_level,
            level_delta = delta,
            descendants = descendants.len(),
            "organization node reparented"
        );
        Ok(NodeUpdate {
            node: self.materialize(idx),
            previous_level: old_level,
            reparented: true,
            descendants: descendants.iter().map(|&nx| self.graph[nx].id).collect(),
        })
    }

    fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
        let idx = self.node_index(id)?;
        if self.graph[idx].level == ROOT_LEVEL {
            return Err(StorageError::RootDeletionRejected(id));
        }

        let mut doomed = vec![idx];
        doomed.extend(self.descendants(idx));
        let mut removed = Vec::with_capacity(doomed.len());
        for nx in doomed {
            if let Some(stored) = self.graph.remove_node(nx) {
                self.index.remove(&stored.id);
                removed.push(stored.id);
            }
        }

        tracing::info!(node_id = %id, removed = removed.len(), "organization subtree deleted");
        Ok(removed)
    }
}
