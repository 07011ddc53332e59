//! SQLite implementation of [`HierarchyStore`].
//!
//! [`SqliteStore`] keeps the hierarchy in a single self-referencing table.
//! Ancestor and descendant lookups are recursive CTEs; every write runs in an
//! `IMMEDIATE` transaction so the write lock is taken before any row is read.
//! Subtree removal relies on `ON DELETE CASCADE`.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use orgtree_core::{
    child_level, join_path, normalize_name, shift_level, AncestorEntry, FlatNode, NodeId,
    OrganizationNode, ROOT_LEVEL,
};

use crate::error::StorageError;
use crate::traits::HierarchyStore;
use crate::types::NodeUpdate;

/// Upper bound on recursion in traversal queries. Well above the level cap,
/// it only matters if stored parent pointers form a cycle.
const MAX_TRAVERSAL_DEPTH: u32 = 64;

const SELECT_NODE_SQL: &str = "SELECT id, name, parent_id, level, created_at, updated_at \
     FROM organization_nodes WHERE id = ?1";

const LIST_NODES_SQL: &str =
    "SELECT id, name, parent_id, level FROM organization_nodes ORDER BY level, id";

/// Every node below ?1 with its current level.
const DESCENDANTS_SQL: &str = "
WITH RECURSIVE subtree(id, level, depth) AS (
    SELECT id, level, 1
    FROM organization_nodes
    WHERE parent_id = ?1

    UNION ALL

    SELECT n.id, n.level, s.depth + 1
    FROM organization_nodes n
    JOIN subtree s ON n.parent_id = s.id
    WHERE s.depth < ?2
)
SELECT DISTINCT id, level FROM subtree";

/// Ancestor chains (inclusive) for every id in the JSON array ?1, root first.
const ANCESTOR_CHAINS_SQL: &str = "
WITH RECURSIVE chain(origin, id, parent_id, name, level, depth) AS (
    SELECT n.id, n.id, n.parent_id, n.name, n.level, 0
    FROM organization_nodes n
    WHERE n.id IN (SELECT value FROM json_each(?1))

    UNION ALL

    SELECT c.origin, p.id, p.parent_id, p.name, p.level, c.depth + 1
    FROM chain c
    JOIN organization_nodes p ON p.id = c.parent_id
    WHERE c.depth < ?2
)
SELECT origin, name, level FROM chain ORDER BY origin, level, depth DESC";

/// SQLite-backed implementation of [`HierarchyStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens a private in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }
}

// ---------------------------------------------------------------------------
// Query helpers
//
// These take `&Connection` so they run unchanged inside a `Transaction`
// (which derefs to `Connection`).
// ---------------------------------------------------------------------------

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<OrganizationNode> {
    Ok(OrganizationNode {
        id: NodeId(row.get(0)?),
        name: row.get(1)?,
        parent_id: row.get::<_, Option<i64>>(2)?.map(NodeId),
        level: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn fetch_node(conn: &Connection, id: NodeId) -> Result<Option<OrganizationNode>, StorageError> {
    let node = conn
        .prepare_cached(SELECT_NODE_SQL)?
        .query_row(params![id.0], row_to_node)
        .optional()?;
    Ok(node)
}

fn fetch_descendants(conn: &Connection, id: NodeId) -> Result<Vec<(NodeId, u32)>, StorageError> {
    let mut stmt = conn.prepare_cached(DESCENDANTS_SQL)?;
    let rows = stmt.query_map(params![id.0, MAX_TRAVERSAL_DEPTH], |row| {
        Ok((NodeId(row.get(0)?), row.get::<_, u32>(1)?))
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Runs [`ANCESTOR_CHAINS_SQL`] once for all `ids` and groups the rows by
/// the id they were requested for.
fn fetch_ancestor_chains(
    conn: &Connection,
    ids: &BTreeSet<NodeId>,
) -> Result<HashMap<NodeId, Vec<AncestorEntry>>, StorageError> {
    let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
    let json = serde_json::to_string(&raw)?;

    let mut stmt = conn.prepare_cached(ANCESTOR_CHAINS_SQL)?;
    let rows = stmt.query_map(params![json, MAX_TRAVERSAL_DEPTH], |row| {
        Ok((
            NodeId(row.get(0)?),
            AncestorEntry {
                name: row.get(1)?,
                level: row.get(2)?,
            },
        ))
    })?;

    let mut chains: HashMap<NodeId, Vec<AncestorEntry>> = HashMap::with_capacity(ids.len());
    for row in rows {
        let (origin, entry) = row?;
        chains.entry(origin).or_default().push(entry);
    }
    Ok(chains)
}

impl HierarchyStore for SqliteStore {
    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    fn get_node(&self, id: NodeId) -> Result<OrganizationNode, StorageError> {
        fetch_node(&self.conn, id)?.ok_or(StorageError::NodeNotFound(id))
    }

    fn list_nodes(&self) -> Result<Vec<FlatNode>, StorageError> {
        let mut stmt = self.conn.prepare_cached(LIST_NODES_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(FlatNode {
                id: NodeId(row.get(0)?),
                name: row.get(1)?,
                parent_id: row.get::<_, Option<i64>>(2)?.map(NodeId),
                level: row.get(3)?,
            })
        })?;
        let nodes = rows.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = nodes.len(), "listed organization nodes");
        Ok(nodes)
    }

    fn get_ancestor_path(&self, id: NodeId) -> Result<Vec<AncestorEntry>, StorageError> {
        let ids = BTreeSet::from([id]);
        let mut chains = fetch_ancestor_chains(&self.conn, &ids)?;
        Ok(chains.remove(&id).unwrap_or_default())
    }

    fn get_ancestor_paths_batch(
        &self,
        ids: &BTreeSet<NodeId>,
    ) -> Result<HashMap<NodeId, String>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let chains = fetch_ancestor_chains(&self.conn, ids)?;
        let paths: HashMap<NodeId, String> = ids
            .iter()
            .map(|id| {
                let path = chains
                    .get(id)
                    .map(|chain| join_path(chain.iter().map(|e| e.name.as_str())))
                    .unwrap_or_default();
                (*id, path)
            })
            .collect();
        tracing::debug!(requested = ids.len(), resolved = chains.len(), "resolved ancestor paths");
        Ok(paths)
    }

    fn get_descendant_ids(&self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
        if fetch_node(&self.conn, id)?.is_none() {
            return Err(StorageError::NodeNotFound(id));
        }
        Ok(fetch_descendants(&self.conn, id)?
            .into_iter()
            .map(|(id, _)| id)
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
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let parent_level = match parent_id {
            Some(pid) => Some(
                fetch_node(&tx, pid)?
                    .ok_or(StorageError::ParentNotFound(pid))?
                    .level,
            ),
            None => None,
        };
        let level = child_level(parent_level)?;

        let now = Utc::now();
        tx.execute(
            "INSERT INTO organization_nodes (name, parent_id, level, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, parent_id.map(|p| p.0), level, now],
        )?;
        let id = NodeId(tx.last_insert_rowid());
        let node = fetch_node(&tx, id)?.ok_or(StorageError::NodeNotFound(id))?;
        tx.commit()?;

        tracing::info!(node_id = %id, level, "organization node created");
        Ok(node)
    }

    fn update_node(
        &mut self,
        id: NodeId,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<NodeUpdate, StorageError> {
        let name = normalize_name(name)?;
        let now = Utc::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = fetch_node(&tx, id)?.ok_or(StorageError::NodeNotFound(id))?;

        if current.parent_id == parent_id {
            tx.execute(
                "UPDATE organization_nodes SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now, id.0],
            )?;
            let node = fetch_node(&tx, id)?.ok_or(StorageError::NodeNotFound(id))?;
            tx.commit()?;
            tracing::info!(node_id = %id, "organization node renamed");
            return Ok(NodeUpdate {
                node,
                previous_level: current.level,
                reparented: false,
                descendants: Vec::new(),
            });
        }

        let new_level = match parent_id {
            Some(pid) if pid == id => {
                return Err(StorageError::CircularReference { node: id, parent: pid });
            }
            Some(pid) => {
                let parent = fetch_node(&tx, pid)?.ok_or(StorageError::ParentNotFound(pid))?;
                child_level(Some(parent.level))?
            }
            None => ROOT_LEVEL,
        };

        // Re-checked under the write lock: the caller's parent validation may
        // be stale by now.
        let descendants = fetch_descendants(&tx, id)?;
        if let Some(pid) = parent_id {
            if descendants.iter().any(|(d, _)| *d == pid) {
                return Err(StorageError::CircularReference { node: id, parent: pid });
            }
        }

        let delta = i64::from(new_level) - i64::from(current.level);
        for (_, level) in &descendants {
            shift_level(*level, delta)?;
        }

        tx.execute(
            "UPDATE organization_nodes SET name = ?1, parent_id = ?2, level = ?3, updated_at = ?4 \
             WHERE id = ?5",
            params![name, parent_id.map(|p| p.0), new_level, now, id.0],
        )?;
        if delta != 0 {
            let mut stmt = tx.prepare_cached(
                "UPDATE organization_nodes SET level = level + ?1, updated_at = ?2 WHERE id = ?3",
            )?;
            for (descendant, _) in &descendants {
                stmt.execute(params![delta, now, descendant.0])?;
            }
        }

        let node = fetch_node(&tx, id)?.ok_or(StorageError::NodeNotFound(id))?;
        tx.commit()?;

        tracing::info!(
            node_id = %id,
            level = new_level,
            level_delta = delta,
            descendants = descendants.len(),
            "organization node reparented"
        );
        Ok(NodeUpdate {
            node,
            previous_level: current.level,
            reparented: true,
            descendants: descendants.into_iter().map(|(d, _)| d).collect(),
        })
    }

    fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let node = fetch_node(&tx, id)?.ok_or(StorageError::NodeNotFound(id))?;
        if node.level == ROOT_LEVEL {
            return Err(StorageError::RootDeletionRejected(id));
        }

        // Read under the write lock, so this is exactly what the cascade
        // removes.
        let removed: Vec<NodeId> = std::iter::once(id)
            .chain(fetch_descendants(&tx, id)?.into_iter().map(|(d, _)| d))
            .collect();
        // ON DELETE CASCADE removes the subtree.
        tx.execute("DELETE FROM organization_nodes WHERE id = ?1", params![id.0])?;
        tx.commit()?;

        tracing::info!(node_id = %id, removed = removed.len(), "organization subtree deleted");
        Ok(removed)
    }
}
