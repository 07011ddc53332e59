//! HierarchyService: the single coordinator between callers and the
//! hierarchy store.
//!
//! Every mutation is validated here (name rules, cycle prevention) before
//! the store runs its own structural checks inside one transaction. Store
//! errors are translated into [`HierarchyError`], and committed mutations
//! are announced to the registered [`ChangeHook`]s.

use std::collections::{BTreeSet, HashMap};

use orgtree_core::{
    build_tree, flatten_tree, normalize_name, verify_rows, AncestorEntry, EmployeeOrganization,
    FlatTreeRow, IntegrityFinding, NodeId, OrganizationNode, OrganizationTree,
};
use orgtree_storage::HierarchyStore;

use crate::error::HierarchyError;
use crate::hooks::{ChangeHook, HierarchyChange};
use crate::paths::PathResolver;
use crate::requests::{CreateNodeRequest, UpdateNodeRequest};

/// The organization hierarchy service.
///
/// Owns its store; there is no shared global state. Each method runs to
/// completion against the store before returning.
pub struct HierarchyService<S: HierarchyStore> {
    store: S,
    hooks: Vec<Box<dyn ChangeHook>>,
}

impl<S: HierarchyStore> HierarchyService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    /// Registers a hook called after every committed mutation.
    pub fn add_hook(&mut self, hook: impl ChangeHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Creates an organization under `parent_id`, or a top-level one.
    ///
    /// The name is validated before the store is touched; parent existence
    /// and the depth limit are enforced by the store.
    pub fn create_node(
        &mut self,
        request: CreateNodeRequest,
    ) -> Result<OrganizationNode, HierarchyError> {
        const OP: &str = "create_node";
        let name = normalize_name(&request.name).map_err(|e| rejected(OP, e.into()))?;

        let node = self
            .store
            .create_node(&name, request.parent_id)
            .map_err(|e| rejected(OP, HierarchyError::from_storage(OP, e)))?;

        tracing::info!(
            node_id = %node.id,
            parent_id = ?node.parent_id,
            level = node.level,
            "organization created"
        );
        self.notify(HierarchyChange::Created { id: node.id });
        Ok(node)
    }

    /// Renames and/or reparents an organization.
    ///
    /// A non-null parent must pass
    /// [`validate_parent_selection`](Self::validate_parent_selection). The
    /// store then applies the new parent and shifts every descendant's level
    /// in one transaction.
    pub fn update_node(
        &mut self,
        request: UpdateNodeRequest,
    ) -> Result<OrganizationNode, HierarchyError> {
        const OP: &str = "update_node";
        let name = normalize_name(&request.name).map_err(|e| rejected(OP, e.into()))?;

        if let Some(parent) = request.parent_id {
            if !self.validate_parent_selection(request.id, Some(parent))? {
                return Err(rejected(
                    OP,
                    HierarchyError::CircularReference {
                        node: request.id,
                        parent,
                    },
                ));
            }
        }

        let update = self
            .store
            .update_node(request.id, &name, request.parent_id)
            .map_err(|e| rejected(OP, HierarchyError::from_storage(OP, e)))?;

        tracing::info!(
            node_id = %update.node.id,
            parent_id = ?update.node.parent_id,
            level = update.node.level,
            level_delta = update.level_delta(),
            descendants = update.descendants.len(),
            "organization updated"
        );
        self.notify(HierarchyChange::Updated {
            id: update.node.id,
            reparented: update.reparented,
            descendants: update.descendants,
        });
        Ok(update.node)
    }

    /// Deletes an organization and its whole subtree.
    ///
    /// Top-level organizations fail with
    /// [`HierarchyError::RootDeletionRejected`].
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        const OP: &str = "delete_node";
        let removed = self
            .store
            .delete_node(id)
            .map_err(|e| rejected(OP, HierarchyError::from_storage(OP, e)))?;

        tracing::info!(node_id = %id, removed = removed.len(), "organization deleted");
        self.notify(HierarchyChange::Deleted { id, removed });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation helpers
    // -----------------------------------------------------------------------

    /// Returns whether `candidate` may become the parent of `node_id`.
    ///
    /// `None` is always valid. The node itself and any of its descendants
    /// are not.
    pub fn validate_parent_selection(
        &self,
        node_id: NodeId,
        candidate: Option<NodeId>,
    ) -> Result<bool, HierarchyError> {
        let Some(candidate) = candidate else {
            return Ok(true);
        };
        if candidate == node_id {
            return Ok(false);
        }
        let descendants = self
            .store
            .get_descendant_ids(node_id)
            .map_err(|e| HierarchyError::from_storage("validate_parent_selection", e))?;
        Ok(!descendants.contains(&candidate))
    }

    /// Number of nodes a delete of `id` would remove besides `id` itself.
    pub fn get_descendant_count(&self, id: NodeId) -> Result<usize, HierarchyError> {
        self.store
            .get_descendant_ids(id)
            .map(|ids| ids.len())
            .map_err(|e| HierarchyError::from_storage("get_descendant_count", e))
    }

    /// Confirmation text shown before deleting `id`.
    pub fn deletion_warning(&self, id: NodeId) -> Result<String, HierarchyError> {
        let count = self.get_descendant_count(id)?;
        Ok(match count {
            0 => "No descendants will be removed".to_string(),
            1 => "1 descendant will be removed".to_string(),
            n => format!("{n} descendants will be removed"),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_node(&self, id: NodeId) -> Result<OrganizationNode, HierarchyError> {
        self.store
            .get_node(id)
            .map_err(|e| HierarchyError::from_storage("get_node", e))
    }

    /// The whole hierarchy as a forest of top-level organizations.
    pub fn get_hierarchy_tree(&self) -> Result<Vec<OrganizationTree>, HierarchyError> {
        let rows = self
            .store
            .list_nodes()
            .map_err(|e| HierarchyError::from_storage("get_hierarchy_tree", e))?;
        let tree = build_tree(&rows);
        tracing::debug!(nodes = rows.len(), roots = tree.len(), "hierarchy tree built");
        Ok(tree)
    }

    /// The hierarchy in pre-order, for indentation-based rendering.
    pub fn get_flat_hierarchy(&self) -> Result<Vec<FlatTreeRow>, HierarchyError> {
        Ok(flatten_tree(&self.get_hierarchy_tree()?))
    }

    /// Root-first ancestor chain of `id`, ending with `id` itself.
    pub fn get_ancestor_path(&self, id: NodeId) -> Result<Vec<AncestorEntry>, HierarchyError> {
        self.store
            .get_ancestor_path(id)
            .map_err(|e| HierarchyError::from_storage("get_ancestor_path", e))
    }

    /// Space-joined paths for every id in `ids`; unknown ids map to `""`.
    pub fn resolve_paths(
        &self,
        ids: &BTreeSet<NodeId>,
    ) -> Result<HashMap<NodeId, String>, HierarchyError> {
        PathResolver::new(&self.store)
            .resolve(ids)
            .map_err(|e| HierarchyError::from_storage("resolve_paths", e))
    }

    /// Back-fills the organization path of every record in one lookup.
    pub fn attach_organization_paths(
        &self,
        records: &mut [EmployeeOrganization],
    ) -> Result<(), HierarchyError> {
        PathResolver::new(&self.store)
            .attach(records)
            .map_err(|e| HierarchyError::from_storage("attach_organization_paths", e))
    }

    /// Audits the stored hierarchy. An empty list means every invariant
    /// holds.
    pub fn verify_hierarchy(&self) -> Result<Vec<IntegrityFinding>, HierarchyError> {
        let rows = self
            .store
            .list_nodes()
            .map_err(|e| HierarchyError::from_storage("verify_hierarchy", e))?;
        let findings = verify_rows(&rows);
        if findings.is_empty() {
            tracing::debug!(nodes = rows.len(), "hierarchy verified");
        } else {
            tracing::warn!(
                nodes = rows.len(),
                findings = findings.len(),
                "hierarchy integrity violations found"
            );
        }
        Ok(findings)
    }

    fn notify(&self, change: HierarchyChange) {
        for hook in &self.hooks {
            hook.on_change(&change);
        }
    }
}

/// Logs a rejected mutation. Storage failures were already logged at
/// error level when they were translated.
fn rejected(operation: &'static str, err: HierarchyError) -> HierarchyError {
    if !matches!(err, HierarchyError::StorageFailure { .. }) {
        tracing::warn!(operation, code = err.code(), error = %err, "mutation rejected");
    }
    err
}
