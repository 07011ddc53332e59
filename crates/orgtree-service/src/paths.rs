//! Batch resolution of organization paths for employee records.
//!
//! A listing of N employee records touches at most N distinct
//! organizations. [`PathResolver`] collects the distinct ids, resolves all
//! of their paths in one store round trip, and writes each path back onto
//! the records.

use std::collections::{BTreeSet, HashMap};

use orgtree_core::{EmployeeOrganization, NodeId};
use orgtree_storage::{HierarchyStore, StorageError};

/// Read-only path lookup over a borrowed store.
pub struct PathResolver<'a, S: HierarchyStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: HierarchyStore + ?Sized> PathResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Maps every id in `ids` to its space-joined ancestor path.
    ///
    /// Unknown ids map to `""`. An empty set returns an empty map without
    /// touching the store.
    pub fn resolve(&self, ids: &BTreeSet<NodeId>) -> Result<HashMap<NodeId, String>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut paths = self.store.get_ancestor_paths_batch(ids)?;
        for id in ids {
            paths.entry(*id).or_default();
        }
        tracing::debug!(requested = ids.len(), "resolved organization paths");
        Ok(paths)
    }

    /// Fills `organization_path` on every record from one batch lookup.
    pub fn attach(&self, records: &mut [EmployeeOrganization]) -> Result<(), StorageError> {
        let ids: BTreeSet<NodeId> = records.iter().map(|r| r.organization_id).collect();
        let paths = self.resolve(&ids)?;
        for record in records.iter_mut() {
            record.organization_path = paths
                .get(&record.organization_id)
                .cloned()
                .unwrap_or_default();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use orgtree_core::{AncestorEntry, FlatNode, OrganizationNode};
    use orgtree_storage::{InMemoryStore, NodeUpdate};

    use super::*;

    /// Delegates to an [`InMemoryStore`] and counts batch lookups.
    struct CountingStore {
        inner: InMemoryStore,
        batch_calls: Cell<usize>,
    }

    impl HierarchyStore for CountingStore {
        fn get_node(&self, id: NodeId) -> Result<OrganizationNode, StorageError> {
            self.inner.get_node(id)
        }

        fn list_nodes(&self) -> Result<Vec<FlatNode>, StorageError> {
            self.inner.list_nodes()
        }

        fn get_ancestor_path(&self, id: NodeId) -> Result<Vec<AncestorEntry>, StorageError> {
            self.inner.get_ancestor_path(id)
        }

        fn get_ancestor_paths_batch(
            &self,
            ids: &BTreeSet<NodeId>,
        ) -> Result<HashMap<NodeId, String>, StorageError> {
            self.batch_calls.set(self.batch_calls.get() + 1);
            self.inner.get_ancestor_paths_batch(ids)
        }

        fn get_descendant_ids(&self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
            self.inner.get_descendant_ids(id)
        }

        fn create_node(
            &mut self,
            name: &str,
            parent_id: Option<NodeId>,
        ) -> Result<OrganizationNode, StorageError> {
            self.inner.create_node(name, parent_id)
        }

        fn update_node(
            &mut self,
            id: NodeId,
            name: &str,
            parent_id: Option<NodeId>,
        ) -> Result<NodeUpdate, StorageError> {
            self.inner.update_node(id, name, parent_id)
        }

        fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, StorageError> {
            self.inner.delete_node(id)
        }
    }

    fn seeded() -> (CountingStore, NodeId, NodeId) {
        let mut store = CountingStore {
            inner: InMemoryStore::new(),
            batch_calls: Cell::new(0),
        };
        let co = store.create_node("Co", None).unwrap().id;
        let div = store.create_node("DivA", Some(co)).unwrap().id;
        (store, co, div)
    }

    #[test]
    fn empty_input_skips_the_store() {
        let (store, _, _) = seeded();
        let paths = PathResolver::new(&store).resolve(&BTreeSet::new()).unwrap();
        assert!(paths.is_empty());
        assert_eq!(store.batch_calls.get(), 0);
    }

    #[test]
    fn every_requested_id_is_a_key() {
        let (store, co, div) = seeded();
        let ids = BTreeSet::from([co, div, NodeId(999)]);
        let paths = PathResolver::new(&store).resolve(&ids).unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[&co], "Co");
        assert_eq!(paths[&div], "Co DivA");
        assert_eq!(paths[&NodeId(999)], "");
        assert_eq!(store.batch_calls.get(), 1);
    }

    #[test]
    fn attach_uses_one_lookup_for_repeated_organizations() {
        let (store, co, div) = seeded();
        let mut records = vec![
            EmployeeOrganization::new("e1", div),
            EmployeeOrganization::new("e2", div),
            EmployeeOrganization::new("e3", co),
        ];
        PathResolver::new(&store).attach(&mut records).unwrap();

        assert_eq!(store.batch_calls.get(), 1);
        assert_eq!(records[0].organization_path, "Co DivA");
        assert_eq!(records[1].organization_path, "Co DivA");
        assert_eq!(records[2].organization_path, "Co");
    }

    #[test]
    fn attach_with_no_records_does_nothing() {
        let (store, _, _) = seeded();
        let mut records: Vec<EmployeeOrganization> = Vec::new();
        PathResolver::new(&store).attach(&mut records).unwrap();
        assert_eq!(store.batch_calls.get(), 0);
    }
}
