//! Request types for the mutating service operations.
//!
//! Field names follow the camelCase wire form used by edit forms
//! (`parentId`), so a request body deserializes directly.

use orgtree_core::NodeId;
use serde::{Deserialize, Serialize};

/// Request to create an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub name: String,
    /// `None` creates a top-level organization.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

/// Request to rename and/or reparent an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    pub id: NodeId,
    pub name: String,
    /// The desired parent. Passing the current parent renames only.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_deserialize_from_camel_case() {
        let req: UpdateNodeRequest =
            serde_json::from_str(r#"{"id": 3, "name": "DivB", "parentId": 2}"#).unwrap();
        assert_eq!(req.id, NodeId(3));
        assert_eq!(req.parent_id, Some(NodeId(2)));

        let req: CreateNodeRequest = serde_json::from_str(r#"{"name": "Co"}"#).unwrap();
        assert_eq!(req.parent_id, None);
    }
}
