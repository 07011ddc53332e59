//! Employee-to-organization associations.
//!
//! Employees themselves live outside this engine; only the association and
//! its derived, never-persisted path string are modelled here.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Links an employee to the organizational unit they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeOrganization {
    pub employee_id: String,
    pub organization_id: NodeId,
    /// Space-joined ancestor names. Recomputed on every read, empty until
    /// resolved or when the organization no longer exists.
    #[serde(default)]
    pub organization_path: String,
}

impl EmployeeOrganization {
    pub fn new(employee_id: impl Into<String>, organization_id: NodeId) -> Self {
        EmployeeOrganization {
            employee_id: employee_id.into(),
            organization_id,
            organization_path: String::new(),
        }
    }
}
