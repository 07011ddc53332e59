//! Core data model for the organization hierarchy engine.
//!
//! - [`id`]: the [`NodeId`] newtype
//! - [`node`]: [`OrganizationNode`], flat rows and level arithmetic
//! - [`validate`]: name validation
//! - [`tree`]: the tree codec ([`build_tree`], [`flatten_tree`])
//! - [`integrity`]: invariant audit over flat rows
//! - [`employee`]: employee/organization associations carrying a path
//! - [`error`]: [`CoreError`]

pub mod employee;
pub mod error;
pub mod id;
pub mod integrity;
pub mod node;
pub mod tree;
pub mod validate;

// Re-export commonly used types
pub use employee::EmployeeOrganization;
pub use error::CoreError;
pub use id::NodeId;
pub use integrity::{verify_rows, IntegrityFinding};
pub use node::{
    child_level, join_path, shift_level, AncestorEntry, FlatNode, OrganizationNode, MAX_LEVEL,
    MAX_NAME_LEN, PATH_SEPARATOR, ROOT_LEVEL,
};
pub use tree::{build_tree, flatten_tree, FlatTreeRow, OrganizationTree};
pub use validate::normalize_name;
