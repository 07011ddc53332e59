//! Hierarchy service layer: request validation, orchestration of the store,
//! and the uniform result returned to callers.
//!
//! # Modules
//!
//! - [`service`]: HierarchyService, the coordinator for every operation
//! - [`requests`]: create/update request types
//! - [`error`]: HierarchyError and the ActionResult envelope
//! - [`paths`]: PathResolver for batch organization paths
//! - [`hooks`]: ChangeHook and HierarchyChange
//! - [`selection`]: SelectionState for editing sessions

pub mod error;
pub mod hooks;
pub mod paths;
pub mod requests;
pub mod selection;
pub mod service;

pub use error::{ActionResult, ErrorDetail, HierarchyError, STORAGE_FAILURE_MESSAGE};
pub use hooks::{ChangeHook, HierarchyChange};
pub use paths::PathResolver;
pub use requests::{CreateNodeRequest, UpdateNodeRequest};
pub use selection::SelectionState;
pub use service::HierarchyService;
