//! Service error types and the uniform action result.
//!
//! [`HierarchyError`] is the single error type returned by every
//! [`HierarchyService`](crate::HierarchyService) operation. Callers that
//! render messages rather than match on variants convert a result into an
//! [`ActionResult`], which serializes as
//! `{"success": bool, "data"?: ..., "error"?: {code, message, field?}}`.

use orgtree_core::{CoreError, NodeId, MAX_LEVEL};
use orgtree_storage::StorageError;
use serde::Serialize;

/// Message shown to callers for any persistence failure.
pub const STORAGE_FAILURE_MESSAGE: &str = "operation failed";

/// Errors surfaced by the hierarchy service.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// A request field failed validation.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The referenced node or parent does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The mutation would place a node below the deepest allowed level.
    #[error("the hierarchy allows at most {max} levels")]
    DepthExceeded { max: u32 },

    /// The candidate parent is the node itself or one of its descendants.
    #[error("organization {parent} cannot become the parent of {node}: it is the node itself or one of its descendants")]
    CircularReference { node: NodeId, parent: NodeId },

    /// Top-level organizations cannot be deleted.
    #[error("organization {0} is a top-level organization and cannot be deleted")]
    RootDeletionRejected(NodeId),

    /// The storage backend failed.
    #[error("storage failure during {operation}: {source}")]
    StorageFailure {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

impl HierarchyError {
    /// Translates a store error raised while running `operation`.
    ///
    /// Persistence failures are logged here, with the operation name, so
    /// that the generic message callers see is never the only trace.
    pub fn from_storage(operation: &'static str, err: StorageError) -> Self {
        match err {
            StorageError::NodeNotFound(id) => {
                HierarchyError::NotFound(format!("organization {id} does not exist"))
            }
            StorageError::ParentNotFound(id) => {
                HierarchyError::NotFound(format!("parent organization {id} does not exist"))
            }
            StorageError::InvalidName { reason } => HierarchyError::Validation {
                field: "name",
                message: reason,
            },
            StorageError::DepthExceeded { max, .. } => HierarchyError::DepthExceeded { max },
            StorageError::CircularReference { node, parent } => {
                HierarchyError::CircularReference { node, parent }
            }
            StorageError::RootDeletionRejected(id) => HierarchyError::RootDeletionRejected(id),
            source @ (StorageError::Sqlite(_)
            | StorageError::Migration(_)
            | StorageError::Serialization(_)) => {
                tracing::error!(operation, error = %source, "storage failure");
                HierarchyError::StorageFailure { operation, source }
            }
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            HierarchyError::Validation { .. } => "VALIDATION_ERROR",
            HierarchyError::NotFound(_) => "NOT_FOUND",
            HierarchyError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            HierarchyError::CircularReference { .. } => "CIRCULAR_REFERENCE",
            HierarchyError::RootDeletionRejected(_) => "ROOT_DELETION_REJECTED",
            HierarchyError::StorageFailure { .. } => "STORAGE_FAILURE",
        }
    }

    /// The request field this error is attached to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            HierarchyError::Validation { field, .. } => Some(*field),
            HierarchyError::CircularReference { .. } => Some("parentId"),
            _ => None,
        }
    }

    /// The message shown to a caller. Storage details are withheld.
    pub fn user_message(&self) -> String {
        match self {
            HierarchyError::Validation { message, .. } => message.clone(),
            HierarchyError::StorageFailure { .. } => STORAGE_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CoreError> for HierarchyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidName { reason } => HierarchyError::Validation {
                field: "name",
                message: reason,
            },
            CoreError::DepthExceeded { .. } => HierarchyError::DepthExceeded { max: MAX_LEVEL },
            CoreError::CircularReference { node, parent } => {
                HierarchyError::CircularReference { node, parent }
            }
        }
    }
}

/// Structured error detail carried by a failed [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "DEPTH_EXCEEDED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The request field a validation message belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&HierarchyError> for ErrorDetail {
    fn from(err: &HierarchyError) -> Self {
        ErrorDetail {
            code: err.code().to_string(),
            message: err.user_message(),
            field: err.field().map(str::to_string),
        }
    }
}

/// Uniform success/error envelope returned across the engine boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        ActionResult {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(err: &HierarchyError) -> Self {
        ActionResult {
            success: false,
            data: None,
            error: Some(ErrorDetail::from(err)),
        }
    }
}

impl<T> From<Result<T, HierarchyError>> for ActionResult<T> {
    fn from(result: Result<T, HierarchyError>) -> Self {
        match result {
            Ok(data) => ActionResult::ok(data),
            Err(err) => ActionResult::failed(&err),
        }
    }
}
