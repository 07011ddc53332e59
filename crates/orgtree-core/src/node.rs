//! The organization node model and the level arithmetic that keeps it
//! consistent.
//!
//! A node's `level` is a denormalized depth cache: `1` for roots, otherwise
//! one more than its parent. Levels are capped at [`MAX_LEVEL`]
//! (company / division / department / team).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;

/// Level of a root node.
pub const ROOT_LEVEL: u32 = 1;

/// Deepest level a node may occupy. A node at this level takes no children.
pub const MAX_LEVEL: u32 = 4;

/// Maximum name length, counted in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Separator placed between ancestor names in a path string.
pub const PATH_SEPARATOR: &str = " ";

/// A persisted organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationNode {
    pub id: NodeId,
    pub name: String,
    /// `None` for a root.
    pub parent_id: Option<NodeId>,
    pub level: u32,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation, including cascaded level changes.
    pub updated_at: DateTime<Utc>,
}

impl OrganizationNode {
    /// Returns `true` if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Projects the node onto the flat row shape consumed by the tree codec.
    pub fn to_flat(&self) -> FlatNode {
        FlatNode {
            id: self.id,
            name: self.name.clone(),
            parent_id: self.parent_id,
            level: self.level,
        }
    }
}

/// A flat hierarchy row, as returned by a listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub level: u32,
}

/// One step of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorEntry {
    pub name: String,
    pub level: u32,
}

/// Computes the level of a node placed under a parent at `parent_level`.
///
/// `None` means the node is a root. Fails with [`CoreError::DepthExceeded`]
/// when the parent already sits at [`MAX_LEVEL`].
pub fn child_level(parent_level: Option<u32>) -> Result<u32, CoreError> {
    match parent_level {
        None => Ok(ROOT_LEVEL),
        Some(level) if level >= MAX_LEVEL => Err(CoreError::DepthExceeded {
            level: level + 1,
            max: MAX_LEVEL,
        }),
        Some(level) => Ok(level + 1),
    }
}

/// Applies a signed level shift, rejecting results outside
/// `ROOT_LEVEL..=MAX_LEVEL`.
pub fn shift_level(level: u32, delta: i64) -> Result<u32, CoreError> {
    let shifted = i64::from(level) + delta;
    if shifted > i64::from(MAX_LEVEL) {
        return Err(CoreError::DepthExceeded {
            level: u32::try_from(shifted).unwrap_or(u32::MAX),
            max: MAX_LEVEL,
        });
    }
    if shifted < i64::from(ROOT_LEVEL) {
        // Only reachable with corrupted level caches.
        return Err(CoreError::DepthExceeded {
            level: 0,
            max: MAX_LEVEL,
        });
    }
    Ok(shifted as u32)
}

/// Joins ancestor names (root first) into a path string.
pub fn join_path<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().collect::<Vec<_>>().join(PATH_SEPARATOR)
}
