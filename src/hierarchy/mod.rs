//! Self-referencing trees (organizations and menus).
//!
//! Rows carry `parent_id: Option<Uuid>` and a stored `level` (1 for roots).
//! Trees are assembled in memory on read; nothing here links nodes to each
//! other directly.

pub mod forest;
pub mod path;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{DatabaseError, Record};

pub use forest::{build_forest, TreeNode};
pub use path::{breadcrumb, child_level, resolve_ancestor_path, validate_depth_on_insert};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyKind {
    Organization,
    Menu,
}

impl HierarchyKind {
    pub fn max_depth(&self) -> i32 {
        match self {
            HierarchyKind::Organization => 5,
            HierarchyKind::Menu => 3,
        }
    }
}

impl fmt::Display for HierarchyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyKind::Organization => write!(f, "organization"),
            HierarchyKind::Menu => write!(f, "menu"),
        }
    }
}

/// A record that lives in a depth-limited tree.
pub trait Node: Record + Serialize {
    const KIND: HierarchyKind;

    fn parent_id(&self) -> Option<Uuid>;

    fn level(&self) -> i32;

    fn name(&self) -> &str;

    fn place(&mut self, parent_id: Option<Uuid>, level: i32);
}

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("parent {kind} {id} not found")]
    ParentNotFound { kind: HierarchyKind, id: Uuid },

    #[error("{kind} {node} references missing ancestor {missing}")]
    BrokenChain { kind: HierarchyKind, node: Uuid, missing: Uuid },

    #[error("{kind} {node} is part of a parent cycle")]
    Cycle { kind: HierarchyKind, node: Uuid },

    #[error("{kind} depth {level} exceeds maximum {max}")]
    DepthExceeded { kind: HierarchyKind, level: i32, max: i32 },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}
