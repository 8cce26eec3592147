use std::collections::HashSet;

use uuid::Uuid;

use super::{HierarchyError, HierarchyKind, Node};
use crate::database::Table;

/// Walk `parent_id` links up to the root. Returns `[root, ..., node]`.
pub async fn resolve_ancestor_path<N: Node>(table: &dyn Table<N>, node: N) -> Result<Vec<N>, HierarchyError> {
    let origin = node.id();
    let mut seen = HashSet::from([origin]);
    let mut path = vec![node];

    while let Some(parent_id) = path.last().and_then(|n| n.parent_id()) {
        let child = path.last().map(|n| n.id()).unwrap_or(origin);
        if !seen.insert(parent_id) {
            tracing::error!("Parent cycle detected walking {} {} at {}", N::KIND, origin, parent_id);
            return Err(HierarchyError::Cycle { kind: N::KIND, node: origin });
        }
        match table.find_by_id(parent_id).await? {
            Some(parent) => path.push(parent),
            None => {
                tracing::error!("Broken {} chain: {} points at missing parent {}", N::KIND, child, parent_id);
                return Err(HierarchyError::BrokenChain { kind: N::KIND, node: child, missing: parent_id });
            }
        }
    }

    path.reverse();
    Ok(path)
}

pub fn breadcrumb<N: Node>(path: &[N]) -> String {
    path.iter().map(|n| n.name()).collect::<Vec<_>>().join("/")
}

/// Level of a node placed under a parent at `parent_level` (`None` for a root).
pub fn child_level(kind: HierarchyKind, parent_level: Option<i32>) -> Result<i32, HierarchyError> {
    let level = parent_level.map(|l| l + 1).unwrap_or(1);
    let max = kind.max_depth();
    if level > max {
        return Err(HierarchyError::DepthExceeded { kind, level, max });
    }
    Ok(level)
}

/// Level for a new node under `parent_id`, checking the parent exists.
pub async fn validate_depth_on_insert<N: Node>(table: &dyn Table<N>, parent_id: Option<Uuid>) -> Result<i32, HierarchyError> {
    let Some(parent_id) = parent_id else {
        return child_level(N::KIND, None);
    };
    let parent = table
        .find_by_id(parent_id)
        .await?
        .ok_or(HierarchyError::ParentNotFound { kind: N::KIND, id: parent_id })?;
    child_level(N::KIND, Some(parent.level()))
}
