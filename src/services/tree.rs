use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::ServiceError;
use crate::database::record::now;
use crate::database::{DatabaseError, Record, Table};
use crate::filter::{escape_like, FilterData};
use crate::hierarchy::{breadcrumb, build_forest, resolve_ancestor_path, validate_depth_on_insert, Node, TreeNode};

/// Something outside the tree that references a node and blocks its deletion.
#[async_trait]
pub trait DependentProbe: Send + Sync {
    fn label(&self) -> &'static str;

    async fn count(&self, id: Uuid) -> Result<i64, DatabaseError>;
}

/// Rows of `T` whose `column` holds the node id.
pub struct ForeignKey<T: Record> {
    table: Arc<dyn Table<T>>,
    column: &'static str,
    label: &'static str,
}

impl<T: Record> ForeignKey<T> {
    pub fn probe(table: Arc<dyn Table<T>>, column: &'static str, label: &'static str) -> Arc<dyn DependentProbe> {
        Arc::new(Self { table, column, label })
    }
}

#[async_trait]
impl<T: Record> DependentProbe for ForeignKey<T> {
    fn label(&self) -> &'static str {
        self.label
    }

    async fn count(&self, id: Uuid) -> Result<i64, DatabaseError> {
        let mut conditions = Map::new();
        conditions.insert(self.column.to_string(), json!(id));
        self.table.count(FilterData::where_(Value::Object(conditions))).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PathEntry {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
}

/// A node with its ancestor path, root first and ending at the node itself.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetail<N> {
    #[serde(flatten)]
    pub node: N,
    pub ancestors: Vec<PathEntry>,
    pub breadcrumb: String,
}

/// Unfiltered listings are the whole forest; name searches are flat matches
/// each carrying its path.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", content = "nodes", rename_all = "lowercase")]
pub enum NodeListing<N> {
    Forest(Vec<TreeNode<N>>),
    Matches(Vec<NodeDetail<N>>),
}

/// Create, move and delete rules shared by every tree-shaped record.
pub struct TreeService<N: Node> {
    nodes: Arc<dyn Table<N>>,
    dependents: Vec<Arc<dyn DependentProbe>>,
}

fn reject(err: ServiceError) -> ServiceError {
    warn!("Rejected: {}", err);
    err
}

impl<N: Node> TreeService<N> {
    pub fn new(nodes: Arc<dyn Table<N>>, dependents: Vec<Arc<dyn DependentProbe>>) -> Self {
        Self { nodes, dependents }
    }

    pub fn table(&self) -> &dyn Table<N> {
        self.nodes.as_ref()
    }

    /// Insert `node` under its `parent_id`, deriving its level.
    pub async fn create(&self, mut node: N) -> Result<N, ServiceError> {
        let parent_id = node.parent_id();
        let level = validate_depth_on_insert(self.table(), parent_id)
            .await
            .map_err(|e| reject(e.into()))?;
        node.place(parent_id, level);

        let node = self.nodes.insert(node).await?;
        info!("Created {} {} '{}' at level {}", N::KIND, node.id(), node.name(), node.level());
        Ok(node)
    }

    pub async fn fetch(&self, id: Uuid) -> Result<N, ServiceError> {
        self.nodes
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", N::KIND, id)))
    }

    pub async fn get(&self, id: Uuid) -> Result<NodeDetail<N>, ServiceError> {
        let node = self.fetch(id).await?;
        self.detail(node).await
    }

    pub async fn detail(&self, node: N) -> Result<NodeDetail<N>, ServiceError> {
        let path = resolve_ancestor_path(self.table(), node.clone()).await?;
        Ok(NodeDetail {
            breadcrumb: breadcrumb(&path),
            ancestors: path
                .iter()
                .map(|n| PathEntry { id: n.id(), name: n.name().to_string(), level: n.level() })
                .collect(),
            node,
        })
    }

    /// Whole forest, or the nodes whose name starts with `name`.
    pub async fn list(&self, name: Option<&str>) -> Result<NodeListing<N>, ServiceError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => {
                let nodes = self.nodes.select_any(FilterData::default()).await?;
                Ok(NodeListing::Forest(build_forest(nodes)))
            }
            Some(prefix) => {
                let pattern = format!("{}%", escape_like(prefix));
                let matches = self
                    .nodes
                    .select_any(FilterData::where_(json!({ "name": { "$like": pattern } })))
                    .await?;
                let details = try_join_all(matches.into_iter().map(|n| self.detail(n))).await?;
                Ok(NodeListing::Matches(details))
            }
        }
    }

    pub async fn has_children(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.nodes.exists(FilterData::where_(json!({ "parent_id": id }))).await?)
    }

    /// Apply field changes and move the node to `new_parent`.
    ///
    /// Roots stay roots and nodes with children keep their parent. An allowed
    /// move re-derives the level from the new parent.
    pub async fn update<F>(&self, id: Uuid, new_parent: Option<Uuid>, apply: F) -> Result<N, ServiceError>
    where
        F: FnOnce(&mut N) + Send,
    {
        let mut node = self.fetch(id).await?;
        let current = node.parent_id();

        if new_parent == Some(id) {
            return Err(reject(ServiceError::InvalidReparenting(format!(
                "{} {} cannot be its own parent",
                N::KIND,
                id
            ))));
        }
        if current.is_none() && new_parent.is_some() {
            return Err(reject(ServiceError::InvalidReparenting(format!(
                "root {} {} cannot be moved under a parent",
                N::KIND,
                id
            ))));
        }

        let mut level = node.level();
        if new_parent != current {
            if self.has_children(id).await? {
                return Err(reject(ServiceError::InvalidReparenting(format!(
                    "{} {} has children and cannot change parent",
                    N::KIND,
                    id
                ))));
            }
            level = validate_depth_on_insert(self.table(), new_parent)
                .await
                .map_err(|e| reject(e.into()))?;
        }

        apply(&mut node);
        node.place(new_parent, level);
        node.touch(now());

        let node = self.nodes.update(node).await?;
        info!("Updated {} {} (parent {:?}, level {})", N::KIND, id, node.parent_id(), node.level());
        Ok(node)
    }

    /// Delete a leaf with no dependents.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.has_children(id).await? {
            return Err(reject(ServiceError::HasChildren(format!("{} {} still has children", N::KIND, id))));
        }
        for probe in &self.dependents {
            let count = probe.count(id).await?;
            if count > 0 {
                return Err(reject(ServiceError::HasDependents(format!(
                    "{} {} is referenced by {} {}",
                    N::KIND,
                    id,
                    count,
                    probe.label()
                ))));
            }
        }

        if self.nodes.delete_by_id(id).await? == 0 {
            return Err(ServiceError::NotFound(format!("{} {} not found", N::KIND, id)));
        }
        info!("Deleted {} {}", N::KIND, id);
        Ok(())
    }
}
