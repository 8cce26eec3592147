use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::Node;

/// A node with its children attached. Only ever built for responses.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<N> {
    #[serde(flatten)]
    pub node: N,
    pub children: Vec<TreeNode<N>>,
}

/// Assemble a flat node list into root-level trees.
///
/// Children keep the input order. Nodes whose parent is absent from the input
/// are dropped together with their subtrees.
pub fn build_forest<N: Node>(nodes: Vec<N>) -> Vec<TreeNode<N>> {
    let index: HashMap<Uuid, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent_id() {
            None => roots.push(i),
            Some(parent) => {
                if let Some(&p) = index.get(&parent) {
                    children[p].push(i);
                }
            }
        }
    }

    let mut arena: Vec<Option<N>> = nodes.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut arena, &children))
        .collect()
}

// Each slot is taken at most once, so a corrupt parent cycle cannot recurse forever.
fn assemble<N>(i: usize, arena: &mut [Option<N>], children: &[Vec<usize>]) -> Option<TreeNode<N>> {
    let node = arena[i].take()?;
    let kids = children[i]
        .iter()
        .filter_map(|&c| assemble(c, arena, children))
        .collect();
    Some(TreeNode { node, children: kids })
}
