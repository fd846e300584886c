//! Cell adjacency graph, built by an external component and consumed by the
//! nucleus assignment resolver.

use std::collections::{BTreeMap, BTreeSet};

/// Per-cell adjacency record.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CellNode {
    /// Labels of the adjacent cells.
    pub neighbors: BTreeSet<u16>,
    /// Sample points (row, column) along the shared boundaries.
    pub boundary: Vec<[usize; 2]>,
}

/// Adjacency graph keyed by cell label.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CellGraph {
    nodes: BTreeMap<u16, CellNode>,
}

impl CellGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: u16, node: CellNode) {
        self.nodes.insert(label, node);
    }

    pub fn get(&self, label: u16) -> Option<&CellNode> {
        self.nodes.get(&label)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = u16> + '_ {
        self.nodes.keys().copied()
    }

    /// A new graph without the discarded cells, neither as keys nor as
    /// neighbor-set members. The receiver is left untouched.
    pub fn pruned(&self, discarded: &BTreeSet<u16>) -> CellGraph {
        let nodes = self
            .nodes
            .iter()
            .filter(|(label, _)| !discarded.contains(label))
            .map(|(&label, node)| {
                let neighbors = node
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|n| !discarded.contains(n))
                    .collect();
                (
                    label,
                    CellNode {
                        neighbors,
                        boundary: node.boundary.clone(),
                    },
                )
            })
            .collect();
        CellGraph { nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(neighbors: &[u16]) -> CellNode {
        CellNode {
            neighbors: neighbors.iter().copied().collect(),
            boundary: Vec::new(),
        }
    }

    #[test]
    fn pruning_drops_keys_and_neighbor_references() {
        let mut graph = CellGraph::new();
        graph.insert(1, node(&[2, 3]));
        graph.insert(2, node(&[1]));
        graph.insert(3, node(&[1]));

        let discarded: BTreeSet<u16> = [2].into_iter().collect();
        let pruned = graph.pruned(&discarded);
        assert_eq!(pruned.len(), 2);
        assert!(pruned.get(2).is_none());
        assert!(!pruned.get(1).unwrap().neighbors.contains(&2));
        assert!(pruned.get(1).unwrap().neighbors.contains(&3));
        // The source graph is untouched.
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn boundary_samples_survive_pruning() {
        let mut graph = CellGraph::new();
        graph.insert(
            4,
            CellNode {
                neighbors: BTreeSet::new(),
                boundary: vec![[1, 2], [3, 4]],
            },
        );
        let pruned = graph.pruned(&BTreeSet::new());
        assert_eq!(pruned.get(4).unwrap().boundary, vec![[1, 2], [3, 4]]);
    }
}
