//! Diagram-type analyzers.
//!
//! Mindmaps and pedigree charts carry structure beyond their edges: a root
//! and levels for the former, generations and spouse pairs for the latter.
//! The analyzers derive that structure before layout and stamp it, together
//! with default styling, onto a copy of the diagram. Plain graphs pass
//! through untouched.

pub mod mindmap;
pub mod pedigree;

pub use mindmap::{MindmapLevels, apply_mindmap_level_styling, calculate_mindmap_levels};
pub use pedigree::{PedigreeGenerations, apply_pedigree_styling, calculate_pedigree_generations};

use std::{borrow::Cow, collections::HashMap};

use log::{debug, info};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use trellis_core::{
    identifier::Id,
    model::{Diagram, DiagramKind},
};

use crate::{config::MindmapConfig, error::TrellisError};

/// Runs the analyzer matching the diagram's kind.
///
/// # Errors
///
/// Returns [`TrellisError::Config`] when the mindmap palette cannot be parsed.
pub fn prepare<'a>(diagram: &'a Diagram, config: &MindmapConfig) -> Result<Cow<'a, Diagram>, TrellisError> {
    match diagram.kind() {
        DiagramKind::Graph => Ok(Cow::Borrowed(diagram)),
        DiagramKind::Mindmap => {
            let mut styled = diagram.clone();
            if let Some(levels) = calculate_mindmap_levels(diagram) {
                info!(root:% = levels.root(), levels_count = levels.len(); "Mindmap levels calculated");
                apply_mindmap_level_styling(&mut styled, &levels, config)?;
            }
            Ok(Cow::Owned(styled))
        }
        DiagramKind::Pedigree => {
            let mut styled = diagram.clone();
            let generations = calculate_pedigree_generations(diagram);
            info!(
                nodes_count = generations.len(),
                couples_count = generations.couples_count();
                "Pedigree generations calculated"
            );
            apply_pedigree_styling(&mut styled, &generations);
            Ok(Cow::Owned(styled))
        }
    }
}

/// Directed view of a diagram's declared nodes and the edges between them.
///
/// Edge weights are declaration indices, so neighbour lists come out in the
/// order the author wrote the edges.
#[derive(Debug)]
pub(crate) struct DiagramGraph {
    graph: DiGraph<Id, usize>,
    indices: HashMap<Id, NodeIndex>,
}

impl DiagramGraph {
    /// Builds the graph, skipping duplicate nodes and edges to unknown nodes.
    pub(crate) fn new(diagram: &Diagram) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        for node in diagram.nodes() {
            indices
                .entry(node.id())
                .or_insert_with(|| graph.add_node(node.id()));
        }

        for (index, edge) in diagram.edges().iter().enumerate() {
            if let (Some(&source), Some(&target)) = (indices.get(&edge.from()), indices.get(&edge.to())) {
                graph.add_edge(source, target, index);
            }
        }

        debug!(
            nodes_count = graph.node_count(),
            edges_count = graph.edge_count();
            "Built analyzer graph"
        );
        Self { graph, indices }
    }

    /// Node ids in declaration order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx])
    }

    pub(crate) fn first(&self) -> Option<Id> {
        self.ids().next()
    }

    /// Neighbours of `id` along `direction`, self loops excluded, in edge
    /// declaration order and without repeats.
    pub(crate) fn neighbors(&self, id: Id, direction: Direction) -> Vec<Id> {
        let Some(&idx) = self.indices.get(&id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .filter(|edge| edge.source() != edge.target())
            .map(|edge| {
                let other = if edge.source() == idx {
                    edge.target()
                } else {
                    edge.source()
                };
                (*edge.weight(), self.graph[other])
            })
            .collect();
        edges.sort_by_key(|&(index, _)| index);

        let mut neighbors: Vec<Id> = Vec::with_capacity(edges.len());
        for (_, other) in edges {
            if !neighbors.contains(&other) {
                neighbors.push(other);
            }
        }
        neighbors
    }

    /// Number of distinct nodes with an edge into `id`, self loops excluded.
    pub(crate) fn indegree(&self, id: Id) -> usize {
        self.neighbors(id, Direction::Incoming).len()
    }

    /// Returns true when an edge runs from `from` to `to`.
    pub(crate) fn has_edge(&self, from: Id, to: Id) -> bool {
        match (self.indices.get(&from), self.indices.get(&to)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::model::{Edge, Node};

    use super::*;

    #[test]
    fn test_graph_diagram_is_borrowed() {
        let diagram = Diagram::default().with_node(Node::new("a"));
        let prepared = prepare(&diagram, &MindmapConfig::default()).unwrap();

        assert!(matches!(prepared, Cow::Borrowed(_)));
    }

    #[test]
    fn test_neighbors_in_declaration_order() {
        let diagram = Diagram::default()
            .with_node(Node::new("a"))
            .with_node(Node::new("b"))
            .with_node(Node::new("c"))
            .with_edge(Edge::new("a", "c"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("a", "c"))
            .with_edge(Edge::new("a", "a"))
            .with_edge(Edge::new("a", "ghost"));
        let graph = DiagramGraph::new(&diagram);

        assert_eq!(
            graph.neighbors(Id::new("a"), Direction::Outgoing),
            vec![Id::new("c"), Id::new("b")]
        );
        assert_eq!(graph.indegree(Id::new("a")), 0);
        assert_eq!(graph.indegree(Id::new("c")), 1);
        assert!(graph.has_edge(Id::new("a"), Id::new("b")));
        assert!(!graph.has_edge(Id::new("b"), Id::new("a")));
    }
}
