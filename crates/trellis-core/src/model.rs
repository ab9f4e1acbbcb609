//! The diagram description consumed by the layout engine.
//!
//! A [`Diagram`] is what a front end (a parser, an editor, a JSON file) hands
//! to the engine: a flat list of [`Node`]s, a list of [`Edge`]s between them,
//! and a forest of [`Container`]s grouping nodes. Nothing here carries
//! coordinates; positions are produced by the engine.
//!
//! The model is deserialized with serde. Every field other than ids is
//! optional in the serialized form and falls back to a default.

mod container;
mod edge;
mod node;

use serde::{Deserialize, Serialize};

pub use container::{Container, ContainerLayout, ContainerShape, ContainerStyle, Orientation};
pub use edge::{ArrowKind, Edge, EdgeStyle};
pub use node::{Node, NodeShape, NodeStyle};

use crate::identifier::Id;

/// The family a diagram belongs to.
///
/// Mindmap and pedigree diagrams get an analysis pre-pass that levels their
/// nodes before layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    #[default]
    Graph,
    Mindmap,
    Pedigree,
}

/// A complete, unpositioned diagram.
///
/// # Examples
///
/// ```
/// use trellis_core::model::{Container, Diagram, Edge, Node};
///
/// let diagram = Diagram::default()
///     .with_node(Node::new("a"))
///     .with_node(Node::new("b"))
///     .with_edge(Edge::new("a", "b"))
///     .with_container(Container::new("group").with_nodes(["a", "b"]));
///
/// assert_eq!(diagram.nodes().len(), 2);
/// assert!(diagram.node("a".into()).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    kind: DiagramKind,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    containers: Vec<Container>,
}

impl Diagram {
    /// Creates an empty diagram of the given kind.
    pub fn new(kind: DiagramKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Top-level containers. Nested containers hang off their parents.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Looks up a node by id. Linear in the number of nodes.
    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Returns true when the diagram has nothing to lay out.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.containers.is_empty()
    }
}
