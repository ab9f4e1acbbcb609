//! Positioned output handed to renderers.

use indexmap::IndexMap;
use serde::Serialize;

use trellis_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::{Container, ContainerShape, Edge, EdgeStyle, Node, NodeShape, NodeStyle},
};

use crate::diagnostic::Diagnostic;

/// A node with its final box and resolved presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    id: Id,
    #[serde(flatten)]
    bounds: Bounds,
    shape: NodeShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    style: NodeStyle,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    data: IndexMap<String, serde_json::Value>,
}

impl PositionedNode {
    pub(crate) fn new(node: &Node, bounds: Bounds) -> Self {
        Self {
            id: node.id(),
            bounds,
            shape: node.shape().clone(),
            label: node.label().map(str::to_string),
            style: node.style().clone(),
            data: node.data().clone(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn shape(&self) -> &NodeShape {
        &self.shape
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }

    pub fn data(&self) -> &IndexMap<String, serde_json::Value> {
        &self.data
    }
}

/// A container box owning its nested containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedContainer {
    id: Id,
    #[serde(flatten)]
    bounds: Bounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<ContainerShape>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<PositionedContainer>,
}

impl PositionedContainer {
    pub(crate) fn new(container: &Container, bounds: Bounds) -> Self {
        Self {
            id: container.id(),
            bounds,
            label: container.label().map(str::to_string),
            shape: container.shape().cloned(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn shape(&self) -> Option<&ContainerShape> {
        self.shape.as_ref()
    }

    /// Nested containers in declaration order.
    pub fn children(&self) -> &[PositionedContainer] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<PositionedContainer> {
        &mut self.children
    }

    /// Moves this container and every nested container by `offset`.
    pub(crate) fn translate(&mut self, offset: Point) {
        self.bounds = self.bounds.translate(offset);
        for child in &mut self.children {
            child.translate(offset);
        }
    }
}

/// Finds a container by id anywhere in a forest.
pub fn find_container(containers: &[PositionedContainer], id: Id) -> Option<&PositionedContainer> {
    containers.iter().find_map(|container| {
        if container.id == id {
            Some(container)
        } else {
            find_container(&container.children, id)
        }
    })
}

/// Visits every container of a forest, parents before children.
pub(crate) fn for_each_container(
    containers: &[PositionedContainer],
    f: &mut impl FnMut(&PositionedContainer),
) {
    for container in containers {
        f(container);
        for_each_container(&container.children, f);
    }
}

/// An edge with its polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    from: Id,
    to: Id,
    points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    style: EdgeStyle,
}

impl RoutedEdge {
    pub(crate) fn new(edge: &Edge, points: Vec<Point>) -> Self {
        Self {
            from: edge.from(),
            to: edge.to(),
            points,
            label: edge.label().map(str::to_string),
            style: edge.style().clone(),
        }
    }

    /// Bare edge without label or style.
    pub fn between(from: Id, to: Id, points: Vec<Point>) -> Self {
        Self {
            from,
            to,
            points,
            label: None,
            style: EdgeStyle::default(),
        }
    }

    pub fn from(&self) -> Id {
        self.from
    }

    pub fn to(&self) -> Id {
        self.to
    }

    /// Waypoints from source to target.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> &EdgeStyle {
        &self.style
    }
}

/// The complete result of one layout invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    nodes: Vec<PositionedNode>,
    edges: Vec<RoutedEdge>,
    containers: Vec<PositionedContainer>,
    size: Size,
    diagnostics: Vec<Diagnostic>,
}

impl DiagramLayout {
    pub(crate) fn new(
        nodes: Vec<PositionedNode>,
        edges: Vec<RoutedEdge>,
        containers: Vec<PositionedContainer>,
        size: Size,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            nodes,
            edges,
            containers,
            size,
            diagnostics,
        }
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RoutedEdge] {
        &self.edges
    }

    /// Top-level containers; nested ones hang off their parents.
    pub fn containers(&self) -> &[PositionedContainer] {
        &self.containers
    }

    /// Extent of the whole drawing, measured from the origin.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn node(&self, id: Id) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn container(&self, id: Id) -> Option<&PositionedContainer> {
        find_container(&self.containers, id)
    }

    /// Edges from `from` to `to`, in declaration order.
    pub fn edges_between(&self, from: Id, to: Id) -> impl Iterator<Item = &RoutedEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.from == from && edge.to == to)
    }
}
