use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// A named grouping of nodes and nested containers.
///
/// Containers form a forest. Ids are expected to be unique across the whole
/// diagram, nodes and containers included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    /// Direct child nodes, in order.
    #[serde(default)]
    nodes: Vec<Id>,
    #[serde(default, rename = "containers")]
    children: Vec<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<ContainerLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<ContainerStyle>,
}

impl Container {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            label: None,
            nodes: Vec::new(),
            children: Vec::new(),
            layout: None,
            style: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_nodes<I, T>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn with_child(mut self, child: Container) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_layout(mut self, layout: ContainerLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_style(mut self, style: ContainerStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn nodes(&self) -> &[Id] {
        &self.nodes
    }

    /// Nested containers, in order.
    pub fn children(&self) -> &[Container] {
        &self.children
    }

    pub fn layout(&self) -> Option<&ContainerLayout> {
        self.layout.as_ref()
    }

    pub fn style(&self) -> Option<&ContainerStyle> {
        self.style.as_ref()
    }

    /// Lane orientation, if this container is a swimlane.
    pub fn orientation(&self) -> Option<Orientation> {
        self.layout.as_ref().and_then(|layout| layout.orientation)
    }

    /// Returns true when the container carries a lane orientation.
    pub fn is_swimlane(&self) -> bool {
        self.orientation().is_some()
    }

    pub fn algorithm_token(&self) -> Option<&str> {
        self.layout.as_ref().and_then(|layout| layout.algorithm.as_deref())
    }

    pub fn direction_token(&self) -> Option<&str> {
        self.layout.as_ref().and_then(|layout| layout.direction.as_deref())
    }

    pub fn spacing(&self) -> Option<f32> {
        self.layout.as_ref().and_then(|layout| layout.spacing)
    }

    pub fn padding(&self) -> Option<f32> {
        self.style.as_ref().and_then(|style| style.padding)
    }

    pub fn shape(&self) -> Option<&ContainerShape> {
        self.style.as_ref().and_then(|style| style.shape.as_ref())
    }

    /// Returns true for BPMN pools.
    pub fn is_pool(&self) -> bool {
        matches!(self.shape(), Some(ContainerShape::Pool))
    }

    /// Returns true for BPMN lanes.
    pub fn is_lane(&self) -> bool {
        matches!(self.shape(), Some(ContainerShape::Lane))
    }
}

/// Per-container layout hints.
///
/// Algorithm and direction are kept as the author wrote them; the engine maps
/// unknown tokens to defaults instead of rejecting the diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<Orientation>,
}

impl ContainerLayout {
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }
}

/// Lane flow axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Container presentation hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    padding: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<ContainerShape>,
}

impl ContainerStyle {
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_shape(mut self, shape: ContainerShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Shape tag of a container. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerShape {
    Group,
    Pool,
    Lane,
    Other(String),
}

impl From<String> for ContainerShape {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "group" => Self::Group,
            "pool" => Self::Pool,
            "lane" => Self::Lane,
            _ => Self::Other(value),
        }
    }
}

impl From<ContainerShape> for String {
    fn from(shape: ContainerShape) -> Self {
        match shape {
            ContainerShape::Group => "group".to_string(),
            ContainerShape::Pool => "pool".to_string(),
            ContainerShape::Lane => "lane".to_string(),
            ContainerShape::Other(name) => name,
        }
    }
}
