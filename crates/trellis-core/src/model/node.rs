use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{color::Color, identifier::Id};

/// A node to be positioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: Id,
    #[serde(default)]
    shape: NodeShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f32>,
    #[serde(default)]
    style: NodeStyle,
    /// Free-form annotations. Analyzers write `level` / `generation` here.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    data: IndexMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            shape: NodeShape::default(),
            label: None,
            width: None,
            height: None,
            style: NodeStyle::default(),
            data: IndexMap::new(),
        }
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Fixes the node's size instead of letting the shape provider estimate it.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn shape(&self) -> &NodeShape {
        &self.shape
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn width(&self) -> Option<f32> {
        self.width
    }

    pub fn height(&self) -> Option<f32> {
        self.height
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    pub fn data(&self) -> &IndexMap<String, serde_json::Value> {
        &self.data
    }

    /// Sets a data entry, replacing any previous value under `key`.
    pub fn set_data(&mut self, key: &str, value: impl Into<serde_json::Value>) -> &mut Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// Author-specified presentation of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_color: Option<Color>,
}

impl NodeStyle {
    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    pub fn stroke(&self) -> Option<Color> {
        self.stroke
    }

    pub fn text_color(&self) -> Option<Color> {
        self.text_color
    }

    pub fn set_fill(&mut self, fill: Color) -> &mut Self {
        self.fill = Some(fill);
        self
    }
}

/// Shape tag of a node.
///
/// Parsing is case-insensitive and accepts a few common aliases. Unknown tags
/// are preserved in [`NodeShape::Other`] and drawn as rectangles by the
/// default shape provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeShape {
    #[default]
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Circle,
    Diamond,
    /// Marks the central topic of a mindmap.
    MindmapRoot,
    Male,
    Female,
    Other(String),
}

impl NodeShape {
    /// Returns true for the gendered pedigree shapes.
    pub fn is_gendered(&self) -> bool {
        matches!(self, Self::Male | Self::Female)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Rectangle => "rectangle",
            Self::RoundedRectangle => "rounded_rectangle",
            Self::Ellipse => "ellipse",
            Self::Circle => "circle",
            Self::Diamond => "diamond",
            Self::MindmapRoot => "mindmap_root",
            Self::Male => "male",
            Self::Female => "female",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for NodeShape {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "box" => Self::Rectangle,
            "rounded_rectangle" | "rounded" | "round" => Self::RoundedRectangle,
            "ellipse" | "oval" => Self::Ellipse,
            "circle" => Self::Circle,
            "diamond" | "decision" | "rhombus" => Self::Diamond,
            "mindmap_root" | "root" => Self::MindmapRoot,
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for NodeShape {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<NodeShape> for String {
    fn from(shape: NodeShape) -> Self {
        shape.as_str().to_string()
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_aliases() {
        assert_eq!(NodeShape::from("RECT"), NodeShape::Rectangle);
        assert_eq!(NodeShape::from("Oval"), NodeShape::Ellipse);
        assert_eq!(NodeShape::from("root"), NodeShape::MindmapRoot);
        assert_eq!(NodeShape::from("decision"), NodeShape::Diamond);
        assert_eq!(
            NodeShape::from("cloud"),
            NodeShape::Other("cloud".to_string())
        );
    }

    #[test]
    fn test_shape_round_trips_through_string() {
        let json = serde_json::to_string(&NodeShape::Female).unwrap();
        assert_eq!(json, "\"female\"");
        assert!(serde_json::from_str::<NodeShape>(&json).unwrap().is_gendered());
    }

    #[test]
    fn test_style_reads_author_colors() {
        let node: Node = serde_json::from_str(
            r##"{ "id": "n", "style": { "stroke": "navy", "text_color": "#ffffff" } }"##,
        )
        .unwrap();

        assert_eq!(node.style().fill(), None);
        assert_eq!(node.style().stroke(), Color::new("navy").ok());
        assert_eq!(node.style().text_color(), Color::new("#ffffff").ok());
    }

    #[test]
    fn test_set_data_replaces() {
        let mut node = Node::new("n");
        node.set_data("level", 1).set_data("level", 2);

        assert_eq!(node.data().len(), 1);
        assert_eq!(node.data()["level"], 2);
    }

    #[test]
    fn test_builder() {
        let node = Node::new("n")
            .with_label("Hello")
            .with_size(10.0, 20.0)
            .with_shape(NodeShape::Circle);

        assert_eq!(node.label(), Some("Hello"));
        assert_eq!(node.width(), Some(10.0));
        assert_eq!(node.height(), Some(20.0));
        assert_eq!(node.shape(), &NodeShape::Circle);
    }
}
