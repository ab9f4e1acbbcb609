use serde::{Deserialize, Serialize};

use crate::{color::Color, identifier::Id};

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    from: Id,
    to: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    style: EdgeStyle,
}

impl Edge {
    pub fn new(from: impl Into<Id>, to: impl Into<Id>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            style: EdgeStyle::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn from(&self) -> Id {
        self.from
    }

    pub fn to(&self) -> Id {
        self.to
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> &EdgeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut EdgeStyle {
        &mut self.style
    }

    /// Returns true when both ends are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Arrowhead drawn at the target end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowKind {
    None,
    Open,
    Filled,
}

/// Presentation of an edge. Unset fields are left to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    arrow: Option<ArrowKind>,
}

impl EdgeStyle {
    pub fn stroke(&self) -> Option<Color> {
        self.stroke
    }

    pub fn stroke_width(&self) -> Option<f32> {
        self.stroke_width
    }

    pub fn arrow(&self) -> Option<ArrowKind> {
        self.arrow
    }

    pub fn set_stroke(&mut self, stroke: Color) -> &mut Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn set_stroke_width(&mut self, width: f32) -> &mut Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn set_arrow(&mut self, arrow: ArrowKind) -> &mut Self {
        self.arrow = Some(arrow);
        self
    }
}
