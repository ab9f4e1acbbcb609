//! Node sizing and named connection points.
//!
//! The engine asks a [`ShapeProvider`] for every node's intrinsic size and
//! anchors before layout; no position is needed to answer either question.
//! [`BasicShapes`] is the default provider and estimates sizes from label
//! text, which is enough for layout without a text shaping engine.

use serde::Serialize;

use trellis_core::{
    geometry::{Insets, Point, Size},
    model::{Node, NodeShape},
};

/// A named connection point, offset from the owning shape's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    name: String,
    offset: Point,
}

impl Anchor {
    pub fn new(name: impl Into<String>, offset: Point) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> Point {
        self.offset
    }
}

/// Supplies sizes and anchors for nodes.
pub trait ShapeProvider {
    /// Intrinsic size of `node`.
    fn size(&self, node: &Node) -> Size;

    /// Anchors of `node` when drawn at `size`, in preference order.
    ///
    /// An empty list means edges attach wherever the solver put them.
    fn anchors(&self, node: &Node, size: Size) -> Vec<Anchor>;
}

/// Default shape provider.
///
/// Text is measured with a fixed advance per character and a fixed line
/// height. Explicit `width`/`height` on a node always win.
#[derive(Debug, Clone)]
pub struct BasicShapes {
    char_width: f32,
    line_height: f32,
    padding: Insets,
    min_size: Size,
}

impl Default for BasicShapes {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 18.0,
            padding: Insets::new(10.0, 16.0, 10.0, 16.0),
            min_size: Size::new(40.0, 30.0),
        }
    }
}

impl BasicShapes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advance of one character
    pub fn set_char_width(&mut self, width: f32) -> &mut Self {
        self.char_width = width;
        self
    }

    /// Set the height of one text line
    pub fn set_line_height(&mut self, height: f32) -> &mut Self {
        self.line_height = height;
        self
    }

    /// Set the padding around the label
    pub fn set_padding(&mut self, padding: Insets) -> &mut Self {
        self.padding = padding;
        self
    }

    fn text_size(&self, text: &str) -> Size {
        let lines = text.lines().count().max(1);
        let longest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        Size::new(
            longest as f32 * self.char_width,
            lines as f32 * self.line_height,
        )
    }
}

impl ShapeProvider for BasicShapes {
    fn size(&self, node: &Node) -> Size {
        let text = node.label().map_or_else(|| node.id().to_string(), str::to_string);
        let content = self.text_size(&text).add_padding(self.padding);

        let estimated = match node.shape() {
            // Shapes whose text box is inscribed need more room than the text
            NodeShape::Ellipse | NodeShape::MindmapRoot => {
                Size::new(content.width() * 1.3, content.height() * 1.3)
            }
            NodeShape::Diamond => Size::new(content.width() * 1.5, content.height() * 1.5),
            NodeShape::Circle | NodeShape::Female => {
                let side = content.diagonal();
                Size::new(side, side)
            }
            NodeShape::Male => {
                let side = content.width().max(content.height());
                Size::new(side, side)
            }
            NodeShape::Rectangle | NodeShape::RoundedRectangle | NodeShape::Other(_) => content,
        }
        .max(self.min_size);

        Size::new(
            node.width().unwrap_or(estimated.width()),
            node.height().unwrap_or(estimated.height()),
        )
    }

    fn anchors(&self, _node: &Node, size: Size) -> Vec<Anchor> {
        let (w, h) = (size.width(), size.height());
        vec![
            Anchor::new("top", Point::new(w / 2.0, 0.0)),
            Anchor::new("right", Point::new(w, h / 2.0)),
            Anchor::new("bottom", Point::new(w / 2.0, h)),
            Anchor::new("left", Point::new(0.0, h / 2.0)),
        ]
    }
}
