//! Configuration types for Trellis layouts.
//!
//! This module provides configuration structures that control default layout
//! parameters and diagram-type styling. All types implement
//! [`serde::Deserialize`] so they can be loaded from TOML by front ends.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutConfig`] - Default direction, algorithm, spacing, and padding.
//! - [`MindmapConfig`] - Palette and stroke widths for mindmap styling.
//!
//! Missing fields always fall back to the documented defaults.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().direction(), "TB");
//! assert!(config.mindmap().palette().is_ok());
//! ```

use serde::Deserialize;

use trellis_core::color::Color;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout defaults section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Mindmap styling section.
    #[serde(default)]
    mindmap: MindmapConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(layout: LayoutConfig, mindmap: MindmapConfig) -> Self {
        Self { layout, mindmap }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the mindmap configuration.
    pub fn mindmap(&self) -> &MindmapConfig {
        &self.mindmap
    }
}

/// Defaults applied when neither the call options nor a container say otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Direction token, e.g. `TB` or `LR`.
    direction: String,

    /// Algorithm token, e.g. `layered` or `radial`.
    algorithm: String,

    /// Gap between sibling elements.
    spacing: f32,

    /// Inner padding of containers that do not set their own.
    padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: "TB".to_string(),
            algorithm: "layered".to_string(),
            spacing: 50.0,
            padding: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn new(direction: impl Into<String>, algorithm: impl Into<String>, spacing: f32, padding: f32) -> Self {
        Self {
            direction: direction.into(),
            algorithm: algorithm.into(),
            spacing,
            padding,
        }
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }
}

/// Styling applied to mindmap diagrams.
///
/// Colors are kept as strings and parsed on use, so a bad entry is reported
/// against the configuration rather than failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MindmapConfig {
    /// Fill colors cycled over the root's direct children.
    palette: Vec<String>,

    /// Fill color of the root node.
    root_color: String,

    /// Stroke width of edges leaving the root.
    base_stroke_width: f32,

    /// Width lost per level of source depth.
    stroke_width_step: f32,

    /// Lower bound for edge stroke width.
    min_stroke_width: f32,
}

impl Default for MindmapConfig {
    fn default() -> Self {
        Self {
            palette: [
                "#ececff", "#ffffde", "#e0f2f1", "#fce4ec", "#fff3e0", "#e8f5e9", "#ede7f6",
                "#e3f2fd",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            root_color: "#9370db".to_string(),
            base_stroke_width: 4.0,
            stroke_width_step: 1.0,
            min_stroke_width: 1.0,
        }
    }
}

impl MindmapConfig {
    /// Returns the parsed palette.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first entry that is not a valid color.
    pub fn palette(&self) -> Result<Vec<Color>, String> {
        self.palette
            .iter()
            .map(|color| Color::new(color))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("Invalid mindmap palette color in config: {err}"))
    }

    /// Returns the parsed root color.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn root_color(&self) -> Result<Color, String> {
        Color::new(&self.root_color)
            .map_err(|err| format!("Invalid mindmap root color in config: {err}"))
    }

    /// Stroke width for an edge whose source sits at `level`.
    ///
    /// ```
    /// # use trellis::config::MindmapConfig;
    /// let config = MindmapConfig::default();
    /// assert_eq!(config.stroke_width_for_level(0), 4.0);
    /// assert_eq!(config.stroke_width_for_level(2), 2.0);
    /// assert_eq!(config.stroke_width_for_level(10), 1.0);
    /// ```
    pub fn stroke_width_for_level(&self, level: usize) -> f32 {
        (self.base_stroke_width - level as f32 * self.stroke_width_step).max(self.min_stroke_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_layout_section_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "layout": { "spacing": 12 } }"#).unwrap();

        assert_eq!(config.layout().spacing(), 12.0);
        assert_eq!(config.layout().direction(), "TB");
        assert_eq!(config.layout().algorithm(), "layered");
        assert_eq!(config.layout().padding(), 20.0);
    }

    #[test]
    fn test_invalid_palette_reports_error() {
        let config: MindmapConfig =
            serde_json::from_str(r#"{ "palette": ["red", "not-a-color"] }"#).unwrap();

        let err = config.palette().unwrap_err();
        assert!(err.contains("not-a-color"));
    }

    #[test]
    fn test_default_colors_parse() {
        let config = MindmapConfig::default();

        assert_eq!(config.palette().unwrap().len(), 8);
        assert!(config.root_color().is_ok());
    }
}
