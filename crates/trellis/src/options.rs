//! Layout options and the token vocabulary they are written in.
//!
//! Authors write directions and algorithms as free-form tokens (`TB`, `LR`,
//! `radial`, ...). This module maps them onto [`Direction`] and [`Algorithm`]
//! and never fails: unrecognized tokens fall back to `DOWN` and `layered`.

use std::{borrow::Cow, fmt};

use serde::Serialize;

/// Flow direction of a layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    /// Maps a direction token.
    ///
    /// `TB`/`BT`/`LR`/`RL` become `DOWN`/`UP`/`RIGHT`/`LEFT`, the native names
    /// pass through, and anything else is `DOWN`. Case-insensitive.
    ///
    /// ```
    /// # use trellis::options::Direction;
    /// assert_eq!(Direction::from_token("LR"), Direction::Right);
    /// assert_eq!(Direction::from_token("up"), Direction::Up);
    /// assert_eq!(Direction::from_token("diagonal"), Direction::Down);
    /// ```
    pub fn from_token(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    /// Strict variant of [`Direction::from_token`]; `None` for unknown tokens.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" | "DOWN" => Some(Self::Down),
            "BT" | "UP" => Some(Self::Up),
            "LR" | "RIGHT" => Some(Self::Right),
            "RL" | "LEFT" => Some(Self::Left),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "DOWN",
            Self::Up => "UP",
            Self::Right => "RIGHT",
            Self::Left => "LEFT",
        }
    }

    /// Returns true for `UP` and `DOWN`.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Down | Self::Up)
    }

    /// Returns true for `LEFT` and `RIGHT`.
    pub fn is_horizontal(self) -> bool {
        !self.is_vertical()
    }

    /// Returns true when flow runs toward negative coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Up | Self::Left)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looser direction normalizer for callers that only hold a raw literal.
///
/// `BT` becomes `UP`, an absent or blank token becomes `DOWN`, and every
/// other literal is returned unchanged. In particular `TB`, `LR` and `RL` are
/// not translated; use [`Direction::from_token`] for the full mapping.
///
/// ```
/// # use trellis::options::normalize_direction_loose;
/// assert_eq!(normalize_direction_loose(Some("BT")), "UP");
/// assert_eq!(normalize_direction_loose(Some("LR")), "LR");
/// assert_eq!(normalize_direction_loose(None), "DOWN");
/// ```
pub fn normalize_direction_loose(token: Option<&str>) -> Cow<'_, str> {
    match token.map(str::trim) {
        None | Some("") => Cow::Borrowed("DOWN"),
        Some(literal) if literal.eq_ignore_ascii_case("BT") => Cow::Borrowed("UP"),
        Some(literal) => Cow::Borrowed(literal),
    }
}

/// Placement algorithm requested for a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Layered,
    Force,
    Stress,
    Radial,
    Tree,
    Circular,
}

impl Algorithm {
    /// Maps an algorithm token; unknown tokens are `Layered`. Case-insensitive.
    ///
    /// ```
    /// # use trellis::options::Algorithm;
    /// assert_eq!(Algorithm::from_token("Radial"), Algorithm::Radial);
    /// assert_eq!(Algorithm::from_token("spiral"), Algorithm::Layered);
    /// ```
    pub fn from_token(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    /// Strict variant of [`Algorithm::from_token`]; `None` for unknown tokens.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "layered" => Some(Self::Layered),
            "force" => Some(Self::Force),
            "stress" => Some(Self::Stress),
            "radial" => Some(Self::Radial),
            "tree" | "mrtree" => Some(Self::Tree),
            "circular" => Some(Self::Circular),
            _ => None,
        }
    }

    /// Identifier of the algorithm in the solver's vocabulary.
    pub fn provider_id(self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Force => "force",
            Self::Stress => "stress",
            Self::Radial => "radial",
            Self::Tree => "mrtree",
            Self::Circular => "circular",
        }
    }
}

/// Per-call overrides for a layout.
///
/// Unset fields fall back to the [`LayoutConfig`](crate::config::LayoutConfig)
/// of the builder.
#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    direction: Option<String>,
    spacing: Option<f32>,
    algorithm: Option<String>,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn direction(&self) -> Option<&str> {
        self.direction.as_deref()
    }

    pub fn spacing(&self) -> Option<f32> {
        self.spacing
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }
}
