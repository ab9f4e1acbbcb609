//! Solver-facing layout stage.
//!
//! [`solver`] defines the seam to a graph-layout solver and ships the default
//! one. The delegate translates a diagram into solver input and maps the
//! solver's answer back into [`positioned`] output.

pub(crate) mod delegate;
pub mod positioned;
pub mod solver;

pub use positioned::{DiagramLayout, PositionedContainer, PositionedNode, RoutedEdge};
pub use solver::{LayoutSolver, SolverGraph, SolverLayout, SugiyamaSolver};
