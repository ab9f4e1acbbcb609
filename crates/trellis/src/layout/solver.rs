//! The seam between Trellis and a graph-layout solver.
//!
//! The delegate describes the diagram as a [`SolverGraph`]: a tree of
//! [`SolverSubgraph`]s (one per container) holding sized nodes with four
//! cardinal ports, the edges scoped to that level, and per-subgraph options.
//! A [`LayoutSolver`] turns that description into absolute geometry.
//!
//! [`SugiyamaSolver`] is the default implementation. It lays subgraphs out
//! bottom-up, children before parents, and places the leaf nodes of each
//! scope with the algorithm requested for it:
//!
//! - `layered` / `tree`: ranks from the `rust-sugiyama` crate
//! - `force` / `stress`: a damped spring simulation
//! - `radial` / `circular`: concentric rings

mod force;
mod layered;
mod ring;

use std::collections::HashMap;

use log::{debug, info, trace};

use trellis_core::{
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
};

use crate::{
    error::TrellisError,
    options::{Algorithm, Direction},
};

/// Side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSide {
    North,
    South,
    East,
    West,
}

/// A connection point on a solver node, offset from its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    side: PortSide,
    offset: Point,
}

impl Port {
    pub fn side(&self) -> PortSide {
        self.side
    }

    pub fn offset(&self) -> Point {
        self.offset
    }
}

/// A sized node with N/S/E/W ports at the midpoints of its box.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverNode {
    id: Id,
    size: Size,
    ports: [Port; 4],
}

impl SolverNode {
    pub fn new(id: Id, size: Size) -> Self {
        let (w, h) = (size.width(), size.height());
        Self {
            id,
            size,
            ports: [
                Port {
                    side: PortSide::North,
                    offset: Point::new(w / 2.0, 0.0),
                },
                Port {
                    side: PortSide::South,
                    offset: Point::new(w / 2.0, h),
                },
                Port {
                    side: PortSide::East,
                    offset: Point::new(w, h / 2.0),
                },
                Port {
                    side: PortSide::West,
                    offset: Point::new(0.0, h / 2.0),
                },
            ],
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// The port on `side`.
    pub fn port(&self, side: PortSide) -> Port {
        // Ports are stored in PortSide declaration order
        match side {
            PortSide::North => self.ports[0],
            PortSide::South => self.ports[1],
            PortSide::East => self.ports[2],
            PortSide::West => self.ports[3],
        }
    }
}

/// An edge scoped to a subgraph. `index` is the edge's position in the
/// diagram and keys the routed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverEdge {
    index: usize,
    source: Id,
    target: Id,
}

impl SolverEdge {
    pub fn new(index: usize, source: Id, target: Id) -> Self {
        Self {
            index,
            source,
            target,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }
}

/// Layout options of one subgraph, already resolved against its parents.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    algorithm: Algorithm,
    direction: Direction,
    direction_literal: String,
    spacing: f32,
    padding: Insets,
}

impl SolverOptions {
    pub fn new(algorithm: Algorithm, direction: Direction, spacing: f32, padding: Insets) -> Self {
        Self {
            algorithm,
            direction,
            direction_literal: direction.as_str().to_string(),
            spacing,
            padding,
        }
    }

    /// Keeps the author's direction literal for solvers that take raw tokens.
    pub fn with_direction_literal(mut self, literal: impl Into<String>) -> Self {
        self.direction_literal = literal.into();
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn direction_literal(&self) -> &str {
        &self.direction_literal
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }
}

/// One level of the solver graph. The root has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSubgraph {
    id: Option<Id>,
    options: SolverOptions,
    nodes: Vec<SolverNode>,
    subgraphs: Vec<SolverSubgraph>,
    edges: Vec<SolverEdge>,
    position_hint: Option<Point>,
    min_size: Option<Size>,
}

impl SolverSubgraph {
    pub fn new(id: Option<Id>, options: SolverOptions) -> Self {
        Self {
            id,
            options,
            nodes: Vec::new(),
            subgraphs: Vec::new(),
            edges: Vec::new(),
            position_hint: None,
            min_size: None,
        }
    }

    pub fn push_node(&mut self, node: SolverNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn push_subgraph(&mut self, subgraph: SolverSubgraph) -> &mut Self {
        self.subgraphs.push(subgraph);
        self
    }

    pub fn push_edge(&mut self, edge: SolverEdge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Suggested top-left of this subgraph relative to its siblings.
    pub fn set_position_hint(&mut self, hint: Point) -> &mut Self {
        self.position_hint = Some(hint);
        self
    }

    /// Lower bound for the subgraph's final size.
    pub fn set_min_size(&mut self, size: Size) -> &mut Self {
        self.min_size = Some(size);
        self
    }

    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn nodes(&self) -> &[SolverNode] {
        &self.nodes
    }

    pub fn subgraphs(&self) -> &[SolverSubgraph] {
        &self.subgraphs
    }

    pub fn edges(&self) -> &[SolverEdge] {
        &self.edges
    }

    pub fn position_hint(&self) -> Option<Point> {
        self.position_hint
    }

    pub fn min_size(&self) -> Option<Size> {
        self.min_size
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SolverSubgraph)) {
        f(self);
        for subgraph in &self.subgraphs {
            subgraph.visit(f);
        }
    }
}

/// Hierarchical input of a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverGraph {
    root: SolverSubgraph,
}

impl SolverGraph {
    pub fn new(root: SolverSubgraph) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SolverSubgraph {
        &self.root
    }

    /// Every node at any depth.
    pub fn all_nodes(&self) -> Vec<&SolverNode> {
        let mut nodes = Vec::new();
        self.root.visit(&mut |subgraph| nodes.extend(subgraph.nodes.iter()));
        nodes
    }

    /// Every edge at any depth.
    pub fn all_edges(&self) -> Vec<&SolverEdge> {
        let mut edges = Vec::new();
        self.root.visit(&mut |subgraph| edges.extend(subgraph.edges.iter()));
        edges
    }
}

/// Absolute geometry produced by a solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverLayout {
    nodes: HashMap<Id, Bounds>,
    subgraphs: HashMap<Id, Bounds>,
    edges: HashMap<usize, Vec<Point>>,
}

impl SolverLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, id: Id, bounds: Bounds) -> &mut Self {
        self.nodes.insert(id, bounds);
        self
    }

    pub fn insert_subgraph(&mut self, id: Id, bounds: Bounds) -> &mut Self {
        self.subgraphs.insert(id, bounds);
        self
    }

    pub fn insert_edge(&mut self, index: usize, points: Vec<Point>) -> &mut Self {
        self.edges.insert(index, points);
        self
    }

    pub fn node(&self, id: Id) -> Option<Bounds> {
        self.nodes.get(&id).copied()
    }

    pub fn subgraph(&self, id: Id) -> Option<Bounds> {
        self.subgraphs.get(&id).copied()
    }

    pub fn edge(&self, index: usize) -> Option<&[Point]> {
        self.edges.get(&index).map(Vec::as_slice)
    }
}

/// A graph-layout solver.
pub trait LayoutSolver {
    /// Positions every node and subgraph of `graph` and routes its edges.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Layout`] when the solver cannot produce a
    /// layout. The pipeline does not retry.
    fn solve(&self, graph: &SolverGraph) -> Result<SolverLayout, TrellisError>;
}

/// Geometry of one subgraph, relative to its own top-left corner.
#[derive(Debug, Default)]
struct LocalLayout {
    size: Size,
    nodes: HashMap<Id, Bounds>,
    subgraphs: HashMap<Id, Bounds>,
}

impl LocalLayout {
    fn absorb(&mut self, other: LocalLayout, offset: Point) {
        self.nodes.extend(
            other
                .nodes
                .into_iter()
                .map(|(id, bounds)| (id, bounds.translate(offset))),
        );
        self.subgraphs.extend(
            other
                .subgraphs
                .into_iter()
                .map(|(id, bounds)| (id, bounds.translate(offset))),
        );
    }
}

/// Default solver.
///
/// Containment scopes are processed in post-order so every container is
/// sized from its laid-out contents before its parent places it.
#[derive(Debug, Clone)]
pub struct SugiyamaSolver {
    /// Distance a self loop travels away from its node
    loop_size: f32,

    /// Parameters of the force simulation
    force: force::ForceParams,
}

impl Default for SugiyamaSolver {
    fn default() -> Self {
        Self {
            loop_size: 20.0,
            force: force::ForceParams::default(),
        }
    }
}

impl SugiyamaSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of iterations for the force simulation
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.force.iterations = iterations;
        self
    }

    /// Set how far self loops reach out of their node
    pub fn set_loop_size(&mut self, size: f32) -> &mut Self {
        self.loop_size = size;
        self
    }

    fn solve_subgraph(&self, subgraph: &SolverSubgraph) -> Result<LocalLayout, TrellisError> {
        let options = subgraph.options();
        let direction = options.direction();
        let spacing = options.spacing();

        let children = subgraph
            .subgraphs()
            .iter()
            .map(|child| self.solve_subgraph(child).map(|layout| (child, layout)))
            .collect::<Result<Vec<_>, _>>()?;

        let leaf_boxes = self.place_leaves(subgraph)?;
        let leaf_block = block_extent(&leaf_boxes);

        let child_sizes: Vec<Size> = children.iter().map(|(_, layout)| layout.size).collect();
        let hints: Vec<Option<Point>> = children
            .iter()
            .map(|(child, _)| child.position_hint())
            .collect();
        let child_boxes = place_child_blocks(&child_sizes, &hints, direction, spacing);
        let child_block = block_extent(&child_boxes);

        // Leaves come first along the flow; reversed flows put them last.
        let gap = if leaf_block.is_some() && child_block.is_some() {
            spacing
        } else {
            0.0
        };
        let leaf_size = leaf_block.map(Bounds::to_size).unwrap_or_default();
        let child_size = child_block.map(Bounds::to_size).unwrap_or_default();
        let (leaf_offset, child_offset) = match direction {
            Direction::Down => (Point::default(), Point::new(0.0, leaf_size.height() + gap)),
            Direction::Right => (Point::default(), Point::new(leaf_size.width() + gap, 0.0)),
            Direction::Up => (Point::new(0.0, child_size.height() + gap), Point::default()),
            Direction::Left => (Point::new(child_size.width() + gap, 0.0), Point::default()),
        };

        let padding = options.padding();
        let content = match direction {
            Direction::Down | Direction::Up => Size::new(
                leaf_size.width().max(child_size.width()),
                leaf_size.height() + gap + child_size.height(),
            ),
            Direction::Right | Direction::Left => Size::new(
                leaf_size.width() + gap + child_size.width(),
                leaf_size.height().max(child_size.height()),
            ),
        };
        let mut size = content.add_padding(padding);
        if let Some(min_size) = subgraph.min_size() {
            size = size.max(min_size);
        }

        let mut local = LocalLayout {
            size,
            ..LocalLayout::default()
        };

        if let Some(block) = leaf_block {
            let shift = padding
                .offset()
                .add_point(leaf_offset)
                .sub_point(block.origin());
            for (node, bounds) in subgraph.nodes().iter().zip(&leaf_boxes) {
                local.nodes.insert(node.id(), bounds.translate(shift));
            }
        }

        if let Some(block) = child_block {
            let shift = padding
                .offset()
                .add_point(child_offset)
                .sub_point(block.origin());
            for ((child, layout), bounds) in children.into_iter().zip(&child_boxes) {
                let placed = bounds.translate(shift);
                if let Some(id) = child.id() {
                    local.subgraphs.insert(id, placed);
                }
                local.absorb(layout, placed.origin());
            }
        }

        trace!(
            subgraph:? = subgraph.id(),
            width = size.width(),
            height = size.height();
            "Subgraph solved"
        );
        Ok(local)
    }

    /// Boxes of the leaf nodes of `subgraph`, in node order, in an arbitrary
    /// local frame.
    fn place_leaves(&self, subgraph: &SolverSubgraph) -> Result<Vec<Bounds>, TrellisError> {
        let nodes = subgraph.nodes();
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let index: HashMap<Id, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();
        let mut edges: Vec<(usize, usize)> = subgraph
            .edges()
            .iter()
            .filter_map(|edge| Some((*index.get(&edge.source())?, *index.get(&edge.target())?)))
            .filter(|(source, target)| source != target)
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let sizes: Vec<Size> = nodes.iter().map(SolverNode::size).collect();
        let options = subgraph.options();

        debug!(
            algorithm = options.algorithm().provider_id(),
            nodes_count = nodes.len(),
            edges_count = edges.len();
            "Placing leaf nodes"
        );

        let boxes = match options.algorithm() {
            Algorithm::Layered | Algorithm::Tree => layered::place(&sizes, &edges, options)?,
            Algorithm::Force => force::place(&sizes, &edges, options, &self.force, false),
            Algorithm::Stress => force::place(&sizes, &edges, options, &self.force, true),
            Algorithm::Radial => ring::place_radial(&sizes, &edges, options),
            Algorithm::Circular => ring::place_circular(&sizes, options),
        };
        Ok(boxes)
    }

    fn route_edge(
        &self,
        source: &SolverNode,
        source_box: Bounds,
        target: &SolverNode,
        target_box: Bounds,
    ) -> Vec<Point> {
        if source.id() == target.id() {
            return self.self_loop(source_box);
        }

        let delta = target_box.center().sub_point(source_box.center());
        let (source_side, target_side) = if delta.x().abs() > delta.y().abs() {
            if delta.x() > 0.0 {
                (PortSide::East, PortSide::West)
            } else {
                (PortSide::West, PortSide::East)
            }
        } else if delta.y() >= 0.0 {
            (PortSide::South, PortSide::North)
        } else {
            (PortSide::North, PortSide::South)
        };

        vec![
            source_box.origin().add_point(source.port(source_side).offset()),
            target_box.origin().add_point(target.port(target_side).offset()),
        ]
    }

    /// Loop leaving the east side and returning through the top.
    fn self_loop(&self, bounds: Bounds) -> Vec<Point> {
        let center = bounds.center();
        let reach = self.loop_size;
        vec![
            Point::new(bounds.max_x(), center.y()),
            Point::new(bounds.max_x() + reach, center.y()),
            Point::new(bounds.max_x() + reach, bounds.y() - reach),
            Point::new(center.x(), bounds.y() - reach),
            Point::new(center.x(), bounds.y()),
        ]
    }
}

impl LayoutSolver for SugiyamaSolver {
    fn solve(&self, graph: &SolverGraph) -> Result<SolverLayout, TrellisError> {
        let local = self.solve_subgraph(graph.root())?;

        let mut layout = SolverLayout::new();
        layout.nodes = local.nodes;
        layout.subgraphs = local.subgraphs;

        let nodes: HashMap<Id, &SolverNode> = graph
            .all_nodes()
            .into_iter()
            .map(|node| (node.id(), node))
            .collect();

        for edge in graph.all_edges() {
            let endpoints = (
                nodes.get(&edge.source()),
                layout.nodes.get(&edge.source()),
                nodes.get(&edge.target()),
                layout.nodes.get(&edge.target()),
            );
            if let (Some(source), Some(&source_box), Some(target), Some(&target_box)) = endpoints {
                let points = self.route_edge(source, source_box, target, target_box);
                layout.edges.insert(edge.index(), points);
            }
        }

        info!(
            nodes_count = layout.nodes.len(),
            subgraphs_count = layout.subgraphs.len(),
            edges_count = layout.edges.len();
            "Solver finished"
        );
        Ok(layout)
    }
}

/// Smallest box containing all `boxes`, or `None` when empty.
fn block_extent(boxes: &[Bounds]) -> Option<Bounds> {
    boxes
        .iter()
        .copied()
        .reduce(|acc, bounds| acc.merge(&bounds))
}

/// Places child blocks at their hints and pushes apart any that collide.
///
/// Hints come from size estimates, so real blocks may be larger than the
/// room left for them. A colliding block is pushed away from the block it
/// hits, along the axis on which their hints differ most.
fn place_child_blocks(
    sizes: &[Size],
    hints: &[Option<Point>],
    direction: Direction,
    spacing: f32,
) -> Vec<Bounds> {
    let mut boxes: Vec<Bounds> = Vec::with_capacity(sizes.len());
    let mut cursor = 0.0f32;
    let mut resolved_hints = Vec::with_capacity(sizes.len());

    for (&size, hint) in sizes.iter().zip(hints) {
        let origin = hint.unwrap_or_else(|| match direction {
            Direction::Down => Point::new(0.0, cursor),
            Direction::Right => Point::new(cursor, 0.0),
            Direction::Up => Point::new(0.0, cursor - size.height()),
            Direction::Left => Point::new(cursor - size.width(), 0.0),
        });
        cursor = match direction {
            Direction::Down => origin.y() + size.height() + spacing,
            Direction::Right => origin.x() + size.width() + spacing,
            Direction::Up => origin.y() - spacing,
            Direction::Left => origin.x() - spacing,
        };
        resolved_hints.push(origin);
        boxes.push(Bounds::new_from_top_left(origin, size));
    }

    for i in 1..boxes.len() {
        // Each push clears one collision; bounded by the number of blocks
        for _ in 0..boxes.len() * boxes.len() {
            let Some(j) = (0..i).find(|&j| boxes[i].overlaps(&boxes[j])) else {
                break;
            };
            let delta = resolved_hints[i].sub_point(resolved_hints[j]);
            let horizontal = if delta.x().abs() > delta.y().abs() {
                true
            } else if delta.y() != 0.0 {
                false
            } else {
                direction.is_horizontal()
            };
            let forward = if horizontal {
                delta.x() > 0.0 || (delta.x() == 0.0 && !direction.is_reversed())
            } else {
                delta.y() > 0.0 || (delta.y() == 0.0 && !direction.is_reversed())
            };
            let (me, other) = (boxes[i], boxes[j]);
            let shift = match (horizontal, forward) {
                (true, true) => Point::new(other.max_x() + spacing - me.x(), 0.0),
                (true, false) => Point::new(other.x() - spacing - me.max_x(), 0.0),
                (false, true) => Point::new(0.0, other.max_y() + spacing - me.y()),
                (false, false) => Point::new(0.0, other.y() - spacing - me.max_y()),
            };
            boxes[i] = me.translate(shift);
        }
    }
    boxes
}

/// Maps a flow-space position (`main` along the flow, `cross` across it) to
/// a top-left corner for a box of `size`.
fn flow_to_xy(main: f32, cross: f32, size: Size, direction: Direction) -> Point {
    match direction {
        Direction::Down => Point::new(cross, main),
        Direction::Up => Point::new(cross, -main - size.height()),
        Direction::Right => Point::new(main, cross),
        Direction::Left => Point::new(-main - size.width(), cross),
    }
}

/// Extent of `size` along the flow.
fn main_extent(size: Size, direction: Direction) -> f32 {
    if direction.is_vertical() {
        size.height()
    } else {
        size.width()
    }
}

/// Extent of `size` across the flow.
fn cross_extent(size: Size, direction: Direction) -> f32 {
    if direction.is_vertical() {
        size.width()
    } else {
        size.height()
    }
}
