//! Translation between the diagram model and the solver graph.
//!
//! Building the graph resolves per-container options against their parents,
//! scopes every edge to the lowest container holding both endpoints, and
//! pre-arranges sibling containers (swimlanes, BPMN lanes, ordinary groups)
//! through position hints. Mapping back turns the solver's flat answer into
//! positioned nodes, a positioned container forest, and routed edges, filling
//! in anything the solver left out.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use trellis_core::{
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
    model::{Container, Diagram, Node, Orientation},
};

use super::{
    positioned::{PositionedContainer, PositionedNode, RoutedEdge},
    solver::{SolverEdge, SolverGraph, SolverLayout, SolverNode, SolverOptions, SolverSubgraph},
};
use crate::{
    config::LayoutConfig,
    diagnostic::Diagnostics,
    options::{Algorithm, Direction, normalize_direction_loose},
    structure::{ContainerIdx, ContainerModel},
};

/// Edges grouped by the scope owning them; `None` is the top level.
pub(crate) type ScopedEdges = HashMap<Option<ContainerIdx>, Vec<SolverEdge>>;

/// Attaches every edge to the lowest common container of its endpoints.
///
/// Edges naming an undeclared node are skipped and reported.
pub(crate) fn distribute_edges(
    diagram: &Diagram,
    model: &ContainerModel<'_>,
    diagnostics: &mut Diagnostics,
) -> ScopedEdges {
    let declared: HashSet<Id> = diagram.nodes().iter().map(Node::id).collect();
    let mut scoped = ScopedEdges::new();

    for (index, edge) in diagram.edges().iter().enumerate() {
        let missing = [edge.from(), edge.to()]
            .into_iter()
            .find(|id| !declared.contains(id));
        if let Some(missing) = missing {
            diagnostics.warn(format!(
                "edge {} -> {} references unknown node `{missing}`",
                edge.from(),
                edge.to()
            ));
            continue;
        }

        let scope = model.lowest_common_ancestor(edge.from(), edge.to());
        scoped
            .entry(scope)
            .or_default()
            .push(SolverEdge::new(index, edge.from(), edge.to()));
    }
    scoped
}

/// Returns true when another container with the same id won the lookup.
fn is_shadowed(model: &ContainerModel<'_>, idx: ContainerIdx) -> bool {
    model.index_of(model.id(idx)) != Some(idx)
}

/// Builds a [`SolverGraph`] for one diagram.
pub(crate) struct GraphBuilder<'a> {
    model: &'a ContainerModel<'a>,
    sizes: &'a HashMap<Id, Size>,
    config: &'a LayoutConfig,
    scope_nodes: HashMap<Option<ContainerIdx>, Vec<Id>>,
    scope_edges: ScopedEdges,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(
        diagram: &'a Diagram,
        model: &'a ContainerModel<'a>,
        sizes: &'a HashMap<Id, Size>,
        config: &'a LayoutConfig,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut scope_nodes: HashMap<Option<ContainerIdx>, Vec<Id>> = HashMap::new();
        for node in diagram.nodes() {
            let id = node.id();
            if !seen.insert(id) {
                diagnostics.warn(format!("duplicate node id `{id}`, keeping the first"));
                continue;
            }
            scope_nodes
                .entry(model.container_of_node(id))
                .or_default()
                .push(id);
        }

        for idx in model.indices() {
            if is_shadowed(model, idx) {
                diagnostics.warn(format!(
                    "duplicate container id `{}`, keeping the last",
                    model.id(idx)
                ));
            }
        }

        let scope_edges = distribute_edges(diagram, model, diagnostics);

        Self {
            model,
            sizes,
            config,
            scope_nodes,
            scope_edges,
        }
    }

    pub(crate) fn build(&self, root_options: SolverOptions) -> SolverGraph {
        let mut root = SolverSubgraph::new(None, root_options.clone());
        self.fill_scope(&mut root, None, &root_options);

        debug!(
            top_level_nodes = root.nodes().len(),
            top_level_containers = root.subgraphs().len();
            "Solver graph built"
        );
        SolverGraph::new(root)
    }

    fn fill_scope(
        &self,
        subgraph: &mut SolverSubgraph,
        scope: Option<ContainerIdx>,
        options: &SolverOptions,
    ) {
        for &id in self.scope_nodes.get(&scope).into_iter().flatten() {
            subgraph.push_node(SolverNode::new(id, self.node_size(id)));
        }
        for &edge in self.scope_edges.get(&scope).into_iter().flatten() {
            subgraph.push_edge(edge);
        }

        let children = self.children_of(scope);
        let child_options: Vec<SolverOptions> = children
            .iter()
            .map(|&child| self.child_options(child, options))
            .collect();
        let arrangement = self.arrange_children(scope, &children, &child_options, options);

        for (i, (&child, child_options)) in children.iter().zip(child_options).enumerate() {
            let mut child_graph = SolverSubgraph::new(Some(self.model.id(child)), child_options.clone());
            self.fill_scope(&mut child_graph, Some(child), &child_options);
            child_graph.set_position_hint(arrangement.hints[i]);
            if let Some(min_size) = arrangement.min_sizes[i] {
                child_graph.set_min_size(min_size);
            }
            subgraph.push_subgraph(child_graph);
        }
    }

    fn node_size(&self, id: Id) -> Size {
        self.sizes.get(&id).copied().unwrap_or_default()
    }

    fn children_of(&self, scope: Option<ContainerIdx>) -> Vec<ContainerIdx> {
        let children = match scope {
            Some(idx) => self.model.children(idx),
            None => self.model.roots(),
        };
        children
            .iter()
            .copied()
            .filter(|&child| !is_shadowed(self.model, child))
            .collect()
    }

    /// Options of `idx`, inheriting whatever it leaves unset from `parent`.
    fn child_options(&self, idx: ContainerIdx, parent: &SolverOptions) -> SolverOptions {
        let container = self.model.container(idx);

        let algorithm = container
            .algorithm_token()
            .map_or(parent.algorithm(), Algorithm::from_token);
        let direction = flow_direction(container, parent.direction());
        let literal = match container.direction_token() {
            Some(token) => normalize_direction_loose(Some(token)).into_owned(),
            None if container.is_swimlane() => direction.as_str().to_string(),
            None => parent.direction_literal().to_string(),
        };
        let spacing = container.spacing().unwrap_or(parent.spacing());
        let padding = Insets::uniform(container.padding().unwrap_or(self.config.padding()));

        SolverOptions::new(algorithm, direction, spacing, padding).with_direction_literal(literal)
    }

    /// Rough size of a container before layout, used to pre-arrange siblings.
    fn estimate(&self, idx: ContainerIdx, options: &SolverOptions) -> Size {
        let direction = options.direction();
        let spacing = options.spacing();

        let leaves: Vec<Size> = self
            .scope_nodes
            .get(&Some(idx))
            .into_iter()
            .flatten()
            .map(|&id| self.node_size(id))
            .collect();
        // Unconnected leaves share one rank across the flow
        let leaf_block = (!leaves.is_empty()).then(|| {
            let across = leaves.iter().map(|&size| across_flow(size, direction)).sum::<f32>()
                + spacing * (leaves.len() - 1) as f32;
            let along = leaves
                .iter()
                .map(|&size| along_flow(size, direction))
                .fold(0.0f32, f32::max);
            from_flow(along, across, direction)
        });

        let children = self.children_of(Some(idx));
        let child_options: Vec<SolverOptions> = children
            .iter()
            .map(|&child| self.child_options(child, options))
            .collect();
        let arrangement = self.arrange_children(Some(idx), &children, &child_options, options);
        let child_block = arrangement.block;

        let content = match (leaf_block, child_block) {
            (Some(leaves), Some(children)) => {
                let along = along_flow(leaves, direction) + spacing + along_flow(children, direction);
                let across = across_flow(leaves, direction).max(across_flow(children, direction));
                from_flow(along, across, direction)
            }
            (Some(block), None) | (None, Some(block)) => block,
            (None, None) => Size::default(),
        };
        content.add_padding(options.padding())
    }

    /// Position hints for the children of one scope.
    ///
    /// Children are grouped into BPMN lanes, top-level pools, horizontal
    /// swimlanes, vertical swimlanes and ordinary containers. Each group is
    /// arranged on its own, then the groups follow one another along the
    /// scope's flow. Pools always stack top to bottom, whatever the flow.
    fn arrange_children(
        &self,
        scope: Option<ContainerIdx>,
        children: &[ContainerIdx],
        child_options: &[SolverOptions],
        options: &SolverOptions,
    ) -> Arrangement {
        let direction = options.direction();
        let spacing = options.spacing();
        let in_pool = scope.is_some_and(|idx| self.model.container(idx).is_pool());

        let mut groups: [Vec<usize>; 5] = Default::default();
        for (i, &child) in children.iter().enumerate() {
            let container = self.model.container(child);
            let group = if in_pool && container.is_lane() {
                0
            } else if scope.is_none() && container.is_pool() {
                1
            } else {
                match container.orientation() {
                    Some(Orientation::Horizontal) => 2,
                    Some(Orientation::Vertical) => 3,
                    None => 4,
                }
            };
            groups[group].push(i);
        }

        let mut sizes: Vec<Size> = children
            .iter()
            .zip(child_options)
            .map(|(&child, child_options)| self.estimate(child, child_options))
            .collect();
        let mut hints = vec![Point::default(); children.len()];
        let mut min_sizes = vec![None; children.len()];
        let mut block: Option<Bounds> = None;
        let mut cursor = 0.0f32;

        for (group, members) in groups.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let mut member_sizes: Vec<Size> = members.iter().map(|&i| sizes[i]).collect();
            let positions = match group {
                0 => {
                    let positions = arrange_bpmn_lanes(&mut member_sizes);
                    for (&i, &size) in members.iter().zip(&member_sizes) {
                        sizes[i] = size;
                        min_sizes[i] = Some(Size::new(size.width(), 0.0));
                    }
                    positions
                }
                1 => {
                    let positions = arrange_pools(&mut member_sizes, spacing);
                    for (&i, &size) in members.iter().zip(&member_sizes) {
                        sizes[i] = size;
                        min_sizes[i] = Some(Size::new(size.width(), 0.0));
                    }
                    positions
                }
                2 => arrange_swimlanes(&member_sizes, Orientation::Horizontal, spacing),
                3 => arrange_swimlanes(&member_sizes, Orientation::Vertical, spacing),
                _ => arrange_ordinary(&member_sizes, direction, spacing),
            };

            let Some(group_block) = positions
                .iter()
                .zip(&member_sizes)
                .map(|(&origin, &size)| Bounds::new_from_top_left(origin, size))
                .reduce(|acc, bounds| acc.merge(&bounds))
            else {
                continue;
            };

            let offset = match direction {
                Direction::Down => Point::new(-group_block.x(), cursor - group_block.y()),
                Direction::Right => Point::new(cursor - group_block.x(), -group_block.y()),
                Direction::Up => Point::new(-group_block.x(), cursor - group_block.max_y()),
                Direction::Left => Point::new(cursor - group_block.max_x(), -group_block.y()),
            };
            cursor = match direction {
                Direction::Down => cursor + group_block.height() + spacing,
                Direction::Right => cursor + group_block.width() + spacing,
                Direction::Up => cursor - group_block.height() - spacing,
                Direction::Left => cursor - group_block.width() - spacing,
            };

            for (&i, &origin) in members.iter().zip(&positions) {
                hints[i] = origin.add_point(offset);
            }
            let placed = group_block.translate(offset);
            block = Some(block.map_or(placed, |block| block.merge(&placed)));
        }

        trace!(
            scope:? = scope.map(ContainerIdx::index),
            hints:? = hints;
            "Arranged child containers"
        );

        Arrangement {
            hints,
            min_sizes,
            block: block.map(Bounds::to_size),
        }
    }
}

struct Arrangement {
    hints: Vec<Point>,
    min_sizes: Vec<Option<Size>>,
    block: Option<Size>,
}

/// Stacks swimlanes perpendicular to their flow.
///
/// Horizontal lanes stack downwards, vertical lanes stack rightwards. The
/// first lane sits at the origin; every next lane starts after the previous
/// lanes' extent plus `spacing`.
pub(crate) fn arrange_swimlanes(sizes: &[Size], orientation: Orientation, spacing: f32) -> Vec<Point> {
    let mut cursor = 0.0f32;
    sizes
        .iter()
        .map(|&size| {
            let origin = match orientation {
                Orientation::Horizontal => Point::new(0.0, cursor),
                Orientation::Vertical => Point::new(cursor, 0.0),
            };
            cursor += match orientation {
                Orientation::Horizontal => size.height(),
                Orientation::Vertical => size.width(),
            } + spacing;
            origin
        })
        .collect()
}

/// Advances containers along the primary axis of `direction`.
///
/// Reversed directions grow towards negative coordinates; the first
/// container always sits at the origin.
pub(crate) fn arrange_ordinary(sizes: &[Size], direction: Direction, spacing: f32) -> Vec<Point> {
    let mut positions: Vec<Point> = Vec::with_capacity(sizes.len());
    for (k, &size) in sizes.iter().enumerate() {
        let origin = match (k.checked_sub(1), direction) {
            (None, _) => Point::default(),
            (Some(prev), Direction::Down) => {
                Point::new(0.0, positions[prev].y() + sizes[prev].height() + spacing)
            }
            (Some(prev), Direction::Right) => {
                Point::new(positions[prev].x() + sizes[prev].width() + spacing, 0.0)
            }
            (Some(prev), Direction::Up) => {
                Point::new(0.0, positions[prev].y() - spacing - size.height())
            }
            (Some(prev), Direction::Left) => {
                Point::new(positions[prev].x() - spacing - size.width(), 0.0)
            }
        };
        positions.push(origin);
    }
    positions
}

/// Stacks BPMN lanes top to bottom with no gap, after widening every lane to
/// the widest one.
pub(crate) fn arrange_bpmn_lanes(sizes: &mut [Size]) -> Vec<Point> {
    let width = sizes.iter().map(|size| size.width()).fold(0.0f32, f32::max);
    let mut cursor = 0.0f32;
    sizes
        .iter_mut()
        .map(|size| {
            *size = size.with_width(width);
            let origin = Point::new(0.0, cursor);
            cursor += size.height();
            origin
        })
        .collect()
}

/// Stacks top-level pools top to bottom, `spacing` apart, after widening
/// every pool to the widest one.
pub(crate) fn arrange_pools(sizes: &mut [Size], spacing: f32) -> Vec<Point> {
    let width = sizes.iter().map(|size| size.width()).fold(0.0f32, f32::max);
    for size in sizes.iter_mut() {
        *size = size.with_width(width);
    }
    arrange_swimlanes(sizes, Orientation::Horizontal, spacing)
}

/// Flow direction inside `container`: its own token first, then its lane
/// orientation (horizontal lanes flow right, vertical lanes down), then the
/// parent's direction.
pub(crate) fn flow_direction(container: &Container, parent: Direction) -> Direction {
    match (container.direction_token(), container.orientation()) {
        (Some(token), _) => Direction::from_token(token),
        (None, Some(Orientation::Horizontal)) => Direction::Right,
        (None, Some(Orientation::Vertical)) => Direction::Down,
        (None, None) => parent,
    }
}

fn along_flow(size: Size, direction: Direction) -> f32 {
    if direction.is_vertical() {
        size.height()
    } else {
        size.width()
    }
}

fn across_flow(size: Size, direction: Direction) -> f32 {
    if direction.is_vertical() {
        size.width()
    } else {
        size.height()
    }
}

fn from_flow(along: f32, across: f32, direction: Direction) -> Size {
    if direction.is_vertical() {
        Size::new(across, along)
    } else {
        Size::new(along, across)
    }
}

/// Positioned output before normalization.
#[derive(Debug, Default)]
pub(crate) struct MappedLayout {
    pub(crate) nodes: Vec<PositionedNode>,
    pub(crate) containers: Vec<PositionedContainer>,
    pub(crate) edges: Vec<RoutedEdge>,
}

/// Reads the solver's answer back into positioned elements.
///
/// A node the solver did not place sits at the origin at its intrinsic size;
/// a container it did not place wraps its contents. Both are reported. A
/// missing or degenerate route becomes a straight line between centers.
pub(crate) fn map_back(
    diagram: &Diagram,
    model: &ContainerModel<'_>,
    sizes: &HashMap<Id, Size>,
    layout: &SolverLayout,
    diagnostics: &mut Diagnostics,
) -> MappedLayout {
    let mut mapped = MappedLayout::default();
    let mut node_bounds: HashMap<Id, Bounds> = HashMap::new();

    for node in diagram.nodes() {
        let id = node.id();
        if node_bounds.contains_key(&id) {
            continue;
        }
        let bounds = layout.node(id).unwrap_or_else(|| {
            diagnostics.warn(format!("solver did not place node `{id}`"));
            let size = sizes.get(&id).copied().unwrap_or_default();
            Bounds::new_from_top_left(Point::default(), size)
        });
        node_bounds.insert(id, bounds);
        mapped.nodes.push(PositionedNode::new(node, bounds));
    }

    for &root in model.roots() {
        if let Some(container) = map_container(model, root, layout, &node_bounds, diagnostics) {
            mapped.containers.push(container);
        }
    }

    for (index, edge) in diagram.edges().iter().enumerate() {
        let (Some(source), Some(target)) = (node_bounds.get(&edge.from()), node_bounds.get(&edge.to()))
        else {
            continue;
        };
        let points = match layout.edge(index) {
            Some(points) if points.len() >= 2 => points.to_vec(),
            _ => vec![source.center(), target.center()],
        };
        mapped.edges.push(RoutedEdge::new(edge, points));
    }

    trace!(
        nodes_count = mapped.nodes.len(),
        containers_count = mapped.containers.len(),
        edges_count = mapped.edges.len();
        "Mapped solver output"
    );
    mapped
}

fn map_container(
    model: &ContainerModel<'_>,
    idx: ContainerIdx,
    layout: &SolverLayout,
    node_bounds: &HashMap<Id, Bounds>,
    diagnostics: &mut Diagnostics,
) -> Option<PositionedContainer> {
    if is_shadowed(model, idx) {
        return None;
    }

    let children: Vec<PositionedContainer> = model
        .children(idx)
        .iter()
        .filter_map(|&child| map_container(model, child, layout, node_bounds, diagnostics))
        .collect();

    let id = model.id(idx);
    let bounds = match layout.subgraph(id) {
        Some(bounds) => bounds,
        None => {
            diagnostics.warn(format!("solver did not place container `{id}`"));
            let held = model
                .container(idx)
                .nodes()
                .iter()
                .filter(|&&node| model.container_of_node(node) == Some(idx))
                .filter_map(|node| node_bounds.get(node).copied());
            held.chain(children.iter().map(PositionedContainer::bounds))
                .reduce(|acc, bounds| acc.merge(&bounds))
                .unwrap_or_default()
        }
    };

    let mut container = PositionedContainer::new(model.container(idx), bounds);
    *container.children_mut() = children;
    Some(container)
}
