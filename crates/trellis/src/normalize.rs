//! Container normalization.
//!
//! Runs after the solver output has been mapped back and before anchors are
//! snapped. The passes, in order:
//!
//! 1. [`enforce_containment`]: every container grows to hold its contents.
//! 2. [`apply_uniform_swimlane_dimensions`]: sibling lanes share one extent
//!    and are re-stacked without gaps; other siblings make room.
//! 3. [`enforce_containment`] again, for the parents of moved lanes.
//! 4. [`apply_uniform_bpmn_pool_dimensions`]: top-level pools share a width;
//!    other top-level containers make room.
//! 5. [`stretch_bpmn_lanes_in_pools`]: lanes span their pool.
//! 6. [`shift_to_origin`]: the drawing starts at `(0, 0)`.
//!
//! Running the whole sequence twice gives the same geometry as running it
//! once.

use std::collections::HashMap;

use log::{debug, trace};

use trellis_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{ContainerShape, Orientation},
};

use crate::{
    layout::{
        delegate::flow_direction,
        positioned::{PositionedContainer, PositionedNode, RoutedEdge},
    },
    options::Direction,
    routing::recalculate_cross_container_edges,
    structure::{ContainerIdx, ContainerModel},
};

/// Moves below this distance are treated as no move.
const EPSILON: f32 = 1e-3;

/// Runs every normalization pass in order.
///
/// `direction` and `spacing` are the top level's; nested containers resolve
/// their own.
pub fn normalize(
    model: &ContainerModel<'_>,
    containers: &mut [PositionedContainer],
    nodes: &mut [PositionedNode],
    edges: &mut [RoutedEdge],
    direction: Direction,
    spacing: f32,
) {
    enforce_containment(model, containers, nodes);
    apply_uniform_swimlane_dimensions(model, containers, nodes, edges, direction, spacing);
    enforce_containment(model, containers, nodes);
    apply_uniform_bpmn_pool_dimensions(model, containers, nodes, edges, direction, spacing);
    stretch_bpmn_lanes_in_pools(containers);
    shift_to_origin(containers, nodes, edges);
}

/// Gives sibling swimlanes a common extent and stacks them without gaps.
///
/// Horizontal lanes share the widest width and stack downwards; vertical
/// lanes share the tallest height and stack rightwards. Lanes keep their
/// order along the stacking axis and line up with the first one. A non-lane
/// sibling the resized lanes now cover is pushed past them along the flow.
/// Nodes and nested containers of a moved container move with it, as do
/// edges running inside it. Edges between different containers are re-routed
/// afterwards.
pub fn apply_uniform_swimlane_dimensions(
    model: &ContainerModel<'_>,
    containers: &mut [PositionedContainer],
    nodes: &mut [PositionedNode],
    edges: &mut [RoutedEdge],
    direction: Direction,
    spacing: f32,
) {
    if !model.indices().any(|idx| model.container(idx).is_swimlane()) {
        return;
    }

    let mut moves: Vec<(ContainerIdx, Point)> = Vec::new();
    align_lanes(model, containers, direction, spacing, &mut moves);
    move_contents(model, &moves, nodes, edges);

    debug!(moved_containers = moves.len(); "Uniform swimlane dimensions applied");
    recalculate_cross_container_edges(model, nodes, edges, direction);
}

/// Carries nodes and internal edges along with their moved containers.
fn move_contents(
    model: &ContainerModel<'_>,
    moves: &[(ContainerIdx, Point)],
    nodes: &mut [PositionedNode],
    edges: &mut [RoutedEdge],
) {
    for &(container, delta) in moves {
        for node in nodes.iter_mut() {
            if model.contains_transitively(container, node.id()) {
                node.set_bounds(node.bounds().translate(delta));
            }
        }
        for edge in edges.iter_mut() {
            if model.contains_transitively(container, edge.from())
                && model.contains_transitively(container, edge.to())
            {
                let moved = edge.points().iter().map(|point| point.add_point(delta)).collect();
                edge.set_points(moved);
            }
        }
    }
}

/// Aligns lanes among `siblings`, nested levels first.
///
/// A sibling whose nested lanes moved grows to hold them again before its
/// own level is aligned. `direction` and `spacing` belong to the scope
/// holding `siblings`.
fn align_lanes(
    model: &ContainerModel<'_>,
    siblings: &mut [PositionedContainer],
    direction: Direction,
    spacing: f32,
    moves: &mut Vec<(ContainerIdx, Point)>,
) {
    for sibling in siblings.iter_mut() {
        let (inner_direction, inner_spacing) = match model.index_of(sibling.id()) {
            Some(idx) => {
                let container = model.container(idx);
                (
                    flow_direction(container, direction),
                    container.spacing().unwrap_or(spacing),
                )
            }
            None => (direction, spacing),
        };
        align_lanes(model, sibling.children_mut(), inner_direction, inner_spacing, moves);
        let bounds = sibling
            .children()
            .iter()
            .fold(sibling.bounds(), |acc, child| acc.merge(&child.bounds()));
        sibling.set_bounds(bounds);
    }

    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let mut lanes: Vec<usize> = siblings
            .iter()
            .enumerate()
            .filter(|(_, container)| {
                model
                    .index_of(container.id())
                    .is_some_and(|idx| model.container(idx).orientation() == Some(orientation))
            })
            .map(|(i, _)| i)
            .collect();
        if lanes.is_empty() {
            continue;
        }

        let stack_start = |bounds: Bounds| match orientation {
            Orientation::Horizontal => bounds.y(),
            Orientation::Vertical => bounds.x(),
        };
        lanes.sort_by(|&a, &b| {
            stack_start(siblings[a].bounds()).total_cmp(&stack_start(siblings[b].bounds()))
        });

        let first = siblings[lanes[0]].bounds();
        let extent = lanes
            .iter()
            .map(|&i| match orientation {
                Orientation::Horizontal => siblings[i].bounds().width(),
                Orientation::Vertical => siblings[i].bounds().height(),
            })
            .fold(0.0f32, f32::max);

        let mut cursor = stack_start(first);
        for &i in &lanes {
            let lane = &mut siblings[i];
            let bounds = lane.bounds();
            let target = match orientation {
                Orientation::Horizontal => Point::new(first.x(), cursor),
                Orientation::Vertical => Point::new(cursor, first.y()),
            };
            let resized = match orientation {
                Orientation::Horizontal => bounds.with_width(extent),
                Orientation::Vertical => bounds.with_height(extent),
            };
            lane.set_bounds(resized);

            let delta = target.sub_point(bounds.origin());
            if delta.x().abs() > EPSILON || delta.y().abs() > EPSILON {
                lane.translate(delta);
                if let Some(idx) = model.index_of(lane.id()) {
                    moves.push((idx, delta));
                }
                trace!(lane:% = lane.id(), dx = delta.x(), dy = delta.y(); "Moved swimlane");
            }

            cursor += match orientation {
                Orientation::Horizontal => lane.bounds().height(),
                Orientation::Vertical => lane.bounds().width(),
            };
        }
    }

    let (mut lanes, others): (Vec<usize>, Vec<usize>) = (0..siblings.len()).partition(|&i| {
        model
            .index_of(siblings[i].id())
            .is_some_and(|idx| model.container(idx).is_swimlane())
    });
    if !lanes.is_empty() {
        push_clear(model, siblings, &mut lanes, others, direction, spacing, moves);
    }
}

/// Moves each of `candidates`, in flow order, along `direction` until it no
/// longer overlaps any settled sibling, leaving `gap` after the last one it
/// cleared. Placed candidates join `settled`.
///
/// Every push runs in the same direction and clears one obstacle for good,
/// so a candidate moves at most once per settled sibling.
fn push_clear(
    model: &ContainerModel<'_>,
    siblings: &mut [PositionedContainer],
    settled: &mut Vec<usize>,
    mut candidates: Vec<usize>,
    direction: Direction,
    gap: f32,
    moves: &mut Vec<(ContainerIdx, Point)>,
) {
    let gap = gap.max(0.0);
    let flow_start = |bounds: Bounds| match direction {
        Direction::Down => bounds.y(),
        Direction::Up => -bounds.max_y(),
        Direction::Right => bounds.x(),
        Direction::Left => -bounds.max_x(),
    };
    candidates.sort_by(|&a, &b| {
        flow_start(siblings[a].bounds()).total_cmp(&flow_start(siblings[b].bounds()))
    });

    for i in candidates {
        loop {
            let bounds = siblings[i].bounds();
            let Some(obstacle) = settled
                .iter()
                .map(|&j| siblings[j].bounds())
                .find(|obstacle| obstacle.overlaps(&bounds))
            else {
                break;
            };
            let delta = match direction {
                Direction::Down => Point::new(0.0, obstacle.max_y() + gap - bounds.y()),
                Direction::Up => Point::new(0.0, obstacle.y() - gap - bounds.max_y()),
                Direction::Right => Point::new(obstacle.max_x() + gap - bounds.x(), 0.0),
                Direction::Left => Point::new(obstacle.x() - gap - bounds.max_x(), 0.0),
            };
            let sibling = &mut siblings[i];
            sibling.translate(delta);
            if let Some(idx) = model.index_of(sibling.id()) {
                moves.push((idx, delta));
            }
            trace!(container:% = sibling.id(), dx = delta.x(), dy = delta.y(); "Pushed sibling clear");
        }
        settled.push(i);
    }
}

/// Grows containers, children first, until each holds its direct nodes and
/// nested containers.
///
/// Boxes only ever grow; a container that already fits is left untouched.
pub fn enforce_containment(
    model: &ContainerModel<'_>,
    containers: &mut [PositionedContainer],
    nodes: &[PositionedNode],
) {
    let node_bounds: HashMap<Id, Bounds> = nodes.iter().map(|node| (node.id(), node.bounds())).collect();
    let mut grown = 0usize;
    for container in containers.iter_mut() {
        grow_to_fit(model, container, &node_bounds, &mut grown);
    }
    trace!(grown_containers = grown; "Containment enforced");
}

fn grow_to_fit(
    model: &ContainerModel<'_>,
    container: &mut PositionedContainer,
    node_bounds: &HashMap<Id, Bounds>,
    grown: &mut usize,
) {
    for child in container.children_mut().iter_mut() {
        grow_to_fit(model, child, node_bounds, grown);
    }

    let original = container.bounds();
    let mut bounds = original;
    for child in container.children() {
        bounds = bounds.merge(&child.bounds());
    }
    if let Some(idx) = model.index_of(container.id()) {
        let held = model
            .container(idx)
            .nodes()
            .iter()
            .filter(|&&node| model.container_of_node(node) == Some(idx))
            .filter_map(|node| node_bounds.get(node));
        for node in held {
            bounds = bounds.merge(node);
        }
    }

    if bounds != original {
        container.set_bounds(bounds);
        *grown += 1;
    }
}

/// With two or more top-level pools, widens all of them to the widest.
///
/// A widened pool can reach into a neighbour. Pools are then pushed clear of
/// one another along `direction`, followed by the other top-level
/// containers, each `spacing` past what it cleared. Moved containers carry
/// their nodes and internal edges; edges between containers are re-routed.
pub fn apply_uniform_bpmn_pool_dimensions(
    model: &ContainerModel<'_>,
    containers: &mut [PositionedContainer],
    nodes: &mut [PositionedNode],
    edges: &mut [RoutedEdge],
    direction: Direction,
    spacing: f32,
) {
    let (pools, others): (Vec<usize>, Vec<usize>) =
        (0..containers.len()).partition(|&i| is_pool(&containers[i]));
    if pools.len() < 2 {
        return;
    }

    let width = pools
        .iter()
        .map(|&i| containers[i].bounds().width())
        .fold(0.0f32, f32::max);
    for &i in &pools {
        let bounds = containers[i].bounds();
        containers[i].set_bounds(bounds.with_width(width));
    }
    debug!(pools_count = pools.len(), width = width; "Uniform pool width applied");

    let mut moves: Vec<(ContainerIdx, Point)> = Vec::new();
    let mut settled = Vec::with_capacity(containers.len());
    push_clear(model, containers, &mut settled, pools, direction, spacing, &mut moves);
    push_clear(model, containers, &mut settled, others, direction, spacing, &mut moves);
    if !moves.is_empty() {
        move_contents(model, &moves, nodes, edges);
        debug!(moved_containers = moves.len(); "Pools made room");
        recalculate_cross_container_edges(model, nodes, edges, direction);
    }
}

fn is_pool(container: &PositionedContainer) -> bool {
    matches!(container.shape(), Some(ContainerShape::Pool))
}

/// Makes the lanes directly inside each pool span the pool's full width.
///
/// Heights and vertical positions are kept.
pub fn stretch_bpmn_lanes_in_pools(containers: &mut [PositionedContainer]) {
    for container in containers.iter_mut() {
        if is_pool(container) {
            let pool = container.bounds();
            for lane in container.children_mut().iter_mut() {
                if matches!(lane.shape(), Some(ContainerShape::Lane)) {
                    let bounds = lane.bounds();
                    lane.set_bounds(Bounds::new(pool.x(), bounds.y(), pool.width(), bounds.height()));
                }
            }
        }
        stretch_bpmn_lanes_in_pools(container.children_mut());
    }
}

/// Translates everything so the smallest coordinate of any node, container,
/// or waypoint is zero on both axes.
pub fn shift_to_origin(
    containers: &mut [PositionedContainer],
    nodes: &mut [PositionedNode],
    edges: &mut [RoutedEdge],
) {
    let extent = drawing_extent(containers, nodes, edges);
    let Some(extent) = extent else {
        return;
    };
    let offset = Point::new(-extent.x(), -extent.y());
    if offset.is_zero() {
        return;
    }

    for container in containers.iter_mut() {
        container.translate(offset);
    }
    for node in nodes.iter_mut() {
        node.set_bounds(node.bounds().translate(offset));
    }
    for edge in edges.iter_mut() {
        let moved = edge.points().iter().map(|point| point.add_point(offset)).collect();
        edge.set_points(moved);
    }
}

/// Smallest box holding every node, container, and waypoint.
pub(crate) fn drawing_extent(
    containers: &[PositionedContainer],
    nodes: &[PositionedNode],
    edges: &[RoutedEdge],
) -> Option<Bounds> {
    let mut extent: Option<Bounds> = None;
    let mut include = |bounds: Bounds| {
        extent = Some(extent.map_or(bounds, |extent| extent.merge(&bounds)));
    };

    crate::layout::positioned::for_each_container(containers, &mut |container| {
        include(container.bounds());
    });
    for node in nodes {
        include(node.bounds());
    }
    for point in edges.iter().flat_map(|edge| edge.points()) {
        include(Bounds::new_from_top_left(*point, Default::default()));
    }
    extent
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use trellis_core::model::{Container, ContainerLayout, ContainerShape, ContainerStyle, Node};

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (-500.0f32..500.0, -500.0f32..500.0, 1.0f32..200.0, 1.0f32..200.0)
            .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
    }

    fn bounds_close(a: Bounds, b: Bounds) -> bool {
        approx_eq!(f32, a.x(), b.x(), epsilon = 0.01)
            && approx_eq!(f32, a.y(), b.y(), epsilon = 0.01)
            && approx_eq!(f32, a.width(), b.width(), epsilon = 0.01)
            && approx_eq!(f32, a.height(), b.height(), epsilon = 0.01)
    }

    fn contains_loosely(outer: Bounds, inner: Bounds) -> bool {
        outer.add_padding(trellis_core::geometry::Insets::uniform(0.01)).contains(&inner)
    }

    /// Two horizontal lanes in a pool, a nested group in the first lane,
    /// and a second pool.
    fn fixture() -> Vec<Container> {
        let lane_layout = ContainerLayout::default().with_orientation(Orientation::Horizontal);
        let lane_style = ContainerStyle::default().with_shape(ContainerShape::Lane);
        let pool_style = ContainerStyle::default().with_shape(ContainerShape::Pool);
        vec![
            Container::new("pool")
                .with_style(pool_style.clone())
                .with_child(
                    Container::new("lane1")
                        .with_layout(lane_layout.clone())
                        .with_style(lane_style.clone())
                        .with_nodes(["a"])
                        .with_child(Container::new("group").with_nodes(["b"])),
                )
                .with_child(
                    Container::new("lane2")
                        .with_layout(lane_layout)
                        .with_style(lane_style)
                        .with_nodes(["c"]),
                ),
            Container::new("pool2").with_style(pool_style).with_nodes(["d"]),
        ]
    }

    fn positioned(model_containers: &[Container], boxes: &[Bounds]) -> Vec<PositionedContainer> {
        let pool = &model_containers[0];
        let lane1 = &pool.children()[0];
        let mut lane1_box = PositionedContainer::new(lane1, boxes[1]);
        lane1_box
            .children_mut()
            .push(PositionedContainer::new(&lane1.children()[0], boxes[2]));
        let mut pool_box = PositionedContainer::new(pool, boxes[0]);
        pool_box.children_mut().push(lane1_box);
        pool_box
            .children_mut()
            .push(PositionedContainer::new(&pool.children()[1], boxes[3]));
        vec![pool_box, PositionedContainer::new(&model_containers[1], boxes[4])]
    }

    fn check_containment(model: &ContainerModel<'_>, containers: &[PositionedContainer], nodes: &[PositionedNode]) {
        fn visit(model: &ContainerModel<'_>, container: &PositionedContainer, nodes: &[PositionedNode]) {
            for child in container.children() {
                assert!(contains_loosely(container.bounds(), child.bounds()));
                visit(model, child, nodes);
            }
            for node in nodes {
                if model.container_of_node(node.id()) == model.index_of(container.id()) {
                    assert!(contains_loosely(container.bounds(), node.bounds()));
                }
            }
        }
        for container in containers {
            visit(model, container, nodes);
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_contains_and_is_idempotent(
            boxes in prop::collection::vec(bounds_strategy(), 5),
            node_boxes in prop::collection::vec(bounds_strategy(), 4),
        ) {
            let model_containers = fixture();
            let model = ContainerModel::build(&model_containers);
            let mut containers = positioned(&model_containers, &boxes);
            let mut nodes: Vec<PositionedNode> = ["a", "b", "c", "d"]
                .iter()
                .zip(&node_boxes)
                .map(|(id, &bounds)| PositionedNode::new(&Node::new(*id), bounds))
                .collect();
            let mut edges = vec![
                RoutedEdge::between(Id::new("a"), Id::new("c"), vec![Point::default(), Point::new(1.0, 1.0)]),
                RoutedEdge::between(Id::new("a"), Id::new("b"), vec![Point::default(), Point::new(1.0, 1.0)]),
            ];

            normalize(&model, &mut containers, &mut nodes, &mut edges, Direction::Down, 10.0);
            check_containment(&model, &containers, &nodes);

            let first_containers = containers.clone();
            let first_nodes = nodes.clone();
            normalize(&model, &mut containers, &mut nodes, &mut edges, Direction::Down, 10.0);

            let mut before = Vec::new();
            crate::layout::positioned::for_each_container(&first_containers, &mut |c| before.push(c.bounds()));
            let mut after = Vec::new();
            crate::layout::positioned::for_each_container(&containers, &mut |c| after.push(c.bounds()));
            for (a, b) in before.iter().zip(&after) {
                prop_assert!(bounds_close(*a, *b), "{a:?} != {b:?}");
            }
            for (a, b) in first_nodes.iter().zip(&nodes) {
                prop_assert!(bounds_close(a.bounds(), b.bounds()));
            }

            // Both pools share a width, and lanes span the pool
            prop_assert!(approx_eq!(f32, containers[0].bounds().width(), containers[1].bounds().width(), epsilon = 0.01));
            for lane in containers[0].children() {
                prop_assert!(approx_eq!(f32, lane.bounds().width(), containers[0].bounds().width(), epsilon = 0.01));
            }
        }
    }
}
