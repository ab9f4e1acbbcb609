//! Edge routing and anchor snapping.
//!
//! Routes come out of the solver as port-to-port segments. This module
//! rebuilds them where the post-processing moved things around: orthogonal
//! paths between containers, endpoints snapped onto shape anchors, and
//! straight spokes inside radial containers. Nothing here fails; when an
//! anchor or a node is missing, the route degrades to a straight or
//! unmodified line.

use std::collections::HashMap;

use log::{debug, trace};

use trellis_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::Orientation,
};

use crate::{
    layout::positioned::{PositionedNode, RoutedEdge},
    options::{Algorithm, Direction},
    shape::Anchor,
    structure::ContainerModel,
};

/// Four-point orthogonal path from `start` to `end`.
///
/// Vertical flows bend at the vertical midpoint, horizontal flows at the
/// horizontal midpoint.
///
/// # Examples
///
/// ```
/// # use trellis::{options::Direction, routing::orthogonal_route};
/// # use trellis_core::geometry::Point;
/// let route = orthogonal_route(Point::new(10.0, 10.0), Point::new(50.0, 90.0), Direction::Down);
/// assert_eq!(route[1], Point::new(10.0, 50.0));
/// assert_eq!(route[2], Point::new(50.0, 50.0));
/// ```
pub fn orthogonal_route(start: Point, end: Point, direction: Direction) -> Vec<Point> {
    if direction.is_vertical() {
        let mid_y = (start.y() + end.y()) / 2.0;
        vec![
            start,
            Point::new(start.x(), mid_y),
            Point::new(end.x(), mid_y),
            end,
        ]
    } else {
        let mid_x = (start.x() + end.x()) / 2.0;
        vec![
            start,
            Point::new(mid_x, start.y()),
            Point::new(mid_x, end.y()),
            end,
        ]
    }
}

/// The anchor of a shape placed at `owner` closest to `point`.
///
/// Ties go to the anchor listed first.
pub fn nearest_anchor<'a>(point: Point, anchors: &'a [Anchor], owner: Bounds) -> Option<&'a Anchor> {
    anchors
        .iter()
        .map(|anchor| (anchor, owner.origin().add_point(anchor.offset()).distance(point)))
        .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
        .map(|(anchor, _)| anchor)
}

/// Flow axis implied by an anchor name: `left`/`right` leave horizontally,
/// `top`/`bottom` vertically. Other names imply nothing.
pub fn anchor_orientation(name: &str) -> Option<Orientation> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("left") || name.eq_ignore_ascii_case("right") {
        Some(Orientation::Horizontal)
    } else if name.eq_ignore_ascii_case("top") || name.eq_ignore_ascii_case("bottom") {
        Some(Orientation::Vertical)
    } else {
        None
    }
}

/// Moves the endpoints of `edge` onto anchors.
///
/// Each endpoint becomes its anchor's absolute position, or stays at the raw
/// position when no anchor is given. A route without interior bends is
/// regenerated orthogonally along the axis implied by the source anchor (or
/// the target anchor); a route with bends keeps them.
pub fn snap_edge_to_anchors(
    edge: &mut RoutedEdge,
    raw_source: Point,
    raw_target: Point,
    source_anchor: Option<&Anchor>,
    target_anchor: Option<&Anchor>,
    source_box: Bounds,
    target_box: Bounds,
) {
    let start = source_anchor.map_or(raw_source, |anchor| {
        source_box.origin().add_point(anchor.offset())
    });
    let end = target_anchor.map_or(raw_target, |anchor| {
        target_box.origin().add_point(anchor.offset())
    });

    if edge.points().len() <= 2 {
        let orientation = source_anchor
            .and_then(|anchor| anchor_orientation(anchor.name()))
            .or_else(|| target_anchor.and_then(|anchor| anchor_orientation(anchor.name())));
        let points = match orientation {
            Some(Orientation::Horizontal) => orthogonal_route(start, end, Direction::Right),
            Some(Orientation::Vertical) => orthogonal_route(start, end, Direction::Down),
            None => vec![start, end],
        };
        edge.set_points(points);
    } else {
        let mut points = edge.points().to_vec();
        let last = points.len() - 1;
        points[0] = start;
        points[last] = end;
        edge.set_points(points);
    }
}

/// Snaps every edge onto the anchors of its endpoint nodes.
///
/// On each side the anchor closest to the neighbouring waypoint wins, so an
/// edge leaves its node on the side facing where it heads. Edges whose nodes
/// are unknown or carry no anchors are left alone on that side.
pub fn snap_all_edges(
    nodes: &[PositionedNode],
    anchors: &HashMap<Id, Vec<Anchor>>,
    edges: &mut [RoutedEdge],
) {
    let boxes: HashMap<Id, Bounds> = nodes.iter().map(|node| (node.id(), node.bounds())).collect();
    let mut snapped = 0usize;

    for edge in edges.iter_mut() {
        let (Some(&source_box), Some(&target_box)) = (boxes.get(&edge.from()), boxes.get(&edge.to()))
        else {
            continue;
        };
        let points = edge.points();
        let (raw_source, raw_target, source_heading, target_heading) = match points {
            [] | [_] => (
                source_box.center(),
                target_box.center(),
                target_box.center(),
                source_box.center(),
            ),
            [first, .., last] => (*first, *last, points[1], points[points.len() - 2]),
        };

        let pick = |id: Id, heading: Point, owner: Bounds| {
            anchors
                .get(&id)
                .and_then(|list| nearest_anchor(heading, list, owner))
        };
        let source_anchor = pick(edge.from(), source_heading, source_box);
        let target_anchor = pick(edge.to(), target_heading, target_box);
        if source_anchor.is_none() && target_anchor.is_none() {
            continue;
        }

        snap_edge_to_anchors(
            edge,
            raw_source,
            raw_target,
            source_anchor,
            target_anchor,
            source_box,
            target_box,
        );
        snapped += 1;
    }

    trace!(edges_count = snapped; "Snapped edges to anchors");
}

/// Re-routes edges whose endpoints live in different containers.
///
/// Such edges are rebuilt orthogonally from the current centers of their
/// endpoints, so they follow containers that were moved after solving.
pub fn recalculate_cross_container_edges(
    model: &ContainerModel<'_>,
    nodes: &[PositionedNode],
    edges: &mut [RoutedEdge],
    direction: Direction,
) {
    let centers: HashMap<Id, Point> = nodes
        .iter()
        .map(|node| (node.id(), node.bounds().center()))
        .collect();
    let mut rerouted = 0usize;

    for edge in edges.iter_mut() {
        if model.container_of_node(edge.from()) == model.container_of_node(edge.to()) {
            continue;
        }
        let (Some(&start), Some(&end)) = (centers.get(&edge.from()), centers.get(&edge.to())) else {
            continue;
        };
        edge.set_points(orthogonal_route(start, end, direction));
        rerouted += 1;
    }

    debug!(edges_count = rerouted; "Recalculated cross-container edges");
}

/// Collapses routes inside radial containers to straight spokes.
///
/// An edge whose endpoints both sit (at any depth) inside one radial
/// container keeps only its first and last point. Without radial containers
/// this does nothing.
pub fn simplify_radial_edges(model: &ContainerModel<'_>, edges: &mut [RoutedEdge]) {
    let radial: Vec<_> = model
        .indices()
        .filter(|&idx| {
            model
                .container(idx)
                .algorithm_token()
                .is_some_and(|token| Algorithm::from_token(token) == Algorithm::Radial)
        })
        .collect();
    if radial.is_empty() {
        return;
    }

    for edge in edges.iter_mut() {
        if edge.points().len() <= 2 {
            continue;
        }
        let inside = radial.iter().any(|&idx| {
            model.contains_transitively(idx, edge.from()) && model.contains_transitively(idx, edge.to())
        });
        if inside {
            let points = edge.points();
            let collapsed = vec![points[0], points[points.len() - 1]];
            edge.set_points(collapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{
        geometry::Size,
        model::{Container, ContainerLayout, Node},
    };

    use super::*;
    use crate::shape::{BasicShapes, ShapeProvider};

    fn positioned(id: &str, bounds: Bounds) -> PositionedNode {
        PositionedNode::new(&Node::new(id), bounds)
    }

    fn cardinal(size: Size) -> Vec<Anchor> {
        BasicShapes::new().anchors(&Node::new("any"), size)
    }

    #[test]
    fn test_orthogonal_route_vertical() {
        let route = orthogonal_route(Point::new(10.0, 10.0), Point::new(50.0, 90.0), Direction::Down);
        assert_eq!(
            route,
            vec![
                Point::new(10.0, 10.0),
                Point::new(10.0, 50.0),
                Point::new(50.0, 50.0),
                Point::new(50.0, 90.0),
            ]
        );
    }

    #[test]
    fn test_orthogonal_route_horizontal() {
        let route = orthogonal_route(Point::new(10.0, 10.0), Point::new(90.0, 50.0), Direction::Right);
        assert_eq!(
            route,
            vec![
                Point::new(10.0, 10.0),
                Point::new(50.0, 10.0),
                Point::new(50.0, 50.0),
                Point::new(90.0, 50.0),
            ]
        );
        assert_eq!(
            orthogonal_route(Point::new(0.0, 0.0), Point::new(10.0, 10.0), Direction::Up)[1],
            Point::new(0.0, 5.0)
        );
    }

    #[test]
    fn test_nearest_anchor() {
        let anchors = cardinal(Size::new(100.0, 40.0));
        let owner = Bounds::new(10.0, 10.0, 100.0, 40.0);

        let right = nearest_anchor(Point::new(200.0, 30.0), &anchors, owner).unwrap();
        assert_eq!(right.name(), "right");
        let bottom = nearest_anchor(Point::new(60.0, 80.0), &anchors, owner).unwrap();
        assert_eq!(bottom.name(), "bottom");
        assert!(nearest_anchor(Point::default(), &[], owner).is_none());
    }

    #[test]
    fn test_anchor_orientation() {
        assert_eq!(anchor_orientation("left"), Some(Orientation::Horizontal));
        assert_eq!(anchor_orientation("Right"), Some(Orientation::Horizontal));
        assert_eq!(anchor_orientation("top"), Some(Orientation::Vertical));
        assert_eq!(anchor_orientation("bottom"), Some(Orientation::Vertical));
        assert_eq!(anchor_orientation("center"), None);
    }

    #[test]
    fn test_snap_regenerates_two_point_edges() {
        let source_box = Bounds::new(0.0, 0.0, 20.0, 20.0);
        let target_box = Bounds::new(100.0, 100.0, 20.0, 20.0);
        let anchors = cardinal(Size::new(20.0, 20.0));
        let mut edge = RoutedEdge::between(
            Id::new("a"),
            Id::new("b"),
            vec![source_box.center(), target_box.center()],
        );

        snap_edge_to_anchors(
            &mut edge,
            source_box.center(),
            target_box.center(),
            Some(&anchors[2]),
            Some(&anchors[0]),
            source_box,
            target_box,
        );

        assert_eq!(
            edge.points(),
            &[
                Point::new(10.0, 20.0),
                Point::new(10.0, 60.0),
                Point::new(110.0, 60.0),
                Point::new(110.0, 100.0),
            ]
        );
    }

    #[test]
    fn test_snap_keeps_interior_bends() {
        let source_box = Bounds::new(0.0, 0.0, 20.0, 20.0);
        let target_box = Bounds::new(100.0, 0.0, 20.0, 20.0);
        let anchors = cardinal(Size::new(20.0, 20.0));
        let bends = vec![
            Point::new(10.0, 10.0),
            Point::new(10.0, -30.0),
            Point::new(110.0, -30.0),
            Point::new(110.0, 10.0),
        ];
        let mut edge = RoutedEdge::between(Id::new("a"), Id::new("b"), bends.clone());

        snap_edge_to_anchors(
            &mut edge,
            bends[0],
            bends[3],
            Some(&anchors[0]),
            None,
            source_box,
            target_box,
        );

        assert_eq!(edge.points()[0], Point::new(10.0, 0.0));
        assert_eq!(&edge.points()[1..3], &bends[1..3]);
        assert_eq!(edge.points()[3], bends[3]);
    }

    #[test]
    fn test_snap_without_anchors_is_straight() {
        let mut edge = RoutedEdge::between(Id::new("a"), Id::new("b"), vec![]);
        snap_edge_to_anchors(
            &mut edge,
            Point::new(1.0, 1.0),
            Point::new(5.0, 5.0),
            None,
            None,
            Bounds::default(),
            Bounds::default(),
        );
        assert_eq!(edge.points(), &[Point::new(1.0, 1.0), Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_snap_all_edges_faces_the_other_node() {
        let a = Bounds::new(0.0, 0.0, 40.0, 20.0);
        let b = Bounds::new(0.0, 100.0, 40.0, 20.0);
        let nodes = vec![positioned("a", a), positioned("b", b)];
        let anchors: HashMap<Id, Vec<Anchor>> = [
            (Id::new("a"), cardinal(a.to_size())),
            (Id::new("b"), cardinal(b.to_size())),
        ]
        .into_iter()
        .collect();
        let mut edges = vec![RoutedEdge::between(
            Id::new("a"),
            Id::new("b"),
            vec![a.center(), b.center()],
        )];

        snap_all_edges(&nodes, &anchors, &mut edges);

        let points = edges[0].points();
        assert_eq!(points[0], Point::new(20.0, 20.0));
        assert_eq!(points[points.len() - 1], Point::new(20.0, 100.0));
    }

    #[test]
    fn test_cross_container_edges_rerouted() {
        let containers = vec![
            Container::new("left").with_nodes(["a"]),
            Container::new("right").with_nodes(["b", "c"]),
        ];
        let model = ContainerModel::build(&containers);
        let nodes = vec![
            positioned("a", Bounds::new(0.0, 0.0, 20.0, 20.0)),
            positioned("b", Bounds::new(100.0, 100.0, 20.0, 20.0)),
            positioned("c", Bounds::new(100.0, 200.0, 20.0, 20.0)),
        ];
        let stale = vec![Point::new(-1.0, -1.0), Point::new(-2.0, -2.0)];
        let mut edges = vec![
            RoutedEdge::between(Id::new("a"), Id::new("b"), stale.clone()),
            RoutedEdge::between(Id::new("b"), Id::new("c"), stale.clone()),
        ];

        recalculate_cross_container_edges(&model, &nodes, &mut edges, Direction::Down);

        assert_eq!(
            edges[0].points(),
            orthogonal_route(Point::new(10.0, 10.0), Point::new(110.0, 110.0), Direction::Down)
        );
        assert_eq!(edges[1].points(), stale.as_slice());
    }

    #[test]
    fn test_radial_simplification_only_inside_radial_containers() {
        let containers = vec![
            Container::new("spokes")
                .with_layout(ContainerLayout::default().with_algorithm("radial"))
                .with_nodes(["hub"])
                .with_child(Container::new("rim").with_nodes(["r1"])),
            Container::new("plain").with_nodes(["p1", "p2"]),
        ];
        let model = ContainerModel::build(&containers);
        let bent = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
        ];
        let mut edges = vec![
            RoutedEdge::between(Id::new("hub"), Id::new("r1"), bent.clone()),
            RoutedEdge::between(Id::new("p1"), Id::new("p2"), bent.clone()),
            RoutedEdge::between(Id::new("hub"), Id::new("p1"), bent.clone()),
        ];

        simplify_radial_edges(&model, &mut edges);

        assert_eq!(edges[0].points(), &[Point::new(0.0, 0.0), Point::new(5.0, 10.0)]);
        assert_eq!(edges[1].points(), bent.as_slice());
        assert_eq!(edges[2].points(), bent.as_slice());
    }

    #[test]
    fn test_radial_simplification_noop_without_radial_containers() {
        let containers = vec![Container::new("plain").with_nodes(["a", "b"])];
        let model = ContainerModel::build(&containers);
        let bent = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let mut edges = vec![RoutedEdge::between(Id::new("a"), Id::new("b"), bent.clone())];

        simplify_radial_edges(&model, &mut edges);
        assert_eq!(edges[0].points(), bent.as_slice());
    }
}
