//! Integration tests for the layout pipeline
//!
//! These tests drive whole diagrams through [`LayoutBuilder`] and check the
//! invariants a renderer relies on.

use trellis::{
    LayoutBuilder, Severity, TrellisError,
    config::AppConfig,
    geometry::{Bounds, Insets},
    identifier::Id,
    layout::{DiagramLayout, LayoutSolver, SolverGraph, SolverLayout},
    model::{
        Container, ContainerLayout, ContainerShape, ContainerStyle, Diagram, DiagramKind, Edge,
        Node, Orientation,
    },
    options::LayoutOptions,
};

const EPS: f32 = 1e-3;

fn run(diagram: &Diagram) -> DiagramLayout {
    LayoutBuilder::new(AppConfig::default())
        .layout(diagram, &LayoutOptions::new())
        .expect("Failed to lay out diagram")
}

fn container_bounds(layout: &DiagramLayout, id: &str) -> Bounds {
    layout
        .container(Id::new(id))
        .unwrap_or_else(|| panic!("container {id} missing"))
        .bounds()
}

fn node_bounds(layout: &DiagramLayout, id: &str) -> Bounds {
    layout
        .node(Id::new(id))
        .unwrap_or_else(|| panic!("node {id} missing"))
        .bounds()
}

fn lane(id: &str, orientation: Orientation) -> Container {
    Container::new(id).with_layout(ContainerLayout::default().with_orientation(orientation))
}

fn shaped(id: &str, shape: ContainerShape) -> Container {
    Container::new(id).with_style(ContainerStyle::default().with_shape(shape))
}

fn run_flowing(diagram: &Diagram, direction: &str) -> DiagramLayout {
    LayoutBuilder::new(AppConfig::default())
        .layout(diagram, &LayoutOptions::new().with_direction(direction))
        .unwrap_or_else(|err| panic!("Failed to lay out diagram flowing {direction}: {err}"))
}

/// Overlap with a positive area; shared edges do not count.
fn overlaps_strictly(a: Bounds, b: Bounds) -> bool {
    a.x() < b.max_x() - EPS && b.x() < a.max_x() - EPS && a.y() < b.max_y() - EPS && b.y() < a.max_y() - EPS
}

fn holds(outer: Bounds, inner: Bounds) -> bool {
    outer.add_padding(Insets::uniform(EPS)).contains(&inner)
}

/// Every set of sibling containers is pairwise disjoint and every child
/// sits inside its parent.
fn assert_siblings_apart(containers: &[trellis::layout::PositionedContainer], context: &str) {
    for (i, a) in containers.iter().enumerate() {
        for b in &containers[i + 1..] {
            assert!(
                !overlaps_strictly(a.bounds(), b.bounds()),
                "{context}: siblings {} {:?} and {} {:?} overlap",
                a.id(),
                a.bounds(),
                b.id(),
                b.bounds()
            );
        }
        for child in a.children() {
            assert!(holds(a.bounds(), child.bounds()), "{context}: {} escapes {}", child.id(), a.id());
        }
        assert_siblings_apart(a.children(), context);
    }
}

fn assert_nodes_held(layout: &DiagramLayout, container: &str, nodes: &[&str], context: &str) {
    let bounds = container_bounds(layout, container);
    for &id in nodes {
        assert!(holds(bounds, node_bounds(layout, id)), "{context}: {id} escapes {container}");
    }
}

const FLOWS: [&str; 4] = ["TB", "LR", "BT", "RL"];

#[test]
fn test_builder_api_exists() {
    let _builder = LayoutBuilder::default();
}

#[test]
fn test_simple_graph_starts_at_origin() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_edge(Edge::new("a", "b"))
        .with_edge(Edge::new("b", "c"));

    let layout = run(&diagram);

    assert_eq!(layout.nodes().len(), 3);
    assert_eq!(layout.edges().len(), 2);
    assert!(layout.diagnostics().is_empty());
    for node in layout.nodes() {
        assert!(node.bounds().x() >= -EPS, "node {} left of origin", node.id());
        assert!(node.bounds().y() >= -EPS, "node {} above origin", node.id());
        assert!(node.bounds().max_x() <= layout.size().width() + EPS);
        assert!(node.bounds().max_y() <= layout.size().height() + EPS);
    }
    for edge in layout.edges() {
        assert!(edge.points().len() >= 2);
    }
}

#[test]
fn test_nested_containers_hold_their_contents() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_node(Node::new("d"))
        .with_edge(Edge::new("a", "b"))
        .with_edge(Edge::new("b", "c"))
        .with_edge(Edge::new("c", "d"))
        .with_container(
            Container::new("outer")
                .with_nodes(["a"])
                .with_child(Container::new("inner").with_nodes(["b", "c"])),
        );

    let layout = run(&diagram);

    let outer = container_bounds(&layout, "outer");
    let inner = container_bounds(&layout, "inner");
    assert!(outer.contains(&inner));
    assert!(outer.contains(&node_bounds(&layout, "a")));
    assert!(inner.contains(&node_bounds(&layout, "b")));
    assert!(inner.contains(&node_bounds(&layout, "c")));
}

#[test]
fn test_horizontal_swimlanes_share_width_and_stack() {
    let diagram = Diagram::default()
        .with_node(Node::new("short"))
        .with_node(Node::new("x").with_size(60.0, 40.0))
        .with_node(Node::new("y").with_size(60.0, 40.0))
        .with_node(Node::new("z").with_size(60.0, 40.0))
        .with_edge(Edge::new("x", "y"))
        .with_edge(Edge::new("y", "z"))
        .with_edge(Edge::new("short", "x"))
        .with_container(lane("first", Orientation::Horizontal).with_nodes(["short"]))
        .with_container(lane("second", Orientation::Horizontal).with_nodes(["x", "y", "z"]));

    let layout = run(&diagram);

    let first = container_bounds(&layout, "first");
    let second = container_bounds(&layout, "second");
    assert!((first.width() - second.width()).abs() < EPS);
    assert!((first.x() - second.x()).abs() < EPS);

    let (upper, lower) = if first.y() <= second.y() {
        (first, second)
    } else {
        (second, first)
    };
    assert!(lower.y() >= upper.max_y() - EPS, "lanes overlap");

    assert!(first.contains(&node_bounds(&layout, "short")));
    for id in ["x", "y", "z"] {
        assert!(second.contains(&node_bounds(&layout, id)), "{id} left its lane");
    }
}

#[test]
fn test_vertical_swimlanes_share_height() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_edge(Edge::new("b", "c"))
        .with_container(lane("left", Orientation::Vertical).with_nodes(["a"]))
        .with_container(lane("right", Orientation::Vertical).with_nodes(["b", "c"]));

    let layout = run(&diagram);

    let left = container_bounds(&layout, "left");
    let right = container_bounds(&layout, "right");
    assert!((left.height() - right.height()).abs() < EPS);
    assert!((left.y() - right.y()).abs() < EPS);
}

#[test]
fn test_pools_share_width_and_lanes_span_pool() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_node(Node::new("d"))
        .with_node(Node::new("e"))
        .with_edge(Edge::new("b", "c"))
        .with_edge(Edge::new("c", "d"))
        .with_container(
            shaped("sales", ContainerShape::Pool)
                .with_child(shaped("intake", ContainerShape::Lane).with_nodes(["a"]))
                .with_child(shaped("fulfilment", ContainerShape::Lane).with_nodes(["b", "c", "d"])),
        )
        .with_container(shaped("billing", ContainerShape::Pool).with_nodes(["e"]));

    let layout = run(&diagram);

    let sales = container_bounds(&layout, "sales");
    let billing = container_bounds(&layout, "billing");
    assert!((sales.width() - billing.width()).abs() < EPS);

    for id in ["intake", "fulfilment"] {
        let lane = container_bounds(&layout, id);
        assert!((lane.x() - sales.x()).abs() < EPS, "{id} not aligned with pool");
        assert!((lane.width() - sales.width()).abs() < EPS, "{id} does not span pool");
    }
}

#[test]
fn test_vertical_lanes_and_ordinary_sibling_stay_apart() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_node(Node::new("d"))
        .with_edge(Edge::new("b", "c"))
        .with_container(lane("v1", Orientation::Vertical).with_nodes(["a"]))
        .with_container(lane("v2", Orientation::Vertical).with_nodes(["b", "c"]))
        .with_container(Container::new("o").with_nodes(["d"]));

    for flow in FLOWS {
        let layout = run_flowing(&diagram, flow);

        assert_siblings_apart(layout.containers(), flow);
        let (v1, v2) = (container_bounds(&layout, "v1"), container_bounds(&layout, "v2"));
        assert!((v1.height() - v2.height()).abs() < EPS, "{flow}: lanes differ in height");
        assert_nodes_held(&layout, "v1", &["a"], flow);
        assert_nodes_held(&layout, "v2", &["b", "c"], flow);
        assert_nodes_held(&layout, "o", &["d"], flow);
    }
}

#[test]
fn test_horizontal_lanes_and_ordinary_sibling_stay_apart() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b").with_size(60.0, 40.0))
        .with_node(Node::new("c").with_size(60.0, 40.0))
        .with_node(Node::new("d"))
        .with_node(Node::new("e"))
        .with_edge(Edge::new("b", "c"))
        .with_edge(Edge::new("a", "d"))
        .with_container(lane("h1", Orientation::Horizontal).with_nodes(["a"]))
        .with_container(lane("h2", Orientation::Horizontal).with_nodes(["b", "c"]))
        .with_container(Container::new("o").with_nodes(["d", "e"]));

    for flow in FLOWS {
        let layout = run_flowing(&diagram, flow);

        assert_siblings_apart(layout.containers(), flow);
        let (h1, h2) = (container_bounds(&layout, "h1"), container_bounds(&layout, "h2"));
        assert!((h1.width() - h2.width()).abs() < EPS, "{flow}: lanes differ in width");
        assert_nodes_held(&layout, "h2", &["b", "c"], flow);
        assert_nodes_held(&layout, "o", &["d", "e"], flow);
    }
}

#[test]
fn test_pools_stay_apart_in_every_flow() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_node(Node::new("wide").with_size(300.0, 40.0))
        .with_node(Node::new("loose"))
        .with_edge(Edge::new("b", "c"))
        .with_edge(Edge::new("c", "wide"))
        .with_container(
            shaped("p1", ContainerShape::Pool)
                .with_child(shaped("l1", ContainerShape::Lane).with_nodes(["a"]))
                .with_child(shaped("l2", ContainerShape::Lane).with_nodes(["b", "c"])),
        )
        .with_container(
            shaped("p2", ContainerShape::Pool)
                .with_child(shaped("l3", ContainerShape::Lane).with_nodes(["wide"])),
        )
        .with_container(Container::new("extra").with_nodes(["loose"]));

    for flow in FLOWS {
        let layout = run_flowing(&diagram, flow);

        assert_siblings_apart(layout.containers(), flow);
        let (p1, p2) = (container_bounds(&layout, "p1"), container_bounds(&layout, "p2"));
        assert!((p1.width() - p2.width()).abs() < EPS, "{flow}: pools differ in width");
        for (lane, pool) in [("l1", p1), ("l2", p1), ("l3", p2)] {
            let lane_bounds = container_bounds(&layout, lane);
            assert!((lane_bounds.width() - pool.width()).abs() < EPS, "{flow}: {lane} does not span its pool");
        }
        assert_nodes_held(&layout, "l1", &["a"], flow);
        assert_nodes_held(&layout, "l2", &["b", "c"], flow);
        assert_nodes_held(&layout, "l3", &["wide"], flow);
        assert_nodes_held(&layout, "extra", &["loose"], flow);
    }
}

#[test]
fn test_structural_problems_become_diagnostics() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_edge(Edge::new("a", "b"))
        .with_edge(Edge::new("a", "ghost"))
        .with_container(Container::new("group").with_nodes(["b", "phantom"]));

    let layout = run(&diagram);

    let messages: Vec<&str> = layout
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity() == Severity::Warning)
        .map(|diagnostic| diagnostic.message())
        .collect();
    assert!(messages.iter().any(|message| message.contains("ghost")));
    assert!(messages.iter().any(|message| message.contains("phantom")));
    assert_eq!(layout.nodes().len(), 2);
    assert_eq!(layout.edges().len(), 1);
}

#[test]
fn test_radial_container_edges_are_spokes() {
    let diagram = Diagram::default()
        .with_node(Node::new("hub"))
        .with_node(Node::new("s1"))
        .with_node(Node::new("s2"))
        .with_node(Node::new("s3"))
        .with_edge(Edge::new("hub", "s1"))
        .with_edge(Edge::new("hub", "s2"))
        .with_edge(Edge::new("hub", "s3"))
        .with_container(
            Container::new("wheel")
                .with_layout(ContainerLayout::default().with_algorithm("radial"))
                .with_nodes(["hub", "s1", "s2", "s3"]),
        );

    let layout = run(&diagram);

    for edge in layout.edges() {
        assert_eq!(edge.points().len(), 2, "edge {} -> {}", edge.from(), edge.to());
    }
}

#[test]
fn test_mindmap_levels_reach_output() {
    let diagram = Diagram::new(DiagramKind::Mindmap)
        .with_node(Node::new("topic"))
        .with_node(Node::new("idea"))
        .with_node(Node::new("detail"))
        .with_edge(Edge::new("topic", "idea"))
        .with_edge(Edge::new("idea", "detail"));

    let layout = run(&diagram);

    let level = |id: &str| layout.node(Id::new(id)).unwrap().data()["level"].clone();
    assert_eq!(level("topic"), 0);
    assert_eq!(level("idea"), 1);
    assert_eq!(level("detail"), 2);
    assert!(layout.node(Id::new("idea")).unwrap().style().fill().is_some());
}

#[test]
fn test_pedigree_generations_reach_output() {
    let diagram = Diagram::new(DiagramKind::Pedigree)
        .with_node(Node::new("father"))
        .with_node(Node::new("mother"))
        .with_node(Node::new("child"))
        .with_edge(Edge::new("father", "mother"))
        .with_edge(Edge::new("mother", "father"))
        .with_edge(Edge::new("mother", "child"))
        .with_edge(Edge::new("father", "child"));

    let layout = run(&diagram);

    let generation = |id: &str| layout.node(Id::new(id)).unwrap().data()["generation"].clone();
    assert_eq!(generation("father"), 0);
    assert_eq!(generation("mother"), 0);
    assert_eq!(generation("child"), 1);
}

struct FailingSolver;

impl LayoutSolver for FailingSolver {
    fn solve(&self, _graph: &SolverGraph) -> Result<SolverLayout, TrellisError> {
        Err(TrellisError::Layout("no layout today".to_string()))
    }
}

#[test]
fn test_solver_failure_is_returned() {
    let diagram = Diagram::default().with_node(Node::new("a"));
    let builder = LayoutBuilder::default().with_solver(FailingSolver);

    let err = builder.layout(&diagram, &LayoutOptions::new()).unwrap_err();
    assert!(matches!(err, TrellisError::Layout(_)));
}

#[test]
fn test_force_layout_is_deterministic() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_node(Node::new("c"))
        .with_edge(Edge::new("a", "b"))
        .with_edge(Edge::new("a", "c"))
        .with_container(
            Container::new("cloud")
                .with_layout(ContainerLayout::default().with_algorithm("force"))
                .with_nodes(["b", "c"]),
        );
    let options = LayoutOptions::new().with_algorithm("force");
    let builder = LayoutBuilder::default();

    let first = builder.layout(&diagram, &options).unwrap();
    let second = builder.layout(&diagram, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_layout_serializes_for_renderers() {
    let diagram = Diagram::default()
        .with_node(Node::new("a"))
        .with_node(Node::new("b"))
        .with_edge(Edge::new("a", "b"));

    let layout = run(&diagram);
    let value = serde_json::to_value(&layout).expect("Failed to serialize layout");

    assert_eq!(value["nodes"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["edges"].as_array().map(Vec::len), Some(1));
    assert!(value["size"].is_object());
}
