//! Mindmap leveling and default styling.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::Direction;

use trellis_core::{
    color::Color,
    identifier::Id,
    model::{ArrowKind, Diagram, NodeShape},
};

use super::DiagramGraph;
use crate::{config::MindmapConfig, error::TrellisError};

/// Depth of every node reachable from the mindmap root.
#[derive(Debug, Clone, PartialEq)]
pub struct MindmapLevels {
    root: Id,
    levels: IndexMap<Id, usize>,
    parents: HashMap<Id, Id>,
}

impl MindmapLevels {
    pub fn root(&self) -> Id {
        self.root
    }

    pub fn level(&self, id: Id) -> Option<usize> {
        self.levels.get(&id).copied()
    }

    /// The node `id` was discovered from; `None` for the root.
    pub fn parent(&self, id: Id) -> Option<Id> {
        self.parents.get(&id).copied()
    }

    /// Leveled nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, usize)> + '_ {
        self.levels.iter().map(|(&id, &level)| (id, level))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Picks the root and levels every node reachable from it.
///
/// The root is, in order of preference:
/// 1. a node without incoming edges carrying the root shape,
/// 2. the only node without incoming edges,
/// 3. any node carrying the root shape,
/// 4. the first declared node.
///
/// Levels come from a breadth-first walk that follows edges in both
/// directions. Nodes not connected to the root get no level. Returns `None`
/// for a diagram without nodes.
pub fn calculate_mindmap_levels(diagram: &Diagram) -> Option<MindmapLevels> {
    let graph = DiagramGraph::new(diagram);
    let root = find_root(diagram, &graph)?;

    let mut levels = IndexMap::new();
    let mut parents = HashMap::new();
    levels.insert(root, 0usize);
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        let level = levels[&current];
        let outgoing = graph.neighbors(current, Direction::Outgoing);
        let incoming = graph.neighbors(current, Direction::Incoming);
        for next in outgoing.into_iter().chain(incoming) {
            if levels.contains_key(&next) {
                continue;
            }
            levels.insert(next, level + 1);
            parents.insert(next, current);
            queue.push_back(next);
        }
    }

    debug!(root:% = root, reached = levels.len(); "Mindmap levels assigned");
    Some(MindmapLevels {
        root,
        levels,
        parents,
    })
}

fn find_root(diagram: &Diagram, graph: &DiagramGraph) -> Option<Id> {
    let marked = |id: Id| {
        diagram
            .node(id)
            .is_some_and(|node| matches!(node.shape(), NodeShape::MindmapRoot))
    };
    let sources: Vec<Id> = graph.ids().filter(|&id| graph.indegree(id) == 0).collect();

    if let Some(&root) = sources.iter().find(|&&id| marked(id)) {
        return Some(root);
    }
    if let [only] = sources.as_slice() {
        return Some(*only);
    }
    if let Some(root) = graph.ids().find(|&id| marked(id)) {
        trace!(root:% = root; "No single source node, using the marked root");
        return Some(root);
    }
    graph.first()
}

/// Stamps levels and default colors onto a mindmap.
///
/// Every leveled node gets a `level` data entry. Fills cascade down the
/// tree: the root gets the root color, each first-level branch the next
/// palette color, and deeper nodes their parent's color. An explicit fill is
/// never replaced and is what its descendants inherit.
///
/// Edges are styled by their source's level: the arrowhead goes from filled
/// to open to none, and the stroke thins out with depth. The stroke color
/// follows the deeper endpoint. Only unset style fields are filled in.
///
/// # Errors
///
/// Returns [`TrellisError::Config`] when a configured color cannot be parsed.
pub fn apply_mindmap_level_styling(
    diagram: &mut Diagram,
    levels: &MindmapLevels,
    config: &MindmapConfig,
) -> Result<(), TrellisError> {
    let palette = config.palette().map_err(TrellisError::Config)?;
    let root_color = config.root_color().map_err(TrellisError::Config)?;

    let explicit: HashMap<Id, Color> = diagram
        .nodes()
        .iter()
        .filter_map(|node| node.style().fill().map(|fill| (node.id(), fill)))
        .collect();

    let mut colors: HashMap<Id, Color> = HashMap::with_capacity(levels.len());
    let mut branch = 0usize;
    for (id, level) in levels.iter() {
        let inherited = match level {
            0 => root_color,
            1 => {
                let color = palette
                    .get(branch % palette.len().max(1))
                    .copied()
                    .unwrap_or(root_color);
                branch += 1;
                color
            }
            _ => levels
                .parent(id)
                .and_then(|parent| colors.get(&parent).copied())
                .unwrap_or(root_color),
        };
        colors.insert(id, explicit.get(&id).copied().unwrap_or(inherited));
    }

    for node in diagram.nodes_mut() {
        let id = node.id();
        let Some(level) = levels.level(id) else {
            continue;
        };
        node.set_data("level", level);
        if node.style().fill().is_none()
            && let Some(&color) = colors.get(&id)
        {
            node.style_mut().set_fill(color);
        }
    }

    for edge in diagram.edges_mut() {
        let Some(level) = levels.level(edge.from()) else {
            continue;
        };
        let deeper = match levels.level(edge.to()) {
            Some(to_level) if to_level > level => edge.to(),
            _ => edge.from(),
        };

        let style = edge.style_mut();
        if style.arrow().is_none() {
            style.set_arrow(match level {
                0 => ArrowKind::Filled,
                1 => ArrowKind::Open,
                _ => ArrowKind::None,
            });
        }
        if style.stroke_width().is_none() {
            style.set_stroke_width(config.stroke_width_for_level(level));
        }
        if style.stroke().is_none()
            && let Some(&color) = colors.get(&deeper)
        {
            style.set_stroke(color);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use trellis_core::model::{Edge, Node, NodeStyle};

    use super::*;

    fn mindmap(nodes: &[&str], edges: &[(&str, &str)]) -> Diagram {
        let mut diagram = Diagram::default();
        for &id in nodes {
            diagram = diagram.with_node(Node::new(id));
        }
        for &(from, to) in edges {
            diagram = diagram.with_edge(Edge::new(from, to));
        }
        diagram
    }

    #[test]
    fn test_root_with_two_children() {
        let diagram = mindmap(&["root", "a", "b"], &[("root", "a"), ("root", "b")]);
        let levels = calculate_mindmap_levels(&diagram).unwrap();

        assert_eq!(levels.root(), Id::new("root"));
        assert_eq!(levels.level(Id::new("root")), Some(0));
        assert_eq!(levels.level(Id::new("a")), Some(1));
        assert_eq!(levels.level(Id::new("b")), Some(1));
    }

    #[test]
    fn test_cycle_terminates() {
        let diagram = mindmap(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let levels = calculate_mindmap_levels(&diagram).unwrap();

        assert_eq!(levels.len(), 3);
        let roots = levels.iter().filter(|&(_, level)| level == 0).count();
        assert_eq!(roots, 1);
        assert_eq!(levels.root(), Id::new("a"));
    }

    #[test]
    fn test_marked_source_wins() {
        let diagram = Diagram::default()
            .with_node(Node::new("first"))
            .with_node(Node::new("center").with_shape(NodeShape::MindmapRoot))
            .with_node(Node::new("leaf"))
            .with_edge(Edge::new("center", "leaf"));

        assert_eq!(calculate_mindmap_levels(&diagram).unwrap().root(), Id::new("center"));
    }

    #[test]
    fn test_marked_node_in_cycle() {
        let diagram = Diagram::default()
            .with_node(Node::new("a"))
            .with_node(Node::new("b").with_shape(NodeShape::MindmapRoot))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("b", "a"));

        assert_eq!(calculate_mindmap_levels(&diagram).unwrap().root(), Id::new("b"));
    }

    #[test]
    fn test_ambiguous_sources_fall_back_to_first() {
        let diagram = mindmap(&["x", "y", "z"], &[("y", "z")]);

        assert_eq!(calculate_mindmap_levels(&diagram).unwrap().root(), Id::new("x"));
    }

    #[test]
    fn test_empty_diagram_has_no_root() {
        assert!(calculate_mindmap_levels(&Diagram::default()).is_none());
    }

    #[test]
    fn test_styling_cascades_colors() {
        let mut explicit = NodeStyle::default();
        explicit.set_fill(Color::new("red").unwrap());
        let mut diagram = Diagram::default()
            .with_node(Node::new("root"))
            .with_node(Node::new("a"))
            .with_node(Node::new("b").with_style(explicit))
            .with_node(Node::new("a1"))
            .with_node(Node::new("b1"))
            .with_edge(Edge::new("root", "a"))
            .with_edge(Edge::new("root", "b"))
            .with_edge(Edge::new("a", "a1"))
            .with_edge(Edge::new("b", "b1"));
        let config = MindmapConfig::default();
        let levels = calculate_mindmap_levels(&diagram).unwrap();
        apply_mindmap_level_styling(&mut diagram, &levels, &config).unwrap();

        let palette = config.palette().unwrap();
        let fill = |id: &str| diagram.node(Id::new(id)).unwrap().style().fill();
        let red = Color::new("red").ok();
        assert_eq!(fill("root"), config.root_color().ok());
        assert_eq!(fill("a"), Some(palette[0]));
        assert_eq!(fill("b"), red);
        assert_eq!(fill("a1"), Some(palette[0]));
        assert_eq!(fill("b1"), red);

        let a1 = diagram.node(Id::new("a1")).unwrap();
        assert_eq!(a1.data()["level"], 2);
    }

    #[test]
    fn test_edge_styling_by_level() {
        let mut diagram = mindmap(&["r", "a", "b", "c"], &[("r", "a"), ("a", "b"), ("b", "c")]);
        let config = MindmapConfig::default();
        let levels = calculate_mindmap_levels(&diagram).unwrap();
        apply_mindmap_level_styling(&mut diagram, &levels, &config).unwrap();

        let styles: Vec<_> = diagram.edges().iter().map(|edge| edge.style().clone()).collect();
        assert_eq!(styles[0].arrow(), Some(ArrowKind::Filled));
        assert_eq!(styles[1].arrow(), Some(ArrowKind::Open));
        assert_eq!(styles[2].arrow(), Some(ArrowKind::None));
        assert_eq!(styles[0].stroke_width(), Some(4.0));
        assert_eq!(styles[1].stroke_width(), Some(3.0));
        assert_eq!(styles[2].stroke_width(), Some(2.0));
    }

    #[test]
    fn test_edge_styling_follows_source_level() {
        // `b` hangs off `a` through an edge pointing back at its parent
        let mut diagram = mindmap(&["r", "a", "b"], &[("r", "a"), ("b", "a")]);
        let config = MindmapConfig::default();
        let levels = calculate_mindmap_levels(&diagram).unwrap();
        assert_eq!(levels.level(Id::new("b")), Some(2));
        apply_mindmap_level_styling(&mut diagram, &levels, &config).unwrap();

        let upward = diagram.edges()[1].style();
        assert_eq!(upward.arrow(), Some(ArrowKind::None));
        assert_eq!(upward.stroke_width(), Some(config.stroke_width_for_level(2)));
        let b_fill = diagram.node(Id::new("b")).unwrap().style().fill();
        assert_eq!(upward.stroke(), b_fill);
    }

    #[test]
    fn test_invalid_palette_is_config_error() {
        let mut diagram = mindmap(&["r"], &[]);
        let config: MindmapConfig = serde_json::from_str(r#"{ "root_color": "nope" }"#).unwrap();
        let levels = calculate_mindmap_levels(&diagram).unwrap();

        let err = apply_mindmap_level_styling(&mut diagram, &levels, &config).unwrap_err();
        assert!(matches!(err, TrellisError::Config(_)));
    }
}
