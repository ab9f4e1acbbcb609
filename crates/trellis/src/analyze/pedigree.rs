//! Pedigree generations and spouse pairing.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{Direction, graph::DiGraph, visit::EdgeRef};

use trellis_core::{
    identifier::Id,
    model::{ArrowKind, Diagram},
};

use super::DiagramGraph;

/// Generation of every node and the spouse pairing of a pedigree chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PedigreeGenerations {
    generations: IndexMap<Id, usize>,
    spouses: IndexMap<Id, Id>,
}

impl PedigreeGenerations {
    pub fn generation(&self, id: Id) -> Option<usize> {
        self.generations.get(&id).copied()
    }

    pub fn spouse(&self, id: Id) -> Option<Id> {
        self.spouses.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, usize)> + '_ {
        self.generations.iter().map(|(&id, &generation)| (id, generation))
    }

    /// Number of nodes with a generation.
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Number of spouse pairs.
    pub fn couples_count(&self) -> usize {
        self.spouses.len() / 2
    }
}

/// Levels a pedigree chart into generations.
///
/// Two nodes joined by edges in both directions are spouses; each node has
/// at most one spouse and the first pairing in edge order wins. Every other
/// edge runs from parent to child.
///
/// Roots are nodes without a parent, except for the spouse of someone who
/// has one: a partner who married into the family takes their spouse's
/// generation instead of starting a new one. A breadth-first walk from the
/// roots gives children their parent's generation plus one and spouses the
/// same generation as their partner. Anything left over, such as a parent
/// cycle, is seeded at generation zero in declaration order.
pub fn calculate_pedigree_generations(diagram: &Diagram) -> PedigreeGenerations {
    let graph = DiagramGraph::new(diagram);

    let mut spouses: IndexMap<Id, Id> = IndexMap::new();
    let mut mutual: HashSet<(Id, Id)> = HashSet::new();
    for edge in diagram.edges() {
        let (from, to) = (edge.from(), edge.to());
        if from == to || !graph.has_edge(from, to) || !graph.has_edge(to, from) {
            continue;
        }
        mutual.insert((from, to));
        mutual.insert((to, from));
        if spouses.contains_key(&from) || spouses.contains_key(&to) {
            trace!(from:% = from, to:% = to; "Node already paired, ignoring second spouse edge");
            continue;
        }
        spouses.insert(from, to);
        spouses.insert(to, from);
    }

    let mut lineage: DiGraph<Id, ()> = DiGraph::new();
    let mut indices = IndexMap::new();
    for id in graph.ids() {
        indices.insert(id, lineage.add_node(id));
    }
    for edge in diagram.edges() {
        let (from, to) = (edge.from(), edge.to());
        if from == to || mutual.contains(&(from, to)) {
            continue;
        }
        if let (Some(&parent), Some(&child)) = (indices.get(&from), indices.get(&to))
            && !lineage.contains_edge(parent, child)
        {
            lineage.add_edge(parent, child, ());
        }
    }

    let has_parent = |id: Id| {
        indices.get(&id).is_some_and(|&idx| {
            lineage
                .edges_directed(idx, Direction::Incoming)
                .next()
                .is_some()
        })
    };

    let mut generations: IndexMap<Id, usize> = IndexMap::new();
    let mut queue = VecDeque::new();
    for id in graph.ids() {
        let married_in = spouses.get(&id).is_some_and(|&spouse| has_parent(spouse));
        if !has_parent(id) && !married_in {
            generations.insert(id, 0);
            queue.push_back(id);
        }
    }

    loop {
        while let Some(current) = queue.pop_front() {
            let generation = generations[&current];
            if let Some(&spouse) = spouses.get(&current)
                && !generations.contains_key(&spouse)
            {
                generations.insert(spouse, generation);
                queue.push_back(spouse);
            }
            let Some(&idx) = indices.get(&current) else {
                continue;
            };
            let mut children: Vec<_> = lineage
                .edges_directed(idx, Direction::Outgoing)
                .map(|edge| (edge.id(), lineage[edge.target()]))
                .collect();
            children.sort_by_key(|&(edge, _)| edge);
            for (_, child) in children {
                if !generations.contains_key(&child) {
                    generations.insert(child, generation + 1);
                    queue.push_back(child);
                }
            }
        }

        match graph.ids().find(|id| !generations.contains_key(id)) {
            Some(seed) => {
                debug!(seed:% = seed; "Seeding unreached pedigree node at generation zero");
                generations.insert(seed, 0);
                queue.push_back(seed);
            }
            None => break,
        }
    }

    PedigreeGenerations {
        generations,
        spouses,
    }
}

/// Stamps generations onto a pedigree chart.
///
/// Nodes get `generation` and, when paired, `spouse` data entries; male and
/// female shapes are recorded under `gender`. Spouse edges without an
/// explicit arrow are drawn without an arrowhead.
pub fn apply_pedigree_styling(diagram: &mut Diagram, generations: &PedigreeGenerations) {
    for node in diagram.nodes_mut() {
        let id = node.id();
        if let Some(generation) = generations.generation(id) {
            node.set_data("generation", generation);
        }
        if let Some(spouse) = generations.spouse(id) {
            node.set_data("spouse", spouse.to_text());
        }
        if node.shape().is_gendered() {
            let gender = node.shape().as_str().to_string();
            node.set_data("gender", gender);
        }
    }

    for edge in diagram.edges_mut() {
        if generations.spouse(edge.from()) == Some(edge.to()) && edge.style().arrow().is_none() {
            edge.style_mut().set_arrow(ArrowKind::None);
        }
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::model::{DiagramKind, Edge, Node, NodeShape};

    use super::*;

    fn pedigree(nodes: &[&str], edges: &[(&str, &str)]) -> Diagram {
        let mut diagram = Diagram::new(DiagramKind::Pedigree);
        for &id in nodes {
            diagram = diagram.with_node(Node::new(id));
        }
        for &(from, to) in edges {
            diagram = diagram.with_edge(Edge::new(from, to));
        }
        diagram
    }

    fn generation(generations: &PedigreeGenerations, id: &str) -> Option<usize> {
        generations.generation(Id::new(id))
    }

    #[test]
    fn test_spouses_share_generation_with_child_below() {
        let diagram = pedigree(
            &["father", "mother", "child"],
            &[("father", "mother"), ("mother", "father"), ("father", "child")],
        );
        let generations = calculate_pedigree_generations(&diagram);

        assert_eq!(generation(&generations, "father"), Some(0));
        assert_eq!(generation(&generations, "mother"), Some(0));
        assert_eq!(generation(&generations, "child"), Some(1));
        assert_eq!(generations.spouse(Id::new("mother")), Some(Id::new("father")));
        assert_eq!(generations.couples_count(), 1);
    }

    #[test]
    fn test_married_in_spouse_takes_partner_generation() {
        let diagram = pedigree(
            &["grandpa", "son", "wife", "grandchild"],
            &[
                ("grandpa", "son"),
                ("son", "wife"),
                ("wife", "son"),
                ("wife", "grandchild"),
            ],
        );
        let generations = calculate_pedigree_generations(&diagram);

        assert_eq!(generation(&generations, "grandpa"), Some(0));
        assert_eq!(generation(&generations, "son"), Some(1));
        assert_eq!(generation(&generations, "wife"), Some(1));
        assert_eq!(generation(&generations, "grandchild"), Some(2));
    }

    #[test]
    fn test_first_pairing_wins() {
        let diagram = pedigree(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("a", "c"), ("c", "a")],
        );
        let generations = calculate_pedigree_generations(&diagram);

        assert_eq!(generations.spouse(Id::new("a")), Some(Id::new("b")));
        assert_eq!(generations.spouse(Id::new("c")), None);
        assert_eq!(generations.couples_count(), 1);
        assert_eq!(generations.len(), 3);
    }

    #[test]
    fn test_parent_cycle_is_seeded() {
        let diagram = pedigree(&["a", "b"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let diagram = diagram.with_node(Node::new("c"));
        let generations = calculate_pedigree_generations(&diagram);

        assert_eq!(generation(&generations, "a"), Some(0));
        assert_eq!(generation(&generations, "b"), Some(1));
        assert_eq!(generation(&generations, "c"), Some(2));
    }

    #[test]
    fn test_styling_marks_spouse_edges() {
        let mut diagram = Diagram::new(DiagramKind::Pedigree)
            .with_node(Node::new("dad").with_shape(NodeShape::Male))
            .with_node(Node::new("mum").with_shape(NodeShape::Female))
            .with_node(Node::new("kid"))
            .with_edge(Edge::new("dad", "mum"))
            .with_edge(Edge::new("mum", "dad"))
            .with_edge(Edge::new("mum", "kid"));
        let generations = calculate_pedigree_generations(&diagram);
        apply_pedigree_styling(&mut diagram, &generations);

        let dad = diagram.node(Id::new("dad")).unwrap();
        assert_eq!(dad.data()["generation"], 0);
        assert_eq!(dad.data()["spouse"], "mum");
        assert_eq!(dad.data()["gender"], "male");
        assert_eq!(diagram.node(Id::new("kid")).unwrap().data()["generation"], 1);

        let arrows: Vec<_> = diagram.edges().iter().map(|edge| edge.style().arrow()).collect();
        assert_eq!(arrows, vec![Some(ArrowKind::None), Some(ArrowKind::None), None]);
    }
}
