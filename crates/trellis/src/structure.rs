//! Flattened view of the container forest.
//!
//! [`ContainerModel`] stores every container of a diagram in an arena indexed
//! by [`ContainerIdx`], together with two lookup tables: node id to the
//! container directly holding it, and container to its parent container.
//! Keeping the two relations apart means a node and a container can never be
//! confused for one another in a lookup.
//!
//! The model borrows the diagram's containers and is rebuilt for every
//! layout invocation.

use std::collections::{HashMap, HashSet};

use log::trace;

use trellis_core::{identifier::Id, model::Container};

/// Index of a container in a [`ContainerModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerIdx(usize);

impl ContainerIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Entry<'a> {
    container: &'a Container,
    parent: Option<ContainerIdx>,
    children: Vec<ContainerIdx>,
    depth: usize,
}

/// Arena of containers with node and parent lookups.
#[derive(Debug, Default)]
pub struct ContainerModel<'a> {
    entries: Vec<Entry<'a>>,
    roots: Vec<ContainerIdx>,
    by_id: HashMap<Id, ContainerIdx>,
    node_parent: HashMap<Id, ContainerIdx>,
}

impl<'a> ContainerModel<'a> {
    /// Builds the model from the top-level containers of a diagram.
    ///
    /// Every container gets an arena slot. When two containers share an id,
    /// or a node is listed by two containers, the one visited last (pre-order,
    /// declaration order) wins the lookup.
    pub fn build(containers: &'a [Container]) -> Self {
        let mut model = Self::default();
        for container in containers {
            let idx = model.insert(container, None, 0);
            model.roots.push(idx);
        }
        trace!(
            containers_count = model.entries.len(),
            nodes_count = model.node_parent.len();
            "Built container model"
        );
        model
    }

    fn insert(
        &mut self,
        container: &'a Container,
        parent: Option<ContainerIdx>,
        depth: usize,
    ) -> ContainerIdx {
        let idx = ContainerIdx(self.entries.len());
        self.entries.push(Entry {
            container,
            parent,
            children: Vec::new(),
            depth,
        });
        self.by_id.insert(container.id(), idx);
        for &node in container.nodes() {
            self.node_parent.insert(node, idx);
        }
        for child in container.children() {
            let child_idx = self.insert(child, Some(idx), depth + 1);
            self.entries[idx.0].children.push(child_idx);
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All container indices in arena (pre-order) order.
    pub fn indices(&self) -> impl Iterator<Item = ContainerIdx> + '_ {
        (0..self.entries.len()).map(ContainerIdx)
    }

    /// Top-level containers in declaration order.
    pub fn roots(&self) -> &[ContainerIdx] {
        &self.roots
    }

    pub fn container(&self, idx: ContainerIdx) -> &'a Container {
        self.entries[idx.0].container
    }

    pub fn id(&self, idx: ContainerIdx) -> Id {
        self.entries[idx.0].container.id()
    }

    pub fn index_of(&self, id: Id) -> Option<ContainerIdx> {
        self.by_id.get(&id).copied()
    }

    pub fn parent(&self, idx: ContainerIdx) -> Option<ContainerIdx> {
        self.entries[idx.0].parent
    }

    /// Nested containers of `idx`, in declaration order.
    pub fn children(&self, idx: ContainerIdx) -> &[ContainerIdx] {
        &self.entries[idx.0].children
    }

    /// Nesting depth; top-level containers are at depth 0.
    pub fn depth(&self, idx: ContainerIdx) -> usize {
        self.entries[idx.0].depth
    }

    /// The container listing `node` as a direct child.
    pub fn container_of_node(&self, node: Id) -> Option<ContainerIdx> {
        self.node_parent.get(&node).copied()
    }

    /// The immediate parent container of a node or container id.
    ///
    /// Node membership is consulted first.
    pub fn parent_of(&self, id: Id) -> Option<ContainerIdx> {
        self.container_of_node(id)
            .or_else(|| self.index_of(id).and_then(|idx| self.parent(idx)))
    }

    /// Returns `id` followed by each successive parent container up to the
    /// top level.
    ///
    /// A top-level id yields a chain of length one.
    pub fn ancestor_chain(&self, id: Id) -> Vec<Id> {
        let mut chain = vec![id];
        let mut current = self.parent_of(id);
        while let Some(idx) = current {
            chain.push(self.id(idx));
            current = self.parent(idx);
        }
        chain
    }

    /// Containers enclosing `id`, closest first. A container id is its own
    /// first entry.
    fn container_chain(&self, id: Id) -> Vec<ContainerIdx> {
        let mut chain = Vec::new();
        let mut current = if self.node_parent.contains_key(&id) {
            self.container_of_node(id)
        } else {
            self.index_of(id)
        };
        while let Some(idx) = current {
            chain.push(idx);
            current = self.parent(idx);
        }
        chain
    }

    /// The closest container enclosing both ids.
    ///
    /// Returns `None` when either id is top-level: a top-level element shares
    /// no container with anything. Otherwise the common container with the
    /// smallest combined distance from both ids wins.
    pub fn lowest_common_ancestor(&self, a: Id, b: Id) -> Option<ContainerIdx> {
        if self.parent_of(a).is_none() || self.parent_of(b).is_none() {
            return None;
        }

        let chain_a = self.container_chain(a);
        let chain_b = self.container_chain(b);

        let mut best: Option<(usize, ContainerIdx)> = None;
        for (i, &candidate) in chain_a.iter().enumerate() {
            if let Some(j) = chain_b.iter().position(|&other| other == candidate) {
                let distance = i + j;
                if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                    best = Some((distance, candidate));
                }
            }
        }
        best.map(|(_, idx)| idx)
    }

    /// Returns true when `idx` is nested (at any depth) inside `ancestor`.
    pub fn is_descendant(&self, idx: ContainerIdx, ancestor: ContainerIdx) -> bool {
        let mut current = self.parent(idx);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Returns true when `node` sits in `idx` directly or in any container
    /// nested inside it.
    pub fn contains_transitively(&self, idx: ContainerIdx, node: Id) -> bool {
        match self.container_of_node(node) {
            Some(holder) => holder == idx || self.is_descendant(holder, idx),
            None => false,
        }
    }

    /// Every container with children listed before their parents.
    pub fn post_order(&self) -> Vec<ContainerIdx> {
        fn visit(model: &ContainerModel<'_>, idx: ContainerIdx, out: &mut Vec<ContainerIdx>) {
            for &child in model.children(idx) {
                visit(model, child, out);
            }
            out.push(idx);
        }

        let mut out = Vec::with_capacity(self.entries.len());
        for &root in &self.roots {
            visit(self, root, &mut out);
        }
        out
    }

    /// Nodes listed by containers that are not in `declared`.
    ///
    /// Results are in model order and deduplicated.
    pub fn undeclared_nodes(&self, declared: &HashSet<Id>) -> Vec<(Id, Id)> {
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for entry in &self.entries {
            for &node in entry.container.nodes() {
                if !declared.contains(&node) && seen.insert(node) {
                    missing.push((entry.container.id(), node));
                }
            }
        }
        missing
    }
}
