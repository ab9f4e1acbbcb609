//! Trellis - Layout post-processing for container-heavy diagrams.
//!
//! Trellis takes an unpositioned [`model::Diagram`] (nodes, edges, and a
//! forest of containers), hands it to a graph-layout solver, and turns the
//! solver's answer into a drawing a renderer can use as is: containers wrap
//! their contents, sibling swimlanes and process pools line up, edges attach
//! to shape anchors, and mindmap and pedigree charts are leveled and styled.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. [`analyze`]: diagram-type pre-pass for mindmaps and pedigrees.
//! 2. [`structure`]: container hierarchy lookups.
//! 3. [`layout`]: solver graph, solving, and mapping back.
//! 4. [`normalize`]: containment, swimlane and pool sizing, origin shift.
//! 5. [`routing`]: anchor snapping and radial edge simplification.
//!
//! Problems in the input that do not prevent a layout are reported as
//! [`Diagnostic`]s on the result instead of failing the call.

pub mod analyze;
pub mod config;
pub mod layout;
pub mod normalize;
pub mod options;
pub mod routing;
pub mod shape;
pub mod structure;

mod diagnostic;
mod error;

pub use trellis_core::{color, geometry, identifier, model};

pub use diagnostic::{Diagnostic, Severity};
pub use error::TrellisError;

use std::collections::{HashMap, HashSet};

use log::{debug, info, trace};

use trellis_core::{
    geometry::{Insets, Size},
    identifier::Id,
    model::{Diagram, Node},
};

use config::{AppConfig, LayoutConfig};
use diagnostic::Diagnostics;
use layout::{
    DiagramLayout, LayoutSolver, SugiyamaSolver,
    delegate::{self, GraphBuilder},
    solver::SolverOptions,
};
use options::{Algorithm, Direction, LayoutOptions, normalize_direction_loose};
use shape::{Anchor, BasicShapes, ShapeProvider};
use structure::ContainerModel;

/// Builder for laying out Trellis diagrams.
///
/// Holds the configuration together with the solver and shape provider the
/// pipeline calls out to. Both collaborators default to the implementations
/// shipped with this crate.
///
/// # Examples
///
/// ```
/// use trellis::{
///     LayoutBuilder,
///     config::AppConfig,
///     model::{Diagram, Edge, Node},
///     options::LayoutOptions,
/// };
///
/// let diagram = Diagram::default()
///     .with_node(Node::new("a"))
///     .with_node(Node::new("b"))
///     .with_edge(Edge::new("a", "b"));
///
/// let builder = LayoutBuilder::new(AppConfig::default());
/// let layout = builder
///     .layout(&diagram, &LayoutOptions::new().with_direction("LR"))
///     .expect("Failed to lay out");
///
/// assert_eq!(layout.nodes().len(), 2);
/// assert!(layout.diagnostics().is_empty());
/// ```
pub struct LayoutBuilder {
    config: AppConfig,
    solver: Box<dyn LayoutSolver + Send + Sync>,
    shapes: Box<dyn ShapeProvider + Send + Sync>,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Layout defaults and diagram-type styling
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            solver: Box::new(SugiyamaSolver::default()),
            shapes: Box::new(BasicShapes::default()),
        }
    }

    /// Replaces the graph-layout solver.
    pub fn with_solver(mut self, solver: impl LayoutSolver + Send + Sync + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Replaces the shape provider used for node sizes and anchors.
    pub fn with_shapes(mut self, shapes: impl ShapeProvider + Send + Sync + 'static) -> Self {
        self.shapes = Box::new(shapes);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lay out a diagram.
    ///
    /// Call options win over the builder's configuration. The result carries
    /// every diagnostic raised along the way.
    ///
    /// # Arguments
    ///
    /// * `diagram` - The diagram to position
    /// * `options` - Per-call direction, spacing, and algorithm overrides
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Config`] if the mindmap palette is invalid and
    /// [`TrellisError::Layout`] if the solver fails.
    pub fn layout(&self, diagram: &Diagram, options: &LayoutOptions) -> Result<DiagramLayout, TrellisError> {
        info!(
            diagram_kind:? = diagram.kind(),
            nodes_count = diagram.nodes().len(),
            edges_count = diagram.edges().len(),
            containers_count = diagram.containers().len();
            "Laying out diagram"
        );
        let mut diagnostics = Diagnostics::new();

        let diagram = analyze::prepare(diagram, self.config.mindmap())?;
        let diagram = diagram.as_ref();

        let model = ContainerModel::build(diagram.containers());
        debug!(containers_count = model.len(); "Container model built");

        let declared: HashSet<Id> = diagram.nodes().iter().map(Node::id).collect();
        for (container, node) in model.undeclared_nodes(&declared) {
            diagnostics.warn(format!(
                "container `{container}` lists undeclared node `{node}`"
            ));
        }

        let sizes: HashMap<Id, Size> = diagram
            .nodes()
            .iter()
            .map(|node| (node.id(), self.shapes.size(node)))
            .collect();

        report_unknown_tokens(&model, options, self.config.layout(), &mut diagnostics);

        let root_options = self.root_options(options);
        let direction = root_options.direction();
        let spacing = root_options.spacing();
        debug!(
            algorithm:? = root_options.algorithm(),
            direction:% = direction,
            spacing = spacing;
            "Resolved root options"
        );

        let layout_config = self.config.layout();
        let graph = GraphBuilder::new(diagram, &model, &sizes, layout_config, &mut diagnostics)
            .build(root_options);
        let solved = self.solver.solve(&graph)?;
        let mut mapped = delegate::map_back(diagram, &model, &sizes, &solved, &mut diagnostics);
        trace!(nodes:? = mapped.nodes; "Mapped nodes");

        normalize::normalize(
            &model,
            &mut mapped.containers,
            &mut mapped.nodes,
            &mut mapped.edges,
            direction,
            spacing,
        );

        let anchors: HashMap<Id, Vec<Anchor>> = mapped
            .nodes
            .iter()
            .filter_map(|positioned| {
                let node = diagram.node(positioned.id())?;
                let anchors = self.shapes.anchors(node, positioned.bounds().to_size());
                (!anchors.is_empty()).then_some((positioned.id(), anchors))
            })
            .collect();
        routing::snap_all_edges(&mapped.nodes, &anchors, &mut mapped.edges);
        routing::simplify_radial_edges(&model, &mut mapped.edges);

        let size = normalize::drawing_extent(&mapped.containers, &mapped.nodes, &mapped.edges)
            .map(|extent| Size::new(extent.max_x().max(0.0), extent.max_y().max(0.0)))
            .unwrap_or_default();

        info!(
            width = size.width(),
            height = size.height(),
            diagnostics_count = diagnostics.len();
            "Layout complete"
        );

        Ok(DiagramLayout::new(
            mapped.nodes,
            mapped.edges,
            mapped.containers,
            size,
            diagnostics.into_vec(),
        ))
    }

    fn root_options(&self, options: &LayoutOptions) -> SolverOptions {
        let defaults = self.config.layout();
        let algorithm = Algorithm::from_token(options.algorithm().unwrap_or(defaults.algorithm()));
        let token = options.direction().unwrap_or(defaults.direction());
        let spacing = options.spacing().unwrap_or(defaults.spacing());

        SolverOptions::new(
            algorithm,
            Direction::from_token(token),
            spacing,
            Insets::uniform(0.0),
        )
        .with_direction_literal(normalize_direction_loose(Some(token)))
    }
}

/// Notes every direction or algorithm token that falls back to its default.
fn report_unknown_tokens(
    model: &ContainerModel<'_>,
    options: &LayoutOptions,
    defaults: &LayoutConfig,
    diagnostics: &mut Diagnostics,
) {
    let direction = options.direction().unwrap_or(defaults.direction());
    if Direction::parse(direction).is_none() {
        diagnostics.info(format!("unknown direction `{direction}`, using DOWN"));
    }
    let algorithm = options.algorithm().unwrap_or(defaults.algorithm());
    if Algorithm::parse(algorithm).is_none() {
        diagnostics.info(format!("unknown algorithm `{algorithm}`, using layered"));
    }

    for idx in model.indices() {
        let container = model.container(idx);
        if let Some(token) = container.direction_token()
            && Direction::parse(token).is_none()
        {
            diagnostics.info(format!(
                "container `{}` has unknown direction `{token}`, using DOWN",
                container.id()
            ));
        }
        if let Some(token) = container.algorithm_token()
            && Algorithm::parse(token).is_none()
        {
            diagnostics.info(format!(
                "container `{}` has unknown algorithm `{token}`, using layered",
                container.id()
            ));
        }
    }
}

/// Lay out a diagram with the default configuration, solver, and shapes.
///
/// # Errors
///
/// See [`LayoutBuilder::layout`].
pub fn layout(diagram: &Diagram, options: &LayoutOptions) -> Result<DiagramLayout, TrellisError> {
    LayoutBuilder::default().layout(diagram, options)
}

/// Parse a serialized diagram.
///
/// # Errors
///
/// Returns [`TrellisError::Model`] for an empty or `null` payload and
/// [`TrellisError::Input`] when the JSON does not describe a diagram.
pub fn load_diagram(source: &str) -> Result<Diagram, TrellisError> {
    let trimmed = source.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(TrellisError::Model("diagram payload is empty".to_string()));
    }

    let diagram: Diagram =
        serde_json::from_str(source).map_err(|err| TrellisError::new_input_error(err, source))?;
    debug!(nodes_count = diagram.nodes().len(); "Diagram loaded");
    Ok(diagram)
}
