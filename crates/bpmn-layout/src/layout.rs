//! The layout pipeline: layering, grid placement and routing.
//!
//! ```text
//! Graph
//!     ↓ layering::assign_layers
//! Layering (layer per node, back edges, unreachable nodes)
//!     ↓ grid::place
//! Grid (column, row per node)
//!     ↓ grid::to_bounds
//! Pixel bounds
//!     ↓ routing::plan_routes
//! Routes
//! ```
//!
//! Each stage reads the outputs of the earlier ones and returns a new value;
//! nothing is written back. [`Engine::calculate`] runs all of them and
//! bundles the results into a [`Layout`].

pub mod grid;
pub mod layering;
pub mod routing;

use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};

use bpmn_layout_core::{geometry::Bounds, identifier::Id};

use crate::{config::LayoutConfig, error::Error, structure::Graph};

use grid::{CellMetrics, Grid};
use layering::Layering;
use routing::{Route, RouteKind};

/// A non-fatal condition met while laying out a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No start node reaches this node. It is laid out from the fallback
    /// root of its cycle.
    UnreachableNode { node: Id },
    /// No collision-free path was found; the flow is a direct segment.
    RoutingFallback { edge: Id },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachableNode { node } => {
                write!(f, "`{node}` is not reachable from any start node")
            }
            Self::RoutingFallback { edge } => {
                write!(f, "flow `{edge}` could not be routed around other elements")
            }
        }
    }
}

/// A fully positioned diagram.
#[derive(Debug, Clone)]
pub struct Layout {
    graph: Graph,
    layering: Layering,
    grid: Grid,
    bounds: IndexMap<Id, Bounds>,
    routes: IndexMap<Id, Route>,
    notices: Vec<Notice>,
}

impl Layout {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn layering(&self) -> &Layering {
        &self.layering
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Pixel bounds of a node.
    pub fn bounds(&self, node: Id) -> Option<Bounds> {
        self.bounds.get(&node).copied()
    }

    /// All node bounds in declaration order.
    pub fn node_bounds(&self) -> impl Iterator<Item = (Id, Bounds)> + '_ {
        self.bounds.iter().map(|(id, bounds)| (*id, *bounds))
    }

    pub fn route(&self, edge: Id) -> Option<&Route> {
        self.routes.get(&edge)
    }

    /// All routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Smallest box covering every node and every waypoint. Padding is not
    /// included.
    pub fn diagram_bounds(&self) -> Bounds {
        let mut nodes = self.bounds.values();
        let Some(first) = nodes.next() else {
            return Bounds::default();
        };
        let merged = nodes.fold(*first, |acc, bounds| acc.merge(bounds));
        self.routes
            .values()
            .flat_map(|route| route.waypoints().iter())
            .fold(merged, |acc, point| acc.include_point(*point))
    }
}

/// Runs the layout stages with one set of spacing constants.
///
/// # Example
///
/// ```
/// # use bpmn_layout::layout::Engine;
/// let engine = Engine::new()
///     .with_horizontal_gap(60.0)
///     .with_vertical_gap(40.0);
/// assert_eq!(engine.config().horizontal_gap(), 60.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: LayoutConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_horizontal_gap(mut self, gap: f32) -> Self {
        self.config = self.config.with_horizontal_gap(gap);
        self
    }

    pub fn with_vertical_gap(mut self, gap: f32) -> Self {
        self.config = self.config.with_vertical_gap(gap);
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.config = self.config.with_padding(padding);
        self
    }

    pub fn with_lane_spacing(mut self, spacing: f32) -> Self {
        self.config = self.config.with_lane_spacing(spacing);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Layout`] if grid placement breaks its invariants.
    /// Unreachable nodes and routing fallbacks are not errors; they are
    /// reported through [`Layout::notices`].
    pub fn calculate(&self, graph: Graph) -> Result<Layout, Error> {
        info!(nodes = graph.node_count(), edges = graph.edge_count(); "Calculating layout");

        let layering = layering::assign_layers(&graph);
        let grid = grid::place(&graph, &layering)?;
        let metrics = CellMetrics::new(self.config);
        let bounds = grid::to_bounds(&graph, &grid, &metrics);
        debug!(nodes = bounds.len(); "Node bounds computed");

        let routes: IndexMap<Id, Route> =
            routing::plan_routes(&graph, &layering, &grid, &bounds, &metrics)
                .into_iter()
                .map(|route| (route.edge(), route))
                .collect();
        let notices = collect_notices(&layering, routes.values());

        info!(
            columns = grid.column_count(),
            rows = grid.row_count(),
            notices = notices.len();
            "Layout calculated"
        );

        Ok(Layout {
            graph,
            layering,
            grid,
            bounds,
            routes,
            notices,
        })
    }
}

/// Unreachable nodes, then fallback routes; each is logged as it is found.
fn collect_notices<'a>(
    layering: &Layering,
    routes: impl IntoIterator<Item = &'a Route>,
) -> Vec<Notice> {
    let unreachable = layering
        .unreachable()
        .map(|node| Notice::UnreachableNode { node });
    let fallbacks = routes
        .into_iter()
        .filter(|route| route.kind() == RouteKind::Fallback)
        .map(|route| Notice::RoutingFallback { edge: route.edge() });

    unreachable
        .chain(fallbacks)
        .inspect(|notice| warn!("{notice}"))
        .collect()
}
