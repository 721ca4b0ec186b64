//! Orthogonal flow routing over the placed grid.
//!
//! Forward flows (target in a later column) leave the source on its right
//! side and enter the target on its left side:
//!
//! ```text
//!   straight      bend at source     bend at target     channel
//!   [u]──►[v]     [u]─┐              [u]──────┐         [u]─┐      ┌►[v]
//!                     │                       │             └──────┘
//!                     └─────►[v]              └►[v]
//! ```
//!
//! Vertical segments run through the middle of the gaps between columns and
//! horizontal segments along free rows, so no segment crosses a node body.
//!
//! Loop flows (back edges, and flows whose target is not further right) run
//! down to a lane below every row of the columns they span and re-enter the
//! target from its bottom. Overlapping lanes are stacked `lane_spacing`
//! apart.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use bpmn_layout_core::{
    geometry::{Bounds, Insets, Point},
    identifier::Id,
};

use crate::{
    layout::{
        grid::{CellMetrics, Grid, GridPosition},
        layering::Layering,
    },
    structure::{Edge, Graph},
};

/// How a route was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// One horizontal segment.
    Straight,
    /// Manhattan path of a forward flow.
    Orthogonal,
    /// Loop-back path entering the target from below.
    Loop,
    /// Direct segment used when no collision-free path was found.
    Fallback,
}

/// Waypoint path of one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    edge: Id,
    kind: RouteKind,
    waypoints: Vec<Point>,
}

impl Route {
    pub fn edge(&self) -> Id {
        self.edge
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    /// At least two points, source connection point first.
    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    pub fn is_loop(&self) -> bool {
        self.kind == RouteKind::Loop
    }

    /// Anchor for the flow label: the first bend, or the middle of a
    /// single segment.
    pub fn label_position(&self) -> Point {
        match self.waypoints.as_slice() {
            [first, second] => first.midpoint(*second),
            [_, bend, ..] => *bend,
            [only] => *only,
            [] => Point::default(),
        }
    }
}

/// Everything the planner reads.
struct Planner<'a> {
    graph: &'a Graph,
    layering: &'a Layering,
    grid: &'a Grid,
    bounds: &'a IndexMap<Id, Bounds>,
    metrics: &'a CellMetrics,
}

/// Plans a route for every edge of `graph`, in declaration order.
///
/// Never fails: a flow without a collision-free path gets a
/// [`RouteKind::Fallback`] route.
pub fn plan_routes(
    graph: &Graph,
    layering: &Layering,
    grid: &Grid,
    bounds: &IndexMap<Id, Bounds>,
    metrics: &CellMetrics,
) -> Vec<Route> {
    let planner = Planner {
        graph,
        layering,
        grid,
        bounds,
        metrics,
    };
    let lanes = planner.assign_lanes();

    let routes: Vec<Route> = graph
        .edges()
        .filter_map(|edge| planner.route(edge, lanes.get(&edge.id()).copied()))
        .collect();

    debug!(
        routes = routes.len(),
        loops = lanes.len(),
        fallbacks = routes.iter().filter(|r| r.kind == RouteKind::Fallback).count();
        "Routes planned"
    );
    routes
}

impl Planner<'_> {
    fn cells(&self, edge: &Edge) -> Option<(GridPosition, GridPosition)> {
        Some((
            self.grid.position(edge.source())?,
            self.grid.position(edge.target())?,
        ))
    }

    fn is_loop(&self, edge: &Edge, source: GridPosition, target: GridPosition) -> bool {
        self.layering.is_back_edge(edge.id()) || target.column() <= source.column()
    }

    /// Stacking level of every loop flow. Greedy interval colouring over the
    /// column ranges, in edge order.
    fn assign_lanes(&self) -> HashMap<Id, usize> {
        let mut taken: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut lanes = HashMap::new();

        for edge in self.graph.edges() {
            let Some((source, target)) = self.cells(edge) else {
                continue;
            };
            if !self.is_loop(edge, source, target) {
                continue;
            }
            let span = column_span(source, target);
            let level = taken
                .iter()
                .position(|spans| spans.iter().all(|other| !overlaps(*other, span)))
                .unwrap_or(taken.len());
            if level == taken.len() {
                taken.push(Vec::new());
            }
            taken[level].push(span);
            lanes.insert(edge.id(), level);
        }
        lanes
    }

    fn route(&self, edge: &Edge, lane: Option<usize>) -> Option<Route> {
        let (source, target) = self.cells(edge)?;
        let source_bounds = *self.bounds.get(&edge.source())?;
        let target_bounds = *self.bounds.get(&edge.target())?;

        let is_loop = self.is_loop(edge, source, target);
        let (kind, waypoints) = if is_loop {
            let waypoints = self.loop_route(
                edge,
                source,
                target,
                source_bounds,
                target_bounds,
                lane.unwrap_or_default(),
            );
            (RouteKind::Loop, waypoints)
        } else {
            self.forward_route(edge, source, target, source_bounds, target_bounds)
        };
        let waypoints = dedup(waypoints);

        if waypoints.len() >= 2 && self.is_clear(edge, &waypoints) {
            trace!(edge:% = edge.id(), kind:? = kind, points = waypoints.len(); "Route");
            return Some(Route {
                edge: edge.id(),
                kind,
                waypoints,
            });
        }

        let end = if is_loop {
            target_bounds.bottom_mid()
        } else {
            target_bounds.left_mid()
        };
        Some(Route {
            edge: edge.id(),
            kind: RouteKind::Fallback,
            waypoints: vec![source_bounds.right_mid(), end],
        })
    }

    fn forward_route(
        &self,
        edge: &Edge,
        source: GridPosition,
        target: GridPosition,
        source_bounds: Bounds,
        target_bounds: Bounds,
    ) -> (RouteKind, Vec<Point>) {
        let start = source_bounds.right_mid();
        let end = target_bounds.left_mid();
        let free_row = |row: usize| {
            (source.column() + 1..target.column()).all(|column| self.grid.is_free(column, row))
        };

        if source.row() == target.row() && free_row(source.row()) {
            return (RouteKind::Straight, vec![start, end]);
        }

        let near_source = self.metrics.gap_right_of(source.column());
        let near_target = self.metrics.gap_left_of(target.column());
        // Bend right after the source, then run along the target row.
        let bend_early = free_row(target.row()).then(|| {
            vec![
                start,
                Point::new(near_source, start.y()),
                Point::new(near_source, end.y()),
                end,
            ]
        });
        // Run along the source row, then bend right before the target.
        let bend_late = free_row(source.row()).then(|| {
            vec![
                start,
                Point::new(near_target, start.y()),
                Point::new(near_target, end.y()),
                end,
            ]
        });

        let fans_out = self
            .layering
            .forward_targets(self.graph, edge.source())
            .len()
            >= 2;
        let preferred = if fans_out {
            bend_early.or(bend_late)
        } else {
            bend_late.or(bend_early)
        };
        if let Some(waypoints) = preferred {
            return (RouteKind::Orthogonal, waypoints);
        }

        // Nearest free row between the two columns; the row below the grid
        // is always free.
        let (r1, r2) = (source.row(), target.row());
        let channel = (0..=self.grid.row_count())
            .filter(|row| free_row(*row))
            .min_by_key(|row| (row.abs_diff(r1) + row.abs_diff(r2), *row))
            .unwrap_or(self.grid.row_count());
        let channel_y = self.metrics.row_center(channel);

        (
            RouteKind::Orthogonal,
            vec![
                start,
                Point::new(near_source, start.y()),
                Point::new(near_source, channel_y),
                Point::new(near_target, channel_y),
                Point::new(near_target, end.y()),
                end,
            ],
        )
    }

    fn loop_route(
        &self,
        edge: &Edge,
        source: GridPosition,
        target: GridPosition,
        source_bounds: Bounds,
        target_bounds: Bounds,
        level: usize,
    ) -> Vec<Point> {
        let config = self.metrics.config();
        let (low, high) = column_span(source, target);
        let deepest = (low..=high)
            .filter_map(|column| self.grid.bottom_row(column))
            .max()
            .unwrap_or(source.row().max(target.row()));
        let lane_y = self.metrics.row_bottom(deepest)
            + config.vertical_gap() / 2.0
            + level as f32 * config.lane_spacing();

        let start = source_bounds.right_mid();
        let exit_x = self.metrics.gap_right_of(source.column());
        let entry = target_bounds.bottom_mid();

        let mut waypoints = vec![
            start,
            Point::new(exit_x, start.y()),
            Point::new(exit_x, lane_y),
        ];

        if self.grid.bottom_row(target.column()) == Some(target.row()) {
            waypoints.push(Point::new(entry.x(), lane_y));
        } else {
            // Something sits below the target; climb the gap left of its
            // column and come in under it.
            let detour_x = self.metrics.gap_left_of(target.column());
            let under_y = self.metrics.gap_below(target.row());
            trace!(edge:% = edge.id(); "Loop detours around column");
            waypoints.push(Point::new(detour_x, lane_y));
            waypoints.push(Point::new(detour_x, under_y));
            waypoints.push(Point::new(entry.x(), under_y));
        }
        waypoints.push(entry);
        waypoints
    }

    /// `true` if no segment passes through a node other than the flow's
    /// own endpoints.
    fn is_clear(&self, edge: &Edge, waypoints: &[Point]) -> bool {
        self.bounds
            .iter()
            .filter(|(id, _)| **id != edge.source() && **id != edge.target())
            .all(|(_, bounds)| {
                let body = bounds.add_padding(Insets::uniform(-0.5));
                waypoints
                    .windows(2)
                    .all(|segment| !body.intersects_segment(segment[0], segment[1]))
            })
    }
}

fn column_span(source: GridPosition, target: GridPosition) -> (usize, usize) {
    let (a, b) = (source.column(), target.column());
    (a.min(b), a.max(b))
}

fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

fn dedup(mut waypoints: Vec<Point>) -> Vec<Point> {
    waypoints.dedup();
    waypoints
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::{
        geometry::Size,
        process::{ElementKind, FlowElement, ProcessDefinition, SequenceFlow},
    };

    use super::*;
    use crate::{
        config::LayoutConfig,
        layout::{
            grid::{place, to_bounds},
            layering::assign_layers,
        },
    };

    fn routes(nodes: &[(&str, ElementKind)], flows: &[(&str, &str)]) -> IndexMap<Id, Route> {
        let mut process = ProcessDefinition::new(Id::new("p"));
        for (id, kind) in nodes {
            process.add_element(FlowElement::new(Id::new(id), *kind, kind.default_tag()));
        }
        for (index, (source, target)) in flows.iter().enumerate() {
            process.add_flow(SequenceFlow::new(
                Id::new(&format!("f{}", index + 1)),
                Id::new(source),
                Id::new(target),
            ));
        }
        let graph = Graph::from_process(&process).unwrap();
        let layering = assign_layers(&graph);
        let grid = place(&graph, &layering).unwrap();
        let metrics = CellMetrics::new(LayoutConfig::default());
        let bounds = to_bounds(&graph, &grid, &metrics);

        plan_routes(&graph, &layering, &grid, &bounds, &metrics)
            .into_iter()
            .map(|route| (route.edge(), route))
            .collect()
    }

    fn route<'a>(routes: &'a IndexMap<Id, Route>, edge: &str) -> &'a Route {
        &routes[&Id::new(edge)]
    }

    fn is_orthogonal(route: &Route) -> bool {
        route
            .waypoints()
            .windows(2)
            .all(|s| s[0].x() == s[1].x() || s[0].y() == s[1].y())
    }

    #[test]
    fn test_straight_flow() {
        let routes = routes(
            &[("a", ElementKind::StartEvent), ("b", ElementKind::Task)],
            &[("a", "b")],
        );
        let f1 = route(&routes, "f1");

        assert_eq!(f1.kind(), RouteKind::Straight);
        // start event right side, task left side; both centred on row 0
        assert_eq!(
            f1.waypoints(),
            &[Point::new(108.0, 80.0), Point::new(220.0, 80.0)]
        );
    }

    #[test]
    fn test_fan_out_bends_at_the_gateway() {
        let routes = routes(
            &[
                ("gw", ElementKind::ExclusiveGateway),
                ("x", ElementKind::Task),
                ("y", ElementKind::Task),
            ],
            &[("gw", "x"), ("gw", "y")],
        );
        let f2 = route(&routes, "f2");

        assert_eq!(f2.kind(), RouteKind::Orthogonal);
        assert!(is_orthogonal(f2));
        // gap right of column 0
        assert_eq!(f2.waypoints()[1].x(), 180.0);
        assert_eq!(f2.waypoints().len(), 4);
    }

    #[test]
    fn test_merge_bends_at_the_target() {
        let routes = routes(
            &[
                ("gw", ElementKind::ParallelGateway),
                ("x", ElementKind::Task),
                ("y", ElementKind::Task),
                ("join", ElementKind::ParallelGateway),
            ],
            &[("gw", "x"), ("gw", "y"), ("x", "join"), ("y", "join")],
        );
        let f4 = route(&routes, "f4");

        assert_eq!(f4.kind(), RouteKind::Orthogonal);
        // gap left of column 2
        assert_eq!(f4.waypoints()[1].x(), 360.0);
    }

    #[test]
    fn test_long_flow_takes_a_free_row() {
        // a -> b -> c -> d with a shortcut a -> d; b and c block row 0.
        let routes = routes(
            &[
                ("a", ElementKind::Task),
                ("b", ElementKind::Task),
                ("c", ElementKind::Task),
                ("d", ElementKind::Task),
            ],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        let shortcut = route(&routes, "f4");

        assert_eq!(shortcut.kind(), RouteKind::Orthogonal);
        assert!(is_orthogonal(shortcut));
        assert_eq!(shortcut.waypoints().len(), 6);
        // row 1 centre
        assert_eq!(shortcut.waypoints()[2].y(), 210.0);
    }

    #[test]
    fn test_loop_enters_from_below() {
        let routes = routes(
            &[
                ("a", ElementKind::Task),
                ("b", ElementKind::Task),
                ("gw", ElementKind::ExclusiveGateway),
            ],
            &[("a", "b"), ("b", "gw"), ("gw", "a")],
        );
        let back = route(&routes, "f3");

        assert_eq!(back.kind(), RouteKind::Loop);
        assert!(back.is_loop());
        assert!(is_orthogonal(back));
        let last = *back.waypoints().last().unwrap();
        // bottom middle of `a`
        assert_eq!(last, Point::new(90.0, 120.0));
        // lane below row 0
        assert_eq!(back.waypoints()[2].y(), 145.0);
    }

    #[test]
    fn test_self_loop_is_not_degenerate() {
        let routes = routes(&[("a", ElementKind::Task)], &[("a", "a")]);
        let f1 = route(&routes, "f1");

        assert_eq!(f1.kind(), RouteKind::Loop);
        assert!(f1.waypoints().len() >= 4);
        let first = f1.waypoints()[0];
        let last = *f1.waypoints().last().unwrap();
        assert_ne!(first, last);
    }

    #[test]
    fn test_overlapping_loops_get_separate_lanes() {
        let routes = routes(
            &[
                ("a", ElementKind::Task),
                ("b", ElementKind::Task),
                ("c", ElementKind::Task),
            ],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "b")],
        );
        let outer = route(&routes, "f3");
        let inner = route(&routes, "f4");

        assert_eq!(outer.waypoints()[2].y(), 145.0);
        assert_eq!(inner.waypoints()[2].y(), 160.0);
    }

    #[test]
    fn test_blocked_flow_falls_back_to_a_direct_segment() {
        let mut process = ProcessDefinition::new(Id::new("p"));
        for id in ["a", "b", "wall"] {
            process.add_element(FlowElement::new(Id::new(id), ElementKind::Task, "task"));
        }
        process.add_flow(SequenceFlow::new(Id::new("f1"), Id::new("a"), Id::new("b")));

        let graph = Graph::from_process(&process).unwrap();
        let layering = assign_layers(&graph);
        let grid = place(&graph, &layering).unwrap();
        let metrics = CellMetrics::new(LayoutConfig::default());
        let mut bounds = to_bounds(&graph, &grid, &metrics);
        // Tall enough to cut every row and the channel below the grid.
        bounds.insert(
            Id::new("wall"),
            Bounds::new_from_top_left(Point::new(150.0, -1000.0), Size::new(40.0, 3000.0)),
        );

        let routes = plan_routes(&graph, &layering, &grid, &bounds, &metrics);
        let f1 = &routes[0];

        assert_eq!(f1.kind(), RouteKind::Fallback);
        assert_eq!(
            f1.waypoints(),
            &[
                bounds[&Id::new("a")].right_mid(),
                bounds[&Id::new("b")].left_mid(),
            ]
        );
    }

    #[test]
    fn test_label_position() {
        let route = Route {
            edge: Id::new("f"),
            kind: RouteKind::Orthogonal,
            waypoints: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
            ],
        };
        assert_eq!(route.label_position(), Point::new(10.0, 0.0));

        let straight = Route {
            edge: Id::new("g"),
            kind: RouteKind::Straight,
            waypoints: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
        };
        assert_eq!(straight.label_position(), Point::new(5.0, 0.0));
    }
}
