//! Grid placement and the grid-to-pixel conversion.
//!
//! Column = component column offset + layer. Rows are chosen column by
//! column, left to right, and never revisited:
//!
//! - Every predecessor `u` in an earlier column proposes `row(u) + offset`,
//!   where `offset` is the index of this node among `u`'s forward targets
//!   when `u` fans out, and 0 otherwise.
//! - A node a fan-out proposes for (the topmost such fan-out) takes that
//!   proposal, so siblings keep the gateway's declared order.
//! - Otherwise the candidate row is the lower median of the proposals,
//!   which minimises the summed vertical deflection of the incoming flows.
//! - Nodes without placed predecessors propose row 0.
//! - Nodes are sorted by (candidate, smallest proposing anchor, declaration
//!   order) and each takes `max(candidate, previous row + 1)`. Ties
//!   therefore go to the lower row in declaration order.
//!
//! Components occupy disjoint column ranges, first component leftmost.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use bpmn_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    process::ElementKind,
};

use crate::{
    config::LayoutConfig,
    error::Error,
    layout::layering::Layering,
    structure::{Component, Graph},
};

/// Integer cell of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    column: usize,
    row: usize,
}

impl GridPosition {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    pub fn column(self) -> usize {
        self.column
    }

    pub fn row(self) -> usize {
        self.row
    }
}

/// (column, row) of every node. No two nodes share a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    positions: IndexMap<Id, GridPosition>,
    occupied: HashMap<GridPosition, Id>,
    column_bottoms: Vec<Option<usize>>,
}

impl Grid {
    fn insert(&mut self, node: Id, position: GridPosition) -> Result<(), Error> {
        if let Some(other) = self.occupied.get(&position) {
            return Err(Error::Layout(format!(
                "`{node}` and `{other}` were both placed at column {}, row {}",
                position.column, position.row
            )));
        }
        if self.positions.insert(node, position).is_some() {
            return Err(Error::Layout(format!("`{node}` was placed twice")));
        }
        self.occupied.insert(position, node);

        if self.column_bottoms.len() <= position.column {
            self.column_bottoms.resize(position.column + 1, None);
        }
        let bottom = &mut self.column_bottoms[position.column];
        *bottom = Some(bottom.map_or(position.row, |row| row.max(position.row)));
        Ok(())
    }

    pub fn position(&self, node: Id) -> Option<GridPosition> {
        self.positions.get(&node).copied()
    }

    /// Node occupying a cell.
    pub fn node_at(&self, column: usize, row: usize) -> Option<Id> {
        self.occupied.get(&GridPosition::new(column, row)).copied()
    }

    pub fn is_free(&self, column: usize, row: usize) -> bool {
        self.node_at(column, row).is_none()
    }

    /// Lowest occupied row of a column.
    pub fn bottom_row(&self, column: usize) -> Option<usize> {
        self.column_bottoms.get(column).copied().flatten()
    }

    /// All placements in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, GridPosition)> + '_ {
        self.positions.iter().map(|(id, position)| (*id, *position))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.column_bottoms.len()
    }

    /// One more than the lowest occupied row of any column.
    pub fn row_count(&self) -> usize {
        self.column_bottoms
            .iter()
            .flatten()
            .max()
            .map_or(0, |row| row + 1)
    }
}

/// Places every node of `graph`.
///
/// # Errors
///
/// [`Error::Layout`] if two nodes end up in one cell or a node is left
/// unplaced. Neither can happen for a graph and layering built by this
/// crate.
pub fn place(graph: &Graph, layering: &Layering) -> Result<Grid, Error> {
    let mut grid = Grid::default();
    let mut column_offset = 0;

    for component in graph.components() {
        let width = place_component(graph, layering, component, column_offset, &mut grid)?;
        trace!(column_offset, width; "Component placed");
        column_offset += width;
    }

    if let Some(missing) = graph.nodes().find(|node| grid.position(node.id()).is_none()) {
        return Err(Error::Layout(format!("`{}` was not placed", missing.id())));
    }

    // Declaration order for every consumer.
    grid.positions
        .sort_by_cached_key(|id, _| graph.position(*id).unwrap_or(usize::MAX));

    debug!(
        columns = grid.column_count(),
        rows = grid.row_count();
        "Grid placed"
    );
    Ok(grid)
}

/// Places one component starting at `column_offset`; returns its width in
/// columns.
fn place_component(
    graph: &Graph,
    layering: &Layering,
    component: &Component,
    column_offset: usize,
    grid: &mut Grid,
) -> Result<usize, Error> {
    let mut columns: Vec<Vec<Id>> = Vec::new();
    for node in component.nodes() {
        let layer = layering.layer(*node).unwrap_or_default();
        if columns.len() <= layer {
            columns.resize_with(layer + 1, Vec::new);
        }
        columns[layer].push(*node);
    }

    for (layer, members) in columns.iter().enumerate() {
        let column = column_offset + layer;

        let mut order: Vec<(usize, (usize, usize), usize, Id)> = members
            .iter()
            .map(|node| {
                let (candidate, anchor) = candidate_row(graph, layering, grid, *node, column);
                let position = graph.position(*node).unwrap_or(usize::MAX);
                (candidate, anchor, position, *node)
            })
            .collect();
        order.sort_by_key(|(candidate, anchor, position, _)| (*candidate, *anchor, *position));

        let mut previous: Option<usize> = None;
        for (candidate, _, _, node) in order {
            let row = previous.map_or(candidate, |prev| candidate.max(prev + 1));
            grid.insert(node, GridPosition::new(column, row))?;
            previous = Some(row);
        }
    }

    Ok(columns.len())
}

/// Candidate row and sort anchor of `node` placed in `column`.
fn candidate_row(
    graph: &Graph,
    layering: &Layering,
    grid: &Grid,
    node: Id,
    column: usize,
) -> (usize, (usize, usize)) {
    // (predecessor row, offset among its siblings, predecessor fans out)
    let mut proposals: Vec<(usize, usize, bool)> = graph
        .incoming(node)
        .filter_map(|edge| {
            let source = edge.source();
            let position = grid.position(source)?;
            if position.column >= column {
                return None;
            }
            let targets = layering.forward_targets(graph, source);
            let fans_out = targets.len() >= 2;
            let offset = if fans_out {
                targets.iter().position(|target| *target == node).unwrap_or(0)
            } else {
                0
            };
            Some((position.row, offset, fans_out))
        })
        .collect();

    if proposals.is_empty() {
        let anchor = if layering.is_unreachable(node) { 1 } else { 0 };
        return (0, (usize::MAX, anchor));
    }

    proposals.sort_unstable();
    proposals.dedup();
    let anchor = (proposals[0].0, proposals[0].1);

    // Fan-out siblings follow their gateway's declared order; other
    // predecessors do not move them.
    if let Some((row, offset, _)) = proposals.iter().find(|(_, _, fans_out)| *fans_out) {
        return (row + offset, anchor);
    }

    let mut rows: Vec<usize> = proposals.iter().map(|(row, _, _)| *row).collect();
    rows.sort_unstable();
    (rows[(rows.len() - 1) / 2], anchor)
}

/// Pixel geometry of grid cells.
///
/// Every cell is [`ElementKind::cell_size`] large; an element is centred
/// in its cell with its kind's fixed size.
#[derive(Debug, Clone, Copy)]
pub struct CellMetrics {
    cell: Size,
    config: LayoutConfig,
}

impl CellMetrics {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            cell: ElementKind::cell_size(),
            config,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn column_left(&self, column: usize) -> f32 {
        self.config.padding() + column as f32 * (self.cell.width() + self.config.horizontal_gap())
    }

    pub fn column_right(&self, column: usize) -> f32 {
        self.column_left(column) + self.cell.width()
    }

    pub fn row_top(&self, row: usize) -> f32 {
        self.config.padding() + row as f32 * (self.cell.height() + self.config.vertical_gap())
    }

    pub fn row_bottom(&self, row: usize) -> f32 {
        self.row_top(row) + self.cell.height()
    }

    pub fn row_center(&self, row: usize) -> f32 {
        self.row_top(row) + self.cell.height() / 2.0
    }

    /// Middle of the gap right of `column`.
    pub fn gap_right_of(&self, column: usize) -> f32 {
        self.column_right(column) + self.config.horizontal_gap() / 2.0
    }

    /// Middle of the gap left of `column`. Lies inside the padding for
    /// column 0.
    pub fn gap_left_of(&self, column: usize) -> f32 {
        let gap = if column == 0 {
            self.config.padding()
        } else {
            self.config.horizontal_gap()
        };
        self.column_left(column) - gap / 2.0
    }

    /// Middle of the gap below `row`.
    pub fn gap_below(&self, row: usize) -> f32 {
        self.row_bottom(row) + self.config.vertical_gap() / 2.0
    }

    pub fn center(&self, position: GridPosition) -> Point {
        Point::new(
            self.column_left(position.column) + self.cell.width() / 2.0,
            self.row_center(position.row),
        )
    }

    /// Bounds of an element of `kind` placed at `position`.
    pub fn bounds(&self, kind: ElementKind, position: GridPosition) -> Bounds {
        Bounds::new_from_center(self.center(position), kind.size())
    }
}

/// Pixel bounds of every placed node, in declaration order.
pub fn to_bounds(graph: &Graph, grid: &Grid, metrics: &CellMetrics) -> IndexMap<Id, Bounds> {
    graph
        .nodes()
        .filter_map(|node| {
            let position = grid.position(node.id())?;
            Some((node.id(), metrics.bounds(node.kind(), position)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::process::{FlowElement, ProcessDefinition, SequenceFlow};

    use super::*;
    use crate::layout::layering::assign_layers;

    fn graph(nodes: &[(&str, ElementKind)], flows: &[(&str, &str)]) -> Graph {
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
        Graph::from_process(&process).unwrap()
    }

    fn tasks(ids: &[&'static str]) -> Vec<(&'static str, ElementKind)> {
        ids.iter().map(|id| (*id, ElementKind::Task)).collect()
    }

    fn cell(grid: &Grid, id: &str) -> (usize, usize) {
        let position = grid.position(Id::new(id)).unwrap();
        (position.column(), position.row())
    }

    #[test]
    fn test_chain_stays_on_one_row() {
        let g = graph(&tasks(&["a", "b", "c"]), &[("a", "b"), ("b", "c")]);
        let grid = place(&g, &assign_layers(&g)).unwrap();

        assert_eq!(cell(&grid, "a"), (0, 0));
        assert_eq!(cell(&grid, "b"), (1, 0));
        assert_eq!(cell(&grid, "c"), (2, 0));
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.row_count(), 1);
    }

    #[test]
    fn test_fan_out_and_merge() {
        let g = graph(
            &tasks(&["s", "gw", "x", "y", "z", "join"]),
            &[
                ("s", "gw"),
                ("gw", "x"),
                ("gw", "y"),
                ("gw", "z"),
                ("x", "join"),
                ("y", "join"),
                ("z", "join"),
            ],
        );
        let grid = place(&g, &assign_layers(&g)).unwrap();

        assert_eq!(cell(&grid, "gw"), (1, 0));
        assert_eq!(cell(&grid, "x"), (2, 0));
        assert_eq!(cell(&grid, "y"), (2, 1));
        assert_eq!(cell(&grid, "z"), (2, 2));
        // Median of rows 0, 1, 2.
        assert_eq!(cell(&grid, "join"), (3, 1));
    }

    #[test]
    fn test_fan_out_order_beats_other_predecessors() {
        // gw fans out to s1 and s2; p and q also feed s1 from further down.
        let g = graph(
            &tasks(&["gw", "r", "p", "q", "s1", "s2"]),
            &[
                ("gw", "s1"),
                ("gw", "s2"),
                ("r", "s2"),
                ("p", "s1"),
                ("q", "s1"),
            ],
        );
        let grid = place(&g, &assign_layers(&g)).unwrap();

        assert_eq!(cell(&grid, "q"), (0, 3));
        assert_eq!(cell(&grid, "s1"), (1, 0));
        assert_eq!(cell(&grid, "s2"), (1, 1));
    }

    #[test]
    fn test_collision_pushes_down() {
        // Two roots both want row 0 of column 0; both successors want row 0
        // of column 1.
        let g = graph(&tasks(&["a", "b", "c"]), &[("a", "c"), ("b", "c")]);
        let grid = place(&g, &assign_layers(&g)).unwrap();

        assert_eq!(cell(&grid, "a"), (0, 0));
        assert_eq!(cell(&grid, "b"), (0, 1));
        assert_eq!(cell(&grid, "c"), (1, 0));
    }

    #[test]
    fn test_components_get_disjoint_columns() {
        let g = graph(&tasks(&["a", "b", "c", "d"]), &[("a", "b"), ("c", "d")]);
        let grid = place(&g, &assign_layers(&g)).unwrap();

        assert_eq!(cell(&grid, "a"), (0, 0));
        assert_eq!(cell(&grid, "b"), (1, 0));
        assert_eq!(cell(&grid, "c"), (2, 0));
        assert_eq!(cell(&grid, "d"), (3, 0));
    }

    #[test]
    fn test_wide_layer_has_unique_rows() {
        let names: Vec<String> = (0..60).map(|i| format!("n{i}")).collect();
        let mut nodes = vec![("root", ElementKind::StartEvent)];
        nodes.extend(names.iter().map(|name| (name.as_str(), ElementKind::Task)));
        let flows: Vec<(&str, &str)> = names.iter().map(|name| ("root", name.as_str())).collect();

        let g = graph(&nodes, &flows);
        let grid = place(&g, &assign_layers(&g)).unwrap();

        let mut rows: Vec<usize> = names.iter().map(|name| cell(&grid, name).1).collect();
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 60);
        assert_eq!(grid.bottom_row(1), Some(59));
    }

    #[test]
    fn test_metrics() {
        let metrics = CellMetrics::new(LayoutConfig::default());

        // cell 100x80, gaps 80/50, padding 40
        assert_eq!(metrics.column_left(0), 40.0);
        assert_eq!(metrics.column_left(1), 220.0);
        assert_eq!(metrics.row_top(1), 170.0);
        assert_eq!(metrics.gap_right_of(0), 180.0);
        assert_eq!(metrics.gap_below(0), 145.0);
        assert_eq!(metrics.center(GridPosition::new(1, 1)), Point::new(270.0, 210.0));

        let bounds = metrics.bounds(ElementKind::StartEvent, GridPosition::new(0, 0));
        assert_eq!(bounds.min_x(), 72.0);
        assert_eq!(bounds.width(), 36.0);
    }
}
