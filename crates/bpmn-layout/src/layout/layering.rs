//! Layer assignment.
//!
//! Each component is ranked independently:
//!
//! 1. A depth-first traversal from the component roots marks every edge that
//!    reaches a node still on the traversal stack as a back edge. Self-loops
//!    are back edges by this rule. Start nodes (no incoming flow) are walked
//!    first; nodes they do not reach are flagged unreachable, then walked
//!    from the fallback roots of their cycles.
//! 2. Longest-path ranking (Kahn order) over the remaining edges: a node's
//!    layer is one more than its deepest predecessor. Roots sit in layer 0.
//!
//! Every node is reachable from some root, so every non-back edge moves at
//! least one layer to the right, unreachable nodes included.
//!
//! The traversal keeps its visit state in a map beside the graph and visits
//! each edge once, so it terminates for any number of cycles.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexSet;
use log::{debug, trace};

use bpmn_layout_core::identifier::Id;

use crate::structure::{Component, Graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    OnStack,
    Done,
}

/// Result of layer assignment. Layers are local to each component; the grid
/// placer shifts components into disjoint column ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layering {
    layers: HashMap<Id, usize>,
    back_edges: IndexSet<Id>,
    unreachable: IndexSet<Id>,
}

impl Layering {
    pub fn layer(&self, node: Id) -> Option<usize> {
        self.layers.get(&node).copied()
    }

    pub fn is_back_edge(&self, edge: Id) -> bool {
        self.back_edges.contains(&edge)
    }

    /// Back edges in the order they were found.
    pub fn back_edges(&self) -> impl Iterator<Item = Id> + '_ {
        self.back_edges.iter().copied()
    }

    pub fn is_unreachable(&self, node: Id) -> bool {
        self.unreachable.contains(&node)
    }

    /// Unreachable nodes in declaration order within each component.
    pub fn unreachable(&self) -> impl Iterator<Item = Id> + '_ {
        self.unreachable.iter().copied()
    }

    /// Distinct targets of `node`'s non-back outgoing edges that lie in a
    /// later layer, in declared order.
    pub fn forward_targets(&self, graph: &Graph, node: Id) -> Vec<Id> {
        let layer = self.layer(node);
        let mut targets = Vec::new();
        for edge in graph.outgoing(node) {
            let target = edge.target();
            if self.is_back_edge(edge.id()) || self.layer(target) <= layer {
                continue;
            }
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

/// Ranks every node of `graph`.
pub fn assign_layers(graph: &Graph) -> Layering {
    let mut layering = Layering::default();
    let mut state: HashMap<Id, VisitState> = HashMap::new();

    for component in graph.components() {
        let (starts, fallbacks): (Vec<Id>, Vec<Id>) = component
            .roots()
            .iter()
            .copied()
            .partition(|root| graph.node(*root).is_some_and(|node| node.incoming().is_empty()));

        for root in &starts {
            visit(graph, *root, &mut state, &mut layering.back_edges);
        }
        let unreachable: Vec<Id> = component
            .nodes()
            .iter()
            .copied()
            .filter(|node| !state.contains_key(node))
            .collect();
        for root in &fallbacks {
            visit(graph, *root, &mut state, &mut layering.back_edges);
        }

        rank_component(graph, component, &mut layering);
        layering.unreachable.extend(unreachable);
    }

    debug!(
        nodes = layering.layers.len(),
        back_edges = layering.back_edges.len(),
        unreachable = layering.unreachable.len();
        "Layers assigned"
    );
    layering
}

/// Iterative depth-first traversal from `start`, recording back edges.
fn visit(
    graph: &Graph,
    start: Id,
    state: &mut HashMap<Id, VisitState>,
    back_edges: &mut IndexSet<Id>,
) {
    if state.contains_key(&start) {
        return;
    }

    // (node, index of the next outgoing edge to follow)
    let mut stack: Vec<(Id, usize)> = vec![(start, 0)];
    state.insert(start, VisitState::OnStack);

    while let Some((node, next)) = stack.last_mut() {
        let outgoing = graph.node(*node).map_or(&[][..], |n| n.outgoing());
        let Some(edge_id) = outgoing.get(*next).copied() else {
            state.insert(*node, VisitState::Done);
            stack.pop();
            continue;
        };
        *next += 1;

        let Some(edge) = graph.edge(edge_id) else {
            continue;
        };
        let target = edge.target();
        match state.get(&target) {
            None => {
                state.insert(target, VisitState::OnStack);
                stack.push((target, 0));
            }
            Some(VisitState::OnStack) => {
                trace!(edge:% = edge_id; "Back edge");
                back_edges.insert(edge_id);
            }
            Some(VisitState::Done) => {}
        }
    }
}

/// Longest-path ranking of one component.
fn rank_component(graph: &Graph, component: &Component, layering: &mut Layering) {
    let mut in_degree: HashMap<Id, usize> = HashMap::new();
    for node in component.nodes() {
        let degree = graph
            .incoming(*node)
            .filter(|edge| !layering.back_edges.contains(&edge.id()))
            .count();
        in_degree.insert(*node, degree);
    }

    let mut queue: VecDeque<Id> = component
        .nodes()
        .iter()
        .copied()
        .filter(|node| in_degree.get(node) == Some(&0))
        .collect();
    for node in &queue {
        layering.layers.insert(*node, 0);
    }

    while let Some(node) = queue.pop_front() {
        let layer = layering.layers.get(&node).copied().unwrap_or_default();
        for edge in graph.outgoing(node) {
            if layering.back_edges.contains(&edge.id()) {
                continue;
            }
            let target = edge.target();
            let entry = layering.layers.entry(target).or_insert(0);
            *entry = (*entry).max(layer + 1);

            if let Some(degree) = in_degree.get_mut(&target) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(target);
                }
            }
        }
    }
}
