//! Directed process graph built from a [`ProcessDefinition`].
//!
//! Nodes and edges live in a [`petgraph`] arena in declaration order. Their
//! ordered incoming/outgoing edge lists are kept on the nodes themselves
//! because petgraph does not preserve insertion order for adjacency, and the
//! declared order of a gateway's outgoing flows drives branch placement.
//!
//! Traversal state of later stages (visited flags, layers, rows) is never
//! stored here; the graph is immutable once built.

use std::collections::HashMap;

use indexmap::IndexSet;
use log::{debug, info, trace};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    unionfind::UnionFind,
};
use thiserror::Error;

use bpmn_layout_core::{
    identifier::Id,
    process::{ElementKind, ProcessDefinition},
};

/// Errors raised while building a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A flow points to a node id that is not in the process.
    #[error("flow `{edge}` references unknown element `{node}`")]
    DanglingReference { edge: Id, node: Id },

    /// Two nodes or two edges share an id.
    #[error("duplicate id `{id}`")]
    DuplicateId { id: Id },
}

/// Index of the originating element in [`ProcessDefinition::elements`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(usize);

impl ElementRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A flow node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    kind: ElementKind,
    label: Option<String>,
    outgoing: Vec<Id>,
    incoming: Vec<Id>,
    element: ElementRef,
}

impl Node {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Outgoing edge ids, ordered by the declared order hint.
    pub fn outgoing(&self) -> &[Id] {
        &self.outgoing
    }

    /// Incoming edge ids, in declaration order.
    pub fn incoming(&self) -> &[Id] {
        &self.incoming
    }

    pub fn element(&self) -> ElementRef {
        self.element
    }
}

/// A sequence flow between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: Id,
    source: Id,
    target: Id,
    label: Option<String>,
    order: Option<usize>,
}

impl Edge {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Position of this edge in its source's declared outgoing list.
    pub fn order(&self) -> Option<usize> {
        self.order
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A weakly connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    nodes: Vec<Id>,
    roots: Vec<Id>,
}

impl Component {
    /// Member nodes in declaration order.
    pub fn nodes(&self) -> &[Id] {
        &self.nodes
    }

    /// Zero in-degree nodes in declaration order, then fallback roots.
    /// Never empty.
    pub fn roots(&self) -> &[Id] {
        &self.roots
    }
}

/// The process graph handed to the layout stages.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: DiGraph<Node, Edge>,
    node_indices: HashMap<Id, NodeIndex>,
    edge_indices: HashMap<Id, EdgeIndex>,
    roots: Vec<Id>,
    components: Vec<Component>,
}

impl Graph {
    /// Builds the graph of `process`.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateId`] when two elements or two flows share an
    /// id, [`GraphError::DanglingReference`] when a flow names an element
    /// that does not exist.
    pub fn from_process(process: &ProcessDefinition) -> Result<Self, GraphError> {
        let mut inner = DiGraph::with_capacity(process.elements().len(), process.flows().len());
        let mut node_indices = HashMap::new();

        for (position, element) in process.elements().iter().enumerate() {
            let id = element.id();
            if node_indices.contains_key(&id) {
                return Err(GraphError::DuplicateId { id });
            }
            let index = inner.add_node(Node {
                id,
                kind: element.kind(),
                label: element.name().map(str::to_string),
                outgoing: Vec::new(),
                incoming: Vec::new(),
                element: ElementRef(position),
            });
            node_indices.insert(id, index);
        }

        let mut edge_indices = HashMap::new();
        for flow in process.flows() {
            let id = flow.id();
            if edge_indices.contains_key(&id) {
                return Err(GraphError::DuplicateId { id });
            }
            let endpoint = |node: Id| {
                node_indices
                    .get(&node)
                    .copied()
                    .ok_or(GraphError::DanglingReference { edge: id, node })
            };
            let source = endpoint(flow.source())?;
            let target = endpoint(flow.target())?;

            let order = process
                .elements()
                .get(inner[source].element.index())
                .and_then(|element| element.outgoing().iter().position(|out| *out == id));

            let index = inner.add_edge(
                source,
                target,
                Edge {
                    id,
                    source: flow.source(),
                    target: flow.target(),
                    label: flow.label().map(str::to_string),
                    order,
                },
            );
            edge_indices.insert(id, index);
            inner[source].outgoing.push(id);
            inner[target].incoming.push(id);
        }

        // Declared order first; flows the source does not list keep their
        // declaration order after the listed ones.
        for index in inner.node_indices() {
            let mut outgoing = std::mem::take(&mut inner[index].outgoing);
            outgoing.sort_by_key(|edge| {
                edge_indices
                    .get(edge)
                    .and_then(|edge_index| inner[*edge_index].order)
                    .unwrap_or(usize::MAX)
            });
            inner[index].outgoing = outgoing;
        }

        let mut graph = Self {
            inner,
            node_indices,
            edge_indices,
            roots: Vec::new(),
            components: Vec::new(),
        };
        graph.find_components();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            components = graph.components.len();
            "Graph built"
        );
        Ok(graph)
    }

    /// Groups nodes into weakly connected components and picks their roots.
    fn find_components(&mut self) {
        let node_count = self.inner.node_count();
        let mut union_find = UnionFind::<usize>::new(node_count);
        for edge in self.inner.edge_indices() {
            if let Some((source, target)) = self.inner.edge_endpoints(edge) {
                union_find.union(source.index(), target.index());
            }
        }

        // Members per union-find representative, in declaration order.
        let mut members: HashMap<usize, Vec<Id>> = HashMap::new();
        for index in self.inner.node_indices() {
            let representative = union_find.find(index.index());
            members
                .entry(representative)
                .or_default()
                .push(self.inner[index].id);
        }

        let natural_roots: Vec<Id> = self
            .inner
            .node_indices()
            .filter(|index| self.inner[*index].incoming.is_empty())
            .map(|index| self.inner[index].id)
            .collect();

        let mut roots_of: HashMap<usize, Vec<Id>> = HashMap::new();
        for root in &natural_roots {
            let representative = union_find.find(self.node_indices[root].index());
            roots_of.entry(representative).or_default().push(*root);
        }

        // Every node must be reachable from a root. A strongly connected
        // component no edge enters from outside is only reachable from
        // itself, so each such component without a zero in-degree node gets
        // one fallback root. Fallbacks follow the natural roots, ordered by
        // their component's first declared node.
        let fallback_roots = self.fallback_roots();
        for fallback in &fallback_roots {
            debug!(root:% = fallback; "Cycle has no start node, using fallback root");
            let representative = union_find.find(self.node_indices[fallback].index());
            roots_of.entry(representative).or_default().push(*fallback);
        }

        self.roots = natural_roots.into_iter().chain(fallback_roots).collect();

        // Components in order of first discovery from the root list.
        let mut ordered: IndexSet<usize> = IndexSet::new();
        for root in &self.roots {
            ordered.insert(union_find.find(self.node_indices[root].index()));
        }

        self.components = ordered
            .into_iter()
            .map(|representative| Component {
                nodes: members.remove(&representative).unwrap_or_default(),
                roots: roots_of.remove(&representative).unwrap_or_default(),
            })
            .collect();

        trace!(roots:? = self.roots; "Roots selected");
    }

    /// One root per source strongly connected component that lacks a zero
    /// in-degree node: the member with the fewest incoming edges, then the
    /// lowest id.
    fn fallback_roots(&self) -> Vec<Id> {
        let sccs = tarjan_scc(&self.inner);
        let mut scc_of = vec![0; self.inner.node_count()];
        for (scc, members) in sccs.iter().enumerate() {
            for index in members {
                scc_of[index.index()] = scc;
            }
        }

        let mut entered = vec![false; sccs.len()];
        for edge in self.inner.edge_indices() {
            if let Some((source, target)) = self.inner.edge_endpoints(edge) {
                let (from, to) = (scc_of[source.index()], scc_of[target.index()]);
                if from != to {
                    entered[to] = true;
                }
            }
        }

        let mut sources: Vec<&Vec<NodeIndex>> = sccs
            .iter()
            .enumerate()
            .filter(|(scc, members)| {
                !entered[*scc]
                    && members
                        .iter()
                        .all(|index| !self.inner[*index].incoming.is_empty())
            })
            .map(|(_, members)| members)
            .collect();
        sources.sort_by_key(|members| members.iter().map(|index| index.index()).min());

        sources
            .into_iter()
            .filter_map(|members| {
                members
                    .iter()
                    .map(|index| self.inner[*index].id)
                    .min_by(|a, b| {
                        self.in_degree(*a)
                            .cmp(&self.in_degree(*b))
                            .then_with(|| a.cmp(b))
                    })
            })
            .collect()
    }

    fn in_degree(&self, id: Id) -> usize {
        self.node(id).map_or(0, |node| node.incoming.len())
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.node_indices.get(&id).map(|index| &self.inner[*index])
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edge_indices.get(&id).map(|index| &self.inner[*index])
    }

    /// Declaration index of a node, used as the final tie-break everywhere.
    pub fn position(&self, id: Id) -> Option<usize> {
        self.node_indices.get(&id).map(|index| index.index())
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    /// All edges in declaration order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Outgoing edges of `id` in declared order.
    pub fn outgoing(&self, id: Id) -> impl Iterator<Item = &Edge> {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.outgoing.iter())
            .filter_map(|edge| self.edge(*edge))
    }

    /// Incoming edges of `id` in declaration order.
    pub fn incoming(&self, id: Id) -> impl Iterator<Item = &Edge> {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.incoming.iter())
            .filter_map(|edge| self.edge(*edge))
    }

    /// All roots: zero in-degree nodes in declaration order, then one
    /// fallback root per cycle that nothing outside it flows into. Every
    /// node is reachable from some root.
    pub fn roots(&self) -> &[Id] {
        &self.roots
    }

    /// Weakly connected components in order of first discovery from
    /// [`Graph::roots`].
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::process::{FlowElement, SequenceFlow};

    use super::*;

    fn process(nodes: &[&str], flows: &[(&str, &str, &str)]) -> ProcessDefinition {
        let mut process = ProcessDefinition::new(Id::new("p"));
        for id in nodes {
            process.add_element(FlowElement::new(Id::new(id), ElementKind::Task, "task"));
        }
        for (id, source, target) in flows {
            process.add_flow(SequenceFlow::new(Id::new(id), Id::new(source), Id::new(target)));
        }
        process
    }

    fn ids(list: &[Id]) -> Vec<String> {
        list.iter().map(Id::to_string).collect()
    }

    #[test]
    fn test_incoming_outgoing_match_flows() {
        let graph = Graph::from_process(&process(
            &["a", "b", "c"],
            &[("f1", "a", "b"), ("f2", "a", "c"), ("f3", "b", "c")],
        ))
        .unwrap();

        let a = graph.node(Id::new("a")).unwrap();
        assert_eq!(ids(a.outgoing()), vec!["f1", "f2"]);
        assert!(a.incoming().is_empty());

        let c = graph.node(Id::new("c")).unwrap();
        assert_eq!(ids(c.incoming()), vec!["f2", "f3"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_declared_outgoing_order_wins() {
        let mut definition = ProcessDefinition::new(Id::new("p"));
        let mut gateway =
            FlowElement::new(Id::new("gw"), ElementKind::ExclusiveGateway, "exclusiveGateway");
        gateway.add_outgoing(Id::new("f_c"));
        gateway.add_outgoing(Id::new("f_b"));
        definition.add_element(gateway);
        definition.add_element(FlowElement::new(Id::new("b"), ElementKind::Task, "task"));
        definition.add_element(FlowElement::new(Id::new("c"), ElementKind::Task, "task"));
        definition.add_element(FlowElement::new(Id::new("d"), ElementKind::Task, "task"));
        definition.add_flow(SequenceFlow::new(Id::new("f_d"), Id::new("gw"), Id::new("d")));
        definition.add_flow(SequenceFlow::new(Id::new("f_b"), Id::new("gw"), Id::new("b")));
        definition.add_flow(SequenceFlow::new(Id::new("f_c"), Id::new("gw"), Id::new("c")));

        let graph = Graph::from_process(&definition).unwrap();
        let gateway = graph.node(Id::new("gw")).unwrap();

        // Unlisted `f_d` goes last.
        assert_eq!(ids(gateway.outgoing()), vec!["f_c", "f_b", "f_d"]);
        assert_eq!(graph.edge(Id::new("f_b")).unwrap().order(), Some(1));
        assert_eq!(graph.edge(Id::new("f_d")).unwrap().order(), None);
    }

    #[test]
    fn test_dangling_reference() {
        let err = Graph::from_process(&process(&["a"], &[("f1", "a", "ghost")])).unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingReference {
                edge: Id::new("f1"),
                node: Id::new("ghost"),
            }
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let err = Graph::from_process(&process(&["a", "a"], &[])).unwrap_err();
        assert_eq!(err, GraphError::DuplicateId { id: Id::new("a") });

        let err = Graph::from_process(&process(&["a", "b"], &[("f", "a", "b"), ("f", "b", "a")]))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateId { id: Id::new("f") });
    }

    #[test]
    fn test_roots_and_components() {
        let graph = Graph::from_process(&process(
            &["x", "s2", "s1", "y"],
            &[("f1", "s1", "y"), ("f2", "s2", "x")],
        ))
        .unwrap();

        assert_eq!(ids(graph.roots()), vec!["s2", "s1"]);
        let components = graph.components();
        assert_eq!(components.len(), 2);
        assert_eq!(ids(components[0].nodes()), vec!["x", "s2"]);
        assert_eq!(ids(components[1].nodes()), vec!["s1", "y"]);
    }

    #[test]
    fn test_fallback_root_for_cycle() {
        let graph = Graph::from_process(&process(
            &["c", "b", "a"],
            &[("f1", "a", "b"), ("f2", "b", "c"), ("f3", "c", "a"), ("f4", "b", "a")],
        ))
        .unwrap();

        // `a` has two incoming flows, `b` and `c` one each; `b` < `c`.
        assert_eq!(ids(graph.roots()), vec!["b"]);
        assert_eq!(ids(graph.components()[0].roots()), vec!["b"]);
    }

    #[test]
    fn test_fallback_root_sits_in_the_entry_cycle() {
        // {a, b} and {c, d} are cycles; only c -> a joins them. Every node
        // has two incoming flows, so `a` would win on id alone.
        let graph = Graph::from_process(&process(
            &["a", "b", "c", "d"],
            &[
                ("f1", "a", "b"),
                ("f2", "a", "b"),
                ("f3", "b", "a"),
                ("f4", "c", "a"),
                ("f5", "c", "d"),
                ("f6", "c", "d"),
                ("f7", "d", "c"),
                ("f8", "d", "c"),
            ],
        ))
        .unwrap();

        assert_eq!(ids(graph.roots()), vec!["c"]);
        assert_eq!(graph.components().len(), 1);
    }

    #[test]
    fn test_cycle_beside_a_start_node_gets_a_root() {
        let graph = Graph::from_process(&process(
            &["start", "x", "p", "q"],
            &[("f1", "start", "x"), ("f2", "p", "q"), ("f3", "q", "p"), ("f4", "q", "x")],
        ))
        .unwrap();

        assert_eq!(ids(graph.roots()), vec!["start", "p"]);
        assert_eq!(ids(graph.components()[0].roots()), vec!["start", "p"]);
    }

    #[test]
    fn test_isolated_node_is_its_own_component() {
        let graph = Graph::from_process(&process(&["a", "lonely"], &[("f", "a", "a")])).unwrap();

        assert_eq!(ids(graph.roots()), vec!["lonely", "a"]);
        assert_eq!(graph.components().len(), 2);
        assert_eq!(ids(graph.components()[0].nodes()), vec!["lonely"]);
        assert!(graph.edge(Id::new("f")).unwrap().is_self_loop());
    }

    #[test]
    fn test_empty_process() {
        let graph = Graph::from_process(&process(&[], &[])).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.roots().is_empty());
        assert!(graph.components().is_empty());
    }
}
