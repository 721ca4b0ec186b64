//! Graph structures built from a process definition.

mod graph;

pub use graph::{Component, Edge, ElementRef, Graph, GraphError, Node};
