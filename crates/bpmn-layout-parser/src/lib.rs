//! Input readers for bpmn-layout.
//!
//! Two formats are read into a [`ProcessDefinition`]:
//!
//! - BPMN 2.0 XML ([`parse_bpmn`]), keeping the original text so geometry
//!   can be written back into it.
//! - A two-file CSV description ([`parse_csv`]): one file of nodes, one of
//!   edges.
//!
//! [`read_geometry`] reads the diagram-interchange section of a BPMN
//! document back into bounds and waypoints.
//!
//! Every reader reports all the problems it finds as [`error::Diagnostic`]s
//! wrapped in one [`ParseError`].
//!
//! [`ProcessDefinition`]: bpmn_layout_core::process::ProcessDefinition

pub mod bpmn;
pub mod csv;
pub mod error;
mod span;

pub use bpmn::{DiagramGeometry, parse_bpmn, read_geometry};
pub use csv::{parse_csv, parse_csv_edges, parse_csv_nodes};
pub use error::ParseError;
pub use span::Span;
