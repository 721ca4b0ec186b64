//! bpmn-layout - Automatic layout for BPMN process diagrams.
//!
//! Reads a process description without coordinates, places every element on
//! a left-to-right layered grid, routes every sequence flow, and writes the
//! result as BPMN diagram interchange, SVG, or a character drawing.
//!
//! The stages run strictly in order and each returns a new value:
//!
//! 1. [`structure::Graph`] - directed graph built from a
//!    [`ProcessDefinition`](bpmn_layout_core::process::ProcessDefinition)
//! 2. [`layout::layering`] - longest-path layers, with back edges found by a
//!    depth-first traversal
//! 3. [`layout::grid`] - one row per node in each column, then pixel bounds
//! 4. [`layout::routing`] - orthogonal waypoints for every flow
//!
//! [`AutoLayout`] runs the whole pipeline.

pub mod config;
pub mod export;
pub mod layout;
pub mod structure;

mod error;
mod format;

pub use bpmn_layout_core::{color, geometry, identifier, process};

pub use error::Error;
pub use format::{ExportFormat, Input, InputFormat, UnknownFormatError};

use log::{debug, info, trace};

use bpmn_layout_core::process::ProcessDefinition;
use bpmn_layout_parser::{parse_bpmn, parse_csv_edges, parse_csv_nodes};

use config::AppConfig;
use export::{Exporter, ascii::AsciiExporter, bpmn::BpmnExporter, svg::SvgExporter};
use layout::{Engine, Layout};
use structure::Graph;

/// Entry point for reading, laying out and rendering processes.
///
/// # Examples
///
/// ```
/// use bpmn_layout::{AutoLayout, ExportFormat, config::AppConfig};
///
/// let nodes = "start,start,\nwork,task,Do it\nend,end,\n";
/// let edges = "start,work\nwork,end\n";
///
/// let auto_layout = AutoLayout::new(AppConfig::default());
/// let process = auto_layout.parse_csv(nodes, edges).unwrap();
/// let layout = auto_layout.layout(&process).unwrap();
/// let svg = auto_layout.render(&process, &layout, ExportFormat::Svg).unwrap();
/// assert!(svg.contains("Do it"));
/// ```
#[derive(Debug, Default)]
pub struct AutoLayout {
    config: AppConfig,
}

impl AutoLayout {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read a BPMN 2.0 XML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] carrying every problem found and the source
    /// text.
    pub fn parse_bpmn(&self, source: &str) -> Result<ProcessDefinition, Error> {
        info!(bytes = source.len(); "Reading BPMN");
        let process = parse_bpmn(source).map_err(|err| Error::new_parse_error(err, source))?;
        debug!(
            elements = process.elements().len(),
            flows = process.flows().len();
            "BPMN read"
        );
        Ok(process)
    }

    /// Read a node file and an edge file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the text of whichever file is at fault.
    /// Edges are not read when the node file has errors.
    pub fn parse_csv(&self, nodes: &str, edges: &str) -> Result<ProcessDefinition, Error> {
        info!("Reading CSV");
        let mut process = parse_csv_nodes(nodes).map_err(|err| Error::new_parse_error(err, nodes))?;
        parse_csv_edges(edges, &mut process).map_err(|err| Error::new_parse_error(err, edges))?;
        debug!(
            elements = process.elements().len(),
            flows = process.flows().len();
            "CSV read"
        );
        Ok(process)
    }

    /// Build the graph of `process` and lay it out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] for a flow referencing an unknown element or
    /// a duplicate id, and [`Error::Layout`] if an internal invariant fails.
    pub fn layout(&self, process: &ProcessDefinition) -> Result<Layout, Error> {
        let graph = Graph::from_process(process)?;
        trace!(graph:?; "Graph");
        Engine::new()
            .with_config(*self.config.layout())
            .calculate(graph)
    }

    /// Render a finished layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if the exporter fails, for example because
    /// of an invalid color in the style configuration.
    pub fn render(
        &self,
        process: &ProcessDefinition,
        layout: &Layout,
        format: ExportFormat,
    ) -> Result<String, Error> {
        info!(format:% = format; "Rendering");
        let style = self.config.style();
        let output = match format {
            ExportFormat::Bpmn => BpmnExporter::new().export(process, layout)?,
            ExportFormat::Svg => SvgExporter::new(style).export(process, layout)?,
            ExportFormat::Ascii => AsciiExporter::new(style.ascii()).export(process, layout)?,
        };
        Ok(output)
    }

    /// Read, lay out and render in one call.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::parse_bpmn`], [`Self::parse_csv`],
    /// [`Self::layout`] or [`Self::render`].
    pub fn generate(&self, input: Input<'_>, format: ExportFormat) -> Result<String, Error> {
        let process = match input {
            Input::Bpmn(source) => self.parse_bpmn(source)?,
            Input::Csv { nodes, edges } => self.parse_csv(nodes, edges)?,
        };
        let layout = self.layout(&process)?;
        self.render(&process, &layout, format)
    }
}
