//! BPMN 2.0 XML reader.
//!
//! [`parse_bpmn`] reads the semantic part of a BPMN document (flow nodes and
//! sequence flows of every `process`) into a [`ProcessDefinition`]. Any
//! existing diagram-interchange section is ignored; the layout engine
//! computes fresh geometry. The original text is kept on the definition so
//! the BPMN exporter can splice the new geometry back into it.
//!
//! [`read_geometry`] reads only the diagram-interchange section: shape bounds
//! and edge waypoints keyed by the element they belong to.
//!
//! Elements are matched by local name, so documents using a `bpmn:`,
//! `bpmn2:` or default namespace prefix are all accepted.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};
use roxmltree::{Document, Node};

use bpmn_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    process::{ElementKind, FlowElement, ProcessDefinition, SequenceFlow},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Process children that are not flow nodes.
const NON_FLOW_NODE_TAGS: &[&str] = &[
    "sequenceFlow",
    "laneSet",
    "extensionElements",
    "documentation",
    "ioSpecification",
    "property",
    "textAnnotation",
    "association",
    "group",
    "dataObject",
    "dataObjectReference",
    "dataStoreReference",
    "dataInputAssociation",
    "dataOutputAssociation",
];

/// Reads every process of a BPMN document into one [`ProcessDefinition`].
///
/// Flow nodes and sequence flows of all processes are merged in document
/// order; the definition takes its id and name from the first process.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every problem found:
/// malformed XML (`E001`), missing `id`/`sourceRef`/`targetRef` (`E002`),
/// duplicate ids (`E003`), no process (`E004`), or a root element other than
/// `definitions` (`E005`).
///
/// # Examples
///
/// ```
/// use bpmn_layout_parser::parse_bpmn;
///
/// let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
///   <process id="P">
///     <startEvent id="start"><outgoing>f1</outgoing></startEvent>
///     <endEvent id="end"><incoming>f1</incoming></endEvent>
///     <sequenceFlow id="f1" sourceRef="start" targetRef="end" />
///   </process>
/// </definitions>"#;
///
/// let process = parse_bpmn(xml).expect("valid BPMN");
/// assert_eq!(process.elements().len(), 2);
/// assert_eq!(process.flows().len(), 1);
/// ```
pub fn parse_bpmn(source: &str) -> Result<ProcessDefinition, ParseError> {
    let doc = Document::parse(source).map_err(|err| xml_error(source, &err))?;
    let root = doc.root_element();

    if root.tag_name().name() != "definitions" {
        return Err(Diagnostic::error(format!(
            "expected a BPMN `definitions` root element, found `{}`",
            root.tag_name().name()
        ))
        .with_code(ErrorCode::E005)
        .with_label(start_tag_span(source, root), "document root")
        .into());
    }

    let processes: Vec<Node> = root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "process")
        .collect();

    let Some(first) = processes.first() else {
        return Err(Diagnostic::error("document contains no process")
            .with_code(ErrorCode::E004)
            .with_label(start_tag_span(source, root), "no `process` inside this element")
            .into());
    };

    let mut collector = DiagnosticCollector::new();
    let process_id = required_attribute(source, *first, "id", &mut collector).unwrap_or("");
    let mut definition = ProcessDefinition::new(Id::new(process_id));
    if let Some(name) = first.attribute("name") {
        definition = definition.with_name(name);
    }

    let mut reader = ProcessReader {
        source,
        collector,
        seen_elements: HashMap::new(),
        seen_flows: HashMap::new(),
    };

    for process in &processes {
        for child in process.children().filter(Node::is_element) {
            let tag = child.tag_name().name();
            if tag == "sequenceFlow" {
                if let Some(flow) = reader.read_flow(child) {
                    definition.add_flow(flow);
                }
            } else if NON_FLOW_NODE_TAGS.contains(&tag) {
                trace!(tag; "Skipping non flow node");
            } else if let Some(element) = reader.read_element(child) {
                definition.add_element(element);
            }
        }
    }

    reader.collector.finish()?;

    debug!(
        processes = processes.len(),
        elements = definition.elements().len(),
        flows = definition.flows().len();
        "BPMN document read"
    );

    Ok(definition.with_document(source))
}

struct ProcessReader<'a> {
    source: &'a str,
    collector: DiagnosticCollector,
    seen_elements: HashMap<&'a str, Span>,
    seen_flows: HashMap<&'a str, Span>,
}

impl<'a> ProcessReader<'a> {
    fn read_element(&mut self, node: Node<'a, 'a>) -> Option<FlowElement> {
        let id = required_attribute(self.source, node, "id", &mut self.collector)?;
        let span = start_tag_span(self.source, node);
        if !check_unique(&mut self.seen_elements, id, span, &mut self.collector) {
            return None;
        }

        let tag = node.tag_name().name();
        let kind = ElementKind::from_tag(tag);
        if kind == ElementKind::Other {
            debug!(id, tag; "Element laid out with the generic shape");
        }

        let mut element = FlowElement::new(Id::new(id), kind, tag);
        if let Some(name) = node.attribute("name") {
            element = element.with_name(name);
        }

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "incoming" => {
                    if let Some(flow) = reference_text(child) {
                        element.add_incoming(Id::new(flow));
                    }
                }
                "outgoing" => {
                    if let Some(flow) = reference_text(child) {
                        element.add_outgoing(Id::new(flow));
                    }
                }
                "extensionElements" => {
                    element = element.with_extension(&self.source[child.range()]);
                }
                _ => {}
            }
        }

        Some(element)
    }

    fn read_flow(&mut self, node: Node<'a, 'a>) -> Option<SequenceFlow> {
        let id = required_attribute(self.source, node, "id", &mut self.collector);
        let source_ref = required_attribute(self.source, node, "sourceRef", &mut self.collector);
        let target_ref = required_attribute(self.source, node, "targetRef", &mut self.collector);
        let (id, source_ref, target_ref) = (id?, source_ref?, target_ref?);

        let span = start_tag_span(self.source, node);
        if !check_unique(&mut self.seen_flows, id, span, &mut self.collector) {
            return None;
        }

        let mut flow = SequenceFlow::new(Id::new(id), Id::new(source_ref), Id::new(target_ref));
        if let Some(name) = node.attribute("name").filter(|name| !name.is_empty()) {
            flow = flow.with_name(name);
        }
        let condition = node
            .children()
            .find(|child| child.is_element() && child.tag_name().name() == "conditionExpression")
            .and_then(|child| child.text())
            .map(str::trim)
            .filter(|text| !text.is_empty());
        if let Some(condition) = condition {
            flow = flow.with_condition(condition);
        }

        Some(flow)
    }
}

fn check_unique<'a>(
    seen: &mut HashMap<&'a str, Span>,
    id: &'a str,
    span: Span,
    collector: &mut DiagnosticCollector,
) -> bool {
    if let Some(first) = seen.get(id) {
        collector.emit(
            Diagnostic::error(format!("duplicate id `{id}`"))
                .with_code(ErrorCode::E003)
                .with_label(span, "redefined here")
                .with_secondary_label(*first, "first defined here")
                .with_help("element and flow ids must be unique within the document"),
        );
        return false;
    }
    seen.insert(id, span);
    true
}

fn required_attribute<'a>(
    source: &str,
    node: Node<'a, 'a>,
    name: &str,
    collector: &mut DiagnosticCollector,
) -> Option<&'a str> {
    match node.attribute(name) {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => {
            collector.emit(
                Diagnostic::error(format!(
                    "`{}` is missing the `{name}` attribute",
                    node.tag_name().name()
                ))
                .with_code(ErrorCode::E002)
                .with_label(start_tag_span(source, node), format!("`{name}` required here")),
            );
            None
        }
    }
}

fn reference_text<'a>(node: Node<'a, 'a>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|text| !text.is_empty())
}

/// Span covering the start tag of `node`, e.g. `<task id="a" name="b">`.
fn start_tag_span(source: &str, node: Node) -> Span {
    let range = node.range();
    let end = source[range.clone()]
        .find('>')
        .map_or(range.end, |pos| range.start + pos + 1);
    Span::new(range.start..end)
}

/// Converts a roxmltree error into an `E001` diagnostic pointing at the
/// reported row/column.
fn xml_error(source: &str, err: &roxmltree::Error) -> ParseError {
    let pos = err.pos();
    let offset = offset_of(source, pos.row as usize, pos.col as usize);
    let end = source[offset..]
        .chars()
        .next()
        .map_or(offset, |ch| offset + ch.len_utf8());

    Diagnostic::error(format!("malformed XML: {err}"))
        .with_code(ErrorCode::E001)
        .with_label(Span::new(offset..end), "error occurs here")
        .into()
}

/// Byte offset of a 1-based row and character column.
fn offset_of(source: &str, row: usize, col: usize) -> usize {
    let mut line_start = 0;
    for (index, line) in source.split_inclusive('\n').enumerate() {
        if index + 1 == row {
            return line
                .char_indices()
                .nth(col.saturating_sub(1))
                .map_or(line_start + line.len(), |(pos, _)| line_start + pos);
        }
        line_start += line.len();
    }
    source.len()
}

/// Geometry read back from a diagram-interchange section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramGeometry {
    shapes: IndexMap<Id, Bounds>,
    edges: IndexMap<Id, Vec<Point>>,
}

impl DiagramGeometry {
    /// Bounds of the shape attached to `element`.
    pub fn shape(&self, element: Id) -> Option<Bounds> {
        self.shapes.get(&element).copied()
    }

    /// Waypoints of the edge attached to `flow`.
    pub fn edge(&self, flow: Id) -> Option<&[Point]> {
        self.edges.get(&flow).map(Vec::as_slice)
    }

    /// All shapes, in document order.
    pub fn shapes(&self) -> impl Iterator<Item = (Id, Bounds)> + '_ {
        self.shapes.iter().map(|(id, bounds)| (*id, *bounds))
    }

    /// All edges, in document order.
    pub fn edges(&self) -> impl Iterator<Item = (Id, &[Point])> + '_ {
        self.edges.iter().map(|(id, points)| (*id, points.as_slice()))
    }
}

/// Reads the `BPMNShape` bounds and `BPMNEdge` waypoints of a document.
///
/// # Errors
///
/// Malformed XML (`E001`), a shape or edge without `bpmnElement` (`E002`),
/// or a missing or non-numeric coordinate (`E200`).
pub fn read_geometry(source: &str) -> Result<DiagramGeometry, ParseError> {
    let doc = Document::parse(source).map_err(|err| xml_error(source, &err))?;
    let mut collector = DiagnosticCollector::new();
    let mut geometry = DiagramGeometry::default();

    for node in doc.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "BPMNShape" => {
                let Some(element) = required_attribute(source, node, "bpmnElement", &mut collector)
                else {
                    continue;
                };
                let Some(bounds_node) = child_element(node, "Bounds") else {
                    collector.emit(
                        Diagnostic::error(format!("shape for `{element}` has no bounds"))
                            .with_code(ErrorCode::E200)
                            .with_label(start_tag_span(source, node), "expected `dc:Bounds`"),
                    );
                    continue;
                };
                let x = number_attribute(source, bounds_node, "x", &mut collector);
                let y = number_attribute(source, bounds_node, "y", &mut collector);
                let width = number_attribute(source, bounds_node, "width", &mut collector);
                let height = number_attribute(source, bounds_node, "height", &mut collector);
                if let (Some(x), Some(y), Some(width), Some(height)) = (x, y, width, height) {
                    geometry.shapes.insert(
                        Id::new(element),
                        Bounds::new_from_top_left(Point::new(x, y), Size::new(width, height)),
                    );
                }
            }
            "BPMNEdge" => {
                let Some(element) = required_attribute(source, node, "bpmnElement", &mut collector)
                else {
                    continue;
                };
                let mut waypoints = Vec::new();
                for waypoint in node
                    .children()
                    .filter(|child| child.is_element() && child.tag_name().name() == "waypoint")
                {
                    let x = number_attribute(source, waypoint, "x", &mut collector);
                    let y = number_attribute(source, waypoint, "y", &mut collector);
                    if let (Some(x), Some(y)) = (x, y) {
                        waypoints.push(Point::new(x, y));
                    }
                }
                geometry.edges.insert(Id::new(element), waypoints);
            }
            _ => {}
        }
    }

    collector.finish()?;
    Ok(geometry)
}

fn child_element<'a>(node: Node<'a, 'a>, name: &str) -> Option<Node<'a, 'a>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn number_attribute(
    source: &str,
    node: Node,
    name: &str,
    collector: &mut DiagnosticCollector,
) -> Option<f32> {
    let parsed = node
        .attribute(name)
        .and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite());
    if parsed.is_none() {
        collector.emit(
            Diagnostic::error(format!(
                "`{}` has a missing or invalid `{name}` coordinate",
                node.tag_name().name()
            ))
            .with_code(ErrorCode::E200)
            .with_label(start_tag_span(source, node), "expected a number"),
        );
    }
    parsed
}
