//! BPMN diagram-interchange export.
//!
//! The layout is written as one `bpmndi:BPMNDiagram` holding a shape per
//! element and an edge per sequence flow. When the process came from a BPMN
//! document, the diagram is spliced into that text: existing `BPMNDiagram`
//! elements are replaced by byte range, and every other byte is kept. A
//! process without a document (read from CSV) gets a complete
//! `bpmn:definitions` document built from its semantic model.
//!
//! Coordinates use the shortest float formatting that reads back to the same
//! value, so [`bpmn_layout_parser::read_geometry`] recovers them exactly.

use std::fmt::Write as _;

use log::{debug, info};
use roxmltree::Document;

use bpmn_layout_core::process::{ElementKind, ProcessDefinition};

use super::{Error, Exporter};
use crate::layout::Layout;

const MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
const BPMNDI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Writes BPMN XML carrying the computed geometry.
#[derive(Debug, Default)]
pub struct BpmnExporter;

impl BpmnExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for BpmnExporter {
    fn export(&self, process: &ProcessDefinition, layout: &Layout) -> Result<String, Error> {
        let diagram = diagram(process, layout)?;
        let output = match process.document() {
            Some(document) => splice(document, &diagram)?,
            None => synthesize(process, &diagram)?,
        };
        info!(bytes = output.len(); "BPMN exported");
        Ok(output)
    }
}

/// The `BPMNDiagram` element, indented for a child of the root. The first
/// line carries no indentation.
fn diagram(process: &ProcessDefinition, layout: &Layout) -> Result<String, Error> {
    let mut out = String::new();
    writeln!(
        out,
        r#"<bpmndi:BPMNDiagram xmlns:bpmndi="{BPMNDI_NS}" xmlns:dc="{DC_NS}" xmlns:di="{DI_NS}" id="BPMNDiagram_1">"#
    )?;
    writeln!(
        out,
        r#"    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="{}">"#,
        escape(&process.id().to_string())
    )?;

    for element in process.elements() {
        let Some(bounds) = layout.bounds(element.id()) else {
            continue;
        };
        let id = escape(&element.id().to_string());
        let marker = if element.kind() == ElementKind::ExclusiveGateway {
            r#" isMarkerVisible="true""#
        } else {
            ""
        };
        writeln!(
            out,
            r#"      <bpmndi:BPMNShape id="{id}_di" bpmnElement="{id}"{marker}>"#
        )?;
        writeln!(
            out,
            r#"        <dc:Bounds x="{}" y="{}" width="{}" height="{}" />"#,
            bounds.min_x(),
            bounds.min_y(),
            bounds.width(),
            bounds.height()
        )?;
        writeln!(out, "      </bpmndi:BPMNShape>")?;
    }

    for flow in process.flows() {
        let Some(route) = layout.route(flow.id()) else {
            continue;
        };
        let id = escape(&flow.id().to_string());
        writeln!(out, r#"      <bpmndi:BPMNEdge id="{id}_di" bpmnElement="{id}">"#)?;
        for point in route.waypoints() {
            writeln!(out, r#"        <di:waypoint x="{}" y="{}" />"#, point.x(), point.y())?;
        }
        writeln!(out, "      </bpmndi:BPMNEdge>")?;
    }

    writeln!(out, "    </bpmndi:BPMNPlane>")?;
    write!(out, "  </bpmndi:BPMNDiagram>")?;
    Ok(out)
}

/// Replaces the diagram section of `document`, keeping everything else.
fn splice(document: &str, diagram: &str) -> Result<String, Error> {
    let doc = Document::parse(document)
        .map_err(|err| Error::Render(format!("original document is not valid XML: {err}")))?;
    let root = doc.root_element();

    let existing: Vec<_> = root
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == "BPMNDiagram")
        .map(|child| child.range())
        .collect();

    let mut output = document.to_string();
    if existing.is_empty() {
        let range = root.range();
        let close = document[range.clone()]
            .rfind("</")
            .map(|offset| range.start + offset)
            .ok_or_else(|| Error::Render("root element has no closing tag".to_string()))?;
        output.insert_str(close, &format!("  {diagram}\n"));
        debug!("Diagram section added");
    } else {
        // Back to front so earlier ranges stay valid; only the first
        // diagram survives.
        for (index, range) in existing.iter().enumerate().rev() {
            let replacement = if index == 0 { diagram } else { "" };
            output.replace_range(range.clone(), replacement);
        }
        debug!(replaced = existing.len(); "Diagram section replaced");
    }
    Ok(output)
}

/// A complete document for a process that has no source text.
fn synthesize(process: &ProcessDefinition, diagram: &str) -> Result<String, Error> {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<bpmn:definitions xmlns:bpmn="{MODEL_NS}" xmlns:xsi="{XSI_NS}" id="Definitions_1" targetNamespace="http://bpmn.io/schema/bpmn">"#
    )?;

    write!(
        out,
        r#"  <bpmn:process id="{}" isExecutable="false""#,
        escape(&process.id().to_string())
    )?;
    if let Some(name) = process.name() {
        write!(out, r#" name="{}""#, escape(name))?;
    }
    writeln!(out, ">")?;

    for element in process.elements() {
        let tag = element.tag();
        write!(
            out,
            r#"    <bpmn:{tag} id="{}""#,
            escape(&element.id().to_string())
        )?;
        if let Some(name) = element.name() {
            write!(out, r#" name="{}""#, escape(name))?;
        }
        let is_empty = element.incoming().is_empty()
            && element.outgoing().is_empty()
            && element.extension().is_none();
        if is_empty {
            writeln!(out, " />")?;
            continue;
        }
        writeln!(out, ">")?;
        if let Some(extension) = element.extension() {
            writeln!(out, "      {}", extension.trim())?;
        }
        for flow in element.incoming() {
            writeln!(out, "      <bpmn:incoming>{}</bpmn:incoming>", escape(&flow.to_string()))?;
        }
        for flow in element.outgoing() {
            writeln!(out, "      <bpmn:outgoing>{}</bpmn:outgoing>", escape(&flow.to_string()))?;
        }
        writeln!(out, "    </bpmn:{tag}>")?;
    }

    for flow in process.flows() {
        write!(
            out,
            r#"    <bpmn:sequenceFlow id="{}" sourceRef="{}" targetRef="{}""#,
            escape(&flow.id().to_string()),
            escape(&flow.source().to_string()),
            escape(&flow.target().to_string())
        )?;
        if let Some(name) = flow.name() {
            write!(out, r#" name="{}""#, escape(name))?;
        }
        match flow.condition() {
            Some(condition) => {
                writeln!(out, ">")?;
                writeln!(
                    out,
                    r#"      <bpmn:conditionExpression xsi:type="bpmn:tFormalExpression">{}</bpmn:conditionExpression>"#,
                    escape(condition)
                )?;
                writeln!(out, "    </bpmn:sequenceFlow>")?;
            }
            None => writeln!(out, " />")?,
        }
    }

    writeln!(out, "  </bpmn:process>")?;
    writeln!(out, "  {diagram}")?;
    writeln!(out, "</bpmn:definitions>")?;
    Ok(out)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::identifier::Id;
    use bpmn_layout_parser::{parse_bpmn, parse_csv, read_geometry};

    use super::*;
    use crate::{layout::Engine, structure::Graph};

    fn export(process: &ProcessDefinition) -> (String, Layout) {
        let graph = Graph::from_process(process).unwrap();
        let layout = Engine::new().calculate(graph).unwrap();
        let output = BpmnExporter::new().export(process, &layout).unwrap();
        (output, layout)
    }

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d">
  <!-- keep me -->
  <bpmn:process id="p">
    <bpmn:startEvent id="s" />
    <bpmn:userTask id="t" name="Check &amp; approve" />
    <bpmn:sequenceFlow id="f" sourceRef="s" targetRef="t" />
  </bpmn:process>
</bpmn:definitions>
"#;

    #[test]
    fn test_splice_keeps_document() {
        let process = parse_bpmn(DOCUMENT).unwrap();
        let (output, layout) = export(&process);

        assert!(output.contains("<!-- keep me -->"));
        assert!(output.contains(r#"name="Check &amp; approve""#));
        assert!(output.ends_with("</bpmn:definitions>\n"));

        let geometry = read_geometry(&output).unwrap();
        assert_eq!(geometry.shape(Id::new("t")), layout.bounds(Id::new("t")));
        assert_eq!(
            geometry.edge(Id::new("f")),
            layout.route(Id::new("f")).map(|route| route.waypoints())
        );

        // The result is itself a valid input.
        let reread = parse_bpmn(&output).unwrap();
        assert_eq!(reread.elements().len(), 2);
    }

    #[test]
    fn test_splice_replaces_existing_diagram() {
        let process = parse_bpmn(DOCUMENT).unwrap();
        let (first, _) = export(&process);

        let process = parse_bpmn(&first).unwrap();
        let (second, _) = export(&process);

        assert_eq!(first, second);
        assert_eq!(second.matches("BPMNDiagram_1").count(), 1);
    }

    #[test]
    fn test_synthesized_document() {
        let nodes = "id,kind,label\nstart,start,Begin\ngw,xor,Ok?\nend,end,\n";
        let edges = "source,target,label\nstart,gw,\ngw,end,\"yes\"\n";
        let process = parse_csv(nodes, edges).unwrap();
        let (output, layout) = export(&process);

        assert!(output.starts_with("<?xml"));
        assert!(output.contains(r#"<bpmn:exclusiveGateway id="gw" name="Ok?">"#));
        assert!(output.contains(r#"<bpmndi:BPMNShape id="gw_di" bpmnElement="gw" isMarkerVisible="true">"#));
        assert!(output.contains(r#"name="yes""#));

        let reread = parse_bpmn(&output).unwrap();
        assert_eq!(reread.flows().len(), 2);
        let geometry = read_geometry(&output).unwrap();
        for (id, bounds) in layout.node_bounds() {
            assert_eq!(geometry.shape(id), Some(bounds));
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }
}
