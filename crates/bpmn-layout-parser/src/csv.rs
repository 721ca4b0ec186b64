//! Two-file CSV reader.
//!
//! The node file lists `id,kind[,label]`, the edge file
//! `source,target[,label]`. Fields are comma separated and may be wrapped in
//! double quotes, inside which `""` stands for one quote. Blank lines and
//! lines starting with `#` are skipped, and a leading header row is
//! recognised by its first field (`id` for nodes, `source` or `from` for
//! edges).
//!
//! Edge endpoints are not checked against the node file here; the graph
//! builder reports them as dangling references.

use std::collections::HashMap;

use log::{debug, warn};
use winnow::{
    Parser as _,
    ascii::space0,
    combinator::{alt, cut_err, delimited, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Stream as _},
    token::{none_of, take_while},
};

use bpmn_layout_core::{
    identifier::Id,
    process::{ElementKind, FlowElement, ProcessDefinition, SequenceFlow, canonical_tag},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Id given to processes read from CSV.
pub const CSV_PROCESS_ID: &str = "Process_1";

type Input<'src> = LocatingSlice<&'src str>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// One field of a row with its byte range inside the line.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    value: String,
    span: Span,
}

/// `"..."` with `""` as an escaped quote. Once the opening quote is seen the
/// field must close.
fn quoted_field(input: &mut Input<'_>) -> IResult<String> {
    preceded(
        '"',
        cut_err(terminated(
            repeat(0.., alt(("\"\"".value('"'), none_of('"')))).fold(
                String::new,
                |mut acc, ch| {
                    acc.push(ch);
                    acc
                },
            ),
            '"',
        )),
    )
    .parse_next(input)
}

fn bare_field(input: &mut Input<'_>) -> IResult<String> {
    take_while(0.., |ch: char| ch != ',')
        .map(|text: &str| text.trim().to_string())
        .parse_next(input)
}

fn field(input: &mut Input<'_>) -> IResult<Field> {
    delimited(space0, alt((quoted_field, bare_field)).with_span(), space0)
        .map(|(value, range)| Field {
            value,
            span: Span::new(range),
        })
        .parse_next(input)
}

fn record(input: &mut Input<'_>) -> IResult<Vec<Field>> {
    separated(1.., field, ',').parse_next(input)
}

/// A data row: its fields with spans relative to the whole file.
struct Row {
    fields: Vec<Field>,
    span: Span,
}

/// Splits `source` into data rows, dropping blank and comment lines.
///
/// Rows that fail to tokenize are reported and skipped.
fn rows(source: &str, collector: &mut DiagnosticCollector) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut line_start = 0;

    for raw_line in source.split_inclusive('\n') {
        let offset = line_start;
        line_start += raw_line.len();

        let line = raw_line.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let line_span = Span::new(offset..offset + line.len());
        let mut input = LocatingSlice::new(line);
        match record.parse_next(&mut input) {
            Ok(fields) if input.eof_offset() == 0 => rows.push(Row {
                fields: fields
                    .into_iter()
                    .map(|field| Field {
                        span: field.span.offset_by(offset),
                        ..field
                    })
                    .collect(),
                span: line_span,
            }),
            Ok(_) => {
                let junk = offset + line.len() - input.eof_offset();
                collector.emit(
                    Diagnostic::error("unexpected text after closing quote")
                        .with_code(ErrorCode::E101)
                        .with_label(Span::new(junk..line_span.end()), "expected `,` here")
                        .with_help("quotes inside a quoted field are written as `\"\"`"),
                );
            }
            Err(_) => {
                collector.emit(
                    Diagnostic::error("unterminated quoted field")
                        .with_code(ErrorCode::E101)
                        .with_label(line_span, "closing `\"` missing on this line"),
                );
            }
        }
    }

    rows
}

fn is_header(row: &Row, names: &[&str]) -> bool {
    row.fields
        .first()
        .is_some_and(|field| names.iter().any(|name| field.value.eq_ignore_ascii_case(name)))
}

fn check_columns(
    row: &Row,
    min: usize,
    max: usize,
    what: &str,
    collector: &mut DiagnosticCollector,
) -> bool {
    let count = row.fields.len();
    if (min..=max).contains(&count) {
        return true;
    }
    collector.emit(
        Diagnostic::error(format!("{what} row has {count} fields, expected {min} to {max}"))
            .with_code(ErrorCode::E100)
            .with_label(row.span, "in this row"),
    );
    false
}

fn non_empty_id<'f>(
    field: &'f Field,
    what: &str,
    collector: &mut DiagnosticCollector,
) -> Option<&'f str> {
    if field.value.is_empty() {
        collector.emit(
            Diagnostic::error(format!("empty {what}"))
                .with_code(ErrorCode::E102)
                .with_label(field.span, format!("{what} expected here")),
        );
        return None;
    }
    Some(&field.value)
}

/// Reads a node file into a process with no flows.
///
/// # Errors
///
/// `E100`, `E101`, `E102` and `E103` diagnostics for every bad row.
pub fn parse_csv_nodes(source: &str) -> Result<ProcessDefinition, ParseError> {
    let mut collector = DiagnosticCollector::new();
    let mut rows = rows(source, &mut collector);
    if rows.first().is_some_and(|row| is_header(row, &["id"])) {
        rows.remove(0);
    }

    let mut definition = ProcessDefinition::new(Id::new(CSV_PROCESS_ID));
    let mut seen: HashMap<String, Span> = HashMap::new();

    for row in &rows {
        if !check_columns(row, 2, 3, "node", &mut collector) {
            continue;
        }
        let Some(id) = non_empty_id(&row.fields[0], "node id", &mut collector) else {
            continue;
        };
        if let Some(first) = seen.get(id) {
            collector.emit(
                Diagnostic::error(format!("duplicate node id `{id}`"))
                    .with_code(ErrorCode::E103)
                    .with_label(row.fields[0].span, "redefined here")
                    .with_secondary_label(*first, "first defined here"),
            );
            continue;
        }
        seen.insert(id.to_string(), row.fields[0].span);

        let kind_text = row.fields[1].value.as_str();
        let kind = kind_text.parse::<ElementKind>().unwrap_or_else(|err| {
            warn!(id, kind = kind_text; "{err}, using the generic shape");
            ElementKind::Other
        });
        let tag = canonical_tag(kind_text).unwrap_or(kind.default_tag());

        let mut element = FlowElement::new(Id::new(id), kind, tag);
        if let Some(label) = row.fields.get(2).filter(|field| !field.value.is_empty()) {
            element = element.with_name(label.value.as_str());
        }
        definition.add_element(element);
    }

    collector.finish()?;
    Ok(definition)
}

/// Reads an edge file, appending its flows to `definition`.
///
/// Flow ids are `flow_<n>` for the n-th data row. Each flow is recorded on
/// its source's outgoing and its target's incoming list when those elements
/// exist.
///
/// # Errors
///
/// `E100`, `E101` and `E102` diagnostics for every bad row.
pub fn parse_csv_edges(
    source: &str,
    definition: &mut ProcessDefinition,
) -> Result<(), ParseError> {
    let mut collector = DiagnosticCollector::new();
    let mut rows = rows(source, &mut collector);
    if rows.first().is_some_and(|row| is_header(row, &["source", "from"])) {
        rows.remove(0);
    }

    let mut flows = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if !check_columns(row, 2, 3, "edge", &mut collector) {
            continue;
        }
        let source_id = non_empty_id(&row.fields[0], "edge source", &mut collector);
        let target_id = non_empty_id(&row.fields[1], "edge target", &mut collector);
        let (Some(source_id), Some(target_id)) = (source_id, target_id) else {
            continue;
        };

        let id = Id::new(&format!("flow_{}", index + 1));
        let mut flow = SequenceFlow::new(id, Id::new(source_id), Id::new(target_id));
        if let Some(label) = row.fields.get(2).filter(|field| !field.value.is_empty()) {
            flow = flow.with_name(label.value.as_str());
        }
        flows.push(flow);
    }

    collector.finish()?;

    for flow in flows {
        for element in definition.elements_mut() {
            if element.id() == flow.source() {
                element.add_outgoing(flow.id());
            }
            if element.id() == flow.target() {
                element.add_incoming(flow.id());
            }
        }
        definition.add_flow(flow);
    }
    Ok(())
}

/// Reads a node file and an edge file into one process.
///
/// Node diagnostics are returned before the edge file is read.
///
/// # Examples
///
/// ```
/// use bpmn_layout_parser::parse_csv;
///
/// let nodes = "id,kind,label\nstart,start,Begin\nwork,task,Do it\nend,end,\n";
/// let edges = "source,target\nstart,work\nwork,end\n";
///
/// let process = parse_csv(nodes, edges).expect("valid CSV");
/// assert_eq!(process.elements().len(), 3);
/// assert_eq!(process.flows()[1].id(), "flow_2");
/// ```
pub fn parse_csv(nodes: &str, edges: &str) -> Result<ProcessDefinition, ParseError> {
    let mut definition = parse_csv_nodes(nodes)?;
    parse_csv_edges(edges, &mut definition)?;

    debug!(
        elements = definition.elements().len(),
        flows = definition.flows().len();
        "CSV process read"
    );
    Ok(definition)
}
