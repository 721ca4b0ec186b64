//! Conversion of [`bpmn_layout::Error`] into miette reports.
//!
//! A [`ParseError`](bpmn_layout_parser::ParseError) can carry several
//! diagnostics; each one becomes its own report with a snippet of the file
//! it came from. Every other error becomes a single report with a stable
//! code string.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use bpmn_layout::{Error, structure::GraphError};
use bpmn_layout_parser::{Span, error::Diagnostic};

/// One reader diagnostic together with the text it points into.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Any [`Error`] that is not a parse error.
pub struct ErrorAdapter<'a>(pub &'a Error);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            Error::Io(_) => "bpmn_layout::io",
            Error::Parse { .. } => "bpmn_layout::parse",
            Error::Graph(_) => "bpmn_layout::graph",
            Error::Layout(_) => "bpmn_layout::layout",
            Error::Export(_) => "bpmn_layout::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            Error::Graph(GraphError::DanglingReference { .. }) => {
                "every sourceRef and targetRef must name an element of the process"
            }
            Error::Graph(GraphError::DuplicateId { .. }) => "element and flow ids must be unique",
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// A single report: a located diagnostic or a plain error.
#[derive(Debug)]
pub enum Reportable<'a> {
    Diagnostic(DiagnosticAdapter<'a>),
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(_) => None,
        }
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// One report per diagnostic for [`Error::Parse`], a single report
/// otherwise.
pub fn to_reportables(err: &Error) -> Vec<Reportable<'_>> {
    match err {
        Error::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic(DiagnosticAdapter::new(diag, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use bpmn_layout::identifier::Id;
    use bpmn_layout_parser::error::{ErrorCode, ParseError};

    use super::*;

    #[test]
    fn test_one_report_per_diagnostic() {
        let diags = vec![
            Diagnostic::error("node row has 4 fields, expected 2 to 3")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(0..9), "in this row"),
            Diagnostic::error("duplicate node id `a`")
                .with_code(ErrorCode::E103)
                .with_label(Span::new(12..13), "redefined here")
                .with_secondary_label(Span::new(0..1), "first defined here"),
        ];
        let err = Error::new_parse_error(ParseError::from(diags), "a,b,c,d\n\na,task\n");

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[1].to_string(), "duplicate node id `a`");
        assert_eq!(reportables[1].code().unwrap().to_string(), "E103");
        let labels: Vec<_> = reportables[1].labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
        assert!(reportables[1].source_code().is_some());
    }

    #[test]
    fn test_graph_error() {
        let err = Error::Graph(GraphError::DanglingReference {
            edge: Id::new("f1"),
            node: Id::new("ghost"),
        });

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        let report = &reportables[0];
        assert_eq!(
            report.to_string(),
            "Graph error: flow `f1` references unknown element `ghost`"
        );
        assert_eq!(report.code().unwrap().to_string(), "bpmn_layout::graph");
        assert!(report.help().is_some());
        assert!(report.labels().is_none());
    }

    #[test]
    fn test_renders_snippet() {
        let diag = Diagnostic::error("empty node id")
            .with_code(ErrorCode::E102)
            .with_label(Span::new(0..1), "node id expected here");
        let err = Error::new_parse_error(ParseError::from(diag), ",task\n");

        let reporter = miette::GraphicalReportHandler::new();
        let mut out = String::new();
        for reportable in to_reportables(&err) {
            reporter.render_report(&mut out, &reportable).unwrap();
        }

        assert!(out.contains("empty node id"));
        assert!(out.contains("node id expected here"));
    }
}
