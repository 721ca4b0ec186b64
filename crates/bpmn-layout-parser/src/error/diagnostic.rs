//! Diagnostics: a message, its severity and code, and labeled spans.

use std::fmt;

use crate::{error::ErrorCode, span::Span};

/// Whether a diagnostic stops the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The input cannot be turned into a process definition.
    Error,

    /// The input was read, but something in it was ignored or guessed.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A message pinned to a span of the input.
///
/// The primary label marks the offending text; secondary labels point at
/// related places such as an earlier definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    span: Span,
    message: String,
    primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            primary: false,
            ..Self::primary(span, message)
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.primary
    }
}

/// One problem found in an input file.
///
/// Rendered by the CLI roughly as:
///
/// ```text
/// error[E003]: duplicate id `Task_1`
///   --> order.bpmn:14:5
///    |
/// 14 |     <bpmn:task id="Task_1" name="Ship" />
///    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ redefined here
///    |
///    = help: element and flow ids must be unique within the document
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message.into())
    }

    fn with_severity(severity: Severity, message: String) -> Self {
        Self {
            severity,
            code: None,
            message,
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Labels in the order they were added; the primary one first unless
    /// the reader chose otherwise.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(self, code: ErrorCode) -> Self {
        Self {
            code: Some(code),
            ..self
        }
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(self, help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..self
        }
    }
}

/// `error[E004]: message`, or `warning: message` without a code.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{code}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let diag = Diagnostic::error("duplicate id `Task_1`")
            .with_code(ErrorCode::E003)
            .with_label(Span::new(100..120), "redefined here")
            .with_secondary_label(Span::new(50..70), "first defined here")
            .with_help("ids must be unique");

        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some(ErrorCode::E003));
        assert_eq!(
            diag.labels(),
            &[
                Label::primary(Span::new(100..120), "redefined here"),
                Label::secondary(Span::new(50..70), "first defined here"),
            ]
        );
        assert!(diag.labels()[1].is_secondary());
        assert_eq!(diag.help(), Some("ids must be unique"));
    }

    #[test]
    fn test_display() {
        let with_code = Diagnostic::error("no process found").with_code(ErrorCode::E004);
        assert_eq!(with_code.to_string(), "error[E004]: no process found");

        let without_code = Diagnostic::warning("unknown kind");
        assert_eq!(without_code.to_string(), "warning: unknown kind");
    }
}
