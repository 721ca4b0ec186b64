//! Error and diagnostic system for the input readers.
//!
//! Readers report every problem they find in one pass. Each problem is a
//! [`Diagnostic`] with an [`ErrorCode`], one or more labeled source spans,
//! and optional help text. All diagnostics of a failed read are wrapped in a
//! [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use bpmn_layout_parser::error::{Diagnostic, ErrorCode, ParseError};
//! # use bpmn_layout_parser::Span;
//! let diag = Diagnostic::error("duplicate id `Task_1`")
//!     .with_code(ErrorCode::E003)
//!     .with_label(Span::new(120..140), "redefined here")
//!     .with_secondary_label(Span::new(40..60), "first defined here")
//!     .with_help("element and flow ids must be unique within the document");
//!
//! let err = ParseError::from(diag);
//! assert_eq!(err.to_string(), "error[E003]: duplicate id `Task_1`");
//! ```

mod collector;
mod diagnostic;
mod error_code;

use std::fmt;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;

/// A failed read. Holds at least one error diagnostic, in source order,
/// plus any warnings found along the way.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Codes of the error diagnostics, warnings left out.
    pub fn error_codes(&self) -> impl Iterator<Item = ErrorCode> + '_ {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity() == Severity::Error)
            .filter_map(Diagnostic::code)
    }
}

/// The first diagnostic, followed by a count of the rest.
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.diagnostics.split_first() else {
            return f.write_str("input could not be read");
        };
        write!(f, "{first}")?;
        if !rest.is_empty() {
            write!(f, " (+{} more)", rest.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_counts_the_rest() {
        let single: ParseError = Diagnostic::error("malformed XML").into();
        assert_eq!(single.to_string(), "error: malformed XML");

        let several: ParseError = vec![
            Diagnostic::error("node row has 1 fields, expected 2 to 3").with_code(ErrorCode::E100),
            Diagnostic::error("empty node id").with_code(ErrorCode::E102),
            Diagnostic::error("duplicate node id `a`").with_code(ErrorCode::E103),
        ]
        .into();
        assert_eq!(
            several.to_string(),
            "error[E100]: node row has 1 fields, expected 2 to 3 (+2 more)"
        );
    }

    #[test]
    fn test_error_codes_skip_warnings() {
        let err: ParseError = vec![
            Diagnostic::warning("unexpected root element `svg`").with_code(ErrorCode::E005),
            Diagnostic::error("empty edge target").with_code(ErrorCode::E102),
            Diagnostic::error("no code"),
        ]
        .into();

        assert_eq!(err.error_codes().collect::<Vec<_>>(), vec![ErrorCode::E102]);
    }
}
