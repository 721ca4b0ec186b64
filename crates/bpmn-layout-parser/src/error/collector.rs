//! Accumulates diagnostics while one input is read.

use log::warn;

use crate::error::{Diagnostic, ParseError, Severity};

/// Lets a reader keep going after a bad element or row and report every
/// problem at the end.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity() == Severity::Error)
    }

    /// `Err` with every diagnostic, warnings included, if any error was
    /// emitted. Otherwise the warnings are logged and dropped.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors() {
            return Err(ParseError::new(self.diagnostics));
        }
        for diagnostic in &self.diagnostics {
            warn!(diagnostic:% = diagnostic; "Input warning");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_warnings_alone_pass() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("unknown kind"));

        assert!(!collector.has_errors());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_keeps_every_diagnostic() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(
            Diagnostic::error("empty node id")
                .with_code(ErrorCode::E102)
                .with_label(Span::new(10..11), "node id expected here"),
        );
        collector.emit(Diagnostic::warning("unknown kind"));
        collector.emit(Diagnostic::error("duplicate node id `a`").with_code(ErrorCode::E103));

        assert!(collector.has_errors());
        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 3);
        assert_eq!(err.diagnostics()[0].message(), "empty node id");
    }
}
