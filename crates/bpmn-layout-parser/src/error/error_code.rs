//! Error codes for reader diagnostics.
//!
//! Error codes are organized by reader:
//! - `E0xx` - BPMN XML reader
//! - `E1xx` - CSV reader
//! - `E2xx` - Diagram-interchange geometry read-back

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // BPMN XML reader (E0xx)
    // =========================================================================
    /// Malformed XML.
    ///
    /// The document is not well-formed XML.
    E001,

    /// Missing required attribute.
    ///
    /// An element lacks `id`, or a sequence flow lacks `sourceRef` or
    /// `targetRef`.
    E002,

    /// Duplicate id.
    ///
    /// Two flow nodes or two sequence flows share one id.
    E003,

    /// No process.
    ///
    /// The document contains no `process` element.
    E004,

    /// Unexpected root element.
    ///
    /// The document root is not a BPMN `definitions` element.
    E005,

    // =========================================================================
    // CSV reader (E1xx)
    // =========================================================================
    /// Wrong column count.
    ///
    /// A row has fewer or more fields than its file allows.
    E100,

    /// Unterminated quoted field.
    ///
    /// A field opened with `"` has no closing quote on the same line, or
    /// text follows its closing quote.
    E101,

    /// Empty id.
    ///
    /// A node id, edge source or edge target is empty.
    E102,

    /// Duplicate node id.
    ///
    /// Two node rows declare the same id.
    E103,

    // =========================================================================
    // Geometry read-back (E2xx)
    // =========================================================================
    /// Invalid geometry attribute.
    ///
    /// A `dc:Bounds` or `di:waypoint` coordinate is missing or not a number.
    E200,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "malformed XML",
            ErrorCode::E002 => "missing required attribute",
            ErrorCode::E003 => "duplicate id",
            ErrorCode::E004 => "no process",
            ErrorCode::E005 => "unexpected root element",
            ErrorCode::E100 => "wrong column count",
            ErrorCode::E101 => "unterminated quoted field",
            ErrorCode::E102 => "empty id",
            ErrorCode::E103 => "duplicate node id",
            ErrorCode::E200 => "invalid geometry attribute",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
