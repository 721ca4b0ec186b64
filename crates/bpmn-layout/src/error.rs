//! Error types for bpmn-layout operations.
//!
//! [`Error`] wraps everything that can stop the pipeline. Conditions the
//! pipeline recovers from are not errors; see [`crate::layout::Notice`].

use std::io;

use thiserror::Error;

use bpmn_layout_parser::error::ParseError;

use crate::{export, structure::GraphError};

/// The main error type for bpmn-layout operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so a
/// caller can render labelled snippets.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// An internal invariant did not hold. No layout is produced.
    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(#[from] export::Error),
}

impl Error {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
