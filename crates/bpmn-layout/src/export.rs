//! Export of a finished layout.
//!
//! The [`Exporter`] trait turns a [`Layout`] together with the
//! [`ProcessDefinition`] it was computed from into text. It is the last
//! stage of the pipeline:
//!
//! ```text
//! Source Text
//!     ↓ parse
//! ProcessDefinition
//!     ↓ structure
//! Graph
//!     ↓ layout
//! Layout
//!     ↓ export (this module)
//! Output Text
//! ```
//!
//! # Available Backends
//!
//! - [`bpmn`] - BPMN XML with a diagram-interchange section
//! - [`svg`] - SVG drawing
//! - [`ascii`] - Character-grid drawing
//!
//! Exporters only read the layout; every coordinate they write comes from it.

pub mod ascii;
pub mod bpmn;
pub mod svg;

use thiserror::Error;

use bpmn_layout_core::process::ProcessDefinition;

use crate::layout::Layout;

/// Abstraction for output backends.
pub trait Exporter {
    /// Renders `layout` of `process` to the backend's format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the layout cannot be expressed in the
    /// target format, or [`Error::Style`] for an invalid style setting.
    fn export(&self, process: &ProcessDefinition, layout: &Layout) -> Result<String, Error>;
}

/// Errors that can occur during export.
///
/// Converted into [`crate::Error::Export`] at the crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A rendering or conversion failure.
    #[error("Render error: {0}")]
    Render(String),

    /// A style setting that cannot be used, such as an invalid color.
    #[error("Style error: {0}")]
    Style(String),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}
