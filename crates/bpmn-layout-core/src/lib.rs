//! Core types for bpmn-layout.
//!
//! This crate provides the foundational types shared by the readers, the
//! layout engine, and the exporters:
//!
//! - **Identifiers**: String-interned element ids ([`identifier::Id`])
//! - **Geometry**: Points, sizes, and bounding boxes ([`geometry`] module)
//! - **Colors**: CSS color handling ([`color::Color`])
//! - **Draw**: Z-ordered SVG output collection ([`draw`] module)
//! - **Process**: The semantic process model ([`process`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod process;
