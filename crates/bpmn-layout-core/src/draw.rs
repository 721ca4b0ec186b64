//! Drawing helpers shared by the SVG exporter.

mod layer;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
