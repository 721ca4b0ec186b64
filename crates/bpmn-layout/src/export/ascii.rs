//! Character-grid rendering of a layout.
//!
//! Pixel coordinates are divided by the configured `scale_x`/`scale_y` and
//! rounded to character cells. Flows are drawn first, then element boxes
//! over them, then labels and arrow heads:
//!
//! ```text
//! ┌───┐   ┌─────────┐   ┌───┐
//! │   │──►│ Review  │──►│   │
//! └───┘   └─────────┘   └───┘
//! ```

mod canvas;
mod charset;

pub use canvas::{Canvas, CellRect};
pub use charset::{Arms, BoxChars, CharSet};

use log::{debug, info};

use bpmn_layout_core::{
    geometry::{Bounds, Point},
    process::{ElementKind, ProcessDefinition},
};

use super::{Error, Exporter};
use crate::{config::AsciiConfig, layout::Layout};

/// Maps pixel coordinates to character cells.
#[derive(Debug, Clone, Copy)]
struct Quantizer {
    origin: Point,
    scale_x: f32,
    scale_y: f32,
}

impl Quantizer {
    fn column(&self, x: f32) -> usize {
        ((x - self.origin.x()) / self.scale_x).round().max(0.0) as usize
    }

    fn row(&self, y: f32) -> usize {
        ((y - self.origin.y()) / self.scale_y).round().max(0.0) as usize
    }

    fn cell(&self, point: Point) -> (usize, usize) {
        (self.column(point.x()), self.row(point.y()))
    }

    /// Box of an element; at least three cells tall so the middle row can
    /// hold a label.
    fn rect(&self, bounds: Bounds) -> CellRect {
        let left = self.column(bounds.min_x());
        let top = self.row(bounds.min_y());
        CellRect {
            left,
            top,
            right: self.column(bounds.max_x()).max(left + 2),
            bottom: self.row(bounds.max_y()).max(top + 2),
        }
    }
}

/// Draws a layout with box-drawing characters.
#[derive(Debug, Clone, Copy)]
pub struct AsciiExporter {
    config: AsciiConfig,
}

impl AsciiExporter {
    pub fn new(config: &AsciiConfig) -> Self {
        Self { config: *config }
    }

    fn charset(&self) -> CharSet {
        if self.config.unicode() {
            CharSet::Unicode
        } else {
            CharSet::Ascii
        }
    }

    fn quantizer(&self, layout: &Layout) -> Result<Quantizer, Error> {
        let (scale_x, scale_y) = (self.config.scale_x(), self.config.scale_y());
        if !(scale_x > 0.0 && scale_y > 0.0) {
            return Err(Error::Style(format!(
                "character scale must be positive, got {scale_x} x {scale_y}"
            )));
        }
        let bounds = layout.diagram_bounds();
        // One spare cell on the top and left.
        Ok(Quantizer {
            origin: Point::new(bounds.min_x() - scale_x, bounds.min_y() - scale_y),
            scale_x,
            scale_y,
        })
    }
}

/// Draws one routed flow and returns the cell its arrow head goes in.
fn draw_flow(
    canvas: &mut Canvas,
    quantizer: &Quantizer,
    waypoints: &[Point],
) -> Option<(usize, usize, char)> {
    let cells: Vec<(usize, usize)> = waypoints.iter().map(|p| quantizer.cell(*p)).collect();

    for pair in cells.windows(2) {
        let ((c1, r1), (c2, r2)) = (pair[0], pair[1]);
        if r1 == r2 {
            canvas.hline(r1, c1, c2);
        } else if c1 == c2 {
            canvas.vline(c1, r1, r2);
        } else {
            // Diagonal fallback: across, then down or up.
            canvas.hline(r1, c1, c2);
            canvas.vline(c2, r1, r2);
        }
    }

    let (&(end_column, end_row), rest) = cells.split_last()?;
    let &(prev_column, prev_row) = rest.last()?;
    let chars = canvas.charset().chars();
    let head = if prev_row != end_row {
        if prev_row < end_row {
            (end_column, end_row.checked_sub(1)?, chars.arrow_down)
        } else {
            (end_column, end_row + 1, chars.arrow_up)
        }
    } else if prev_column < end_column {
        (end_column.checked_sub(1)?, end_row, chars.arrow_right)
    } else {
        (end_column + 1, end_row, chars.arrow_left)
    };
    Some(head)
}

fn element_text(kind: ElementKind, label: Option<&str>) -> Option<&str> {
    match (label, kind) {
        (Some(label), _) if !label.is_empty() => Some(label),
        (_, ElementKind::ExclusiveGateway) => Some("X"),
        (_, ElementKind::ParallelGateway) => Some("+"),
        _ => None,
    }
}

impl Exporter for AsciiExporter {
    fn export(&self, process: &ProcessDefinition, layout: &Layout) -> Result<String, Error> {
        let quantizer = self.quantizer(layout)?;
        let bounds = layout.diagram_bounds();
        let width = quantizer.column(bounds.max_x()) + 3;
        let height = quantizer.row(bounds.max_y()) + 3;
        debug!(width, height, process:% = process.id(); "Character canvas");

        let mut canvas = Canvas::new(width, height, self.charset());

        let mut heads = Vec::new();
        for route in layout.routes() {
            if let Some(head) = draw_flow(&mut canvas, &quantizer, route.waypoints()) {
                heads.push(head);
            }
        }

        for node in layout.graph().nodes() {
            let Some(bounds) = layout.bounds(node.id()) else {
                continue;
            };
            let rect = quantizer.rect(bounds);
            canvas.draw_box(rect);
            if let Some(text) = element_text(node.kind(), node.label()) {
                let len = text.chars().count().min(rect.inner_width());
                let column = rect.left + 1 + (rect.inner_width() - len) / 2;
                canvas.write_str(column, rect.middle_row(), text, len);
            }
        }

        for (column, row, head) in heads {
            canvas.set(column, row, head);
        }

        for edge in layout.graph().edges() {
            let (Some(label), Some(route)) = (edge.label(), layout.route(edge.id())) else {
                continue;
            };
            let (column, row) = quantizer.cell(route.label_position());
            if !canvas.write_if_blank(column + 1, row.saturating_sub(1), label) {
                debug!(edge:% = edge.id(); "No room for flow label");
            }
        }

        let rendered = canvas.render_to_string();
        info!(lines = rendered.lines().count(); "Character grid rendered");
        Ok(rendered)
    }
}
