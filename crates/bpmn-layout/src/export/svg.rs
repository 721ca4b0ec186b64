//! SVG rendering of a layout.
//!
//! Shapes, flows and labels are collected into a [`LayeredOutput`] so that
//! flows are painted under node bodies and labels on top of everything.

use log::{debug, info};
use svg::{
    Document,
    node::element::{Circle, Definitions, Line, Marker, Path, Polygon, Rectangle, Text},
};

use bpmn_layout_core::{
    color::Color,
    draw::{LayeredOutput, RenderLayer},
    geometry::{Bounds, Insets, Point},
    process::{ElementKind, ProcessDefinition, Shape},
};

use super::{Error, Exporter};
use crate::{
    config::StyleConfig,
    layout::{Layout, routing::Route},
};

/// Resolved colors of one export.
struct Palette {
    background: Option<Color>,
    stroke: Color,
    fill: Color,
}

impl Palette {
    fn new(style: &StyleConfig) -> Result<Self, Error> {
        Ok(Self {
            background: style.background_color().map_err(Error::Style)?,
            stroke: style.stroke_color().map_err(Error::Style)?,
            fill: style.fill_color().map_err(Error::Style)?,
        })
    }

    fn arrow_id(&self) -> String {
        format!("arrow-right-{}", self.stroke.to_id_safe_string())
    }
}

/// Draws a layout as an SVG document.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    style: StyleConfig,
    padding: f32,
}

impl SvgExporter {
    pub fn new(style: &StyleConfig) -> Self {
        Self {
            style: style.clone(),
            padding: 20.0,
        }
    }

    /// Margin between the drawing and the edge of the view box.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    fn render_element(
        &self,
        palette: &Palette,
        kind: ElementKind,
        bounds: Bounds,
        label: Option<&str>,
    ) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let center = bounds.center();

        match kind.shape() {
            Shape::Circle => {
                let stroke_width = if kind == ElementKind::EndEvent { 3.0 } else { 1.5 };
                let circle = Circle::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("r", bounds.width() / 2.0)
                    .set("fill", palette.fill.to_string())
                    .set("stroke", palette.stroke.to_string())
                    .set("stroke-width", stroke_width);
                output.add_to_layer(RenderLayer::Shape, Box::new(circle));
            }
            Shape::Diamond => {
                let points = format!(
                    "{},{} {},{} {},{} {},{}",
                    center.x(),
                    bounds.min_y(),
                    bounds.max_x(),
                    center.y(),
                    center.x(),
                    bounds.max_y(),
                    bounds.min_x(),
                    center.y()
                );
                let diamond = Polygon::new()
                    .set("points", points)
                    .set("fill", palette.fill.to_string())
                    .set("stroke", palette.stroke.to_string())
                    .set("stroke-width", 1.5);
                output.add_to_layer(RenderLayer::Shape, Box::new(diamond));
                for line in gateway_marker(kind, center, bounds.width() / 5.0) {
                    let line = line
                        .set("stroke", palette.stroke.to_string())
                        .set("stroke-width", 3);
                    output.add_to_layer(RenderLayer::Shape, Box::new(line));
                }
            }
            Shape::Rectangle | Shape::RoundedRectangle => {
                let radius = if kind.shape() == Shape::RoundedRectangle {
                    10.0
                } else {
                    2.0
                };
                let rect = Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("rx", radius)
                    .set("fill", palette.fill.to_string())
                    .set("stroke", palette.stroke.to_string())
                    .set("stroke-width", 1.5);
                output.add_to_layer(RenderLayer::Shape, Box::new(rect));
            }
        }

        if let Some(label) = label {
            // Events and gateways are too small to hold text; their label
            // goes underneath.
            let inside = matches!(kind, ElementKind::Task | ElementKind::Other);
            let position = if inside {
                center
            } else {
                Point::new(center.x(), bounds.max_y() + f32::from(self.style.font_size()))
            };
            output.add_to_layer(RenderLayer::Text, Box::new(self.text(palette, label, position)));
        }

        output
    }

    fn render_flow(&self, palette: &Palette, route: &Route, label: Option<&str>) -> LayeredOutput {
        let mut output = LayeredOutput::new();

        let data = route
            .waypoints()
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let command = if index == 0 { 'M' } else { 'L' };
                format!("{command} {} {}", point.x(), point.y())
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut path = Path::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", palette.stroke.to_string())
            .set("stroke-width", 1.5)
            .set("marker-end", format!("url(#{})", palette.arrow_id()))
            .set("data-flow", route.edge().to_string());
        if route.is_loop() {
            path = path.set("stroke-dasharray", "6 4");
        }
        output.add_to_layer(RenderLayer::Flow, Box::new(path));

        if let Some(label) = label {
            let anchor = route.label_position();
            let position = Point::new(anchor.x() + 4.0, anchor.y() - 4.0);
            let text = self.text(palette, label, position).set("text-anchor", "start");
            output.add_to_layer(RenderLayer::Text, Box::new(text));
        }

        output
    }

    fn text(&self, palette: &Palette, label: &str, position: Point) -> Text {
        Text::new(label)
            .set("x", position.x())
            .set("y", position.y())
            .set("font-family", "sans-serif")
            .set("font-size", self.style.font_size())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
            .set("fill", palette.stroke.to_string())
    }

    fn marker_definitions(&self, palette: &Palette) -> Definitions {
        let arrow = Marker::new()
            .set("id", palette.arrow_id())
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", palette.stroke.to_string()),
            );
        Definitions::new().add(arrow)
    }
}

/// Cross for exclusive gateways, plus for parallel ones.
fn gateway_marker(kind: ElementKind, center: Point, arm: f32) -> Vec<Line> {
    let line = |from: Point, to: Point| {
        Line::new()
            .set("x1", from.x())
            .set("y1", from.y())
            .set("x2", to.x())
            .set("y2", to.y())
    };
    let (cx, cy) = (center.x(), center.y());
    match kind {
        ElementKind::ExclusiveGateway => vec![
            line(Point::new(cx - arm, cy - arm), Point::new(cx + arm, cy + arm)),
            line(Point::new(cx - arm, cy + arm), Point::new(cx + arm, cy - arm)),
        ],
        ElementKind::ParallelGateway => vec![
            line(Point::new(cx, cy - arm), Point::new(cx, cy + arm)),
            line(Point::new(cx - arm, cy), Point::new(cx + arm, cy)),
        ],
        _ => Vec::new(),
    }
}

impl Exporter for SvgExporter {
    fn export(&self, process: &ProcessDefinition, layout: &Layout) -> Result<String, Error> {
        let palette = Palette::new(&self.style)?;
        let view = layout
            .diagram_bounds()
            .add_padding(Insets::uniform(self.padding));

        let mut output = LayeredOutput::new();
        if let Some(background) = &palette.background {
            let rect = Rectangle::new()
                .set("x", view.min_x())
                .set("y", view.min_y())
                .set("width", view.width())
                .set("height", view.height())
                .set("fill", background.to_string());
            output.add_to_layer(RenderLayer::Background, Box::new(rect));
        }

        for node in layout.graph().nodes() {
            let Some(bounds) = layout.bounds(node.id()) else {
                continue;
            };
            output.merge(self.render_element(&palette, node.kind(), bounds, node.label()));
        }
        for edge in layout.graph().edges() {
            let Some(route) = layout.route(edge.id()) else {
                continue;
            };
            output.merge(self.render_flow(&palette, route, edge.label()));
        }
        debug!(process:% = process.id(); "SVG layers collected");

        let mut document = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    view.min_x(),
                    view.min_y(),
                    view.width(),
                    view.height()
                ),
            )
            .set("width", view.width())
            .set("height", view.height())
            .add(self.marker_definitions(&palette));
        for group in output.render() {
            document = document.add(group);
        }

        let rendered = document.to_string();
        info!(bytes = rendered.len(); "SVG rendered");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use bpmn_layout_parser::parse_csv;

    use super::*;
    use crate::{layout::Engine, structure::Graph};

    fn render(style: &StyleConfig) -> Result<String, Error> {
        let nodes = "start,start,\ngw,xor,Valid?\nok,task,Accept\nno,task,Reject\nend,end,Done\n";
        let edges = "start,gw\ngw,ok,yes\ngw,no,no\nok,end\nno,end\nno,gw,retry\n";
        let process = parse_csv(nodes, edges).unwrap();
        let layout = Engine::new()
            .calculate(Graph::from_process(&process).unwrap())
            .unwrap();
        SvgExporter::new(style).export(&process, &layout)
    }

    #[test]
    fn test_render() {
        let svg = render(&StyleConfig::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox"));
        assert!(svg.contains("Accept"));
        assert!(svg.contains("retry"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<polygon").count(), 1);
        assert_eq!(svg.matches("data-flow=").count(), 6);
        assert!(svg.contains("marker-end=\"url(#arrow-right-"));
        // The loop back to the gateway is dashed.
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
    }

    #[test]
    fn test_layers_are_ordered() {
        let svg = render(&StyleConfig::default().with_background_color("#eeeeee")).unwrap();

        let background = svg.find(r#"data-layer="background""#).unwrap();
        let flow = svg.find(r#"data-layer="flow""#).unwrap();
        let shape = svg.find(r#"data-layer="shape""#).unwrap();
        let text = svg.find(r#"data-layer="text""#).unwrap();
        assert!(background < flow && flow < shape && shape < text);
    }

    #[test]
    fn test_invalid_color() {
        let err = render(&StyleConfig::default().with_stroke_color("nope")).unwrap_err();
        assert!(matches!(err, Error::Style(_)));
    }
}
