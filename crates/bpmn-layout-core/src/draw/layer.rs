//! Z-ordering of SVG output.
//!
//! The SVG exporter walks elements and flows in declaration order, which is
//! not paint order. [`LayeredOutput`] buckets nodes by [`RenderLayer`] and
//! emits one `<g data-layer="...">` group per non-empty layer, bottom first,
//! so that flows never paint over node bodies and labels stay on top.
//!
//! # Example
//!
//! ```
//! # use bpmn_layout_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Rectangle, Text};
//! let mut output = LayeredOutput::new();
//!
//! output.add_to_layer(RenderLayer::Text, Box::new(Text::new("Approve")));
//! output.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));
//!
//! // Shape group first, text group last.
//! let groups = output.render();
//! assert_eq!(groups.len(), 2);
//! ```

use std::collections::BTreeMap;

use svg::node::element::Group;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Paint layers; declaration order is paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    Background,
    /// Sequence flow paths
    Flow,
    /// Event, task and gateway bodies with their markers
    Shape,
    /// Element and flow labels
    Text,
}

impl RenderLayer {
    /// Value of the group's `data-layer` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Flow => "flow",
            Self::Shape => "shape",
            Self::Text => "text",
        }
    }
}

/// SVG nodes bucketed by paint layer. Within a layer, nodes keep the order
/// they were added in.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    layers: BTreeMap<RenderLayer, Vec<SvgNode>>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.layers.entry(layer).or_default().push(node);
    }

    /// Appends every node of `other` after the nodes already in each layer.
    pub fn merge(&mut self, other: LayeredOutput) {
        for (layer, nodes) in other.layers {
            self.layers.entry(layer).or_default().extend(nodes);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Vec::is_empty)
    }

    /// One group per non-empty layer, bottom to top.
    pub fn render(self) -> Vec<SvgNode> {
        self.layers
            .into_iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(layer, nodes)| {
                let group = nodes
                    .into_iter()
                    .fold(Group::new().set("data-layer", layer.name()), Group::add);
                Box::new(group) as SvgNode
            })
            .collect()
    }
}
