//! Semantic process model.
//!
//! Both input readers produce a [`ProcessDefinition`]: a flat list of
//! [`FlowElement`]s connected by [`SequenceFlow`]s. It carries no geometry.
//! The layout engine builds its graph from it, and the exporters use it to
//! re-attach geometry to the original elements.
//!
//! # Element kinds
//!
//! [`ElementKind`] is the closed set of kinds the layout engine cares about.
//! Size and outline shape are a pure function of the kind:
//!
//! | Kind | Size | Shape |
//! |---|---|---|
//! | start / end event | 36 × 36 | circle |
//! | task | 100 × 80 | rectangle |
//! | exclusive / parallel gateway | 50 × 50 | diamond |
//! | other | 50 × 50 | rounded rectangle |

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{geometry::Size, identifier::Id};

/// Outline drawn for an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Rectangle,
    RoundedRectangle,
    Diamond,
}

/// The kind of a flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    Task,
    ExclusiveGateway,
    ParallelGateway,
    Other,
}

/// BPMN tags laid out as tasks.
const ACTIVITY_TAGS: &[&str] = &[
    "task",
    "userTask",
    "serviceTask",
    "scriptTask",
    "sendTask",
    "receiveTask",
    "manualTask",
    "businessRuleTask",
    "callActivity",
    "subProcess",
    "adHocSubProcess",
    "transaction",
];

/// `(kind, width, height, shape)` lookup table.
const KIND_TABLE: &[(ElementKind, f32, f32, Shape)] = &[
    (ElementKind::StartEvent, 36.0, 36.0, Shape::Circle),
    (ElementKind::EndEvent, 36.0, 36.0, Shape::Circle),
    (ElementKind::Task, 100.0, 80.0, Shape::Rectangle),
    (ElementKind::ExclusiveGateway, 50.0, 50.0, Shape::Diamond),
    (ElementKind::ParallelGateway, 50.0, 50.0, Shape::Diamond),
    (ElementKind::Other, 50.0, 50.0, Shape::RoundedRectangle),
];

impl ElementKind {
    /// All kinds, in table order.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::StartEvent,
        ElementKind::EndEvent,
        ElementKind::Task,
        ElementKind::ExclusiveGateway,
        ElementKind::ParallelGateway,
        ElementKind::Other,
    ];

    /// Maps a BPMN element local name to a kind.
    ///
    /// Every activity variant is a [`ElementKind::Task`]; anything that is
    /// not a start/end event, task, exclusive or parallel gateway is
    /// [`ElementKind::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "startEvent" => Self::StartEvent,
            "endEvent" => Self::EndEvent,
            "exclusiveGateway" => Self::ExclusiveGateway,
            "parallelGateway" => Self::ParallelGateway,
            t if ACTIVITY_TAGS.contains(&t) => Self::Task,
            _ => Self::Other,
        }
    }

    /// BPMN element local name used when an element has to be synthesized.
    pub fn default_tag(self) -> &'static str {
        match self {
            Self::StartEvent => "startEvent",
            Self::EndEvent => "endEvent",
            Self::Task => "task",
            Self::ExclusiveGateway => "exclusiveGateway",
            Self::ParallelGateway => "parallelGateway",
            Self::Other => "intermediateThrowEvent",
        }
    }

    fn entry(self) -> (ElementKind, f32, f32, Shape) {
        KIND_TABLE
            .iter()
            .copied()
            .find(|(kind, ..)| *kind == self)
            .expect("every kind has a table entry")
    }

    /// Fixed box size of this kind.
    pub fn size(self) -> Size {
        let (_, width, height, _) = self.entry();
        Size::new(width, height)
    }

    /// Outline shape of this kind.
    pub fn shape(self) -> Shape {
        self.entry().3
    }

    /// Smallest size that fits every kind; one grid cell.
    pub fn cell_size() -> Size {
        Self::ALL
            .iter()
            .fold(Size::default(), |acc, kind| acc.max(kind.size()))
    }

    pub fn is_gateway(self) -> bool {
        matches!(self, Self::ExclusiveGateway | Self::ParallelGateway)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_tag())
    }
}

/// Error returned when a textual kind is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown element kind `{0}`")]
pub struct UnknownKindError(pub String);

impl FromStr for ElementKind {
    type Err = UnknownKindError;

    /// Accepts BPMN tags (case-insensitive) and the short aliases
    /// `start`, `end`, `gateway`/`xor`, `parallel`/`and`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "start" => Self::StartEvent,
            "end" => Self::EndEvent,
            "gateway" | "xor" => Self::ExclusiveGateway,
            "parallel" | "and" => Self::ParallelGateway,
            "other" => Self::Other,
            _ => {
                let tag = canonical_tag(&lower).ok_or_else(|| UnknownKindError(s.to_string()))?;
                Self::from_tag(tag)
            }
        };
        Ok(kind)
    }
}

/// Known BPMN flow node tags, matched case-insensitively.
pub fn canonical_tag(name: &str) -> Option<&'static str> {
    const OTHER_TAGS: &[&str] = &[
        "startEvent",
        "endEvent",
        "exclusiveGateway",
        "parallelGateway",
        "inclusiveGateway",
        "eventBasedGateway",
        "complexGateway",
        "intermediateCatchEvent",
        "intermediateThrowEvent",
        "boundaryEvent",
    ];
    ACTIVITY_TAGS
        .iter()
        .chain(OTHER_TAGS)
        .copied()
        .find(|tag| tag.eq_ignore_ascii_case(name))
}

/// One flow node of a process: event, activity or gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowElement {
    id: Id,
    kind: ElementKind,
    tag: String,
    name: Option<String>,
    incoming: Vec<Id>,
    outgoing: Vec<Id>,
    extension: Option<String>,
}

impl FlowElement {
    /// Creates an element with the given BPMN tag, e.g. `serviceTask`.
    pub fn new(id: Id, kind: ElementKind, tag: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            tag: tag.into(),
            name: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            extension: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches opaque `extensionElements` XML that export carries over unchanged.
    pub fn with_extension(mut self, xml: impl Into<String>) -> Self {
        self.extension = Some(xml.into());
        self
    }

    /// Appends a declared incoming flow reference.
    pub fn add_incoming(&mut self, flow: Id) {
        self.incoming.push(flow);
    }

    /// Appends a declared outgoing flow reference.
    pub fn add_outgoing(&mut self, flow: Id) {
        self.outgoing.push(flow);
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared incoming flow ids, in document order.
    pub fn incoming(&self) -> &[Id] {
        &self.incoming
    }

    /// Declared outgoing flow ids, in document order.
    pub fn outgoing(&self) -> &[Id] {
        &self.outgoing
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

/// A directed connection between two flow nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    id: Id,
    source: Id,
    target: Id,
    name: Option<String>,
    condition: Option<String>,
}

impl SequenceFlow {
    pub fn new(id: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            source,
            target,
            name: None,
            condition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Text drawn next to the flow: the name, else the condition.
    pub fn label(&self) -> Option<&str> {
        self.name().or(self.condition())
    }
}

/// A parsed process, ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDefinition {
    id: Id,
    name: Option<String>,
    elements: Vec<FlowElement>,
    flows: Vec<SequenceFlow>,
    document: Option<String>,
}

impl ProcessDefinition {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            name: None,
            elements: Vec::new(),
            flows: Vec::new(),
            document: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Keeps the source XML so that export can splice geometry into it.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn add_element(&mut self, element: FlowElement) {
        self.elements.push(element);
    }

    pub fn add_flow(&mut self, flow: SequenceFlow) {
        self.flows.push(flow);
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Flow nodes in declaration order.
    pub fn elements(&self) -> &[FlowElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [FlowElement] {
        &mut self.elements
    }

    /// Sequence flows in declaration order.
    pub fn flows(&self) -> &[SequenceFlow] {
        &self.flows
    }

    /// Looks up an element by id.
    pub fn element(&self, id: Id) -> Option<&FlowElement> {
        self.elements.iter().find(|element| element.id() == id)
    }

    /// Looks up a flow by id.
    pub fn flow(&self, id: Id) -> Option<&SequenceFlow> {
        self.flows.iter().find(|flow| flow.id() == id)
    }

    /// The original BPMN document, if this definition was read from one.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(ElementKind::from_tag("startEvent"), ElementKind::StartEvent);
        assert_eq!(ElementKind::from_tag("endEvent"), ElementKind::EndEvent);
        assert_eq!(ElementKind::from_tag("serviceTask"), ElementKind::Task);
        assert_eq!(ElementKind::from_tag("callActivity"), ElementKind::Task);
        assert_eq!(ElementKind::from_tag("subProcess"), ElementKind::Task);
        assert_eq!(
            ElementKind::from_tag("exclusiveGateway"),
            ElementKind::ExclusiveGateway
        );
        assert_eq!(
            ElementKind::from_tag("parallelGateway"),
            ElementKind::ParallelGateway
        );
        assert_eq!(ElementKind::from_tag("inclusiveGateway"), ElementKind::Other);
        assert_eq!(ElementKind::from_tag("boundaryEvent"), ElementKind::Other);
    }

    #[test]
    fn test_kind_from_str_aliases_and_case() {
        assert_eq!("start".parse::<ElementKind>(), Ok(ElementKind::StartEvent));
        assert_eq!("END".parse::<ElementKind>(), Ok(ElementKind::EndEvent));
        assert_eq!("xor".parse::<ElementKind>(), Ok(ElementKind::ExclusiveGateway));
        assert_eq!("and".parse::<ElementKind>(), Ok(ElementKind::ParallelGateway));
        assert_eq!("usertask".parse::<ElementKind>(), Ok(ElementKind::Task));
        assert_eq!("ExclusiveGateway".parse::<ElementKind>(), Ok(ElementKind::ExclusiveGateway));
        assert_eq!("eventbasedgateway".parse::<ElementKind>(), Ok(ElementKind::Other));
    }

    #[test]
    fn test_kind_from_str_unknown() {
        let err = "frobnicate".parse::<ElementKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown element kind `frobnicate`");
    }

    #[test]
    fn test_kind_sizes_and_shapes() {
        assert_eq!(ElementKind::StartEvent.size(), Size::new(36.0, 36.0));
        assert_eq!(ElementKind::Task.size(), Size::new(100.0, 80.0));
        assert_eq!(ElementKind::ExclusiveGateway.size(), Size::new(50.0, 50.0));
        assert_eq!(ElementKind::Other.size(), Size::new(50.0, 50.0));

        assert_eq!(ElementKind::EndEvent.shape(), Shape::Circle);
        assert_eq!(ElementKind::Task.shape(), Shape::Rectangle);
        assert_eq!(ElementKind::ParallelGateway.shape(), Shape::Diamond);
        assert_eq!(ElementKind::Other.shape(), Shape::RoundedRectangle);
    }

    #[test]
    fn test_cell_size_fits_all_kinds() {
        let cell = ElementKind::cell_size();
        assert_eq!(cell, Size::new(100.0, 80.0));
        for kind in ElementKind::ALL {
            assert!(kind.size().width() <= cell.width());
            assert!(kind.size().height() <= cell.height());
        }
    }

    #[test]
    fn test_default_tag_roundtrips_through_from_tag() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_tag(kind.default_tag()), kind);
        }
    }

    #[test]
    fn test_flow_label_prefers_name() {
        let flow = SequenceFlow::new(Id::new("f1"), Id::new("a"), Id::new("b"))
            .with_condition("${approved}");
        assert_eq!(flow.label(), Some("${approved}"));

        let named = flow.with_name("yes");
        assert_eq!(named.label(), Some("yes"));
    }

    #[test]
    fn test_process_lookup() {
        let mut process = ProcessDefinition::new(Id::new("Process_1")).with_name("Order");
        let mut start = FlowElement::new(Id::new("start"), ElementKind::StartEvent, "startEvent");
        start.add_outgoing(Id::new("f1"));
        process.add_element(start);
        process.add_element(FlowElement::new(Id::new("end"), ElementKind::EndEvent, "endEvent"));
        process.add_flow(SequenceFlow::new(
            Id::new("f1"),
            Id::new("start"),
            Id::new("end"),
        ));

        assert_eq!(process.name(), Some("Order"));
        assert_eq!(process.elements().len(), 2);
        assert_eq!(
            process.element(Id::new("start")).map(|e| e.outgoing().len()),
            Some(1)
        );
        assert!(process.flow(Id::new("f1")).is_some());
        assert!(process.element(Id::new("missing")).is_none());
        assert!(process.document().is_none());
    }
}
