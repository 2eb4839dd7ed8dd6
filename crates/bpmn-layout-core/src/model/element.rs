//! Flow nodes of a process: events, activities, gateways and artifacts.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, Size};

/// The closed set of element kinds the layout engine distinguishes.
///
/// Source tags are resolved once with [`ElementKind::from_tag`]. Anything the
/// engine does not know is laid out as a [`ElementKind::Task`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    StartEvent,
    IntermediateEvent,
    EndEvent,
    BoundaryEvent,
    #[default]
    Task,
    SubProcess,
    CallActivity,
    Gateway,
    DataObject,
    DataStore,
    TextAnnotation,
}

/// Coarse grouping of [`ElementKind`]s used for sizing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementCategory {
    Event,
    Task,
    Gateway,
    DataObject,
    Other,
}

impl ElementKind {
    /// Resolves a source tag such as `bpmn:userTask` or `exclusiveGateway`.
    ///
    /// Returns `None` for tags with no known mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bpmn_layout_core::model::ElementKind;
    /// assert_eq!(ElementKind::from_tag("bpmn:userTask"), Some(ElementKind::Task));
    /// assert_eq!(ElementKind::from_tag("parallelGateway"), Some(ElementKind::Gateway));
    /// assert_eq!(ElementKind::from_tag("bpmn:somethingElse"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        let local = tag.rsplit(':').next().unwrap_or(tag).trim();
        let kind = match local {
            "startEvent" => Self::StartEvent,
            "endEvent" => Self::EndEvent,
            "boundaryEvent" => Self::BoundaryEvent,
            "intermediateCatchEvent" | "intermediateThrowEvent" | "intermediateEvent" => {
                Self::IntermediateEvent
            }
            "subProcess" | "adHocSubProcess" | "transaction" => Self::SubProcess,
            "callActivity" => Self::CallActivity,
            "dataObject" | "dataObjectReference" | "dataInput" | "dataOutput" => Self::DataObject,
            "dataStore" | "dataStoreReference" => Self::DataStore,
            "textAnnotation" => Self::TextAnnotation,
            "task" => Self::Task,
            other if other.ends_with("Task") => Self::Task,
            other if other.ends_with("Gateway") => Self::Gateway,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical tag written back for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::StartEvent => "startEvent",
            Self::IntermediateEvent => "intermediateCatchEvent",
            Self::EndEvent => "endEvent",
            Self::BoundaryEvent => "boundaryEvent",
            Self::Task => "task",
            Self::SubProcess => "subProcess",
            Self::CallActivity => "callActivity",
            Self::Gateway => "exclusiveGateway",
            Self::DataObject => "dataObjectReference",
            Self::DataStore => "dataStoreReference",
            Self::TextAnnotation => "textAnnotation",
        }
    }

    pub fn category(self) -> ElementCategory {
        match self {
            Self::StartEvent | Self::IntermediateEvent | Self::EndEvent | Self::BoundaryEvent => {
                ElementCategory::Event
            }
            Self::Task | Self::SubProcess | Self::CallActivity => ElementCategory::Task,
            Self::Gateway => ElementCategory::Gateway,
            Self::DataObject | Self::DataStore => ElementCategory::DataObject,
            Self::TextAnnotation => ElementCategory::Other,
        }
    }

    /// Default shape size for elements of this kind.
    pub fn default_size(self) -> Size {
        match self {
            Self::StartEvent | Self::IntermediateEvent | Self::EndEvent | Self::BoundaryEvent => {
                Size::new(36.0, 36.0)
            }
            Self::Task | Self::SubProcess | Self::CallActivity => Size::new(120.0, 80.0),
            Self::Gateway => Size::new(50.0, 50.0),
            Self::DataObject => Size::new(36.0, 50.0),
            Self::DataStore => Size::new(50.0, 50.0),
            Self::TextAnnotation => Size::new(100.0, 30.0),
        }
    }

    /// drawio style fragment associated with this kind.
    pub fn style(self) -> &'static str {
        match self {
            Self::StartEvent => "shape=mxgraph.bpmn.event;outline=standard;symbol=general;",
            Self::IntermediateEvent => "shape=mxgraph.bpmn.event;outline=catching;symbol=general;",
            Self::EndEvent => "shape=mxgraph.bpmn.event;outline=end;symbol=terminate2;",
            Self::BoundaryEvent => "shape=mxgraph.bpmn.event;outline=boundInt;symbol=general;",
            Self::Task => "rounded=1;whiteSpace=wrap;html=1;arcSize=10;",
            Self::SubProcess => "rounded=1;whiteSpace=wrap;html=1;arcSize=5;container=1;",
            Self::CallActivity => "rounded=1;whiteSpace=wrap;html=1;arcSize=10;strokeWidth=3;",
            Self::Gateway => "shape=mxgraph.bpmn.gateway2;gwType=exclusive;",
            Self::DataObject => "shape=note;size=14;whiteSpace=wrap;html=1;",
            Self::DataStore => "shape=cylinder3;whiteSpace=wrap;html=1;",
            Self::TextAnnotation => "shape=partialRectangle;right=0;top=0;bottom=0;fillColor=none;",
        }
    }

    pub fn is_start(self) -> bool {
        matches!(self, Self::StartEvent)
    }

    pub fn is_end(self) -> bool {
        matches!(self, Self::EndEvent)
    }

    pub fn is_boundary(self) -> bool {
        matches!(self, Self::BoundaryEvent)
    }

    /// Returns `true` for kinds that may contain other elements.
    pub fn is_container(self) -> bool {
        matches!(self, Self::SubProcess)
    }
}

impl FromStr for ElementKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or("Unknown element type")
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single flow node of the process.
///
/// Geometry fields stay `None` until the element is positioned. The meaning of
/// `x`/`y` depends on the owning model's [`CoordinateFrame`](super::CoordinateFrame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    /// Resolved from `type_tag` when absent; see [`Element::resolve_kind`].
    #[serde(default)]
    pub kind: ElementKind,
    /// Tag the element was declared with in the source.
    pub type_tag: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    /// Lane or pool that directly contains the element.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Subprocess that contains the element.
    #[serde(default)]
    pub subprocess_id: Option<String>,
    /// Host activity of a boundary event.
    #[serde(default)]
    pub attached_to: Option<String>,
    /// Process the element is declared in.
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Element {
    /// Creates an element from a source tag. Unknown tags become tasks.
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        let type_tag = tag.into();
        let kind = ElementKind::from_tag(&type_tag).unwrap_or(ElementKind::Task);
        Self {
            id: id.into(),
            kind,
            type_tag,
            name: None,
            x: None,
            y: None,
            width: None,
            height: None,
            parent_id: None,
            subprocess_id: None,
            attached_to: None,
            process_id: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets all four geometry fields, `x`/`y` being the top-left corner.
    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_subprocess(mut self, subprocess_id: impl Into<String>) -> Self {
        self.subprocess_id = Some(subprocess_id.into());
        self
    }

    pub fn attached_to(mut self, host_id: impl Into<String>) -> Self {
        self.attached_to = Some(host_id.into());
        self
    }

    pub fn with_process(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Re-derives `kind` from `type_tag`, keeping the current kind for
    /// unknown tags.
    pub fn resolve_kind(&mut self) {
        if let Some(kind) = ElementKind::from_tag(&self.type_tag) {
            self.kind = kind;
        }
    }

    /// Returns `true` if the source tag had no known mapping.
    pub fn has_unknown_type(&self) -> bool {
        ElementKind::from_tag(&self.type_tag).is_none()
    }

    /// Returns `true` if the name is missing or blank.
    pub fn is_unnamed(&self) -> bool {
        self.name.as_deref().is_none_or(|name| name.trim().is_empty())
    }

    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }

    /// Bounds in the element's own frame, if all geometry is set.
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds::new_from_top_left(self.position()?, self.size()?))
    }

    /// Returns `true` once every geometry field is set and the size is positive.
    pub fn is_resolved(&self) -> bool {
        self.size().is_some_and(Size::is_positive) && self.position().is_some()
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = Some(position.x());
        self.y = Some(position.y());
    }

    pub fn set_size(&mut self, size: Size) {
        self.width = Some(size.width());
        self.height = Some(size.height());
    }

    /// Size if set, otherwise the default for the element kind.
    pub fn size_or_default(&self) -> Size {
        self.size()
            .filter(|size| size.is_positive())
            .unwrap_or_else(|| self.kind.default_size())
    }
}
