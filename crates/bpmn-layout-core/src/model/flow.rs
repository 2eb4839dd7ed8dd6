//! Connections between elements.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// The BPMN connecting-object kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    #[default]
    Sequence,
    Message,
    Association,
}

/// A directed connection from `source` to `target`.
///
/// Waypoints are always diagram-absolute, whatever frame the elements use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    #[serde(default)]
    pub kind: FlowKind,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub label_position: Option<Point>,
}

impl Flow {
    /// Creates a sequence flow without a name or waypoints.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FlowKind::Sequence,
            source: source.into(),
            target: target.into(),
            name: None,
            condition: None,
            is_default: false,
            waypoints: Vec::new(),
            label_position: None,
        }
    }

    pub fn with_kind(mut self, kind: FlowKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Point>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Returns `true` if the flow carries a non-blank name.
    pub fn has_label(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }
}
