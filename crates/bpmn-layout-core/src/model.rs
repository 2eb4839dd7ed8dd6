//! The process model consumed and produced by the layout engine.
//!
//! A [`Model`] is built by a BPMN parser, repaired and positioned by
//! `bpmn-layout`, and finally handed to a diagram serializer.
//!
//! # Coordinate frames
//!
//! Parser output carries BPMN DI coordinates, which are diagram-absolute
//! ([`CoordinateFrame::Absolute`]). After resolution every container owns its
//! children's coordinates ([`CoordinateFrame::ParentRelative`]):
//!
//! - pools are diagram-absolute
//! - lanes are relative to their pool
//! - an element with a `subprocess_id` is relative to that subprocess
//! - any other element is relative to its lane or pool parent, or absolute
//!   when it has no parent
//!
//! [`Model::absolute_bounds`] maps an element back to diagram space in either frame.

mod element;
mod flow;
mod swimlane;

pub use element::{Element, ElementCategory, ElementKind};
pub use flow::{Flow, FlowKind};
pub use swimlane::{Lane, Pool};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point};

/// Frame in which element and lane coordinates are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateFrame {
    #[default]
    Absolute,
    ParentRelative,
}

/// A complete process diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub process_id: String,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub lanes: Vec<Lane>,
    /// Whether the source carried diagram-interchange coordinates.
    #[serde(default)]
    pub has_di_coordinates: bool,
    #[serde(default)]
    pub frame: CoordinateFrame,
}

impl Model {
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            ..Self::default()
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|element| element.id == id)
    }

    pub fn element_index(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    pub fn pool(&self, id: &str) -> Option<&Pool> {
        self.pools.iter().find(|pool| pool.id == id)
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    pub fn element_ids(&self) -> HashSet<&str> {
        self.elements.iter().map(|element| element.id.as_str()).collect()
    }

    /// Ids that may appear as an element's `parent_id`.
    pub fn container_ids(&self) -> HashSet<&str> {
        self.pools
            .iter()
            .map(|pool| pool.id.as_str())
            .chain(self.lanes.iter().map(|lane| lane.id.as_str()))
            .collect()
    }

    /// Lanes of a pool in the pool's declared order.
    pub fn pool_lanes(&self, pool: &Pool) -> Vec<&Lane> {
        pool.lane_ids
            .iter()
            .filter_map(|lane_id| self.lane(lane_id))
            .collect()
    }

    /// Pool that owns the given container id, which may be a pool or a lane.
    pub fn owning_pool(&self, container_id: &str) -> Option<&Pool> {
        if let Some(pool) = self.pool(container_id) {
            return Some(pool);
        }
        let lane = self.lane(container_id)?;
        self.pool(&lane.pool_id)
    }

    /// Returns `true` if the model declares any pool.
    pub fn has_swimlanes(&self) -> bool {
        !self.pools.is_empty()
    }

    /// Returns `true` once every element is fully positioned.
    pub fn is_resolved(&self) -> bool {
        self.elements.iter().all(Element::is_resolved)
    }

    /// Diagram-absolute origin of a pool or lane in the current frame.
    pub fn container_origin(&self, container_id: &str) -> Option<Point> {
        if let Some(pool) = self.pool(container_id) {
            return pool.position();
        }
        let lane = self.lane(container_id)?;
        let lane_position = Point::new(lane.x?, lane.y?);
        match self.frame {
            CoordinateFrame::Absolute => Some(lane_position),
            CoordinateFrame::ParentRelative => {
                let pool_origin = self
                    .pool(&lane.pool_id)
                    .and_then(Pool::position)
                    .unwrap_or_default();
                Some(pool_origin.add_point(lane_position))
            }
        }
    }

    /// Diagram-absolute bounds of an element, if its geometry is set.
    pub fn absolute_bounds(&self, id: &str) -> Option<Bounds> {
        self.absolute_bounds_at_depth(id, self.elements.len() + 1)
    }

    fn absolute_bounds_at_depth(&self, id: &str, depth: usize) -> Option<Bounds> {
        let element = self.element(id)?;
        let local = element.bounds()?;
        if self.frame == CoordinateFrame::Absolute || depth == 0 {
            return Some(local);
        }

        let offset = if let Some(subprocess) = element
            .subprocess_id
            .as_deref()
            .filter(|subprocess_id| *subprocess_id != id)
            .and_then(|subprocess_id| self.absolute_bounds_at_depth(subprocess_id, depth - 1))
        {
            subprocess.min_point()
        } else {
            element
                .parent_id
                .as_deref()
                .and_then(|parent_id| self.container_origin(parent_id))
                .unwrap_or_default()
        };
        Some(local.translate(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_model() -> Model {
        let mut model = Model::new("p1");
        model.frame = CoordinateFrame::ParentRelative;
        model.pools.push(
            Pool::new("pool", "Pool")
                .with_bounds(100.0, 50.0, 600.0, 300.0)
                .with_lanes(["lane"]),
        );
        model.lanes.push(Lane::new("lane", "Lane", "pool").with_bounds(30.0, 0.0, 570.0, 300.0));
        model.elements.push(
            Element::new("sub", "subProcess")
                .with_bounds(40.0, 20.0, 300.0, 200.0)
                .with_parent("lane"),
        );
        model.elements.push(
            Element::new("inner", "task")
                .with_bounds(10.0, 30.0, 120.0, 80.0)
                .with_parent("lane")
                .with_subprocess("sub"),
        );
        model
    }

    #[test]
    fn test_absolute_bounds_walks_containers() {
        let model = nested_model();
        let sub = model.absolute_bounds("sub").expect("sub resolved");
        assert_eq!(sub.min_point(), Point::new(170.0, 70.0));

        let inner = model.absolute_bounds("inner").expect("inner resolved");
        assert_eq!(inner.min_point(), Point::new(180.0, 100.0));
    }

    #[test]
    fn test_absolute_frame_is_identity() {
        let mut model = nested_model();
        model.frame = CoordinateFrame::Absolute;
        let inner = model.absolute_bounds("inner").expect("inner resolved");
        assert_eq!(inner.min_point(), Point::new(10.0, 30.0));
    }

    #[test]
    fn test_self_referencing_subprocess_terminates() {
        let mut model = nested_model();
        model.elements[0].subprocess_id = Some("inner".to_string());
        model.elements[1].subprocess_id = Some("sub".to_string());
        assert!(model.absolute_bounds("inner").is_some());
    }

    #[test]
    fn test_container_ids_and_owning_pool() {
        let model = nested_model();
        let ids = model.container_ids();
        assert!(ids.contains("pool"));
        assert!(ids.contains("lane"));
        assert_eq!(model.owning_pool("lane").map(|pool| pool.id.as_str()), Some("pool"));
    }

    #[test]
    fn test_model_json_roundtrip_defaults() {
        let json = r#"{
            "process_id": "p",
            "elements": [{"id": "s", "kind": "startEvent", "type_tag": "startEvent"}],
            "flows": [{"id": "f", "source": "s", "target": "s"}]
        }"#;
        let model: Model = serde_json::from_str(json).expect("valid model json");
        assert_eq!(model.frame, CoordinateFrame::Absolute);
        assert_eq!(model.flows[0].kind, FlowKind::Sequence);
        assert!(model.elements[0].x.is_none());
    }

    #[test]
    fn test_model_json_keeps_properties_and_flow_kind() {
        let mut model = Model::new("p");
        model
            .elements
            .push(Element::new("t", "userTask").with_property("assignee", "ops"));
        model
            .flows
            .push(Flow::new("m", "t", "t").with_kind(FlowKind::Message));

        let json = serde_json::to_string(&model).expect("model serializes");
        let decoded: Model = serde_json::from_str(&json).expect("model decodes");
        assert_eq!(decoded, model);
        assert_eq!(
            decoded.elements[0].properties.get("assignee").map(String::as_str),
            Some("ops")
        );
    }
}
