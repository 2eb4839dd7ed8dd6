//! Repair of broken or incomplete process models.
//!
//! [`RecoveryStrategy`] is the only component allowed to drop data. Every
//! repair is one-way and counted in a [`RecoveryReport`]; the counters belong
//! to the strategy instance, so independent runs never interfere.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, warn};

use bpmn_layout_core::{
    geometry::Point,
    model::{Element, ElementKind, Flow, Model},
};

use crate::config::RecoveryConfig;

/// Property under which the unrecognized source tag is kept.
pub const ORIGINAL_TYPE_PROPERTY: &str = "original_type";

/// Repairs performed, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Elements whose tag had no known mapping.
    pub unknown_types: usize,
    /// Elements that received default coordinates.
    pub coordinates: usize,
    /// Elements that received default dimensions.
    pub dimensions: usize,
    /// Elements whose parent reference was cleared.
    pub parents: usize,
    /// Other dangling references removed: lanes, lane members, subprocess and
    /// host references, duplicate elements.
    pub references: usize,
    /// Flows dropped because an endpoint does not exist.
    pub flows_dropped: usize,
}

impl RecoveryReport {
    /// Total number of repairs.
    pub fn total(&self) -> usize {
        self.unknown_types
            + self.coordinates
            + self.dimensions
            + self.parents
            + self.references
            + self.flows_dropped
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Repairs counted after `earlier` was taken.
    fn since(&self, earlier: &RecoveryReport) -> RecoveryReport {
        RecoveryReport {
            unknown_types: self.unknown_types - earlier.unknown_types,
            coordinates: self.coordinates - earlier.coordinates,
            dimensions: self.dimensions - earlier.dimensions,
            parents: self.parents - earlier.parents,
            references: self.references - earlier.references,
            flows_dropped: self.flows_dropped - earlier.flows_dropped,
        }
    }
}

/// Deterministic, single-pass repair of model data.
#[derive(Debug, Clone)]
pub struct RecoveryStrategy {
    grid: RecoveryConfig,
    report: RecoveryReport,
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryStrategy {
    pub fn new() -> Self {
        Self::with_config(&RecoveryConfig::default())
    }

    pub fn with_config(config: &RecoveryConfig) -> Self {
        Self {
            grid: config.clone(),
            report: RecoveryReport::default(),
        }
    }

    /// Repairs accumulated by this instance so far.
    pub fn report(&self) -> &RecoveryReport {
        &self.report
    }

    pub fn repair_count(&self) -> usize {
        self.report.total()
    }

    /// Top-left corner of the grid cell reserved for `index`.
    pub fn grid_position(&self, index: usize) -> Point {
        let columns = self.grid.grid_columns.max(1);
        let column = (index % columns) as f32;
        let row = (index / columns) as f32;
        Point::new(
            self.grid.origin_x + column * self.grid.cell_width.max(1.0),
            self.grid.origin_y + row * self.grid.cell_height.max(1.0),
        )
    }

    /// Fills unset geometry of `element`; set values are never overwritten.
    ///
    /// Missing `x`/`y` come from the grid cell of `index`. Missing or
    /// non-positive `width`/`height` come from the element kind's default size.
    /// Returns `true` if anything changed.
    pub fn recover_missing_coordinates(&mut self, element: &mut Element, index: usize) -> bool {
        let mut changed = false;

        if element.x.is_none() || element.y.is_none() {
            let cell = self.grid_position(index);
            element.x = element.x.or(Some(cell.x()));
            element.y = element.y.or(Some(cell.y()));
            self.report.coordinates += 1;
            changed = true;
        }

        let default_size = element.kind.default_size();
        let width_missing = element.width.is_none_or(|width| width <= 0.0);
        let height_missing = element.height.is_none_or(|height| height <= 0.0);
        if width_missing || height_missing {
            if width_missing {
                element.width = Some(default_size.width());
            }
            if height_missing {
                element.height = Some(default_size.height());
            }
            self.report.dimensions += 1;
            changed = true;
        }

        if changed {
            debug!(element = element.id, index; "Defaulted element geometry");
        }
        changed
    }

    /// Clears `parent_id` when it names no valid container.
    pub fn recover_invalid_parent(
        &mut self,
        element: &mut Element,
        valid_parent_ids: &HashSet<&str>,
    ) -> bool {
        let Some(parent_id) = element.parent_id.as_deref() else {
            return false;
        };
        if valid_parent_ids.contains(parent_id) {
            return false;
        }
        warn!(element = element.id, parent = parent_id; "Clearing invalid parent reference");
        element.parent_id = None;
        self.report.parents += 1;
        true
    }

    /// Style to render an element whose tag has no known mapping.
    pub fn recover_unknown_element_type(&mut self, element: &Element) -> &'static str {
        warn!(
            element = element.id,
            type_tag = element.type_tag;
            "Unknown element type, falling back to task"
        );
        self.report.unknown_types += 1;
        ElementKind::Task.style()
    }

    /// Returns `false` (drop) when either endpoint of `flow` is missing.
    pub fn recover_invalid_flow(&mut self, flow: &Flow, element_ids: &HashSet<&str>) -> bool {
        if element_ids.contains(flow.source.as_str()) && element_ids.contains(flow.target.as_str())
        {
            return true;
        }
        warn!(
            flow = flow.id,
            source = flow.source,
            target = flow.target;
            "Dropping flow with dangling endpoint"
        );
        self.report.flows_dropped += 1;
        false
    }

    /// Grid positions for every element, used when an external layout engine
    /// is unavailable or fails. Positions are pairwise distinct.
    pub fn recover_graphviz_failure(&self, model: &Model) -> IndexMap<String, Point> {
        warn!(elements = model.elements.len(); "External layout unavailable, using grid fallback");
        model
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| (element.id.clone(), self.grid_position(index)))
            .collect()
    }

    /// Applies every repair to a whole model.
    ///
    /// Returns the repaired model together with the repairs made by this call.
    /// Running it again on its own output repairs nothing.
    pub fn recover_model(&mut self, mut model: Model) -> (Model, RecoveryReport) {
        let before = self.report;

        self.drop_duplicate_elements(&mut model);
        self.normalize_unknown_types(&mut model);
        self.repair_swimlanes(&mut model);
        self.repair_element_references(&mut model);

        for (index, element) in model.elements.iter_mut().enumerate() {
            self.recover_missing_coordinates(element, index);
        }

        let flows = std::mem::take(&mut model.flows);
        let element_ids: HashSet<String> =
            model.elements.iter().map(|element| element.id.clone()).collect();
        let id_refs: HashSet<&str> = element_ids.iter().map(String::as_str).collect();
        model.flows = flows
            .into_iter()
            .filter(|flow| self.recover_invalid_flow(flow, &id_refs))
            .collect();

        let report = self.report.since(&before);
        info!(
            repairs = report.total(),
            flows_dropped = report.flows_dropped;
            "Model recovered"
        );
        (model, report)
    }

    fn drop_duplicate_elements(&mut self, model: &mut Model) {
        let mut seen = HashSet::new();
        let before = model.elements.len();
        model.elements.retain(|element| seen.insert(element.id.clone()));
        let dropped = before - model.elements.len();
        if dropped > 0 {
            warn!(dropped; "Dropped elements with duplicate ids");
            self.report.references += dropped;
        }
    }

    fn normalize_unknown_types(&mut self, model: &mut Model) {
        for element in &mut model.elements {
            if !element.has_unknown_type() {
                continue;
            }
            self.recover_unknown_element_type(element);
            let original = std::mem::replace(&mut element.type_tag, ElementKind::Task.tag().into());
            element
                .properties
                .entry(ORIGINAL_TYPE_PROPERTY.to_string())
                .or_insert(original);
            element.kind = ElementKind::Task;
        }
    }

    /// Drops lanes of unknown pools and keeps pool and lane lists consistent.
    fn repair_swimlanes(&mut self, model: &mut Model) {
        let pool_ids: HashSet<String> = model.pools.iter().map(|pool| pool.id.clone()).collect();
        let lanes_before = model.lanes.len();
        model.lanes.retain(|lane| pool_ids.contains(&lane.pool_id));
        self.report.references += lanes_before - model.lanes.len();

        for pool in &mut model.pools {
            let before = pool.lane_ids.len();
            let lanes = &model.lanes;
            pool.lane_ids.retain(|lane_id| {
                lanes
                    .iter()
                    .any(|lane| &lane.id == lane_id && lane.pool_id == pool.id)
            });
            self.report.references += before - pool.lane_ids.len();

            for lane in lanes.iter().filter(|lane| lane.pool_id == pool.id) {
                if !pool.lane_ids.contains(&lane.id) {
                    pool.lane_ids.push(lane.id.clone());
                    self.report.references += 1;
                }
            }
        }

        let element_ids: HashSet<String> =
            model.elements.iter().map(|element| element.id.clone()).collect();
        for lane in &mut model.lanes {
            let before = lane.element_refs.len();
            lane.element_refs.retain(|id| element_ids.contains(id));
            self.report.references += before - lane.element_refs.len();
        }
    }

    fn repair_element_references(&mut self, model: &mut Model) {
        let container_ids: HashSet<String> = model
            .container_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        let valid_parents: HashSet<&str> = container_ids.iter().map(String::as_str).collect();
        let subprocess_ids: HashSet<String> = model
            .elements
            .iter()
            .filter(|element| element.kind.is_container())
            .map(|element| element.id.clone())
            .collect();
        let element_ids: HashSet<String> =
            model.elements.iter().map(|element| element.id.clone()).collect();

        for element in &mut model.elements {
            self.recover_invalid_parent(element, &valid_parents);

            if let Some(subprocess_id) = element.subprocess_id.as_deref() {
                if subprocess_id == element.id || !subprocess_ids.contains(subprocess_id) {
                    warn!(element = element.id, subprocess = subprocess_id; "Clearing invalid subprocess reference");
                    element.subprocess_id = None;
                    self.report.references += 1;
                }
            }

            if let Some(host_id) = element.attached_to.as_deref() {
                if host_id == element.id || !element_ids.contains(host_id) {
                    warn!(element = element.id, host = host_id; "Clearing invalid boundary host");
                    element.attached_to = None;
                    self.report.references += 1;
                }
            }
        }
    }
}
