//! Preserve-or-layout orchestration.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info, warn};

use bpmn_layout_core::{
    geometry::{Bounds, Point},
    model::{CoordinateFrame, Element, Model},
};

use super::{
    BoundaryPositioner, FlowGraph, LaneOrganizer, OverlapResolver, boundary::is_attached,
    engine_for,
};
use crate::{
    config::{Direction, LayoutConfig, LayoutMode},
    recovery::RecoveryStrategy,
};

/// Assigns final geometry to every element, lane and pool of a model.
///
/// The output is always in the [`CoordinateFrame::ParentRelative`] frame and
/// every element has a position and a positive size.
#[derive(Debug, Clone)]
pub struct PositionResolver {
    config: LayoutConfig,
    boundary: BoundaryPositioner,
    lanes: LaneOrganizer,
    overlap: OverlapResolver,
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl PositionResolver {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
            boundary: BoundaryPositioner::new(config.swimlane()),
            lanes: LaneOrganizer::new(config.swimlane(), config.spacing()),
            overlap: OverlapResolver::new(config.spacing()),
        }
    }

    /// Resolves positions in the given mode.
    ///
    /// `Preserve` keeps the coordinates of models carrying diagram
    /// interchange data and only fills gaps; without such data it behaves
    /// like `Auto`, which recomputes everything along `direction`.
    pub fn resolve(&self, model: Model, mode: LayoutMode, direction: Direction) -> Model {
        info!(
            mode:%,
            direction:%,
            elements = model.elements.len();
            "Resolving positions"
        );
        match mode {
            LayoutMode::Preserve if model.has_di_coordinates => self.preserve(model),
            LayoutMode::Preserve => {
                info!("Model has no diagram coordinates, falling back to auto layout");
                self.auto(model, direction)
            }
            LayoutMode::Auto => self.auto(model, direction),
        }
    }

    fn auto(&self, mut model: Model, direction: Direction) -> Model {
        let mut recovery = RecoveryStrategy::with_config(self.config.recovery());
        for (index, element) in model.elements.iter_mut().enumerate() {
            recovery.recover_missing_coordinates(element, index);
        }

        self.boundary.assign_pool_parents(&mut model);
        self.boundary.pack_subprocesses(&mut model);

        let spacing = self.config.spacing();
        let origin = if model.has_swimlanes() {
            let bottom = self.lanes.organize(&mut model);
            Point::new(spacing.margin, bottom + self.config.swimlane().pool_gap)
        } else {
            Point::new(spacing.margin, spacing.margin)
        };
        self.place_free_elements(&mut model, direction, origin, &recovery);

        let moved = self.overlap.resolve(&mut model, |_| true);
        self.boundary.attach_boundary_events(&mut model, |_| true);

        for flow in &mut model.flows {
            flow.waypoints.clear();
            flow.label_position = None;
        }
        model.frame = CoordinateFrame::ParentRelative;

        info!(
            elements = model.elements.len(),
            pools = model.pools.len(),
            moved;
            "Auto layout complete"
        );
        model
    }

    /// Places elements outside any container with the configured engine.
    ///
    /// The block starts at `origin`. When the engine fails the elements fall
    /// back to the recovery grid.
    fn place_free_elements(
        &self,
        model: &mut Model,
        direction: Direction,
        origin: Point,
        recovery: &RecoveryStrategy,
    ) {
        let positions: IndexMap<String, Point> = {
            let graph = FlowGraph::new(model, is_free);
            if graph.is_empty() {
                return;
            }
            let engine = engine_for(self.config.engine(), direction, self.config.spacing());
            match engine.place(&graph) {
                Ok(positions) => positions,
                Err(err) => {
                    warn!(engine:% = self.config.engine(), err:%; "Placement engine failed");
                    let ids: HashSet<&str> = graph.ids().collect();
                    recovery
                        .recover_graphviz_failure(model)
                        .into_iter()
                        .filter(|(id, _)| ids.contains(id.as_str()))
                        .collect()
                }
            }
        };

        let Some(min) = positions
            .values()
            .copied()
            .reduce(|a, b| Point::new(a.x().min(b.x()), a.y().min(b.y())))
        else {
            return;
        };
        let offset = origin.sub_point(min);
        for element in &mut model.elements {
            if let Some(position) = positions.get(&element.id) {
                element.set_position(position.add_point(offset));
            }
        }
        debug!(placed = positions.len(); "Placed free elements");
    }

    fn preserve(&self, mut model: Model) -> Model {
        let had_position: HashSet<String> = model
            .elements
            .iter()
            .filter(|element| element.position().is_some())
            .map(|element| element.id.clone())
            .collect();

        let mut recovery = RecoveryStrategy::with_config(self.config.recovery());
        for (index, element) in model.elements.iter_mut().enumerate() {
            recovery.recover_missing_coordinates(element, index);
        }

        if model.frame == CoordinateFrame::Absolute {
            self.boundary.assign_pool_parents(&mut model);
            self.boundary.assign_host_frames(&mut model);

            let absolute: HashMap<String, Bounds> = model
                .elements
                .iter()
                .filter_map(|element| Some((element.id.clone(), element.bounds()?)))
                .collect();
            self.lanes.remap_preserved(&mut model, &absolute);
            self.boundary
                .translate_subprocess_children(&mut model, &absolute);
            model.frame = CoordinateFrame::ParentRelative;
        } else {
            debug!("Model already in parent-relative frame, filling gaps only");
        }

        let filled = |element: &Element| !had_position.contains(&element.id);
        let moved = self.overlap.resolve(&mut model, filled);
        self.boundary.attach_boundary_events(&mut model, filled);

        info!(
            preserved = had_position.len(),
            filled = model.elements.len() - had_position.len(),
            moved;
            "Preserve layout complete"
        );
        model
    }
}

/// Elements positioned by the free-graph engine: no structural container
/// and not following a host.
fn is_free(element: &Element) -> bool {
    element.parent_id.is_none() && element.subprocess_id.is_none() && !is_attached(element)
}
