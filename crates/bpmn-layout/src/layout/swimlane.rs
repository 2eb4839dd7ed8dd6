//! Pool and lane sizing.

use bpmn_layout_core::{
    geometry::{Bounds, Size},
    model::{Element, Lane, Pool},
};

use super::Axis;
use crate::config::SwimlaneConfig;

/// Smallest width a pool without explicit dimensions is given.
pub const MIN_POOL_WIDTH: f32 = 400.0;
/// Smallest height a pool without explicit dimensions is given.
pub const MIN_POOL_HEIGHT: f32 = 150.0;

/// Computes pool and lane dimensions from their content.
#[derive(Debug, Clone, Default)]
pub struct SwimlaneSizer {
    config: SwimlaneConfig,
}

impl SwimlaneSizer {
    pub fn new(config: &SwimlaneConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Size of `pool`.
    ///
    /// Explicit dimensions always win, even when they are too small for the
    /// content. Otherwise the pool covers its content plus padding, at least
    /// [`MIN_POOL_WIDTH`] × [`MIN_POOL_HEIGHT`], and at least the stacked
    /// extent of its lanes. Element and lane coordinates must be expressed in
    /// the pool's own frame.
    pub fn calculate_pool_size(&self, pool: &Pool, elements: &[&Element], lanes: &[&Lane]) -> Size {
        if let Some(size) = pool.explicit_size().filter(|size| size.is_positive()) {
            return size;
        }

        let padding = self.config.lane_padding;
        let mut extent = Size::default();

        for bounds in elements.iter().filter_map(|element| element.bounds()) {
            extent = extent.max(Size::new(bounds.max_x() + padding, bounds.max_y() + padding));
        }
        for bounds in lanes.iter().filter_map(|lane| lane.bounds()) {
            extent = extent.max(Size::new(bounds.max_x(), bounds.max_y()));
        }

        // Lanes stack along the cross axis starting at zero; the header strip
        // sits at the start of the main axis.
        let axis = Axis::for_pool(pool.horizontal);
        let stacked: f32 = lanes
            .iter()
            .map(|lane| {
                lane.bounds()
                    .map(|bounds| axis.cross(bounds.to_size()))
                    .unwrap_or(self.config.lane_min_size)
            })
            .sum();
        extent = extent.max(axis.size(0.0, stacked));

        Size::new(
            extent.width().max(MIN_POOL_WIDTH),
            extent.height().max(MIN_POOL_HEIGHT),
        )
    }

    /// Cross-axis extent of a lane holding `members`.
    ///
    /// The lane fits its largest member plus padding on both sides and never
    /// drops below the configured lane minimum.
    pub fn calculate_lane_extent(&self, members: &[&Element], horizontal: bool) -> f32 {
        let axis = Axis::for_pool(horizontal);
        let largest = members
            .iter()
            .map(|element| axis.cross(element.size_or_default()))
            .fold(0.0_f32, f32::max);
        (largest + 2.0 * self.config.lane_padding).max(self.config.lane_min_size)
    }

    /// Main-axis length needed to line up `members` inside a lane.
    pub fn calculate_lane_length(&self, members: &[&Element], horizontal: bool) -> f32 {
        let axis = Axis::for_pool(horizontal);
        let total: f32 = members
            .iter()
            .map(|element| axis.main(element.size_or_default()))
            .sum();
        let gaps = members.len().saturating_sub(1) as f32 * self.config.element_spacing;
        total + gaps + 2.0 * self.config.lane_padding
    }

    /// Bounds covering every given box, or `None` when there are none.
    pub fn content_bounds(boxes: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
        boxes.into_iter().reduce(|acc, bounds| acc.merge(&bounds))
    }

    pub fn config(&self) -> &SwimlaneConfig {
        &self.config
    }
}
