//! Pool stacking and lane content placement.
//!
//! In auto mode pools are stacked top to bottom, lanes are stacked inside
//! their pool, and lane members are lined up in `element_refs` order.
//! In preserve mode diagram-absolute coordinates are re-expressed relative
//! to each element's lane or pool.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use bpmn_layout_core::{
    geometry::{Bounds, Point, Size},
    model::{Element, Lane, Model, Pool},
};

use super::{Axis, SwimlaneSizer, boundary::is_attached};
use crate::config::{SpacingConfig, SwimlaneConfig};

/// Positions pools, lanes and their member elements.
#[derive(Debug, Clone, Default)]
pub struct LaneOrganizer {
    sizer: SwimlaneSizer,
    margin: f32,
}

impl LaneOrganizer {
    pub fn new(swimlane: &SwimlaneConfig, spacing: &SpacingConfig) -> Self {
        Self {
            sizer: SwimlaneSizer::new(swimlane),
            margin: spacing.margin,
        }
    }

    /// Lays out every pool, stacked from the top margin.
    ///
    /// Returns the y coordinate just below the last pool, or the margin when
    /// the model has no pools.
    pub fn organize(&self, model: &mut Model) -> f32 {
        let gap = self.sizer.config().pool_gap;
        let mut cursor = self.margin;
        let mut bottom = self.margin;

        for pool_index in 0..model.pools.len() {
            let pool = model.pools[pool_index].clone();
            let size = if model.pool_lanes(&pool).is_empty() {
                self.organize_lane_less(model, &pool)
            } else {
                self.organize_lanes(model, &pool)
            };
            let bounds = Bounds::new_from_top_left(Point::new(self.margin, cursor), size);
            model.pools[pool_index].set_bounds(bounds);
            debug!(
                pool = pool.id,
                width = size.width(),
                height = size.height();
                "Organized pool"
            );
            bottom = bounds.max_y();
            cursor = bottom + gap;
        }

        bottom
    }

    /// Places the members of a pool without lanes in one row.
    fn organize_lane_less(&self, model: &mut Model, pool: &Pool) -> Size {
        let config = self.sizer.config();
        let axis = Axis::for_pool(pool.horizontal);
        let members: Vec<usize> = model
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.parent_id.as_deref() == Some(pool.id.as_str()))
            .filter(|(_, element)| is_row_member(element))
            .map(|(index, _)| index)
            .collect();

        let row = members
            .iter()
            .map(|&index| axis.cross(model.elements[index].size_or_default()))
            .fold(0.0_f32, f32::max);
        let mut main = config.header_size + config.lane_padding;
        for &index in &members {
            let element = &mut model.elements[index];
            let size = element.size_or_default();
            let cross = config.lane_padding + (row - axis.cross(size)) / 2.0;
            element.set_size(size);
            element.set_position(axis.point(main, cross));
            main += axis.main(size) + config.element_spacing;
        }

        let refs: Vec<&Element> = members.iter().map(|&index| &model.elements[index]).collect();
        self.sizer.calculate_pool_size(pool, &refs, &[])
    }

    /// Stacks the lanes of a pool and lines up each lane's members.
    fn organize_lanes(&self, model: &mut Model, pool: &Pool) -> Size {
        let config = self.sizer.config().clone();
        let axis = Axis::for_pool(pool.horizontal);
        let lane_ids: Vec<String> = model
            .pool_lanes(pool)
            .iter()
            .map(|lane| lane.id.clone())
            .collect();

        let mut claimed = HashSet::new();
        let mut lanes: Vec<(String, Vec<usize>, f32)> = Vec::with_capacity(lane_ids.len());
        let mut content_length = 0.0_f32;
        for (position, lane_id) in lane_ids.iter().enumerate() {
            let members = lane_members(model, lane_id, &pool.id, position == 0, &mut claimed);
            let refs: Vec<&Element> = members.iter().map(|&index| &model.elements[index]).collect();
            let extent = self.sizer.calculate_lane_extent(&refs, pool.horizontal);
            content_length =
                content_length.max(self.sizer.calculate_lane_length(&refs, pool.horizontal));
            lanes.push((lane_id.clone(), members, extent));
        }

        // Provisional lane boxes drive the pool size; lanes then span the
        // pool's full main extent.
        let mut offset = 0.0;
        let mut provisional = Vec::with_capacity(lanes.len());
        for (lane_id, _, extent) in &lanes {
            let mut lane = Lane::new(lane_id.clone(), "", pool.id.clone());
            lane.set_bounds(Bounds::new_from_top_left(
                axis.point(config.header_size, offset),
                axis.size(content_length, *extent),
            ));
            provisional.push(lane);
            offset += extent;
        }
        let provisional_refs: Vec<&Lane> = provisional.iter().collect();
        let size = self.sizer.calculate_pool_size(pool, &[], &provisional_refs);

        let lane_length = (axis.main(size) - config.header_size).max(0.0);
        let slack = (axis.cross(size) - offset).max(0.0);
        let mut offset = 0.0;
        let last = lanes.len().saturating_sub(1);
        for (position, (lane_id, members, extent)) in lanes.iter().enumerate() {
            let extent = if position == last { extent + slack } else { *extent };
            if let Some(lane) = model.lanes.iter_mut().find(|lane| &lane.id == lane_id) {
                lane.set_bounds(Bounds::new_from_top_left(
                    axis.point(config.header_size, offset),
                    axis.size(lane_length, extent),
                ));
            }

            let mut main = config.lane_padding;
            for &index in members {
                let element = &mut model.elements[index];
                let element_size = element.size_or_default();
                let cross = (extent - axis.cross(element_size)) / 2.0;
                element.parent_id = Some(lane_id.clone());
                element.set_size(element_size);
                element.set_position(axis.point(main, cross));
                main += axis.main(element_size) + config.element_spacing;
            }
            offset += extent;
        }

        size
    }

    /// Re-expresses diagram-absolute coordinates relative to containers.
    ///
    /// Pools stay diagram-absolute and are sized with [`SwimlaneSizer`] when
    /// they lack dimensions. Lanes become relative to their pool. Elements
    /// parented to a lane or pool become relative to it; subprocess children
    /// are left to the boundary positioner. `absolute` holds the bounds of
    /// every element taken before any conversion.
    pub fn remap_preserved(&self, model: &mut Model, absolute: &HashMap<String, Bounds>) {
        let mut cursor = self.margin;
        let mut origins: HashMap<String, Point> = HashMap::new();

        for pool_index in 0..model.pools.len() {
            let pool = model.pools[pool_index].clone();
            let origin = self.remap_pool(model, &pool, absolute, cursor);
            if let Some(bounds) = model.pools[pool_index].bounds() {
                cursor = cursor.max(bounds.max_y() + self.sizer.config().pool_gap);
            }
            origins.insert(pool.id.clone(), origin);
            for lane in model.lanes.iter().filter(|lane| lane.pool_id == pool.id) {
                if let Some(position) = lane.bounds().map(Bounds::min_point) {
                    origins.insert(lane.id.clone(), origin.add_point(position));
                }
            }
        }

        let mut converted = 0;
        for element in &mut model.elements {
            if element.subprocess_id.is_some() {
                continue;
            }
            let (Some(parent_id), Some(bounds)) =
                (element.parent_id.as_deref(), absolute.get(&element.id))
            else {
                continue;
            };
            let Some(origin) = origins.get(parent_id) else {
                continue;
            };
            element.set_position(bounds.min_point().sub_point(*origin));
            converted += 1;
        }
        info!(elements = converted; "Converted preserved coordinates to container frames");
    }

    /// Fixes one pool's bounds and converts its lanes. Returns the pool's
    /// diagram-absolute origin.
    fn remap_pool(
        &self,
        model: &mut Model,
        pool: &Pool,
        absolute: &HashMap<String, Bounds>,
        cursor: f32,
    ) -> Point {
        let config = self.sizer.config().clone();
        let axis = Axis::for_pool(pool.horizontal);
        let lane_ids: HashSet<String> = model
            .lanes
            .iter()
            .filter(|lane| lane.pool_id == pool.id)
            .map(|lane| lane.id.clone())
            .collect();

        let members: Vec<(Element, Bounds)> = model
            .elements
            .iter()
            .filter(|element| element.subprocess_id.is_none())
            .filter(|element| {
                element
                    .parent_id
                    .as_ref()
                    .is_some_and(|parent| parent == &pool.id || lane_ids.contains(parent))
            })
            .filter_map(|element| Some((element.clone(), *absolute.get(&element.id)?)))
            .collect();

        let content = SwimlaneSizer::content_bounds(
            members
                .iter()
                .map(|(_, bounds)| *bounds)
                .chain(model.lanes.iter().filter(|l| lane_ids.contains(&l.id)).filter_map(Lane::bounds)),
        );
        let origin = pool.position().unwrap_or_else(|| match content {
            Some(content) => content.min_point().sub_point(axis.point(
                config.header_size + config.lane_padding,
                config.lane_padding,
            )),
            None => Point::new(self.margin, cursor),
        });

        // Lanes with DI bounds become pool-relative; the others are derived
        // from their members or stacked after the previous lane.
        let mut lanes: Vec<Lane> = model
            .pool_lanes(pool)
            .into_iter()
            .cloned()
            .collect();
        let mut next_cross = 0.0_f32;
        let mut derived = HashSet::new();
        for lane in &mut lanes {
            if let Some(bounds) = lane.bounds() {
                let relative = bounds.translate(Point::new(-origin.x(), -origin.y()));
                lane.set_bounds(relative);
                next_cross = next_cross.max(axis.cross_of(relative.min_point()) + axis.cross(relative.to_size()));
                continue;
            }
            let lane_content = SwimlaneSizer::content_bounds(
                members
                    .iter()
                    .filter(|(element, _)| element.parent_id.as_deref() == Some(lane.id.as_str()))
                    .map(|(_, bounds)| bounds.translate(Point::new(-origin.x(), -origin.y()))),
            );
            let (start, extent) = match lane_content {
                Some(content) => {
                    let start = (axis.cross_of(content.min_point()) - config.lane_padding).max(next_cross);
                    let end = axis.cross_of(content.min_point())
                        + axis.cross(content.to_size())
                        + config.lane_padding;
                    (start, (end - start).max(config.lane_min_size))
                }
                None => (next_cross, config.lane_min_size),
            };
            lane.set_bounds(Bounds::new_from_top_left(
                axis.point(config.header_size, start),
                axis.size(0.0, extent),
            ));
            derived.insert(lane.id.clone());
            next_cross = start + extent;
        }

        let relative_members: Vec<Element> = members
            .iter()
            .map(|(element, bounds)| {
                let mut element = element.clone();
                element.set_position(bounds.min_point().sub_point(origin));
                element
            })
            .collect();
        let member_refs: Vec<&Element> = relative_members.iter().collect();
        let lane_refs: Vec<&Lane> = lanes.iter().collect();
        let size = self.sizer.calculate_pool_size(pool, &member_refs, &lane_refs);

        let lane_length = (axis.main(size) - config.header_size).max(0.0);
        for lane in lanes {
            let Some(mut bounds) = lane.bounds() else {
                continue;
            };
            if derived.contains(&lane.id) {
                bounds = Bounds::new_from_top_left(
                    bounds.min_point(),
                    axis.size(lane_length, axis.cross(bounds.to_size())),
                );
            }
            if let Some(target) = model.lanes.iter_mut().find(|l| l.id == lane.id) {
                target.set_bounds(bounds);
            }
        }

        if let Some(target) = model.pools.iter_mut().find(|p| p.id == pool.id) {
            target.set_bounds(Bounds::new_from_top_left(origin, size));
        }
        origin
    }
}

/// Elements lined up in lane rows: neither subprocess content nor attached
/// boundary events.
fn is_row_member(element: &Element) -> bool {
    element.subprocess_id.is_none() && !is_attached(element)
}

/// Members of a lane in placement order.
///
/// Listed elements come first in `element_refs` order, then elements
/// parented to the lane in model order. The first lane of a pool also takes
/// the remaining elements parented directly to the pool. An element's lane
/// parent, when it has one, overrides a listing in another lane.
fn lane_members(
    model: &Model,
    lane_id: &str,
    pool_id: &str,
    first_lane: bool,
    claimed: &mut HashSet<String>,
) -> Vec<usize> {
    let accepts_parent = |parent: Option<&str>| match parent {
        None => true,
        Some(parent) => parent == lane_id || parent == pool_id,
    };

    let mut members = Vec::new();
    if let Some(lane) = model.lane(lane_id) {
        for id in &lane.element_refs {
            let Some(index) = model.element_index(id) else {
                continue;
            };
            let element = &model.elements[index];
            if is_row_member(element)
                && accepts_parent(element.parent_id.as_deref())
                && claimed.insert(element.id.clone())
            {
                members.push(index);
            }
        }
    }

    for (index, element) in model.elements.iter().enumerate() {
        let parent = element.parent_id.as_deref();
        let belongs = parent == Some(lane_id) || (first_lane && parent == Some(pool_id));
        if belongs && is_row_member(element) && claimed.insert(element.id.clone()) {
            members.push(index);
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer() -> LaneOrganizer {
        LaneOrganizer::new(&SwimlaneConfig::default(), &SpacingConfig::default())
    }

    fn two_lane_model() -> Model {
        let mut model = Model::new("p");
        model
            .pools
            .push(Pool::new("pool", "Pool").with_lanes(["l1", "l2"]));
        model
            .lanes
            .push(Lane::new("l1", "First", "pool").with_elements(["b", "a"]));
        model.lanes.push(Lane::new("l2", "Second", "pool").with_elements(["c"]));
        model.elements.push(Element::new("a", "task").with_parent("l1"));
        model.elements.push(Element::new("b", "startEvent").with_parent("l1"));
        model.elements.push(Element::new("c", "task").with_parent("l2"));
        model.elements.push(Element::new("d", "endEvent").with_parent("l2"));
        model.elements.push(Element::new("e", "task").with_parent("pool"));
        model
    }

    #[test]
    fn test_lanes_stack_in_declared_order() {
        let mut model = two_lane_model();
        organizer().organize(&mut model);

        let first = model.lane("l1").and_then(Lane::bounds).expect("l1 placed");
        let second = model.lane("l2").and_then(Lane::bounds).expect("l2 placed");
        assert_eq!(first.min_y(), 0.0);
        assert_eq!(second.min_y(), first.max_y());
        assert_eq!(first.min_x(), 30.0);

        let pool = model.pool("pool").and_then(Pool::bounds).expect("pool placed");
        assert_eq!(first.width(), pool.width() - 30.0);
        assert!(pool.width() >= 400.0 && pool.height() >= 150.0);
        assert_eq!(pool.height(), first.height() + second.height());
    }

    #[test]
    fn test_members_follow_element_refs_then_model_order() {
        let mut model = two_lane_model();
        organizer().organize(&mut model);

        let x = |id: &str| model.element(id).and_then(|e| e.x).expect("placed");
        assert!(x("b") < x("a"));
        assert!(x("a") < x("e"));
        assert!(x("c") < x("d"));
        assert_eq!(model.element("e").and_then(|e| e.parent_id.as_deref()), Some("l1"));

        let boxes: Vec<Bounds> = ["b", "a", "e"]
            .iter()
            .filter_map(|id| model.element(id).and_then(Element::bounds))
            .collect();
        for pair in boxes.windows(2) {
            assert!(!pair[0].intersects(&pair[1]));
        }
    }

    #[test]
    fn test_lane_less_pool_row_and_minimum_size() {
        let mut model = Model::new("p");
        model.pools.push(Pool::new("pool", "Pool"));
        model.elements.push(Element::new("a", "task").with_parent("pool"));
        model.elements.push(Element::new("b", "task").with_parent("pool"));

        let bottom = organizer().organize(&mut model);
        let pool = model.pool("pool").and_then(Pool::bounds).expect("pool placed");
        assert!(pool.width() >= 400.0);
        assert!(pool.height() >= 150.0);
        assert_eq!(bottom, pool.max_y());

        let a = model.element("a").and_then(Element::bounds).expect("a placed");
        let b = model.element("b").and_then(Element::bounds).expect("b placed");
        assert!(a.max_x() < b.min_x());
        assert!(a.min_x() >= 30.0);
    }

    #[test]
    fn test_pools_stack_with_gap() {
        let mut model = Model::new("p");
        model.pools.push(Pool::new("one", "One"));
        model.pools.push(Pool::new("two", "Two").with_bounds(0.0, 0.0, 500.0, 200.0));
        organizer().organize(&mut model);

        let one = model.pool("one").and_then(Pool::bounds).expect("placed");
        let two = model.pool("two").and_then(Pool::bounds).expect("placed");
        assert_eq!(two.min_y(), one.max_y() + 40.0);
        assert_eq!(two.to_size(), Size::new(500.0, 200.0));
    }

    #[test]
    fn test_vertical_pool_stacks_lanes_horizontally() {
        let mut model = Model::new("p");
        model
            .pools
            .push(Pool::new("pool", "Pool").vertical().with_lanes(["l1", "l2"]));
        model.lanes.push(Lane::new("l1", "L1", "pool"));
        model.lanes.push(Lane::new("l2", "L2", "pool"));
        model.elements.push(Element::new("a", "task").with_parent("l1"));
        model.elements.push(Element::new("b", "task").with_parent("l1"));

        organizer().organize(&mut model);
        let first = model.lane("l1").and_then(Lane::bounds).expect("placed");
        let second = model.lane("l2").and_then(Lane::bounds).expect("placed");
        assert_eq!(first.min_y(), 30.0);
        assert_eq!(second.min_x(), first.max_x());

        let a = model.element("a").and_then(Element::bounds).expect("placed");
        let b = model.element("b").and_then(Element::bounds).expect("placed");
        assert!(a.max_y() < b.min_y());
    }

    #[test]
    fn test_remap_preserved_uses_lane_frame() {
        let mut model = Model::new("p");
        model.pools.push(
            Pool::new("pool", "Pool")
                .with_bounds(100.0, 100.0, 600.0, 300.0)
                .with_lanes(["lane"]),
        );
        model
            .lanes
            .push(Lane::new("lane", "Lane", "pool").with_bounds(130.0, 100.0, 570.0, 300.0));
        model.elements.push(
            Element::new("t", "task")
                .with_bounds(200.0, 150.0, 120.0, 80.0)
                .with_parent("lane"),
        );
        model.elements.push(
            Element::new("free", "task").with_bounds(900.0, 900.0, 120.0, 80.0),
        );
        let absolute: HashMap<String, Bounds> = model
            .elements
            .iter()
            .filter_map(|e| Some((e.id.clone(), e.bounds()?)))
            .collect();

        organizer().remap_preserved(&mut model, &absolute);

        let lane = model.lane("lane").and_then(Lane::bounds).expect("lane kept");
        assert_eq!(lane.min_point(), Point::new(30.0, 0.0));
        assert_eq!(model.element("t").and_then(Element::position), Some(Point::new(70.0, 50.0)));
        assert_eq!(
            model.element("free").and_then(Element::position),
            Some(Point::new(900.0, 900.0))
        );
        assert_eq!(
            model.pool("pool").and_then(Pool::bounds).map(Bounds::to_size),
            Some(Size::new(600.0, 300.0))
        );
    }

    #[test]
    fn test_remap_preserved_derives_missing_pool_bounds() {
        let mut model = Model::new("p");
        model.pools.push(Pool::new("pool", "Pool"));
        model.elements.push(
            Element::new("t", "task")
                .with_bounds(300.0, 200.0, 120.0, 80.0)
                .with_parent("pool"),
        );
        let absolute: HashMap<String, Bounds> = model
            .elements
            .iter()
            .filter_map(|e| Some((e.id.clone(), e.bounds()?)))
            .collect();

        organizer().remap_preserved(&mut model, &absolute);

        let pool = model.pool("pool").and_then(Pool::bounds).expect("pool sized");
        assert!(pool.width() >= 400.0 && pool.height() >= 150.0);
        let relative = model.element("t").and_then(Element::bounds).expect("t kept");
        let restored = relative.translate(pool.min_point());
        assert_eq!(restored.min_point(), Point::new(300.0, 200.0));
        assert!(pool.contains_point(restored.center()));
    }
}
