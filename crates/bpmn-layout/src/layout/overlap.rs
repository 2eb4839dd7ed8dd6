//! Greedy overlap avoidance.

use indexmap::IndexMap;
use log::debug;

use bpmn_layout_core::{
    geometry::{Bounds, Point, Size},
    model::{Element, Model},
};

use super::boundary::is_attached;
use crate::config::SpacingConfig;

/// Rings of grid cells searched around a colliding element before giving up
/// and moving it past everything else.
const MAX_RINGS: i32 = 60;

/// Nudges intersecting elements to the nearest free grid-aligned position.
///
/// Only elements sharing a coordinate container (same parent and same
/// subprocess) are compared. Elements are processed in model order and each
/// one is settled before the next, so the result is deterministic but not
/// globally optimal.
#[derive(Debug, Clone)]
pub struct OverlapResolver {
    step: f32,
}

impl OverlapResolver {
    pub fn new(spacing: &SpacingConfig) -> Self {
        Self {
            step: spacing.grid.max(1.0),
        }
    }

    /// Moves elements accepted by `movable` off their neighbours.
    ///
    /// Elements that are not movable stay put and act as obstacles. Attached
    /// boundary events are ignored. Returns the number of elements moved.
    pub fn resolve(&self, model: &mut Model, movable: impl Fn(&Element) -> bool) -> usize {
        let mut groups: IndexMap<(Option<String>, Option<String>), Vec<usize>> = IndexMap::new();
        for (index, element) in model.elements.iter().enumerate() {
            if is_attached(element) || element.bounds().is_none() {
                continue;
            }
            groups
                .entry((element.parent_id.clone(), element.subprocess_id.clone()))
                .or_default()
                .push(index);
        }

        let mut moved = 0;
        for members in groups.values() {
            let (fixed, free): (Vec<usize>, Vec<usize>) = members
                .iter()
                .copied()
                .partition(|&index| !movable(&model.elements[index]));
            let mut placed: Vec<Bounds> = fixed
                .iter()
                .filter_map(|&index| model.elements[index].bounds())
                .collect();

            for index in free {
                let (Some(bounds), Some(size)) =
                    (model.elements[index].bounds(), model.elements[index].size())
                else {
                    continue;
                };
                if !collides(&bounds, &placed) {
                    placed.push(bounds);
                    continue;
                }
                let position = self.free_position(bounds, size, &placed);
                let element = &mut model.elements[index];
                debug!(
                    element = element.id,
                    x = position.x(),
                    y = position.y();
                    "Moved overlapping element"
                );
                element.set_position(position);
                placed.push(Bounds::new_from_top_left(position, size));
                moved += 1;
            }
        }
        moved
    }

    /// Nearest grid-aligned top-left corner where `bounds` fits.
    ///
    /// Candidates are visited ring by ring around the snapped original
    /// corner; inside a ring the closest one wins, ties broken by the
    /// smaller vertical then horizontal offset.
    fn free_position(&self, bounds: Bounds, size: Size, placed: &[Bounds]) -> Point {
        let origin = bounds.min_point().snap(self.step);
        let floor = Point::new(bounds.min_x().min(0.0), bounds.min_y().min(0.0));

        for ring in 1..=MAX_RINGS {
            let mut candidates: Vec<(i32, i32)> = (-ring..=ring)
                .flat_map(|dx| (-ring..=ring).map(move |dy| (dx, dy)))
                .filter(|(dx, dy)| dx.abs().max(dy.abs()) == ring)
                .collect();
            candidates.sort_by_key(|&(dx, dy)| (dx * dx + dy * dy, dy, dx));

            for (dx, dy) in candidates {
                let position = Point::new(
                    origin.x() + dx as f32 * self.step,
                    origin.y() + dy as f32 * self.step,
                );
                if position.x() < floor.x() || position.y() < floor.y() {
                    continue;
                }
                let candidate = Bounds::new_from_top_left(position, size);
                if !collides(&candidate, placed) {
                    return position;
                }
            }
        }

        let right = placed
            .iter()
            .map(|other| other.max_x())
            .fold(bounds.max_x(), f32::max);
        Point::new(right + self.step, bounds.min_y())
    }
}

fn collides(bounds: &Bounds, placed: &[Bounds]) -> bool {
    placed.iter().any(|other| bounds.intersects(other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> OverlapResolver {
        OverlapResolver::new(&SpacingConfig::default())
    }

    #[test]
    fn test_stacked_elements_are_separated() {
        let mut model = Model::new("p");
        for id in ["a", "b", "c"] {
            model
                .elements
                .push(Element::new(id, "task").with_bounds(100.0, 100.0, 120.0, 80.0));
        }

        assert_eq!(resolver().resolve(&mut model, |_| true), 2);
        assert_eq!(model.elements[0].position(), Some(Point::new(100.0, 100.0)));

        let boxes: Vec<Bounds> = model.elements.iter().filter_map(Element::bounds).collect();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_fixed_elements_do_not_move() {
        let mut model = Model::new("p");
        model
            .elements
            .push(Element::new("new", "task").with_bounds(0.0, 0.0, 120.0, 80.0));
        model
            .elements
            .push(Element::new("kept", "task").with_bounds(10.0, 10.0, 120.0, 80.0));

        let moved = resolver().resolve(&mut model, |element| element.id == "new");
        assert_eq!(moved, 1);
        assert_eq!(model.elements[1].position(), Some(Point::new(10.0, 10.0)));
        let new = model.elements[0].bounds().expect("positioned");
        assert!(!new.intersects(&model.elements[1].bounds().expect("positioned")));
    }

    #[test]
    fn test_different_containers_are_independent() {
        let mut model = Model::new("p");
        model.elements.push(
            Element::new("a", "task")
                .with_bounds(0.0, 0.0, 120.0, 80.0)
                .with_parent("lane1"),
        );
        model.elements.push(
            Element::new("b", "task")
                .with_bounds(0.0, 0.0, 120.0, 80.0)
                .with_parent("lane2"),
        );
        assert_eq!(resolver().resolve(&mut model, |_| true), 0);
    }

    #[test]
    fn test_touching_elements_stay() {
        let mut model = Model::new("p");
        model
            .elements
            .push(Element::new("a", "task").with_bounds(0.0, 0.0, 120.0, 80.0));
        model
            .elements
            .push(Element::new("b", "task").with_bounds(120.0, 0.0, 120.0, 80.0));
        assert_eq!(resolver().resolve(&mut model, |_| true), 0);
    }
}
