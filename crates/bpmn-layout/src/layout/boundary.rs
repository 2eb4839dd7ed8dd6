//! Boundary events, subprocess contents and lane-less pool membership.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};

use bpmn_layout_core::{
    geometry::{Bounds, Point, Size},
    model::{Element, Model},
};

use crate::config::SwimlaneConfig;

/// Fixed size of every attached boundary event.
pub const BOUNDARY_EVENT_SIZE: Size = Size::new(36.0, 36.0);

/// Room left above subprocess children for the subprocess label.
const SUBPROCESS_LABEL_SPACE: f32 = 20.0;

/// Finalizes placements governed by structural attachment rather than flow.
#[derive(Debug, Clone, Default)]
pub struct BoundaryPositioner {
    padding: f32,
    spacing: f32,
}

impl BoundaryPositioner {
    pub fn new(config: &SwimlaneConfig) -> Self {
        Self {
            padding: config.lane_padding,
            spacing: config.element_spacing,
        }
    }

    /// Parents elements of a pool to that pool.
    ///
    /// An element without parent whose process (its own `process_id`, or the
    /// model's process when unset) is referenced by a pool becomes a member
    /// of that pool. Returns the number of elements reparented.
    pub fn assign_pool_parents(&self, model: &mut Model) -> usize {
        let pools: HashMap<String, String> = model
            .pools
            .iter()
            .filter_map(|pool| {
                let process_ref = pool.process_ref.clone()?;
                Some((process_ref, pool.id.clone()))
            })
            .collect();
        if pools.is_empty() {
            return 0;
        }

        let mut count = 0;
        for element in model.elements.iter_mut().filter(|e| e.parent_id.is_none()) {
            let process = element
                .process_id
                .as_deref()
                .unwrap_or(model.process_id.as_str());
            if let Some(pool_id) = pools.get(process) {
                debug!(element = element.id, pool = pool_id; "Parenting element to pool");
                element.parent_id = Some(pool_id.clone());
                count += 1;
            }
        }
        count
    }

    /// Gives each boundary event its host's parent and subprocess so both
    /// share one coordinate frame.
    pub fn assign_host_frames(&self, model: &mut Model) {
        let hosts: HashMap<String, (Option<String>, Option<String>)> = model
            .elements
            .iter()
            .map(|element| {
                (
                    element.id.clone(),
                    (element.parent_id.clone(), element.subprocess_id.clone()),
                )
            })
            .collect();

        for event in model.elements.iter_mut().filter(|e| e.kind.is_boundary()) {
            let Some((parent_id, subprocess_id)) =
                event.attached_to.as_ref().and_then(|host_id| hosts.get(host_id))
            else {
                continue;
            };
            event.parent_id = parent_id.clone();
            event.subprocess_id = subprocess_id.clone();
        }
    }

    /// Places boundary events on the bottom border of their hosts.
    ///
    /// The i-th of n events attached to one host is centered at
    /// `(i + 1) / (n + 1)` of the host's width, in model order, and always
    /// gets [`BOUNDARY_EVENT_SIZE`]. Only events accepted by `reposition` are
    /// moved; the others still count towards the distribution.
    pub fn attach_boundary_events(&self, model: &mut Model, reposition: impl Fn(&Element) -> bool) {
        self.assign_host_frames(model);

        let mut by_host: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, element) in model.elements.iter().enumerate() {
            if !element.kind.is_boundary() {
                continue;
            }
            if let Some(host_id) = element.attached_to.as_deref() {
                by_host.entry(host_id.to_string()).or_default().push(index);
            }
        }

        for (host_id, events) in by_host {
            let Some(host) = model.element(&host_id).and_then(Element::bounds) else {
                continue;
            };
            let count = events.len() as f32;
            for (i, &index) in events.iter().enumerate() {
                if !reposition(&model.elements[index]) {
                    continue;
                }
                let event = &mut model.elements[index];
                let fraction = (i as f32 + 1.0) / (count + 1.0);
                let center = Point::new(host.min_x() + host.width() * fraction, host.max_y());
                let bounds = Bounds::new_from_center(center, BOUNDARY_EVENT_SIZE);
                event.set_position(bounds.min_point());
                event.set_size(BOUNDARY_EVENT_SIZE);
                trace!(event = event.id, host = host_id; "Attached boundary event");
            }
        }
    }

    /// Re-expresses subprocess children relative to their subprocess.
    ///
    /// `absolute` holds the diagram-absolute bounds of every element taken
    /// before any coordinate was converted.
    pub fn translate_subprocess_children(
        &self,
        model: &mut Model,
        absolute: &HashMap<String, Bounds>,
    ) {
        for element in &mut model.elements {
            let Some(subprocess_id) = element.subprocess_id.as_deref() else {
                continue;
            };
            let (Some(own), Some(container)) =
                (absolute.get(&element.id), absolute.get(subprocess_id))
            else {
                continue;
            };
            element.set_position(own.min_point().sub_point(container.min_point()));
        }
    }

    /// Lines up the children of every subprocess inside it and grows the
    /// subprocess to fit.
    ///
    /// Nested subprocesses are packed innermost first, so each container is
    /// sized from already-final children. Attached boundary events are
    /// skipped; they follow their host.
    pub fn pack_subprocesses(&self, model: &mut Model) {
        let subprocesses: Vec<String> = model
            .elements
            .iter()
            .filter(|element| element.kind.is_container())
            .map(|element| element.id.clone())
            .collect();
        if subprocesses.is_empty() {
            return;
        }

        let mut ordered: Vec<(usize, String)> = subprocesses
            .into_iter()
            .map(|id| (nesting_depth(model, &id), id))
            .collect();
        // Deepest first; the sort is stable so model order breaks ties.
        ordered.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, subprocess_id) in ordered {
            self.pack_subprocess(model, &subprocess_id);
        }
    }

    fn pack_subprocess(&self, model: &mut Model, subprocess_id: &str) {
        let children: Vec<usize> = model
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.subprocess_id.as_deref() == Some(subprocess_id))
            .filter(|(_, element)| element.id != subprocess_id && !is_attached(element))
            .map(|(index, _)| index)
            .collect();
        if children.is_empty() {
            return;
        }

        let top = self.padding + SUBPROCESS_LABEL_SPACE;
        let row_height = children
            .iter()
            .map(|&index| model.elements[index].size_or_default().height())
            .fold(0.0_f32, f32::max);

        let mut cursor = self.padding;
        for &index in &children {
            let child = &mut model.elements[index];
            let size = child.size_or_default();
            child.set_size(size);
            child.set_position(Point::new(cursor, top + (row_height - size.height()) / 2.0));
            cursor += size.width() + self.spacing;
        }

        let needed = Size::new(
            cursor - self.spacing + self.padding,
            top + row_height + self.padding,
        );
        if let Some(container) = model.element_mut(subprocess_id) {
            let size = container.size_or_default().max(needed);
            container.set_size(size);
            debug!(
                subprocess = subprocess_id,
                children = children.len(),
                width = size.width(),
                height = size.height();
                "Packed subprocess"
            );
        }
    }
}

/// Returns `true` for boundary events that have a host.
pub(super) fn is_attached(element: &Element) -> bool {
    element.kind.is_boundary() && element.attached_to.is_some()
}

/// Number of subprocesses enclosing `id`.
fn nesting_depth(model: &Model, id: &str) -> usize {
    let mut seen = HashSet::new();
    let mut current = model.element(id).and_then(|e| e.subprocess_id.as_deref());
    while let Some(parent) = current {
        if !seen.insert(parent) {
            break;
        }
        current = model.element(parent).and_then(|e| e.subprocess_id.as_deref());
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::model::Pool;
    use float_cmp::approx_eq;

    use super::*;

    fn positioner() -> BoundaryPositioner {
        BoundaryPositioner::new(&SwimlaneConfig::default())
    }

    #[test]
    fn test_boundary_events_spread_on_bottom_edge() {
        let mut model = Model::new("p");
        model.elements.push(
            Element::new("host", "task")
                .with_bounds(100.0, 100.0, 120.0, 80.0)
                .with_parent("lane"),
        );
        model.elements.push(
            Element::new("b1", "boundaryEvent")
                .attached_to("host")
                .with_bounds(0.0, 0.0, 120.0, 80.0),
        );
        model.elements.push(Element::new("b2", "boundaryEvent").attached_to("host"));

        positioner().attach_boundary_events(&mut model, |_| true);

        let b1 = model.element("b1").and_then(Element::bounds).expect("b1 placed");
        let b2 = model.element("b2").and_then(Element::bounds).expect("b2 placed");
        assert_eq!(b1.to_size(), BOUNDARY_EVENT_SIZE);
        assert_eq!(b2.to_size(), BOUNDARY_EVENT_SIZE);
        assert!(approx_eq!(f32, b1.center().x(), 140.0, epsilon = 0.001));
        assert!(approx_eq!(f32, b2.center().x(), 180.0, epsilon = 0.001));
        assert!(approx_eq!(f32, b1.center().y(), 180.0, epsilon = 0.001));
        assert_eq!(model.element("b1").and_then(|e| e.parent_id.as_deref()), Some("lane"));
    }

    #[test]
    fn test_boundary_event_without_host_untouched() {
        let mut model = Model::new("p");
        model
            .elements
            .push(Element::new("b", "boundaryEvent").with_bounds(5.0, 5.0, 36.0, 36.0));
        positioner().attach_boundary_events(&mut model, |_| true);
        assert_eq!(model.elements[0].position(), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_translate_subprocess_children() {
        let mut model = Model::new("p");
        model
            .elements
            .push(Element::new("sub", "subProcess").with_bounds(200.0, 100.0, 400.0, 200.0));
        model.elements.push(
            Element::new("child", "task")
                .with_bounds(250.0, 150.0, 120.0, 80.0)
                .with_subprocess("sub"),
        );
        let absolute: HashMap<String, Bounds> = model
            .elements
            .iter()
            .filter_map(|e| Some((e.id.clone(), e.bounds()?)))
            .collect();

        positioner().translate_subprocess_children(&mut model, &absolute);
        assert_eq!(model.elements[1].position(), Some(Point::new(50.0, 50.0)));
        assert_eq!(model.elements[0].position(), Some(Point::new(200.0, 100.0)));
    }

    #[test]
    fn test_lane_less_pool_parenting() {
        let mut model = Model::new("proc");
        model.pools.push(Pool::new("pool", "Pool").with_process("proc"));
        model.pools.push(Pool::new("other", "Other").with_process("proc2"));
        model.elements.push(Element::new("a", "task"));
        model.elements.push(Element::new("b", "task").with_process("proc2"));
        model.elements.push(Element::new("c", "task").with_parent("lane"));
        model.elements.push(Element::new("d", "task").with_process("unknown"));

        assert_eq!(positioner().assign_pool_parents(&mut model), 2);
        assert_eq!(model.elements[0].parent_id.as_deref(), Some("pool"));
        assert_eq!(model.elements[1].parent_id.as_deref(), Some("other"));
        assert_eq!(model.elements[2].parent_id.as_deref(), Some("lane"));
        assert!(model.elements[3].parent_id.is_none());
    }

    #[test]
    fn test_pack_nested_subprocesses() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("outer", "subProcess"));
        model
            .elements
            .push(Element::new("inner", "subProcess").with_subprocess("outer"));
        model.elements.push(Element::new("a", "task").with_subprocess("inner"));
        model.elements.push(Element::new("b", "task").with_subprocess("inner"));
        model.elements.push(Element::new("c", "endEvent").with_subprocess("outer"));

        positioner().pack_subprocesses(&mut model);

        let inner = model.element("inner").and_then(Element::size).expect("inner sized");
        // padding + a + spacing + b + padding
        assert_eq!(inner.width(), 30.0 + 120.0 + 60.0 + 120.0 + 30.0);
        let outer = model.element("outer").and_then(Element::size).expect("outer sized");
        assert!(outer.width() >= 30.0 + inner.width() + 60.0 + 36.0 + 30.0);
        assert!(outer.height() >= 50.0 + inner.height() + 30.0);

        let a = model.element("a").and_then(Element::bounds).expect("a placed");
        let b = model.element("b").and_then(Element::bounds).expect("b placed");
        assert!(!a.intersects(&b));
        assert!(a.min_x() >= 0.0 && a.min_y() >= 0.0);
    }

    #[test]
    fn test_nesting_depth_terminates_on_cycles() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("x", "subProcess").with_subprocess("y"));
        model.elements.push(Element::new("y", "subProcess").with_subprocess("x"));
        assert_eq!(nesting_depth(&model, "x"), 2);
    }
}
