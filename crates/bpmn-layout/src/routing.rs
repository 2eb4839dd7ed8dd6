//! Orthogonal edge routing and label anchors.
//!
//! Every flow is routed on its own, from the midpoint of the source side
//! facing the target to the midpoint of the target side facing the source.
//! There is no global crossing minimization; a bend segment that would cut
//! through another shape is shifted when a clear alternative exists.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, warn};

use bpmn_layout_core::{
    geometry::{Bounds, Point, Side},
    model::{Element, ElementKind, Flow, Model},
};

use crate::config::RoutingConfig;

/// Routing view of one element, in diagram-absolute coordinates.
#[derive(Debug, Clone)]
struct Shape {
    bounds: Bounds,
    kind: ElementKind,
    subprocess_id: Option<String>,
    attached: bool,
}

/// Computes waypoint polylines between positioned elements.
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    shapes: IndexMap<String, Shape>,
    config: RoutingConfig,
}

impl EdgeRouter {
    /// Snapshots the absolute geometry of every positioned element of `model`.
    pub fn new(model: &Model, config: &RoutingConfig) -> Self {
        let shapes = model
            .elements
            .iter()
            .filter_map(|element| {
                let bounds = model.absolute_bounds(&element.id)?;
                Some((element.id.clone(), Shape::new(element, bounds)))
            })
            .collect();
        Self {
            shapes,
            config: config.clone(),
        }
    }

    /// Waypoints from `source` to `target`, endpoints included.
    ///
    /// Existing waypoints are returned unchanged. Shapes whose centers are
    /// within the alignment tolerance get a straight segment. Otherwise the
    /// route bends once when leaving a gateway towards a target beside it,
    /// and twice in all other cases. A flow from an element to itself loops
    /// out of its right side and back in through its top. An empty route
    /// means an endpoint has no geometry.
    pub fn route(&self, source: &str, target: &str, existing: Option<&[Point]>) -> Vec<Point> {
        if let Some(points) = existing {
            return points.to_vec();
        }
        let (Some(from), Some(to)) = (self.shapes.get(source), self.shapes.get(target)) else {
            warn!(source, target; "Cannot route flow between unpositioned elements");
            return Vec::new();
        };

        if source == target {
            return self.self_loop(&from.bounds);
        }

        let source_center = from.bounds.center();
        let target_center = to.bounds.center();
        let dx = target_center.x() - source_center.x();
        let dy = target_center.y() - source_center.y();
        let tolerance = self.config.alignment_tolerance;

        if from.kind == ElementKind::Gateway
            && dx.abs() > tolerance
            && dy.abs() > tolerance
            && (source_center.x() < to.bounds.min_x() || source_center.x() > to.bounds.max_x())
        {
            let exit = if dy > 0.0 { Side::Bottom } else { Side::Top };
            let entry = if dx > 0.0 { Side::Left } else { Side::Right };
            let start = from.bounds.side_midpoint(exit);
            let end = to.bounds.side_midpoint(entry);
            return vec![start, Point::new(start.x(), end.y()), end];
        }

        let (exit, entry) = facing_sides(dx, dy);
        let start = from.bounds.side_midpoint(exit);
        let end = to.bounds.side_midpoint(entry);
        let excluded = self.excluded(source, target);

        if exit.is_horizontal_exit() {
            if (start.y() - end.y()).abs() <= tolerance {
                return vec![start, end.with_y(start.y())];
            }
            let mid = self.clear_bend(
                (start.x() + end.x()) / 2.0,
                [start.x(), end.x()],
                &excluded,
                |x| (Point::new(x, start.y()), Point::new(x, end.y())),
            );
            vec![start, Point::new(mid, start.y()), Point::new(mid, end.y()), end]
        } else {
            if (start.x() - end.x()).abs() <= tolerance {
                return vec![start, end.with_x(start.x())];
            }
            let mid = self.clear_bend(
                (start.y() + end.y()) / 2.0,
                [start.y(), end.y()],
                &excluded,
                |y| (Point::new(start.x(), y), Point::new(end.x(), y)),
            );
            vec![start, Point::new(start.x(), mid), Point::new(end.x(), mid), end]
        }
    }

    /// Loop around the top-right corner of `bounds`, staying outside it.
    fn self_loop(&self, bounds: &Bounds) -> Vec<Point> {
        let clearance = self.config.clearance;
        let start = bounds.side_midpoint(Side::Right);
        let end = bounds.side_midpoint(Side::Top);
        let outer_x = start.x() + clearance;
        let outer_y = end.y() - clearance;
        vec![
            start,
            Point::new(outer_x, start.y()),
            Point::new(outer_x, outer_y),
            Point::new(end.x(), outer_y),
            end,
        ]
    }

    /// Position of the middle segment of a Z route.
    ///
    /// `preferred` is kept unless the segment it produces cuts through a
    /// shape; then a bend just past the source, then just before the target,
    /// is tried. `ends` holds the coordinates of the route endpoints on the
    /// bend axis.
    fn clear_bend(
        &self,
        preferred: f32,
        ends: [f32; 2],
        excluded: &HashSet<&str>,
        segment: impl Fn(f32) -> (Point, Point),
    ) -> f32 {
        let [start, end] = ends;
        let toward = if end >= start { 1.0 } else { -1.0 };
        let clearance = self.config.clearance;
        let candidates = [
            preferred,
            start + toward * clearance,
            end - toward * clearance,
        ];

        for candidate in candidates {
            let (a, b) = segment(candidate);
            if !self.blocked(a, b, excluded) {
                return candidate;
            }
        }
        debug!(preferred; "No clear bend found, keeping the midpoint");
        preferred
    }

    fn blocked(&self, a: Point, b: Point, excluded: &HashSet<&str>) -> bool {
        self.shapes
            .iter()
            .filter(|(id, shape)| !shape.attached && !excluded.contains(id.as_str()))
            .any(|(_, shape)| shape.bounds.crosses_segment(a, b))
    }

    /// Shapes a route between `source` and `target` may cross: the endpoints
    /// themselves and the subprocesses enclosing either of them.
    fn excluded<'a>(&'a self, source: &'a str, target: &'a str) -> HashSet<&'a str> {
        let mut excluded = HashSet::new();
        for id in [source, target] {
            let mut current = Some(id);
            while let Some(shape_id) = current {
                if !excluded.insert(shape_id) {
                    break;
                }
                current = self
                    .shapes
                    .get(shape_id)
                    .and_then(|shape| shape.subprocess_id.as_deref());
            }
        }
        excluded
    }
}

impl Shape {
    fn new(element: &Element, bounds: Bounds) -> Self {
        Self {
            bounds,
            kind: element.kind,
            subprocess_id: element.subprocess_id.clone(),
            attached: element.kind.is_boundary() && element.attached_to.is_some(),
        }
    }
}

/// Exit side of the source and entry side of the target for a center offset.
fn facing_sides(dx: f32, dy: f32) -> (Side, Side) {
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

/// Routes every flow of `model`, keyed by flow id in model order.
///
/// Flows that already carry waypoints keep them.
pub fn calculate_edge_routes(model: &Model, config: &RoutingConfig) -> IndexMap<String, Vec<Point>> {
    let router = EdgeRouter::new(model, config);
    model
        .flows
        .iter()
        .map(|flow| {
            let existing = (!flow.waypoints.is_empty()).then_some(flow.waypoints.as_slice());
            (flow.id.clone(), router.route(&flow.source, &flow.target, existing))
        })
        .collect()
}

/// Writes routes and missing label anchors into the flows of `model`.
pub fn apply_routes(model: &mut Model, config: &RoutingConfig) {
    let mut routes = calculate_edge_routes(model, config);
    let mut labels = 0;
    for flow in &mut model.flows {
        let Some(waypoints) = routes.swap_remove(&flow.id) else {
            continue;
        };
        if flow.label_position.is_none() {
            flow.label_position = position_edge_label(flow, &waypoints);
            labels += usize::from(flow.label_position.is_some());
        }
        flow.waypoints = waypoints;
    }
    info!(flows = model.flows.len(), labels; "Routed flows");
}

/// Converts waypoint coordinate pairs given as text into points.
///
/// Order is preserved; pairs that do not parse as numbers are skipped.
pub fn convert_bpmn_waypoints<S: AsRef<str>>(raw: &[(S, S)]) -> Vec<Point> {
    raw.iter()
        .filter_map(|(x, y)| {
            let (x, y) = (x.as_ref(), y.as_ref());
            match (x.trim().parse::<f32>(), y.trim().parse::<f32>()) {
                (Ok(px), Ok(py)) if px.is_finite() && py.is_finite() => Some(Point::new(px, py)),
                _ => {
                    warn!(x, y; "Skipping unparseable waypoint");
                    None
                }
            }
        })
        .collect()
}

/// Inner points of a route, or `None` when it has no bend.
pub fn intermediate_waypoints(points: &[Point]) -> Option<&[Point]> {
    if points.len() <= 2 {
        return None;
    }
    Some(&points[1..points.len() - 1])
}

/// Anchor for the label of a named flow: the point halfway along the route.
pub fn position_edge_label(flow: &Flow, waypoints: &[Point]) -> Option<Point> {
    if !flow.has_label() {
        return None;
    }
    let first = *waypoints.first()?;
    let total: f32 = waypoints.windows(2).map(|pair| pair[0].distance(pair[1])).sum();
    if total <= 0.0 {
        return Some(first);
    }

    let mut remaining = total / 2.0;
    for pair in waypoints.windows(2) {
        let length = pair[0].distance(pair[1]);
        if remaining <= length && length > 0.0 {
            return Some(pair[0].lerp(pair[1], remaining / length));
        }
        remaining -= length;
    }
    waypoints.last().copied()
}
