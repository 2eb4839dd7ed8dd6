//! Position resolution for process models.
//!
//! [`PositionResolver`] is the entry point. It delegates swimlane content to
//! [`LaneOrganizer`], free elements to a placement engine, and finishes with
//! overlap avoidance and [`BoundaryPositioner`].

mod boundary;
mod engines;
mod lanes;
mod overlap;
mod resolver;
mod swimlane;

pub use boundary::{BOUNDARY_EVENT_SIZE, BoundaryPositioner};
pub use engines::{FlowGraph, PlacementEngine, engine_for};
pub use lanes::LaneOrganizer;
pub use overlap::OverlapResolver;
pub use resolver::PositionResolver;
pub use swimlane::{MIN_POOL_HEIGHT, MIN_POOL_WIDTH, SwimlaneSizer};

use bpmn_layout_core::geometry::{Point, Size};

use crate::config::Direction;

/// Maps a flow-relative `(main, cross)` pair onto screen coordinates.
///
/// The main axis is the direction elements follow each other in; the cross
/// axis is the one rows or lanes are stacked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Main axis is x.
    Horizontal,
    /// Main axis is y.
    Vertical,
}

impl Axis {
    fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::LeftRight => Self::Horizontal,
            Direction::TopBottom => Self::Vertical,
        }
    }

    /// Axis along which members of a pool's lanes follow each other.
    fn for_pool(horizontal: bool) -> Self {
        if horizontal {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    fn point(self, main: f32, cross: f32) -> Point {
        match self {
            Self::Horizontal => Point::new(main, cross),
            Self::Vertical => Point::new(cross, main),
        }
    }

    fn size(self, main: f32, cross: f32) -> Size {
        match self {
            Self::Horizontal => Size::new(main, cross),
            Self::Vertical => Size::new(cross, main),
        }
    }

    fn main(self, size: Size) -> f32 {
        match self {
            Self::Horizontal => size.width(),
            Self::Vertical => size.height(),
        }
    }

    fn cross(self, size: Size) -> f32 {
        match self {
            Self::Horizontal => size.height(),
            Self::Vertical => size.width(),
        }
    }

    fn cross_of(self, point: Point) -> f32 {
        match self {
            Self::Horizontal => point.y(),
            Self::Vertical => point.x(),
        }
    }
}
