//! Pools and lanes.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, Size};

/// A participant container. A pool owns zero or more lanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub process_ref: Option<String>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    /// Lanes run left to right when `true`, top to bottom otherwise.
    #[serde(default = "default_horizontal")]
    pub horizontal: bool,
    #[serde(default)]
    pub lane_ids: Vec<String>,
}

fn default_horizontal() -> bool {
    true
}

impl Pool {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            process_ref: None,
            x: None,
            y: None,
            width: None,
            height: None,
            horizontal: true,
            lane_ids: Vec::new(),
        }
    }

    pub fn with_process(mut self, process_ref: impl Into<String>) -> Self {
        self.process_ref = Some(process_ref.into());
        self
    }

    pub fn with_lanes<I, S>(mut self, lane_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lane_ids = lane_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn vertical(mut self) -> Self {
        self.horizontal = false;
        self
    }

    /// Explicitly declared size, if both dimensions are set.
    pub fn explicit_size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }

    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds::new_from_top_left(self.position()?, self.explicit_size()?))
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = Some(bounds.min_x());
        self.y = Some(bounds.min_y());
        self.width = Some(bounds.width());
        self.height = Some(bounds.height());
    }
}

/// A partition of a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub pool_id: String,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    /// Member elements in declaration order.
    #[serde(default)]
    pub element_refs: Vec<String>,
}

impl Lane {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pool_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pool_id: pool_id.into(),
            x: None,
            y: None,
            width: None,
            height: None,
            element_refs: Vec::new(),
        }
    }

    pub fn with_elements<I, S>(mut self, element_refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element_refs = element_refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds::new_from_top_left(
            Point::new(self.x?, self.y?),
            Size::new(self.width?, self.height?),
        ))
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = Some(bounds.min_x());
        self.y = Some(bounds.min_y());
        self.width = Some(bounds.width());
        self.height = Some(bounds.height());
    }
}
