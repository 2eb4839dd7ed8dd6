//! Configuration types for BPMN diagram layout.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from TOML
//! or any other serde format. Every section falls back to its defaults when
//! omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`LayoutConfig`] - Mode, direction, engine and the spacing sections.
//! - [`LayoutMode`] / [`Direction`] / [`LayoutEngine`] - The caller-selectable options.
//!
//! # Example
//!
//! ```
//! # use bpmn_layout::config::{AppConfig, Direction, LayoutMode};
//! let config = AppConfig::default();
//! assert_eq!(config.layout().mode(), LayoutMode::Auto);
//! assert_eq!(config.layout().direction(), Direction::LeftRight);
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the layout configuration for modification.
    pub fn layout_mut(&mut self) -> &mut LayoutConfig {
        &mut self.layout
    }
}

/// How positions are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Compute the layout from the graph structure.
    #[default]
    Auto,
    /// Reuse existing diagram coordinates and only fill gaps.
    Preserve,
}

impl FromStr for LayoutMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "preserve" => Ok(Self::Preserve),
            _ => Err("Unsupported layout mode"),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Preserve => write!(f, "preserve"),
        }
    }
}

/// Main axis of free-graph placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
    /// Levels become columns, flowing left to right.
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    /// Levels become rows, flowing top to bottom.
    #[serde(rename = "TB")]
    TopBottom,
}

impl FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LR" => Ok(Self::LeftRight),
            "TB" | "TD" => Ok(Self::TopBottom),
            _ => Err("Unsupported direction"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftRight => write!(f, "LR"),
            Self::TopBottom => write!(f, "TB"),
        }
    }
}

/// Algorithm used for free-graph placement in auto mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// Breadth-first levels from the start events.
    #[default]
    Basic,
    /// Layered drawing through the `rust-sugiyama` crate.
    Sugiyama,
    /// Graphviz `dot`; needs the `graphviz` feature and the `dot` binary.
    Graphviz,
}

impl FromStr for LayoutEngine {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "sugiyama" => Ok(Self::Sugiyama),
            "graphviz" => Ok(Self::Graphviz),
            _ => Err("Unsupported layout engine"),
        }
    }
}

impl fmt::Display for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Sugiyama => write!(f, "sugiyama"),
            Self::Graphviz => write!(f, "graphviz"),
        }
    }
}

/// Layout settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    mode: LayoutMode,
    direction: Direction,
    engine: LayoutEngine,
    spacing: SpacingConfig,
    swimlane: SwimlaneConfig,
    routing: RoutingConfig,
    recovery: RecoveryConfig,
}

impl LayoutConfig {
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn engine(&self) -> LayoutEngine {
        self.engine
    }

    pub fn spacing(&self) -> &SpacingConfig {
        &self.spacing
    }

    pub fn swimlane(&self) -> &SwimlaneConfig {
        &self.swimlane
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    pub fn recovery(&self) -> &RecoveryConfig {
        &self.recovery
    }

    pub fn with_mode(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_engine(mut self, engine: LayoutEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        self.mode = mode;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn set_engine(&mut self, engine: LayoutEngine) {
        self.engine = engine;
    }
}

/// Distances used by free-graph placement and overlap avoidance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Gap between nodes of the same level.
    pub node: f32,
    /// Gap between consecutive levels.
    pub level: f32,
    /// Distance of the layout from the diagram origin.
    pub margin: f32,
    /// Grid step for overlap avoidance.
    pub grid: f32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            node: 50.0,
            level: 80.0,
            margin: 50.0,
            grid: 10.0,
        }
    }
}

/// Pool and lane geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwimlaneConfig {
    /// Width of the title strip on the pool's leading edge.
    pub header_size: f32,
    /// Smallest lane extent across the flow direction.
    pub lane_min_size: f32,
    /// Padding between a lane border and its members.
    pub lane_padding: f32,
    /// Gap between consecutive elements inside a lane.
    pub element_spacing: f32,
    /// Gap between stacked pools.
    pub pool_gap: f32,
}

impl Default for SwimlaneConfig {
    fn default() -> Self {
        Self {
            header_size: 30.0,
            lane_min_size: 120.0,
            lane_padding: 30.0,
            element_spacing: 60.0,
            pool_gap: 40.0,
        }
    }
}

/// Edge routing heuristics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Center offset under which two shapes count as aligned.
    pub alignment_tolerance: f32,
    /// Distance kept from shape borders when moving a bend.
    pub clearance: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            alignment_tolerance: 5.0,
            clearance: 20.0,
        }
    }
}

/// Grid used for defaulted coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub grid_columns: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            grid_columns: 5,
            cell_width: 200.0,
            cell_height: 150.0,
            origin_x: 50.0,
            origin_y: 50.0,
        }
    }
}
