//! Breadth-first layered placement.
//!
//! Levels are breadth-first distances from the start events. Nodes the
//! start events cannot reach form further components, each layered from its
//! own first root, placed after the main graph on the cross axis.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use log::debug;
use petgraph::{Direction as EdgeDirection, graph::NodeIndex};

use bpmn_layout_core::geometry::Point;

use super::{FlowGraph, Layers, PlacementEngine, place_components};
use crate::{
    config::{Direction, SpacingConfig},
    error::LayoutError,
    layout::Axis,
};

/// Deterministic placement that needs nothing beyond the graph itself.
#[derive(Debug, Clone)]
pub struct BasicEngine {
    axis: Axis,
    spacing: SpacingConfig,
}

impl BasicEngine {
    pub fn new(direction: Direction, spacing: &SpacingConfig) -> Self {
        Self {
            axis: Axis::from_direction(direction),
            spacing: spacing.clone(),
        }
    }

    /// Splits the graph into layered components, main graph first.
    pub(crate) fn components(graph: &FlowGraph<'_>) -> Vec<Layers> {
        let mut visited = HashSet::new();
        let mut components = Vec::new();

        let main = assign_layers(graph, graph.start_nodes(), &mut visited);
        if !main.is_empty() {
            components.push(main);
        }

        while let Some(entry) = next_entry(graph, &visited) {
            debug!(entry = graph.element(entry).id; "Layering unreachable component");
            components.push(assign_layers(graph, vec![entry], &mut visited));
        }

        components
    }
}

impl PlacementEngine for BasicEngine {
    fn place(&self, graph: &FlowGraph<'_>) -> Result<IndexMap<String, Point>, LayoutError> {
        if graph.is_empty() {
            return Ok(IndexMap::new());
        }
        let components = Self::components(graph);
        debug!(
            nodes = graph.node_count(),
            components = components.len();
            "Placing flow graph by breadth-first levels"
        );
        Ok(place_components(graph, &components, self.axis, &self.spacing))
    }
}

/// Breadth-first layering from `starts`, skipping nodes already visited.
fn assign_layers(
    graph: &FlowGraph<'_>,
    starts: Vec<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
) -> Layers {
    let mut layers: Layers = Vec::new();
    let mut queue: VecDeque<(NodeIndex, usize)> =
        starts.into_iter().map(|index| (index, 0)).collect();

    while let Some((index, level)) = queue.pop_front() {
        if !visited.insert(index) {
            continue;
        }
        while layers.len() <= level {
            layers.push(Vec::new());
        }
        layers[level].push(index);

        for next in graph.graph().neighbors_directed(index, EdgeDirection::Outgoing) {
            if !visited.contains(&next) {
                queue.push_back((next, level + 1));
            }
        }
    }

    // Neighbors come back in reverse insertion order; model order reads better.
    for layer in &mut layers {
        layer.sort();
    }
    layers
}

/// First unvisited node without unvisited predecessors, else the first
/// unvisited node.
fn next_entry(graph: &FlowGraph<'_>, visited: &HashSet<NodeIndex>) -> Option<NodeIndex> {
    let mut unvisited = graph
        .graph()
        .node_indices()
        .filter(|index| !visited.contains(index))
        .peekable();
    let first = *unvisited.peek()?;
    let root = unvisited.find(|&index| {
        graph
            .graph()
            .neighbors_directed(index, EdgeDirection::Incoming)
            .all(|pred| visited.contains(&pred))
    });
    Some(root.unwrap_or(first))
}
