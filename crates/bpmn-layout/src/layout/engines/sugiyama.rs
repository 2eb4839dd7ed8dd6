//! Layered placement through the `rust-sugiyama` crate.
//!
//! The crate computes layer assignment and in-layer ordering with crossing
//! reduction. Its coordinates are only used to recover that structure; the
//! final geometry comes from [`place_components`] so every engine spaces
//! shapes the same way.

use std::{cmp::Ordering, collections::HashMap};

use indexmap::IndexMap;
use log::debug;
use petgraph::{graph::NodeIndex, visit::EdgeRef};
use rust_sugiyama::configure::Config;

use bpmn_layout_core::geometry::Point;

use super::{FlowGraph, Layers, PlacementEngine, place_components};
use crate::{
    config::{Direction, SpacingConfig},
    error::LayoutError,
    layout::Axis,
};

/// Coordinates closer than this belong to the same layer.
const LAYER_TOLERANCE: f64 = 1e-3;

/// Sugiyama-style layered drawing.
#[derive(Debug, Clone)]
pub struct SugiyamaEngine {
    axis: Axis,
    spacing: SpacingConfig,
}

impl SugiyamaEngine {
    pub fn new(direction: Direction, spacing: &SpacingConfig) -> Self {
        Self {
            axis: Axis::from_direction(direction),
            spacing: spacing.clone(),
        }
    }

    /// Runs the crate and regroups its output into layered components.
    fn components(&self, graph: &FlowGraph<'_>) -> Result<Vec<Layers>, LayoutError> {
        let edges: Vec<(u32, u32)> = graph
            .graph()
            .edge_references()
            .map(|edge| (edge.source().index() as u32, edge.target().index() as u32))
            .collect();

        debug!(
            nodes = graph.node_count(),
            edges = edges.len();
            "Applying Sugiyama algorithm"
        );

        let input = edges.clone();
        let layouts = std::panic::catch_unwind(move || {
            let config = Config {
                minimum_length: 1,
                vertex_spacing: 3.0,
                ..Default::default()
            };
            rust_sugiyama::from_edges(&input, &config)
        });

        let results = match layouts {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => {
                return Err(LayoutError::Engine(
                    "rust-sugiyama returned empty layout results".to_string(),
                ));
            }
            Err(err) => {
                let message = if let Some(panic_msg) = err.downcast_ref::<String>() {
                    format!("rust-sugiyama panicked: {panic_msg}")
                } else if let Some(panic_msg) = err.downcast_ref::<&str>() {
                    format!("rust-sugiyama panicked: {panic_msg}")
                } else {
                    "rust-sugiyama panicked with unknown error".to_string()
                };
                return Err(LayoutError::Engine(message));
            }
        };

        let node_count = graph.node_count();
        let mut placed = vec![false; node_count];
        let mut components = Vec::with_capacity(results.len() + 1);

        for (coords, _, _) in &results {
            let mut nodes: HashMap<NodeIndex, (f64, f64)> = HashMap::new();
            for &(id, (x, y)) in coords {
                if id >= node_count {
                    debug!("Node ID {id} from rust-sugiyama result is out of valid range");
                    continue;
                }
                placed[id] = true;
                nodes.insert(NodeIndex::new(id), (x, y));
            }
            if !nodes.is_empty() {
                components.push(layers_from_coordinates(&nodes, &edges));
            }
        }

        if components.is_empty() {
            return Err(LayoutError::Engine(
                "failed to map any rust-sugiyama positions back to graph nodes".to_string(),
            ));
        }

        // Components in order of their first node keep the output stable.
        components.sort_by_key(|layers: &Layers| layers.iter().flatten().min().copied());

        // Nodes without edges are absent from the crate's output; they form
        // one more component, lined up along the main axis.
        let isolated: Layers = (0..node_count)
            .filter(|&id| !placed[id])
            .map(|id| vec![NodeIndex::new(id)])
            .collect();
        if !isolated.is_empty() {
            components.push(isolated);
        }

        Ok(components)
    }
}

impl PlacementEngine for SugiyamaEngine {
    fn place(&self, graph: &FlowGraph<'_>) -> Result<IndexMap<String, Point>, LayoutError> {
        if graph.is_empty() {
            return Ok(IndexMap::new());
        }
        if graph.edge_count() == 0 {
            debug!("Graph has no edges. Arranging nodes along the main axis.");
            let row: Layers = graph.graph().node_indices().map(|index| vec![index]).collect();
            return Ok(place_components(graph, &[row], self.axis, &self.spacing));
        }

        let components = self.components(graph)?;
        Ok(place_components(graph, &components, self.axis, &self.spacing))
    }
}

/// Groups nodes into layers by their y coordinate and orders each layer by x.
///
/// The crate may emit layers top-down or bottom-up; the order that makes
/// most edges point forward wins.
fn layers_from_coordinates(nodes: &HashMap<NodeIndex, (f64, f64)>, edges: &[(u32, u32)]) -> Layers {
    let mut levels: Vec<f64> = nodes.values().map(|&(_, y)| y).collect();
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    levels.dedup_by(|a, b| (*a - *b).abs() < LAYER_TOLERANCE);

    let level_of = |y: f64| {
        levels
            .iter()
            .position(|&level| (level - y).abs() < LAYER_TOLERANCE)
            .unwrap_or(0)
    };

    let ranks: HashMap<NodeIndex, usize> = nodes
        .iter()
        .map(|(&index, &(_, y))| (index, level_of(y)))
        .collect();

    let forward: i64 = edges
        .iter()
        .filter_map(|&(source, target)| {
            let source = ranks.get(&NodeIndex::new(source as usize))?;
            let target = ranks.get(&NodeIndex::new(target as usize))?;
            Some(*target as i64 - *source as i64)
        })
        .sum();
    let last = levels.len().saturating_sub(1);

    let mut layers: Layers = vec![Vec::new(); levels.len()];
    let mut ordered: Vec<(&NodeIndex, &(f64, f64))> = nodes.iter().collect();
    ordered.sort_by(|a, b| {
        a.1.0
            .partial_cmp(&b.1.0)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(b.0))
    });
    for (&index, _) in ordered {
        let rank = ranks.get(&index).copied().unwrap_or(0);
        let rank = if forward < 0 { last - rank } else { rank };
        layers[rank].push(index);
    }
    layers
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::model::{Element, Flow, Model};

    use super::*;

    #[test]
    fn test_layers_from_downward_coordinates() {
        let nodes: HashMap<NodeIndex, (f64, f64)> = [
            (NodeIndex::new(0), (0.0, 0.0)),
            (NodeIndex::new(1), (5.0, 3.0)),
            (NodeIndex::new(2), (-5.0, 3.0)),
        ]
        .into_iter()
        .collect();
        let layers = layers_from_coordinates(&nodes, &[(0, 1), (0, 2)]);
        assert_eq!(
            layers,
            vec![
                vec![NodeIndex::new(0)],
                vec![NodeIndex::new(2), NodeIndex::new(1)]
            ]
        );
    }

    #[test]
    fn test_layers_from_upward_coordinates() {
        let nodes: HashMap<NodeIndex, (f64, f64)> = [
            (NodeIndex::new(0), (0.0, 0.0)),
            (NodeIndex::new(1), (0.0, -3.0)),
            (NodeIndex::new(2), (0.0, -6.0)),
        ]
        .into_iter()
        .collect();
        let layers = layers_from_coordinates(&nodes, &[(0, 1), (1, 2)]);
        assert_eq!(
            layers,
            vec![
                vec![NodeIndex::new(0)],
                vec![NodeIndex::new(1)],
                vec![NodeIndex::new(2)]
            ]
        );
    }

    #[test]
    fn test_edgeless_graph_is_a_row() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("a", "task"));
        model.elements.push(Element::new("b", "task"));
        let graph = FlowGraph::new(&model, |_| true);
        let engine = SugiyamaEngine::new(Direction::LeftRight, &SpacingConfig::default());
        let positions = engine.place(&graph).expect("edgeless graphs need no solver");
        assert_eq!(positions["a"].y(), positions["b"].y());
        assert!(positions["a"].x() + 120.0 < positions["b"].x());
    }

    #[test]
    fn test_chain_places_every_node() {
        let mut model = Model::new("p");
        for id in ["s", "a", "b", "e", "lonely"] {
            model.elements.push(Element::new(id, "task"));
        }
        model.flows.push(Flow::new("f1", "s", "a"));
        model.flows.push(Flow::new("f2", "a", "b"));
        model.flows.push(Flow::new("f3", "b", "e"));
        let graph = FlowGraph::new(&model, |_| true);
        let engine = SugiyamaEngine::new(Direction::LeftRight, &SpacingConfig::default());

        // The solver is external; when it fails the resolver falls back.
        if let Ok(positions) = engine.place(&graph) {
            assert_eq!(positions.len(), 5);
            assert!(positions["s"].x() < positions["a"].x());
            assert!(positions["a"].x() < positions["b"].x());
        }
    }
}
