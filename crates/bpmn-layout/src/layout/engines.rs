//! Free-graph placement engines.
//!
//! An engine turns the flow graph of one container into top-left positions,
//! relative to the origin of the placed block. The resolver selects the
//! engine from [`LayoutEngine`] and falls back to the recovery grid when an
//! engine fails.
//!
//! Layered engines produce *components*: one per connected part of the
//! graph, each a list of levels holding node indices in cross-axis order.
//! [`place_components`] turns them into coordinates with one uniform slot
//! pitch, so the first node of every level shares a center line.

mod basic;
#[cfg(feature = "graphviz")]
mod graphviz;
mod sugiyama;

use std::collections::HashMap;

use indexmap::IndexMap;
use petgraph::{
    Direction as EdgeDirection,
    graph::{DiGraph, NodeIndex},
};

use bpmn_layout_core::{
    geometry::{Point, Size},
    model::{Element, Model},
};

use super::Axis;
use crate::{
    config::{Direction, LayoutEngine, SpacingConfig},
    error::LayoutError,
};

pub use basic::BasicEngine;
pub use sugiyama::SugiyamaEngine;

/// Levels of one connected component, each in cross-axis order.
pub(super) type Layers = Vec<Vec<NodeIndex>>;

/// Interface of the free-graph placement algorithms.
pub trait PlacementEngine {
    /// Computes a top-left position for every node of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Engine`] if the algorithm cannot produce a
    /// layout; callers are expected to fall back to a deterministic grid.
    fn place(&self, graph: &FlowGraph<'_>) -> Result<IndexMap<String, Point>, LayoutError>;
}

/// Creates the engine selected by `engine`.
///
/// Selecting [`LayoutEngine::Graphviz`] without the `graphviz` feature yields
/// an engine that always fails, which routes callers to the grid fallback.
pub fn engine_for(
    engine: LayoutEngine,
    direction: Direction,
    spacing: &SpacingConfig,
) -> Box<dyn PlacementEngine> {
    match engine {
        LayoutEngine::Basic => Box::new(BasicEngine::new(direction, spacing)),
        LayoutEngine::Sugiyama => Box::new(SugiyamaEngine::new(direction, spacing)),
        #[cfg(feature = "graphviz")]
        LayoutEngine::Graphviz => Box::new(graphviz::GraphvizEngine::new(direction, spacing)),
        #[cfg(not(feature = "graphviz"))]
        LayoutEngine::Graphviz => Box::new(Unavailable("graphviz")),
    }
}

#[cfg(not(feature = "graphviz"))]
struct Unavailable(&'static str);

#[cfg(not(feature = "graphviz"))]
impl PlacementEngine for Unavailable {
    fn place(&self, _graph: &FlowGraph<'_>) -> Result<IndexMap<String, Point>, LayoutError> {
        Err(LayoutError::Engine(format!(
            "the `{}` engine is not compiled in",
            self.0
        )))
    }
}

/// Directed graph of the elements placed together, in model order.
///
/// Flows touching elements outside the graph (subprocess children, boundary
/// events) are lifted to the nearest enclosing node, so containers inherit
/// the connections of their content. Self-loops and duplicate edges are
/// dropped.
#[derive(Debug)]
pub struct FlowGraph<'a> {
    graph: DiGraph<&'a Element, ()>,
}

impl<'a> FlowGraph<'a> {
    pub fn new(model: &'a Model, include: impl Fn(&Element) -> bool) -> Self {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
        for element in model.elements.iter().filter(|element| include(element)) {
            indices.insert(element.id.as_str(), graph.add_node(element));
        }

        for flow in &model.flows {
            let (Some(source), Some(target)) = (
                representative(model, &flow.source, &indices),
                representative(model, &flow.target, &indices),
            ) else {
                continue;
            };
            if source != target && graph.find_edge(source, target).is_none() {
                graph.add_edge(source, target, ());
            }
        }

        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Ids of the nodes, in model order.
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.graph.node_weights().map(|&element| element.id.as_str())
    }

    pub(super) fn element(&self, index: NodeIndex) -> &'a Element {
        self.graph[index]
    }

    pub(super) fn size(&self, index: NodeIndex) -> Size {
        self.graph[index].size_or_default()
    }

    pub(super) fn graph(&self) -> &DiGraph<&'a Element, ()> {
        &self.graph
    }

    /// Entry points of breadth-first layering: start events, otherwise nodes
    /// without incoming flow, otherwise the first node.
    pub(super) fn start_nodes(&self) -> Vec<NodeIndex> {
        let starts: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&index| self.graph[index].kind.is_start())
            .collect();
        if !starts.is_empty() {
            return starts;
        }

        let roots: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, EdgeDirection::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        if !roots.is_empty() {
            return roots;
        }

        self.graph.node_indices().take(1).collect()
    }
}

/// Nearest node of the graph that stands for element `id`.
fn representative(
    model: &Model,
    id: &str,
    indices: &HashMap<&str, NodeIndex>,
) -> Option<NodeIndex> {
    let mut current = id;
    for _ in 0..=model.elements.len() {
        if let Some(&index) = indices.get(current) {
            return Some(index);
        }
        let element = model.element(current)?;
        current = element
            .attached_to
            .as_deref()
            .or(element.subprocess_id.as_deref())?;
    }
    None
}

/// Converts layered components into top-left positions.
///
/// Levels follow each other along the main axis separated by
/// `spacing.level`. Inside a level, nodes occupy slots of one uniform pitch
/// on the cross axis. Components are stacked on the cross axis.
pub(super) fn place_components(
    graph: &FlowGraph<'_>,
    components: &[Layers],
    axis: Axis,
    spacing: &SpacingConfig,
) -> IndexMap<String, Point> {
    let largest_cross = graph
        .graph()
        .node_indices()
        .map(|index| axis.cross(graph.size(index)))
        .fold(0.0_f32, f32::max);
    let pitch = largest_cross + spacing.node;

    let mut positions = IndexMap::new();
    let mut cross_origin = 0.0;
    for layers in components {
        let mut main_cursor = 0.0;
        let mut slots = 0;
        for layer in layers {
            let layer_main = layer
                .iter()
                .map(|&index| axis.main(graph.size(index)))
                .fold(0.0_f32, f32::max);
            for (slot, &index) in layer.iter().enumerate() {
                let size = graph.size(index);
                let main = main_cursor + (layer_main - axis.main(size)) / 2.0;
                let cross =
                    cross_origin + slot as f32 * pitch + (largest_cross - axis.cross(size)) / 2.0;
                positions.insert(graph.element(index).id.clone(), axis.point(main, cross));
            }
            slots = slots.max(layer.len());
            main_cursor += layer_main + spacing.level;
        }
        if slots > 0 {
            cross_origin += slots as f32 * pitch + spacing.level - spacing.node;
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::model::Flow;

    use super::*;

    fn chain() -> Model {
        let mut model = Model::new("p");
        model.elements.push(Element::new("s", "startEvent"));
        model.elements.push(Element::new("sub", "subProcess"));
        model.elements.push(Element::new("inner", "task").with_subprocess("sub"));
        model.elements.push(Element::new("b", "boundaryEvent").attached_to("inner"));
        model.elements.push(Element::new("e", "endEvent"));
        model.flows.push(Flow::new("f1", "s", "inner"));
        model.flows.push(Flow::new("f2", "b", "e"));
        model.flows.push(Flow::new("f3", "inner", "inner"));
        model.flows.push(Flow::new("f4", "s", "sub"));
        model
    }

    #[test]
    fn test_flows_lift_to_representatives() {
        let model = chain();
        let graph = FlowGraph::new(&model, |element| {
            element.subprocess_id.is_none() && element.attached_to.is_none()
        });
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["s", "sub", "e"]);
        // s -> sub (twice, deduplicated) and sub -> e
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_start_nodes_fall_back_to_roots() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("a", "task"));
        model.elements.push(Element::new("b", "task"));
        model.flows.push(Flow::new("f", "b", "a"));
        let graph = FlowGraph::new(&model, |_| true);
        let starts = graph.start_nodes();
        assert_eq!(starts.len(), 1);
        assert_eq!(graph.element(starts[0]).id, "b");
    }

    #[test]
    fn test_place_components_aligns_first_slot() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("s", "startEvent"));
        model.elements.push(Element::new("t", "task"));
        let graph = FlowGraph::new(&model, |_| true);
        let nodes: Vec<_> = graph.graph().node_indices().collect();
        let layers = vec![vec![nodes[0]], vec![nodes[1]]];

        let positions = place_components(
            &graph,
            &[layers],
            Axis::Horizontal,
            &SpacingConfig::default(),
        );
        let start = positions["s"];
        let task = positions["t"];
        // Centers share the row line.
        assert_eq!(start.y() + 18.0, task.y() + 40.0);
        // The task level starts one level gap after the event.
        assert_eq!(task.x(), 36.0 + 80.0);
    }
}
