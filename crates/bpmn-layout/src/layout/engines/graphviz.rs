//! Placement through Graphviz `dot`.
//!
//! The graph is handed to the `dot` binary with fixed-size box nodes and the
//! `plain` output format is parsed back. Any failure, including a missing
//! binary, surfaces as [`LayoutError::Engine`].

use dot_structures::{Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Stmt, Vertex};
use graphviz_rust::{
    cmd::{CommandArg, Format},
    exec,
    printer::PrinterContext,
};
use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::visit::EdgeRef;

use bpmn_layout_core::geometry::{Bounds, Point, Size};

use super::{FlowGraph, PlacementEngine};
use crate::{
    config::{Direction, SpacingConfig},
    error::LayoutError,
};

/// Points per inch in Graphviz output.
const POINTS_PER_INCH: f32 = 72.0;

/// Graphviz `dot` placement.
#[derive(Debug, Clone)]
pub struct GraphvizEngine {
    direction: Direction,
    spacing: SpacingConfig,
}

impl GraphvizEngine {
    pub fn new(direction: Direction, spacing: &SpacingConfig) -> Self {
        Self {
            direction,
            spacing: spacing.clone(),
        }
    }

    fn to_dot(&self, graph: &FlowGraph<'_>) -> Graph {
        let rankdir = match self.direction {
            Direction::LeftRight => "LR",
            Direction::TopBottom => "TB",
        };
        let mut stmts = vec![
            Stmt::GAttribute(GraphAttributes::Graph(vec![
                attribute("rankdir", rankdir),
                attribute("nodesep", &inches(self.spacing.node)),
                attribute("ranksep", &inches(self.spacing.level)),
            ])),
            Stmt::GAttribute(GraphAttributes::Node(vec![
                attribute("shape", "box"),
                attribute("fixedsize", "true"),
                attribute("label", "\"\""),
            ])),
        ];

        for index in graph.graph().node_indices() {
            let size = graph.size(index);
            stmts.push(Stmt::Node(Node {
                id: node_id(index.index()),
                attributes: vec![
                    attribute("width", &inches(size.width())),
                    attribute("height", &inches(size.height())),
                ],
            }));
        }
        for edge in graph.graph().edge_references() {
            stmts.push(Stmt::Edge(Edge {
                ty: EdgeTy::Pair(
                    Vertex::N(node_id(edge.source().index())),
                    Vertex::N(node_id(edge.target().index())),
                ),
                attributes: Vec::new(),
            }));
        }

        Graph::DiGraph {
            id: Id::Plain("process".to_string()),
            strict: false,
            stmts,
        }
    }
}

impl PlacementEngine for GraphvizEngine {
    fn place(&self, graph: &FlowGraph<'_>) -> Result<IndexMap<String, Point>, LayoutError> {
        if graph.is_empty() {
            return Ok(IndexMap::new());
        }

        let dot = self.to_dot(graph);
        debug!(nodes = graph.node_count(), edges = graph.edge_count(); "Running graphviz dot");
        let output = exec(
            dot,
            &mut PrinterContext::default(),
            vec![CommandArg::Format(Format::Plain)],
        )
        .map_err(|err| LayoutError::Engine(format!("failed to run graphviz: {err}")))?;
        let output = String::from_utf8_lossy(&output);
        trace!("Graphviz plain output:\n{output}");

        let centers = parse_plain(&output)?;
        let mut boxes = IndexMap::new();
        for index in graph.graph().node_indices() {
            let center = centers.get(&index.index()).copied().ok_or_else(|| {
                LayoutError::Engine(format!("graphviz output lacks node {}", index.index()))
            })?;
            let size: Size = graph.size(index);
            boxes.insert(
                graph.element(index).id.clone(),
                Bounds::new_from_center(center, size),
            );
        }

        // dot leaves a margin around the drawing; shift it to the origin.
        let min = boxes
            .values()
            .map(|bounds| bounds.min_point())
            .reduce(|a, b| Point::new(a.x().min(b.x()), a.y().min(b.y())))
            .unwrap_or_default();
        Ok(boxes
            .into_iter()
            .map(|(id, bounds)| (id, bounds.min_point().sub_point(min)))
            .collect())
    }
}

/// Parses node centers from `plain` output, flipping y to point down.
fn parse_plain(output: &str) -> Result<IndexMap<usize, Point>, LayoutError> {
    let mut height = None;
    let mut centers = IndexMap::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["graph", _scale, _width, h, ..] => {
                height = h.parse::<f32>().ok();
            }
            ["node", name, x, y, ..] => {
                let Some(index) = name.strip_prefix('n').and_then(|n| n.parse::<usize>().ok())
                else {
                    continue;
                };
                let (Ok(x), Ok(y)) = (x.parse::<f32>(), y.parse::<f32>()) else {
                    continue;
                };
                centers.insert(index, Point::new(x, y));
            }
            _ => {}
        }
    }

    let height =
        height.ok_or_else(|| LayoutError::Engine("graphviz output lacks a graph line".into()))?;
    Ok(centers
        .into_iter()
        .map(|(index, point)| {
            let center = Point::new(
                point.x() * POINTS_PER_INCH,
                (height - point.y()) * POINTS_PER_INCH,
            );
            (index, center)
        })
        .collect())
}

fn node_id(index: usize) -> NodeId {
    NodeId(Id::Plain(format!("n{index}")), None)
}

fn attribute(key: &str, value: &str) -> Attribute {
    Attribute(Id::Plain(key.to_string()), Id::Plain(value.to_string()))
}

fn inches(points: f32) -> String {
    format!("{:.3}", points / POINTS_PER_INCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_flips_y() {
        let output = "graph 1 3 2\nnode n0 1 1.5 1.66 1.11 \"\" solid box black lightgrey\nnode n1 2 0.5 0.5 0.5 \"\" solid box black lightgrey\nedge n0 n1 4 1 1 1 1 1 1 1 1 solid black\nstop\n";
        let centers = parse_plain(output).expect("valid plain output");
        assert_eq!(centers.len(), 2);
        assert_eq!(centers[&0], Point::new(72.0, 36.0));
        assert_eq!(centers[&1], Point::new(144.0, 108.0));
    }

    #[test]
    fn test_parse_plain_requires_graph_line() {
        assert!(parse_plain("node n0 1 1 1 1\n").is_err());
    }
}
