// src/analysis/sankey.rs
//! Sankey geometry for a flow graph: node rectangles stacked in depth columns
//! and horizontal link bands whose widths are proportional to flow magnitude.
//!
//! Negative flows keep their signed value for labels but contribute zero
//! thickness to the geometry; such links are flagged as `deficit`.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use super::flow::FlowGraph;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("flow references unknown node {0:?}")]
    UnknownNode(String),

    #[error("flow graph has a cycle through {0:?}")]
    Cycle(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SankeyOptions {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_padding: f32,
    pub margin: f32,
}

impl Default for SankeyOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            node_width: 15.0,
            node_padding: 10.0,
            margin: 20.0,
        }
    }
}

impl SankeyOptions {
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Drawable area as `(x0, y0, x1, y1)`.
    fn extent(&self) -> (f32, f32, f32, f32) {
        let x0 = self.margin + 1.0;
        let y0 = self.margin + 1.0;
        let x1 = (self.width - self.margin - 1.0).max(x0);
        let y1 = (self.height - self.margin - 5.0).max(y0);
        (x0, y0, x1, y1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometry {
    pub name: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub depth: usize,
    /// Signed total shown in the label.
    pub value: f64,
    /// Clamped total the height is drawn from.
    pub magnitude: f64,
}

impl NodeGeometry {
    #[cfg(test)]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkGeometry {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f32,
    /// Band centre where it leaves the source node.
    pub y0: f32,
    /// Band centre where it enters the target node.
    pub y1: f32,
    pub x0: f32,
    pub x1: f32,
    pub deficit: bool,
}

impl LinkGeometry {
    /// Control points of the horizontal cubic curve along the band centre.
    pub fn curve(&self) -> [(f32, f32); 4] {
        let xm = (self.x0 + self.x1) / 2.0;
        [
            (self.x0, self.y0),
            (xm, self.y0),
            (xm, self.y1),
            (self.x1, self.y1),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SankeyLayout {
    pub nodes: Vec<NodeGeometry>,
    pub links: Vec<LinkGeometry>,
    pub width: f32,
    pub height: f32,
}

impl SankeyLayout {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn node(&self, name: &str) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

pub fn layout(graph: &FlowGraph, options: &SankeyOptions) -> Result<SankeyLayout, LayoutError> {
    let mut result = SankeyLayout {
        width: options.width,
        height: options.height,
        ..Default::default()
    };
    if graph.is_empty() {
        return Ok(result);
    }

    let mut dag: DiGraph<usize, usize> = DiGraph::new();
    let mut by_name = HashMap::new();
    let indices: Vec<NodeIndex> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let idx = dag.add_node(i);
            by_name.insert(node.name.as_str(), idx);
            idx
        })
        .collect();

    for (i, edge) in graph.edges.iter().enumerate() {
        let lookup = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| LayoutError::UnknownNode(name.to_string()))
        };
        dag.add_edge(lookup(&edge.source)?, lookup(&edge.target)?, i);
    }

    let order = toposort(&dag, None)
        .map_err(|cycle| LayoutError::Cycle(graph.nodes[dag[cycle.node_id()]].name.clone()))?;

    // Longest-path depth from the sources, sinks pushed to the last column.
    let mut depth = vec![0usize; graph.nodes.len()];
    for &idx in &order {
        for next in dag.neighbors_directed(idx, Direction::Outgoing) {
            depth[dag[next]] = depth[dag[next]].max(depth[dag[idx]] + 1);
        }
    }
    let max_depth = depth.iter().copied().max().unwrap_or(0);
    for &idx in &indices {
        let has_out = dag.neighbors_directed(idx, Direction::Outgoing).next().is_some();
        let has_in = dag.neighbors_directed(idx, Direction::Incoming).next().is_some();
        if !has_out && has_in {
            depth[dag[idx]] = max_depth;
        }
    }

    // Non-finite values get no thickness rather than poisoning the scale.
    let magnitude = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };
    let mut in_sum = vec![(0.0f64, 0.0f64); graph.nodes.len()];
    let mut out_sum = vec![(0.0f64, 0.0f64); graph.nodes.len()];
    let mut has_in = vec![false; graph.nodes.len()];
    for edge in dag.edge_references() {
        let value = graph.edges[*edge.weight()].value;
        let (s, t) = (dag[edge.source()], dag[edge.target()]);
        out_sum[s].0 += value;
        out_sum[s].1 += magnitude(value);
        in_sum[t].0 += value;
        in_sum[t].1 += magnitude(value);
        has_in[t] = true;
    }

    let (ex0, ey0, ex1, ey1) = options.extent();
    let columns = max_depth + 1;
    let kx = if columns > 1 {
        ((ex1 - ex0 - options.node_width) / max_depth as f32).max(0.0)
    } else {
        0.0
    };

    result.nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let x0 = ex0 + depth[i] as f32 * kx;
            NodeGeometry {
                name: node.name.clone(),
                x0,
                x1: x0 + options.node_width,
                y0: 0.0,
                y1: 0.0,
                depth: depth[i],
                value: if has_in[i] { in_sum[i].0 } else { out_sum[i].0 },
                magnitude: magnitude(in_sum[i].1.max(out_sum[i].1)),
            }
        })
        .collect();

    let mut column_members: Vec<Vec<usize>> = vec![Vec::new(); columns];
    for (i, node) in result.nodes.iter().enumerate() {
        column_members[node.depth].push(i);
    }

    let available = ey1 - ey0;
    let ky = column_members
        .iter()
        .filter_map(|members| {
            let total: f64 = members.iter().map(|&i| result.nodes[i].magnitude).sum();
            if total <= 0.0 || !total.is_finite() {
                return None;
            }
            let room =
                available - (members.len().saturating_sub(1)) as f32 * options.node_padding;
            Some((room.max(0.0) as f64 / total) as f32)
        })
        .fold(f32::INFINITY, f32::min);
    let ky = if ky.is_finite() { ky } else { 0.0 };

    for members in &column_members {
        let used: f32 = members
            .iter()
            .map(|&i| (result.nodes[i].magnitude * ky as f64) as f32)
            .sum::<f32>()
            + members.len().saturating_sub(1) as f32 * options.node_padding;
        let mut y = ey0 + ((available - used) / 2.0).max(0.0);
        for &i in members {
            let node = &mut result.nodes[i];
            node.y0 = y;
            node.y1 = y + (node.magnitude * ky as f64) as f32;
            y = node.y1 + options.node_padding;
        }
    }

    result.links = graph
        .edges
        .iter()
        .map(|edge| {
            let source = dag[by_name[edge.source.as_str()]];
            let target = dag[by_name[edge.target.as_str()]];
            LinkGeometry {
                source,
                target,
                value: edge.value,
                width: (magnitude(edge.value) * ky as f64) as f32,
                y0: 0.0,
                y1: 0.0,
                x0: result.nodes[source].x1,
                x1: result.nodes[target].x0,
                deficit: edge.value < 0.0,
            }
        })
        .collect();

    // Stack bands inside each node, ordered by the position of the far end.
    for node in 0..result.nodes.len() {
        let mut outgoing: Vec<usize> = (0..result.links.len())
            .filter(|&l| result.links[l].source == node)
            .collect();
        outgoing.sort_by(|&a, &b| {
            let ya = result.nodes[result.links[a].target].y0;
            let yb = result.nodes[result.links[b].target].y0;
            ya.total_cmp(&yb)
        });
        let mut y = result.nodes[node].y0;
        for l in outgoing {
            let link = &mut result.links[l];
            link.y0 = y + link.width / 2.0;
            y += link.width;
        }

        let mut incoming: Vec<usize> = (0..result.links.len())
            .filter(|&l| result.links[l].target == node)
            .collect();
        incoming.sort_by(|&a, &b| {
            let ya = result.nodes[result.links[a].source].y0;
            let yb = result.nodes[result.links[b].source].y0;
            ya.total_cmp(&yb)
        });
        let mut y = result.nodes[node].y0;
        for l in incoming {
            let link = &mut result.links[l];
            link.y1 = y + link.width / 2.0;
            y += link.width;
        }
    }

    Ok(result)
}
