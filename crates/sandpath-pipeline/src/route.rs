//! Jump routing: connect the end of one contour to the start of the next
//! through strokes that are already drawn.
//!
//! Every unique point of the drawn paths becomes a graph node. Consecutive
//! points of a path are joined by stroke links, which cost no jump
//! distance. Each node is also linked to its [`MAX_JUMP_CONNECTIONS`]
//! nearest neighbors by jump links weighted with their length. A
//! shortest-path search then minimizes total jump distance first and
//! total path length second, so the pen retraces existing grooves rather
//! than cutting across the canvas.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::queue::PriorityQueue;
use crate::types::{Point, Polyline};

/// Number of nearest neighbors each node gets a jump link to.
pub const MAX_JUMP_CONNECTIONS: usize = 10;

/// Edge kind between two graph nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Link {
    /// Consecutive points of a drawn path: free to retrace.
    Stroke,
    /// A pen jump of the given length.
    Jump(f64),
}

impl Link {
    const fn jump_distance(self) -> f64 {
        match self {
            Self::Stroke => 0.0,
            Self::Jump(d) => d,
        }
    }
}

/// Accumulated route cost, ordered by jump distance and then by length.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
struct Cost {
    jump: f64,
    length: f64,
}

impl Cost {
    const ZERO: Self = Self {
        jump: 0.0,
        length: 0.0,
    };
}

/// Bit-exact coordinate key for node deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey {
    x_bits: u64,
    y_bits: u64,
}

impl CoordKey {
    const fn from_point(p: Point) -> Self {
        Self {
            x_bits: p.x.to_bits(),
            y_bits: p.y.to_bits(),
        }
    }
}

type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Graph over the points of already drawn paths.
///
/// Built fresh for every routing request.
pub struct JumpGraph {
    graph: UnGraph<Point, Link>,
    nodes: HashMap<CoordKey, NodeIndex>,
    index: RTree<IndexedPoint>,
}

impl JumpGraph {
    /// Build the graph from `paths`: one node per unique point, stroke
    /// links along each path, and jump links to each node's nearest
    /// neighbors.
    #[must_use]
    pub fn build(paths: &[Polyline]) -> Self {
        let mut graph = UnGraph::<Point, Link>::new_undirected();
        let mut nodes = HashMap::new();

        for path in paths {
            let mut prev: Option<NodeIndex> = None;
            for &p in path.points() {
                let node = *nodes
                    .entry(CoordKey::from_point(p))
                    .or_insert_with(|| graph.add_node(p));
                let unlinked =
                    prev.filter(|&prev| prev != node && graph.find_edge(prev, node).is_none());
                if let Some(prev) = unlinked {
                    graph.add_edge(prev, node, Link::Stroke);
                }
                prev = Some(node);
            }
        }

        let index = RTree::bulk_load(
            graph
                .node_indices()
                .map(|n| GeomWithData::new([graph[n].x, graph[n].y], n))
                .collect(),
        );

        let mut jump_graph = Self {
            graph,
            nodes,
            index,
        };
        let all: Vec<NodeIndex> = jump_graph.graph.node_indices().collect();
        for node in all {
            jump_graph.link_nearest(node);
        }
        jump_graph
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links (stroke and jump) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Find the node at `p`, adding it if the point is not on any path.
    fn get_or_insert(&mut self, p: Point) -> NodeIndex {
        let key = CoordKey::from_point(p);
        if let Some(&node) = self.nodes.get(&key) {
            return node;
        }
        let node = self.graph.add_node(p);
        self.nodes.insert(key, node);
        self.index.insert(GeomWithData::new([p.x, p.y], node));
        node
    }

    /// Add jump links from `node` to its nearest other nodes, skipping
    /// pairs that are already linked.
    fn link_nearest(&mut self, node: NodeIndex) {
        let origin = self.graph[node];
        let nearest: Vec<(NodeIndex, f64)> = self
            .index
            .nearest_neighbor_iter(&[origin.x, origin.y])
            .filter(|candidate| candidate.data != node)
            .take(MAX_JUMP_CONNECTIONS)
            .map(|candidate| (candidate.data, origin.distance(self.graph[candidate.data])))
            .collect();

        for (other, distance) in nearest {
            if self.graph.find_edge(node, other).is_none() {
                self.graph.add_edge(node, other, Link::Jump(distance));
            }
        }
    }

    /// Cheapest route from `start` to `end`.
    ///
    /// Both points are added to the graph if needed and linked to their
    /// nearest nodes. The returned polyline starts at `start` and ends at
    /// `end`; it is empty when `end` cannot be reached.
    #[must_use]
    pub fn route(&mut self, start: Point, end: Point) -> Polyline {
        let source = self.get_or_insert(start);
        let target = self.get_or_insert(end);
        self.link_nearest(source);
        self.link_nearest(target);

        self.shortest_path(source, target)
    }

    /// Lexicographic Dijkstra from `source` to `target`.
    fn shortest_path(&self, source: NodeIndex, target: NodeIndex) -> Polyline {
        let n = self.graph.node_count();
        let mut best: Vec<Option<Cost>> = vec![None; n];
        let mut previous: Vec<Option<NodeIndex>> = vec![None; n];
        let mut queue = PriorityQueue::new();

        best[source.index()] = Some(Cost::ZERO);
        queue.enqueue(Cost::ZERO, source);

        while let Some((cost, node)) = queue.dequeue() {
            if node == target {
                break;
            }
            // Skip entries superseded by a cheaper route.
            if best[node.index()].is_some_and(|known| cost > known) {
                continue;
            }

            let here = self.graph[node];
            for edge in self.graph.edges(node) {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                let candidate = Cost {
                    jump: cost.jump + edge.weight().jump_distance(),
                    length: cost.length + here.distance(self.graph[other]),
                };
                if best[other.index()].is_none_or(|known| candidate < known) {
                    best[other.index()] = Some(candidate);
                    previous[other.index()] = Some(node);
                    queue.enqueue(candidate, other);
                }
            }
        }

        if best[target.index()].is_none() {
            tracing::debug!(?source, ?target, "connector target unreachable");
            return Polyline::new(Vec::new());
        }

        let mut points = vec![self.graph[target]];
        let mut current = target;
        while let Some(prev) = previous[current.index()] {
            points.push(self.graph[prev]);
            current = prev;
        }
        points.reverse();
        Polyline::new(points)
    }
}

/// Route a connector from `start` to `end` over the drawn `paths`.
///
/// See [`JumpGraph::route`].
#[must_use = "returns the connector path"]
pub fn find_connector(paths: &[Polyline], start: Point, end: Point) -> Polyline {
    JumpGraph::build(paths).route(start, end)
}
