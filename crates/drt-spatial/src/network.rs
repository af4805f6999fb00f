//! Road network representation and builder.
//!
//! # Data layout
//!
//! Outgoing links are stored in **Compressed Sparse Row (CSR)** form.  The
//! links leaving `NodeId n` are the contiguous `LinkId` range
//!
//! ```text
//! node_out_start[n] .. node_out_start[n+1]
//! ```
//!
//! and every per-link array (`link_from`, `link_to`, `link_length_m`,
//! `link_travel_ms`) is indexed by that `LinkId`.  The path engine's inner
//! loop is therefore a linear scan.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`.  Charger
//! sites given as coordinates are snapped through it when the charging
//! infrastructure is built.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use drt_core::{GeoPoint, LinkId, NodeId};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Good enough for
    /// nearest-node queries inside one service area.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// Immutable once built; shared by reference between the dispatcher, the
/// charging planner and the executor.  Use [`RoadNetworkBuilder`] to create
/// one.
pub struct RoadNetwork {
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each link (used for path reconstruction).
    pub link_from: Vec<NodeId>,

    /// Destination node of each link.
    pub link_to: Vec<NodeId>,

    /// Length of each link in metres.
    pub link_length_m: Vec<f32>,

    /// Free-flow travel time in milliseconds.  Path cost.
    pub link_travel_ms: Vec<u32>,

    spatial_idx: RTree<NodeEntry>,
}

impl RoadNetwork {
    /// A network with no nodes.  Every routing query against it fails.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    /// `Ok(node)` if the node exists, `NodeNotFound` otherwise.
    pub fn check_node(&self, node: NodeId) -> SpatialResult<NodeId> {
        if self.contains(node) {
            Ok(node)
        } else {
            Err(SpatialError::NodeNotFound(node))
        }
    }

    pub fn node_position(&self, node: NodeId) -> SpatialResult<GeoPoint> {
        self.node_pos
            .get(node.index())
            .copied()
            .ok_or(SpatialError::NodeNotFound(node))
    }

    /// `LinkId`s of all links leaving `node`.  No allocation.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| LinkId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest road node to `pos`.
    pub fn snap_to_node(&self, pos: GeoPoint) -> SpatialResult<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
            .ok_or(SpatialError::EmptyNetwork(pos))
    }

    /// Up to `k` nearest nodes to `pos`, ascending distance.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use drt_core::GeoPoint;
/// use drt_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(52.52, 13.40));
/// let c = b.add_node(GeoPoint::new(52.53, 13.40));
/// b.add_road(a, c, 1_200.0, 90_000);
/// let net = b.build();
/// assert_eq!(net.link_count(), 2);
/// ```
pub struct RoadNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_links: Vec<RawLink>,
}

struct RawLink {
    from:      NodeId,
    to:        NodeId,
    length_m:  f32,
    travel_ms: u32,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_links: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_links: Vec::with_capacity(links),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a directed link.
    pub fn add_link(&mut self, from: NodeId, to: NodeId, length_m: f32, travel_ms: u32) {
        self.raw_links.push(RawLink { from, to, length_m, travel_ms });
    }

    /// Add links in both directions.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f32, travel_ms: u32) {
        self.add_link(a, b, length_m, travel_ms);
        self.add_link(b, a, length_m, travel_ms);
    }

    /// Add a two-way road whose length is the great-circle distance between
    /// the endpoints, travelled at `speed_mps`.
    pub fn add_road_at_speed(&mut self, a: NodeId, b: NodeId, speed_mps: f32) {
        let length_m = self.nodes[a.index()].distance_m(self.nodes[b.index()]);
        let travel_ms = (length_m / speed_mps.max(0.1) * 1_000.0).round() as u32;
        self.add_road(a, b, length_m, travel_ms);
    }

    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.raw_links.len() }

    /// Consume the builder.  O(L log L) link sort plus O(N log N) R-tree
    /// bulk load.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();

        let mut raw = self.raw_links;
        raw.sort_by_key(|l| l.from.0);

        let link_from:      Vec<NodeId> = raw.iter().map(|l| l.from).collect();
        let link_to:        Vec<NodeId> = raw.iter().map(|l| l.to).collect();
        let link_length_m:  Vec<f32>    = raw.iter().map(|l| l.length_m).collect();
        let link_travel_ms: Vec<u32>    = raw.iter().map(|l| l.travel_ms).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for l in &raw {
            node_out_start[l.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: [pos.lat, pos.lon], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        tracing::debug!(nodes = node_count, links = raw.len(), "road network built");

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            link_from,
            link_to,
            link_length_m,
            link_travel_ms,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
