//! Routing trait and the reference Dijkstra engine.
//!
//! # Pluggability
//!
//! The dispatcher, the charging planner and the executor all reach the path
//! engine through [`Router`], so a time-dependent or contraction-hierarchy
//! engine can replace [`DijkstraRouter`] without touching them.
//!
//! # Units
//!
//! Link costs are milliseconds.  A [`Route`] carries its departure and its
//! arrival in whole seconds, the arrival rounded up so a vehicle is never
//! scheduled to arrive before it physically could.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use drt_core::{LinkId, NodeId, SimTime};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// A timed path between two nodes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Links in travel order.  Empty when `from == to`.
    pub links: Vec<LinkId>,
    pub from: NodeId,
    pub to: NodeId,
    pub departure: SimTime,
    pub arrival: SimTime,
    /// Total length in metres.
    pub length_m: f64,
}

impl Route {
    /// Zero-length route that stays at `node`.
    pub fn trivial(node: NodeId, at: SimTime) -> Self {
        Route { links: Vec::new(), from: node, to: node, departure: at, arrival: at, length_m: 0.0 }
    }

    #[inline]
    pub fn travel_secs(&self) -> u64 {
        self.arrival.saturating_since(self.departure)
    }

    #[inline]
    pub fn length_km(&self) -> f64 {
        self.length_m / 1_000.0
    }

    pub fn is_trivial(&self) -> bool {
        self.links.is_empty()
    }

    /// The same path departing at `departure` instead.
    ///
    /// Valid for time-independent engines only; the dispatcher uses it when
    /// a wait is inserted before an already-routed leg.
    pub fn shifted_to(&self, departure: SimTime) -> Route {
        Route {
            departure,
            arrival: departure.offset(self.travel_secs()),
            ..self.clone()
        }
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable path engine.
///
/// `Send + Sync` so one instance can be shared with Rayon workers during
/// parallel candidate evaluation.
pub trait Router: Send + Sync {
    /// Least-cost route from `from` to `to` leaving at `departure`.
    ///
    /// `from == to` yields an empty route, not an error.
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        departure: SimTime,
    ) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Free-flow Dijkstra over the CSR graph using `link_travel_ms` as cost.
/// Travel times do not depend on the departure time.
#[derive(Debug, Default, Clone, Copy)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        departure: SimTime,
    ) -> SpatialResult<Route> {
        network.check_node(from)?;
        network.check_node(to)?;
        dijkstra(network, from, to, departure)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

fn dijkstra(
    network: &RoadNetwork,
    from: NodeId,
    to: NodeId,
    departure: SimTime,
) -> SpatialResult<Route> {
    if from == to {
        return Ok(Route::trivial(from, departure));
    }

    let n = network.node_count();
    let mut dist      = vec![u32::MAX; n];
    let mut prev_link = vec![LinkId::INVALID; n];

    dist[from.index()] = 0;

    // NodeId as secondary key gives deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_link, from, to, cost, departure));
        }
        if cost > dist[node.index()] {
            continue; // stale
        }
        for link in network.out_links(node) {
            let next = network.link_to[link.index()];
            let new_cost = cost.saturating_add(network.link_travel_ms[link.index()]);
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_link[next.index()] = link;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(
    network: &RoadNetwork,
    prev_link: &[LinkId],
    from: NodeId,
    to: NodeId,
    total_ms: u32,
    departure: SimTime,
) -> Route {
    let mut links = Vec::new();
    let mut length_m = 0.0f64;
    let mut cur = to;
    while cur != from {
        let l = prev_link[cur.index()];
        if l == LinkId::INVALID {
            break;
        }
        links.push(l);
        length_m += network.link_length_m[l.index()] as f64;
        cur = network.link_from[l.index()];
    }
    links.reverse();
    let travel_secs = (total_ms as u64).div_ceil(1_000);
    Route {
        links,
        from,
        to,
        departure,
        arrival: departure.offset(travel_secs),
        length_m,
    }
}
