//! Per-vehicle movement state.

use drt_core::{NodeId, SimTime};
use drt_spatial::Route;

/// Where a vehicle is, as far as its schedule says.
///
/// A vehicle is either stationary at a node or driving a Drive task's route.
/// Movement is teleport-at-arrival: the vehicle counts as being at
/// `departure_node` until the Drive ends, then appears at
/// `destination_node`.  [`progress`](Self::progress) lets renderers
/// interpolate in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementState {
    pub in_transit: bool,
    pub departure_node: NodeId,
    /// Equals `departure_node` when stationary.
    pub destination_node: NodeId,
    pub departure: SimTime,
    /// Equals `departure` when stationary.
    pub arrival: SimTime,
}

impl MovementState {
    #[inline]
    pub fn stationary(node: NodeId, at: SimTime) -> Self {
        Self {
            in_transit: false,
            departure_node: node,
            destination_node: node,
            departure: at,
            arrival: at,
        }
    }

    pub fn driving(route: &Route) -> Self {
        Self {
            in_transit: true,
            departure_node: route.from,
            destination_node: route.to,
            departure: route.departure,
            arrival: route.arrival,
        }
    }

    /// Fraction of the current drive completed at `now`, in `[0.0, 1.0]`.
    /// Always `1.0` when stationary.
    pub fn progress(&self, now: SimTime) -> f32 {
        if !self.in_transit || self.arrival <= self.departure {
            return 1.0;
        }
        let elapsed = now.saturating_since(self.departure) as f32;
        let total = (self.arrival - self.departure) as f32;
        (elapsed / total).min(1.0)
    }

    /// The node the vehicle counts as being at.
    pub fn node(&self) -> NodeId {
        self.departure_node
    }
}
