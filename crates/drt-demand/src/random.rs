//! Seeded synthetic demand.

use drt_core::{NodeId, PassengerId, RequestId, SimRng, SimTime};
use drt_spatial::RoadNetwork;

use crate::Request;

/// Parameters for [`RandomDemand`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RandomDemandConfig {
    /// Mean seconds between submissions (Poisson arrivals).
    pub mean_interarrival_secs: f64,
    /// Pre-booking lead: the pickup window opens this many seconds after
    /// submission.  `None` = immediate requests without a window.
    pub lead_secs: Option<u64>,
    /// Window width in seconds when `lead_secs` is set.
    pub window_secs: u64,
    pub start: SimTime,
    pub end: SimTime,
}

impl Default for RandomDemandConfig {
    fn default() -> Self {
        Self {
            mean_interarrival_secs: 60.0,
            lead_secs: None,
            window_secs: 600,
            start: SimTime::ZERO,
            end: SimTime(3_600),
        }
    }
}

/// Generates requests with exponential inter-arrival times and origin and
/// destination drawn uniformly from the network's nodes.  Same seed, same
/// requests.
pub struct RandomDemand {
    cfg: RandomDemandConfig,
    rng: SimRng,
}

impl RandomDemand {
    pub fn new(cfg: RandomDemandConfig, seed: u64) -> Self {
        Self { cfg, rng: SimRng::new(seed) }
    }

    /// All requests between `start` and `end`, in submission order.  Each
    /// request has its own passenger.  Empty for networks with fewer than
    /// two nodes.
    pub fn generate(&mut self, network: &RoadNetwork) -> Vec<Request> {
        let n = network.node_count() as u32;
        let mut out = Vec::new();
        if n < 2 {
            return out;
        }

        let mut t = self.cfg.start.0 as f64;
        loop {
            t += self.rng.exponential(self.cfg.mean_interarrival_secs);
            let submitted = SimTime(t as u64);
            if submitted >= self.cfg.end {
                break;
            }
            let origin = NodeId(self.rng.gen_range(0..n));
            let mut destination = NodeId(self.rng.gen_range(0..n - 1));
            if destination >= origin {
                destination = NodeId(destination.0 + 1);
            }
            let id = RequestId(out.len() as u32);
            let mut req = Request::new(id, PassengerId(id.0), origin, destination, submitted);
            if let Some(lead) = self.cfg.lead_secs {
                let earliest = submitted.offset(lead);
                req = req.with_window(earliest, earliest.offset(self.cfg.window_secs));
            }
            out.push(req);
        }

        tracing::info!(requests = out.len(), "random demand generated");
        out
    }
}
