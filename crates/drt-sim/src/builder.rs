//! Fluent builder for constructing a [`Sim`].

use std::collections::VecDeque;

use drt_core::SimConfig;
use drt_demand::{Request, RequestRegistry};
use drt_dispatch::{
    AllVehicles, CandidatePolicy, ChargingPlanner, ChargingPolicy, DispatchConfig, Dispatcher,
};
use drt_ev::{ChargerSpec, ChargingInfrastructure};
use drt_fleet::Fleet;
use drt_mobility::ScheduleExecutor;
use drt_spatial::{RoadNetwork, Router};

use crate::{Sim, SimError, SimResult, SimStats};

/// Fluent builder for [`Sim<R, C>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: start/end time, step length, dispatch cadence
/// - [`RoadNetwork`]
/// - [`Fleet`]: from [`drt_fleet::FleetBuilder`] or a fleet file
/// - `R: Router`, e.g. [`drt_spatial::DijkstraRouter`]
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                          |
/// |-------------------------|----------------------------------|
/// | `.chargers(v)`          | no chargers                      |
/// | `.requests(v)`          | no scripted demand               |
/// | `.dispatch_config(c)`   | `DispatchConfig::default()`      |
/// | `.charging_policy(p)`   | `ChargingPolicy::default()`      |
/// | `.policy(p)`            | `AllVehicles`                    |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, network, fleet, DijkstraRouter)
///     .chargers(chargers)
///     .requests(requests)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<R: Router, C: CandidatePolicy = AllVehicles> {
    config:          SimConfig,
    network:         RoadNetwork,
    fleet:           Fleet,
    router:          R,
    chargers:        Vec<ChargerSpec>,
    requests:        Vec<Request>,
    dispatch_config: DispatchConfig,
    charging_policy: ChargingPolicy,
    policy:          C,
}

impl<R: Router> SimBuilder<R> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, network: RoadNetwork, fleet: Fleet, router: R) -> Self {
        Self {
            config,
            network,
            fleet,
            router,
            chargers:        Vec::new(),
            requests:        Vec::new(),
            dispatch_config: DispatchConfig::default(),
            charging_policy: ChargingPolicy::default(),
            policy:          AllVehicles,
        }
    }
}

impl<R: Router, C: CandidatePolicy> SimBuilder<R, C> {
    /// Charger specifications; locations are resolved against the network
    /// in [`build`](Self::build).
    pub fn chargers(mut self, specs: Vec<ChargerSpec>) -> Self {
        self.chargers = specs;
        self
    }

    /// Requests released into the registry when the clock reaches their
    /// `submitted` time.  Order does not matter.
    pub fn requests(mut self, requests: Vec<Request>) -> Self {
        self.requests = requests;
        self
    }

    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    pub fn charging_policy(mut self, policy: ChargingPolicy) -> Self {
        self.charging_policy = policy;
        self
    }

    /// Replace the candidate policy.
    pub fn policy<P: CandidatePolicy>(self, policy: P) -> SimBuilder<R, P> {
        SimBuilder {
            config:          self.config,
            network:         self.network,
            fleet:           self.fleet,
            router:          self.router,
            chargers:        self.chargers,
            requests:        self.requests,
            dispatch_config: self.dispatch_config,
            charging_policy: self.charging_policy,
            policy,
        }
    }

    /// Validate inputs, resolve chargers, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<R, C>> {
        // ── Validate ──────────────────────────────────────────────────────
        if self.config.step_secs == 0 {
            return Err(SimError::Config("step_secs must be > 0".into()));
        }
        if self.config.end_time <= self.config.start_time {
            return Err(SimError::Config(format!(
                "end_time {} is not after start_time {}",
                self.config.end_time, self.config.start_time
            )));
        }
        self.fleet.validate_against(&self.network)?;
        for request in &self.requests {
            self.network.check_node(request.origin)?;
            self.network.check_node(request.destination)?;
        }

        #[cfg(feature = "parallel")]
        if let Some(threads) = self.config.num_threads {
            // The global pool can only be configured once per process.
            if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
                tracing::warn!(threads, error = %e, "rayon pool already initialised, keeping it");
            }
        }

        let dispatcher = Dispatcher::with_policy(self.dispatch_config, self.policy)?;
        let charging = ChargingPlanner::new(self.charging_policy)?
            .on_step_grid(self.config.start_time, u64::from(self.config.step_secs));
        let chargers = ChargingInfrastructure::build(self.chargers, &self.network)?;

        // ── Arrival queue in submission order (stable for equal times) ────
        let mut requests = self.requests;
        requests.sort_by_key(|r| r.submitted);

        tracing::info!(
            vehicles = self.fleet.len(),
            chargers = chargers.len(),
            requests = requests.len(),
            steps = self.config.total_steps(),
            "simulation built"
        );

        Ok(Sim {
            clock:    self.config.make_clock(),
            config:   self.config,
            executor: ScheduleExecutor::new(&self.fleet),
            network:  self.network,
            fleet:    self.fleet,
            router:   self.router,
            requests: RequestRegistry::new(),
            arrivals: VecDeque::from(requests),
            chargers,
            dispatcher,
            charging,
            stats:    SimStats::default(),
        })
    }
}
