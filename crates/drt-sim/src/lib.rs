//! `drt-sim`: step loop orchestrator for the rust_drt dispatch core.
//!
//! # Step loop
//!
//! ```text
//! for step in 0..config.total_steps:
//!   ① Release  : scripted requests whose submission time has come enter
//!                 the RequestRegistry as Unplanned.
//!   ② Execute  : ScheduleExecutor advances every vehicle's schedule to now
//!                 (parallel with the `parallel` feature); Charge tasks plug
//!                 into their charger.
//!   ③ Apply    : for each task event in ascending VehicleId order:
//!                   Pickup ended   → request picked up
//!                   Dropoff ended  → request Performed
//!   ④ Dispatch : every dispatch_interval_steps: Dispatcher::run_cycle,
//!                 then ChargingPlanner::plan.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Schedule execution and candidate evaluation on Rayon.      |
//! | `serde`    | Serde derives on configs, requests, and schedules.         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use drt_core::{NodeId, SimConfig, SimTime};
//! use drt_fleet::FleetBuilder;
//! use drt_sim::{NoopObserver, SimBuilder};
//! use drt_spatial::DijkstraRouter;
//!
//! let fleet = FleetBuilder::new(SimTime(0), SimTime(86_400)).vehicle(NodeId(0), 4).build()?;
//! let mut sim = SimBuilder::new(SimConfig::default(), network, fleet, DijkstraRouter)
//!     .requests(requests)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;
pub mod stats;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
pub use stats::SimStats;
