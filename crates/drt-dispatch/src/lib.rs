//! `drt-dispatch`: online request dispatch and charging planning.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`dispatcher`] | `Dispatcher` (one cycle over pending requests)            |
//! | [`insertion`]  | candidate evaluation, `Insertion`, `commit`, `retract`    |
//! | [`candidate`]  | `CandidatePolicy`, `AllVehicles`, `DesignatedVehicles`    |
//! | [`cost`]       | `CostFunction`                                            |
//! | [`charging`]   | `ChargingPlanner` for idle electric vehicles              |
//! | [`config`]     | `DispatchConfig`, `ChargingPolicy`                        |
//! | [`report`]     | `DispatchReport`, `Rejection`, `RejectionReason`          |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                      |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Evaluate candidate vehicles with Rayon.                   |
//! | `serde`    | Derives `Serialize`/`Deserialize` on the config types.    |

pub mod candidate;
pub mod charging;
pub mod config;
pub mod cost;
pub mod dispatcher;
mod energy;
pub mod error;
pub mod insertion;
pub mod report;

#[cfg(test)]
mod tests;

pub use candidate::{AllVehicles, CandidatePolicy, DesignatedVehicles};
pub use charging::{ChargingPlanner, StepGrid};
pub use config::{ChargingPolicy, DispatchConfig};
pub use cost::{CostFunction, CostInputs};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use insertion::{Insertion, InsertionContext, commit, evaluate, retract};
pub use report::{
    Assignment, ChargingAssignment, DispatchReport, InfeasibleRequest, Rejection, RejectionReason,
};
