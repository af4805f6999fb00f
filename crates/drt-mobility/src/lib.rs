//! `drt-mobility`: schedule execution and vehicle movement state.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`state`]    | `MovementState` (stationary or driving a route)                |
//! | [`event`]    | `TaskEvent`, `TaskPhase`, `Activity`                           |
//! | [`executor`] | `ScheduleExecutor`, `MobilityStore`, `execute_vehicle`         |
//! | [`error`]    | `MobilityError`, `MobilityResult<T>`                           |
//!
//! # Execution model
//!
//! Vehicles follow their committed schedules to the second.  Each step the
//! executor walks every vehicle's unperformed tasks in order:
//!
//! 1. A `Started` task whose end has passed becomes `Performed`; its energy
//!    delta hits the battery and a Charge task releases its plug.
//! 2. A `Planned` task whose begin has passed becomes `Started`; a Charge
//!    task plugs in (or forfeits its energy if the charger is full).
//!
//! Both produce a [`TaskEvent`].  Request side effects of those events are
//! left to the caller.

pub mod error;
pub mod event;
pub mod executor;
pub mod state;


pub use error::{MobilityError, MobilityResult};
pub use event::{Activity, TaskEvent, TaskPhase};
pub use executor::{MobilityStore, ScheduleExecutor, execute_vehicle};
pub use state::MovementState;
