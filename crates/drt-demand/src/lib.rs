//! `drt-demand`: trip requests and their lifecycle.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`request`]  | `Request`, `PickupWindow`, `RequestStatus`, `CancelReason`  |
//! | [`registry`] | `RequestRegistry`, `RequestEntry`                           |
//! | [`loader`]   | `load_requests_csv`, `load_requests_reader`                 |
//! | [`random`]   | `RandomDemand` seeded generator                             |
//! | [`error`]    | `DemandError`, `DemandResult<T>`                            |
//!
//! # Lifecycle
//!
//! ```text
//! submit ──► Unplanned ──► Planned ──► Performed
//!                │            │
//!                └────────────┴──► Cancelled(reason)
//! ```
//!
//! Performed and cancelled requests move to an archive and stay queryable.

pub mod error;
pub mod loader;
pub mod random;
pub mod registry;
pub mod request;

#[cfg(test)]
mod tests;

pub use error::{DemandError, DemandResult};
pub use loader::{load_requests_csv, load_requests_reader};
pub use random::{RandomDemand, RandomDemandConfig};
pub use registry::{RequestEntry, RequestRegistry};
pub use request::{CancelReason, PickupWindow, Request, RequestStatus};
