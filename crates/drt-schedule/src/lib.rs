//! `drt-schedule`: vehicle tasks and their gap-free schedule.
//!
//! # Crate layout
//!
//! | Module       | Contents                                             |
//! |--------------|------------------------------------------------------|
//! | [`task`]     | `Task`, `TaskKind`, `TaskStatus`                     |
//! | [`schedule`] | `Schedule` (ordered, contiguous task list)           |
//! | [`error`]    | `ScheduleError`, `ScheduleResult<T>`                 |
//!
//! # Schedule model (summary)
//!
//! A vehicle's schedule covers its whole operating horizon with no gaps:
//!
//! ```text
//! [Stay 06:00–07:12][Drive 07:12–07:20][Pickup 07:20–07:22] … [Stay …–22:00]
//! ```
//!
//! New work is always carved out of a `Planned` Stay, so insertion never
//! shifts tasks that have already been committed.

pub mod error;
pub mod schedule;
pub mod task;


pub use error::{ScheduleError, ScheduleResult};
pub use schedule::Schedule;
pub use task::{Task, TaskKind, TaskStatus};
