//! Delayed work under a virtual clock.

pub mod scheduler;

pub use scheduler::{ScheduledTask, Scheduler, TaskKind};
