//! Clip scheduling and handoff

pub mod mailbox;
pub mod notifier;
pub mod scheduler;

pub use mailbox::Mailbox;
pub use notifier::Notifier;
pub use scheduler::{Scheduler, SchedulerConfig, Showing};
