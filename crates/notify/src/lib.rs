//! Reminder notification engine.
//!
//! This crate provides:
//! - `Transport` trait for pluggable push delivery
//! - Webhook and log transport implementations
//! - Minijinja template rendering for reminder title and body
//! - `Dispatcher`, which matches due tasks, sends one reminder each and
//!   retires them from the task store

pub mod builder;
pub mod dispatcher;
pub mod log_transport;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use builder::ReminderBuilder;
pub use dispatcher::{DispatchError, Dispatcher, FailureStage, PassSummary, TaskFailure};
pub use log_transport::LogTransport;
pub use traits::{NotifyError, ReminderData, ReminderMessage, Transport};
pub use webhook::WebhookTransport;
