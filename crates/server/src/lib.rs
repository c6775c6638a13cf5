//! Trigger surfaces for reminder dispatch: HTTP endpoints, the periodic
//! timer, and the wiring that builds a dispatcher from configuration.

pub mod api;
pub mod cli;
pub mod router;
pub mod startup;
pub mod state;
pub mod ticker;

pub use router::build_router;
pub use state::{AppState, TriggerSource};
