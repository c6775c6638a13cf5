pub mod clock;
pub mod config;
pub mod error;
pub mod instant;
pub mod task;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::*;
pub use instant::{canonical, normalize, InstantError};
pub use task::{RawInstant, Task, Timestamp, DEFAULT_PRIORITY};
pub use window::{DueWindow, WindowVerdict, DEFAULT_DUE_WINDOW_SECS, MAX_DUE_WINDOW_SECS};
