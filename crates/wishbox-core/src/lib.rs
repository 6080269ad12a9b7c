//! `wishbox-core`: configuration, errors and the time rules every other
//! crate shares (the canonical clock, the birthday calendar and the
//! visibility evaluator that gates time capsules and locked cards).

pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod token;
pub mod visibility;

pub use calendar::LeapDayPolicy;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, WishboxError};
pub use visibility::{is_hidden, Visibility};
