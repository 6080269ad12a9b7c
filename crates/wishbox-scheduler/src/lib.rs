//! `wishbox-scheduler`: recurring background jobs and the due-wish sweeper.
//!
//! # Overview
//!
//! [`engine::SchedulerEngine`] is an injectable scheduling service: jobs are
//! registered once per id, each gets its own Tokio loop, and every tick hands
//! the job an explicit [`types::JobContext`] carrying the instant it should
//! treat as "now".
//!
//! [`sweeper::DueWishSweeper`] is the job that marks scheduled wishes as sent.
//! It talks to storage only through the [`sweeper::DueWishStore`] port, so the
//! commit semantics (one transaction, `sent_at IS NULL` guard) live with the
//! store that owns the `wishes` table.
//!
//! | Guarantee        | Where it comes from                                  |
//! |------------------|------------------------------------------------------|
//! | one timer per id | `register` rejects a second registration             |
//! | no overlap       | a tick's job runs to completion before the next tick |
//! | at-least-once    | failed commits leave rows eligible for the next tick |
//! | exactly-once set | the store re-checks `sent_at IS NULL` per row        |

pub mod engine;
pub mod error;
pub mod sweeper;
pub mod types;

pub use engine::{Job, SchedulerEngine};
pub use error::{Result, SchedulerError};
pub use sweeper::{DueWishStore, DueWishSweeper};
pub use types::{DueWish, JobContext, SentWish, SweepReport};
