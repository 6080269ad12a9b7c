//! `wishbox-gateway`: the HTTP API and process wiring.
//!
//! The binary in `main.rs` is a thin CLI over [`startup`]; everything a test
//! needs to drive the router lives here.

pub mod app;
pub mod auth;
pub mod delivery;
pub mod error;
pub mod http;
pub mod seed;
pub mod startup;

/// Short git commit the binary was built from.
pub const GIT_SHA: &str = env!("WISHBOX_GIT_SHA");
