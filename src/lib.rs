// ABOUTME: Library root for atlantis-deploy - exposes the orchestrator, health gate and seams for testing.
// ABOUTME: The main binary is in main.rs.

pub mod clock;
pub mod cloud;
pub mod config;
pub mod control_plane;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod lambda;
pub mod notify;
pub mod output;
pub mod poll;
pub mod types;
