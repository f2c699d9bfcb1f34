// ABOUTME: Command module aggregator for the atlantis-deploy CLI.
// ABOUTME: Re-exports deploy, preflight, and rollback command handlers.

mod deploy;
mod preflight;
mod rollback;

pub use deploy::deploy;
pub use preflight::preflight;
pub use rollback::rollback;
