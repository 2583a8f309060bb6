//! Assignment swaps between two responders
//!
//! - [`command`] - Parsing the `/온콜바꿔 A B` command text
//! - [`coordinator`] - Two-step swap with compensation

pub mod command;
pub mod coordinator;

pub use command::{CommandError, SwapCommand, USAGE};
pub use coordinator::{SwapCoordinator, SwapError, SwapOutcome, SwapResult, SwapStep};
