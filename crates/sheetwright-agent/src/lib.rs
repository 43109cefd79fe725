//! Planning, retrying execution, model routing, and the streaming
//! run orchestrator.
mod error;
mod executor;
mod orchestrator;
mod planner;
mod prompt;
mod router;
#[cfg(test)]
mod testing;

pub use error::{AgentError, RoutingError};
pub use executor::{execute, ExecutionOutcome, REFUSAL};
pub use orchestrator::{Orchestrator, RunEvent};
pub use planner::plan;
pub use router::{CompletionRouter, Provider, RoutingConfig};

/// Retry bound shared by the planner and the per-instruction executor.
pub const MAX_ATTEMPTS: usize = 7;
