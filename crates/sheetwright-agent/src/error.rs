use thiserror::Error;

use sheetwright_ai::AiError;
use sheetwright_instructions::AssembleError;
use sheetwright_table::TableError;

#[derive(Debug, Error)]
/// Enumerates supported `AgentError` values.
pub enum AgentError {
    #[error("completion failed: {0}")]
    Completion(#[from] AiError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("no usable plan after {attempts} attempts: {last_error}")]
    PlanExhausted { attempts: usize, last_error: String },
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Enumerates supported `RoutingError` values.
pub enum RoutingError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("no client configured for provider {0}")]
    MissingProvider(&'static str),
}
