use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use sheetwright_instructions::{Instruction, InstructionKind};
use sheetwright_table::{SheetStore, TableBackend};

use crate::{execute, plan, CompletionRouter, ExecutionOutcome, REFUSAL};

#[derive(Debug, Clone, PartialEq)]
/// Enumerates supported `RunEvent` values, streamed in order while a
/// task runs.
pub enum RunEvent {
    SnapshotLoaded,
    Plan { summary: String },
    Executing { instruction: Instruction },
    Result { text: String },
    Abandoned { instruction: Instruction, last_error: String },
    Finished,
    Failed { error: String },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SnapshotLoaded => write!(f, "Read in data..."),
            Self::Plan { summary } => write!(f, "Formulated instructions:\n{summary}"),
            Self::Executing { instruction } => write!(f, "Executing...\n{}", instruction.text),
            Self::Result { text } => write!(f, "{text}"),
            Self::Abandoned { instruction, last_error } => write!(
                f,
                "Could not complete: {}\nLast error: {last_error}",
                instruction.text
            ),
            Self::Finished => write!(f, "Done."),
            Self::Failed { error } => write!(f, "Task failed: {error}"),
        }
    }
}

/// Runs tasks end to end: snapshot the sheet, plan, execute each
/// instruction sequentially, then push the table back when a write
/// landed. Progress streams as `RunEvent`s.
pub struct Orchestrator {
    router: Arc<CompletionRouter>,
    store: Arc<dyn SheetStore>,
}

impl Orchestrator {
    pub fn new(router: Arc<CompletionRouter>, store: Arc<dyn SheetStore>) -> Self {
        Self { router, store }
    }

    /// Starts one run and returns its event stream. Dropping the
    /// stream cancels the run at the next event boundary.
    pub fn run(&self, task: String, range: String) -> ReceiverStream<RunEvent> {
        let (events, stream) = mpsc::channel(16);
        let router = self.router.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            run_task(router, store, task, range, events).await;
        });

        ReceiverStream::new(stream)
    }
}

async fn run_task(
    router: Arc<CompletionRouter>,
    store: Arc<dyn SheetStore>,
    task: String,
    range: String,
    events: mpsc::Sender<RunEvent>,
) {
    let mut backend = TableBackend::new(store, &range);
    // Snapshot failure is the only error that aborts the whole run.
    if let Err(err) = backend.load().await {
        error!(%err, "failed to load table snapshot");
        let _ = events.send(RunEvent::Failed { error: err.to_string() }).await;
        return;
    }
    if events.send(RunEvent::SnapshotLoaded).await.is_err() {
        return;
    }

    let instructions = match plan(&router, &task, backend.table()).await {
        Ok(instructions) => instructions,
        Err(err) => {
            error!(%err, "planning failed");
            let _ = events.send(RunEvent::Failed { error: err.to_string() }).await;
            return;
        }
    };
    info!(count = instructions.len(), "formulated instructions");
    let summary = instructions
        .iter()
        .map(|instruction| instruction.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if events.send(RunEvent::Plan { summary }).await.is_err() {
        return;
    }

    let mut need_push = false;
    for instruction in instructions {
        let executing = RunEvent::Executing {
            instruction: instruction.clone(),
        };
        if events.send(executing).await.is_err() {
            return;
        }

        let outcome = execute(&router, &mut backend, &instruction).await;
        need_push |= outcome.wrote();
        let event = match outcome {
            ExecutionOutcome::Completed { kind, result } => Some(RunEvent::Result {
                text: render_result(kind, result),
            }),
            ExecutionOutcome::Refused => Some(RunEvent::Result {
                text: REFUSAL.to_string(),
            }),
            ExecutionOutcome::Unrecognized { .. } => None,
            ExecutionOutcome::Abandoned { last_error, .. } => Some(RunEvent::Abandoned {
                instruction,
                last_error,
            }),
        };
        if let Some(event) = event {
            if events.send(event).await.is_err() {
                return;
            }
        }
    }

    if need_push {
        if let Err(err) = backend.push_back().await {
            error!(%err, "failed to push table back");
            let _ = events.send(RunEvent::Failed { error: err.to_string() }).await;
            return;
        }
    }
    let _ = events.send(RunEvent::Finished).await;
}

fn render_result(kind: InstructionKind, result: String) -> String {
    match kind {
        InstructionKind::Read => format!("The data you requested is:\n{result}"),
        _ => result,
    }
}
