use tracing::warn;

use sheetwright_instructions::{assemble, decode_plan, tool_for_name, Instruction, GET_INSTRUCTIONS};
use sheetwright_table::Table;

use crate::{
    prompt::{instruction_prompt, RepairHints},
    AgentError, CompletionRouter, MAX_ATTEMPTS,
};

/// Plans a task into typed instructions with one structured call per
/// attempt, feeding assembly failures back as repair hints. Gives up
/// after the attempt bound.
pub async fn plan(
    router: &CompletionRouter,
    task: &str,
    table: &Table,
) -> Result<Vec<Instruction>, AgentError> {
    let tool = tool_for_name(GET_INSTRUCTIONS)
        .unwrap_or_else(|| unreachable!("planner meta-tool is always registered"));
    let table_text = table.to_string();
    let mut hints = RepairHints::default();
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=MAX_ATTEMPTS {
        let message = instruction_prompt(&table_text, task, &hints);
        let tool_calls = match router.structured_call(tool, &message).await {
            Ok(tool_calls) => tool_calls,
            Err(error) => {
                warn!(attempt, %error, "planning call failed");
                last_error = error.to_string();
                continue;
            }
        };

        match assemble(&tool_calls, tool).and_then(|assembled| decode_plan(&assembled)) {
            Ok(instructions) => return Ok(instructions),
            Err(error) => {
                warn!(attempt, %error, "planning attempt failed");
                hints.response = error.raw_payload().map(str::to_string);
                hints.error = Some(error.to_string());
                last_error = error.to_string();
            }
        }
    }

    Err(AgentError::PlanExhausted {
        attempts: MAX_ATTEMPTS,
        last_error,
    })
}
