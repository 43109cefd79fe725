use tracing::warn;

use sheetwright_instructions::{assemble, tool_for_kind, Instruction, InstructionArgs, InstructionKind};
use sheetwright_table::TableBackend;

use crate::{
    prompt::{instruction_prompt, RepairHints},
    CompletionRouter, MAX_ATTEMPTS,
};

/// Fixed refusal for instructions the planner tagged inappropriate.
pub const REFUSAL: &str = "Sorry I can't help with that...";

#[derive(Debug, Clone, PartialEq)]
/// Enumerates supported `ExecutionOutcome` values. Per-instruction
/// failures are outcomes, not errors; the run always continues.
pub enum ExecutionOutcome {
    Completed {
        kind: InstructionKind,
        result: String,
    },
    Refused,
    Unrecognized {
        kind_tag: String,
    },
    Abandoned {
        attempts: usize,
        last_error: String,
    },
}

impl ExecutionOutcome {
    /// True when the instruction mutated the working table copy and
    /// the run needs a push-back.
    pub fn wrote(&self) -> bool {
        matches!(
            self,
            Self::Completed {
                kind: InstructionKind::Write,
                ..
            }
        )
    }
}

/// Executes one instruction against the backend with a bounded
/// repair loop. Each attempt re-renders the current table state, makes
/// one structured call, assembles and decodes the arguments, then
/// dispatches to the backend.
///
/// Assembly failures feed the raw payload and error back as repair
/// hints; backend failures feed the error only; unexpected completion
/// failures clear both hints.
pub async fn execute(
    router: &CompletionRouter,
    backend: &mut TableBackend,
    instruction: &Instruction,
) -> ExecutionOutcome {
    let Some(kind) = instruction.kind() else {
        warn!(kind_tag = %instruction.kind_tag, "unrecognized instruction type");
        return ExecutionOutcome::Unrecognized {
            kind_tag: instruction.kind_tag.clone(),
        };
    };
    if kind == InstructionKind::Inappropriate {
        return ExecutionOutcome::Refused;
    }
    let Some(tool) = tool_for_kind(kind) else {
        // Only Inappropriate lacks a tool, handled above.
        return ExecutionOutcome::Unrecognized {
            kind_tag: instruction.kind_tag.clone(),
        };
    };

    let mut hints = RepairHints::default();
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=MAX_ATTEMPTS {
        let message = instruction_prompt(&backend.table().to_string(), &instruction.text, &hints);

        let tool_calls = match router.structured_call(tool, &message).await {
            Ok(tool_calls) => tool_calls,
            Err(error) => {
                warn!(attempt, tool = tool.name, %error, "completion attempt failed");
                last_error = error.to_string();
                hints.clear();
                continue;
            }
        };

        let args = match assemble(&tool_calls, tool)
            .and_then(|assembled| InstructionArgs::decode(kind, &assembled))
        {
            Ok(args) => args,
            Err(error) => {
                warn!(attempt, tool = tool.name, %error, "assembly attempt failed");
                hints.response = error.raw_payload().map(str::to_string);
                hints.error = Some(error.to_string());
                last_error = error.to_string();
                continue;
            }
        };

        match backend.apply(&args).await {
            Ok(result) => return ExecutionOutcome::Completed { kind, result },
            Err(error) => {
                warn!(attempt, tool = tool.name, %error, "backend attempt failed");
                hints.response = None;
                hints.error = Some(error.to_string());
                last_error = error.to_string();
            }
        }
    }

    warn!(kind = kind.tag(), "abandoning instruction after retry bound");
    ExecutionOutcome::Abandoned {
        attempts: MAX_ATTEMPTS,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use sheetwright_instructions::{Instruction, InstructionKind};
    use sheetwright_table::{CellValue, MemorySheetStore, TableBackend};

    use super::{execute, ExecutionOutcome};
    use crate::testing::{router_with_script, tool_call, ScriptedTurn};

    fn backend_with(rows: Vec<Vec<CellValue>>) -> (Arc<MemorySheetStore>, TableBackend) {
        let store = Arc::new(MemorySheetStore::new(rows));
        (store.clone(), TableBackend::new(store, "Sheet1"))
    }

    fn cell(text: &str) -> CellValue {
        CellValue::Text(text.to_string())
    }

    #[tokio::test]
    async fn functional_write_instruction_mutates_the_table() {
        let (_, mut backend) = backend_with(vec![vec![cell("3")], vec![cell("4")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![ScriptedTurn::calls(vec![tool_call(
            "write_table",
            json!({ "rows": [0], "columns": [1], "values": ["7"] }),
        )])]);

        let outcome = execute(
            &router,
            &mut backend,
            &Instruction::new("WRITE", "Sum column A into B1"),
        )
        .await;

        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                kind: InstructionKind::Write,
                result: "Finished writing to table".to_string(),
            }
        );
        assert!(outcome.wrote());
        assert_eq!(backend.table().get(0, 1), Some(&cell("7")));
    }

    #[tokio::test]
    async fn functional_assembly_failure_feeds_repair_hints_to_the_next_attempt() {
        let (_, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![
            ScriptedTurn::calls(vec![tool_call(
                "write_table",
                json!({ "rows": [0, 1], "columns": [1], "values": ["7"] }),
            )]),
            ScriptedTurn::calls(vec![tool_call(
                "write_table",
                json!({ "rows": [0], "columns": [1], "values": ["7"] }),
            )]),
        ]);

        let outcome = execute(&router, &mut backend, &Instruction::new("WRITE", "write")).await;
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));

        let prompts = router.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Your previous response was"));
        assert!(prompts[1].contains("The error was: Invalid instructions length"));
    }

    #[tokio::test]
    async fn functional_backend_failure_records_the_error_without_a_response_hint() {
        let (store, mut backend) = backend_with(vec![vec![cell("a"), cell("b")]]);
        backend.load().await.unwrap();
        store.fail_batch_updates(1);
        let chart_turn = || {
            ScriptedTurn::calls(vec![tool_call(
                "create_chart",
                json!({ "arguments": ["Revenue", "LINE", "BOTTOM_LEGEND", "[]", "[]", "[]", "{}"] }),
            )])
        };
        let router = router_with_script(vec![chart_turn(), chart_turn()]);

        let outcome = execute(&router, &mut backend, &Instruction::new("CHART", "chart it")).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                kind: InstructionKind::Chart,
                result: "Created chart".to_string(),
            }
        );
        assert!(!outcome.wrote());
        assert_eq!(store.batch_updates().len(), 1);

        let prompts = router.recorded_prompts();
        assert!(!prompts[1].contains("Your previous response was"));
        assert!(prompts[1].contains("The error was: "));
        assert!(prompts[1].contains("injected batch update failure"));
    }

    #[tokio::test]
    async fn functional_read_result_renders_the_requested_values() {
        let (_, mut backend) = backend_with(vec![vec![cell("a"), cell("b")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![ScriptedTurn::calls(vec![tool_call(
            "read_table",
            json!({ "rows": [0, 0], "columns": [1, 0] }),
        )])]);

        let outcome = execute(&router, &mut backend, &Instruction::new("READ", "read")).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                kind: InstructionKind::Read,
                result: "b, a".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unit_completion_failure_clears_hints_and_retries() {
        let (_, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![
            ScriptedTurn::calls(vec![tool_call(
                "write_table",
                json!({ "rows": [0, 1], "columns": [1], "values": ["7"] }),
            )]),
            ScriptedTurn::failure("connection reset"),
            ScriptedTurn::calls(vec![tool_call(
                "write_table",
                json!({ "rows": [0], "columns": [0], "values": ["7"] }),
            )]),
        ]);

        let outcome = execute(&router, &mut backend, &Instruction::new("WRITE", "write")).await;
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));

        let prompts = router.recorded_prompts();
        assert_eq!(prompts.len(), 3);
        // Hints from the first failure are dropped after the transport error.
        assert!(!prompts[2].contains("The error was"));
    }

    #[tokio::test]
    async fn regression_exactly_seven_attempts_then_abandon() {
        let (store, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let bad_turn = || {
            ScriptedTurn::calls(vec![tool_call(
                "write_table",
                json!({ "rows": [0, 1], "columns": [1], "values": ["7"] }),
            )])
        };
        let router = router_with_script((0..10).map(|_| bad_turn()).collect());

        let outcome = execute(&router, &mut backend, &Instruction::new("WRITE", "write")).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Abandoned { attempts: 7, .. }
        ));
        assert_eq!(router.recorded_prompts().len(), 7);
        assert_eq!(store.write_calls(), 0);
    }

    #[tokio::test]
    async fn functional_inappropriate_never_reaches_a_completion_call() {
        let (store, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![]);

        let outcome = execute(
            &router,
            &mut backend,
            &Instruction::new("INAPPROPRIATE", "write a poem"),
        )
        .await;
        assert_eq!(outcome, ExecutionOutcome::Refused);
        assert!(router.recorded_prompts().is_empty());
        assert_eq!(store.write_calls(), 0);
        assert!(store.batch_updates().is_empty());
    }

    #[tokio::test]
    async fn unit_unrecognized_tag_short_circuits_without_calls() {
        let (_, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![]);

        let outcome = execute(
            &router,
            &mut backend,
            &Instruction::new("DELETE", "drop everything"),
        )
        .await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Unrecognized {
                kind_tag: "DELETE".to_string(),
            }
        );
        assert!(router.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn functional_question_returns_the_answer_text() {
        let (_, mut backend) = backend_with(vec![vec![cell("3")]]);
        backend.load().await.unwrap();
        let router = router_with_script(vec![ScriptedTurn::calls(vec![tool_call(
            "answer_question",
            json!({ "answer": "Use SUM(A1:A10)." }),
        )])]);

        let outcome = execute(
            &router,
            &mut backend,
            &Instruction::new("QUESTION", "how do I sum a column?"),
        )
        .await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                kind: InstructionKind::Question,
                result: "Use SUM(A1:A10).".to_string(),
            }
        );
    }
}
