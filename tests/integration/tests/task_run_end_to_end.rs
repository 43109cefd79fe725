use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use tokio_stream::StreamExt;

use sheetwright_agent::{CompletionRouter, Orchestrator, Provider, RoutingConfig, RunEvent};
use sheetwright_ai::{
    AiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
};
use sheetwright_table::{CellValue, MemorySheetStore};

struct ScriptedClient {
    responses: AsyncMutex<VecDeque<Result<ChatResponse, String>>>,
    requests: AsyncMutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<ChatResponse, String>>) -> Self {
        Self {
            responses: AsyncMutex::new(VecDeque::from(responses)),
            requests: AsyncMutex::new(Vec::new()),
        }
    }

    async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn requested_tools(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .flat_map(|request| request.tools.iter().map(|tool| tool.name.clone()))
            .collect()
    }

    async fn last_user_prompt(&self) -> String {
        self.requests
            .lock()
            .await
            .last()
            .and_then(|request| {
                request
                    .messages
                    .iter()
                    .rev()
                    .find(|message| message.role == MessageRole::User)
                    .map(Message::text_content)
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        responses
            .pop_front()
            .ok_or_else(|| AiError::InvalidResponse("scripted response queue exhausted".into()))?
            .map_err(AiError::InvalidResponse)
    }
}

fn tool_call_response(name: &str, arguments: Value) -> Result<ChatResponse, String> {
    Ok(ChatResponse {
        message: Message::assistant_blocks(vec![ContentBlock::ToolCall {
            id: format!("call_{name}"),
            name: name.to_string(),
            arguments,
        }]),
        finish_reason: Some("tool_calls".to_string()),
        usage: ChatUsage::default(),
    })
}

fn orchestrator_with(
    client: Arc<ScriptedClient>,
    store: Arc<MemorySheetStore>,
) -> Orchestrator {
    let routing = RoutingConfig::new("gpt-4o").expect("catalog model");
    let router = CompletionRouter::new(routing).with_client(Provider::OpenAi, client);
    Orchestrator::new(Arc::new(router), store)
}

fn cell(text: &str) -> CellValue {
    CellValue::Text(text.to_string())
}

async fn run_to_completion(orchestrator: &Orchestrator, task: &str) -> Vec<RunEvent> {
    orchestrator
        .run(task.to_string(), "Sheet1".to_string())
        .collect()
        .await
}

#[tokio::test]
async fn functional_sum_task_writes_the_result_and_pushes_back_once() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("3")], vec![cell("4")]]));
    let client = Arc::new(ScriptedClient::new(vec![
        tool_call_response(
            "get_instructions",
            json!({
                "types": ["WRITE"],
                "instructions": ["Write the sum of column A into cell B1"]
            }),
        ),
        tool_call_response(
            "write_table",
            json!({ "rows": [0], "columns": [1], "values": ["7"] }),
        ),
    ]));
    let orchestrator = orchestrator_with(client.clone(), store.clone());

    let events = run_to_completion(&orchestrator, "Sum column A and write it next to the first value").await;

    assert_eq!(events.first(), Some(&RunEvent::SnapshotLoaded));
    assert!(events.contains(&RunEvent::Result {
        text: "Finished writing to table".to_string(),
    }));
    assert_eq!(events.last(), Some(&RunEvent::Finished));

    // The write lands in the pushed grid, padded rectangular.
    assert_eq!(store.write_calls(), 1);
    let rows = store.rows();
    assert_eq!(rows[0], vec![cell("3"), cell("7")]);
    assert_eq!(rows[1], vec![cell("4"), CellValue::Empty]);

    // Planner call first, then one write_table call; both prompts
    // embed the serialized table.
    assert_eq!(
        client.requested_tools().await,
        vec!["get_instructions".to_string(), "write_table".to_string()]
    );
    let prompt = client.last_user_prompt().await;
    assert!(prompt.starts_with("Table:\n"));
    assert!(prompt.contains("End Table.\nInstructions:\n"));
}

#[tokio::test]
async fn functional_read_only_task_never_pushes_back() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("a"), cell("b")]]));
    let client = Arc::new(ScriptedClient::new(vec![
        tool_call_response(
            "get_instructions",
            json!({ "types": ["READ"], "instructions": ["Get the value of B1"] }),
        ),
        tool_call_response("read_table", json!({ "rows": [0], "columns": [1] })),
    ]));
    let orchestrator = orchestrator_with(client, store.clone());

    let events = run_to_completion(&orchestrator, "what is in B1?").await;

    assert!(events.contains(&RunEvent::Result {
        text: "The data you requested is:\nb".to_string(),
    }));
    assert_eq!(events.last(), Some(&RunEvent::Finished));
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn regression_instruction_attempts_are_bounded_at_seven() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("3")]]));
    let mut responses = vec![tool_call_response(
        "get_instructions",
        json!({ "types": ["WRITE"], "instructions": ["broken write"] }),
    )];
    // More bad payloads than the bound allows; only seven get used.
    for _ in 0..10 {
        responses.push(tool_call_response(
            "write_table",
            json!({ "rows": [0, 1], "columns": [1], "values": ["7"] }),
        ));
    }
    let client = Arc::new(ScriptedClient::new(responses));
    let orchestrator = orchestrator_with(client.clone(), store.clone());

    let events = run_to_completion(&orchestrator, "do the broken write").await;

    assert!(events
        .iter()
        .any(|event| matches!(event, RunEvent::Abandoned { .. })));
    assert_eq!(events.last(), Some(&RunEvent::Finished));
    // 1 planning call + exactly 7 instruction attempts.
    assert_eq!(client.request_count().await, 8);
    assert_eq!(store.write_calls(), 0);

    // The retry prompt carries the offending payload and the error.
    let prompt = client.last_user_prompt().await;
    assert!(prompt.contains("Your previous response was"));
    assert!(prompt.contains("The error was: Invalid instructions length"));
}

#[tokio::test]
async fn functional_inappropriate_task_is_refused_before_any_tool_call() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("3")]]));
    let client = Arc::new(ScriptedClient::new(vec![tool_call_response(
        "get_instructions",
        json!({ "types": ["INAPPROPRIATE"], "instructions": ["write me a poem"] }),
    )]));
    let orchestrator = orchestrator_with(client.clone(), store.clone());

    let events = run_to_completion(&orchestrator, "write me a poem").await;

    assert!(events.contains(&RunEvent::Result {
        text: "Sorry I can't help with that...".to_string(),
    }));
    assert_eq!(events.last(), Some(&RunEvent::Finished));
    // Only the planning call happened; the sheet is untouched.
    assert_eq!(client.request_count().await, 1);
    assert_eq!(store.write_calls(), 0);
    assert!(store.batch_updates().is_empty());
}

#[tokio::test]
async fn functional_mixed_task_pushes_back_once_for_multiple_writes() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("1"), cell("2")]]));
    let client = Arc::new(ScriptedClient::new(vec![
        tool_call_response(
            "get_instructions",
            json!({
                "types": ["WRITE", "WRITE", "QUESTION"],
                "instructions": ["Set A2 to 3", "Set B2 to 4", "What is a range?"]
            }),
        ),
        tool_call_response(
            "write_table",
            json!({ "rows": [1], "columns": [0], "values": ["3"] }),
        ),
        tool_call_response(
            "write_table",
            json!({ "rows": [1], "columns": [1], "values": ["4"] }),
        ),
        tool_call_response(
            "answer_question",
            json!({ "answer": "A rectangular block of cells." }),
        ),
    ]));
    let orchestrator = orchestrator_with(client, store.clone());

    let events = run_to_completion(&orchestrator, "fill row two and answer my question").await;

    assert_eq!(events.last(), Some(&RunEvent::Finished));
    assert!(events.contains(&RunEvent::Result {
        text: "A rectangular block of cells.".to_string(),
    }));
    // Two writes, one push.
    assert_eq!(store.write_calls(), 1);
    assert_eq!(store.rows()[1], vec![cell("3"), cell("4")]);
}

#[tokio::test]
async fn functional_planner_recovers_from_a_failed_completion() {
    let store = Arc::new(MemorySheetStore::new(vec![vec![cell("x")]]));
    let client = Arc::new(ScriptedClient::new(vec![
        Err("rate limited".to_string()),
        tool_call_response(
            "get_instructions",
            json!({ "types": ["QUESTION"], "instructions": ["What is a formula?"] }),
        ),
        tool_call_response(
            "answer_question",
            json!({ "answer": "An expression starting with '='." }),
        ),
    ]));
    let orchestrator = orchestrator_with(client.clone(), store.clone());

    let events = run_to_completion(&orchestrator, "what is a formula?").await;

    assert!(events.contains(&RunEvent::Result {
        text: "An expression starting with '='.".to_string(),
    }));
    assert_eq!(events.last(), Some(&RunEvent::Finished));
    assert_eq!(client.request_count().await, 3);
}
