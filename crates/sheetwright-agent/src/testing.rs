//! Scripted completion client shared by the agent tests.
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use sheetwright_ai::{
    AiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
    ToolCall,
};

use crate::{CompletionRouter, Provider, RoutingConfig};

pub(crate) struct ScriptedTurn {
    result: Result<Vec<ToolCall>, String>,
}

impl ScriptedTurn {
    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            result: Ok(tool_calls),
        }
    }

    /// A transport-level failure for this turn.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

pub(crate) fn tool_call(name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments,
    }
}

#[derive(Default)]
struct ScriptState {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    prompts: Mutex<Vec<String>>,
}

struct ScriptedClient {
    state: Arc<ScriptState>,
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::User)
            .map(Message::text_content)
            .unwrap_or_default();
        self.state.prompts.lock().unwrap().push(prompt);

        let turn = self
            .state
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AiError::InvalidResponse("script exhausted".to_string()))?;

        match turn.result {
            Ok(tool_calls) => Ok(ChatResponse {
                message: Message::assistant_blocks(
                    tool_calls.into_iter().map(ContentBlock::tool_call).collect(),
                ),
                finish_reason: Some("tool_calls".to_string()),
                usage: ChatUsage::default(),
            }),
            Err(message) => Err(AiError::InvalidResponse(message)),
        }
    }
}

/// A `CompletionRouter` over a scripted client, recording every user
/// prompt so tests can inspect repair hints.
pub(crate) struct ScriptRouter {
    router: Arc<CompletionRouter>,
    state: Arc<ScriptState>,
}

impl ScriptRouter {
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }

    pub fn shared(&self) -> Arc<CompletionRouter> {
        self.router.clone()
    }
}

impl Deref for ScriptRouter {
    type Target = CompletionRouter;

    fn deref(&self) -> &CompletionRouter {
        &self.router
    }
}

pub(crate) fn router_with_script(turns: Vec<ScriptedTurn>) -> ScriptRouter {
    let state = Arc::new(ScriptState {
        turns: Mutex::new(turns.into()),
        prompts: Mutex::new(Vec::new()),
    });
    let routing = RoutingConfig::new("gpt-4o").expect("catalog model");
    let router = CompletionRouter::new(routing).with_client(
        Provider::OpenAi,
        Arc::new(ScriptedClient {
            state: state.clone(),
        }),
    );
    ScriptRouter {
        router: Arc::new(router),
        state,
    }
}
