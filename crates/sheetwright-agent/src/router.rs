use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use sheetwright_ai::{ChatRequest, LlmClient, Message, ToolCall, ToolChoice};
use sheetwright_instructions::{tool_for_name, InstructionTool};

use crate::{AgentError, RoutingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates supported `Provider` values.
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

/// One catalog entry: public model name, its provider, and the wire
/// model id sent to that provider.
struct CatalogEntry {
    name: &'static str,
    provider: Provider,
    wire_id: &'static str,
}

const MODEL_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "gpt-4o",
        provider: Provider::OpenAi,
        wire_id: "gpt-4o",
    },
    CatalogEntry {
        name: "gpt-4-turbo",
        provider: Provider::OpenAi,
        wire_id: "gpt-4-turbo",
    },
    CatalogEntry {
        name: "gpt-4",
        provider: Provider::OpenAi,
        wire_id: "gpt-4",
    },
    CatalogEntry {
        name: "gpt-3.5",
        provider: Provider::OpenAi,
        wire_id: "gpt-3.5-turbo",
    },
    CatalogEntry {
        name: "claude-3.5",
        provider: Provider::Anthropic,
        wire_id: "claude-3-5-sonnet-20240620",
    },
];

fn catalog_entry(model: &str) -> Option<&'static CatalogEntry> {
    MODEL_CATALOG.iter().find(|entry| entry.name == model)
}

#[derive(Debug, Clone)]
/// Which catalog model serves each tool. Tool and model names are
/// validated at mutation time, so resolution never fails.
pub struct RoutingConfig {
    default_model: String,
    tool_models: HashMap<String, String>,
}

impl RoutingConfig {
    /// Builds a config with a catalog-validated default model.
    pub fn new(default_model: &str) -> Result<Self, RoutingError> {
        if catalog_entry(default_model).is_none() {
            return Err(RoutingError::UnknownModel(default_model.to_string()));
        }
        Ok(Self {
            default_model: default_model.to_string(),
            tool_models: HashMap::new(),
        })
    }

    /// Routes one tool to a specific catalog model. Both names are
    /// checked; bad input is a diagnostic, not a panic.
    pub fn set_model(&mut self, tool: &str, model: &str) -> Result<(), RoutingError> {
        if tool_for_name(tool).is_none() {
            return Err(RoutingError::UnknownTool(tool.to_string()));
        }
        if catalog_entry(model).is_none() {
            return Err(RoutingError::UnknownModel(model.to_string()));
        }
        self.tool_models.insert(tool.to_string(), model.to_string());
        Ok(())
    }

    pub fn model_for(&self, tool: &str) -> &str {
        self.tool_models
            .get(tool)
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

/// Resolves a tool name to a provider client plus wire model id and
/// makes forced-tool structured calls through it.
pub struct CompletionRouter {
    clients: HashMap<Provider, Arc<dyn LlmClient>>,
    routing: RoutingConfig,
}

impl CompletionRouter {
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            clients: HashMap::new(),
            routing,
        }
    }

    pub fn with_client(mut self, provider: Provider, client: Arc<dyn LlmClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    fn resolve(&self, tool: &str) -> Result<(&Arc<dyn LlmClient>, &'static str), AgentError> {
        let model = self.routing.model_for(tool);
        let entry = catalog_entry(model)
            .ok_or_else(|| RoutingError::UnknownModel(model.to_string()))?;
        let client = self
            .clients
            .get(&entry.provider)
            .ok_or(RoutingError::MissingProvider(entry.provider.name()))?;
        Ok((client, entry.wire_id))
    }

    /// One forced-tool completion: the tool's system prompt, the user
    /// message, and `tool_choice: required` for exactly this tool.
    /// Returns the raw tool calls for the assembler.
    pub async fn structured_call(
        &self,
        tool: &InstructionTool,
        user_message: &str,
    ) -> Result<Vec<ToolCall>, AgentError> {
        let (client, wire_id) = self.resolve(tool.name)?;
        debug!(tool = tool.name, model = wire_id, "structured call");

        let request = ChatRequest {
            model: wire_id.to_string(),
            messages: vec![Message::system(tool.system_prompt), Message::user(user_message)],
            tools: vec![tool.definition()],
            tool_choice: Some(ToolChoice::Required),
            max_tokens: None,
            temperature: None,
        };
        let response = client.complete(request).await?;
        Ok(response.message.tool_calls())
    }
}
