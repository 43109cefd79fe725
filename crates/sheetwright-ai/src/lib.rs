//! Structured-completion provider clients for Sheetwright.
//!
//! Two wire shapes are supported behind one `LlmClient` trait: the
//! OpenAI chat-completions API and the Anthropic messages API. Both
//! normalize to a `ChatResponse` whose assistant message carries zero
//! or more tool-call blocks.
mod anthropic;
mod openai;
mod retry;
mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{
    AiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
    ToolCall, ToolChoice, ToolDefinition,
};
