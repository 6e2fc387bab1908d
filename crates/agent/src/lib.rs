//! Conversational runtime for the telecom support assistant.
//!
//! The model decides, the runtime executes: [`AgentRuntime`] ships the
//! session transcript plus tool schemas to a [`ChatModel`], runs the
//! tool calls it returns through the [`ToolRegistry`], and loops until
//! the model settles on a final answer. [`SessionMemory`] carries
//! context across turns, keyed per actor and thread.

pub mod llm;
pub mod memory;
pub mod runtime;
pub mod tools;

pub use llm::{
    ChatMessage, ChatModel, FunctionCall, HostedChatModel, ModelTurn, ToolCall, ToolSpec,
};
pub use memory::{InMemorySessionMemory, MemoryError, SessionMemory};
pub use runtime::{AgentRuntime, TurnRequest, TurnResponse, MAX_TOOL_ITERATIONS, SYSTEM_PROMPT};
pub use tools::{
    extract_text_argument, CustomerQueryTool, FaqSearchTool, StatsTool, Tool, ToolRegistry,
};
