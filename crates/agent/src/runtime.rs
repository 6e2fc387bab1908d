use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use telassist_core::{ConversationError, SessionKey, TurnRole};

use crate::llm::{ChatMessage, ChatModel, ModelTurn};
use crate::memory::SessionMemory;
use crate::tools::{extract_text_argument, ToolRegistry};

/// Most tool round-trips allowed before a turn is declared stuck.
pub const MAX_TOOL_ITERATIONS: usize = 6;

/// Prior turns surfaced back to the model per request.
pub const RECALL_LIMIT: usize = 3;

pub const SYSTEM_PROMPT: &str = "\
You are a telecom customer service agent with hybrid retrieval and conversation memory.

TOOLS:
- search_faq: Policy, process, how-to, troubleshooting questions
- query_customers: SQL queries for statistics, pricing, counts (table: customers)
- get_stats: Quick overview of customer base

ROUTING:
- \"How do I...\" / \"What is...\" / \"Can I...\" -> search_faq
- \"How many...\" / \"Average...\" / \"Count...\" / numbers -> query_customers
- \"Overview\" / \"Summary\" -> get_stats

SQL TABLE: customers
COLUMNS: customer_id, gender, senior_citizen(0/1), partner, dependents, tenure,
phone_service, multiple_lines, internet_service(DSL/Fiber optic/No),
online_security, online_backup, device_protection, tech_support,
streaming_tv, streaming_movies, contract(Month-to-month/One year/Two year),
paperless_billing, payment_method, monthly_charges, total_charges, churn(Yes/No)

Remember conversation context. Be concise and accurate.";

/// One inbound turn. Missing actor or thread identifiers fall back to
/// the default session key.
#[derive(Clone, Debug, Deserialize)]
pub struct TurnRequest {
    pub prompt: String,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl TurnRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), actor_id: None, thread_id: None }
    }

    pub fn for_session(
        prompt: impl Into<String>,
        actor_id: impl Into<String>,
        thread_id: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            actor_id: Some(actor_id.into()),
            thread_id: Some(thread_id.into()),
        }
    }

    fn session_key(&self) -> SessionKey {
        let defaults = SessionKey::default();
        SessionKey::new(
            self.actor_id.clone().unwrap_or(defaults.actor_id),
            self.thread_id.clone().unwrap_or(defaults.thread_id),
        )
    }
}

/// The turn envelope handed back to callers. Exactly one of `result`
/// and `error` is meaningful; the session identifiers echo what the
/// turn actually ran under.
#[derive(Clone, Debug, Serialize)]
pub struct TurnResponse {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub actor_id: String,
    pub thread_id: String,
}

impl TurnResponse {
    fn ok(result: String, key: &SessionKey) -> Self {
        Self {
            result,
            error: None,
            actor_id: key.actor_id.clone(),
            thread_id: key.thread_id.clone(),
        }
    }

    fn failed(message: String, key: &SessionKey) -> Self {
        Self {
            result: String::new(),
            error: Some(message),
            actor_id: key.actor_id.clone(),
            thread_id: key.thread_id.clone(),
        }
    }
}

/// Drives the reason-act loop: sends the transcript to the model,
/// executes whichever tools it picks, and feeds results back until the
/// model produces a final answer.
pub struct AgentRuntime {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    memory: Arc<dyn SessionMemory>,
    transcripts: RwLock<HashMap<SessionKey, Vec<ChatMessage>>>,
}

impl AgentRuntime {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        memory: Arc<dyn SessionMemory>,
    ) -> Self {
        Self { model, tools, memory, transcripts: RwLock::new(HashMap::new()) }
    }

    /// Handles one user turn end to end. Infrastructure failures come
    /// back inside the response envelope rather than as an Err so every
    /// request gets an answer shaped the same way.
    pub async fn handle_turn(&self, request: TurnRequest) -> TurnResponse {
        let key = request.session_key();
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return TurnResponse::failed(
                ConversationError::EmptyPrompt.to_string(),
                &key,
            );
        }

        // Recall runs before the current prompt lands in memory so the
        // note never just echoes the question back.
        let note = self.recall_note(&key, prompt).await;

        // Memory writes are advisory. A failed record degrades recall
        // for later turns but never fails this one.
        if let Err(error) = self.memory.record(&key, TurnRole::Human, prompt).await {
            warn!(%error, actor_id = %key.actor_id, "failed to record human turn");
        }

        match self.run_loop(&key, prompt, note).await {
            Ok(answer) => {
                if let Err(error) = self.memory.record(&key, TurnRole::Agent, &answer).await {
                    warn!(%error, actor_id = %key.actor_id, "failed to record agent turn");
                }
                TurnResponse::ok(answer, &key)
            }
            Err(error) => TurnResponse::failed(error.to_string(), &key),
        }
    }

    async fn run_loop(
        &self,
        key: &SessionKey,
        prompt: &str,
        recall_note: Option<String>,
    ) -> Result<String, ConversationError> {
        let specs = self.tools.specs();

        let mut messages = {
            let transcripts = self.transcripts.read().await;
            transcripts.get(key).cloned().unwrap_or_default()
        };
        if messages.is_empty() {
            messages.push(ChatMessage::system(SYSTEM_PROMPT));
        }
        // The note is advisory context for this turn only; it is
        // dropped before the transcript is saved so notes never
        // accumulate across turns.
        let note_index = recall_note.map(|note| {
            messages.push(ChatMessage::system(note));
            messages.len() - 1
        });
        messages.push(ChatMessage::user(prompt));

        for _ in 0..MAX_TOOL_ITERATIONS {
            let turn = self
                .model
                .complete(&messages, &specs)
                .await
                .map_err(|e| ConversationError::Model(e.to_string()))?;

            match turn {
                ModelTurn::Final(answer) => {
                    messages.push(ChatMessage::assistant(answer.clone()));
                    if let Some(index) = note_index {
                        messages.remove(index);
                    }
                    let mut transcripts = self.transcripts.write().await;
                    transcripts.insert(key.clone(), messages);
                    return Ok(answer);
                }
                ModelTurn::ToolCalls(calls) => {
                    messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
                    for call in calls {
                        let output = self.dispatch(&call.function.name, &call.function.arguments).await;
                        messages.push(ChatMessage::tool_result(call.id, output));
                    }
                }
            }
        }

        Err(ConversationError::LoopExhausted(MAX_TOOL_ITERATIONS))
    }

    async fn dispatch(&self, name: &str, arguments: &str) -> String {
        match self.tools.get(name) {
            Some(tool) => {
                let input = extract_text_argument(arguments);
                debug!(tool = name, "executing tool call");
                tool.call(&input).await
            }
            None => {
                warn!(tool = name, "model requested a tool that is not registered");
                format!("Unknown tool: {name}")
            }
        }
    }

    /// Best-effort recall of earlier turns, rendered as a system note.
    /// Failures are logged and the turn proceeds without context.
    async fn recall_note(&self, key: &SessionKey, prompt: &str) -> Option<String> {
        match self.memory.recall(key, prompt, RECALL_LIMIT).await {
            Ok(records) if records.is_empty() => None,
            Ok(records) => {
                let lines: Vec<String> = records
                    .iter()
                    .map(|record| format!("[{}] {}", record.role.as_str(), record.text))
                    .collect();
                Some(format!(
                    "Relevant earlier conversation:\n{}",
                    lines.join("\n")
                ))
            }
            Err(error) => {
                warn!(%error, actor_id = %key.actor_id, "memory recall failed");
                None
            }
        }
    }
}
