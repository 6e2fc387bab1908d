use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use telassist_db::DbPool;
use telassist_index::SharedIndex;

use crate::llm::ToolSpec;

/// A tool the reasoning engine may route a turn through. Tools take
/// and return plain text and never let an error escape the boundary;
/// failures come back as descriptive text the engine can react to.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> String;

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "Tool input text" }
            },
            "required": ["input"]
        })
    }

    async fn call(&self, input: &str) -> String;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// The routing contracts handed to the reasoning engine, ordered
    /// by name so prompts stay stable across runs.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description(),
                parameters: tool.parameters(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Pulls the text argument out of a tool-call `arguments` payload.
/// Models name the field inconsistently, so accept the common names,
/// then any string value, then the raw payload.
pub fn extract_text_argument(arguments: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(arguments) {
        Ok(value) => value,
        Err(_) => return arguments.to_string(),
    };

    if let Some(object) = parsed.as_object() {
        for key in ["input", "query", "sql", "statement"] {
            if let Some(value) = object.get(key).and_then(|value| value.as_str()) {
                return value.to_string();
            }
        }
        for value in object.values() {
            if let Some(text) = value.as_str() {
                return text.to_string();
            }
        }
        return String::new();
    }

    parsed.as_str().map(str::to_string).unwrap_or_else(|| arguments.to_string())
}

pub struct FaqSearchTool {
    index: Arc<SharedIndex>,
}

impl FaqSearchTool {
    pub fn new(index: Arc<SharedIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for FaqSearchTool {
    fn name(&self) -> &'static str {
        "search_faq"
    }

    fn description(&self) -> String {
        "Search the FAQ for policy, process, how-to, and troubleshooting questions. \
         Input is a natural language question."
            .to_string()
    }

    async fn call(&self, input: &str) -> String {
        match self.index.search_formatted(input).await {
            Ok(text) => text,
            Err(error) => {
                warn!(error = %error, "faq search degraded");
                format!("FAQ search failed: {error}")
            }
        }
    }
}

const CUSTOMERS_SCHEMA: &str = "Table: customers\n\
Columns: customer_id, gender, senior_citizen(0/1), partner(Yes/No), dependents(Yes/No),\n\
tenure(months), phone_service(Yes/No), multiple_lines(Yes/No),\n\
internet_service(DSL/Fiber optic/No), online_security(Yes/No), online_backup(Yes/No),\n\
device_protection(Yes/No), tech_support(Yes/No), streaming_tv(Yes/No),\n\
streaming_movies(Yes/No), contract(Month-to-month/One year/Two year),\n\
paperless_billing(Yes/No), payment_method, monthly_charges, total_charges, churn(Yes/No)";

pub struct CustomerQueryTool {
    pool: DbPool,
}

impl CustomerQueryTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Tool for CustomerQueryTool {
    fn name(&self) -> &'static str {
        "query_customers"
    }

    fn description(&self) -> String {
        format!(
            "Execute a single SQLite SELECT statement on the customers table for statistics, \
             pricing, and counts.\n\n{CUSTOMERS_SCHEMA}"
        )
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sql": { "type": "string", "description": "SQLite SELECT query" }
            },
            "required": ["sql"]
        })
    }

    async fn call(&self, input: &str) -> String {
        telassist_db::run_select(&self.pool, input).await
    }
}

pub struct StatsTool {
    pool: DbPool,
}

impl StatsTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Tool for StatsTool {
    fn name(&self) -> &'static str {
        "get_stats"
    }

    fn description(&self) -> String {
        "Get an overview of customer base statistics. Takes no input.".to_string()
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _input: &str) -> String {
        match telassist_db::summarize(&self.pool).await {
            Ok(digest) => digest,
            Err(error) => {
                warn!(error = %error, "stats battery failed");
                format!("Stats error: {error}")
            }
        }
    }
}
