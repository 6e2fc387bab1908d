use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use telassist_agent::{
    AgentRuntime, CustomerQueryTool, FaqSearchTool, HostedChatModel, InMemorySessionMemory,
    StatsTool, ToolRegistry,
};
use telassist_core::config::AppConfig;
use telassist_db::connect_with_settings;
use telassist_index::{HttpEmbeddingClient, SharedIndex};

/// Wires the full agent stack from one loaded config: store pool,
/// lazily-loaded FAQ index, the three tools, and the hosted model.
pub async fn agent_runtime(config: &AppConfig) -> Result<AgentRuntime> {
    if !config.llm_ready() {
        return Err(anyhow!(
            "llm.api_key is not configured; set TELASSIST_LLM_API_KEY or add it to the config file"
        ));
    }

    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .context("connecting to the customer store")?;

    let embedder =
        Arc::new(HttpEmbeddingClient::from_config(&config.embedding).context("embedding client")?);
    let index = Arc::new(SharedIndex::new(
        embedder,
        config.data.index_path(),
        config.data.faq_path(),
        config.embedding.model.clone(),
    ));

    let mut tools = ToolRegistry::default();
    tools.register(FaqSearchTool::new(index));
    tools.register(CustomerQueryTool::new(pool.clone()));
    tools.register(StatsTool::new(pool));

    let model = HostedChatModel::from_config(&config.llm)?;

    Ok(AgentRuntime::new(Arc::new(model), tools, Arc::new(InMemorySessionMemory::default())))
}
