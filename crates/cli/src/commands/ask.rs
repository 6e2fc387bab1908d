use crate::commands::{bootstrap, CommandResult};
use telassist_agent::TurnRequest;
use telassist_core::config::{AppConfig, LoadOptions};

pub fn run(prompt: &str, actor: Option<String>, thread: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let response = runtime.block_on(async {
        let agent = bootstrap::agent_runtime(&config).await?;
        let request = TurnRequest { prompt: prompt.to_string(), actor_id: actor, thread_id: thread };
        Ok::<_, anyhow::Error>(agent.handle_turn(request).await)
    });

    match response {
        Ok(turn) => {
            let exit_code = if turn.error.is_some() { 1 } else { 0 };
            let output = serde_json::to_string_pretty(&turn)
                .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
            CommandResult { exit_code, output }
        }
        Err(error) => CommandResult::failure("ask", "bootstrap", error.to_string(), 4),
    }
}
