use std::io::{self, BufRead, Write};

use uuid::Uuid;

use crate::commands::{bootstrap, CommandResult};
use telassist_agent::TurnRequest;
use telassist_core::config::{AppConfig, LoadOptions};
use telassist_core::SessionKey;

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub fn run(actor: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
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
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let agent = match runtime.block_on(bootstrap::agent_runtime(&config)) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("chat", "bootstrap", error.to_string(), 4);
        }
    };

    let actor_id = actor.unwrap_or_else(|| SessionKey::default().actor_id);
    // Fresh thread per chat session so memory recall never bleeds in
    // from a previous run of the binary.
    let thread_id = Uuid::new_v4().to_string();

    println!("Telecom support assistant. Type your question, or 'quit' to leave.");

    let stdin = io::stdin();
    let mut turns = 0usize;
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&prompt.to_ascii_lowercase().as_str()) {
            break;
        }

        let request = TurnRequest::for_session(prompt, actor_id.clone(), thread_id.clone());
        let response = runtime.block_on(agent.handle_turn(request));
        match response.error {
            Some(error) => println!("error: {error}"),
            None => println!("{}", response.result),
        }
        turns += 1;
    }

    CommandResult::success("chat", format!("session ended after {turns} turns"))
}
