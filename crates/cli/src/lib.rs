pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use telassist_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "telassist",
    about = "Telecom support assistant CLI",
    long_about = "Build the customer store and FAQ index, run readiness checks, and talk to the retrieval-backed support agent.",
    after_help = "Examples:\n  telassist init\n  telassist doctor --json\n  telassist ask \"How many customers churned?\"\n  telassist chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Ingest the customer CSV and build the FAQ semantic index")]
    Init,
    #[command(about = "Ask the agent a single question and print the answer envelope")]
    Ask {
        #[arg(help = "Question to send to the agent")]
        prompt: String,
        #[arg(long, help = "Actor identifier scoping conversation memory")]
        actor: Option<String>,
        #[arg(long, help = "Thread identifier scoping conversation memory")]
        thread: Option<String>,
    },
    #[command(about = "Interactive conversation loop against one session")]
    Chat {
        #[arg(long, help = "Actor identifier scoping conversation memory")]
        actor: Option<String>,
    },
    #[command(about = "Validate config, data files, credentials, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn init_logging(config: &AppConfig) {
    use telassist_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up before dispatch; commands re-report config
    // failures through their own envelopes.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Init => commands::init::run(),
        Command::Ask { prompt, actor, thread } => commands::ask::run(&prompt, actor, thread),
        Command::Chat { actor } => commands::chat::run(actor),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
