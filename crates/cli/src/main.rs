// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cattery`: GitHub self-hosted runners scheduler.

use cattery_agent::AgentOptions;
use cattery_config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cattery", version, about = "GitHub self-hosted runners scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the cattery server
    Server {
        /// Path to the config file
        #[arg(short = 'c', long = "config-path")]
        config_path: Option<PathBuf>,
    },
    /// Run the in-tray agent
    Agent {
        /// Path to the folder containing the runner distribution
        #[arg(short = 'r', long = "runner-folder")]
        runner_folder: PathBuf,
        /// URL of the cattery server
        #[arg(short = 's', long = "server-url", default_value = "http://localhost:5137")]
        server_url: String,
        /// ID of the agent
        #[arg(short = 'i', long = "agent-id")]
        agent_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Command::Server { config_path } => {
            let config = match AppConfig::load(config_path.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error loading config: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = cattery_server::run(config).await {
                error!(error = %e, "server failed");
                return ExitCode::FAILURE;
            }
        }
        Command::Agent { runner_folder, server_url, agent_id } => {
            let options = AgentOptions { runner_folder, server_url, agent_id };
            if let Err(e) = cattery_agent::run(options).await {
                error!(error = %e, "agent failed");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
