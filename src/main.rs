mod backend;
mod chunk;
mod commands;
mod config;
mod error;
mod output;
mod payload;
mod telemetry;
mod trigger;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::respond::RespondArgs;

#[derive(Debug, Parser)]
#[command(
    name = "meshbridge",
    version,
    about = "Message-triggered LLM bridge for MeshMonitor/Meshtastic radio text"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read one message event from stdin and emit the reply envelope
    Respond(RespondArgs),
    /// Print the resolved configuration
    Config,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Respond(_) => "respond",
            Self::Config => "config",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();
    // The host invokes the bare binary; default to respond.
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Respond(RespondArgs::default()));

    let _span = tracing::info_span!("command", name = command.name()).entered();

    let result = match command {
        Commands::Respond(args) => args.execute(),
        Commands::Config => commands::config::run_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
