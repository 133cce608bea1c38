pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use autostream_core::config::LoadOptions;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "autostream",
    about = "AutoStream sales assistant CLI",
    long_about = "Chat with the AutoStream assistant, classify single utterances, and inspect configuration.",
    after_help = "Examples:\n  autostream chat\n  autostream classify \"what's your pricing?\"\n  autostream doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an autostream.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation on stdin/stdout")]
    Chat,
    #[command(about = "Classify a single utterance and print its intent tag")]
    Classify {
        #[arg(help = "Utterance to classify")]
        text: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, knowledge file, and lead sink readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Command {
    /// Commands that own stdout for an interactive transcript report their
    /// result on stderr instead.
    fn writes_transcript(&self) -> bool {
        matches!(self, Self::Chat)
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let writes_transcript = cli.command.writes_transcript();
    let result = match cli.command {
        Command::Chat => commands::chat::run(options),
        Command::Classify { text } => commands::classify::run(&text),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => commands::doctor::run(options, json),
    };

    if writes_transcript {
        eprintln!("{}", result.output);
    } else {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
