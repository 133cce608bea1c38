use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use autostream_agent::lead_capture::{sink_from_config, LeadSink};
use autostream_agent::runtime::{AgentRuntime, RuntimePolicy};
use autostream_core::config::{AppConfig, LoadOptions};
use autostream_core::errors::ApplicationError;
use autostream_core::knowledge::{KnowledgeBase, KnowledgeSource};

use crate::commands::CommandResult;
use crate::logging;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: u64,
    pub leads_captured: u64,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("chat", &ApplicationError::from(error)),
    };
    logging::init(&config);

    // Knowledge is loaded once, before the first turn, and never reloaded.
    let knowledge = match KnowledgeBase::load(config.knowledge.path.as_deref()) {
        Ok(knowledge) => knowledge,
        Err(error) => return CommandResult::from_error("chat", &ApplicationError::from(error)),
    };
    let knowledge_source = config
        .knowledge
        .path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());
    tracing::info!(
        event_name = "system.chat.knowledge_loaded",
        source = %knowledge_source,
        plans = knowledge.catalog().plans.len(),
        "knowledge loaded"
    );

    let runtime = AgentRuntime::new(
        knowledge,
        sink_from_config(&config),
        RuntimePolicy::from_config(&config),
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run_session(&runtime, &config, stdin.lock(), stdout.lock()) {
        Ok(summary) => CommandResult::success(
            "chat",
            format!(
                "session ended after {} turns with {} leads captured",
                summary.turns, summary.leads_captured
            ),
        ),
        Err(error) => CommandResult::failure("chat", "terminal_io", format!("{error:#}"), 6),
    }
}

/// Reads one line per turn until end of input or an exit word, writing each
/// reply as `Agent: <response>`.
pub fn run_session<K, L, R, W>(
    runtime: &AgentRuntime<K, L>,
    config: &AppConfig,
    mut input: R,
    mut output: W,
) -> Result<SessionSummary>
where
    K: KnowledgeSource,
    L: LeadSink,
    R: BufRead,
    W: Write,
{
    let mut conversation = runtime.start_conversation("cli");
    let mut summary = SessionSummary::default();
    let mut line = String::new();

    loop {
        write!(output, "User: ").context("failed to write prompt")?;
        output.flush().context("failed to flush prompt")?;

        line.clear();
        let read = input.read_line(&mut line).context("failed to read user input")?;
        if read == 0 {
            writeln!(output).context("failed to write newline")?;
            break;
        }

        let text = line.trim_end_matches(&['\r', '\n'][..]);
        if config.is_exit_word(text) {
            break;
        }

        let outcome = runtime.handle_turn(&mut conversation, text);
        summary.turns += 1;
        if outcome.captured_lead.is_some() {
            summary.leads_captured += 1;
        }

        // Multi-line replies such as the pricing text carry their own trailing newline.
        let response = outcome.response.trim_end_matches('\n');
        writeln!(output, "Agent: {response}").context("failed to write response")?;
    }

    tracing::info!(
        event_name = "system.chat.session_ended",
        conversation_id = %conversation.id(),
        turns = summary.turns,
        leads_captured = summary.leads_captured,
        "chat session ended"
    );

    Ok(summary)
}
