//! Interactive chat REPL backed by a live simulation.

use smartsoc_core::chat::{ChatRole, ReplyKind};
use smartsoc_core::error::ChatError;
use smartsoc_core::{EngineHandle, SimulationEngine, SmartSocConfig};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
  /stats     show simulation counters
  /start     resume event generation
  /stop      pause event generation
  /history   print the stored transcript
  /clear     delete the stored transcript
  /help      show this help
  /quit      exit";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Ask(&'a str),
    Stats,
    Start,
    Stop,
    History,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> ReplCommand<'a> {
    /// `None` for blank input.
    fn parse(input: &'a str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if !input.starts_with('/') {
            return Some(Self::Ask(input));
        }
        let cmd = input.split_whitespace().next().unwrap_or(input);
        Some(match cmd {
            "/stats" => Self::Stats,
            "/start" => Self::Start,
            "/stop" => Self::Stop,
            "/history" => Self::History,
            "/clear" => Self::Clear,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" | "/q" => Self::Quit,
            other => Self::Unknown(other),
        })
    }
}

fn prompt() -> std::io::Result<()> {
    print!("\x1b[1;34msoc> \x1b[0m");
    std::io::stdout().flush()
}

async fn print_stats(engine: &EngineHandle) -> anyhow::Result<()> {
    let status = engine.status().await?;
    let stats = engine.stats().await?;
    println!(
        "  {} | events {} | active {} | blocked {} | incidents {}",
        status.state,
        stats.total_events,
        stats.active_events,
        stats.blocked_events,
        stats.incidents_created
    );
    Ok(())
}

/// Run the chat REPL until `/quit` or end of input.
pub async fn run_interactive(config: SmartSocConfig) -> anyhow::Result<()> {
    let Some(chat) = crate::commands::build_assistant(&config) else {
        anyhow::bail!(
            "No chat API key found. Set {} or chat.api_key in .smartsoc/config.toml",
            config.chat.api_key_env
        );
    };

    let engine = SimulationEngine::spawn(config.simulation.clone())?;
    engine.start().await?;

    println!("\x1b[1;32m  SmartSOC assistant\x1b[0m");
    println!("  Model: {} | {}", config.chat.model, config.chat.base_url);
    println!("  Type /help for commands, /quit to exit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };

        match command {
            ReplCommand::Ask(query) => {
                if let Ok(stats) = engine.stats().await {
                    chat.set_context(stats.context_summary());
                }
                match chat.ask(query).await {
                    Ok(reply) => {
                        let color = match reply.kind {
                            ReplyKind::Answer => "0",
                            ReplyKind::ServiceError | ReplyKind::Unreachable => "33",
                        };
                        println!("\n\x1b[{}m{}\x1b[0m\n", color, reply.text);
                    }
                    Err(ChatError::Busy) => println!("  Still waiting on the previous answer."),
                    Err(e) => println!("  {}", e),
                }
            }
            ReplCommand::Stats => print_stats(&engine).await?,
            ReplCommand::Start => {
                if !engine.start().await? {
                    println!("  Simulation already running.");
                }
            }
            ReplCommand::Stop => {
                if !engine.stop().await? {
                    println!("  Simulation already stopped.");
                }
            }
            ReplCommand::History => {
                for turn in chat.history().await {
                    let who = if turn.role == ChatRole::User { "you" } else { "assistant" };
                    println!("  [{}] {}", who, turn.content);
                }
            }
            ReplCommand::Clear => {
                chat.clear().await;
                println!("  Transcript cleared.");
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => {
                println!("Goodbye!");
                break;
            }
            ReplCommand::Unknown(cmd) => println!("  Unknown command: {} (try /help)", cmd),
        }
    }

    engine.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_plain_text_is_a_question() {
        assert_eq!(
            ReplCommand::parse("  any ransomware today?  "),
            Some(ReplCommand::Ask("any ransomware today?"))
        );
    }

    #[test]
    fn test_parse_blank_is_skipped() {
        assert_eq!(ReplCommand::parse("   "), None);
        assert_eq!(ReplCommand::parse(""), None);
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(ReplCommand::parse("/stats"), Some(ReplCommand::Stats));
        assert_eq!(ReplCommand::parse("/q"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/exit"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/clear now"), Some(ReplCommand::Clear));
        assert_eq!(
            ReplCommand::parse("/frobnicate"),
            Some(ReplCommand::Unknown("/frobnicate"))
        );
    }
}
