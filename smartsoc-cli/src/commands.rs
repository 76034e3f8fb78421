//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, HistoryAction};
use smartsoc_core::chat::{ChatAssistant, ChatRole, OpenAiCompatClient, TranscriptStore};
use smartsoc_core::server::{self, ApiState};
use smartsoc_core::{
    FeedView, IncidentBoard, SimulationEngine, SmartSocConfig, StatsPanel, config::load_config,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Run { duration, seed } => handle_run(workspace, duration, seed).await,
        Commands::Serve { host, port, start } => handle_serve(workspace, host, port, start).await,
        Commands::Chat => {
            let config = load_validated(workspace)?;
            crate::repl::run_interactive(config).await
        }
        Commands::History { action } => handle_history(action, workspace).await,
        Commands::Config { action } => handle_config(action, workspace),
    }
}

pub(crate) fn load_validated(workspace: &Path) -> anyhow::Result<SmartSocConfig> {
    let config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    config.validate()?;
    Ok(config)
}

/// Build the chat assistant, or `None` when no API key is available.
pub(crate) fn build_assistant(config: &SmartSocConfig) -> Option<Arc<ChatAssistant>> {
    match OpenAiCompatClient::new(&config.chat) {
        Ok(client) => Some(Arc::new(ChatAssistant::new(
            &config.chat,
            Arc::new(client),
            TranscriptStore::new(config.chat.history_file()),
        ))),
        Err(e) => {
            warn!(error = %e, env = %config.chat.api_key_env, "Chat assistant disabled");
            None
        }
    }
}

async fn handle_run(
    workspace: &Path,
    duration: Option<u64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = load_validated(workspace)?;
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    let sim = &config.simulation;

    let engine = SimulationEngine::spawn(sim.clone())?;
    engine.register_sink(Box::new(FeedView::attached(
        sim.feed_render_limit,
        Box::new(std::io::stdout()),
    )))?;
    engine.register_sink(Box::new(IncidentBoard::attached(
        sim.incident_render_limit,
        Box::new(std::io::stdout()),
    )))?;
    engine.register_sink(Box::new(StatsPanel::attached(Box::new(std::io::stdout()))))?;
    engine.start().await?;

    match duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!(secs, "Run duration elapsed");
                }
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
        }
    }

    engine.stop().await?;
    let stats = engine.stats().await?;
    println!(
        "\nSimulation stopped: {} events, {} blocked, {} incidents",
        stats.total_events, stats.blocked_events, stats.incidents_created
    );
    engine.shutdown().await?;
    Ok(())
}

async fn handle_serve(
    workspace: &Path,
    host: Option<String>,
    port: Option<u16>,
    start: bool,
) -> anyhow::Result<()> {
    let mut config = load_validated(workspace)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = SimulationEngine::spawn(config.simulation.clone())?;
    if start {
        engine.start().await?;
    }
    let chat = build_assistant(&config);
    let state = ApiState::new(engine.clone(), chat);

    server::run(&config.server, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await?;

    engine.shutdown().await?;
    Ok(())
}

async fn handle_history(action: HistoryAction, workspace: &Path) -> anyhow::Result<()> {
    let config = load_validated(workspace)?;
    let store = TranscriptStore::new(config.chat.history_file());
    match action {
        HistoryAction::Show { json } => {
            let turns = store.load();
            if json {
                println!("{}", serde_json::to_string_pretty(&turns)?);
            } else if turns.is_empty() {
                println!("No chat history at {}", store.path().display());
            } else {
                for turn in &turns {
                    let who = match turn.role {
                        ChatRole::User => "you",
                        ChatRole::Assistant => "assistant",
                        ChatRole::System => "system",
                    };
                    println!("[{}] {}\n", who, turn.content);
                }
            }
            Ok(())
        }
        HistoryAction::Clear => {
            store.save(&[])?;
            println!("Cleared chat history at {}", store.path().display());
            Ok(())
        }
    }
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let mut config = load_validated(workspace)?;
            if config.chat.api_key.is_some() {
                config.chat.api_key = Some("********".to_string());
            }
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Init => {
            let config_dir = workspace.join(".smartsoc");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&SmartSocConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
    }
}
