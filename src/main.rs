// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use flowlet::services::web_server;
use flowlet::{FlowChannel, FlowletConfig, ProtocolGeneration, RegistryClient, Widget};

#[derive(Parser)]
#[command(name = "flowlet", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local mock registry backend
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(long)]
        host: Option<String>,
    },
    /// Drive the widget engine through a host message script and print
    /// what it posts back
    Simulate {
        /// JSON file with one host message, or an array of them
        script: PathBuf,
        /// Append a save request after the scripted messages
        #[arg(long)]
        save: bool,
        /// Post the full response document instead of the minimal projection
        #[arg(long)]
        full_response: bool,
        /// Registry base URL (defaults to the configured one)
        #[arg(long)]
        registry: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flowlet=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port, host } => {
            let config = FlowletConfig::load().ok();

            // CLI > config > default
            let final_host = host
                .or_else(|| config.as_ref().map(|c| c.server.host.clone()))
                .unwrap_or_else(|| "127.0.0.1".to_string());
            let final_port = port
                .or_else(|| config.as_ref().map(|c| c.server.port))
                .unwrap_or(3000);

            web_server::start_web_server(final_host, final_port).await?;
        }
        Commands::Simulate {
            script,
            save,
            full_response,
            registry,
        } => {
            run_simulation(script, save, full_response, registry).await?;
        }
    }

    Ok(())
}

/// Plays a scripted host session against a fresh widget: announce ready,
/// dispatch each message in order, restore any previously saved tools,
/// optionally save, then print every outbound message as a JSON line.
async fn run_simulation(
    script: PathBuf,
    save: bool,
    full_response: bool,
    registry: Option<String>,
) -> Result<()> {
    let config = FlowletConfig::load().unwrap_or_default();
    let base_url = registry.unwrap_or(config.registry.base_url);

    let generation = if full_response {
        ProtocolGeneration::Full
    } else {
        ProtocolGeneration::Minimal
    };
    let (mut channel, mut host_inbox) = FlowChannel::new(generation);
    let mut widget = Widget::new(Arc::new(RegistryClient::new(base_url)));

    channel.announce_ready();

    let content = fs::read_to_string(&script)
        .with_context(|| format!("Failed to read message script: {}", script.display()))?;
    let raw: Value = serde_json::from_str(&content)
        .with_context(|| format!("Message script is not JSON: {}", script.display()))?;
    let messages = match raw {
        Value::Array(items) => items,
        single => vec![single],
    };

    for message in messages {
        channel.dispatch(message, &mut widget);
    }
    widget.restore_saved_tools().await;

    if save {
        channel.dispatch(json!({ "type": "save_parameter_value" }), &mut widget);
    }

    while let Ok(message) = host_inbox.try_recv() {
        println!("{}", serde_json::to_string(&message)?);
    }
    Ok(())
}
