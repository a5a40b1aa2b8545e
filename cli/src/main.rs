//! CLI entrypoint for model-arena
//!
//! Wires the layers together with dependency injection: the OpenRouter
//! adapter and system clock from infrastructure, the request registry from
//! the application layer, and console rendering here.

mod args;
mod output;
mod progress;

use anyhow::{Context, Result};
use arena_application::RequestRegistry;
use arena_domain::BackendId;
use arena_infrastructure::{ConfigLoader, OpenRouterClient, SystemClock};
use args::Cli;
use clap::Parser;
use output::ConsoleFormatter;
use progress::{wait_for_completion, ProgressRenderer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting model-arena");

    // Load and override configuration
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    if let Some(timeout) = cli.timeout {
        config.request_timeout_seconds = timeout;
    }
    if let Some(retries) = cli.retries {
        config.max_retries = retries;
    }
    config.validate()?;

    let api_key = config
        .api_key
        .clone()
        .context("No OpenRouter API key configured (set OPENROUTER_API_KEY)")?;

    let mut panel = config.panel_config()?;
    if !cli.models.is_empty() {
        let ids: Vec<BackendId> = cli.models.iter().map(|m| BackendId::new(m.as_str())).collect();
        panel = panel.subset(&ids)?;
    }

    // === Dependency Injection ===
    let client = Arc::new(OpenRouterClient::new(api_key)?);
    let registry = RequestRegistry::new(
        panel.clone(),
        config.dispatch_config(),
        client,
        Arc::new(SystemClock),
        config.max_models_concurrent,
    );

    if !cli.quiet {
        println!();
        println!("Prompt: {}", cli.prompt);
        println!(
            "Panel:  {}",
            panel
                .iter()
                .map(|s| s.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    let request_id = registry.create(&cli.prompt)?;
    let events = registry.subscribe(request_id)?;

    if cli.quiet {
        wait_for_completion(events).await;
    } else {
        ProgressRenderer::new(&panel).run(events).await;
    }

    let result = registry.get_result(request_id)?;
    println!("{}", ConsoleFormatter::format(&result));

    Ok(())
}
