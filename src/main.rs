//! Tubegist CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubegist::cli::{commands, Cli, Commands, Output};
use tubegist::config::Settings;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        Output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubegist={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match cli.command {
        Commands::Ask {
            request,
            video,
            model,
            max_steps,
        } => {
            commands::run_ask(&request, video, model, max_steps, settings).await?;
        }

        Commands::Transcript {
            video,
            output,
            format,
        } => {
            commands::run_transcript(&video, output, &format, settings).await?;
        }

        Commands::Summary { video, model } => {
            commands::run_summary(&video, model, settings).await?;
        }

        Commands::Ideas { video, model } => {
            commands::run_ideas(&video, model, settings).await?;
        }

        Commands::Quotes { video, model } => {
            commands::run_quotes(&video, model, settings).await?;
        }

        Commands::Tools => {
            commands::run_tools(settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
