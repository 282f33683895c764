//! Teksting CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use teksting::cli::commands::{self, SyncArgs};
use teksting::cli::{Cli, Commands};
use teksting::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("teksting={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Sync {
            input,
            to,
            from,
            format,
            output,
            provider,
            save,
        } => {
            let args = SyncArgs {
                to,
                from,
                formats: format,
                output,
                provider,
                save,
            };
            commands::run_sync(&input, args, settings).await?;
        }

        Commands::Transcribe { input, output, language } => {
            commands::run_transcribe(&input, output, language, settings).await?;
        }

        Commands::Render { result, format, output } => {
            commands::run_render(&result, &format, output, &settings)?;
        }

        Commands::Mux {
            video,
            subtitles,
            output,
            mode,
        } => {
            commands::run_mux(&video, &subtitles, &output, &mode).await?;
        }

        Commands::Check { input } => {
            commands::run_check(&input, &settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
