//! Reelstitch
//!
//! Compiles the closing moments of a folder of video clips into one
//! continuous video. Each clip contributes a configurable tail window;
//! an optional intro is prepended and optional background music is mixed
//! under the result.
//!
//! # Usage
//!
//! ```bash
//! reelstitch run --source-dir ./clips --output compilation.mp4
//! reelstitch run --source-dir ./clips --intro intro.mp4 --music track.mp3
//! reelstitch scan --source-dir ./clips
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use reelstitch::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            commands::run(args).await?;
        }
        Commands::Scan(args) => {
            info!("Executing scan command");
            commands::scan(args).await?;
        }
    }

    Ok(())
}
