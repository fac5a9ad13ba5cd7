//! CLI module
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Reelstitch
///
/// Compiles the closing moments of a folder of video clips into one
/// continuous video, with an optional intro and background music.
#[derive(Parser)]
#[command(name = "reelstitch")]
#[command(about = "Stitch clip endings into a single compilation video")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build a compilation from a folder of clips
    Run(args::RunArgs),
    /// Preview which clips a run would pick up
    Scan(args::ScanArgs),
}
