//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, commands fall back
/// to defaults rather than refusing to run.
pub fn load_config() -> qop_core::config::Config {
    qop_core::config::Config::load().unwrap_or_default()
}

pub mod config;
pub mod diff;
pub mod receive;
pub mod send;

/// qop - air-gapped file transfer over a stream of QR codes
#[derive(Parser)]
#[command(name = "qop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Broadcast a directory as a stream of QR codes
    Send(SendArgs),

    /// Reassemble files from scanned payloads piped on stdin
    Receive(ReceiveArgs),

    /// Compare two directory trees byte-for-byte
    Diff(DiffArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the send command.
#[derive(Parser)]
pub struct SendArgs {
    /// Directory containing the files to transfer
    pub dir: PathBuf,

    /// Lines of source per QR code
    #[arg(long)]
    pub lines: Option<usize>,

    /// How long each code stays on screen (e.g. "1500ms", "2s")
    #[arg(long, value_parser = crate::ui::parse_duration_arg)]
    pub dwell: Option<std::time::Duration>,

    /// Only transfer files with these extensions (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Transfer every file regardless of extension
    #[arg(long, conflicts_with = "extensions")]
    pub all: bool,

    /// Write numbered PNG codes into this directory instead of drawing
    /// them in the terminal
    #[arg(long, value_name = "DIR")]
    pub png_dir: Option<PathBuf>,

    /// Suppress the per-code data preview line
    #[arg(long, short)]
    pub quiet: bool,
}

/// Arguments for the receive command.
#[derive(Parser)]
pub struct ReceiveArgs {
    /// Directory the received files are written into
    pub output: PathBuf,

    /// Flush the current file after this much inactivity (e.g. "5s")
    #[arg(long, value_parser = crate::ui::parse_duration_arg)]
    pub idle_timeout: Option<std::time::Duration>,

    /// Polling cadence of the capture loop (e.g. "500ms")
    #[arg(long, value_parser = crate::ui::parse_duration_arg)]
    pub scan_interval: Option<std::time::Duration>,
}

/// Arguments for the diff command.
#[derive(Parser)]
pub struct DiffArgs {
    /// First directory
    pub first: PathBuf,

    /// Second directory
    pub second: PathBuf,
}

/// Arguments for the config command.
#[derive(Parser)]
pub struct ConfigArgs {
    /// The config action to perform
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init,
}
