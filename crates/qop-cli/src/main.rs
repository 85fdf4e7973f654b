//! Qop CLI - air-gapped file transfer over a stream of QR codes
//!
//! The sender turns a directory of text files into QR codes shown one at a
//! time; the receiver turns scanned payloads back into files. The only
//! channel between the two machines is the screen and a camera.
//!
//! ## Quick Start
//!
//! ```bash
//! # On the machine with the files: show the tree as QR codes
//! qop send ./my_project
//!
//! # On the receiving machine: pipe decoded payloads into qop
//! scanner --nul | qop receive ./incoming
//!
//! # Afterwards, verify the copy
//! qop diff ./my_project ./incoming
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Send(args) => commands::send::run(args),
        Command::Receive(args) => commands::receive::run(args),
        Command::Diff(args) => commands::diff::run(args),
        Command::Config(args) => commands::config::run(&args),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,qop=info,qop_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
