//! Send command implementation.

use std::path::PathBuf;

use anyhow::Result;

use qop_core::file::format_size;
use qop_core::payload::Payload;
use qop_core::sender::{PayloadSink, Sequencer, SequencerConfig};
use qop_core::{qr, Result as CoreResult};

use super::SendArgs;
use crate::ui::data_preview;

/// Draws each code as Unicode art on a cleared terminal, with a one-line
/// data preview underneath.
struct TerminalSink {
    quiet: bool,
    shown: usize,
}

impl PayloadSink for TerminalSink {
    fn show(&mut self, _payload: &Payload, encoded: &str) -> CoreResult<()> {
        let art = qr::render_ascii(encoded)?;
        self.shown += 1;

        // Clear screen and home the cursor so codes replace each other.
        print!("\x1b[2J\x1b[H");
        println!("{art}");
        if !self.quiet {
            println!("[{}] {}", self.shown, data_preview(encoded, 60));
        }
        Ok(())
    }
}

/// Writes each code as a numbered PNG for an external viewer to cycle.
struct PngDirSink {
    dir: PathBuf,
    size: u32,
    index: usize,
}

impl PayloadSink for PngDirSink {
    fn show(&mut self, _payload: &Payload, encoded: &str) -> CoreResult<()> {
        let png = qr::render_png(encoded, self.size)?;
        self.index += 1;
        let path = self.dir.join(format!("qr_{:04}.png", self.index));
        std::fs::write(path, png)?;
        Ok(())
    }
}

/// Run the send command.
pub fn run(args: SendArgs) -> Result<()> {
    let global_config = super::load_config();

    let extensions = if args.all {
        Vec::new()
    } else if args.extensions.is_empty() {
        global_config.sender.extensions.clone()
    } else {
        args.extensions.clone()
    };

    let write_pngs = args.png_dir.is_some();
    let config = SequencerConfig {
        lines_per_code: args.lines.unwrap_or(global_config.sender.lines_per_code),
        // PNGs are paced by whatever displays them, not by us.
        dwell: if write_pngs {
            std::time::Duration::ZERO
        } else {
            args.dwell.unwrap_or(global_config.sender.dwell)
        },
        extensions,
    };

    let sequencer = Sequencer::new(args.dir, config)?;

    let summary = if let Some(dir) = args.png_dir {
        std::fs::create_dir_all(&dir)?;
        let mut sink = PngDirSink {
            dir,
            size: global_config.sender.png_size,
            index: 0,
        };
        sequencer.broadcast(&mut sink)?
    } else {
        let mut sink = TerminalSink {
            quiet: args.quiet,
            shown: 0,
        };
        sequencer.broadcast(&mut sink)?
    };

    println!();
    println!(
        "Sent {} files as {} codes ({})",
        summary.files_sent,
        summary.payloads_emitted,
        format_size(summary.bytes_emitted)
    );
    if summary.files_skipped > 0 {
        println!("Skipped {} unreadable files", summary.files_skipped);
    }

    Ok(())
}
