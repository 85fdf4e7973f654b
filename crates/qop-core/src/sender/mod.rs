//! Payload sequencing for the sending side.
//!
//! The [`Sequencer`] walks a directory tree and turns every matching file
//! into an ordered payload stream: one [`Payload::PathMarker`] announcing
//! the file, followed by [`Payload::ContentChunk`]s of at most
//! `lines_per_code` lines each.
//!
//! Display is a collaborator behind the [`PayloadSink`] trait; the
//! sequencer paces the stream by sleeping for the dwell interval after each
//! payload and never waits for confirmation. The optical channel has no
//! acknowledgment path — receivers compensate with de-duplication.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::file::{has_extension, list_all_files, wire_path};
use crate::payload::Payload;

/// Configuration for a [`Sequencer`].
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Maximum number of source lines carried by one QR code
    pub lines_per_code: usize,
    /// How long each code stays visible before the next one
    pub dwell: Duration,
    /// File extensions to transfer; an empty list transfers every file
    pub extensions: Vec<String>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let sender = crate::config::SenderConfig::default();
        Self {
            lines_per_code: sender.lines_per_code,
            dwell: sender.dwell,
            extensions: sender.extensions,
        }
    }
}

/// Where emitted payloads go: a terminal QR printer, a PNG writer, a test
/// collector. Called once per payload, in emission order.
pub trait PayloadSink {
    /// Display or store one payload.
    ///
    /// `encoded` is the exact string placed into the QR code.
    ///
    /// # Errors
    ///
    /// A recoverable error (see [`Error::is_recoverable`]) skips the
    /// payload; any other error aborts the broadcast.
    fn show(&mut self, payload: &Payload, encoded: &str) -> Result<()>;
}

/// Totals reported after a broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendSummary {
    /// Files fully emitted
    pub files_sent: usize,
    /// Files skipped because they could not be read
    pub files_skipped: usize,
    /// Payloads handed to the sink (markers and chunks)
    pub payloads_emitted: usize,
    /// Total encoded payload bytes
    pub bytes_emitted: u64,
}

/// Splits file content into `(start_line, text)` groups.
///
/// Lines keep their trailing newlines; the final group may hold fewer than
/// `lines_per_chunk` lines but always holds all remaining lines.
/// `start_line` is the 0-based index of the group's first line.
#[must_use]
pub fn chunk_lines(content: &str, lines_per_chunk: usize) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    lines
        .chunks(lines_per_chunk.max(1))
        .enumerate()
        .map(|(i, group)| (i * lines_per_chunk.max(1), group.concat()))
        .collect()
}

/// Walks a file tree and emits the payload stream for a transfer.
#[derive(Debug)]
pub struct Sequencer {
    root: PathBuf,
    config: SequencerConfig,
}

impl Sequencer {
    /// Create a sequencer rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn new(root: impl Into<PathBuf>, config: SequencerConfig) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(Error::DirectoryNotFound(root));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        Ok(Self { root, config })
    }

    /// The transfer root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate the files this sequencer will transfer, in emission order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be walked.
    pub fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let files = list_all_files(&self.root)?
            .into_iter()
            .filter(|p| has_extension(p, &self.config.extensions))
            .collect::<Vec<_>>();

        if files.is_empty() {
            tracing::warn!(root = %self.root.display(), "no matching files found");
        }

        Ok(files)
    }

    /// Produce the payloads for a single file: its path marker followed by
    /// its content chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn file_payloads(&self, relative: &Path) -> Result<Vec<Payload>> {
        let content = std::fs::read_to_string(self.root.join(relative))?;
        let name = wire_path(relative);

        let mut payloads = vec![Payload::path_marker(name.clone())];
        for (start_line, text) in chunk_lines(&content, self.config.lines_per_code) {
            payloads.push(Payload::content_chunk(name.clone(), start_line, text));
        }

        Ok(payloads)
    }

    /// Produce the full ordered payload stream for the transfer.
    ///
    /// Unreadable files (permissions, non-UTF-8 content) are skipped with a
    /// warning; sequencing continues with the next file.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be walked.
    pub fn payloads(&self) -> Result<Vec<Payload>> {
        let mut all = Vec::new();
        for relative in self.matching_files()? {
            match self.file_payloads(&relative) {
                Ok(payloads) => all.extend(payloads),
                Err(e) => {
                    tracing::warn!(file = %relative.display(), error = %e, "skipping unreadable file");
                }
            }
        }
        Ok(all)
    }

    /// Broadcast every payload through `sink`, holding each for the dwell
    /// interval. Fire-and-forget: there is no retry and no receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be walked or the sink fails
    /// unrecoverably.
    pub fn broadcast(&self, sink: &mut dyn PayloadSink) -> Result<SendSummary> {
        let files = self.matching_files()?;
        tracing::info!(count = files.len(), root = %self.root.display(), "starting broadcast");

        let mut summary = SendSummary::default();

        for relative in files {
            let payloads = match self.file_payloads(&relative) {
                Ok(payloads) => payloads,
                Err(e) => {
                    tracing::warn!(file = %relative.display(), error = %e, "skipping unreadable file");
                    summary.files_skipped += 1;
                    continue;
                }
            };

            for payload in &payloads {
                if let Payload::ContentChunk { start_line, .. } = payload {
                    tracing::info!(file = %relative.display(), line = start_line, "sending chunk");
                } else {
                    tracing::info!(file = %relative.display(), "sending path marker");
                }

                let encoded = payload.encode();
                match sink.show(payload, &encoded) {
                    Ok(()) => {
                        summary.payloads_emitted += 1;
                        summary.bytes_emitted += encoded.len() as u64;
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!(file = %relative.display(), error = %e, "payload dropped");
                    }
                    Err(e) => return Err(e),
                }

                if !self.config.dwell.is_zero() {
                    std::thread::sleep(self.config.dwell);
                }
            }

            summary.files_sent += 1;
        }

        tracing::info!(
            files = summary.files_sent,
            skipped = summary.files_skipped,
            payloads = summary.payloads_emitted,
            "broadcast finished"
        );

        Ok(summary)
    }
}
