//! Reassembly state machine for the receiving side.
//!
//! The optical channel is lossy and redundant: a payload may be captured
//! zero, one, or many times, and consecutive identical frames are common
//! because the sender's dwell time exceeds the capture cadence. The
//! [`Reassembler`] compensates with exact-string de-duplication and decides
//! when a file is complete using three triggers:
//!
//! - a new [`Payload::PathMarker`] supersedes the current file
//! - the idle timeout elapses with no new payloads
//! - the session ends
//!
//! All three flush the file: fragments are sorted by starting line,
//! concatenated, and written under the output directory, then the buffer is
//! discarded. The de-duplication set is never cleared during a session, so
//! a late duplicate of an already-flushed file is dropped instead of
//! reopening it.
//!
//! Frame capture and QR decoding are external; the caller either feeds raw
//! strings through [`Reassembler::accept`] from its own loop, or hands a
//! [`FrameSource`] to [`Reassembler::run`] and lets the reassembler drive
//! the poll → process → tick cycle.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::file::{path_from_wire, sanitize_path};
use crate::payload::Payload;

/// Configuration for a [`Reassembler`].
#[derive(Debug, Clone)]
pub struct ReassemblerConfig {
    /// Inactivity duration after which the current file is flushed
    pub idle_timeout: Duration,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(crate::DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

/// Supplies decoded payload strings, one batch per captured frame.
///
/// A frame may contain zero payloads (nothing recognized) or several (two
/// codes visible at once, or the same code twice). Implementations block
/// for their own capture cadence; returning `None` ends the session.
pub trait FrameSource {
    /// The payload strings decoded from the next frame, or `None` when the
    /// session is over.
    fn next_frame(&mut self) -> Option<Vec<String>>;
}

/// What the reassembler did with one raw payload string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Exact string already seen; ignored
    Duplicate,
    /// A path marker opened a new target file
    FileStarted {
        /// The announced relative path
        relative_path: String,
    },
    /// A content chunk was appended to the current target
    ChunkBuffered,
    /// A content chunk arrived with no open target or a mismatched
    /// filename and was dropped
    ChunkDropped,
    /// Plain text, logged only
    Plain,
}

/// Totals reported after a receive session.
#[derive(Debug, Default)]
pub struct ReceiveSummary {
    /// Frames processed
    pub frames: usize,
    /// Newly accepted payloads
    pub accepted: usize,
    /// Duplicate payloads ignored
    pub duplicates: usize,
    /// Files written to disk, in flush order
    pub files_written: Vec<PathBuf>,
}

/// Per-session reassembly state: current target, per-file fragment buffers,
/// the de-duplication set, and the idle clock.
#[derive(Debug)]
pub struct Reassembler {
    output_dir: PathBuf,
    config: ReassemblerConfig,
    current_target: Option<String>,
    buffers: HashMap<String, Vec<(usize, String)>>,
    seen_payloads: HashSet<String>,
    last_activity: Option<Instant>,
    written: Vec<PathBuf>,
}

impl Reassembler {
    /// Create a reassembler writing into `output_dir`.
    ///
    /// The directory itself is only created when the first file is flushed.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, config: ReassemblerConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
            current_target: None,
            buffers: HashMap::new(),
            seen_payloads: HashSet::new(),
            last_activity: None,
            written: Vec::new(),
        }
    }

    /// The file currently being accumulated, if any.
    #[must_use]
    pub fn current_target(&self) -> Option<&str> {
        self.current_target.as_deref()
    }

    /// Files written so far, in flush order.
    #[must_use]
    pub fn files_written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Process one raw payload string.
    ///
    /// Never fails: duplicates are ignored, malformed payloads decode to
    /// plain text, and a flush that cannot be written is logged without
    /// terminating the transfer.
    pub fn accept(&mut self, raw: &str) -> Disposition {
        if self.seen_payloads.contains(raw) {
            tracing::debug!("duplicate payload ignored");
            return Disposition::Duplicate;
        }
        self.seen_payloads.insert(raw.to_string());
        self.last_activity = Some(Instant::now());

        match Payload::decode(raw) {
            Payload::PathMarker { relative_path } => {
                if let Some(previous) = self.current_target.take() {
                    self.flush_target(&previous);
                }
                tracing::info!(file = %relative_path, "new file announced");
                self.buffers.entry(relative_path.clone()).or_default();
                self.current_target = Some(relative_path.clone());
                Disposition::FileStarted { relative_path }
            }
            Payload::ContentChunk {
                filename,
                start_line,
                text,
            } => self.accept_chunk(&filename, start_line, text),
            Payload::PlainText { text } => {
                tracing::info!(text = %text, "plain text payload");
                Disposition::Plain
            }
        }
    }

    fn accept_chunk(&mut self, filename: &str, start_line: usize, text: String) -> Disposition {
        let Some(target) = self.current_target.clone() else {
            tracing::warn!(file = %filename, "chunk arrived before any path marker, dropped");
            return Disposition::ChunkDropped;
        };

        let target_name = Path::new(&target)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(target.as_str());
        if filename != target && filename != target_name {
            tracing::warn!(
                chunk = %filename,
                target = %target,
                "chunk filename does not match current target, dropped"
            );
            return Disposition::ChunkDropped;
        }

        tracing::debug!(file = %target, line = start_line, "chunk buffered");
        self.buffers
            .entry(target)
            .or_default()
            .push((start_line, text));
        Disposition::ChunkBuffered
    }

    /// Process every payload decoded from one captured frame.
    ///
    /// Returns the number of newly accepted (non-duplicate) payloads.
    pub fn process_frame<I, S>(&mut self, payloads: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = 0;
        for raw in payloads {
            if self.accept(raw.as_ref()) != Disposition::Duplicate {
                accepted += 1;
            }
        }
        accepted
    }

    /// Idle check, run once per polling cycle.
    ///
    /// If more than the idle timeout has passed since the last accepted
    /// payload and the current target has buffered content, the target is
    /// flushed and cleared. Returns the written path when a flush happened.
    pub fn tick(&mut self, now: Instant) -> Option<PathBuf> {
        let last = self.last_activity?;
        if now.duration_since(last) < self.config.idle_timeout {
            return None;
        }

        let target = self.current_target.take()?;
        tracing::info!(file = %target, "idle timeout, flushing current file");
        self.flush_target(&target)
    }

    /// Flush every remaining non-empty buffer. Call on session end.
    ///
    /// Returns all files written during the session, in flush order.
    pub fn finish(&mut self) -> Vec<PathBuf> {
        self.current_target = None;

        let mut remaining: Vec<String> = self.buffers.keys().cloned().collect();
        remaining.sort();
        for target in remaining {
            self.flush_target(&target);
        }

        self.written.clone()
    }

    /// Drive a full receive session from a frame source.
    ///
    /// Polls frames, processes their payloads, runs the idle check once per
    /// cycle, and performs the final flush when the source ends.
    pub fn run(&mut self, source: &mut dyn FrameSource) -> ReceiveSummary {
        let mut summary = ReceiveSummary::default();

        while let Some(payloads) = source.next_frame() {
            summary.frames += 1;
            let total = payloads.len();
            let accepted = self.process_frame(&payloads);
            summary.accepted += accepted;
            summary.duplicates += total - accepted;

            self.tick(Instant::now());
        }

        summary.files_written = self.finish();
        summary
    }

    /// Write one buffer to disk and discard it.
    ///
    /// Empty buffers are discarded without creating a file. Write failures
    /// and path-traversal attempts are logged and dropped; they never
    /// terminate the session.
    fn flush_target(&mut self, target: &str) -> Option<PathBuf> {
        let fragments = self.buffers.remove(target)?;
        if fragments.is_empty() {
            return None;
        }

        let relative = path_from_wire(target);
        let Some(destination) = sanitize_path(&self.output_dir, &relative) else {
            tracing::warn!(file = %target, "path escapes output directory, dropped");
            return None;
        };

        let mut fragments = fragments;
        fragments.sort_by_key(|(start_line, _)| *start_line);
        let content: String = fragments.into_iter().map(|(_, text)| text).collect();

        if let Err(e) = write_file(&destination, &content) {
            tracing::error!(file = %destination.display(), error = %e, "failed to write file");
            return None;
        }

        tracing::info!(file = %destination.display(), bytes = content.len(), "file saved");
        self.written.push(destination.clone());
        Some(destination)
    }
}

fn write_file(destination: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(destination, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reassembler(dir: &TempDir) -> Reassembler {
        Reassembler::new(dir.path(), ReassemblerConfig::default())
    }

    fn read(dir: &TempDir, relative: &str) -> String {
        std::fs::read_to_string(dir.path().join(relative)).expect("read received file")
    }

    #[test]
    fn test_two_file_session() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        let stream = [
            "PATH:a.txt",
            "FILE:a.txt|LINE:0\nline1\nline2\n",
            "FILE:a.txt|LINE:0\nline1\nline2\n",
            "PATH:b.txt",
            "FILE:b.txt|LINE:0\nhello\n",
        ];
        for raw in stream {
            rx.accept(raw);
        }
        let written = rx.finish();

        assert_eq!(read(&temp_dir, "a.txt"), "line1\nline2\n");
        assert_eq!(read(&temp_dir, "b.txt"), "hello\n");
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn test_duplicate_is_noop() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        assert_eq!(
            rx.accept("FILE:a.txt|LINE:0\ncontent\n"),
            Disposition::ChunkBuffered
        );
        assert_eq!(
            rx.accept("FILE:a.txt|LINE:0\ncontent\n"),
            Disposition::Duplicate
        );
        rx.finish();

        assert_eq!(read(&temp_dir, "a.txt"), "content\n");
    }

    #[test]
    fn test_marker_boundary_flushes_previous_in_full() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:0\nfirst\n");
        rx.accept("FILE:a.txt|LINE:1\nsecond\n");
        rx.accept("PATH:b.txt");

        // a.txt is on disk before any b.txt content arrives.
        assert_eq!(read(&temp_dir, "a.txt"), "first\nsecond\n");
        assert_eq!(rx.current_target(), Some("b.txt"));
    }

    #[test]
    fn test_out_of_order_chunks_sorted_by_start_line() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:2\nthird\n");
        rx.accept("FILE:a.txt|LINE:0\nfirst\nsecond\n");
        rx.finish();

        assert_eq!(read(&temp_dir, "a.txt"), "first\nsecond\nthird\n");
    }

    #[test]
    fn test_idle_flush_happens_exactly_once() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:0\ndata\n");

        let later = Instant::now() + Duration::from_secs(6);
        let flushed = rx.tick(later);
        assert_eq!(flushed, Some(temp_dir.path().join("a.txt")));
        assert_eq!(read(&temp_dir, "a.txt"), "data\n");
        assert_eq!(rx.current_target(), None);

        // Nothing left to flush; further ticks are no-ops.
        assert_eq!(rx.tick(later + Duration::from_secs(6)), None);
    }

    #[test]
    fn test_tick_before_timeout_does_nothing() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:0\ndata\n");

        assert_eq!(rx.tick(Instant::now()), None);
        assert_eq!(rx.current_target(), Some("a.txt"));
    }

    #[test]
    fn test_late_duplicate_does_not_reopen_flushed_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:0\ndata\n");
        rx.tick(Instant::now() + Duration::from_secs(6));

        // The same frames keep being captured after the flush.
        assert_eq!(rx.accept("FILE:a.txt|LINE:0\ndata\n"), Disposition::Duplicate);
        assert_eq!(rx.accept("PATH:a.txt"), Disposition::Duplicate);
        assert_eq!(rx.current_target(), None);
        assert_eq!(read(&temp_dir, "a.txt"), "data\n");
    }

    #[test]
    fn test_chunk_without_marker_is_dropped() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        assert_eq!(
            rx.accept("FILE:orphan.txt|LINE:0\nlost\n"),
            Disposition::ChunkDropped
        );
        assert!(rx.finish().is_empty());
    }

    #[test]
    fn test_mismatched_filename_is_dropped() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        assert_eq!(
            rx.accept("FILE:other.txt|LINE:0\nnope\n"),
            Disposition::ChunkDropped
        );
        rx.finish();

        assert!(!temp_dir.path().join("a.txt").exists());
        assert!(!temp_dir.path().join("other.txt").exists());
    }

    #[test]
    fn test_chunk_may_use_bare_filename_of_nested_target() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:sub/dir/a.txt");
        assert_eq!(
            rx.accept("FILE:a.txt|LINE:0\nnested\n"),
            Disposition::ChunkBuffered
        );
        rx.finish();

        assert_eq!(read(&temp_dir, "sub/dir/a.txt"), "nested\n");
    }

    #[test]
    fn test_plain_text_is_never_written() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:a.txt");
        assert_eq!(rx.accept("hello from the other side"), Disposition::Plain);
        assert!(rx.finish().is_empty());
        assert!(!temp_dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_traversal_marker_never_escapes_output_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let out = temp_dir.path().join("out");
        let mut rx = Reassembler::new(&out, ReassemblerConfig::default());

        rx.accept("PATH:../escape.txt");
        rx.accept("FILE:../escape.txt|LINE:0\nowned\n");
        let written = rx.finish();

        assert!(written.is_empty());
        assert!(!temp_dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_marker_without_content_creates_no_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        rx.accept("PATH:empty.txt");
        assert!(rx.finish().is_empty());
        assert!(!temp_dir.path().join("empty.txt").exists());
    }

    #[test]
    fn test_flush_overwrites_existing_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        std::fs::write(temp_dir.path().join("a.txt"), "stale").expect("seed file");

        let mut rx = reassembler(&temp_dir);
        rx.accept("PATH:a.txt");
        rx.accept("FILE:a.txt|LINE:0\nfresh\n");
        rx.finish();

        assert_eq!(read(&temp_dir, "a.txt"), "fresh\n");
    }

    struct ScriptedSource(Vec<Vec<String>>);

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<Vec<String>> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    #[test]
    fn test_run_drives_full_session() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut rx = reassembler(&temp_dir);

        let frames = vec![
            vec!["PATH:a.txt".to_string()],
            // Same chunk captured twice in one frame.
            vec![
                "FILE:a.txt|LINE:0\nhello\n".to_string(),
                "FILE:a.txt|LINE:0\nhello\n".to_string(),
            ],
            vec![],
            vec!["FILE:a.txt|LINE:1\nworld\n".to_string()],
        ];
        let mut source = ScriptedSource(frames);

        let summary = rx.run(&mut source);

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.files_written, vec![temp_dir.path().join("a.txt")]);
        assert_eq!(read(&temp_dir, "a.txt"), "hello\nworld\n");
    }
}
