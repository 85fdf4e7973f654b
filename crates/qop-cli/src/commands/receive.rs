//! Receive command implementation.
//!
//! The external QR scanner (camera or screen-capture based) is expected to
//! pipe every decoded payload to our stdin as a NUL-terminated record:
//! payloads contain newlines, so line framing would split them apart.
//!
//! A reader thread turns the blocking pipe into a channel; the receive
//! loop polls that channel on the scan cadence so the idle-timeout check
//! keeps running even when no new payloads arrive. Closing the pipe (the
//! scanner exiting) ends the session and triggers the final flush.

use std::io::BufRead;
use std::time::Duration;

use anyhow::Result;

use qop_core::receiver::{FrameSource, Reassembler, ReassemblerConfig};

use super::ReceiveArgs;

/// Adapts NUL-delimited records on stdin into capture frames.
struct StdinFrameSource {
    records: flume::Receiver<String>,
    scan_interval: Duration,
}

impl StdinFrameSource {
    fn spawn(scan_interval: Duration) -> Self {
        let (tx, rx) = flume::unbounded();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut reader = stdin.lock();
            let mut buf = Vec::new();

            loop {
                buf.clear();
                match reader.read_until(b'\0', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if buf.last() == Some(&0) {
                            buf.pop();
                        }
                        if buf.is_empty() {
                            continue;
                        }
                        let record = String::from_utf8_lossy(&buf).into_owned();
                        if tx.send(record).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "scanner pipe read failed, stopping");
                        break;
                    }
                }
            }
        });

        Self {
            records: rx,
            scan_interval,
        }
    }
}

impl FrameSource for StdinFrameSource {
    fn next_frame(&mut self) -> Option<Vec<String>> {
        match self.records.recv_timeout(self.scan_interval) {
            Ok(first) => {
                let mut frame = vec![first];
                frame.extend(self.records.try_iter());
                Some(frame)
            }
            Err(flume::RecvTimeoutError::Timeout) => Some(Vec::new()),
            Err(flume::RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Run the receive command.
pub fn run(args: ReceiveArgs) -> Result<()> {
    let global_config = super::load_config();

    let idle_timeout = args
        .idle_timeout
        .unwrap_or(global_config.receiver.idle_timeout);
    let scan_interval = args
        .scan_interval
        .unwrap_or(global_config.receiver.scan_interval);

    std::fs::create_dir_all(&args.output)?;

    println!("Receiving into {}", args.output.display());
    println!("Pipe NUL-delimited decoded payloads to stdin; close the pipe to finish.");
    println!();

    let mut reassembler = Reassembler::new(&args.output, ReassemblerConfig { idle_timeout });
    let mut source = StdinFrameSource::spawn(scan_interval);

    let summary = reassembler.run(&mut source);

    for path in &summary.files_written {
        println!("  saved {}", path.display());
    }
    println!();
    println!(
        "Received {} files from {} payloads ({} duplicate captures ignored)",
        summary.files_written.len(),
        summary.accepted,
        summary.duplicates
    );

    Ok(())
}
