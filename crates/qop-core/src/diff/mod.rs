//! Byte-exact directory comparison.
//!
//! A transfer has no acknowledgment channel, so verification happens after
//! the fact: run the receiver's output directory against the sender's
//! source tree. The comparison is structural (every file and directory,
//! by relative path) and then byte-exact for files present on both sides.
//!
//! This tool is independent of the optical protocol; it reads both trees
//! directly from disk.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::file::wire_path;

/// The outcome of comparing two directory trees.
///
/// Directories are listed with a trailing `/` to distinguish an empty
/// directory from a file of the same name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffReport {
    /// Entries present only under the first root
    pub only_in_first: Vec<String>,
    /// Entries present only under the second root
    pub only_in_second: Vec<String>,
    /// Files present in both trees with differing bytes
    pub content_mismatch: Vec<String>,
}

impl DiffReport {
    /// True iff the trees are structurally and byte-for-byte identical.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.only_in_first.is_empty()
            && self.only_in_second.is_empty()
            && self.content_mismatch.is_empty()
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.only_in_first.is_empty() {
            writeln!(f, "only in the first directory:")?;
            for entry in &self.only_in_first {
                writeln!(f, "  + {entry}")?;
            }
        }
        if !self.only_in_second.is_empty() {
            writeln!(f, "only in the second directory:")?;
            for entry in &self.only_in_second {
                writeln!(f, "  - {entry}")?;
            }
        }
        if !self.content_mismatch.is_empty() {
            writeln!(f, "files with different content:")?;
            for entry in &self.content_mismatch {
                writeln!(f, "  ! {entry}")?;
            }
        }
        Ok(())
    }
}

/// Compare two directory trees.
///
/// # Errors
///
/// Fails fast if either path does not exist or is not a directory.
/// Differences are not errors; they are recorded in the returned report.
pub fn compare_directories(first: &Path, second: &Path) -> Result<DiffReport> {
    let first_entries = tree_entries(first)?;
    let second_entries = tree_entries(second)?;

    let mut report = DiffReport {
        only_in_first: first_entries
            .iter()
            .filter(|e| !second_entries.contains(*e))
            .cloned()
            .collect(),
        only_in_second: second_entries
            .iter()
            .filter(|e| !first_entries.contains(*e))
            .cloned()
            .collect(),
        content_mismatch: Vec::new(),
    };

    for entry in &first_entries {
        if entry.ends_with('/') || !second_entries.contains(entry) {
            continue;
        }
        let a = first.join(entry);
        let b = second.join(entry);
        if !a.is_file() || !b.is_file() {
            continue;
        }
        if !files_equal(&a, &b)? {
            report.content_mismatch.push(entry.clone());
        }
    }

    report.only_in_first.sort();
    report.only_in_second.sort();
    report.content_mismatch.sort();

    Ok(report)
}

/// Every entry under `root` as a sorted list of relative wire paths,
/// directories suffixed with `/`.
fn tree_entries(root: &Path) -> Result<Vec<String>> {
    if !root.exists() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let mut name = wire_path(relative);
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }

    entries.sort();
    Ok(entries)
}

/// Byte-exact comparison with fixed-size buffered reads.
fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    let mut reader_a = std::fs::File::open(a)?;
    let mut reader_b = std::fs::File::open(b)?;

    let mut buf_a = [0u8; crate::DIFF_BUFFER_SIZE];
    let mut buf_b = [0u8; crate::DIFF_BUFFER_SIZE];

    loop {
        let n_a = read_full(&mut reader_a, &mut buf_a)?;
        let n_b = read_full(&mut reader_b, &mut buf_b)?;

        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
