//! The qop wire grammar: what goes inside one QR code.
//!
//! Every QR code in a transfer carries exactly one payload string. The
//! grammar is deliberately plain text so that any off-the-shelf QR decoder
//! produces something a human can read back:
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────────┬───────────────────┐
//! │ Prefix  │ Grammar                                  │ Meaning           │
//! ├─────────┼──────────────────────────────────────────┼───────────────────┤
//! │ PATH:   │ PATH:<relative_path>                     │ begin new file    │
//! │ FILE:   │ FILE:<name>|LINE:<start>\n<raw lines...> │ content chunk     │
//! │ (none)  │ raw text                                 │ opaque message    │
//! └─────────┴──────────────────────────────────────────┴───────────────────┘
//! ```
//!
//! Decoding is pure and total: every input string maps to exactly one
//! [`Payload`] variant and never fails. A `FILE:` payload whose header does
//! not parse (a partial or misread scan) degrades to [`Payload::PlainText`]
//! instead of erroring, so a bad frame can never disturb an in-progress
//! reassembly.

use std::fmt;

/// Prefix announcing the start of a new logical file.
pub const PATH_PREFIX: &str = "PATH:";

/// Prefix carrying a chunk of file content.
pub const FILE_PREFIX: &str = "FILE:";

/// Separator between the filename and the starting line number in a
/// `FILE:` header.
pub const LINE_SEPARATOR: &str = "|LINE:";

/// One decoded unit of data carried by a single QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Announces the start of a new logical file. All subsequent content
    /// chunks belong to it until the next marker.
    PathMarker {
        /// Path of the file relative to the transfer root, `/`-separated
        relative_path: String,
    },
    /// A bounded slice of a file's lines.
    ContentChunk {
        /// File the slice belongs to; matches the active path marker
        filename: String,
        /// 0-based index of the slice's first line in the source file
        start_line: usize,
        /// Raw line content, trailing newlines preserved as read
        text: String,
    },
    /// Anything that matches neither prefix. Displayed or logged, never
    /// written to disk.
    PlainText {
        /// The raw scanned string
        text: String,
    },
}

impl Payload {
    /// Create a path marker payload.
    #[must_use]
    pub fn path_marker(relative_path: impl Into<String>) -> Self {
        Self::PathMarker {
            relative_path: relative_path.into(),
        }
    }

    /// Create a content chunk payload.
    #[must_use]
    pub fn content_chunk(
        filename: impl Into<String>,
        start_line: usize,
        text: impl Into<String>,
    ) -> Self {
        Self::ContentChunk {
            filename: filename.into(),
            start_line,
            text: text.into(),
        }
    }

    /// Encode the payload into the string placed inside a QR code.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::PathMarker { relative_path } => format!("{PATH_PREFIX}{relative_path}"),
            Self::ContentChunk {
                filename,
                start_line,
                text,
            } => format!("{FILE_PREFIX}{filename}{LINE_SEPARATOR}{start_line}\n{text}"),
            Self::PlainText { text } => text.clone(),
        }
    }

    /// Decode a raw scanned string into a payload.
    ///
    /// Total: every input maps to exactly one variant. A `PATH:` prefix is
    /// always a marker, with the remainder taken verbatim as the path. A
    /// `FILE:` header that is missing the `|LINE:` separator or carries an
    /// unparsable line number degrades to [`Payload::PlainText`].
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        if let Some(path) = raw.strip_prefix(PATH_PREFIX) {
            return Self::PathMarker {
                relative_path: path.to_string(),
            };
        }

        if let Some(rest) = raw.strip_prefix(FILE_PREFIX) {
            let (header, text) = match rest.split_once('\n') {
                Some((header, text)) => (header, text),
                None => (rest, ""),
            };

            if let Some((filename, line_str)) = header.split_once(LINE_SEPARATOR) {
                if let Ok(start_line) = line_str.trim().parse::<usize>() {
                    return Self::ContentChunk {
                        filename: filename.trim().to_string(),
                        start_line,
                        text: text.to_string(),
                    };
                }
            }

            tracing::debug!("malformed FILE payload treated as plain text");
        }

        Self::PlainText {
            text: raw.to_string(),
        }
    }

    /// Whether this payload carries file data (marker or chunk).
    #[must_use]
    pub const fn is_file_data(&self) -> bool {
        !matches!(self, Self::PlainText { .. })
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathMarker { relative_path } => write!(f, "path marker '{relative_path}'"),
            Self::ContentChunk {
                filename,
                start_line,
                ..
            } => write!(f, "chunk of '{filename}' from line {start_line}"),
            Self::PlainText { text } => {
                let preview: String = text.chars().take(40).collect();
                if text.chars().count() > 40 {
                    write!(f, "plain text '{preview}...'")
                } else {
                    write!(f, "plain text '{preview}'")
                }
            }
        }
    }
}
