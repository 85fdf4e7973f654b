//! UI utilities for the qop CLI.

use std::time::Duration;

/// Parse a duration string like "750ms", "2s", or "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(num_str) = s.strip_suffix("ms") {
        let num: u64 = num_str.trim().parse().ok()?;
        Some(Duration::from_millis(num))
    } else if let Some(num_str) = s.strip_suffix('s') {
        let num: u64 = num_str.trim().parse().ok()?;
        Some(Duration::from_secs(num))
    } else if let Some(num_str) = s.strip_suffix('m') {
        let num: u64 = num_str.trim().parse().ok()?;
        Some(Duration::from_secs(num * 60))
    } else {
        None
    }
}

/// clap value parser wrapper around [`parse_duration`].
pub fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}', expected e.g. 500ms, 2s, 1m"))
}

/// Single-line preview of a payload string, control characters escaped and
/// truncated to terminal width.
pub fn data_preview(data: &str, max_chars: usize) -> String {
    let escaped: String = data
        .chars()
        .map(|c| if c == '\n' { '⏎' } else { c })
        .collect();

    if escaped.chars().count() <= max_chars {
        escaped
    } else {
        let truncated: String = escaped.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
