//! Repeat-count normalization for the optional positional argument.
use std::ffi::OsStr;

use tracing::debug;

/// Count used whenever the argument is absent, zero, or unusable.
pub const DEFAULT_COUNT: u64 = 1;

/// Turn the raw `[count]` argument into the number of UUIDs to print.
///
/// Parsing mirrors a C `strtoul(.., 10)` call: leading ASCII whitespace is
/// skipped, an optional `+` is accepted, and the longest run of decimal digits
/// that follows is used (`"12abc"` is 12). Anything that leaves no usable
/// positive value falls back to [`DEFAULT_COUNT`] instead of being an error:
///
/// - missing argument or non-UTF-8 bytes
/// - no leading digits (`"abc"`, `""`)
/// - a leading `-` (the count is unsigned)
/// - zero, or a value that overflows `u64`
pub fn parse_count(raw: Option<&OsStr>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_COUNT;
    };
    match raw.to_str().and_then(leading_unsigned) {
        Some(n) if n > 0 => n,
        _ => {
            debug!(arg = ?raw, "count unusable, defaulting to {}", DEFAULT_COUNT);
            DEFAULT_COUNT
        }
    }
}

fn leading_unsigned(s: &str) -> Option<u64> {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}
