//! File mode strings.
//!
//! Accepted forms: `0o600` / `0O600` (octal), `0600` (leading zero,
//! octal), and plain decimal such as `384`.  The empty string selects
//! the caller's default.  Anything above `0o777` is rejected.

use crate::errors::{Result, SecretsError};

/// Highest permission bits a mode string may set.
pub const MAX_MODE: u32 = 0o777;

/// Parse a mode string, returning `default` when it is empty.
pub fn parse_mode(input: &str, default: u32) -> Result<u32> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(default);
    }

    let invalid = || SecretsError::InvalidMode(input.to_string());

    let (digits, radix) = if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (oct, 8)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let mode = u32::from_str_radix(digits, radix).map_err(|_| invalid())?;
    if mode > MAX_MODE {
        return Err(invalid());
    }
    Ok(mode)
}

/// Parse an optional mode string.
pub fn parse_mode_opt(input: Option<&str>, default: u32) -> Result<u32> {
    parse_mode(input.unwrap_or_default(), default)
}

/// Render a mode as `0o644`.
pub fn format_mode(mode: u32) -> String {
    format!("{mode:#o}")
}
