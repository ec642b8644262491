//! # Startup argument decoding.
//!
//! The host hands arguments as UTF-16 strings. Decoding is length-checked:
//! each argument is bounded by its own slice (and by its first NUL, if the
//! host included the terminator), and the number of arguments is whatever the
//! host supplied. Invalid UTF-16 is replaced with U+FFFD rather than rejected.

/// Decodes `raw` into strings, preserving order.
pub fn decode_args(raw: &[Vec<u16>]) -> Vec<String> {
    raw.iter().map(|arg| decode_wide(arg)).collect()
}

fn decode_wide(wide: &[u16]) -> String {
    let end = wide.iter().position(|&unit| unit == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

/// Encodes `s` in the host's wide form (no terminator).
pub fn encode_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}
