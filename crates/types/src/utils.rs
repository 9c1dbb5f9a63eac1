//! Utility functions and helpers

/// Placeholder printed instead of a secret value
pub const REDACTED: &str = "<redacted>";

/// Mask a secret for logging; empty secrets stay empty so "unset" is still visible
pub fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        REDACTED
    }
}

/// Check that an address carries an http or https scheme
pub fn has_http_scheme(address: &str) -> bool {
    address.starts_with("http://") || address.starts_with("https://")
}

/// Split a comma separated list without trimming or dropping empty segments
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}
