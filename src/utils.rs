//! Common utilities shared across modules.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Colors handed out to new tags, in order.
pub const TAG_COLORS: [&str; 10] = [
    "#e06c75", "#e5c07b", "#98c379", "#56b6c2", "#61afef", "#c678dd", "#d19a66", "#be5046",
    "#7ec699", "#e06cb8",
];

/// Get current UTC timestamp in milliseconds since UNIX_EPOCH.
pub fn get_utc_timestamp_millis() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Random 64-bit identifier rendered as 16 hex digits.
pub fn generate_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

/// Color for the next tag, given how many tags already exist.
pub fn next_tag_color(existing: usize) -> &'static str {
    TAG_COLORS[existing % TAG_COLORS.len()]
}

/// SHA-256 of a file's content, hex encoded.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
