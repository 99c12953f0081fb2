//! Centralized emoji + message helpers for consistent UX copy.

pub mod emoji {
    pub const CANCEL: &str = "🛑";
    pub const DISK: &str = "💾";
    pub const ERROR: &str = "❌";
    pub const SEARCH: &str = "🔍";
    pub const SUCCESS: &str = "✅";
}

pub fn with(emoji: &str, message: &str) -> String {
    format!("{} {}", emoji, message)
}
