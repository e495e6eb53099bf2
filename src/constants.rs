//! Application-wide constants

/// Maximum length for post content in characters
pub const MAX_POST_LENGTH: usize = 50_000;

/// Maximum length for topic and message titles in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Default username displayed for unauthenticated users
pub const GUEST_USERNAME: &str = "Guest";

/// Shown in place of the author of content whose account was deleted
pub const DELETED_USERNAME: &str = "Deleted user";
