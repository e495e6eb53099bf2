//! Notification type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Quote,    // Your name was quoted in a post
    Reaction, // Someone reacted to your post for the first time
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Reaction => "reaction",
        }
    }

    /// Verb phrase used when listing notifications.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Quote => "quoted you in",
            Self::Reaction => "reacted to your post in",
        }
    }
}

/// A stored kind string no variant matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNotificationKind(pub String);

impl fmt::Display for UnknownNotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification kind {:?}", self.0)
    }
}

impl std::error::Error for UnknownNotificationKind {}

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" => Ok(Self::Quote),
            "reaction" => Ok(Self::Reaction),
            _ => Err(UnknownNotificationKind(s.to_owned())),
        }
    }
}
