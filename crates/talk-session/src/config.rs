//! Session configuration

use serde::{Deserialize, Serialize};

/// Fixed texts and limits used by the session controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Title given to new talks; auto-generation only replaces this title
    pub default_title: String,
    /// Placeholder shown in the assistant message until the reply arrives
    pub in_progress_text: String,
    /// Text that replaces the placeholder when a send cycle fails
    pub error_text: String,
    /// Auto-generate a title only while the talk has at most this many messages
    pub title_max_messages: usize,
    /// Maximum number of talks the user may create
    pub max_talks: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_title: "New chat".to_string(),
            in_progress_text: "Just a moment...".to_string(),
            error_text: "An error occurred, so no reply could be produced.".to_string(),
            title_max_messages: 3,
            max_talks: 20,
        }
    }
}
