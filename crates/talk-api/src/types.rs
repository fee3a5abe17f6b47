//! Core types shared with the talk backend

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned talk identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TalkId(String);

impl TalkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TalkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TalkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TalkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get a human-readable name for this role
    pub fn name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// One turn in a talk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// A conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    pub id: TalkId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Talk {
    pub fn new(id: impl Into<TalkId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
        }
    }

    /// The most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Body of `POST /talks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTalkRequest {
    pub title: String,
}

/// Body of `POST /talks/{id}/message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Body of `PUT /talk/{id}/title`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameTalkRequest {
    pub title: String,
}

/// One line of the streamed reply: the full reply text accumulated so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    #[serde(default)]
    pub content: Option<String>,
}

impl ReplySnapshot {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// The snapshot text, if it carries any
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}
