//! Session event types

use serde::{Deserialize, Serialize};
use talk_api::{Message, TalkId};

/// Observable state changes, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Talks were loaded from the backend
    TalksLoaded { count: usize },

    /// A talk was created and appended
    TalkCreated { talk_id: TalkId },

    /// A talk was removed
    TalkDeleted { talk_id: TalkId },

    /// The selection changed (`None` while a talk is being created)
    TalkSelected { index: Option<usize> },

    /// A message was appended to a talk
    MessageAppended { talk_id: TalkId, message: Message },

    /// The in-progress reply was replaced with a newer snapshot
    ReplyUpdated { talk_id: TalkId, content: String },

    /// A send cycle started or ended
    ReceivingChanged { receiving: bool },

    /// The reply stream finished
    CycleCompleted { talk_id: TalkId },

    /// The send cycle failed and the reply shows the error notice
    CycleFailed { talk_id: TalkId, error: String },

    /// A talk title changed, manually or by generation
    TitleChanged { talk_id: TalkId, title: String },
}

impl SessionEvent {
    /// Check if this event ends a send cycle
    pub fn ends_cycle(&self) -> bool {
        matches!(
            self,
            SessionEvent::CycleCompleted { .. } | SessionEvent::CycleFailed { .. }
        )
    }
}
