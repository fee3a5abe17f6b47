//! In-memory backend
//!
//! Implements the same contract as the HTTP backend without a server. Used
//! for offline mode and as the backend in tests. A new talk starts with an
//! assistant greeting, and a reply is persisted only after its stream has
//! been delivered in full.

use async_stream::stream;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    backend::{Backend, ByteStream},
    error::{Error, Result},
    types::{Message, ReplySnapshot, Talk, TalkId},
};

/// Default greeting placed in every new talk
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// Longest generated title, in characters
pub const MAX_TITLE_CHARS: usize = 15;

/// Produces the assistant reply from the history and the new user message
pub type Responder = Arc<dyn Fn(&[Message], &str) -> String + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    talks: Vec<Talk>,
    fail_next_send: bool,
}

/// Talk backend that keeps everything in memory
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    greeting: String,
    responder: Responder,
    chunk_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend that echoes user messages
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            greeting: DEFAULT_GREETING.to_string(),
            responder: Arc::new(|_, message| format!("You said: {}", message)),
            chunk_size: 7,
        }
    }

    /// Set the greeting placed in new talks
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Set the function producing replies
    pub fn with_responder(
        mut self,
        responder: impl Fn(&[Message], &str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Set how many bytes of the reply body each chunk carries
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Make the next `send_message` fail with a 500 status
    pub fn fail_next_send(&self) {
        self.state.lock().fail_next_send = true;
    }

    /// Snapshot of the stored talks
    pub fn talks(&self) -> Vec<Talk> {
        self.state.lock().talks.clone()
    }

    /// Snapshot of one stored talk
    pub fn talk(&self, id: &TalkId) -> Option<Talk> {
        self.state.lock().talks.iter().find(|t| &t.id == id).cloned()
    }
}

/// Render the reply as cumulative snapshot lines, one per word
fn snapshot_body(reply: &str) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut accumulated = String::new();
    for word in reply.split_inclusive(' ') {
        accumulated.push_str(word);
        serde_json::to_writer(&mut body, &ReplySnapshot::new(accumulated.as_str()))?;
        body.push(b'\n');
    }
    Ok(body)
}

/// Derive a short title from the first user message
fn title_from(messages: &[Message]) -> String {
    let first = messages
        .iter()
        .find(|m| m.is_user())
        .map(|m| m.content.trim())
        .unwrap_or_default();
    let title: String = first.chars().take(MAX_TITLE_CHARS).collect();
    if title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        title.trim().to_string()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_talks(&self) -> Result<Vec<Talk>> {
        Ok(self.talks())
    }

    async fn create_talk(&self, title: &str) -> Result<Talk> {
        let mut talk = Talk::new(uuid::Uuid::new_v4().to_string(), title);
        talk.messages.push(Message::assistant(self.greeting.clone()));
        self.state.lock().talks.push(talk.clone());
        Ok(talk)
    }

    async fn delete_talk(&self, id: &TalkId) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.talks.len();
        state.talks.retain(|t| &t.id != id);
        if state.talks.len() == before {
            return Err(Error::TalkNotFound(id.clone()));
        }
        Ok(())
    }

    async fn send_message(&self, id: &TalkId, message: &str) -> Result<ByteStream> {
        let reply = {
            let mut state = self.state.lock();
            if std::mem::take(&mut state.fail_next_send) {
                return Err(Error::status(500, ""));
            }
            let talk = state
                .talks
                .iter()
                .find(|t| &t.id == id)
                .ok_or_else(|| Error::TalkNotFound(id.clone()))?;
            (self.responder)(&talk.messages, message)
        };

        let body = snapshot_body(&reply)?;
        let chunks: Vec<Vec<u8>> = body.chunks(self.chunk_size).map(<[u8]>::to_vec).collect();

        let state = Arc::clone(&self.state);
        let id = id.clone();
        let user = Message::user(message);
        Ok(Box::pin(stream! {
            for chunk in chunks {
                yield Ok(chunk);
            }

            // Persist only once the whole reply went out
            let mut state = state.lock();
            if let Some(talk) = state.talks.iter_mut().find(|t| t.id == id) {
                talk.messages.push(user);
                talk.messages.push(Message::assistant(reply));
            }
        }))
    }

    async fn generate_title(&self, id: &TalkId) -> Result<String> {
        let mut state = self.state.lock();
        let talk = state
            .talks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| Error::TalkNotFound(id.clone()))?;
        let title = title_from(&talk.messages);
        talk.title = title.clone();
        Ok(title)
    }

    async fn rename_talk(&self, id: &TalkId, title: &str) -> Result<()> {
        let mut state = self.state.lock();
        let talk = state
            .talks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| Error::TalkNotFound(id.clone()))?;
        talk.title = title.to_string();
        Ok(())
    }
}
