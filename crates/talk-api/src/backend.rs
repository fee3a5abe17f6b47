//! The talk backend contract

use crate::{Result, Talk, TalkId};
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// Raw body of a streamed reply, chunked however the transport delivers it
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Operations offered by a talk backend.
///
/// Talks are persisted by the backend; the client only mirrors them.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List every talk, oldest first
    async fn list_talks(&self) -> Result<Vec<Talk>>;

    /// Create a talk with the given title
    async fn create_talk(&self, title: &str) -> Result<Talk>;

    /// Delete a talk
    async fn delete_talk(&self, id: &TalkId) -> Result<()>;

    /// Post a user message and open the streamed reply.
    ///
    /// A non-success status is reported as an error before any byte of the
    /// body is read.
    async fn send_message(&self, id: &TalkId, message: &str) -> Result<ByteStream>;

    /// Ask the backend to generate a title from the talk history
    async fn generate_title(&self, id: &TalkId) -> Result<String>;

    /// Store a new title
    async fn rename_talk(&self, id: &TalkId, title: &str) -> Result<()>;
}
