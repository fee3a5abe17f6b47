//! Background title generation, one cancellable task per talk

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use talk_api::{Backend, TalkId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Result of a title request
#[derive(Debug)]
pub(crate) struct TitleUpdate {
    pub talk_id: TalkId,
    pub result: talk_api::Result<String>,
}

/// Tracks in-flight title requests keyed by talk id
pub(crate) struct TitleTasks {
    pending: HashMap<TalkId, CancellationToken>,
    /// Talks that already had their one chance at a generated title
    requested: HashSet<TalkId>,
    tx: mpsc::UnboundedSender<TitleUpdate>,
    rx: mpsc::UnboundedReceiver<TitleUpdate>,
}

impl TitleTasks {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            pending: HashMap::new(),
            requested: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn was_requested(&self, id: &TalkId) -> bool {
        self.requested.contains(id)
    }

    /// Never auto-generate a title for this talk
    pub fn mark_requested(&mut self, id: &TalkId) {
        self.requested.insert(id.clone());
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Start generating a title for `id`
    pub fn spawn(&mut self, backend: Arc<dyn Backend>, id: TalkId) {
        self.requested.insert(id.clone());
        let token = CancellationToken::new();
        self.pending.insert(id.clone(), token.clone());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let request_id = id.clone();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Title generation for {} cancelled", id);
                }
                result = backend.generate_title(&request_id) => {
                    let _ = tx.send(TitleUpdate { talk_id: id, result });
                }
            }
        });
    }

    /// Cancel the request for `id`, if one is running
    pub fn cancel(&mut self, id: &TalkId) {
        if let Some(token) = self.pending.remove(id) {
            token.cancel();
        }
    }

    /// Mark the request for `id` as finished; false if it was cancelled
    pub fn finish(&mut self, id: &TalkId) -> bool {
        self.pending.remove(id).is_some()
    }

    /// Next finished request, without waiting
    pub fn try_next(&mut self) -> Option<TitleUpdate> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next finished request
    pub async fn next(&mut self) -> Option<TitleUpdate> {
        self.rx.recv().await
    }
}
