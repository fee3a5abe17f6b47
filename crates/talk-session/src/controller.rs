//! Session controller: talk lifecycle and the send cycle

use std::sync::Arc;

use futures::StreamExt;
use talk_api::{Backend, Message, Role, Talk, TalkId, decode_stream};
use tokio::sync::broadcast;

use crate::{
    config::SessionConfig,
    error::{Error, Result},
    events::SessionEvent,
    presenter::{NullPresenter, Presenter, RefreshReason},
    store::TalkStore,
    title::{TitleTasks, TitleUpdate},
};

/// A send cycle that passed the guard: the user message and the placeholder
/// are already in the talk, and the session is receiving.
#[derive(Debug)]
pub struct SendCycle {
    talk_id: TalkId,
    message: String,
}

impl SendCycle {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was sent: blank text, no selected talk, or a cycle in flight
    Ignored,
    /// The reply stream completed
    Completed { title_requested: bool },
    /// The request or the stream failed; the reply shows the error notice
    Failed { error: String },
}

/// Owns the talks and drives every state change of the session
pub struct SessionController {
    config: SessionConfig,
    backend: Arc<dyn Backend>,
    store: TalkStore,
    draft: String,
    receiving: bool,
    titles: TitleTasks,
    presenter: Box<dyn Presenter>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a controller with an empty talk list
    pub fn new(config: SessionConfig, backend: Arc<dyn Backend>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            backend,
            store: TalkStore::new(),
            draft: String::new(),
            receiving: false,
            titles: TitleTasks::new(),
            presenter: Box::new(NullPresenter),
            event_tx,
        }
    }

    /// Set the presenter
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn talks(&self) -> &[Talk] {
        self.store.list()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.store.selected_index()
    }

    pub fn selected_talk(&self) -> Option<&Talk> {
        self.store.selected()
    }

    /// Whether a send cycle is in flight
    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Current compose text
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Lines the compose box needs for the current draft
    pub fn draft_rows(&self) -> usize {
        self.draft.matches('\n').count() + 1
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn refresh(&mut self, id: &TalkId, reason: RefreshReason) {
        if let Some(talk) = self.store.find(id) {
            self.presenter.refresh(talk, reason);
        }
    }

    fn refresh_selected(&mut self) {
        self.emit(SessionEvent::TalkSelected {
            index: self.store.selected_index(),
        });
        if let Some(talk) = self.store.selected() {
            self.presenter.refresh(talk, RefreshReason::Selected);
        }
    }

    // ---- Talk lifecycle ----

    /// Load talks from the backend; creates a talk if there are none
    pub async fn initialize(&mut self) -> Result<()> {
        let talks = self.backend.list_talks().await?;
        tracing::info!("Loaded {} talks", talks.len());
        self.emit(SessionEvent::TalksLoaded { count: talks.len() });
        self.store.replace_all(talks);
        self.refresh_selected();

        if self.store.is_empty() {
            self.open_talk().await?;
        }
        Ok(())
    }

    /// Create a talk with the default title and select it
    pub async fn create_talk(&mut self) -> Result<usize> {
        if self.store.len() >= self.config.max_talks {
            return Err(Error::TalkLimit(self.config.max_talks));
        }
        self.open_talk().await
    }

    async fn open_talk(&mut self) -> Result<usize> {
        let previous = self.store.selected_index();
        self.store.deselect();
        self.emit(SessionEvent::TalkSelected { index: None });

        match self.backend.create_talk(&self.config.default_title).await {
            Ok(talk) => {
                let talk_id = talk.id.clone();
                let index = self.store.add(talk);
                tracing::info!("Created talk {}", talk_id);
                self.emit(SessionEvent::TalkCreated { talk_id });
                self.refresh_selected();
                Ok(index)
            }
            Err(e) => {
                if let Some(index) = previous {
                    self.store.select(index);
                }
                self.emit(SessionEvent::TalkSelected {
                    index: self.store.selected_index(),
                });
                Err(e.into())
            }
        }
    }

    /// Select the talk at `index`
    pub fn select_talk(&mut self, index: usize) -> Result<()> {
        if !self.store.select(index) {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.store.len(),
            });
        }
        self.refresh_selected();
        Ok(())
    }

    /// Delete the talk at `index`.
    ///
    /// The backend request is not awaited. If this was the last talk, a new
    /// default talk is created before returning.
    pub async fn delete_talk(&mut self, index: usize) -> Result<()> {
        let len = self.store.len();
        let talk = self
            .store
            .remove(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        self.titles.cancel(&talk.id);

        let backend = Arc::clone(&self.backend);
        let talk_id = talk.id.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.delete_talk(&talk_id).await {
                tracing::warn!("Failed to delete talk {}: {}", talk_id, e);
            }
        });
        self.emit(SessionEvent::TalkDeleted { talk_id: talk.id });

        if self.store.is_empty() {
            self.open_talk().await?;
        } else {
            self.refresh_selected();
        }
        Ok(())
    }

    /// Rename the selected talk.
    ///
    /// The title is trimmed; a blank title is ignored and returns false.
    /// A renamed talk never gets a generated title.
    pub async fn rename_talk(&mut self, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        let talk = self.store.selected_mut().ok_or(Error::NoSelection)?;
        talk.title = title.to_string();
        let talk_id = talk.id.clone();

        self.titles.cancel(&talk_id);
        self.titles.mark_requested(&talk_id);
        self.emit(SessionEvent::TitleChanged {
            talk_id: talk_id.clone(),
            title: title.to_string(),
        });
        self.refresh(&talk_id, RefreshReason::TitleChanged);

        self.backend.rename_talk(&talk_id, title).await?;
        Ok(true)
    }

    // ---- Send cycle ----

    /// Enter the sending state for `text`.
    ///
    /// Returns `None` without touching any state when the trimmed text is
    /// empty, a cycle is already in flight, or no talk is selected.
    /// Otherwise the user message and the placeholder are appended, the
    /// draft is cleared, and the session is receiving.
    pub fn begin_send(&mut self, text: &str) -> Option<SendCycle> {
        let message = text.trim();
        if self.receiving || message.is_empty() {
            return None;
        }
        let user = Message::user(message);
        let placeholder = Message::assistant(self.config.in_progress_text.clone());

        let talk = self.store.selected_mut()?;
        let talk_id = talk.id.clone();
        talk.messages.push(user.clone());
        talk.messages.push(placeholder.clone());

        self.draft.clear();
        self.receiving = true;
        tracing::debug!("Sending message to talk {}", talk_id);

        self.emit(SessionEvent::MessageAppended {
            talk_id: talk_id.clone(),
            message: user,
        });
        self.emit(SessionEvent::MessageAppended {
            talk_id: talk_id.clone(),
            message: placeholder,
        });
        self.emit(SessionEvent::ReceivingChanged { receiving: true });

        Some(SendCycle {
            talk_id,
            message: message.to_string(),
        })
    }

    /// Stream the reply for a cycle started with [`begin_send`](Self::begin_send)
    /// and return to idle.
    ///
    /// Request and decode failures end up as the error notice in the reply;
    /// they are never returned as errors.
    pub async fn run_cycle(&mut self, cycle: SendCycle) -> CycleOutcome {
        let result = self.stream_reply(&cycle).await;

        self.receiving = false;
        self.emit(SessionEvent::ReceivingChanged { receiving: false });
        let talk_id = cycle.talk_id;

        match result {
            Ok(()) => {
                tracing::debug!("Reply for talk {} complete", talk_id);
                self.emit(SessionEvent::CycleCompleted {
                    talk_id: talk_id.clone(),
                });
                self.refresh(&talk_id, RefreshReason::Settled);
                let title_requested = self.maybe_generate_title(&talk_id);
                CycleOutcome::Completed { title_requested }
            }
            Err(e) => {
                if e.is_protocol() {
                    tracing::warn!("Malformed reply for talk {}: {}", talk_id, e);
                } else {
                    tracing::warn!("Send cycle for talk {} failed: {}", talk_id, e);
                }
                let notice = self.config.error_text.clone();
                self.replace_reply(&talk_id, notice);
                self.emit(SessionEvent::CycleFailed {
                    talk_id: talk_id.clone(),
                    error: e.to_string(),
                });
                self.refresh(&talk_id, RefreshReason::Settled);
                CycleOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Send `text` to the selected talk and stream the reply
    pub async fn submit(&mut self, text: &str) -> CycleOutcome {
        match self.begin_send(text) {
            Some(cycle) => self.run_cycle(cycle).await,
            None => CycleOutcome::Ignored,
        }
    }

    /// Send the current draft
    pub async fn submit_draft(&mut self) -> CycleOutcome {
        let text = self.draft.clone();
        self.submit(&text).await
    }

    async fn stream_reply(&mut self, cycle: &SendCycle) -> talk_api::Result<()> {
        let body = self
            .backend
            .send_message(&cycle.talk_id, &cycle.message)
            .await?;
        let mut replies = decode_stream(body);

        while let Some(snapshot) = replies.next().await {
            if let Some(text) = snapshot?.text() {
                self.replace_reply(&cycle.talk_id, text.to_string());
            }
        }
        Ok(())
    }

    /// Overwrite the trailing assistant message of a talk
    fn replace_reply(&mut self, id: &TalkId, content: String) {
        let Some(talk) = self.store.find_mut(id) else {
            return;
        };
        let Some(reply) = talk
            .messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
        else {
            return;
        };
        reply.content = content.clone();

        let _ = self.event_tx.send(SessionEvent::ReplyUpdated {
            talk_id: id.clone(),
            content,
        });
        self.presenter.refresh(talk, RefreshReason::ReplyUpdated);
    }

    // ---- Title generation ----

    fn maybe_generate_title(&mut self, id: &TalkId) -> bool {
        let Some(talk) = self.store.find(id) else {
            return false;
        };
        if self.titles.was_requested(id)
            || talk.messages.len() > self.config.title_max_messages
            || talk.title != self.config.default_title
        {
            return false;
        }
        tracing::debug!("Generating title for talk {}", id);
        self.titles.spawn(Arc::clone(&self.backend), id.clone());
        true
    }

    /// Number of title requests still running
    pub fn pending_titles(&self) -> usize {
        self.titles.pending()
    }

    /// Apply every finished title request without waiting; returns how many
    /// titles changed
    pub fn apply_title_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Some(update) = self.titles.try_next() {
            if self.apply_title(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next title request to finish and apply it.
    ///
    /// Returns false immediately when no request is running, and false when
    /// the result could not be applied.
    pub async fn next_title_update(&mut self) -> bool {
        if self.titles.pending() == 0 {
            return false;
        }
        match self.titles.next().await {
            Some(update) => self.apply_title(update),
            None => false,
        }
    }

    fn apply_title(&mut self, update: TitleUpdate) -> bool {
        let TitleUpdate { talk_id, result } = update;
        if !self.titles.finish(&talk_id) {
            tracing::debug!("Dropping title for talk {}: request was cancelled", talk_id);
            return false;
        }
        let title = match result {
            Ok(title) => title.trim().to_string(),
            Err(e) => {
                tracing::warn!("Title generation for talk {} failed: {}", talk_id, e);
                return false;
            }
        };
        if title.is_empty() {
            return false;
        }
        let Some(talk) = self.store.find_mut(&talk_id) else {
            tracing::debug!("Dropping title for talk {}: talk is gone", talk_id);
            return false;
        };
        talk.title = title.clone();

        self.emit(SessionEvent::TitleChanged {
            talk_id: talk_id.clone(),
            title,
        });
        self.refresh(&talk_id, RefreshReason::TitleChanged);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use talk_api::{ByteStream, MemoryBackend};
    use tokio::sync::Notify;

    /// Wraps a MemoryBackend, optionally replacing the next reply body and
    /// holding title requests until released.
    struct ScriptedBackend {
        inner: MemoryBackend,
        next_body: Mutex<Option<Vec<&'static str>>>,
        title: String,
        title_calls: AtomicUsize,
        title_gate: Option<Arc<Notify>>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::new(),
                next_body: Mutex::new(None),
                title: "Generated".to_string(),
                title_calls: AtomicUsize::new(0),
                title_gate: None,
            }
        }

        fn with_body(self, chunks: Vec<&'static str>) -> Self {
            *self.next_body.lock() = Some(chunks);
            self
        }

        fn with_title_gate(mut self, gate: Arc<Notify>) -> Self {
            self.title_gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn list_talks(&self) -> talk_api::Result<Vec<Talk>> {
            self.inner.list_talks().await
        }

        async fn create_talk(&self, title: &str) -> talk_api::Result<Talk> {
            self.inner.create_talk(title).await
        }

        async fn delete_talk(&self, id: &TalkId) -> talk_api::Result<()> {
            self.inner.delete_talk(id).await
        }

        async fn send_message(&self, id: &TalkId, message: &str) -> talk_api::Result<ByteStream> {
            let scripted = self.next_body.lock().take();
            match scripted {
                Some(chunks) => Ok(Box::pin(async_stream::stream! {
                    for chunk in chunks {
                        yield Ok::<_, talk_api::Error>(chunk.as_bytes().to_vec());
                    }
                })),
                None => self.inner.send_message(id, message).await,
            }
        }

        async fn generate_title(&self, _id: &TalkId) -> talk_api::Result<String> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.title_gate {
                gate.notified().await;
            }
            Ok(self.title.clone())
        }

        async fn rename_talk(&self, id: &TalkId, title: &str) -> talk_api::Result<()> {
            self.inner.rename_talk(id, title).await
        }
    }

    /// Records every refresh request
    #[derive(Clone, Default)]
    struct RecordingPresenter {
        calls: Arc<Mutex<Vec<(TalkId, RefreshReason)>>>,
    }

    impl Presenter for RecordingPresenter {
        fn refresh(&mut self, talk: &Talk, reason: RefreshReason) {
            self.calls.lock().push((talk.id.clone(), reason));
        }
    }

    impl RecordingPresenter {
        fn reasons(&self) -> Vec<RefreshReason> {
            self.calls.lock().iter().map(|(_, r)| *r).collect()
        }
    }

    async fn ready(backend: Arc<dyn Backend>) -> SessionController {
        let mut controller = SessionController::new(SessionConfig::default(), backend);
        controller.initialize().await.unwrap();
        controller
    }

    fn messages(controller: &SessionController) -> &[Message] {
        &controller.selected_talk().unwrap().messages
    }

    // ===== Initialization and talk lifecycle =====

    #[tokio::test]
    async fn test_initialize_creates_talk_when_empty() {
        let controller = ready(Arc::new(MemoryBackend::new())).await;
        assert_eq!(controller.talks().len(), 1);
        assert_eq!(controller.selected_index(), Some(0));
        assert_eq!(controller.selected_talk().unwrap().title, "New chat");
    }

    #[tokio::test]
    async fn test_initialize_loads_existing_talks() {
        let backend = MemoryBackend::new();
        backend.create_talk("first").await.unwrap();
        backend.create_talk("second").await.unwrap();

        let controller = ready(Arc::new(backend.clone())).await;
        assert_eq!(controller.talks().len(), 2);
        assert_eq!(controller.selected_talk().unwrap().title, "first");
        assert_eq!(backend.talks().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_only_talk_leaves_fresh_default() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        let old_id = controller.talks()[0].id.clone();

        controller.delete_talk(0).await.unwrap();

        assert_eq!(controller.talks().len(), 1);
        assert_eq!(controller.selected_index(), Some(0));
        let talk = controller.selected_talk().unwrap();
        assert_eq!(talk.title, "New chat");
        assert_ne!(talk.id, old_id);
    }

    #[tokio::test]
    async fn test_delete_selected_moves_selection_back() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        controller.create_talk().await.unwrap();
        controller.create_talk().await.unwrap();
        let middle = controller.talks()[1].id.clone();
        assert_eq!(controller.selected_index(), Some(2));

        controller.delete_talk(2).await.unwrap();
        assert_eq!(controller.talks().len(), 2);
        assert_eq!(controller.selected_talk().unwrap().id, middle);
    }

    #[tokio::test]
    async fn test_delete_out_of_range() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        let err = controller.delete_talk(4).await.unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 4, len: 1 }));
        assert_eq!(controller.talks().len(), 1);
    }

    #[tokio::test]
    async fn test_create_talk_respects_limit() {
        let config = SessionConfig {
            max_talks: 2,
            ..Default::default()
        };
        let mut controller = SessionController::new(config, Arc::new(MemoryBackend::new()));
        controller.initialize().await.unwrap();
        assert_eq!(controller.create_talk().await.unwrap(), 1);
        assert!(matches!(
            controller.create_talk().await,
            Err(Error::TalkLimit(2))
        ));
        assert_eq!(controller.selected_index(), Some(1));
    }

    #[tokio::test]
    async fn test_select_talk_refreshes_presenter() {
        let presenter = RecordingPresenter::default();
        let mut controller =
            SessionController::new(SessionConfig::default(), Arc::new(MemoryBackend::new()))
                .with_presenter(presenter.clone());
        controller.initialize().await.unwrap();
        controller.create_talk().await.unwrap();
        presenter.calls.lock().clear();

        controller.select_talk(0).unwrap();
        let calls = presenter.calls.lock().clone();
        assert_eq!(calls, vec![(controller.talks()[0].id.clone(), RefreshReason::Selected)]);

        assert!(controller.select_talk(5).is_err());
        assert_eq!(controller.selected_index(), Some(0));
    }

    #[tokio::test]
    async fn test_rename_trims_and_persists() {
        let backend = MemoryBackend::new();
        let mut controller = ready(Arc::new(backend.clone())).await;

        assert!(controller.rename_talk("  Trip plans  ").await.unwrap());
        assert_eq!(controller.selected_talk().unwrap().title, "Trip plans");
        assert_eq!(backend.talks()[0].title, "Trip plans");

        assert!(!controller.rename_talk("   ").await.unwrap());
        assert_eq!(controller.selected_talk().unwrap().title, "Trip plans");
    }

    // ===== Send cycle =====

    #[tokio::test]
    async fn test_begin_send_appends_user_and_placeholder() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        controller.set_draft("  hi there \n");

        let draft = controller.draft().to_string();
        let cycle = controller.begin_send(&draft).unwrap();
        assert_eq!(cycle.message(), "hi there");
        assert!(controller.is_receiving());
        assert_eq!(controller.draft(), "");

        let msgs = messages(&controller);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1], Message::user("hi there"));
        assert_eq!(msgs[2], Message::assistant("Just a moment..."));

        let outcome = controller.run_cycle(cycle).await;
        assert!(matches!(outcome, CycleOutcome::Completed { .. }));
        assert!(!controller.is_receiving());
        assert_eq!(messages(&controller)[2], Message::assistant("You said: hi there"));
    }

    #[tokio::test]
    async fn test_submit_ignored_while_receiving() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        let cycle = controller.begin_send("first").unwrap();
        controller.set_draft("keep me");

        assert!(controller.begin_send("second").is_none());
        assert_eq!(controller.submit("second").await, CycleOutcome::Ignored);
        assert_eq!(messages(&controller).len(), 3);
        assert_eq!(controller.draft(), "keep me");
        assert!(controller.is_receiving());

        controller.run_cycle(cycle).await;
        assert_eq!(messages(&controller).len(), 3);
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        controller.set_draft(" \n\t ");
        assert_eq!(controller.submit_draft().await, CycleOutcome::Ignored);
        assert_eq!(messages(&controller).len(), 1);
        assert!(!controller.is_receiving());
        assert_eq!(controller.draft(), " \n\t ");
    }

    #[tokio::test]
    async fn test_snapshots_replace_reply() {
        let backend = ScriptedBackend::new().with_body(vec![
            "{\"content\":\"Hel\"}\n{\"content\":",
            "\"Hello\"}\n",
            "{\"content\":\"Hello!\"}\n",
        ]);
        let presenter = RecordingPresenter::default();
        let mut controller =
            SessionController::new(SessionConfig::default(), Arc::new(backend))
                .with_presenter(presenter.clone());
        controller.initialize().await.unwrap();
        presenter.calls.lock().clear();

        let outcome = controller.submit("greet me").await;
        assert!(matches!(outcome, CycleOutcome::Completed { .. }));

        let msgs = messages(&controller);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[2].content, "Hello!");
        assert_eq!(
            presenter.reasons(),
            vec![
                RefreshReason::ReplyUpdated,
                RefreshReason::ReplyUpdated,
                RefreshReason::ReplyUpdated,
                RefreshReason::Settled,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_snapshot_keeps_previous_content() {
        let backend = ScriptedBackend::new().with_body(vec![
            "{\"content\":\"partial\"}\n",
            "{\"content\":\"\"}\n{}\n",
        ]);
        let mut controller = ready(Arc::new(backend)).await;
        controller.submit("go").await;
        assert_eq!(messages(&controller)[2].content, "partial");
    }

    #[tokio::test]
    async fn test_backend_error_shows_notice() {
        let backend = MemoryBackend::new();
        let mut controller = ready(Arc::new(backend.clone())).await;
        backend.fail_next_send();

        let outcome = controller.submit("hello").await;
        assert!(matches!(outcome, CycleOutcome::Failed { .. }));
        assert!(!controller.is_receiving());

        let msgs = messages(&controller);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1], Message::user("hello"));
        assert_eq!(
            msgs[2].content,
            "An error occurred, so no reply could be produced."
        );
        assert_eq!(controller.pending_titles(), 0);
    }

    #[tokio::test]
    async fn test_decode_error_fails_cycle() {
        let backend = ScriptedBackend::new().with_body(vec!["{\"content\":\"Hel\"}\n", "oops\n"]);
        let mut controller = ready(Arc::new(backend)).await;

        let outcome = controller.submit("hello").await;
        assert!(matches!(outcome, CycleOutcome::Failed { .. }));
        assert_eq!(messages(&controller)[2].content, controller.config().error_text);
        assert!(!controller.is_receiving());
    }

    #[tokio::test]
    async fn test_cycle_events_in_order() {
        let mut controller = ready(Arc::new(MemoryBackend::new().with_chunk_size(64))).await;
        let mut events = controller.subscribe();
        let talk_id = controller.talks()[0].id.clone();

        controller.submit("ping").await;

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                SessionEvent::MessageAppended {
                    talk_id: talk_id.clone(),
                    message: Message::user("ping"),
                },
                SessionEvent::MessageAppended {
                    talk_id: talk_id.clone(),
                    message: Message::assistant("Just a moment..."),
                },
                SessionEvent::ReceivingChanged { receiving: true },
                SessionEvent::ReplyUpdated {
                    talk_id: talk_id.clone(),
                    content: "You ".to_string(),
                },
                SessionEvent::ReplyUpdated {
                    talk_id: talk_id.clone(),
                    content: "You said: ".to_string(),
                },
                SessionEvent::ReplyUpdated {
                    talk_id: talk_id.clone(),
                    content: "You said: ping".to_string(),
                },
                SessionEvent::ReceivingChanged { receiving: false },
                SessionEvent::CycleCompleted { talk_id },
            ]
        );
        assert!(received.last().unwrap().ends_cycle());
    }

    #[tokio::test]
    async fn test_draft_rows_and_clear() {
        let mut controller = ready(Arc::new(MemoryBackend::new())).await;
        controller.set_draft("one\ntwo\nthree");
        assert_eq!(controller.draft_rows(), 3);
        controller.submit_draft().await;
        assert_eq!(controller.draft(), "");
        assert_eq!(controller.draft_rows(), 1);
    }

    // ===== Title generation =====

    #[tokio::test]
    async fn test_title_generated_after_first_exchange() {
        let backend = MemoryBackend::new();
        let mut controller = ready(Arc::new(backend.clone())).await;

        let outcome = controller.submit("What is Rust?").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: true });
        assert!(controller.next_title_update().await);
        assert_eq!(controller.selected_talk().unwrap().title, "What is Rust?");
        assert_eq!(backend.talks()[0].title, "What is Rust?");

        let outcome = controller.submit("And Go?").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: false });
        assert!(!controller.next_title_update().await);
    }

    #[tokio::test]
    async fn test_title_requested_once_even_if_unchanged() {
        let backend = Arc::new(ScriptedBackend {
            title: "New chat".to_string(),
            ..ScriptedBackend::new()
        });
        let config = SessionConfig {
            title_max_messages: 10,
            ..Default::default()
        };
        let mut controller = SessionController::new(config, backend.clone());
        controller.initialize().await.unwrap();

        controller.submit("one").await;
        controller.next_title_update().await;
        let outcome = controller.submit("two").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: false });
        assert_eq!(backend.title_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_title_for_renamed_talk() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut controller = ready(backend.clone()).await;

        controller.rename_talk("Mine").await.unwrap();
        let outcome = controller.submit("hello").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: false });
        assert_eq!(controller.selected_talk().unwrap().title, "Mine");
        assert_eq!(backend.title_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_title_when_history_is_long() {
        let backend = MemoryBackend::new();
        let mut controller = ready(Arc::new(backend.clone())).await;

        backend.fail_next_send();
        assert!(matches!(
            controller.submit("first").await,
            CycleOutcome::Failed { .. }
        ));
        let outcome = controller.submit("second").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: false });
        assert_eq!(messages(&controller).len(), 5);
        assert_eq!(controller.selected_talk().unwrap().title, "New chat");
    }

    #[tokio::test]
    async fn test_title_dropped_after_talk_deleted() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend::new().with_title_gate(gate.clone()));
        let mut controller = ready(backend.clone()).await;

        let outcome = controller.submit("hello").await;
        assert_eq!(outcome, CycleOutcome::Completed { title_requested: true });
        assert_eq!(controller.pending_titles(), 1);

        controller.delete_talk(0).await.unwrap();
        assert_eq!(controller.pending_titles(), 0);

        gate.notify_one();
        tokio::task::yield_now().await;
        assert_eq!(controller.apply_title_updates(), 0);
        assert!(!controller.next_title_update().await);
        assert_eq!(controller.talks().len(), 1);
        assert_eq!(controller.selected_talk().unwrap().title, "New chat");
    }

    #[tokio::test]
    async fn test_title_result_after_rename_is_ignored() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend::new().with_title_gate(gate.clone()));
        let mut controller = ready(backend.clone()).await;

        controller.submit("hello").await;
        controller.rename_talk("Manual").await.unwrap();
        gate.notify_one();
        tokio::task::yield_now().await;

        assert_eq!(controller.apply_title_updates(), 0);
        assert_eq!(controller.selected_talk().unwrap().title, "Manual");
    }

    // ===== Contract with the backend =====

    #[tokio::test]
    async fn test_round_trip_matches_backend() {
        let backend = MemoryBackend::new();
        let mut controller = ready(Arc::new(backend.clone())).await;
        controller.submit("remember this").await;

        let mut reloaded = SessionController::new(SessionConfig::default(), Arc::new(backend));
        reloaded.initialize().await.unwrap();

        assert_eq!(reloaded.talks().len(), 1);
        assert_eq!(reloaded.talks()[0].id, controller.talks()[0].id);
        assert_eq!(reloaded.talks()[0].messages, controller.talks()[0].messages);
        assert_eq!(reloaded.talks()[0].messages.len(), 3);
    }
}
