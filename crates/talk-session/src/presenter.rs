//! Hooks for the presentation layer
//!
//! The controller calls the presenter explicitly after every observable
//! transition. Presenters only render; they never feed back into the session.

use talk_api::Talk;

/// Why a talk is being refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// The talk became the selected one
    Selected,
    /// The in-progress reply got a new snapshot
    ReplyUpdated,
    /// A send cycle ended, successfully or not
    Settled,
    /// The talk title changed
    TitleChanged,
}

/// Receives rendering requests from the session controller
pub trait Presenter: Send {
    fn refresh(&mut self, talk: &Talk, reason: RefreshReason);
}

/// Presenter that renders nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn refresh(&mut self, _talk: &Talk, _reason: RefreshReason) {}
}
