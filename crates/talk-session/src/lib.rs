//! talk-session: Chat session state machine
//!
//! This crate owns the list of talks and drives the send cycle: a user
//! message is appended with an assistant placeholder, the streamed reply
//! replaces the placeholder in place, and a title is generated once the first
//! exchange completes.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod presenter;
pub mod store;
mod title;

pub use config::SessionConfig;
pub use controller::{CycleOutcome, SendCycle, SessionController};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use presenter::{NullPresenter, Presenter, RefreshReason};
pub use store::TalkStore;
