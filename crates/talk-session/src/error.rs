//! Error types for talk-session

use thiserror::Error;

/// Result type alias using talk-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the backend layer
    #[error(transparent)]
    Api(#[from] talk_api::Error),

    /// No talk exists at this position
    #[error("No talk at index {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The operation needs a selected talk
    #[error("No talk is selected")]
    NoSelection,

    /// Creating another talk would exceed the configured limit
    #[error("Talk limit reached ({0} talks)")]
    TalkLimit(usize),
}
