//! talk-tui: Terminal presentation components
//!
//! Renders talks into styled ratatui lines and writes them to a terminal
//! with crossterm.

pub mod highlight;
pub mod markdown;
pub mod output;
pub mod spinner;
pub mod theme;
pub mod transcript;

pub use markdown::render_markdown;
pub use output::write_lines;
pub use spinner::Spinner;
pub use theme::Theme;
pub use transcript::{render_message, render_transcript};
