//! Animated spinner for the receiving status line

use crate::theme::Theme;
use ratatui::text::{Line, Span};
use std::time::{Duration, Instant};

/// Spinner animation frames
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Spinner whose frame follows the time since it started
#[derive(Debug, Clone, Copy)]
pub struct Spinner {
    start_time: Instant,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    /// Create a new spinner
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Frame shown after `elapsed`
    pub fn frame_at(elapsed: Duration) -> &'static str {
        let index = (elapsed.as_millis() / FRAME_DURATION.as_millis()) as usize;
        SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
    }

    /// Get the current frame based on elapsed time
    pub fn current_frame(&self) -> &'static str {
        Self::frame_at(self.start_time.elapsed())
    }

    /// Status line: current frame followed by `label`
    pub fn line(&self, label: &str, theme: &Theme) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{} ", self.current_frame()), theme.accent_style()),
            Span::styled(label.to_string(), theme.dim_style()),
        ])
    }
}
