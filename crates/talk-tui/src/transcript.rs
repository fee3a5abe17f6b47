//! Chat transcript layout

use crate::markdown::render_markdown;
use crate::theme::Theme;
use ratatui::text::{Line, Span};
use talk_api::{Message, Role, Talk};

/// Render one message: a role header followed by the indented content.
///
/// Assistant replies are rendered as markdown, user messages are wrapped as
/// plain text.
pub fn render_message(message: &Message, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (style, prefix) = match message.role {
        Role::User => (theme.accent_bold(), "▶ "),
        Role::Assistant => (theme.assistant_bold(), "◀ "),
    };
    lines.push(Line::from(Span::styled(
        format!("{}{}", prefix, message.role.name()),
        style,
    )));

    let content_width = width.saturating_sub(2).max(1);
    match message.role {
        Role::Assistant => {
            for line in render_markdown(&message.content, theme, content_width) {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
        }
        Role::User => {
            for line in textwrap::wrap(&message.content, content_width) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", line),
                    theme.base_style(),
                )));
            }
        }
    }

    lines
}

/// Render a talk: its title, then every message separated by blank lines
pub fn render_transcript(talk: &Talk, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(talk.title.clone(), theme.accent_bold())),
        Line::from(Span::styled(
            "─".repeat(width.clamp(1, 60)),
            theme.dim_style(),
        )),
    ];
    for message in &talk.messages {
        lines.extend(render_message(message, theme, width));
        lines.push(Line::from(""));
    }
    lines
}
