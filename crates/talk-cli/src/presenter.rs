//! Terminal presenter: prints talks as the session changes

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use ratatui::text::{Line, Span};
use std::io::{self, Write};
use talk_api::Talk;
use talk_session::{Presenter, RefreshReason};
use talk_tui::{Spinner, Theme, render_message, render_transcript, write_lines};

/// Prints to a terminal (or any writer) in response to session refreshes.
///
/// While a reply streams in, a single status line is redrawn in place; the
/// finished reply is printed once, rendered as markdown.
pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    theme: Theme,
    width: usize,
    spinner: Option<Spinner>,
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, theme: Theme, width: usize) -> Self {
        Self {
            out,
            theme,
            width: width.max(20),
            spinner: None,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn clear_status(&mut self) -> io::Result<()> {
        if self.spinner.take().is_some() {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }
        Ok(())
    }

    fn status(&mut self, talk: &Talk) -> io::Result<()> {
        let spinner = *self.spinner.get_or_insert_with(Spinner::new);
        let chars = talk
            .last_message()
            .map(|m| m.content.chars().count())
            .unwrap_or_default();
        let line = spinner.line(&format!("receiving reply ({} chars)", chars), &self.theme);

        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        talk_tui::output::write_line(&mut self.out, &line)?;
        self.out.flush()
    }

    fn print(&mut self, talk: &Talk, reason: RefreshReason) -> io::Result<()> {
        match reason {
            RefreshReason::Selected => {
                self.clear_status()?;
                let lines = render_transcript(talk, &self.theme, self.width);
                write_lines(&mut self.out, &lines)
            }
            RefreshReason::ReplyUpdated => self.status(talk),
            RefreshReason::Settled => {
                self.clear_status()?;
                let Some(reply) = talk.last_message() else {
                    return Ok(());
                };
                let mut lines = render_message(reply, &self.theme, self.width);
                lines.push(Line::from(""));
                write_lines(&mut self.out, &lines)
            }
            RefreshReason::TitleChanged => {
                self.clear_status()?;
                let line = Line::from(vec![
                    Span::styled("Title: ", self.theme.dim_style()),
                    Span::styled(talk.title.clone(), self.theme.accent_style()),
                ]);
                write_lines(&mut self.out, &[line])
            }
        }
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn refresh(&mut self, talk: &Talk, reason: RefreshReason) {
        if let Err(e) = self.print(talk, reason) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}
