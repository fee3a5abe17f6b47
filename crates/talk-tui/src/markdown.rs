//! Markdown rendering for terminal output

use crate::highlight::CodeHighlighter;
use crate::theme::Theme;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

/// Convert markdown text to styled ratatui Lines
///
/// Code block lines wider than `width` are cut at a character boundary and
/// marked with an ellipsis.
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(theme, width);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    for event in Parser::new_ext(text, options) {
        renderer.event(event);
    }
    renderer.finish()
}

enum ListKind {
    Bullet,
    Ordered(u64),
}

struct Renderer<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListKind>,
    quote_depth: usize,
    code: Option<CodeBlock>,
    link_url: Option<String>,
}

struct CodeBlock {
    highlighter: CodeHighlighter,
    content: String,
}

impl<'t> Renderer<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.base_style()],
            lists: Vec::new(),
            quote_depth: 0,
            code: None,
            link_url: None,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let patched = self.style().patch(style);
        self.styles.push(patched);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !is_blank(l)) {
            self.lines.push(Line::from(""));
        }
    }

    /// Start a new line, carrying the block quote bar
    fn start_line(&mut self) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                self.theme.dim_style(),
            ));
        }
    }

    fn event(&mut self, event: Event<'_>) {
        if let Some(code) = self.code.as_mut() {
            match event {
                Event::Text(text) => code.content.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.end_code_block(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                self.start_line();
                let style = self.style();
                self.current.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                self.start_line();
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.current.push(Span::styled(format!("`{}`", code), style));
            }
            Event::SoftBreak => self.current.push(Span::raw(" ")),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width.clamp(1, 48)),
                    self.theme.dim_style(),
                )));
                self.lines.push(Line::from(""));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let style = match level {
                    HeadingLevel::H1 => self
                        .theme
                        .accent_style()
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    HeadingLevel::H2 => self.theme.accent_style().add_modifier(Modifier::BOLD),
                    _ => self.theme.accent_style(),
                };
                self.push_style(style);
            }
            Tag::Paragraph => self.flush(),
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let tag: Option<&str> = match &kind {
                    CodeBlockKind::Fenced(tag) => Some(tag.as_ref()),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeBlock {
                    highlighter: CodeHighlighter::new(tag, self.theme),
                    content: String::new(),
                });
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Bullet,
                });
            }
            Tag::Item => {
                self.flush();
                self.start_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.current.push(Span::styled(marker, self.theme.dim_style()));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.into_string());
                self.push_style(
                    Style::default()
                        .fg(self.theme.link)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush();
                self.lines.push(Line::from(""));
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.lines.push(Line::from(""));
                }
            }
            TagEnd::BlockQuote(_) => {
                self.pop_style();
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    let shown = self
                        .current
                        .last()
                        .is_some_and(|s| s.content.as_ref() == url);
                    if !shown && !url.is_empty() {
                        self.current
                            .push(Span::styled(format!(" ({})", url), self.theme.dim_style()));
                    }
                }
            }
            _ => {}
        }
    }

    fn end_code_block(&mut self) {
        let Some(mut block) = self.code.take() else {
            return;
        };
        let max = self.width.saturating_sub(2).max(1);
        for code_line in block.content.lines() {
            // Highlight the whole line so parser state stays in step with the source
            let highlighted = block.highlighter.highlight_line(code_line);

            let mut spans = vec![Span::raw("  ")];
            if display_width(code_line) <= max {
                spans.extend(highlighted);
            } else {
                spans.extend(truncate_spans(highlighted, max.saturating_sub(1).max(1)));
                spans.push(Span::styled("…", self.theme.dim_style()));
            }
            self.lines.push(Line::from(spans));
        }
        self.lines.push(Line::from(""));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if self.code.is_some() {
            self.end_code_block();
        }
        self.flush();
        while self.lines.last().is_some_and(is_blank) {
            self.lines.pop();
        }
        self.lines
    }
}

fn is_blank(line: &Line<'_>) -> bool {
    line.spans.iter().all(|s| s.content.is_empty())
}

fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Keep the leading spans that fit in `width` columns, cutting the last one
fn truncate_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Span<'static>> {
    let mut kept = Vec::new();
    let mut remaining = width;
    for span in spans {
        let (shown, cut) = truncate_to_width(&span.content, remaining);
        if !shown.is_empty() {
            remaining -= display_width(shown);
            kept.push(Span::styled(shown.to_string(), span.style));
        }
        if cut {
            break;
        }
    }
    kept
}

/// Longest prefix of `s` that fits in `width` columns, and whether anything
/// was cut
pub fn truncate_to_width(s: &str, width: usize) -> (&str, bool) {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            return (&s[..i], true);
        }
        used += w;
    }
    (s, false)
}
