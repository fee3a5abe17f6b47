//! Syntax highlighting for fenced code blocks

use crate::theme::Theme;
use lazy_static::lazy_static;
use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, ThemeSet};
use syntect::parsing::SyntaxSet;

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

/// Highlights the lines of one code block in order.
///
/// Parser state carries over from line to line, so block comments and
/// multi-line strings are styled correctly.
pub struct CodeHighlighter {
    lines: Option<HighlightLines<'static>>,
    plain: Style,
}

impl CodeHighlighter {
    /// Highlighter for a fence tag such as `rust` or `py`.
    ///
    /// Blocks without a known language use the plain code style.
    pub fn new(tag: Option<&str>, theme: &Theme) -> Self {
        let syntax = tag
            .and_then(|tag| tag.split([',', ' ']).next())
            .filter(|token| !token.is_empty())
            .and_then(|token| SYNTAX_SET.find_syntax_by_token(token));
        let lines = match (syntax, THEME_SET.themes.get(theme.syntax_theme)) {
            (Some(syntax), Some(syntax_theme)) => Some(HighlightLines::new(syntax, syntax_theme)),
            _ => None,
        };
        Self {
            lines,
            plain: theme.code_style(),
        }
    }

    /// Split the next line of the block into styled spans
    pub fn highlight_line(&mut self, line: &str) -> Vec<Span<'static>> {
        let Some(lines) = self.lines.as_mut() else {
            return vec![Span::styled(line.to_string(), self.plain)];
        };

        let with_ending = format!("{}\n", line);
        match lines.highlight_line(&with_ending, &SYNTAX_SET) {
            Ok(regions) => regions
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches('\n');
                    (!text.is_empty()).then(|| Span::styled(text.to_string(), to_style(style)))
                })
                .collect(),
            Err(_) => {
                // Parser state is unknown after an error; the rest of the block stays plain
                self.lines = None;
                vec![Span::styled(line.to_string(), self.plain)]
            }
        }
    }
}

fn to_style(style: SyntectStyle) -> Style {
    let fg = style.foreground;
    let mut converted = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        converted = converted.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        converted = converted.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        converted = converted.add_modifier(Modifier::UNDERLINED);
    }
    converted
}
