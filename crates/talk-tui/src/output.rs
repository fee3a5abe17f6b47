//! Writing styled lines to a terminal

use crossterm::{
    queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Line,
};
use std::io::{self, Write};

/// Map a ratatui color to the crossterm color with the same ANSI meaning
fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}

const ATTRIBUTES: &[(Modifier, Attribute)] = &[
    (Modifier::BOLD, Attribute::Bold),
    (Modifier::DIM, Attribute::Dim),
    (Modifier::ITALIC, Attribute::Italic),
    (Modifier::UNDERLINED, Attribute::Underlined),
    (Modifier::REVERSED, Attribute::Reverse),
    (Modifier::CROSSED_OUT, Attribute::CrossedOut),
];

fn write_styled<W: Write>(out: &mut W, text: &str, style: Style) -> io::Result<()> {
    let plain = style.fg.is_none() && style.bg.is_none() && style.add_modifier.is_empty();
    if plain {
        return queue!(out, Print(text));
    }

    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(term_color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(term_color(bg)))?;
    }
    for (modifier, attribute) in ATTRIBUTES {
        if style.add_modifier.contains(*modifier) {
            queue!(out, SetAttribute(*attribute))?;
        }
    }
    queue!(out, Print(text), SetAttribute(Attribute::Reset), ResetColor)
}

/// Write one line with its styles, without a trailing newline
pub fn write_line<W: Write>(out: &mut W, line: &Line<'_>) -> io::Result<()> {
    for span in &line.spans {
        write_styled(out, &span.content, line.style.patch(span.style))?;
    }
    Ok(())
}

/// Write lines with their styles, each followed by a newline
pub fn write_lines<W: Write>(out: &mut W, lines: &[Line<'_>]) -> io::Result<()> {
    for line in lines {
        write_line(out, line)?;
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Text of the lines without any styling
#[cfg(test)]
pub(crate) fn lines_to_plain(lines: &[Line<'_>]) -> String {
    let mut text = String::new();
    for line in lines {
        for span in &line.spans {
            text.push_str(&span.content);
        }
        text.push('\n');
    }
    text
}
