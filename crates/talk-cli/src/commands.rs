//! Slash commands for interactive mode

/// A parsed slash command; talk numbers are already 0-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create and select a new talk
    New,
    /// List all talks
    List,
    /// Select a talk
    Open(usize),
    /// Delete a talk
    Delete(usize),
    /// Rename the selected talk
    Rename(String),
    Help,
    Quit,
    /// A known command with bad arguments; carries the usage line
    Usage(&'static str),
    /// Unknown command
    Unknown(String),
}

/// Parse a slash command; `None` if the input is not one
pub fn parse(input: &str) -> Option<Command> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    Some(match command.as_str() {
        "new" | "n" => Command::New,
        "list" | "ls" | "l" => Command::List,
        "open" | "o" => match talk_number(args) {
            Some(index) => Command::Open(index),
            None => Command::Usage("/open N"),
        },
        "delete" | "del" | "d" => match talk_number(args) {
            Some(index) => Command::Delete(index),
            None => Command::Usage("/delete N"),
        },
        "rename" | "r" if args.is_empty() => Command::Usage("/rename TITLE"),
        "rename" | "r" => Command::Rename(args.to_string()),
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(command),
    })
}

/// Convert a 1-based talk number to an index
fn talk_number(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

pub fn help_message() -> &'static str {
    r#"Available commands:
  /new, /n              Start a new talk
  /list, /ls            List talks (* marks the open one)
  /open, /o N           Open talk number N
  /delete, /d N         Delete talk number N
  /rename, /r TITLE     Rename the open talk
  /help, /h, /?         Show this help message
  /quit, /exit, /q      Exit talk

Anything else is sent to the open talk. End a line with \ to continue the
message on the next line."#
}
