//! talk - terminal chat client

mod commands;
mod config;
mod presenter;

use anyhow::Context;
use clap::Parser;
use commands::Command;
use presenter::TerminalPresenter;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use talk_api::{Backend, HttpBackend, MemoryBackend};
use talk_session::{CycleOutcome, SessionController};
use talk_tui::Theme;
use tokio::sync::mpsc;

/// talk - chat with a talk server from the terminal
#[derive(Parser, Debug)]
#[command(name = "talk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the talk server
    #[arg(short, long)]
    base_url: Option<String>,

    /// Keep talks in memory instead of using a server
    #[arg(long)]
    offline: bool,

    /// Color theme (dark, light)
    #[arg(short, long)]
    theme: Option<String>,

    /// Send one message to a new talk, print the reply and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("talk=debug")
            .with_writer(io::stderr)
            .init();
    }

    if args.init_config {
        let path = config::Config::init().context("Error creating config")?;
        println!("Config file created at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    let cfg = config::Config::load();

    // CLI takes precedence over the config file
    let theme_name = args.theme.or(cfg.theme).unwrap_or_else(|| "dark".to_string());
    let theme = Theme::by_name(&theme_name).unwrap_or_else(|| {
        eprintln!("Warning: Unknown theme '{}', using dark", theme_name);
        Theme::dark()
    });

    let offline = args.offline || cfg.offline.unwrap_or(false);
    let backend: Arc<dyn Backend> = if offline {
        Arc::new(MemoryBackend::new())
    } else {
        let base_url = args
            .base_url
            .or(cfg.base_url)
            .unwrap_or_else(|| config::DEFAULT_BASE_URL.to_string());
        Arc::new(HttpBackend::new(base_url)?)
    };

    let width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    let presenter = TerminalPresenter::new(io::stdout(), theme, width);
    let mut controller = SessionController::new(cfg.session, backend).with_presenter(presenter);

    if let Some(command) = args.command {
        return run_command(&mut controller, &command).await;
    }

    controller
        .initialize()
        .await
        .context("Failed to load talks")?;
    run_interactive(&mut controller).await
}

async fn run_command(controller: &mut SessionController, message: &str) -> anyhow::Result<()> {
    controller.create_talk().await?;

    match controller.submit(message).await {
        CycleOutcome::Failed { error } => anyhow::bail!("Send failed: {}", error),
        CycleOutcome::Ignored => anyhow::bail!("Nothing to send"),
        CycleOutcome::Completed { .. } => Ok(()),
    }
}

/// Read stdin lines on a thread so the REPL can wait on titles meanwhile
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Print the prompt and wait for the next line.
///
/// Titles that resolve while waiting are applied right away, and the prompt
/// is printed again after the presenter's notice.
async fn next_line<W: Write>(
    controller: &mut SessionController,
    input: &mut mpsc::UnboundedReceiver<io::Result<String>>,
    prompt: &str,
    out: &mut W,
) -> Option<io::Result<String>> {
    controller.apply_title_updates();
    if let Err(e) = write!(out, "{}", prompt).and_then(|_| out.flush()) {
        return Some(Err(e));
    }

    loop {
        tokio::select! {
            line = input.recv() => return line,
            applied = controller.next_title_update(), if controller.pending_titles() > 0 => {
                if applied {
                    if let Err(e) = write!(out, "{}", prompt).and_then(|_| out.flush()) {
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

async fn run_interactive(controller: &mut SessionController) -> anyhow::Result<()> {
    if io::stderr().is_terminal() {
        eprintln!("talk: /help for commands");
        eprintln!();
    }

    let mut input = spawn_stdin_reader();

    loop {
        let prompt = if controller.draft().is_empty() {
            "> ".to_string()
        } else {
            format!("{}| ", controller.draft_rows())
        };

        let Some(line) = next_line(controller, &mut input, &prompt, &mut io::stdout()).await
        else {
            break;
        };
        let line = line?;
        controller.apply_title_updates();

        // A trailing backslash continues the message on the next line
        if let Some(head) = line.strip_suffix('\\') {
            let mut draft = controller.draft().to_string();
            draft.push_str(head);
            draft.push('\n');
            controller.set_draft(draft);
            continue;
        }

        if controller.draft().is_empty() {
            if let Some(command) = commands::parse(&line) {
                if !execute(controller, command).await {
                    break;
                }
                continue;
            }
        }

        let mut draft = controller.draft().to_string();
        draft.push_str(&line);
        controller.set_draft(draft);
        if let CycleOutcome::Failed { error } = controller.submit_draft().await {
            tracing::debug!("Send failed: {}", error);
        }
    }

    Ok(())
}

/// Run a slash command; returns false to quit
async fn execute(controller: &mut SessionController, command: Command) -> bool {
    let result = match command {
        Command::New => controller.create_talk().await.map(|_| ()),
        Command::List => {
            print_talks(controller);
            Ok(())
        }
        Command::Open(index) => controller.select_talk(index),
        Command::Delete(index) => controller.delete_talk(index).await,
        Command::Rename(title) => controller.rename_talk(&title).await.map(|_| ()),
        Command::Help => {
            println!("{}", commands::help_message());
            Ok(())
        }
        Command::Quit => return false,
        Command::Usage(usage) => {
            println!("Usage: {}", usage);
            Ok(())
        }
        Command::Unknown(name) => {
            println!("Unknown command: /{}", name);
            println!("Type /help for available commands.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }
    true
}

fn print_talks(controller: &SessionController) {
    let selected = controller.selected_index();
    for (i, talk) in controller.talks().iter().enumerate() {
        let marker = if Some(i) == selected { '*' } else { ' ' };
        println!(
            "{} {:>2}. {} ({} messages)",
            marker,
            i + 1,
            talk.title,
            talk.messages.len()
        );
    }
}
