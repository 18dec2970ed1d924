pub mod app;
pub mod command;
pub mod ui;

use anyhow::{Context, Result};
use ratatui::crossterm::{
    cursor::Show,
    event::{self, Event as TermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use app::{Event, Update, Workflow};
use command::{Command, Message, Services};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive workflow. Returns the result screen's message when a
/// branch ended up checked out, `None` when the user quit before that.
pub fn run_tui(services: Services) -> Result<Option<String>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let _guard = TerminalGuard::enter(io::stdout(), enable_raw_mode, disable_raw_mode)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    event_loop(&mut terminal, &runtime, &services)
}

/// Raw mode plus the alternate screen. Whatever was switched on is switched
/// off again on drop, so the terminal is restored on every exit path, and a
/// failed restore is only logged.
struct TerminalGuard<W: Write> {
    out: W,
    disable_raw: fn() -> io::Result<()>,
    alternate: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(
        out: W,
        enable_raw: fn() -> io::Result<()>,
        disable_raw: fn() -> io::Result<()>,
    ) -> Result<Self> {
        enable_raw()?;
        let mut guard = Self {
            out,
            disable_raw,
            alternate: false,
        };
        execute!(guard.out, EnterAlternateScreen)?;
        guard.alternate = true;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if self.alternate {
            if let Err(e) = execute!(self.out, LeaveAlternateScreen, Show) {
                tracing::warn!(error = %e, "failed to leave alternate screen");
            }
        }
        if let Err(e) = (self.disable_raw)() {
            tracing::warn!(error = %e, "failed to leave raw mode");
        }
    }
}

fn event_loop(
    terminal: &mut Term,
    runtime: &Runtime,
    services: &Services,
) -> Result<Option<String>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut workflow = Workflow::new();

    let size = terminal.size()?;
    workflow.handle_event(Event::Resize {
        width: size.width,
        height: size.height,
    });
    dispatch(runtime, services, &tx, workflow.init());

    loop {
        terminal.draw(|f| ui::draw(f, &workflow))?;

        // A finished command is handled before any further input.
        let update = if let Ok(message) = rx.try_recv() {
            workflow.handle_event(Event::Message(message))
        } else if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                TermEvent::Key(key) => workflow.handle_event(Event::Key(key)),
                TermEvent::Resize(width, height) => {
                    workflow.handle_event(Event::Resize { width, height })
                }
                _ => Update::None,
            }
        } else {
            Update::None
        };

        match update {
            Update::None => {}
            Update::Run(command) => dispatch(runtime, services, &tx, command),
            Update::Quit => break,
        }
    }

    Ok(workflow.result_message().map(str::to_string))
}

fn dispatch(
    runtime: &Runtime,
    services: &Services,
    tx: &mpsc::UnboundedSender<Message>,
    command: Command,
) {
    tracing::debug!(?command, "running command");
    let task = command.into_task(services);
    let tx = tx.clone();
    runtime.spawn(async move {
        let message = task.await;
        let _ = tx.send(message);
    });
}
