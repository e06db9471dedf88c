//! Event handling and main application loop.
//!
//! The loop is the session's single thread of control: it draws a frame,
//! drains completed fetch results from the channel, and polls the keyboard.
//! Fetches run as spawned tokio tasks and only ever talk back through the
//! channel, tagged with the generation they were launched for.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use relnotes_lib::{GithubClient, RELEASE_PAGE_SIZE, RegistryClient, resolve};
use tokio::sync::mpsc::UnboundedSender;

use super::app::{App, Command, SessionEvent};
use super::render;

/// Delay between spinner frames.
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Keyboard poll timeout; bounds the latency of channel draining too.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// External services the fetch commands run against.
struct Services {
    registry: RegistryClient,
    github: GithubClient,
}

/// Runs the TUI application main loop.
///
/// ## Errors
///
/// Returns an I/O error if terminal operations fail.
pub fn run_app(terminal: &mut DefaultTerminal, app: &mut App) -> io::Result<()> {
    let services = Services {
        registry: RegistryClient::new(),
        github: GithubClient::new(),
    };

    let size = terminal.size()?;
    app.set_viewport(size.width, size.height);

    for command in app.initial_commands() {
        dispatch(&services, app.event_sender(), command);
    }

    loop {
        terminal.draw(|frame| render::render(app, frame))?;

        // Drain fetch results (non-blocking); collect first to avoid borrow
        // conflicts between the receiver and the transition handler
        let events: Vec<SessionEvent> = std::iter::from_fn(|| app.try_recv_event()).collect();
        for session_event in events {
            for command in app.handle_event(session_event) {
                dispatch(&services, app.event_sender(), command);
            }
        }

        if event::poll(INPUT_POLL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    for command in app.handle_key(key.code, key.modifiers) {
                        dispatch(&services, app.event_sender(), command);
                    }
                    // Quit never waits for outstanding tasks; their results
                    // die with the channel.
                    if app.should_quit {
                        return Ok(());
                    }
                }
                Event::Resize(width, height) => app.set_viewport(width, height),
                _ => {}
            }
        }
    }
}

/// Launches one command as a detached task reporting back over the channel.
///
/// Send failures are ignored: a closed channel just means the session ended
/// while the task was in flight.
fn dispatch(services: &Services, tx: UnboundedSender<SessionEvent>, command: Command) {
    match command {
        Command::Resolve {
            identifier,
            generation,
        } => {
            let registry = services.registry.clone();
            tokio::spawn(async move {
                let result = resolve(&registry, &identifier).await;
                let _ = tx.send(SessionEvent::Resolved { generation, result });
            });
        }
        Command::FetchReleases { repo, generation } => {
            let github = services.github.clone();
            tokio::spawn(async move {
                let result = github.list_releases(&repo, RELEASE_PAGE_SIZE).await;
                let _ = tx.send(SessionEvent::ReleasesLoaded { generation, result });
            });
        }
        Command::FetchChangelog {
            repo,
            tag,
            generation,
        } => {
            let github = services.github.clone();
            tokio::spawn(async move {
                let result = github.release_detail(&repo, &tag).await;
                let _ = tx.send(SessionEvent::ChangelogLoaded { generation, result });
            });
        }
        Command::ScheduleTick => {
            tokio::spawn(async move {
                tokio::time::sleep(TICK_INTERVAL).await;
                let _ = tx.send(SessionEvent::Tick);
            });
        }
    }
}
