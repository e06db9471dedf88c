//! Application state for the TUI: the session state machine.
//!
//! The controller is deliberately Elm-shaped: `handle_key` and
//! `handle_event` mutate state and hand back [`Command`]s describing the
//! asynchronous work to launch. The event loop executes commands as spawned
//! tasks whose results come back as [`SessionEvent`]s over the channel, so
//! every transition is synchronous, single-threaded, and unit-testable.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::text::Text;
use ratatui::widgets::ListState;
use relnotes_lib::{QueryError, ReleaseDetail, ReleaseSummary, RepoCoordinate, ResolveError};
use tokio::sync::mpsc;
use tracing::debug;

use super::markdown::render_markdown;

/// Spinner animation frames, advanced once per tick while busy.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The session's current phase. Exactly one is active; each variant carries
/// only the data valid for that phase.
#[derive(Debug)]
pub enum SessionState {
    /// Resolving the user's identifier into a repository coordinate.
    ResolvingPackage,
    /// Fetching the repository's release list.
    FetchingReleases,
    /// User is navigating the release list.
    Browsing,
    /// Fetching the changelog for a selected tag.
    FetchingChangelog {
        /// Tag of the release being fetched.
        tag: String,
    },
    /// Reading a rendered changelog in the scroll viewport.
    ViewingChangelog(ChangelogView),
}

/// Viewport content for one release's changelog. Discarded on "back".
#[derive(Debug)]
pub struct ChangelogView {
    /// The fetched release detail.
    pub detail: ReleaseDetail,
    /// The markdown body rendered to styled text.
    pub rendered: Text<'static>,
    /// Vertical scroll offset in lines.
    pub scroll: u16,
}

/// Completion events delivered back into the control loop.
///
/// Fetch results carry the generation their task was launched with; a result
/// whose generation no longer matches the controller's is stale and dropped.
#[derive(Debug)]
pub enum SessionEvent {
    /// Recurring spinner tick.
    Tick,
    /// The resolver task finished.
    Resolved {
        generation: u64,
        result: Result<RepoCoordinate, ResolveError>,
    },
    /// The release-list fetch finished.
    ReleasesLoaded {
        generation: u64,
        result: Result<Vec<ReleaseSummary>, QueryError>,
    },
    /// The changelog-detail fetch finished.
    ChangelogLoaded {
        generation: u64,
        result: Result<ReleaseDetail, QueryError>,
    },
}

/// Asynchronous work for the event loop to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve the identifier into a repository coordinate.
    Resolve { identifier: String, generation: u64 },
    /// Fetch the repository's release list.
    FetchReleases {
        repo: RepoCoordinate,
        generation: u64,
    },
    /// Fetch one release's detail by tag.
    FetchChangelog {
        repo: RepoCoordinate,
        tag: String,
        generation: u64,
    },
    /// Arm the next spinner tick.
    ScheduleTick,
}

/// TUI application state.
pub struct App {
    /// The identifier as the user typed it.
    pub identifier: String,
    /// Resolved repository coordinate; set once, kept for the whole session.
    pub repo: Option<RepoCoordinate>,
    /// Current session phase.
    pub state: SessionState,
    /// Fetched release list; survives the changelog back-edge.
    pub releases: Vec<ReleaseSummary>,
    /// Live filter over release tags; empty means all releases are visible.
    pub filter: String,
    /// True while keystrokes edit the filter instead of navigating.
    pub filter_input: bool,
    /// List widget selection state, indexing into the filtered subset.
    pub list_state: ListState,
    /// A stored error replaces the entire view until the user quits.
    pub error: Option<String>,
    /// Flag indicating the application should exit.
    pub should_quit: bool,
    /// Current spinner frame index.
    pub spinner_frame: usize,
    /// Terminal size, updated on resize events.
    pub viewport: (u16, u16),
    /// Generation of the most recently launched fetch.
    generation: u64,
    /// True while a tick task is in flight; prevents parallel tick chains.
    tick_armed: bool,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl App {
    /// Creates the application state for one browse session.
    pub fn new(identifier: String) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            identifier,
            repo: None,
            state: SessionState::ResolvingPackage,
            releases: Vec::new(),
            filter: String::new(),
            filter_input: false,
            list_state: ListState::default(),
            error: None,
            should_quit: false,
            spinner_frame: 0,
            viewport: (80, 24),
            generation: 0,
            tick_armed: false,
            event_tx,
            event_rx,
        }
    }

    /// Commands to launch before the first frame: the resolve task and the
    /// spinner tick chain.
    pub fn initial_commands(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::Resolve {
            identifier: self.identifier.clone(),
            generation: self.next_generation(),
        }];
        commands.extend(self.arm_tick());
        commands
    }

    /// A sender for fetch tasks to report back through.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.event_tx.clone()
    }

    /// Pulls one pending session event, if any (non-blocking).
    pub fn try_recv_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// True while a fetch is in flight and the spinner should animate.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            SessionState::ResolvingPackage
                | SessionState::FetchingReleases
                | SessionState::FetchingChangelog { .. }
        )
    }

    /// The currently highlighted release, if any.
    pub fn selected_release(&self) -> Option<&ReleaseSummary> {
        let position = self.list_state.selected()?;
        let index = *self.filtered_indices().get(position)?;
        self.releases.get(index)
    }

    /// Indices of the releases whose tag matches the filter, list order
    /// preserved. An empty filter matches everything.
    pub fn filtered_indices(&self) -> Vec<usize> {
        if self.filter.is_empty() {
            return (0..self.releases.len()).collect();
        }
        let needle = self.filter.to_lowercase();
        self.releases
            .iter()
            .enumerate()
            .filter(|(_, release)| release.tag_name.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .collect()
    }

    /// Applies a completion event, returning follow-up commands.
    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::Tick => {
                self.tick_armed = false;
                // An error screen stops the chain even when the state that
                // hit the error still counts as busy.
                if self.is_busy() && self.error.is_none() {
                    self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                    self.arm_tick().into_iter().collect()
                } else {
                    Vec::new()
                }
            }
            SessionEvent::Resolved { generation, result } => {
                if self.is_stale(generation) {
                    return Vec::new();
                }
                match result {
                    Ok(repo) => {
                        self.repo = Some(repo.clone());
                        self.state = SessionState::FetchingReleases;
                        vec![Command::FetchReleases {
                            repo,
                            generation: self.next_generation(),
                        }]
                    }
                    Err(error) => {
                        self.error = Some(error.to_string());
                        Vec::new()
                    }
                }
            }
            SessionEvent::ReleasesLoaded { generation, result } => {
                if self.is_stale(generation) {
                    return Vec::new();
                }
                match result {
                    Ok(releases) => {
                        self.list_state
                            .select((!releases.is_empty()).then_some(0));
                        self.releases = releases;
                        self.state = SessionState::Browsing;
                    }
                    Err(error) => self.error = Some(error.to_string()),
                }
                Vec::new()
            }
            SessionEvent::ChangelogLoaded { generation, result } => {
                if self.is_stale(generation) {
                    return Vec::new();
                }
                match result {
                    Ok(detail) => {
                        let rendered = self.render_changelog(&detail);
                        self.state = SessionState::ViewingChangelog(ChangelogView {
                            detail,
                            rendered,
                            scroll: 0,
                        });
                    }
                    Err(error) => self.error = Some(error.to_string()),
                }
                Vec::new()
            }
        }
    }

    /// Routes keyboard input, returning commands for any fetch it triggers.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        let ctrl_c = key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL);

        // An error screen only accepts quitting.
        if self.error.is_some() {
            if matches!(key, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) || ctrl_c {
                self.should_quit = true;
            }
            return Vec::new();
        }

        if ctrl_c {
            self.should_quit = true;
            return Vec::new();
        }

        // While the filter is being edited, printable keys type into it.
        if self.filter_input && matches!(self.state, SessionState::Browsing) {
            match key {
                KeyCode::Esc => {
                    self.filter.clear();
                    self.filter_input = false;
                    self.reset_filter_selection();
                }
                KeyCode::Enter => self.filter_input = false,
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.reset_filter_selection();
                }
                KeyCode::Down => self.select_next(),
                KeyCode::Up => self.select_previous(),
                KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    self.filter.push(c);
                    self.reset_filter_selection();
                }
                _ => {}
            }
            return Vec::new();
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                // Inside the changelog these are "back", not "quit".
                if matches!(self.state, SessionState::ViewingChangelog(_)) {
                    self.state = SessionState::Browsing;
                } else if key == KeyCode::Esc
                    && !self.filter.is_empty()
                    && matches!(self.state, SessionState::Browsing)
                {
                    self.filter.clear();
                    self.reset_filter_selection();
                } else {
                    self.should_quit = true;
                }
                Vec::new()
            }
            KeyCode::Char('/') => {
                if matches!(self.state, SessionState::Browsing) {
                    self.filter_input = true;
                }
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                match self.state {
                    SessionState::Browsing => self.select_next(),
                    SessionState::ViewingChangelog(_) => self.scroll_by(1),
                    _ => {}
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                match self.state {
                    SessionState::Browsing => self.select_previous(),
                    SessionState::ViewingChangelog(_) => self.scroll_by(-1),
                    _ => {}
                }
                Vec::new()
            }
            KeyCode::PageDown => {
                if matches!(self.state, SessionState::ViewingChangelog(_)) {
                    self.scroll_by(self.content_height() as i32);
                }
                Vec::new()
            }
            KeyCode::PageUp => {
                if matches!(self.state, SessionState::ViewingChangelog(_)) {
                    self.scroll_by(-(self.content_height() as i32));
                }
                Vec::new()
            }
            KeyCode::Enter => self.choose_selected(),
            _ => Vec::new(),
        }
    }

    /// Records a new terminal size and re-wraps any open changelog.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
        let content_height = self.content_height();
        let rendered = match self.state {
            SessionState::ViewingChangelog(ref view) => self.render_changelog(&view.detail),
            _ => return,
        };
        let max = (rendered.lines.len() as u16).saturating_sub(content_height);
        if let SessionState::ViewingChangelog(ref mut view) = self.state {
            view.rendered = rendered;
            view.scroll = view.scroll.min(max);
        }
    }

    fn choose_selected(&mut self) -> Vec<Command> {
        if !matches!(self.state, SessionState::Browsing) {
            return Vec::new();
        }
        let (Some(repo), Some(release)) = (self.repo.clone(), self.selected_release()) else {
            return Vec::new();
        };
        let tag = release.tag_name.clone();
        self.state = SessionState::FetchingChangelog { tag: tag.clone() };
        let mut commands = vec![Command::FetchChangelog {
            repo,
            tag,
            generation: self.next_generation(),
        }];
        commands.extend(self.arm_tick());
        commands
    }

    fn select_next(&mut self) {
        let count = self.filtered_indices().len();
        if count > 0 {
            let next = (self.list_state.selected().unwrap_or(0) + 1) % count;
            self.list_state.select(Some(next));
        }
    }

    fn select_previous(&mut self) {
        if !self.filtered_indices().is_empty() {
            let previous = self.list_state.selected().unwrap_or(0).saturating_sub(1);
            self.list_state.select(Some(previous));
        }
    }

    /// Snaps the highlight to the first visible entry after a filter edit.
    fn reset_filter_selection(&mut self) {
        let count = self.filtered_indices().len();
        self.list_state.select((count > 0).then_some(0));
    }

    /// Arms the tick chain unless one is already in flight.
    fn arm_tick(&mut self) -> Option<Command> {
        if self.tick_armed {
            None
        } else {
            self.tick_armed = true;
            Some(Command::ScheduleTick)
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = match self.state {
            SessionState::ViewingChangelog(ref view) => self.max_scroll_for(&view.rendered),
            _ => return,
        };
        if let SessionState::ViewingChangelog(ref mut view) = self.state {
            let scroll = (i32::from(view.scroll) + delta).clamp(0, i32::from(max));
            view.scroll = scroll as u16;
        }
    }

    /// Lines available for changelog content (viewport minus header/footer).
    pub fn content_height(&self) -> u16 {
        self.viewport.1.saturating_sub(2)
    }

    fn max_scroll_for(&self, rendered: &Text<'static>) -> u16 {
        (rendered.lines.len() as u16).saturating_sub(self.content_height())
    }

    fn render_changelog(&self, detail: &ReleaseDetail) -> Text<'static> {
        let source = format!(
            "{}\n\n**Open in browser**: {}",
            detail.description, detail.summary.url
        );
        render_markdown(&source, self.viewport.0)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn is_stale(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                event_generation = generation,
                current_generation = self.generation,
                "discarding stale fetch result"
            );
            true
        } else {
            false
        }
    }
}
