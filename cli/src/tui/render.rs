//! Rendering functions for the TUI.
//!
//! One view per session phase: a spinner line while a fetch is in flight,
//! the release list while browsing, and a header/viewport/footer layout for
//! the changelog. A stored error replaces whichever view would otherwise be
//! shown.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, List, ListItem, Paragraph, Wrap},
};
use relnotes_lib::ReleaseSummary;

use super::app::{App, ChangelogView, SPINNER_FRAMES, SessionState};
use super::{ACCENT, DIM};

/// Renders the entire application UI for the current state.
pub fn render(app: &mut App, frame: &mut Frame) {
    if let Some(message) = app.error.clone() {
        render_error(frame, &message);
        return;
    }

    match app.state {
        SessionState::ResolvingPackage => {
            let text = format!("Querying {}'s repository...", app.identifier);
            render_busy(app, frame, &text);
        }
        SessionState::FetchingReleases => {
            let text = format!("Querying {}'s releases...", repo_label(app));
            render_busy(app, frame, &text);
        }
        SessionState::Browsing => render_release_list(app, frame),
        SessionState::FetchingChangelog { ref tag } => {
            let text = format!("Fetching changelog for {tag}...");
            render_busy(app, frame, &text);
        }
        SessionState::ViewingChangelog(ref view) => {
            render_changelog(&app.identifier, &repo_label(app), view, frame);
        }
    }
}

fn repo_label(app: &App) -> String {
    app.repo
        .as_ref()
        .map(|repo| repo.to_string())
        .unwrap_or_default()
}

/// An error message is the entire view, never an overlay.
fn render_error(frame: &mut Frame, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area().inner(margin()));
}

fn render_busy(app: &App, frame: &mut Frame, text: &str) {
    let line = Line::from(vec![
        Span::styled(
            SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()],
            Style::default().fg(ACCENT),
        ),
        Span::raw(" "),
        Span::raw(text.to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), frame.area().inner(margin()));
}

fn render_release_list(app: &mut App, frame: &mut Frame) {
    let area = frame.area().inner(margin());
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

    let title = format!("Releases of {}", repo_label(app));
    let block = Block::default().title(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let indices = app.filtered_indices();
    if app.releases.is_empty() {
        let paragraph = Paragraph::new("No releases published.")
            .block(block)
            .style(Style::default().fg(DIM));
        frame.render_widget(paragraph, chunks[0]);
    } else if indices.is_empty() {
        let paragraph = Paragraph::new(format!("No releases match /{}.", app.filter))
            .block(block)
            .style(Style::default().fg(DIM));
        frame.render_widget(paragraph, chunks[0]);
    } else {
        let items: Vec<ListItem> = indices
            .iter()
            .map(|&index| release_item(&app.releases[index]))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            .highlight_symbol("❯ ");
        frame.render_stateful_widget(list, chunks[0], &mut app.list_state);
    }

    render_hints(app, frame, chunks[1]);
}

fn release_item(release: &ReleaseSummary) -> ListItem<'static> {
    ListItem::new(release_lines(release))
}

/// One list entry: the tag with its flags, and the publish date below.
fn release_lines(release: &ReleaseSummary) -> Text<'static> {
    let mut title = vec![Span::raw(release.tag_name.clone())];
    if release.is_latest {
        title.push(Span::styled(" latest", Style::default().fg(Color::Green)));
    }
    if release.is_prerelease {
        title.push(Span::styled(
            " prerelease",
            Style::default().fg(Color::Yellow),
        ));
    }
    let date = Line::from(Span::styled(
        format!("  {}", format_published(release.published_at)),
        Style::default().fg(DIM),
    ));
    Text::from(vec![Line::from(title), date])
}

fn render_hints(app: &App, frame: &mut Frame, area: Rect) {
    let hints = hint_line(app);
    let hints = Paragraph::new(hints).style(Style::default().fg(DIM));
    frame.render_widget(hints, area);
}

/// Footer text under the list; shows the live filter while one is set.
fn hint_line(app: &App) -> String {
    if app.filter_input {
        format!("/{}▌  esc clear · enter apply", app.filter)
    } else if !app.filter.is_empty() {
        format!("/{} · ↑/↓ navigate · enter select · esc clear", app.filter)
    } else {
        "↑/↓ navigate · enter select · / filter · q quit".to_string()
    }
}

fn render_changelog(identifier: &str, repo: &str, view: &ChangelogView, frame: &mut Frame) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let title = format!(" {identifier}({repo}) {} ", view.detail.summary.tag_name);
    render_rule_line(frame, chunks[0], &title, Alignment::Left);

    // Lines are pre-wrapped to the viewport width, so rendered rows and
    // logical lines agree and the scroll clamp covers the whole body.
    let body = Paragraph::new(view.rendered.clone()).scroll((view.scroll, 0));
    frame.render_widget(body, chunks[1]);

    let visible = chunks[1].height;
    let info = format!(
        " {:3.0}% ",
        scroll_percent(view.scroll, view.rendered.lines.len(), visible)
    );
    render_rule_line(frame, chunks[2], &info, Alignment::Right);
}

/// A label embedded in a horizontal rule, header/footer style.
fn render_rule_line(frame: &mut Frame, area: Rect, label: &str, alignment: Alignment) {
    let label_width = label.chars().count() as u16;
    let dashes = "─".repeat(area.width.saturating_sub(label_width) as usize);
    let spans = match alignment {
        Alignment::Right => vec![
            Span::styled(dashes, Style::default().fg(DIM)),
            Span::styled(label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        ],
        _ => vec![
            Span::styled(label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(dashes, Style::default().fg(DIM)),
        ],
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Percentage scrolled: 0 at the top, 100 once the last line is visible.
fn scroll_percent(scroll: u16, total_lines: usize, visible_lines: u16) -> f64 {
    let max_scroll = (total_lines as u16).saturating_sub(visible_lines);
    if max_scroll == 0 {
        100.0
    } else {
        f64::from(scroll) / f64::from(max_scroll) * 100.0
    }
}

fn format_published(published_at: Option<DateTime<Utc>>) -> String {
    published_at
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unpublished".to_string())
}

fn margin() -> Margin {
    Margin {
        horizontal: 2,
        vertical: 1,
    }
}
