//! Markdown-to-styled-text rendering for the changelog viewport.
//!
//! Converts a release body into ratatui [`Text`]. Rendering never fails the
//! session: markdown that produces no output degrades to the raw text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::{ACCENT, DIM};

/// Renders markdown into styled text, word-wrapped to `width` columns.
///
/// Every output line fits the width, so the line count is exactly the row
/// count the terminal draws and scroll arithmetic can rely on it.
pub fn render_markdown(source: &str, width: u16) -> Text<'static> {
    if source.trim().is_empty() {
        return Text::from(Line::from(Span::styled(
            "(no release notes)",
            Style::default().fg(DIM),
        )));
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(width);
    for event in Parser::new_ext(source, options) {
        renderer.push(event);
    }
    let text = renderer.finish();

    // Degraded fallback: a non-empty body must never render to nothing.
    let text = if text.lines.iter().all(|line| line.width() == 0) {
        Text::raw(source.to_string())
    } else {
        text
    };
    wrap_text(text, width as usize)
}

fn wrap_text(text: Text<'static>, width: usize) -> Text<'static> {
    if width == 0 {
        return text;
    }
    Text::from(
        text.lines
            .into_iter()
            .flat_map(|line| wrap_line(line, width))
            .collect::<Vec<_>>(),
    )
}

/// Greedy word wrap of one styled line. Words wider than a whole row are cut
/// mid-word; leading spaces survive only on the first row so indentation is
/// kept without bleeding into continuation rows.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if line.width() <= width {
        return vec![line];
    }
    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;
    let mut wrapped = false;
    for span in line.spans {
        let style = span.style;
        let mut chunk = String::new();
        for word in span.content.split_inclusive(' ') {
            if used > 0 && used + word.trim_end().chars().count() > width {
                if !chunk.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(Line::from(std::mem::take(&mut row)));
                used = 0;
                wrapped = true;
            }
            let mut rest = if wrapped && used == 0 {
                word.trim_start()
            } else {
                word
            };
            while used + rest.chars().count() > width {
                let cut = rest
                    .char_indices()
                    .nth(width - used)
                    .map_or(rest.len(), |(index, _)| index);
                chunk.push_str(&rest[..cut]);
                if !chunk.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(Line::from(std::mem::take(&mut row)));
                used = 0;
                wrapped = true;
                rest = rest[cut..].trim_start();
            }
            chunk.push_str(rest);
            used += rest.chars().count();
        }
        if !chunk.is_empty() {
            row.push(Span::styled(chunk, style));
        }
    }
    if !row.is_empty() {
        rows.push(Line::from(row));
    }
    rows
}

/// One unordered or ordered list level; ordered levels track the next index.
struct ListLevel {
    next_index: Option<u64>,
}

struct Renderer {
    width: u16,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    heading: Option<HeadingLevel>,
    bold: usize,
    italic: usize,
    strikethrough: usize,
    in_code_block: bool,
    quote_depth: usize,
    list_stack: Vec<ListLevel>,
    link_target: Option<String>,
}

impl Renderer {
    fn new(width: u16) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            heading: None,
            bold: 0,
            italic: 0,
            strikethrough: 0,
            in_code_block: false,
            quote_depth: 0,
            list_stack: Vec::new(),
            link_target: None,
        }
    }

    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_code_lines(&text);
                } else {
                    self.push_span(text.to_string());
                }
            }
            Event::Code(code) => {
                let style = Style::default().fg(Color::Yellow);
                self.current.push(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.push_span(" ".to_string()),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.blank_line();
                let rule = "─".repeat(self.width.max(1) as usize);
                self.lines
                    .push(Line::from(Span::styled(rule, Style::default().fg(DIM))));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(marker.to_string());
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.current.push(Span::styled(
                    html.to_string(),
                    Style::default().fg(DIM),
                ));
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.blank_line(),
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.heading = Some(level);
                let marks = "#".repeat(heading_depth(level));
                self.current
                    .push(Span::styled(format!("{marks} "), self.inline_style()));
            }
            Tag::CodeBlock(kind) => {
                self.blank_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(language) = kind
                    && !language.is_empty()
                {
                    self.lines.push(Line::from(Span::styled(
                        format!("    ({language})"),
                        Style::default().fg(DIM),
                    )));
                }
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
                self.list_stack.push(ListLevel { next_index: start });
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last_mut() {
                    Some(ListLevel {
                        next_index: Some(index),
                    }) => {
                        let marker = format!("{index}. ");
                        *index += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current
                    .push(Span::raw(format!("{}{marker}", "  ".repeat(depth))));
            }
            Tag::BlockQuote(_) => {
                self.blank_line();
                self.quote_depth += 1;
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link_target = Some(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.flush_line();
                self.heading = None;
            }
            TagEnd::CodeBlock => {
                self.flush_line();
                self.in_code_block = false;
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link | TagEnd::Image => {
                if let Some(target) = self.link_target.take() {
                    self.current.push(Span::styled(
                        format!(" ({target})"),
                        Style::default().fg(DIM),
                    ));
                }
            }
            _ => {}
        }
    }

    fn push_span(&mut self, content: String) {
        let style = self.inline_style();
        self.current.push(Span::styled(content, style));
    }

    fn push_code_lines(&mut self, text: &str) {
        let style = Style::default().fg(Color::Green);
        for line in text.lines() {
            self.lines
                .push(Line::from(Span::styled(format!("    {line}"), style)));
        }
    }

    fn inline_style(&self) -> Style {
        let mut style = Style::default();
        if self.heading.is_some() {
            style = style.fg(ACCENT).add_modifier(Modifier::BOLD);
        }
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strikethrough > 0 {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        style
    }

    /// Ends the line under construction, applying the block-quote gutter.
    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(DIM),
            ));
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Ensures one blank line between blocks. A no-op mid-line, so a block
    /// opening right after a list marker stays on the marker's line.
    fn blank_line(&mut self) {
        if !self.current.is_empty() {
            return;
        }
        if matches!(self.lines.last(), Some(line) if line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush_line();
        Text::from(self.lines)
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn rendered_lines(source: &str) -> Vec<String> {
        render_markdown(source, 80)
            .lines
            .iter()
            .map(line_text)
            .collect()
    }

    #[test]
    fn empty_source_shows_placeholder() {
        let lines = rendered_lines("   \n  ");
        assert_eq!(lines, vec!["(no release notes)"]);
    }

    #[test]
    fn heading_is_bold_and_prefixed() {
        let text = render_markdown("## Features", 80);
        let heading = &text.lines[0];
        assert_eq!(line_text(heading), "## Features");
        assert!(
            heading.spans[1]
                .style
                .add_modifier
                .contains(Modifier::BOLD)
        );
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let lines = rendered_lines("first\n\nsecond");
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn soft_breaks_join_into_one_line() {
        let lines = rendered_lines("one\ntwo");
        assert_eq!(lines, vec!["one two"]);
    }

    #[test]
    fn unordered_list_uses_bullets() {
        let lines = rendered_lines("- alpha\n- beta");
        assert_eq!(lines, vec!["• alpha", "• beta"]);
    }

    #[test]
    fn ordered_list_counts_from_start() {
        let lines = rendered_lines("3. three\n4. four");
        assert_eq!(lines, vec!["3. three", "4. four"]);
    }

    #[test]
    fn nested_list_is_indented() {
        let lines = rendered_lines("- outer\n  - inner");
        assert_eq!(lines, vec!["• outer", "  • inner"]);
    }

    #[test]
    fn fenced_code_block_is_indented_and_labeled() {
        let lines = rendered_lines("```rust\nfn main() {}\n```");
        assert_eq!(lines, vec!["    (rust)", "    fn main() {}"]);
    }

    #[test]
    fn inline_code_is_highlighted() {
        let text = render_markdown("run `cargo test` now", 80);
        let code = text.lines[0]
            .spans
            .iter()
            .find(|span| span.content == "cargo test")
            .unwrap();
        assert_eq!(code.style.fg, Some(Color::Yellow));
    }

    #[test]
    fn link_target_is_appended() {
        let lines = rendered_lines("[docs](https://example.com)");
        assert_eq!(lines, vec!["docs (https://example.com)"]);
    }

    #[test]
    fn block_quote_gets_a_gutter() {
        let lines = rendered_lines("> quoted words");
        assert_eq!(lines, vec!["│ quoted words"]);
    }

    #[test]
    fn long_paragraphs_wrap_to_the_width() {
        let source = "word ".repeat(100);
        let text = render_markdown(source.trim_end(), 40);
        assert!(text.lines.len() > 10);
        assert!(text.lines.iter().all(|line| line.width() <= 40));
    }

    #[test]
    fn unbroken_words_are_cut_at_the_width() {
        let source = "x".repeat(100);
        let text = render_markdown(&source, 40);
        assert!(text.lines.iter().all(|line| line.width() <= 40));
        assert_eq!(text.lines.iter().map(|line| line.width()).sum::<usize>(), 100);
    }

    #[test]
    fn wrapped_rows_keep_their_span_style() {
        let source = format!("**{}**", "bold ".repeat(30).trim_end());
        let text = render_markdown(&source, 40);
        assert!(text.lines.len() > 1);
        for line in &text.lines {
            assert!(
                line.spans
                    .iter()
                    .all(|span| span.style.add_modifier.contains(Modifier::BOLD))
            );
        }
    }

    #[test]
    fn rule_spans_the_width() {
        let text = render_markdown("---", 10);
        let rule = text
            .lines
            .iter()
            .map(line_text)
            .find(|line| !line.is_empty())
            .unwrap();
        assert_eq!(rule, "─".repeat(10));
    }
}
