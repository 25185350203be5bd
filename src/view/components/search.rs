use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, InputMode};
use crate::icons;

/// Whether the filter bar has anything to show.
pub fn filter_bar_visible(app: &App) -> bool {
    app.input_mode != InputMode::Normal
        || !app.filter.search.is_empty()
        || !app.filter.author.is_empty()
        || !app.filter.labels.is_empty()
}

/// Render the search text, author and label filters on one line
pub fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let value = Style::default().fg(Color::White);
    let cursor = Style::default().fg(Color::Cyan);
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();

    if app.input_mode == InputMode::Search || !app.filter.search.is_empty() {
        spans.push(Span::styled("/", key));
        spans.push(Span::styled(app.filter.search.as_str(), value));
        if app.input_mode == InputMode::Search {
            spans.push(Span::styled(icons::CURSOR, cursor));
        }
        spans.push(Span::raw("  "));
    }

    if app.input_mode == InputMode::Author {
        spans.push(Span::styled("author: ", key));
        spans.push(Span::styled(app.author_input.as_str(), value));
        spans.push(Span::styled(icons::CURSOR, cursor));
        spans.push(Span::raw("  "));
    } else if !app.filter.author.is_empty() {
        spans.push(Span::styled("author: ", key));
        spans.push(Span::styled(app.filter.author.as_str(), value));
        spans.push(Span::raw("  "));
    }

    if !app.filter.labels.is_empty() {
        let names: Vec<&str> = app.filter.labels.iter().map(String::as_str).collect();
        spans.push(Span::styled("labels: ", key));
        spans.push(Span::styled(names.join(" | "), value));
        spans.push(Span::raw("  "));
    }

    spans.push(Span::styled(
        format!("({}/{})", app.filtered_indices.len(), app.issues.len()),
        dim,
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
