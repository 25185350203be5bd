use chrono::Utc;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::{IssueState, Label};
use crate::icons;
use crate::utils::{contrast_color, format_relative_time, hex_to_color, sanitize, truncate_string};

/// Label chips: the label's colour as background, readable text on top.
pub fn label_spans(labels: &[Label]) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(labels.len() * 2);
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let bg = hex_to_color(&label.color).unwrap_or(Color::Gray);
        spans.push(Span::styled(
            format!(" {} ", sanitize(&label.name)),
            Style::default().bg(bg).fg(contrast_color(&label.color)),
        ));
    }
    spans
}

/// Render the issue table
pub fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_issues();

    if visible.is_empty() {
        let message = if app.loading_issues {
            format!("{} Loading issues...", app.spinner())
        } else if app.filter.has_active_filters() {
            "No issues match the current filters. Press x to clear them.".to_string()
        } else {
            "No issues found.".to_string()
        };
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let header_style = Style::default().fg(Color::Yellow).bold();
    let header = Row::new(
        ["#", "State", "Title", "Labels", "Author", "💬", "Updated"]
            .map(|h| Cell::from(h).style(header_style)),
    )
    .height(1)
    .bottom_margin(1);

    let now = Utc::now();
    let rows: Vec<Row> = visible
        .iter()
        .map(|issue| {
            let (state_icon, state_color) = match issue.state {
                IssueState::Open => (icons::ISSUE_OPEN, Color::Green),
                IssueState::Closed => (icons::ISSUE_CLOSED, Color::Magenta),
            };
            Row::new(vec![
                Cell::from(format!("#{}", issue.number)),
                Cell::from(state_icon).style(Style::default().fg(state_color)),
                Cell::from(truncate_string(&sanitize(&issue.title), 60)),
                Cell::from(Line::from(label_spans(&issue.labels))),
                Cell::from(truncate_string(&issue.user.login, 16))
                    .style(Style::default().fg(Color::Magenta)),
                Cell::from(issue.comments.to_string()),
                Cell::from(format_relative_time(&issue.updated_at, now))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Min(30),
        Constraint::Length(28),
        Constraint::Length(16),
        Constraint::Length(4),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(icons::SELECTOR);

    f.render_stateful_widget(table, area, &mut app.table_state.clone());
}
