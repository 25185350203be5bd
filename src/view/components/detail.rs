use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::{Issue, IssueDetail};
use crate::icons;
use crate::utils::{format_relative_time, sanitize, truncate_string};

use super::markdown::markdown_to_lines;
use super::table::label_spans;

/// Timeline entries shown under the conversation.
const TIMELINE_TAIL: usize = 5;

/// Render the issue detail view as a full page
pub fn render_detail_view(f: &mut Frame, app: &App) {
    let area = f.area();

    let title = match app.detail_issue() {
        Some(issue) => format!(
            " #{} - {} ",
            issue.number,
            truncate_string(&sanitize(&issue.title), 60)
        ),
        None => " Issue ".to_string(),
    };
    let title = if app.loading_detail {
        format!("{} {} ", app.spinner(), title.trim())
    } else {
        title
    };

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [content_area, footer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

    let footer = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("o", Style::default().fg(Color::Yellow)),
        Span::raw(" open  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" back"),
    ]);
    f.render_widget(Paragraph::new(vec![Line::raw(""), footer]), footer_area);

    let Some(issue) = app.detail_issue() else {
        f.render_widget(Paragraph::new("Issue not found"), content_area);
        return;
    };

    let width = content_area.width.saturating_sub(2) as usize;
    let detail = app
        .detail
        .as_ref()
        .filter(|d| d.issue.number == issue.number);
    let lines = detail_lines(issue, detail, app.loading_detail, app.spinner(), width);

    let content = Paragraph::new(lines)
        .scroll((app.detail_scroll, 0))
        .wrap(Wrap { trim: false });
    f.render_widget(content, content_area);
}

fn detail_lines(
    issue: &Issue,
    detail: Option<&IssueDetail>,
    loading: bool,
    spinner: &'static str,
    width: usize,
) -> Vec<Line<'static>> {
    let now = Utc::now();
    let (state_text, state_color) = issue.state.display();
    let separator = || {
        Line::styled(
            icons::SEPARATOR_CHAR.repeat(width),
            Style::default().fg(Color::DarkGray),
        )
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(state_text, Style::default().fg(state_color).bold()),
            Span::raw("  "),
            Span::styled(issue.user.login.clone(), Style::default().fg(Color::Green)),
            Span::styled(
                format!(
                    " opened {} · {} comments",
                    format_relative_time(&issue.created_at, now).to_lowercase(),
                    issue.comments
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];
    if !issue.labels.is_empty() {
        lines.push(Line::from(label_spans(&issue.labels)));
    }
    lines.push(Line::raw(""));

    match issue.body.as_deref().filter(|b| !b.trim().is_empty()) {
        Some(body) => lines.extend(markdown_to_lines(body)),
        None => lines.push(Line::styled(
            "No description provided.",
            Style::default().fg(Color::DarkGray).italic(),
        )),
    }

    let Some(detail) = detail else {
        if loading {
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                Span::styled(spinner, Style::default().fg(Color::Yellow)),
                Span::raw(" Loading conversation..."),
            ]));
        }
        return lines;
    };

    for comment in &detail.comments {
        lines.push(Line::raw(""));
        lines.push(separator());
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", icons::COMMENT)),
            Span::styled(comment.user.login.clone(), Style::default().fg(Color::Green).bold()),
            Span::styled(
                format!(" {}", format_relative_time(&comment.created_at, now).to_lowercase()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::raw(""));
        lines.extend(markdown_to_lines(&comment.body));
    }

    let start = detail.timeline.len().saturating_sub(TIMELINE_TAIL);
    let recent = &detail.timeline[start..];
    if !recent.is_empty() {
        lines.push(Line::raw(""));
        lines.push(separator());
        lines.push(Line::styled(
            "Recent activity",
            Style::default().fg(Color::Yellow).bold(),
        ));
        for event in recent {
            let when = event
                .created_at
                .as_deref()
                .map(|ts| format!(" ({})", format_relative_time(ts, now).to_lowercase()))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", icons::EVENT),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(sanitize(&event.describe())),
                Span::styled(when, Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    lines
}
