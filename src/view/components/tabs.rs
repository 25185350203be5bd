use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    Frame,
};

use crate::app::App;
use crate::data::StateFilter;

/// Render the state tabs, result counts and repository name
pub fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_style = |state: StateFilter| {
        if app.filter.state == state {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let stats = app.stats;
    let tabs = [
        (StateFilter::All, "All", stats.total),
        (StateFilter::Open, "Open", stats.open),
        (StateFilter::Closed, "Closed", stats.closed),
    ];
    let mut spans = Vec::with_capacity(tabs.len() + 1);
    for (i, (state, name, count)) in tabs.into_iter().enumerate() {
        spans.push(Span::styled(
            format!(" [{}] {} ({}) ", i + 1, name, count),
            tab_style(state),
        ));
    }
    spans.push(Span::styled(
        format!(" sort: {}", app.filter.sort),
        Style::default().fg(Color::Yellow),
    ));
    let left = Line::from(spans);

    let loading_indicator = if app.is_loading() {
        format!("{} ", app.spinner())
    } else {
        String::new()
    };
    let right = Line::from(vec![
        Span::styled(loading_indicator, Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("{} ", app.repo_slug()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let chunks = Layout::horizontal([Constraint::Min(0), Constraint::Length(right.width() as u16)])
        .split(area);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}
