use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::icons;

use super::components::{
    filter_bar_visible, render_detail_view, render_error_popup, render_filter_bar,
    render_help_popup, render_labels_popup, render_table, render_tabs, render_tutorial_overlay,
    render_url_popup,
};

/// Main UI rendering function
pub fn ui(f: &mut Frame, app: &App) {
    if app.show_detail {
        render_detail_view(f, app);
    } else {
        render_dashboard(f, app);
    }

    // Render popups (order matters for layering)
    if app.show_labels_popup {
        render_labels_popup(f, app);
    }

    if app.tutorial.state().is_open {
        render_tutorial_overlay(f, app);
    }

    if app.show_help_popup {
        render_help_popup(f);
    }

    if app.show_error_popup {
        if let Some(ref error) = app.error {
            render_error_popup(f, error);
        }
    }

    if let Some(ref url) = app.show_url_popup {
        render_url_popup(f, url);
    }
}

fn render_dashboard(f: &mut Frame, app: &App) {
    let show_filter_bar = filter_bar_visible(app);
    let mut constraints = vec![
        Constraint::Length(1), // Tabs
        Constraint::Length(1), // Separator
        Constraint::Min(0),    // Table
    ];
    if show_filter_bar {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1)); // Legend
    let chunks = Layout::vertical(constraints).split(f.area());

    render_tabs(f, app, chunks[0]);

    let separator = icons::SEPARATOR_CHAR.repeat(chunks[1].width as usize);
    f.render_widget(
        Paragraph::new(separator).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    render_table(f, app, chunks[2]);

    if show_filter_bar {
        render_filter_bar(f, app, chunks[3]);
    }
    render_legend(f, app, chunks[chunks.len() - 1]);
}

/// Bottom line: key hints and when the list was last refreshed
fn render_legend(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = Vec::new();
    for (k, what) in [
        ("⏎", " view  "),
        ("/", " search  "),
        ("l", " labels  "),
        ("s", " sort  "),
        ("n", " new issue  "),
        ("t", " guide  "),
        ("?", " help  "),
        ("q", " quit"),
    ] {
        spans.push(Span::styled(k, key));
        spans.push(Span::raw(what));
    }
    if let Some(at) = app.last_refresh {
        spans.push(Span::raw(format!(
            "   updated {}",
            at.with_timezone(&chrono::Local).format("%H:%M")
        )));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
