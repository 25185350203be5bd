use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::icons;
use crate::utils::{hex_to_color, sanitize, truncate_string};

const HELP_KEYS: &[(&str, &str)] = &[
    ("/", "Search title and body"),
    ("a / A", "Filter by author / selected author"),
    ("l", "Filter by labels"),
    ("1 2 3", "All / open / closed"),
    ("s", "Cycle sort order"),
    ("x", "Clear filters"),
    ("j/↓ k/↑", "Move down / up"),
    ("g/G", "Go to top/bottom"),
    ("⏎", "Show issue"),
    ("o", "Open issue in browser"),
    ("n", "New issue on GitHub"),
    ("r", "Refresh"),
    ("t", "Getting started guide"),
    ("q", "Quit"),
];

fn popup_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(color).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Render the help popup
pub fn render_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(48, HELP_KEYS.len() as u16 + 4, area);
    f.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = HELP_KEYS
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{:<9}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::from("Press any key to close").centered());

    f.render_widget(Paragraph::new(lines).block(popup_block(" Help ", Color::Cyan)), popup_area);
}

/// Render the error popup
pub fn render_error_popup(f: &mut Frame, error: &str) {
    let area = f.area();
    let popup_width = (area.width * 60 / 100).max(40).min(area.width.saturating_sub(4));
    let popup_area = centered_rect(popup_width, 7, area);

    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(sanitize(error))
        .style(Style::default().fg(Color::White))
        .block(popup_block(" Error ", Color::Red))
        .wrap(Wrap { trim: true });
    f.render_widget(error_paragraph, popup_area);

    let hint_area = Rect {
        x: popup_area.x,
        y: popup_area.y + popup_area.height,
        width: popup_area.width,
        height: 1,
    };
    if hint_area.y < area.height {
        let hint = Line::from(vec![
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" retry  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" dismiss"),
        ])
        .centered();
        f.render_widget(hint, hint_area);
    }
}

/// Render the link popup shown when no browser could be launched
pub fn render_url_popup(f: &mut Frame, url: &str) {
    let area = f.area();
    let popup_width = (url.chars().count() as u16 + 4)
        .max(40)
        .min(area.width.saturating_sub(4));
    let popup_area = centered_rect(popup_width, 6, area);

    f.render_widget(Clear, popup_area);

    let content = vec![
        Line::from("Could not open a browser. Visit:"),
        Line::styled(url.to_string(), Style::default().fg(Color::Cyan)),
        Line::raw(""),
        Line::from("Press Esc to close").centered(),
    ];
    let popup = Paragraph::new(content)
        .block(popup_block(" Link ", Color::Cyan))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, popup_area);
}

/// Render the label picker: fuzzy query on top, matching labels below
pub fn render_labels_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_height = 18u16.min(area.height.saturating_sub(2));
    let popup_area = centered_rect(56, popup_height, area);

    f.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(Color::Yellow)),
            Span::styled(app.label_query.as_str(), Style::default().fg(Color::White)),
            Span::styled(icons::CURSOR, Style::default().fg(Color::Cyan)),
        ]),
        Line::raw(""),
    ];

    // Rows left for the list after the query, spacer, hint and borders
    let visible_rows = popup_height.saturating_sub(6) as usize;
    let selected = app.labels_list_state.selected().unwrap_or(0);
    let offset = selected.saturating_sub(visible_rows.saturating_sub(1));

    if app.label_matches.is_empty() {
        let message = if app.loading_labels {
            format!("{} Loading labels...", app.spinner())
        } else if app.labels.is_empty() {
            "No labels in this repository".to_string()
        } else {
            "No labels match".to_string()
        };
        lines.push(Line::styled(message, Style::default().fg(Color::DarkGray)));
    }

    for (i, &idx) in app
        .label_matches
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
    {
        let Some(label) = app.labels.get(idx) else {
            continue;
        };
        let is_selected = i == selected;
        let checked = if app.filter.labels.contains(&label.name) {
            icons::MARKED
        } else {
            icons::UNMARKED
        };
        let prefix = if is_selected { icons::SELECTOR } else { "  " };
        let name_style = if is_selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::White)
        };
        let swatch = hex_to_color(&label.color).unwrap_or(Color::Gray);

        let mut spans = vec![
            Span::raw(prefix),
            Span::raw(checked),
            Span::styled(icons::SWATCH, Style::default().fg(swatch)),
            Span::raw(" "),
            Span::styled(sanitize(&label.name), name_style),
        ];
        if let Some(description) = label.description.as_deref().filter(|d| !d.is_empty()) {
            spans.push(Span::styled(
                format!("  {}", truncate_string(&sanitize(description), 28)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("⏎", Style::default().fg(Color::Yellow)),
        Span::raw(" toggle  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" close"),
    ]));

    let title = format!(" Labels ({} selected) ", app.filter.labels.len());
    let popup = Paragraph::new(lines).block(popup_block(&title, Color::Cyan));
    f.render_widget(popup, popup_area);
}

/// Calculate a centered rectangle within an area
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [vertical] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [centered] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vertical);
    centered
}
