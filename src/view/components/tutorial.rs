use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, LineGauge, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::icons;
use crate::tutorial::{TutorialState, STEP_COUNT, TUTORIAL_STEPS};

/// Render the onboarding overlay for the current step
pub fn render_tutorial_overlay(f: &mut Frame, app: &App) {
    let state = app.tutorial.state();
    let step = state.step();
    let area = f.area();
    let popup_area = super::centered_rect(
        72.min(area.width.saturating_sub(2)),
        24.min(area.height.saturating_sub(2)),
        area,
    );

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(
            " Getting Started · step {} of {} ",
            state.current_step + 1,
            STEP_COUNT
        ))
        .title_style(Style::default().fg(Color::Cyan).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let [steps_area, gauge_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(2),
    ])
    .areas(inner);

    f.render_widget(Line::from(step_markers(state)).centered(), steps_area);

    let gauge = LineGauge::default()
        .filled_style(Style::default().fg(Color::Cyan))
        .unfilled_style(Style::default().fg(Color::DarkGray))
        .ratio(progress_ratio(state));
    f.render_widget(gauge, gauge_area);

    let mut lines = vec![
        Line::raw(""),
        Line::styled(step.title, Style::default().fg(Color::Cyan).bold()),
        Line::styled(step.description, Style::default().fg(Color::Gray).italic()),
        Line::raw(""),
    ];
    for point in step.points {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", icons::BULLET), Style::default().fg(Color::Yellow)),
            Span::raw(*point),
        ]));
    }
    if let Some(link) = step.link {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("o", Style::default().fg(Color::Yellow).bold()),
            Span::raw(" "),
            Span::styled(
                link.text,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled(
                format!("  {}", link.target.url(&app.repo_owner, &app.repo_name)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        body_area,
    );

    f.render_widget(
        Paragraph::new(vec![Line::raw(""), footer(state)]),
        footer_area,
    );
}

/// One marker per step: done, current or still to come.
fn step_markers(state: &TutorialState) -> Vec<Span<'static>> {
    let completed = state.user_progress.completed_steps();
    let mut spans = Vec::with_capacity(STEP_COUNT * 2);
    for (i, step) in TUTORIAL_STEPS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(
                icons::SEPARATOR_CHAR.repeat(3),
                Style::default().fg(Color::DarkGray),
            ));
        }
        let (marker, color) = if i == state.current_step {
            (icons::STEP_CURRENT, Color::Cyan)
        } else if completed.contains(&step.id) || (state.is_completed && i < state.current_step) {
            (icons::STEP_DONE, Color::Green)
        } else {
            (icons::STEP_TODO, Color::DarkGray)
        };
        spans.push(Span::styled(marker, Style::default().fg(color)));
    }
    spans
}

fn progress_ratio(state: &TutorialState) -> f64 {
    (state.current_step + 1) as f64 / STEP_COUNT as f64
}

fn footer(state: &TutorialState) -> Line<'static> {
    let key = Style::default().fg(Color::Yellow);
    let next = if state.is_last_step() { " finish  " } else { " next  " };

    let mut spans = Vec::new();
    if !state.is_first_step() {
        spans.push(Span::styled("←/h", key));
        spans.push(Span::raw(" back  "));
    }
    spans.push(Span::styled("→/l/⏎", key));
    spans.push(Span::raw(next));
    if state.can_skip() {
        spans.push(Span::styled("s", key));
        spans.push(Span::raw(" skip  "));
    }
    spans.push(Span::styled("1-5", key));
    spans.push(Span::raw(" jump  "));
    spans.push(Span::styled("R", key));
    spans.push(Span::raw(" restart  "));
    spans.push(Span::styled("Esc", key));
    spans.push(Span::raw(" close"));
    Line::from(spans).centered()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutorial::{reduce, TutorialAction};
    use chrono::Utc;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn skip_hint_only_on_skippable_steps() {
        let first = TutorialState::default();
        assert!(text(&footer(&first)).contains("skip"));
        assert!(!text(&footer(&first)).contains("back"));

        let tour = reduce(first, TutorialAction::GoToStep(2), Utc::now());
        assert!(!text(&footer(&tour)).contains("skip"));
        assert!(text(&footer(&tour)).contains("back"));
    }

    #[test]
    fn markers_track_progress() {
        let now = Utc::now();
        let state = reduce(
            TutorialState::default(),
            TutorialAction::MarkStepCompleted(crate::tutorial::StepId::Welcome),
            now,
        );
        let state = reduce(state, TutorialAction::Next, now);
        let markers: Vec<String> = step_markers(&state)
            .into_iter()
            .map(|s| s.content.into_owned())
            .filter(|s| !s.starts_with(icons::SEPARATOR_CHAR))
            .collect();
        assert_eq!(
            markers,
            vec![
                icons::STEP_DONE,
                icons::STEP_CURRENT,
                icons::STEP_TODO,
                icons::STEP_TODO,
                icons::STEP_TODO
            ]
        );
        assert!((progress_ratio(&state) - 0.4).abs() < f64::EPSILON);
    }
}
