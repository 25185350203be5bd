use chrono::Utc;
use ratatui::widgets::TableState;
use tracing::{debug, warn};

use crate::data::{FilterSpec, Issue, IssueDetail, Label, StateFilter};
use crate::services::filter_labels;
use crate::tutorial::{StepId, TutorialAction};
use crate::utils::new_issue_url;

use super::message::{Command, FetchRequest, FetchResult, Message};
use super::model::{App, InputMode};

/// Update the application state based on a message.
/// Returns an optional command to be executed by the main loop.
pub fn update(app: &mut App, msg: Message) -> Option<Command> {
    match msg {
        // Navigation
        Message::NextItem => {
            next_item(app);
            None
        }
        Message::PreviousItem => {
            previous_item(app);
            None
        }
        Message::GoToTop => {
            if !app.filtered_indices.is_empty() {
                app.table_state.select(Some(0));
            }
            None
        }
        Message::GoToBottom => {
            if !app.filtered_indices.is_empty() {
                app.table_state.select(Some(app.filtered_indices.len() - 1));
            }
            None
        }

        // Filters
        Message::SetStateFilter(state) => {
            if app.filter.state == state {
                return None;
            }
            let filter = app.filter.with_state(state);
            app.set_filter(filter);
            request_issues(app)
        }
        Message::CycleSort => {
            let filter = app.filter.with_sort(app.filter.sort.next());
            app.set_filter(filter);
            request_issues(app)
        }
        Message::ClearFilters => {
            let sort = app.filter.sort;
            let state_changed = app.filter.state != StateFilter::All;
            app.author_input.clear();
            app.set_filter(FilterSpec::default().with_sort(sort));
            if state_changed {
                request_issues(app)
            } else {
                None
            }
        }
        Message::FilterBySelectedAuthor => {
            if let Some(login) = app.selected_issue().map(|i| i.user.login.clone()) {
                app.author_input = login.clone();
                let filter = app.filter.with_author(login);
                app.set_filter(filter);
            }
            None
        }

        // Actions
        Message::OpenSelected => {
            let url = if app.show_detail {
                app.detail_issue().map(|i| i.html_url.clone())
            } else {
                app.selected_issue().map(|i| i.html_url.clone())
            };
            url.map(Command::OpenUrl)
        }
        Message::NewIssue => Some(Command::OpenUrl(new_issue_url(
            &app.repo_owner,
            &app.repo_name,
            &app.filter.search,
        ))),
        Message::Refresh => {
            app.show_error_popup = false;
            let issues = FetchRequest::Issues {
                state: app.filter.state,
                sort: app.filter.sort,
            };
            if app.show_detail {
                app.detail_number
                    .map(|n| Command::StartFetch(FetchRequest::Detail(n)))
            } else {
                Some(Command::Batch(vec![
                    Command::StartFetch(issues),
                    Command::StartFetch(FetchRequest::Labels),
                ]))
            }
        }

        // Search
        Message::EnterSearchMode => {
            app.input_mode = InputMode::Search;
            None
        }
        Message::ExitSearchMode { clear } => {
            app.input_mode = InputMode::Normal;
            if clear && !app.filter.search.is_empty() {
                let filter = app.filter.with_search("");
                app.set_filter(filter);
            }
            None
        }
        Message::SearchInput(c) => {
            let mut search = app.filter.search.clone();
            search.push(c);
            let filter = app.filter.with_search(search);
            app.set_filter(filter);
            None
        }
        Message::SearchBackspace => {
            let mut search = app.filter.search.clone();
            search.pop();
            let filter = app.filter.with_search(search);
            app.set_filter(filter);
            None
        }

        // Author
        Message::EnterAuthorMode => {
            app.input_mode = InputMode::Author;
            app.author_input = app.filter.author.clone();
            None
        }
        Message::ExitAuthorMode { apply } => {
            app.input_mode = InputMode::Normal;
            if apply {
                let filter = app.filter.with_author(app.author_input.trim());
                app.set_filter(filter);
            } else {
                app.author_input = app.filter.author.clone();
            }
            None
        }
        Message::AuthorInput(c) => {
            app.author_input.push(c);
            None
        }
        Message::AuthorBackspace => {
            app.author_input.pop();
            None
        }

        // Labels
        Message::OpenLabelsPopup => open_labels_popup(app),
        Message::CloseLabelsPopup => {
            app.show_labels_popup = false;
            None
        }
        Message::LabelQueryInput(c) => {
            app.label_query.push(c);
            refresh_label_matches(app);
            None
        }
        Message::LabelQueryBackspace => {
            app.label_query.pop();
            refresh_label_matches(app);
            None
        }
        Message::LabelsNext => {
            labels_next(app);
            None
        }
        Message::LabelsPrevious => {
            labels_previous(app);
            None
        }
        Message::ToggleSelectedLabel => {
            if let Some(name) = app.selected_label().map(|l| l.name.clone()) {
                let filter = app.filter.toggle_label(&name);
                app.set_filter(filter);
            }
            None
        }

        // Detail view
        Message::OpenDetail => open_detail(app),
        Message::CloseDetail => {
            app.show_detail = false;
            app.loading_detail = false;
            None
        }
        Message::DetailScrollDown => {
            app.detail_scroll = app.detail_scroll.saturating_add(1);
            None
        }
        Message::DetailScrollUp => {
            app.detail_scroll = app.detail_scroll.saturating_sub(1);
            None
        }

        // Popups
        Message::ToggleHelp => {
            app.show_help_popup = !app.show_help_popup;
            None
        }
        Message::DismissHelp => {
            app.show_help_popup = false;
            None
        }
        Message::DismissError => {
            app.show_error_popup = false;
            None
        }
        Message::ShowUrl(url) => {
            app.show_url_popup = Some(url);
            None
        }
        Message::DismissUrl => {
            app.show_url_popup = None;
            None
        }

        // Tutorial
        Message::OpenTutorial => {
            app.tutorial.dispatch(TutorialAction::Open);
            None
        }
        Message::CloseTutorial => {
            app.tutorial.dispatch(TutorialAction::Close);
            None
        }
        Message::TutorialNext => {
            tutorial_next(app);
            None
        }
        Message::TutorialPrevious => {
            app.tutorial.dispatch(TutorialAction::Previous);
            None
        }
        Message::TutorialSkip => {
            if app.tutorial.state().can_skip() {
                app.tutorial.dispatch(TutorialAction::Skip);
            }
            None
        }
        Message::TutorialGoTo(index) => {
            let index = i64::try_from(index).unwrap_or(i64::MAX);
            app.tutorial.dispatch(TutorialAction::GoToStep(index));
            None
        }
        Message::TutorialOpenLink => tutorial_open_link(app),
        Message::ResetTutorial => {
            app.tutorial.dispatch(TutorialAction::Reset);
            app.tutorial.dispatch(TutorialAction::Open);
            None
        }

        // Async results
        Message::FetchComplete(result) => {
            handle_fetch_result(app, result);
            None
        }

        // System
        Message::Tick => {
            if app.is_loading() {
                app.update_spinner();
            }
            None
        }
        Message::Quit => Some(Command::Quit),
    }
}

/// Requests for the first frame: cached data is painted immediately, stale
/// or missing entries are fetched.
pub fn initial_fetch(app: &mut App) -> Option<Command> {
    let commands: Vec<Command> = [request_issues(app), request_labels(app)]
        .into_iter()
        .flatten()
        .collect();
    match commands.len() {
        0 => None,
        _ => Some(Command::Batch(commands)),
    }
}

// Helper functions

fn next_item(app: &mut App) {
    if app.filtered_indices.is_empty() {
        return;
    }
    let i = match app.table_state.selected() {
        Some(i) if i + 1 < app.filtered_indices.len() => i + 1,
        Some(i) => i,
        None => 0,
    };
    app.table_state.select(Some(i));
}

fn previous_item(app: &mut App) {
    if app.filtered_indices.is_empty() {
        return;
    }
    let i = app.table_state.selected().map_or(0, |i| i.saturating_sub(1));
    app.table_state.select(Some(i));
}

/// Paint the cached list for the current state/sort and fetch it when stale.
fn request_issues(app: &mut App) -> Option<Command> {
    let request = FetchRequest::Issues {
        state: app.filter.state,
        sort: app.filter.sort,
    };
    let key = request.cache_key();

    if let Some(entry) = app.cached::<Vec<Issue>>(&key) {
        let fresh = entry.is_fresh(app.config.issues_max_age(), Utc::now());
        debug!(key = %key, fresh, "issues served from cache");
        app.last_refresh = Some(entry.fetched_at);
        app.set_issues(entry.value);
        if fresh {
            app.loading_issues = false;
            return None;
        }
    }
    Some(Command::StartFetch(request))
}

fn request_labels(app: &mut App) -> Option<Command> {
    if let Some(entry) = app.cached::<Vec<Label>>(&FetchRequest::Labels.cache_key()) {
        let fresh = entry.is_fresh(app.config.labels_max_age(), Utc::now());
        app.labels = entry.value;
        if fresh {
            return None;
        }
    }
    Some(Command::StartFetch(FetchRequest::Labels))
}

fn open_detail(app: &mut App) -> Option<Command> {
    let number = app.selected_issue()?.number;
    app.show_detail = true;
    app.detail_scroll = 0;
    app.detail_number = Some(number);

    let request = FetchRequest::Detail(number);
    if let Some(entry) = app.cached::<IssueDetail>(&request.cache_key()) {
        let fresh = entry.is_fresh(app.config.detail_max_age(), Utc::now());
        app.detail = Some(entry.value);
        if fresh {
            app.loading_detail = false;
            return None;
        }
    } else if app.detail.as_ref().map(|d| d.issue.number) != Some(number) {
        app.detail = None;
    }
    Some(Command::StartFetch(request))
}

fn open_labels_popup(app: &mut App) -> Option<Command> {
    app.show_labels_popup = true;
    app.label_query.clear();
    refresh_label_matches(app);
    if app.labels.is_empty() && !app.loading_labels {
        return Some(Command::StartFetch(FetchRequest::Labels));
    }
    None
}

fn refresh_label_matches(app: &mut App) {
    app.label_matches = filter_labels(&app.labels, &app.label_query);
    app.labels_list_state = TableState::default();
    if !app.label_matches.is_empty() {
        app.labels_list_state.select(Some(0));
    }
}

fn labels_next(app: &mut App) {
    if app.label_matches.is_empty() {
        return;
    }
    let i = match app.labels_list_state.selected() {
        Some(i) if i + 1 < app.label_matches.len() => i + 1,
        Some(i) => i,
        None => 0,
    };
    app.labels_list_state.select(Some(i));
}

fn labels_previous(app: &mut App) {
    if app.label_matches.is_empty() {
        return;
    }
    let i = app
        .labels_list_state
        .selected()
        .map_or(0, |i| i.saturating_sub(1));
    app.labels_list_state.select(Some(i));
}

/// Advancing marks the current step done; advancing from the last step
/// finishes the tutorial and closes the overlay.
fn tutorial_next(app: &mut App) {
    let state = app.tutorial.state();
    let step = state.step().id;
    let at_last = state.is_last_step();

    app.tutorial.dispatch(TutorialAction::MarkStepCompleted(step));
    if at_last {
        app.tutorial.dispatch(TutorialAction::Close);
    } else {
        app.tutorial.dispatch(TutorialAction::Next);
    }
}

fn tutorial_open_link(app: &mut App) -> Option<Command> {
    let step = app.tutorial.state().step();
    let link = step.link?;
    if step.id == StepId::Signup {
        app.tutorial
            .dispatch(TutorialAction::MarkStepCompleted(StepId::Signup));
    }
    Some(Command::OpenUrl(
        link.target.url(&app.repo_owner, &app.repo_name),
    ))
}

fn handle_fetch_result(app: &mut App, result: FetchResult) {
    match result {
        FetchResult::Issues { key, issues } => {
            // Late responses for another state/sort only refresh the cache
            if key != app.filter.cache_key() {
                debug!(key = %key, "ignoring issues for an inactive query");
                return;
            }
            app.loading_issues = false;
            app.last_refresh = Some(Utc::now());
            app.set_issues(issues);
        }
        FetchResult::Labels(labels) => {
            app.loading_labels = false;
            app.labels = labels;
            if app.show_labels_popup {
                refresh_label_matches(app);
            }
        }
        FetchResult::Detail(detail) => {
            if app.detail_number == Some(detail.issue.number) {
                app.loading_detail = false;
                app.detail = Some(*detail);
            }
        }
        FetchResult::Error { request, message } => {
            warn!(?request, error = %message, "fetch failed");
            if matches!(request, FetchRequest::Issues { .. })
                && request.cache_key() != app.filter.cache_key()
            {
                debug!(key = %request.cache_key(), "ignoring failure for an inactive query");
                return;
            }
            match request {
                FetchRequest::Issues { .. } => app.loading_issues = false,
                FetchRequest::Labels => app.loading_labels = false,
                FetchRequest::Detail(_) => app.loading_detail = false,
            }
            app.error = Some(format!("Failed to load {}: {}", request.describe(), message));
            app.show_error_popup = true;
        }
    }
}
