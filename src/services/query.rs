use std::cmp::Reverse;

use crate::data::{FilterSpec, Issue, SortMode, Stats};

/// Ordered view over an issue list plus its counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    /// Indices into the input slice, in display order.
    pub indices: Vec<usize>,
    pub stats: Stats,
}

/// Filter and sort `issues` according to `filter`.
pub fn run_query(issues: &[Issue], filter: &FilterSpec) -> QueryResult {
    let indices = filter_issues(issues, filter);
    let stats = compute_stats(issues, &indices);
    QueryResult { indices, stats }
}

/// Indices of the issues matching every predicate in `filter`,
/// stably sorted by its sort mode.
pub fn filter_issues(issues: &[Issue], filter: &FilterSpec) -> Vec<usize> {
    // Lowercase once instead of per issue
    let needle = filter.search.to_lowercase();

    let mut indices: Vec<usize> = issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| matches(issue, filter, &needle))
        .map(|(idx, _)| idx)
        .collect();

    // sort_by_cached_key is stable, so ties keep their input order
    match filter.sort {
        SortMode::Newest => indices.sort_by_cached_key(|&i| Reverse(issues[i].created())),
        SortMode::Oldest => indices.sort_by_cached_key(|&i| issues[i].created()),
        SortMode::MostCommented => indices.sort_by_key(|&i| Reverse(issues[i].comments)),
        SortMode::RecentlyUpdated => {
            indices.sort_by_cached_key(|&i| Reverse(issues[i].updated()))
        }
    }

    indices
}

fn matches(issue: &Issue, filter: &FilterSpec, needle: &str) -> bool {
    if !filter.state.matches(issue.state) {
        return false;
    }

    if !filter.labels.is_empty() && !filter.labels.iter().any(|name| issue.has_label(name)) {
        return false;
    }

    if !filter.author.is_empty() && issue.user.login != filter.author {
        return false;
    }

    if !needle.is_empty() {
        let in_title = issue.title.to_lowercase().contains(needle);
        let in_body = issue
            .body
            .as_deref()
            .is_some_and(|b| b.to_lowercase().contains(needle));
        if !in_title && !in_body {
            return false;
        }
    }

    true
}

/// Counts over the issues selected by `indices`.
pub fn compute_stats(issues: &[Issue], indices: &[usize]) -> Stats {
    let open = indices
        .iter()
        .filter_map(|&i| issues.get(i))
        .filter(|issue| issue.is_open())
        .count();
    let total = indices.iter().filter(|&&i| i < issues.len()).count();
    Stats {
        total,
        open,
        closed: total - open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{IssueState, Label, StateFilter, User};

    fn issue(id: u64, created: &str, comments: u64, state: IssueState) -> Issue {
        Issue {
            id,
            number: id,
            title: format!("Issue {}", id),
            body: None,
            state,
            created_at: created.to_string(),
            updated_at: created.to_string(),
            closed_at: None,
            html_url: String::new(),
            user: User {
                login: "alice".to_string(),
                avatar_url: String::new(),
                html_url: String::new(),
            },
            labels: Vec::new(),
            comments,
        }
    }

    fn ids(issues: &[Issue], indices: &[usize]) -> Vec<u64> {
        indices.iter().map(|&i| issues[i].id).collect()
    }

    #[test]
    fn newest_first_with_stats() {
        let issues = vec![
            issue(1, "2024-01-01T00:00:00Z", 5, IssueState::Open),
            issue(2, "2024-06-01T00:00:00Z", 2, IssueState::Closed),
        ];
        let result = run_query(&issues, &FilterSpec::default());
        assert_eq!(ids(&issues, &result.indices), vec![2, 1]);
        assert_eq!(
            result.stats,
            Stats {
                total: 2,
                open: 1,
                closed: 1
            }
        );
    }

    #[test]
    fn oldest_first() {
        let issues = vec![
            issue(1, "2024-06-01T00:00:00Z", 0, IssueState::Open),
            issue(2, "2024-01-01T00:00:00Z", 0, IssueState::Open),
        ];
        let spec = FilterSpec::default().with_sort(SortMode::Oldest);
        assert_eq!(ids(&issues, &filter_issues(&issues, &spec)), vec![2, 1]);
    }

    #[test]
    fn most_commented_keeps_ties_in_input_order() {
        let issues = vec![
            issue(1, "2024-01-01T00:00:00Z", 3, IssueState::Open),
            issue(2, "2024-02-01T00:00:00Z", 7, IssueState::Open),
            issue(3, "2024-03-01T00:00:00Z", 3, IssueState::Open),
        ];
        let spec = FilterSpec::default().with_sort(SortMode::MostCommented);
        assert_eq!(ids(&issues, &filter_issues(&issues, &spec)), vec![2, 1, 3]);
    }

    #[test]
    fn recently_updated_first() {
        let mut a = issue(1, "2024-01-01T00:00:00Z", 0, IssueState::Open);
        a.updated_at = "2024-09-01T00:00:00Z".to_string();
        let b = issue(2, "2024-05-01T00:00:00Z", 0, IssueState::Open);
        let issues = vec![b, a];
        let spec = FilterSpec::default().with_sort(SortMode::RecentlyUpdated);
        assert_eq!(ids(&issues, &filter_issues(&issues, &spec)), vec![1, 2]);
    }

    #[test]
    fn malformed_timestamp_sorts_last_under_newest() {
        let issues = vec![
            issue(1, "yesterday-ish", 0, IssueState::Open),
            issue(2, "2020-01-01T00:00:00Z", 0, IssueState::Open),
        ];
        let result = filter_issues(&issues, &FilterSpec::default());
        assert_eq!(ids(&issues, &result), vec![2, 1]);
    }

    #[test]
    fn labels_use_or_semantics() {
        let bug = Label {
            id: 1,
            name: "bug".to_string(),
            color: "d73a4a".to_string(),
            description: None,
        };
        let docs = Label {
            id: 2,
            name: "docs".to_string(),
            color: "0075ca".to_string(),
            description: None,
        };
        let mut a = issue(1, "2024-01-01T00:00:00Z", 0, IssueState::Open);
        a.labels = vec![bug];
        let mut b = issue(2, "2024-01-02T00:00:00Z", 0, IssueState::Open);
        b.labels = vec![docs];
        let c = issue(3, "2024-01-03T00:00:00Z", 0, IssueState::Open);
        let issues = vec![a, b, c];

        let spec = FilterSpec::default().with_labels(["bug", "docs"]);
        assert_eq!(ids(&issues, &filter_issues(&issues, &spec)), vec![2, 1]);

        let spec = FilterSpec::default().with_labels(["wontfix"]);
        assert!(filter_issues(&issues, &spec).is_empty());
    }

    #[test]
    fn author_is_exact_match() {
        let mut a = issue(1, "2024-01-01T00:00:00Z", 0, IssueState::Open);
        a.user.login = "Bob".to_string();
        let b = issue(2, "2024-01-02T00:00:00Z", 0, IssueState::Open);
        let issues = vec![a, b];
        assert_eq!(
            ids(
                &issues,
                &filter_issues(&issues, &FilterSpec::default().with_author("Bob"))
            ),
            vec![1]
        );
        assert!(filter_issues(&issues, &FilterSpec::default().with_author("bob")).is_empty());
    }

    #[test]
    fn search_matches_title_or_body_case_insensitively() {
        let mut a = issue(1, "2024-01-01T00:00:00Z", 0, IssueState::Open);
        a.title = "Wallet CRASH on login".to_string();
        let mut b = issue(2, "2024-01-02T00:00:00Z", 0, IssueState::Open);
        b.body = Some("The app crashes when swapping".to_string());
        let c = issue(3, "2024-01-03T00:00:00Z", 0, IssueState::Open);
        let issues = vec![a, b, c];

        let spec = FilterSpec::default().with_search("crash");
        assert_eq!(ids(&issues, &filter_issues(&issues, &spec)), vec![2, 1]);
    }

    #[test]
    fn state_filter_applies_and_stats_follow_the_filtered_set() {
        let issues = vec![
            issue(1, "2024-01-01T00:00:00Z", 0, IssueState::Open),
            issue(2, "2024-01-02T00:00:00Z", 0, IssueState::Closed),
            issue(3, "2024-01-03T00:00:00Z", 0, IssueState::Open),
        ];
        let spec = FilterSpec::default().with_state(StateFilter::Open);
        let result = run_query(&issues, &spec);
        assert_eq!(ids(&issues, &result.indices), vec![3, 1]);
        assert_eq!(
            result.stats,
            Stats {
                total: 2,
                open: 2,
                closed: 0
            }
        );
    }

    #[test]
    fn empty_input() {
        let result = run_query(&[], &FilterSpec::default().with_search("x"));
        assert!(result.indices.is_empty());
        assert_eq!(result.stats, Stats::default());
    }
}
