use sea_query::Iden;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::icons;

pub const CACHE_VERSION: i32 = 1;

// Database table identifiers
#[derive(Iden)]
pub enum CacheMeta {
    Table,
    Key,
    Value,
}

#[derive(Iden)]
pub enum QueryCacheTable {
    Table,
    Key,
    Payload,
    FetchedAt,
}

#[derive(Iden)]
pub enum KeyValueTable {
    Table,
    Key,
    Value,
}

// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn display(self) -> (&'static str, ratatui::style::Color) {
        use ratatui::style::Color;
        match self {
            IssueState::Open => (icons::ISSUE_OPEN_DISPLAY, Color::Green),
            IssueState::Closed => (icons::ISSUE_CLOSED_DISPLAY, Color::Magenta),
        }
    }
}

// State filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StateFilter {
    pub fn to_str(self) -> &'static str {
        match self {
            StateFilter::All => "all",
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
        }
    }

    /// Value for the `state` query parameter; `all` omits it.
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            StateFilter::All => None,
            other => Some(other.to_str()),
        }
    }

    pub fn matches(self, state: IssueState) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Open => state == IssueState::Open,
            StateFilter::Closed => state == IssueState::Closed,
        }
    }
}

// Sort mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    MostCommented,
    RecentlyUpdated,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Newest,
        SortMode::Oldest,
        SortMode::MostCommented,
        SortMode::RecentlyUpdated,
    ];

    pub fn to_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::MostCommented => "most_commented",
            SortMode::RecentlyUpdated => "recently_updated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Newest => "Newest",
            SortMode::Oldest => "Oldest",
            SortMode::MostCommented => "Most commented",
            SortMode::RecentlyUpdated => "Recently updated",
        }
    }

    /// The `(sort, direction)` pair the REST API understands.
    pub fn api_params(self) -> (&'static str, &'static str) {
        match self {
            SortMode::Newest => ("created", "desc"),
            SortMode::Oldest => ("created", "asc"),
            SortMode::MostCommented => ("comments", "desc"),
            SortMode::RecentlyUpdated => ("updated", "desc"),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every predicate and the sort order applied to the issue list.
///
/// Edits never mutate in place: each `with_*` call returns a new spec, so the
/// dashboard always swaps in a fully populated value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub state: StateFilter,
    pub labels: BTreeSet<String>,
    pub author: String,
    pub search: String,
    pub sort: SortMode,
}

impl FilterSpec {
    pub fn with_state(&self, state: StateFilter) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort: SortMode) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    pub fn with_author(&self, author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_labels<I, S>(&self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Add the label if absent, remove it if present.
    pub fn toggle_label(&self, name: &str) -> Self {
        let mut labels = self.labels.clone();
        if !labels.remove(name) {
            labels.insert(name.to_string());
        }
        Self {
            labels,
            ..self.clone()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.state != StateFilter::All
            || !self.labels.is_empty()
            || !self.author.is_empty()
            || !self.search.is_empty()
    }

    /// Cache key for the upstream query this spec needs.
    /// Only state and sort are sent to the server.
    pub fn cache_key(&self) -> String {
        format!("issues:{}:{}", self.state.to_str(), self.sort.to_str())
    }
}

/// Counts over the filtered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_fully_populated() {
        let spec = FilterSpec::default();
        assert_eq!(spec.state, StateFilter::All);
        assert!(spec.labels.is_empty());
        assert!(spec.author.is_empty());
        assert!(spec.search.is_empty());
        assert_eq!(spec.sort, SortMode::Newest);
        assert!(!spec.has_active_filters());
    }

    #[test]
    fn toggle_label_adds_then_removes() {
        let spec = FilterSpec::default().toggle_label("bug");
        assert!(spec.labels.contains("bug"));
        assert!(spec.has_active_filters());
        let spec = spec.toggle_label("bug");
        assert!(spec.labels.is_empty());
    }

    #[test]
    fn sort_cycles_through_all_modes() {
        let mut mode = SortMode::Newest;
        for _ in 0..SortMode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, SortMode::Newest);
    }

    #[test]
    fn cache_key_ignores_client_side_predicates() {
        let a = FilterSpec::default().with_search("crash").with_author("bob");
        assert_eq!(a.cache_key(), FilterSpec::default().cache_key());
        let b = FilterSpec::default().with_state(StateFilter::Open);
        assert_eq!(b.cache_key(), "issues:open:newest");
    }
}
