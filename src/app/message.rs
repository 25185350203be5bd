use crate::data::{Issue, IssueDetail, Label, SortMode, StateFilter};

/// Work for the background fetch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    Issues { state: StateFilter, sort: SortMode },
    Labels,
    Detail(u64),
}

impl FetchRequest {
    /// Key under which the response is cached.
    pub fn cache_key(&self) -> String {
        match self {
            FetchRequest::Issues { state, sort } => {
                format!("issues:{}:{}", state.to_str(), sort.to_str())
            }
            FetchRequest::Labels => "labels".to_string(),
            FetchRequest::Detail(number) => format!("issue:{}", number),
        }
    }

    /// What failed, for the error popup.
    pub fn describe(&self) -> String {
        match self {
            FetchRequest::Issues { .. } => "issues".to_string(),
            FetchRequest::Labels => "labels".to_string(),
            FetchRequest::Detail(number) => format!("issue #{}", number),
        }
    }
}

/// Result from an async fetch operation
#[derive(Debug)]
pub enum FetchResult {
    Issues { key: String, issues: Vec<Issue> },
    Labels(Vec<Label>),
    Detail(Box<IssueDetail>),
    Error { request: FetchRequest, message: String },
}

/// Command to be executed after update
#[derive(Debug, PartialEq)]
pub enum Command {
    Quit,
    StartFetch(FetchRequest),
    OpenUrl(String),
    Batch(Vec<Command>),
}

/// All possible messages/events in the application
#[derive(Debug)]
pub enum Message {
    // Navigation
    NextItem,
    PreviousItem,
    GoToTop,
    GoToBottom,

    // Filters
    SetStateFilter(StateFilter),
    CycleSort,
    ClearFilters,
    FilterBySelectedAuthor,

    // Actions
    OpenSelected,
    NewIssue,
    Refresh,

    // Search
    EnterSearchMode,
    ExitSearchMode { clear: bool },
    SearchInput(char),
    SearchBackspace,

    // Author
    EnterAuthorMode,
    ExitAuthorMode { apply: bool },
    AuthorInput(char),
    AuthorBackspace,

    // Labels
    OpenLabelsPopup,
    CloseLabelsPopup,
    LabelQueryInput(char),
    LabelQueryBackspace,
    LabelsNext,
    LabelsPrevious,
    ToggleSelectedLabel,

    // Detail view
    OpenDetail,
    CloseDetail,
    DetailScrollDown,
    DetailScrollUp,

    // Popups
    ToggleHelp,
    DismissHelp,
    DismissError,
    ShowUrl(String),
    DismissUrl,

    // Tutorial
    OpenTutorial,
    CloseTutorial,
    TutorialNext,
    TutorialPrevious,
    TutorialSkip,
    TutorialGoTo(usize),
    TutorialOpenLink,
    ResetTutorial,

    // Async results
    FetchComplete(FetchResult),

    // System
    Tick,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FilterSpec;

    #[test]
    fn issue_cache_keys_match_the_filter() {
        let filter = FilterSpec::default()
            .with_state(StateFilter::Closed)
            .with_sort(SortMode::MostCommented);
        let request = FetchRequest::Issues {
            state: filter.state,
            sort: filter.sort,
        };
        assert_eq!(request.cache_key(), filter.cache_key());
        assert_eq!(FetchRequest::Detail(42).cache_key(), "issue:42");
        assert_eq!(FetchRequest::Labels.cache_key(), "labels");
    }
}
