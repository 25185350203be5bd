use anyhow::Result;
use chrono::{DateTime, Utc};
use ratatui::widgets::TableState;
use serde::de::DeserializeOwned;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::data::{FilterSpec, Issue, IssueDetail, Label, Stats, SPINNER_FRAMES};
use crate::error::FetchError;
use crate::services::{run_query, CachedEntry, GitHubClient, QueryCache, RetryPolicy};
use crate::tutorial::Tutorial;

use super::message::{FetchRequest, FetchResult};

/// Which text field, if any, is receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Author,
}

pub struct App {
    // Data state
    pub issues: Vec<Issue>,
    pub labels: Vec<Label>,
    pub last_refresh: Option<DateTime<Utc>>,

    // Filter/View state
    pub filter: FilterSpec,
    pub filtered_indices: Vec<usize>,
    pub stats: Stats,
    pub table_state: TableState,

    // Text input state
    pub input_mode: InputMode,
    pub author_input: String,

    // Labels popup state
    pub show_labels_popup: bool,
    pub label_query: String,
    pub label_matches: Vec<usize>,
    pub labels_list_state: TableState,

    // Detail view state
    pub show_detail: bool,
    pub detail_number: Option<u64>,
    pub detail: Option<IssueDetail>,
    pub detail_scroll: u16,

    // Loading state
    pub loading_issues: bool,
    pub loading_labels: bool,
    pub loading_detail: bool,

    // Popup state
    pub show_help_popup: bool,
    pub show_error_popup: bool,
    pub error: Option<String>,
    pub show_url_popup: Option<String>,

    // Onboarding
    pub tutorial: Tutorial,

    // Repository info
    pub repo_owner: String,
    pub repo_name: String,

    pub config: Config,
    pub cache: Option<QueryCache>,

    // Async communication
    pub fetch_tx: Sender<FetchRequest>,
    pub result_rx: Receiver<FetchResult>,

    // Spinner state
    pub spinner_idx: usize,
    pub last_spinner_update: Instant,
    pub last_auto_refresh: Instant,
}

impl App {
    /// Build the model and start the fetch worker.
    pub fn new(config: Config, token: Option<String>, tutorial: Tutorial) -> Result<Self> {
        let cache = config.cache_path().map(QueryCache::new);
        let (fetch_tx, result_rx) = spawn_worker(&config, token, cache.clone());
        Ok(Self::with_channels(config, cache, tutorial, fetch_tx, result_rx))
    }

    /// Build the model around existing channels; nothing is spawned.
    pub fn with_channels(
        config: Config,
        cache: Option<QueryCache>,
        tutorial: Tutorial,
        fetch_tx: Sender<FetchRequest>,
        result_rx: Receiver<FetchResult>,
    ) -> Self {
        let (repo_owner, repo_name) = config.repository();

        Self {
            issues: Vec::new(),
            labels: Vec::new(),
            last_refresh: None,
            filter: FilterSpec::default(),
            filtered_indices: Vec::new(),
            stats: Stats::default(),
            table_state: TableState::default(),
            input_mode: InputMode::Normal,
            author_input: String::new(),
            show_labels_popup: false,
            label_query: String::new(),
            label_matches: Vec::new(),
            labels_list_state: TableState::default(),
            show_detail: false,
            detail_number: None,
            detail: None,
            detail_scroll: 0,
            loading_issues: false,
            loading_labels: false,
            loading_detail: false,
            show_help_popup: false,
            show_error_popup: false,
            error: None,
            show_url_popup: None,
            tutorial,
            repo_owner,
            repo_name,
            config,
            cache,
            fetch_tx,
            result_rx,
            spinner_idx: 0,
            last_spinner_update: Instant::now(),
            last_auto_refresh: Instant::now(),
        }
    }

    // Getters

    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    pub fn is_loading(&self) -> bool {
        self.loading_issues || self.loading_labels || self.loading_detail
    }

    pub fn visible_issues(&self) -> Vec<&Issue> {
        self.filtered_indices
            .iter()
            .filter_map(|&idx| self.issues.get(idx))
            .collect()
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        self.table_state
            .selected()
            .and_then(|sel| self.filtered_indices.get(sel))
            .and_then(|&idx| self.issues.get(idx))
    }

    /// The issue shown in the detail view: the fetched detail when it
    /// matches, else the list entry.
    pub fn detail_issue(&self) -> Option<&Issue> {
        let number = self.detail_number?;
        match &self.detail {
            Some(detail) if detail.issue.number == number => Some(&detail.issue),
            _ => self.issues.iter().find(|i| i.number == number),
        }
    }

    pub fn selected_label(&self) -> Option<&Label> {
        self.labels_list_state
            .selected()
            .and_then(|sel| self.label_matches.get(sel))
            .and_then(|&idx| self.labels.get(idx))
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_idx]
    }

    // Spinner update

    pub fn update_spinner(&mut self) {
        if self.last_spinner_update.elapsed() >= Duration::from_millis(80) {
            self.spinner_idx = (self.spinner_idx + 1) % SPINNER_FRAMES.len();
            self.last_spinner_update = Instant::now();
        }
    }

    pub fn should_auto_refresh(&self) -> bool {
        !self.loading_issues && self.last_auto_refresh.elapsed() >= self.config.refresh_interval()
    }

    // Filtering

    /// Re-run the query engine over the current list, keeping the selected
    /// issue selected when it survives the new filter.
    pub fn apply_filter(&mut self) {
        let selected_number = self.selected_issue().map(|i| i.number);
        let result = run_query(&self.issues, &self.filter);
        self.filtered_indices = result.indices;
        self.stats = result.stats;

        let position = selected_number.and_then(|number| {
            self.filtered_indices
                .iter()
                .position(|&idx| self.issues[idx].number == number)
        });
        self.table_state = TableState::default();
        if !self.filtered_indices.is_empty() {
            self.table_state.select(Some(position.unwrap_or(0)));
        }
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.apply_filter();
    }

    pub fn set_issues(&mut self, issues: Vec<Issue>) {
        self.issues = issues;
        self.apply_filter();
    }

    // Cache access

    /// Read a cached response. Cache failures are logged and read as a miss.
    pub fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<CachedEntry<T>> {
        let cache = self.cache.as_ref()?;
        match cache.load(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "failed to read cache entry");
                None
            }
        }
    }

    // Fetch management

    pub fn start_fetch(&mut self, request: FetchRequest) {
        match request {
            FetchRequest::Issues { .. } => {
                self.loading_issues = true;
                self.last_auto_refresh = Instant::now();
            }
            FetchRequest::Labels => self.loading_labels = true,
            FetchRequest::Detail(_) => self.loading_detail = true,
        }
        if self.fetch_tx.send(request).is_err() {
            warn!(?request, "fetch worker is gone");
            self.error = Some("Background worker stopped; restart to fetch again".to_string());
            self.show_error_popup = true;
            self.loading_issues = false;
            self.loading_labels = false;
            self.loading_detail = false;
        }
    }

    pub fn check_fetch_result(&mut self) -> Option<FetchResult> {
        self.result_rx.try_recv().ok()
    }
}

/// Spawn the thread that owns the tokio runtime and the GitHub client.
fn spawn_worker(
    config: &Config,
    token: Option<String>,
    cache: Option<QueryCache>,
) -> (Sender<FetchRequest>, Receiver<FetchResult>) {
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchRequest>();
    let (result_tx, result_rx) = mpsc::channel::<FetchResult>();
    let (owner, repo) = config.repository();
    let per_page = config.per_page;
    let retry = RetryPolicy::new(config.retries);

    thread::spawn(move || {
        let worker = build_runtime(&owner, &repo, token, per_page, retry);
        if let Err(e) = &worker {
            warn!(error = %e, "fetch worker failed to start");
        }

        while let Ok(request) = fetch_rx.recv() {
            let msg = match &worker {
                Ok((rt, client)) => rt.block_on(run_request(client, request, cache.as_ref())),
                Err(e) => FetchResult::Error {
                    request,
                    message: e.to_string(),
                },
            };
            if result_tx.send(msg).is_err() {
                break;
            }
        }
    });

    (fetch_tx, result_rx)
}

fn build_runtime(
    owner: &str,
    repo: &str,
    token: Option<String>,
    per_page: u8,
    retry: RetryPolicy,
) -> Result<(tokio::runtime::Runtime, GitHubClient), FetchError> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| FetchError::Runtime(e.to_string()))?;
    let client = {
        let _guard = rt.enter();
        GitHubClient::new(owner, repo, token, per_page, retry)?
    };
    Ok((rt, client))
}

/// Serve one request and write successful responses through to the cache.
async fn run_request(
    client: &GitHubClient,
    request: FetchRequest,
    cache: Option<&QueryCache>,
) -> FetchResult {
    let key = request.cache_key();
    let result = match request {
        FetchRequest::Issues { state, sort } => client.fetch_issues(state, sort).await.map(|issues| {
            store(cache, &key, &issues);
            info!(count = issues.len(), key = %key, "issues loaded");
            FetchResult::Issues { key, issues }
        }),
        FetchRequest::Labels => client.fetch_labels().await.map(|labels| {
            store(cache, &key, &labels);
            info!(count = labels.len(), "labels loaded");
            FetchResult::Labels(labels)
        }),
        FetchRequest::Detail(number) => client.fetch_issue_detail(number).await.map(|detail| {
            store(cache, &key, &detail);
            info!(
                number,
                comments = detail.comments.len(),
                events = detail.timeline.len(),
                "issue detail loaded"
            );
            FetchResult::Detail(Box::new(detail))
        }),
    };

    result.unwrap_or_else(|e| {
        warn!(?request, error = %e, "fetch failed");
        FetchResult::Error {
            request,
            message: e.to_string(),
        }
    })
}

fn store<T: serde::Serialize + ?Sized>(cache: Option<&QueryCache>, key: &str, value: &T) {
    if let Some(cache) = cache {
        if let Err(e) = cache.save(key, value, Utc::now()) {
            warn!(key, error = %e, "failed to save cache entry");
        }
    }
}
