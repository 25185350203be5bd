use octocrab::Octocrab;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::data::{Comment, Issue, IssueDetail, Label, SortMode, StateFilter, TimelineEvent};
use crate::error::FetchError;

const GITHUB_API_BASE: &str = "https://api.github.com";
const TIMELINE_ACCEPT: &str = "application/vnd.github.mockingbird-preview+json";
const USER_AGENT: &str = concat!("issuedeck/", env!("CARGO_PKG_VERSION"));
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// How often a failed request is retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Exponential backoff capped at 30 seconds.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(MAX_RETRY_DELAY)
    }
}

/// Run `op`, retrying failures according to `policy`.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.retries => {
                let delay = policy.delay(attempt);
                warn!(what, attempt = attempt + 1, error = %e, ?delay, "request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decode list entries one by one, dropping the ones that don't fit the schema.
pub fn parse_entries<T: DeserializeOwned>(values: Vec<serde_json::Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(kind, error = %e, "dropping malformed entry");
                None
            }
        })
        .collect()
}

/// Decode the issues endpoint, skipping pull requests.
pub fn parse_issues(values: Vec<serde_json::Value>) -> Vec<Issue> {
    let issues: Vec<serde_json::Value> = values
        .into_iter()
        .filter(|v| v.get("pull_request").is_none())
        .collect();
    parse_entries(issues, "issue")
}

#[derive(Serialize)]
struct IssueListParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    sort: &'a str,
    direction: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

/// Read-only client for one repository.
pub struct GitHubClient {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: Option<String>,
    owner: String,
    repo: String,
    per_page: u8,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// Must be called inside a tokio runtime.
    pub fn new(
        owner: &str,
        repo: &str,
        token: Option<String>,
        per_page: u8,
        retry: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let octocrab = match &token {
            Some(token) => Octocrab::builder().personal_token(token.clone()).build()?,
            None => Octocrab::builder().build()?,
        };
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            octocrab,
            http,
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
            per_page,
            retry,
        })
    }

    fn route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, suffix)
    }

    pub async fn fetch_issues(
        &self,
        state: StateFilter,
        sort: SortMode,
    ) -> Result<Vec<Issue>, FetchError> {
        with_retries(self.retry, "issues", move || self.get_issues(state, sort)).await
    }

    async fn get_issues(&self, state: StateFilter, sort: SortMode) -> Result<Vec<Issue>, FetchError> {
        let (sort_key, direction) = sort.api_params();
        let params = IssueListParams {
            state: state.as_query(),
            sort: sort_key,
            direction,
            per_page: self.per_page,
            page: 1,
        };
        let values: Vec<serde_json::Value> =
            self.octocrab.get(self.route("/issues"), Some(&params)).await?;
        let issues = parse_issues(values);
        debug!(count = issues.len(), state = state.to_str(), sort = sort.to_str(), "fetched issues");
        Ok(issues)
    }

    pub async fn fetch_labels(&self) -> Result<Vec<Label>, FetchError> {
        with_retries(self.retry, "labels", move || async move {
            let values: Vec<serde_json::Value> = self
                .octocrab
                .get(self.route("/labels"), Some(&PageParams { per_page: 100 }))
                .await?;
            Ok(parse_entries(values, "label"))
        })
        .await
    }

    pub async fn fetch_issue(&self, number: u64) -> Result<Issue, FetchError> {
        with_retries(self.retry, "issue", move || async move {
            let value: serde_json::Value = self
                .octocrab
                .get(self.route(&format!("/issues/{}", number)), None::<&()>)
                .await?;
            Ok(serde_json::from_value(value)?)
        })
        .await
    }

    pub async fn fetch_comments(&self, number: u64) -> Result<Vec<Comment>, FetchError> {
        with_retries(self.retry, "comments", move || async move {
            let values: Vec<serde_json::Value> = self
                .octocrab
                .get(
                    self.route(&format!("/issues/{}/comments", number)),
                    Some(&PageParams { per_page: 100 }),
                )
                .await?;
            Ok(parse_entries(values, "comment"))
        })
        .await
    }

    /// The timeline needs a preview media type, so it goes through reqwest.
    pub async fn fetch_timeline(&self, number: u64) -> Result<Vec<TimelineEvent>, FetchError> {
        use reqwest::header::{ACCEPT, AUTHORIZATION};

        let url = format!(
            "{}{}?per_page=100",
            GITHUB_API_BASE,
            self.route(&format!("/issues/{}/timeline", number))
        );
        let mut request = self.http.get(&url).header(ACCEPT, TIMELINE_ACCEPT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let values: Vec<serde_json::Value> =
            request.send().await?.error_for_status()?.json().await?;
        Ok(parse_entries(values, "timeline event"))
    }

    /// Issue, comments and timeline fetched concurrently.
    /// A missing timeline is not an error.
    pub async fn fetch_issue_detail(&self, number: u64) -> Result<IssueDetail, FetchError> {
        let (issue, comments, timeline) = futures::join!(
            self.fetch_issue(number),
            self.fetch_comments(number),
            self.fetch_timeline(number),
        );

        let timeline = timeline.unwrap_or_else(|e| {
            warn!(number, error = %e, "timeline unavailable");
            Vec::new()
        });

        Ok(IssueDetail {
            issue: issue?,
            comments: comments?,
            timeline,
        })
    }
}
