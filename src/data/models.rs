use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::types::IssueState;

/// GitHub's default colour for labels created without one.
pub const DEFAULT_LABEL_COLOR: &str = "ededed";

/// Parse an API timestamp. Anything unparseable sorts as the oldest instant.
pub fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Date-only values ("2024-06-01") show up in hand-written fixtures
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        })
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

impl User {
    /// Placeholder for deleted accounts, which the API reports as `null`.
    pub fn ghost() -> Self {
        Self {
            login: "ghost".to_string(),
            avatar_url: String::new(),
            html_url: "https://github.com/ghost".to_string(),
        }
    }
}

fn deserialize_user<'de, D>(deserializer: D) -> Result<User, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<User>::deserialize(deserializer)?.unwrap_or_else(User::ghost))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    #[serde(
        default = "default_label_color",
        deserialize_with = "deserialize_label_color"
    )]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

/// Normalise a label colour to six lowercase hex digits.
pub fn normalize_color(raw: &str) -> String {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        hex.to_ascii_lowercase()
    } else {
        default_label_color()
    }
}

fn deserialize_label_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|c| normalize_color(&c))
        .unwrap_or_else(default_label_color))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default = "User::ghost", deserialize_with = "deserialize_user")]
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub comments: u64,
}

impl Issue {
    pub fn created(&self) -> DateTime<Utc> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated(&self) -> DateTime<Utc> {
        parse_timestamp(&self.updated_at)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default = "User::ghost", deserialize_with = "deserialize_user")]
    pub user: User,
    #[serde(default)]
    pub author_association: String,
}

/// Timeline events only carry the label's name and colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLabel {
    pub name: String,
    #[serde(
        default = "default_label_color",
        deserialize_with = "deserialize_label_color"
    )]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub id: Option<u64>,
    pub event: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub actor: Option<User>,
    #[serde(default)]
    pub label: Option<EventLabel>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub commit_id: Option<String>,
}

impl TimelineEvent {
    /// One-line description, e.g. "alice added the bug label".
    pub fn describe(&self) -> String {
        let actor = self
            .actor
            .as_ref()
            .map(|a| a.login.as_str())
            .unwrap_or("someone");
        let label = self.label.as_ref().map(|l| l.name.as_str()).unwrap_or("?");
        let what = match self.event.as_str() {
            "closed" => "closed this issue".to_string(),
            "reopened" => "reopened this issue".to_string(),
            "labeled" => format!("added the {} label", label),
            "unlabeled" => format!("removed the {} label", label),
            "assigned" => format!(
                "assigned {}",
                self.assignee
                    .as_ref()
                    .map(|a| a.login.as_str())
                    .unwrap_or("someone")
            ),
            "referenced" => "referenced this issue".to_string(),
            other => format!("{} this issue", other.replace('_', " ")),
        };
        format!("{} {}", actor, what)
    }
}

/// An issue together with its conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    pub issue: Issue,
    pub comments: Vec<Comment>,
    pub timeline: Vec<TimelineEvent>,
}
