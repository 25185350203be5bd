use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a tutorial stage, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Welcome,
    Signup,
    Tour,
    Creation,
    Completion,
}

impl StepId {
    pub fn slug(self) -> &'static str {
        match self {
            StepId::Welcome => "welcome",
            StepId::Signup => "signup",
            StepId::Tour => "tour",
            StepId::Creation => "creation",
            StepId::Completion => "completion",
        }
    }

    /// Position of the step in `TUTORIAL_STEPS`.
    pub fn index(self) -> usize {
        TUTORIAL_STEPS
            .iter()
            .position(|s| s.id == self)
            .unwrap_or(0)
    }

    /// Resolve a route slug to a step index; unknown slugs land on the first step.
    pub fn route_index(slug: &str) -> usize {
        slug.parse::<StepId>().map(StepId::index).unwrap_or(0)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome" => Ok(StepId::Welcome),
            "signup" => Ok(StepId::Signup),
            "tour" => Ok(StepId::Tour),
            "creation" => Ok(StepId::Creation),
            "completion" => Ok(StepId::Completion),
            other => Err(format!("unknown tutorial step: {}", other)),
        }
    }
}

/// Where a step's call-to-action link points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Signup,
    Repository,
    Issues,
    NewIssue,
}

impl LinkTarget {
    pub fn url(self, owner: &str, repo: &str) -> String {
        match self {
            LinkTarget::Signup => "https://github.com/signup".to_string(),
            LinkTarget::Repository => format!("https://github.com/{}/{}", owner, repo),
            LinkTarget::Issues => format!("https://github.com/{}/{}/issues", owner, repo),
            LinkTarget::NewIssue => {
                format!("https://github.com/{}/{}/issues/new/choose", owner, repo)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StepLink {
    pub text: &'static str,
    pub target: LinkTarget,
}

#[derive(Debug, Clone, Copy)]
pub struct TutorialStep {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub can_skip: bool,
    pub is_required: bool,
    pub points: &'static [&'static str],
    pub link: Option<StepLink>,
}

pub const TUTORIAL_STEPS: [TutorialStep; 5] = [
    TutorialStep {
        id: StepId::Welcome,
        title: "Welcome to GitHub Issues",
        description: "Let's help you get started with contributing to the project",
        can_skip: true,
        is_required: false,
        points: &[
            "An issue is a suggestion box entry or a bug report.",
            "Issues help developers understand what to fix and what to build next.",
            "This guide walks you from creating an account to filing your first issue.",
            "Take your time, there's no rush!",
        ],
        link: None,
    },
    TutorialStep {
        id: StepId::Signup,
        title: "Create GitHub Account",
        description: "Sign up for GitHub to start contributing",
        can_skip: true,
        is_required: false,
        points: &[
            "Open the signup page and choose a unique username.",
            "Enter your email address and create a strong password.",
            "Verify your email, you need it to submit issues.",
            "Already have GitHub? Skip ahead to the repository tour.",
            "Tip: enable two-factor authentication once you're in.",
        ],
        link: Some(StepLink {
            text: "Create GitHub Account",
            target: LinkTarget::Signup,
        }),
    },
    TutorialStep {
        id: StepId::Tour,
        title: "Repository Tour",
        description: "Learn about issues, labels, and navigation",
        can_skip: false,
        is_required: true,
        points: &[
            "Open issues are problems or ideas still being worked on.",
            "Closed issues have been resolved or declined.",
            "Labels such as bug or enhancement categorize each issue.",
            "Use 1/2/3 to switch between all, open and closed issues.",
            "Press / to search titles and descriptions, l to filter by label.",
        ],
        link: Some(StepLink {
            text: "Browse the repository",
            target: LinkTarget::Repository,
        }),
    },
    TutorialStep {
        id: StepId::Creation,
        title: "Creating Issues",
        description: "Step-by-step guide to submitting your first issue",
        can_skip: false,
        is_required: true,
        points: &[
            "Search existing issues first to avoid duplicates.",
            "Click 'New issue' on the Issues tab and pick a template.",
            "Write a clear title that summarizes the issue in one sentence.",
            "Describe the details, steps to reproduce, or context.",
            "Submit the issue, maintainers usually add labels for you.",
        ],
        link: Some(StepLink {
            text: "Open a new issue",
            target: LinkTarget::NewIssue,
        }),
    },
    TutorialStep {
        id: StepId::Completion,
        title: "You're Ready!",
        description: "Congratulations! You're ready to contribute",
        can_skip: false,
        is_required: true,
        points: &[
            "You know how to find, read and file issues.",
            "Watch the repository to get notified about new activity.",
            "Be respectful and constructive in every discussion.",
            "Thank you for helping improve the project!",
        ],
        link: Some(StepLink {
            text: "Browse issues on GitHub",
            target: LinkTarget::Issues,
        }),
    },
];

pub const STEP_COUNT: usize = TUTORIAL_STEPS.len();
pub const LAST_STEP: usize = STEP_COUNT - 1;
