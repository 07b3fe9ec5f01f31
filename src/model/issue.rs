use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IssueState {
    #[serde(rename = "opened", alias = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
}

/// Snapshot of one tracker issue as listed by the project issues endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteIssue {
    /// Project-scoped sequential number, the identity carried into the target store.
    pub iid: u64,
    pub title: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub milestone: Option<MilestoneRef>,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    pub web_url: String,
}

impl RemoteIssue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    /// Closure time, only meaningful once the issue is closed.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            IssueState::Closed => self.closed_at,
            IssueState::Open => None,
        }
    }

    pub fn assignee_names(&self) -> String {
        self.assignees
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MilestoneRef {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assignee {
    pub name: String,
}

/// Only the name is mirrored; it becomes a `tags` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteLabel {
    pub name: String,
}

/// Only the title is mirrored; it becomes a `milestones` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteMilestone {
    pub title: String,
}
