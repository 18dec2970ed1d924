use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";
pub const DEFAULT_ISSUE_LIMIT: u32 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Open issues assigned to the API key's owner. Completed and canceled
/// issues are filtered server-side.
const ASSIGNED_ISSUES_QUERY: &str = r#"
query AssignedIssues($first: Int!) {
  viewer {
    assignedIssues(
      first: $first
      filter: { state: { type: { nin: ["completed", "canceled"] } } }
    ) {
      nodes {
        id
        identifier
        title
        state {
          name
          type
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueState {
    /// Display name, e.g. "In Progress"
    pub name: String,
    /// Coarse category: backlog, unstarted, started, completed, canceled
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    /// Tracker-assigned key such as "DEV-123"
    pub identifier: String,
    pub title: String,
    pub state: IssueState,
}

#[derive(Debug, thiserror::Error)]
pub enum LinearError {
    #[error("authentication failed: invalid API key")]
    Unauthorized,
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("failed to execute request: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("Linear API error: {0}")]
    GraphQl(String),
}

/// Source of the issues a user can branch from.
pub trait IssueTracker: Send + Sync {
    fn assigned_issues(&self) -> Result<Vec<Issue>, LinearError>;
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    viewer: Option<Viewer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Viewer {
    assigned_issues: Option<IssueConnection>,
}

#[derive(Deserialize)]
struct IssueConnection {
    #[serde(default)]
    nodes: Vec<Issue>,
}

pub struct LinearClient {
    api_key: String,
    api_url: String,
    issue_limit: u32,
    agent: ureq::Agent,
}

impl LinearClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, DEFAULT_API_URL)
    }

    pub fn with_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            issue_limit: DEFAULT_ISSUE_LIMIT,
            agent,
        }
    }

    pub fn with_issue_limit(mut self, limit: u32) -> Self {
        self.issue_limit = limit;
        self
    }

    /// Check the key by running the assigned-issues query once.
    pub fn validate_api_key(&self) -> Result<(), LinearError> {
        self.fetch_assigned_issues().map(|_| ())
    }

    pub fn fetch_assigned_issues(&self) -> Result<Vec<Issue>, LinearError> {
        let request = GraphQlRequest {
            query: ASSIGNED_ISSUES_QUERY,
            variables: json!({ "first": self.issue_limit }),
        };

        tracing::debug!(url = %self.api_url, limit = self.issue_limit, "fetching assigned issues");

        let response = self
            .agent
            .post(&self.api_url)
            .set("Content-Type", "application/json")
            .set("Authorization", &self.api_key)
            .send_json(&request)
            .map_err(|e| match e {
                ureq::Error::Status(401, _) => LinearError::Unauthorized,
                ureq::Error::Status(code, _) => LinearError::Status(code),
                ureq::Error::Transport(t) => LinearError::Transport(t.to_string()),
            })?;

        let body: GraphQlResponse = response
            .into_json()
            .map_err(|e| LinearError::Decode(e.to_string()))?;

        let issues = match body.data {
            Some(data) => data
                .viewer
                .and_then(|v| v.assigned_issues)
                .map(|c| c.nodes)
                .unwrap_or_default(),
            None if !body.errors.is_empty() => {
                let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
                return Err(LinearError::GraphQl(messages.join("; ")));
            }
            None => Vec::new(),
        };

        tracing::debug!(count = issues.len(), "assigned issues fetched");
        Ok(issues)
    }
}

impl IssueTracker for LinearClient {
    fn assigned_issues(&self) -> Result<Vec<Issue>, LinearError> {
        self.fetch_assigned_issues()
    }
}
