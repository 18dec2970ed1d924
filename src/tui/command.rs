use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::branch;
use crate::git::BranchStore;
use crate::linear::{Issue, IssueTracker};

/// An issue paired with whether its default branch name already exists.
/// Computed once when the issues are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueListEntry {
    pub issue: Issue,
    pub branch_exists: bool,
}

impl IssueListEntry {
    /// Branch name derived from the issue without any user edits.
    pub fn candidate_branch(&self) -> String {
        branch::sanitize(&self.issue.identifier, &self.issue.title)
    }

    /// Text the issue list filter matches against.
    pub fn filter_value(&self) -> String {
        format!("{} {}", self.issue.identifier, self.issue.title)
    }
}

/// Result of a finished [`Command`], fed back into the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    IssuesLoaded(Result<Vec<IssueListEntry>, String>),
    /// Ok carries the branch that is now checked out.
    BranchSwitched(Result<String, String>),
}

/// Work the workflow asks the event loop to run off the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchIssues,
    /// Resolve the default branch, create `branch` from it, check it out.
    CreateAndSwitch { branch: String },
    SwitchExisting { branch: String },
}

pub type Task = Pin<Box<dyn Future<Output = Message> + Send + 'static>>;

/// The collaborators commands run against.
#[derive(Clone)]
pub struct Services {
    pub tracker: Arc<dyn IssueTracker>,
    pub branches: Arc<dyn BranchStore>,
}

impl Services {
    pub fn new(tracker: Arc<dyn IssueTracker>, branches: Arc<dyn BranchStore>) -> Self {
        Self { tracker, branches }
    }
}

impl Command {
    /// Bind the command to its collaborators. The returned future needs no
    /// further input and resolves to exactly one message.
    pub fn into_task(self, services: &Services) -> Task {
        let services = services.clone();
        match self {
            Command::FetchIssues => Box::pin(async move {
                let result = blocking(move || fetch_issues(&services)).await;
                Message::IssuesLoaded(result)
            }),
            Command::CreateAndSwitch { branch } => Box::pin(async move {
                let result =
                    blocking(move || create_and_switch(services.branches.as_ref(), &branch)).await;
                Message::BranchSwitched(result)
            }),
            Command::SwitchExisting { branch } => Box::pin(async move {
                let result = blocking(move || {
                    services
                        .branches
                        .switch_branch(&branch)
                        .map(|()| branch)
                        .map_err(|e| format!("{:#}", e))
                })
                .await;
                Message::BranchSwitched(result)
            }),
        }
    }

    pub async fn execute(self, services: &Services) -> Message {
        self.into_task(services).await
    }
}

/// Run a blocking collaborator call on tokio's blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(format!("background task failed: {}", e)),
    }
}

fn fetch_issues(services: &Services) -> Result<Vec<IssueListEntry>, String> {
    let issues = services
        .tracker
        .assigned_issues()
        .map_err(|e| e.to_string())?;

    let entries = issues
        .into_iter()
        .map(|issue| {
            let name = branch::sanitize(&issue.identifier, &issue.title);
            let branch_exists = services.branches.branch_exists(&name);
            IssueListEntry {
                issue,
                branch_exists,
            }
        })
        .collect();
    Ok(entries)
}

/// First failing step aborts the rest and becomes the command's error.
fn create_and_switch(branches: &dyn BranchStore, name: &str) -> Result<String, String> {
    let run = || -> anyhow::Result<()> {
        let base = branches.default_branch()?;
        branches.create_branch(name, &base)?;
        branches.switch_branch(name)?;
        Ok(())
    };
    run().map(|()| name.to_string()).map_err(|e| format!("{:#}", e))
}
