#![allow(dead_code)]

use anyhow::Result;
use git_linear::config::Config;
use git_linear::credentials::SecretBackend;
use git_linear::git::BranchStore;
use git_linear::linear::{Issue, IssueState, IssueTracker, LinearError};
use git_linear::tui::command::IssueListEntry;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tempfile::TempDir;

/// Build a Config rooted in the temp dir.
pub fn test_config(tmp: &TempDir) -> Config {
    Config::new(tmp.path().join(".git-linear"))
}

pub fn git(repo: &Path, args: &[&str]) -> std::process::Output {
    std::process::Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("git command failed")
}

/// Create a git repo at `<tmp>/<name>/` on `branch` with an initial commit.
pub fn init_test_repo_on(tmp: &TempDir, name: &str, branch: &str) -> PathBuf {
    let repo_path = tmp.path().join(name);
    std::fs::create_dir_all(&repo_path).unwrap();

    git(&repo_path, &["init", "-b", branch]);
    git(&repo_path, &["config", "user.email", "test@test.com"]);
    git(&repo_path, &["config", "user.name", "Test"]);

    // Create an initial commit so HEAD exists
    std::fs::write(repo_path.join("README.md"), "# test repo\n").unwrap();
    git(&repo_path, &["add", "."]);
    git(&repo_path, &["commit", "-m", "initial commit"]);

    repo_path
}

pub fn init_test_repo(tmp: &TempDir, name: &str) -> PathBuf {
    init_test_repo_on(tmp, name, "main")
}

/// Clone `source` to `<tmp>/<name>/` so the clone has an `origin` remote.
pub fn clone_repo(tmp: &TempDir, source: &Path, name: &str) -> PathBuf {
    let dest = tmp.path().join(name);
    let output = std::process::Command::new("git")
        .args(["clone", "--quiet"])
        .arg(source)
        .arg(&dest)
        .output()
        .expect("git clone failed");
    assert!(output.status.success(), "clone failed: {:?}", output);
    git(&dest, &["config", "user.email", "test@test.com"]);
    git(&dest, &["config", "user.name", "Test"]);
    dest
}

pub fn issue(identifier: &str, title: &str) -> Issue {
    Issue {
        id: format!("id-{}", identifier),
        identifier: identifier.to_string(),
        title: title.to_string(),
        state: IssueState {
            name: "In Progress".to_string(),
            kind: "started".to_string(),
        },
    }
}

pub fn entry(identifier: &str, title: &str, branch_exists: bool) -> IssueListEntry {
    IssueListEntry {
        issue: issue(identifier, title),
        branch_exists,
    }
}

/// Issue tracker returning a canned result.
pub struct FakeTracker {
    result: Mutex<Option<Result<Vec<Issue>, LinearError>>>,
}

impl FakeTracker {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            result: Mutex::new(Some(Ok(issues))),
        }
    }

    pub fn failing(error: LinearError) -> Self {
        Self {
            result: Mutex::new(Some(Err(error))),
        }
    }
}

impl IssueTracker for FakeTracker {
    fn assigned_issues(&self) -> Result<Vec<Issue>, LinearError> {
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// In-memory branch store that records every mutating call.
#[derive(Default)]
pub struct FakeBranches {
    pub branches: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
    pub default_branch: Option<String>,
    pub fail_create: bool,
}

impl FakeBranches {
    pub fn with_branches(branches: &[&str]) -> Self {
        Self {
            branches: Mutex::new(branches.iter().map(|b| b.to_string()).collect()),
            default_branch: Some("main".to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl BranchStore for FakeBranches {
    fn branch_exists(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.branches
            .lock()
            .unwrap()
            .iter()
            .any(|b| b.to_lowercase() == wanted)
    }

    fn default_branch(&self) -> Result<String> {
        self.calls.lock().unwrap().push("default_branch".to_string());
        self.default_branch
            .clone()
            .ok_or_else(|| anyhow::anyhow!("could not determine default branch"))
    }

    fn create_branch(&self, name: &str, base: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create {} from {}", name, base));
        if self.fail_create {
            anyhow::bail!("a branch named '{}' already exists", name);
        }
        self.branches.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("switch {}", name));
        if !self.branch_exists(name) {
            anyhow::bail!("pathspec '{}' did not match", name);
        }
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok("main".to_string())
    }
}

/// How a [`FakeKeyring`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyringMode {
    Working,
    /// Every call fails as if no secret service were running.
    Unavailable,
    /// Every call fails with an error that is not about availability.
    Broken,
}

/// In-memory keyring slot. Clones share the slot, so a test can keep one
/// to look at what the store wrote.
#[derive(Clone)]
pub struct FakeKeyring {
    pub mode: KeyringMode,
    pub secret: Arc<Mutex<Option<String>>>,
}

impl FakeKeyring {
    pub fn new(mode: KeyringMode) -> Self {
        Self {
            mode,
            secret: Arc::new(Mutex::new(None)),
        }
    }

    pub fn secret(&self) -> Option<String> {
        self.secret.lock().unwrap().clone()
    }

    fn failure(&self) -> Option<keyring::Error> {
        match self.mode {
            KeyringMode::Working => None,
            KeyringMode::Unavailable => {
                Some(keyring::Error::NoStorageAccess("secret service not running".into()))
            }
            KeyringMode::Broken => Some(keyring::Error::Invalid(
                "user".to_string(),
                "rejected by platform".to_string(),
            )),
        }
    }
}

impl SecretBackend for FakeKeyring {
    fn set(&self, secret: &str) -> keyring::Result<()> {
        if let Some(e) = self.failure() {
            return Err(e);
        }
        *self.secret.lock().unwrap() = Some(secret.to_string());
        Ok(())
    }

    fn get(&self) -> keyring::Result<String> {
        if let Some(e) = self.failure() {
            return Err(e);
        }
        self.secret.lock().unwrap().clone().ok_or(keyring::Error::NoEntry)
    }

    fn delete(&self) -> keyring::Result<()> {
        if let Some(e) = self.failure() {
            return Err(e);
        }
        match self.secret.lock().unwrap().take() {
            Some(_) => Ok(()),
            None => Err(keyring::Error::NoEntry),
        }
    }
}

/// Answer exactly one HTTP request with `status` and `body`. The join handle
/// yields the raw request (headers and body) that was received.
pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let end_of_head = line == "\r\n";
            head.push_str(&line);
            if end_of_head {
                break;
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        format!("{}{}", head, String::from_utf8_lossy(&body))
    });

    (format!("http://{}/graphql", addr), handle)
}
