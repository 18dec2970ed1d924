use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Fallback names tried when `origin/HEAD` is not set.
const DEFAULT_BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

/// Version-control operations the branch workflow depends on.
pub trait BranchStore: Send + Sync {
    /// Case-insensitive check against local and remote-tracking branches.
    fn branch_exists(&self, name: &str) -> bool;
    fn default_branch(&self) -> Result<String>;
    fn create_branch(&self, name: &str, base: &str) -> Result<()>;
    fn switch_branch(&self, name: &str) -> Result<()>;
    fn current_branch(&self) -> Result<String>;
}

/// The `git` CLI, run inside one repository.
#[derive(Debug, Clone)]
pub struct Git {
    repo: PathBuf,
}

impl Git {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Use the repository containing the current directory.
    pub fn current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .current_dir(&self.repo)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute git {}", args.join(" ")))
    }

    /// Run git and fail with its stderr when it exits non-zero.
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            anyhow::bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn is_inside_work_tree(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"])
            .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
            .unwrap_or(false)
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        match self.run(&["status", "--porcelain"]) {
            Ok(o) if o.status.success() => !String::from_utf8_lossy(&o.stdout).trim().is_empty(),
            _ => false,
        }
    }

    /// All local branches plus remote-tracking branches with the remote name
    /// stripped (`origin/feat` becomes `feat`).
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let local = self.run_checked(&[
            "for-each-ref",
            "--format=%(refname:short)",
            "refs/heads",
        ])?;
        let remote = self.run_checked(&[
            "for-each-ref",
            "--format=%(refname:short)",
            "refs/remotes",
        ])?;

        let mut branches: Vec<String> = local.lines().map(str::to_string).collect();
        for line in remote.lines() {
            // `origin/HEAD` is a pointer, and a bare remote name shows up for it too
            let Some((_remote, branch)) = line.split_once('/') else {
                continue;
            };
            if branch == "HEAD" {
                continue;
            }
            branches.push(branch.to_string());
        }

        branches.retain(|b| !b.is_empty());
        Ok(branches)
    }
}

impl BranchStore for Git {
    fn branch_exists(&self, name: &str) -> bool {
        match self.list_branches() {
            Ok(branches) => {
                let wanted = name.to_lowercase();
                branches.iter().any(|b| b.to_lowercase() == wanted)
            }
            Err(e) => {
                tracing::warn!(branch = name, error = %e, "failed to list branches");
                false
            }
        }
    }

    fn default_branch(&self) -> Result<String> {
        if let Ok(target) = self.run_checked(&["symbolic-ref", "refs/remotes/origin/HEAD"]) {
            if let Some(branch) = target.strip_prefix("refs/remotes/origin/") {
                if !branch.is_empty() {
                    return Ok(branch.to_string());
                }
            }
        }

        for name in DEFAULT_BRANCH_CANDIDATES {
            let verified = self
                .run(&["rev-parse", "--verify", "--quiet", name])
                .map(|o| o.status.success())
                .unwrap_or(false);
            if verified {
                return Ok(name.to_string());
            }
        }

        anyhow::bail!("could not determine default branch")
    }

    fn create_branch(&self, name: &str, base: &str) -> Result<()> {
        tracing::info!(branch = name, base, "creating branch");
        self.run_checked(&["branch", name, base])?;
        Ok(())
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        tracing::info!(branch = name, "switching branch");
        self.run_checked(&["checkout", name])?;
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])
    }
}
