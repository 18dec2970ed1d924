use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::branch::BranchNameDraft;

use super::command::{Command, IssueListEntry, Message};

pub const NO_ISSUES_MESSAGE: &str = "No assigned issues found";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// The active screen and the data that screen needs. `issue` fields index
/// into [`Workflow::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Loading,
    IssueList {
        /// Position within the rows that pass the filter
        selected: usize,
        /// `Some` while the filter prompt is open
        filter: Option<String>,
        /// Terminal size the list is windowed to
        viewport: Viewport,
    },
    BranchEdit {
        issue: usize,
        draft: BranchNameDraft,
    },
    Confirm {
        issue: usize,
        draft: BranchNameDraft,
        branch: String,
        awaiting: bool,
    },
    ExistingBranch {
        issue: usize,
        branch: String,
        awaiting: bool,
    },
    Result {
        message: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Message(Message),
}

/// What the event loop should do after an event has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    None,
    Run(Command),
    Quit,
}

/// Drives the screens from loading the issues to a checked-out branch.
///
/// Every event replaces the active [`WorkflowState`] as a whole; at most one
/// [`Command`] comes out of a transition, and the states that issue one stay
/// `awaiting` until its [`Message`] arrives, so two commands are never in
/// flight at once.
#[derive(Debug, Clone)]
pub struct Workflow {
    entries: Vec<IssueListEntry>,
    viewport: Viewport,
    state: WorkflowState,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            viewport: Viewport::default(),
            state: WorkflowState::Loading,
        }
    }

    /// The command that kicks off the workflow.
    pub fn init(&self) -> Command {
        Command::FetchIssues
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn entries(&self) -> &[IssueListEntry] {
        &self.entries
    }

    /// Last terminal size seen. Seeds the issue list whenever it is
    /// (re)entered.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn entry(&self, index: usize) -> Option<&IssueListEntry> {
        self.entries.get(index)
    }

    /// Indices of the entries that match `filter` (case-insensitive).
    pub fn visible_indices(&self, filter: Option<&str>) -> Vec<usize> {
        let needle = filter.map(str::to_lowercase).unwrap_or_default();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                needle.is_empty() || e.filter_value().to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Message shown on the result screen, once the branch is checked out.
    pub fn result_message(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Result { message } => Some(message),
            _ => None,
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Update {
        let state = std::mem::replace(&mut self.state, WorkflowState::Loading);
        let (next, update) = match event {
            Event::Key(key) if key.kind != KeyEventKind::Press => (state, Update::None),
            Event::Key(key) => self.on_key(state, key),
            Event::Resize { width, height } => {
                self.viewport = Viewport { width, height };
                (resized(state, self.viewport), Update::None)
            }
            Event::Message(message) => self.on_message(state, message),
        };
        self.state = next;
        update
    }

    fn on_message(&mut self, state: WorkflowState, message: Message) -> (WorkflowState, Update) {
        match (state, message) {
            (WorkflowState::Loading, Message::IssuesLoaded(Err(e))) => {
                tracing::warn!(error = %e, "failed to load issues");
                (error(format!("Failed to load issues: {}", e)), Update::None)
            }
            (WorkflowState::Loading, Message::IssuesLoaded(Ok(entries))) if entries.is_empty() => {
                (error(NO_ISSUES_MESSAGE.to_string()), Update::None)
            }
            (WorkflowState::Loading, Message::IssuesLoaded(Ok(entries))) => {
                tracing::debug!(count = entries.len(), "issues loaded");
                self.entries = entries;
                (self.issue_list(0), Update::None)
            }
            (
                WorkflowState::Confirm { awaiting: true, .. }
                | WorkflowState::ExistingBranch { awaiting: true, .. },
                Message::BranchSwitched(result),
            ) => match result {
                Ok(branch) => {
                    tracing::info!(branch = %branch, "switched to branch");
                    let message = format!("Switched to branch: {}", branch);
                    (WorkflowState::Result { message }, Update::None)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "branch operation failed");
                    let message = format!("Failed to create/switch branch: {}", e);
                    (error(message), Update::None)
                }
            },
            (state, message) => {
                tracing::warn!(?message, "ignoring message for current screen");
                (state, Update::None)
            }
        }
    }

    fn on_key(&self, state: WorkflowState, key: KeyEvent) -> (WorkflowState, Update) {
        match state {
            WorkflowState::Loading => (state, Update::None),
            WorkflowState::IssueList {
                selected,
                filter,
                viewport,
            } => self.on_issue_list_key(selected, filter, viewport, key),
            WorkflowState::BranchEdit { issue, .. } if key.code == KeyCode::Esc => {
                (self.issue_list(issue), Update::None)
            }
            WorkflowState::BranchEdit { issue, draft } => on_branch_edit_key(issue, draft, key),
            WorkflowState::Confirm {
                issue,
                draft,
                branch,
                awaiting,
            } => {
                if awaiting {
                    let state = WorkflowState::Confirm {
                        issue,
                        draft,
                        branch,
                        awaiting,
                    };
                    return (state, Update::None);
                }
                match key.code {
                    KeyCode::Enter => {
                        let command = Command::CreateAndSwitch {
                            branch: branch.clone(),
                        };
                        let state = WorkflowState::Confirm {
                            issue,
                            draft,
                            branch,
                            awaiting: true,
                        };
                        (state, Update::Run(command))
                    }
                    KeyCode::Esc => (WorkflowState::BranchEdit { issue, draft }, Update::None),
                    _ => (
                        WorkflowState::Confirm {
                            issue,
                            draft,
                            branch,
                            awaiting,
                        },
                        Update::None,
                    ),
                }
            }
            WorkflowState::ExistingBranch {
                issue,
                branch,
                awaiting,
            } => {
                if awaiting {
                    let state = WorkflowState::ExistingBranch {
                        issue,
                        branch,
                        awaiting,
                    };
                    return (state, Update::None);
                }
                match key.code {
                    KeyCode::Enter => {
                        let command = Command::SwitchExisting {
                            branch: branch.clone(),
                        };
                        let state = WorkflowState::ExistingBranch {
                            issue,
                            branch,
                            awaiting: true,
                        };
                        (state, Update::Run(command))
                    }
                    KeyCode::Esc => (self.issue_list(issue), Update::None),
                    _ => (
                        WorkflowState::ExistingBranch {
                            issue,
                            branch,
                            awaiting,
                        },
                        Update::None,
                    ),
                }
            }
            WorkflowState::Result { .. } | WorkflowState::Error { .. } => {
                if is_ctrl_c(&key) || matches!(key.code, KeyCode::Enter | KeyCode::Char('q')) {
                    (state, Update::Quit)
                } else {
                    (state, Update::None)
                }
            }
        }
    }

    fn on_issue_list_key(
        &self,
        selected: usize,
        filter: Option<String>,
        viewport: Viewport,
        key: KeyEvent,
    ) -> (WorkflowState, Update) {
        let stay = |selected: usize, filter: Option<String>| WorkflowState::IssueList {
            selected,
            filter,
            viewport,
        };
        if is_ctrl_c(&key) {
            return (stay(selected, filter), Update::Quit);
        }

        let visible = self.visible_indices(filter.as_deref());
        let last = visible.len().saturating_sub(1);
        let keep = |selected: usize, filter: Option<String>| {
            (stay(selected, filter), Update::None)
        };

        match key.code {
            KeyCode::Enter => match visible.get(selected) {
                Some(&index) => (self.select(index), Update::None),
                None => keep(selected, filter),
            },
            KeyCode::Down => keep(next(selected, visible.len()), filter),
            KeyCode::Up => keep(previous(selected, visible.len()), filter),
            KeyCode::Esc if filter.is_some() => keep(0, None),
            KeyCode::Backspace if filter.is_some() => {
                let mut text = filter.unwrap_or_default();
                text.pop();
                keep(0, Some(text))
            }
            KeyCode::Char(c) if filter.is_some() => {
                if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                    return keep(selected, filter);
                }
                let mut text = filter.unwrap_or_default();
                text.push(c);
                keep(0, Some(text))
            }
            KeyCode::Char('q') => (stay(selected, filter), Update::Quit),
            KeyCode::Char('j') => keep(next(selected, visible.len()), filter),
            KeyCode::Char('k') => keep(previous(selected, visible.len()), filter),
            KeyCode::Char('g') | KeyCode::Home => keep(0, filter),
            KeyCode::Char('G') | KeyCode::End => keep(last, filter),
            KeyCode::Char('/') => keep(0, Some(String::new())),
            _ => keep(selected, filter),
        }
    }

    /// Route a picked issue: straight to the existing branch if its default
    /// name was found at fetch time, otherwise to the editor.
    fn select(&self, index: usize) -> WorkflowState {
        let entry = &self.entries[index];
        if entry.branch_exists {
            WorkflowState::ExistingBranch {
                issue: index,
                branch: entry.candidate_branch(),
                awaiting: false,
            }
        } else {
            WorkflowState::BranchEdit {
                issue: index,
                draft: BranchNameDraft::new(&entry.issue.identifier, &entry.issue.title),
            }
        }
    }

    fn issue_list(&self, selected: usize) -> WorkflowState {
        WorkflowState::IssueList {
            selected,
            filter: None,
            viewport: self.viewport,
        }
    }
}

/// Esc is handled by the caller, which knows the viewport to return to.
fn on_branch_edit_key(
    issue: usize,
    mut draft: BranchNameDraft,
    key: KeyEvent,
) -> (WorkflowState, Update) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => {
            let branch = draft.commit();
            let state = WorkflowState::Confirm {
                issue,
                draft,
                branch,
                awaiting: false,
            };
            return (state, Update::None);
        }
        KeyCode::Char('u') if ctrl => draft.clear(),
        KeyCode::Char('a') if ctrl => draft.move_home(),
        KeyCode::Char('e') if ctrl => draft.move_end(),
        KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            draft.insert(c)
        }
        KeyCode::Backspace => draft.backspace(),
        KeyCode::Delete => draft.delete(),
        KeyCode::Left => draft.move_left(),
        KeyCode::Right => draft.move_right(),
        KeyCode::Home => draft.move_home(),
        KeyCode::End => draft.move_end(),
        _ => {}
    }
    (WorkflowState::BranchEdit { issue, draft }, Update::None)
}

/// A resize only reaches the state that lays itself out by size.
fn resized(state: WorkflowState, size: Viewport) -> WorkflowState {
    match state {
        WorkflowState::IssueList {
            selected, filter, ..
        } => WorkflowState::IssueList {
            selected,
            filter,
            viewport: size,
        },
        other => other,
    }
}

fn error(message: String) -> WorkflowState {
    WorkflowState::Error { message }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn next(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (selected + 1) % len
    }
}

fn previous(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if selected == 0 {
        len - 1
    } else {
        selected - 1
    }
}
