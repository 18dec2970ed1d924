use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::branch::BranchNameDraft;

use super::app::{Viewport, Workflow, WorkflowState};

/// Rows of the issue list screen that are not issues: borders, title,
/// spacing and legend.
const ISSUE_LIST_CHROME: u16 = 6;

fn title_style() -> Style {
    Style::default()
        .fg(Color::LightMagenta)
        .add_modifier(Modifier::BOLD)
}

fn help_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn draw(f: &mut Frame, workflow: &Workflow) {
    let block = Block::default()
        .title(Span::styled(
            " git-linear ",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightCyan));

    let paragraph = Paragraph::new(render(workflow))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, f.area());
}

/// The lines of the active screen, ending with its key legend.
pub fn render(workflow: &Workflow) -> Vec<Line<'static>> {
    match workflow.state() {
        WorkflowState::Loading => vec![
            Line::from("Loading issues..."),
            Line::from(""),
            legend("fetching your assigned issues"),
        ],
        WorkflowState::IssueList {
            selected,
            filter,
            viewport,
        } => render_issue_list(workflow, *selected, filter.as_deref(), *viewport),
        WorkflowState::BranchEdit { issue, draft } => {
            let mut lines = issue_header(workflow, *issue);
            lines.push(Line::from("Branch name:"));
            lines.push(editor_line(draft));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Will create: {}", draft.commit()),
                help_style(),
            )));
            lines.push(Line::from(""));
            lines.push(legend("enter: confirm • esc: back"));
            lines
        }
        WorkflowState::Confirm {
            issue,
            branch,
            awaiting,
            ..
        } => {
            let mut lines = issue_header(workflow, *issue);
            lines.push(Line::from(format!("Create branch: {}", branch)));
            lines.push(Line::from(""));
            if *awaiting {
                lines.push(Line::from("Creating branch..."));
                lines.push(Line::from(""));
                lines.push(legend("working..."));
            } else {
                lines.push(legend("enter: create • esc: back"));
            }
            lines
        }
        WorkflowState::ExistingBranch {
            issue,
            branch,
            awaiting,
        } => {
            let mut lines = issue_header(workflow, *issue);
            lines.push(Line::from(format!("Branch '{}' already exists.", branch)));
            lines.push(Line::from(""));
            if *awaiting {
                lines.push(Line::from("Switching branch..."));
                lines.push(Line::from(""));
                lines.push(legend("working..."));
            } else {
                lines.push(legend("enter: switch to existing branch • esc: back"));
            }
            lines
        }
        WorkflowState::Result { message } => vec![
            Line::from(Span::styled(
                format!("✓ {}", message),
                Style::default().fg(Color::LightGreen),
            )),
            Line::from(""),
            legend("enter/q: quit"),
        ],
        WorkflowState::Error { message } => vec![
            Line::from(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::LightRed),
            )),
            Line::from(""),
            legend("enter/q: quit"),
        ],
    }
}

/// [`render`] flattened to plain text, one screen line per text line.
pub fn render_plain(workflow: &Workflow) -> String {
    render(workflow)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn legend(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), help_style()))
}

fn issue_header(workflow: &Workflow, issue: usize) -> Vec<Line<'static>> {
    let title = match workflow.entry(issue) {
        Some(entry) => format!("Issue: {} - {}", entry.issue.identifier, entry.issue.title),
        None => "Issue".to_string(),
    };
    vec![Line::from(Span::styled(title, title_style())), Line::from("")]
}

fn editor_line(draft: &BranchNameDraft) -> Line<'static> {
    let suffix = draft.suffix();
    let cursor = draft.cursor().min(suffix.len());
    let (before, rest) = suffix.split_at(cursor);
    let mut rest_chars = rest.chars();
    let at_cursor = rest_chars
        .next()
        .map(String::from)
        .unwrap_or_else(|| " ".to_string());
    let after: String = rest_chars.collect();

    Line::from(vec![
        Span::styled(format!("{}-", draft.prefix()), help_style()),
        Span::raw(before.to_string()),
        Span::styled(at_cursor, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ])
}

fn render_issue_list(
    workflow: &Workflow,
    selected: usize,
    filter: Option<&str>,
    viewport: Viewport,
) -> Vec<Line<'static>> {
    let visible = workflow.visible_indices(filter);

    let mut lines = vec![Line::from(Span::styled("Select an Issue", title_style()))];
    if let Some(text) = filter {
        lines.push(Line::from(vec![
            Span::styled("Filter: ", help_style()),
            Span::raw(text.to_string()),
            Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)),
        ]));
    }
    lines.push(Line::from(""));

    let chrome = ISSUE_LIST_CHROME + u16::from(filter.is_some());
    let rows = if viewport.height == 0 {
        visible.len()
    } else {
        usize::from(viewport.height.saturating_sub(chrome)).max(1)
    };
    let offset = if selected >= rows { selected + 1 - rows } else { 0 };
    // inside the borders
    let row_width = usize::from(viewport.width.saturating_sub(2));

    if visible.is_empty() {
        lines.push(Line::from(Span::styled(
            "No issues match the filter",
            help_style(),
        )));
    }

    for (pos, &index) in visible.iter().enumerate().skip(offset).take(rows) {
        let Some(entry) = workflow.entry(index) else {
            continue;
        };
        let is_selected = pos == selected;
        let pointer = if is_selected { "> " } else { "  " };
        let marker = if entry.branch_exists { "* " } else { "  " };
        let text = format!(
            "{}{}{}  {}",
            pointer, marker, entry.issue.identifier, entry.issue.title
        );
        let status = format!("  [{}]", entry.issue.state.name);

        let style = if is_selected {
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        if row_width == 0 {
            lines.push(Line::from(vec![
                Span::styled(text, style),
                Span::styled(status, help_style()),
            ]));
        } else {
            let text = truncate_to_width(&text, row_width);
            let remaining = row_width.saturating_sub(display_width(&text));
            let status = truncate_to_width(&status, remaining);
            lines.push(Line::from(vec![
                Span::styled(text, style),
                Span::styled(status, help_style()),
            ]));
        }
    }

    lines.push(Line::from(""));
    if filter.is_some() {
        lines.push(legend(
            "type to filter • ↑/↓: navigate • enter: select • esc: clear filter",
        ));
    } else {
        lines.push(legend(
            "j/k or ↑/↓: navigate • /: filter • enter: select • q: quit",
        ));
    }
    lines
}

fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Cut `s` to at most `max` terminal columns, marking the cut with `…`.
fn truncate_to_width(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}
