//! Terminal and JSON rendering of runs and stored history.

use scholar_agent::{AgentRun, PromptTemplate, RunStatus, Trace};
use scholar_common::util::truncate_with_ellipsis;
use scholar_memory::StoredTurn;
use serde::Serialize;

const PREVIEW_CHARS: usize = 80;

/// Machine-readable result of `scholar ask --json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub query: &'a str,
    pub template: PromptTemplate,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<&'a str>,
    pub log: String,
    pub trace: &'a Trace,
}

impl<'a> RunReport<'a> {
    pub fn new(query: &'a str, run: &'a AgentRun) -> Self {
        let (status, reason) = match &run.status {
            RunStatus::Completed => ("completed", None),
            RunStatus::Aborted(err) => ("aborted", Some(err.to_string())),
        };
        Self {
            query,
            template: run.template,
            status,
            reason,
            answer: run.answer(),
            log: run.trace.render_log(),
            trace: &run.trace,
        }
    }
}

/// Human-readable output: the reasoning log, then the answer or the abort notice.
pub fn render_run(run: &AgentRun) -> String {
    let mut out = String::new();
    let log = run.trace.render_log();
    if !log.is_empty() {
        out.push_str("Reasoning:");
        out.push_str(&log);
        out.push('\n');
    }
    match &run.status {
        RunStatus::Completed => {
            out.push_str(run.answer().unwrap_or_default());
        }
        RunStatus::Aborted(err) => {
            out.push_str("The research could not be completed: ");
            out.push_str(&err.to_string());
        }
    }
    out
}

/// One line per stored turn: `[id] role: preview`.
pub fn render_history(turns: &[StoredTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let flat = turn.content.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("[{}] {}: {}", turn.id, turn.role, truncate_with_ellipsis(&flat, PREVIEW_CHARS))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown report for one stored answer.
pub fn render_markdown(turn: &StoredTurn) -> String {
    format!("# Research report #{}\n\n{}\n", turn.id, turn.content.trim())
}
