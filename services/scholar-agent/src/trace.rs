//! Execution trace of one agent run.
//!
//! The loop appends one [`AgentStep`] per iteration. The scratchpad sent to
//! the model is rendered from the recorded steps, so a trace replays exactly
//! the transcript the model saw.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::{ACTION, ACTION_INPUT, FINAL_ANSWER, OBSERVATION, THOUGHT};

/// One Thought / Action / Observation cycle.
///
/// A tool step has all four fields. A corrective step (malformed completion)
/// has a thought and an observation. The final step has only a thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub thought: String,
    pub action: Option<String>,
    pub action_input: Option<String>,
    pub observation: Option<String>,
}

impl AgentStep {
    pub fn tool_call(
        thought: impl Into<String>,
        tool: impl Into<String>,
        input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: Some(tool.into()),
            action_input: Some(input.into()),
            observation: Some(observation.into()),
        }
    }

    pub fn correction(thought: impl Into<String>, observation: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            action: None,
            action_input: None,
            observation: Some(observation.into()),
        }
    }

    pub fn final_step(thought: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            action: None,
            action_input: None,
            observation: None,
        }
    }

    pub fn is_tool_call(&self) -> bool {
        self.action.is_some()
    }

    /// Append this step in transcript form.
    fn render_into(&self, out: &mut String) {
        push_field(out, THOUGHT, &self.thought);
        if let Some(action) = &self.action {
            push_field(out, ACTION, action);
        }
        if let Some(input) = &self.action_input {
            push_field(out, ACTION_INPUT, input);
        }
        if let Some(observation) = &self.observation {
            push_field(out, OBSERVATION, observation);
        }
    }
}

/// Write `marker value`. Continuation lines that would read as a marker get
/// one extra leading space so they stay inside this field.
fn push_field(out: &mut String, marker: &str, value: &str) {
    out.push_str(marker);
    out.push(' ');
    let mut lines = value.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        if is_escaped_marker(line) || split_marker(line).is_some() {
            out.push(' ');
        }
        out.push_str(line);
    }
    out.push('\n');
}

/// A marker preceded by one or more spaces.
fn is_escaped_marker(line: &str) -> bool {
    line.starts_with(' ') && split_marker(line.trim_start_matches(' ')).is_some()
}

fn unescape_line(line: &str) -> &str {
    if is_escaped_marker(line) {
        &line[1..]
    } else {
        line
    }
}

/// Render steps as the scratchpad fed to the model.
pub fn render_steps(steps: &[AgentStep]) -> String {
    let mut out = String::new();
    for step in steps {
        step.render_into(&mut out);
    }
    out
}

/// Errors from re-reading a rendered transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("line {line}: text before the first 'Thought:'")]
    TextBeforeThought { line: usize },

    #[error("line {line}: '{marker}' appears twice in one step")]
    DuplicateField { line: usize, marker: &'static str },
}

/// Ordered steps plus the terminal answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub steps: Vec<AgentStep>,
    pub final_answer: Option<String>,
}

impl Trace {
    /// Full transcript: every step, then the final answer if any.
    pub fn transcript(&self) -> String {
        let mut out = render_steps(&self.steps);
        if let Some(answer) = &self.final_answer {
            push_field(&mut out, FINAL_ANSWER, answer);
        }
        out
    }

    /// Re-read a transcript produced by [`Trace::transcript`].
    ///
    /// Fields are delimited by markers at the start of a line; any other line
    /// continues the current field.
    pub fn parse_transcript(text: &str) -> Result<Self, TranscriptError> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        if body.is_empty() {
            return Ok(Self::default());
        }

        // (line number, marker, value) per field, continuation lines folded in.
        let mut fields: Vec<(usize, &'static str, String)> = Vec::new();
        for (idx, line) in body.split('\n').enumerate() {
            match split_marker(line) {
                Some((marker, value)) => fields.push((idx + 1, marker, value.to_string())),
                None => match fields.last_mut() {
                    Some((_, _, value)) => {
                        value.push('\n');
                        value.push_str(unescape_line(line));
                    }
                    None => return Err(TranscriptError::TextBeforeThought { line: idx + 1 }),
                },
            }
        }

        let mut trace = Self::default();
        for (line, marker, value) in fields {
            if marker == THOUGHT {
                trace.steps.push(AgentStep::final_step(value));
                continue;
            }
            if marker == FINAL_ANSWER {
                if trace.final_answer.is_some() {
                    return Err(TranscriptError::DuplicateField { line, marker });
                }
                trace.final_answer = Some(value);
                continue;
            }

            let step = trace
                .steps
                .last_mut()
                .ok_or(TranscriptError::TextBeforeThought { line })?;
            let slot = match marker {
                ACTION => &mut step.action,
                ACTION_INPUT => &mut step.action_input,
                _ => &mut step.observation,
            };
            if slot.is_some() {
                return Err(TranscriptError::DuplicateField { line, marker });
            }
            *slot = Some(value);
        }

        Ok(trace)
    }

    /// Display log of the tool steps, one block per call.
    pub fn render_log(&self) -> String {
        let mut log = String::new();
        for step in self.steps.iter().filter(|s| s.is_tool_call()) {
            log.push('\n');
            push_field(&mut log, THOUGHT, &step.thought);
            push_field(&mut log, ACTION, step.action.as_deref().unwrap_or_default());
            push_field(
                &mut log,
                ACTION_INPUT,
                step.action_input.as_deref().unwrap_or_default(),
            );
            push_field(
                &mut log,
                OBSERVATION,
                step.observation.as_deref().unwrap_or_default(),
            );
        }
        log
    }

    /// Number of tool invocations.
    pub fn tool_calls(&self) -> usize {
        self.steps.iter().filter(|s| s.is_tool_call()).count()
    }
}

fn split_marker(line: &str) -> Option<(&'static str, &str)> {
    [THOUGHT, ACTION_INPUT, ACTION, OBSERVATION, FINAL_ANSWER]
        .into_iter()
        .find_map(|marker| {
            line.strip_prefix(marker)
                .map(|rest| (marker, rest.strip_prefix(' ').unwrap_or(rest)))
        })
}

/// Append-only recorder for one run.
///
/// Built fresh per run; steps cannot be removed or edited, and finalizing
/// consumes the recorder.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<AgentStep>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&mut self, step: AgentStep) {
        tracing::debug!(
            step = self.steps.len() + 1,
            action = step.action.as_deref().unwrap_or("-"),
            "Recorded step"
        );
        self.steps.push(step);
    }

    /// Steps recorded so far.
    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Scratchpad for the next model call.
    pub fn scratchpad(&self) -> String {
        render_steps(&self.steps)
    }

    /// Close the trace with the final answer.
    pub fn finalize(self, answer: impl Into<String>) -> Trace {
        Trace {
            steps: self.steps,
            final_answer: Some(answer.into()),
        }
    }

    /// Export without an answer (aborted runs).
    pub fn export(self) -> Trace {
        Trace {
            steps: self.steps,
            final_answer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trace {
        let mut recorder = TraceRecorder::new();
        recorder.record_step(AgentStep::tool_call(
            "I need a broad overview.",
            "tavily_search",
            "quantum error correction",
            "[1] Surface codes\nURL: https://example.org\nA review.",
        ));
        recorder.record_step(AgentStep::correction(
            "",
            "Invalid Format: Missing 'Action:' after 'Thought:'",
        ));
        recorder.record_step(AgentStep::tool_call(
            "Now the academic search.",
            "tavily_search",
            "\"quantum error correction\" site:arxiv.org",
            "Tool 'tavily_search' failed: rate limited\n",
        ));
        recorder.record_step(AgentStep::final_step("I have finished my research."));
        recorder.finalize("Summary...\n\n1. [Surface codes](https://arxiv.org/abs/1208.0928)")
    }

    #[test]
    fn scratchpad_matches_transcript_prefix() {
        let mut recorder = TraceRecorder::new();
        recorder.record_step(AgentStep::tool_call("t", "search", "q", "o"));
        assert_eq!(
            recorder.scratchpad(),
            "Thought: t\nAction: search\nAction Input: q\nObservation: o\n"
        );
        let trace = recorder.finalize("done");
        assert!(trace.transcript().starts_with(&render_steps(&trace.steps[..1])));
        assert!(trace.transcript().ends_with("Final Answer: done\n"));
    }

    #[test]
    fn transcript_round_trip() {
        let trace = sample();
        let parsed = Trace::parse_transcript(&trace.transcript()).unwrap();
        assert_eq!(parsed, trace);
    }

    #[test]
    fn marker_lines_inside_values_round_trip() {
        let mut recorder = TraceRecorder::new();
        recorder.record_step(AgentStep::tool_call(
            "Search.",
            "tavily_search",
            "line one\nAction Input: still the input",
            "[1] Agents\nExample trajectory:\nThought: x\nAction: y\n  Observation: indented\nFinal Answer: z",
        ));
        recorder.record_step(AgentStep::final_step("Done."));
        let trace = recorder.finalize("ok\nThought: not a step");

        let transcript = trace.transcript();
        assert!(transcript.contains("\n Thought: x\n Action: y\n   Observation: indented\n"));
        assert_eq!(transcript.matches("\nThought: ").count(), 1);

        let parsed = Trace::parse_transcript(&transcript).unwrap();
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed, trace);
    }

    #[test]
    fn scratchpad_keeps_snippet_markers_inside_the_observation() {
        let mut recorder = TraceRecorder::new();
        recorder.record_step(AgentStep::tool_call("t", "search", "q", "snippet\nThought: I should search"));
        assert_eq!(
            recorder.scratchpad(),
            "Thought: t\nAction: search\nAction Input: q\nObservation: snippet\n Thought: I should search\n"
        );
    }

    #[test]
    fn aborted_trace_round_trip() {
        let mut recorder = TraceRecorder::new();
        recorder.record_step(AgentStep::tool_call("a", "b", "", "d"));
        let trace = recorder.export();
        assert_eq!(Trace::parse_transcript(&trace.transcript()).unwrap(), trace);
    }

    #[test]
    fn empty_transcript() {
        assert_eq!(Trace::parse_transcript("").unwrap(), Trace::default());
    }

    #[test]
    fn parse_rejects_leading_text() {
        assert_eq!(
            Trace::parse_transcript("hello\nThought: x\n"),
            Err(TranscriptError::TextBeforeThought { line: 1 })
        );
        assert_eq!(
            Trace::parse_transcript("Action: x\n"),
            Err(TranscriptError::TextBeforeThought { line: 1 })
        );
    }

    #[test]
    fn parse_rejects_duplicate_fields() {
        let err = Trace::parse_transcript("Thought: a\nAction: x\nAction: y\n").unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateField { line: 3, marker: ACTION });
    }

    #[test]
    fn render_log_lists_tool_steps_only() {
        let log = sample().render_log();
        assert!(log.starts_with("\nThought: I need a broad overview.\nAction: tavily_search\n"));
        assert_eq!(log.matches("Action: tavily_search").count(), 2);
        assert!(!log.contains("Invalid Format"));
        assert!(!log.contains("Final Answer"));
    }

    #[test]
    fn counts_tool_calls() {
        assert_eq!(sample().tool_calls(), 2);
        assert_eq!(sample().steps.len(), 4);
    }

    #[test]
    fn serde_round_trip() {
        let trace = sample();
        let json = serde_json::to_string(&trace).unwrap();
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
    }
}
