//! ReAct completion parser.
//!
//! A completion carries exactly one directive: an `Action:` / `Action Input:`
//! pair, or a `Final Answer:`. Text after a model-written `Observation:` line
//! is dropped before parsing.

use thiserror::Error;

pub const THOUGHT: &str = "Thought:";
pub const ACTION: &str = "Action:";
pub const ACTION_INPUT: &str = "Action Input:";
pub const OBSERVATION: &str = "Observation:";
pub const FINAL_ANSWER: &str = "Final Answer:";

/// What the model asked the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Invoke `tool` with `input`.
    Action {
        thought: String,
        tool: String,
        input: String,
    },
    /// Stop with `answer`.
    Final { thought: String, answer: String },
}

/// Malformed completion. The display text is fed back as the observation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Invalid Format: Respond with either 'Action:' and 'Action Input:' or 'Final Answer:', not both")]
    Ambiguous,

    #[error("Invalid Format: 'Final Answer:' must be followed by the answer")]
    EmptyFinalAnswer,
}

/// Parse one completion.
pub fn parse_completion(completion: &str) -> Result<Directive, ParseError> {
    let text = strip_hallucinated_observation(completion);

    let final_pos = text.find(FINAL_ANSWER);
    let action_pos = find_line_marker(text, ACTION);

    match (action_pos, final_pos) {
        (Some(_), Some(_)) => Err(ParseError::Ambiguous),
        (None, Some(pos)) => {
            let answer = text[pos + FINAL_ANSWER.len()..].trim();
            if answer.is_empty() {
                return Err(ParseError::EmptyFinalAnswer);
            }
            Ok(Directive::Final {
                thought: clean_thought(&text[..pos]),
                answer: answer.to_string(),
            })
        }
        (Some(pos), None) => {
            let after = &text[pos + ACTION.len()..];
            let tool_line = after.split('\n').next().unwrap_or_default();
            let tool = clean_tool_name(tool_line);
            if tool.is_empty() {
                return Err(ParseError::MissingAction);
            }

            let input_pos = find_line_marker(after, ACTION_INPUT).ok_or(ParseError::MissingActionInput)?;
            let input = unquote(after[input_pos + ACTION_INPUT.len()..].trim());

            Ok(Directive::Action {
                thought: clean_thought(&text[..pos]),
                tool,
                input: input.to_string(),
            })
        }
        (None, None) => Err(ParseError::MissingAction),
    }
}

/// The reasoning text of a completion, up to its first directive.
///
/// Used to record the thought of a malformed completion.
pub fn leading_thought(completion: &str) -> String {
    let text = strip_hallucinated_observation(completion);
    let end = [
        find_line_marker(text, ACTION),
        find_line_marker(text, ACTION_INPUT),
        text.find(FINAL_ANSWER),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(text.len());
    clean_thought(&text[..end])
}

/// Drop everything from the first line starting with `Observation:`.
fn strip_hallucinated_observation(text: &str) -> &str {
    match find_line_marker(text, OBSERVATION) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Byte offset of `marker` when it opens a line (leading whitespace allowed).
fn find_line_marker(text: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with(marker) {
            return Some(offset + indent);
        }
        offset += line.len() + 1;
    }
    None
}

fn clean_thought(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix(THOUGHT).unwrap_or(text).trim().to_string()
}

fn clean_tool_name(line: &str) -> String {
    line.trim()
        .trim_matches(|c: char| c == '`' || c == '[' || c == ']' || c == '"')
        .trim()
        .to_string()
}

/// Strip one pair of surrounding double quotes when they wrap the whole input.
fn unquote(input: &str) -> &str {
    match input.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if !inner.contains('"') => inner,
        _ => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parses_action() {
        let completion = " I need a broad overview first.\nAction: tavily_search\nAction Input: quantum error correction";
        assert_eq!(
            parse_completion(completion).unwrap(),
            Directive::Action {
                thought: "I need a broad overview first.".into(),
                tool: "tavily_search".into(),
                input: "quantum error correction".into(),
            }
        );
    }

    #[test]
    fn parses_final_answer_verbatim() {
        let completion = "Thought: I have finished my research.\nFinal Answer: ## Summary\n\nSurface codes...\n\n1. [Paper](https://arxiv.org/abs/1)";
        match parse_completion(completion).unwrap() {
            Directive::Final { thought, answer } => {
                assert_eq!(thought, "I have finished my research.");
                assert_eq!(answer, "## Summary\n\nSurface codes...\n\n1. [Paper](https://arxiv.org/abs/1)");
            }
            other => panic!("expected final answer, got {other:?}"),
        }
    }

    #[test]
    fn drops_hallucinated_observation() {
        let completion = "Search again.\nAction: tavily_search\nAction Input: qec site:arxiv.org\nObservation: made up results\nThought: done\nFinal Answer: fabricated";
        assert_eq!(
            parse_completion(completion).unwrap(),
            Directive::Action {
                thought: "Search again.".into(),
                tool: "tavily_search".into(),
                input: "qec site:arxiv.org".into(),
            }
        );
    }

    #[test]
    fn both_directives_are_malformed() {
        let completion = "Hmm\nAction: tavily_search\nAction Input: x\nFinal Answer: y";
        assert_eq!(parse_completion(completion), Err(ParseError::Ambiguous));
    }

    #[test_case("I am not sure what to do." ; "no directive")]
    #[test_case("Action:\nAction Input: q" ; "empty tool name")]
    fn missing_action(completion: &str) {
        assert_eq!(parse_completion(completion), Err(ParseError::MissingAction));
    }

    #[test]
    fn missing_action_input() {
        assert_eq!(
            parse_completion("Thought: go\nAction: tavily_search"),
            Err(ParseError::MissingActionInput)
        );
    }

    #[test]
    fn empty_final_answer() {
        assert_eq!(
            parse_completion("Thought: done\nFinal Answer:   "),
            Err(ParseError::EmptyFinalAnswer)
        );
    }

    #[test_case("\"neural networks\"", "neural networks" ; "whole input quoted")]
    #[test_case("\"neural networks\" site:arxiv.org", "\"neural networks\" site:arxiv.org" ; "inner phrase kept")]
    #[test_case("plain query", "plain query" ; "unquoted")]
    fn action_input_quotes(raw: &str, expected: &str) {
        let completion = format!("t\nAction: tavily_search\nAction Input: {raw}");
        match parse_completion(&completion).unwrap() {
            Directive::Action { input, .. } => assert_eq!(input, expected),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test_case("[tavily_search]" ; "brackets")]
    #[test_case("`tavily_search`" ; "backticks")]
    #[test_case("  tavily_search  " ; "padding")]
    fn tool_name_is_cleaned(raw: &str) {
        let completion = format!("t\nAction: {raw}\nAction Input: q");
        match parse_completion(&completion).unwrap() {
            Directive::Action { tool, .. } => assert_eq!(tool, "tavily_search"),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn multiline_action_input() {
        let completion = "t\nAction: tavily_search\nAction Input: line one\nline two";
        match parse_completion(completion).unwrap() {
            Directive::Action { input, .. } => assert_eq!(input, "line one\nline two"),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn inline_final_answer() {
        let completion = "I know this already. Final Answer: 42";
        assert_eq!(
            parse_completion(completion).unwrap(),
            Directive::Final {
                thought: "I know this already.".into(),
                answer: "42".into(),
            }
        );
    }

    #[test]
    fn leading_thought_stops_at_first_directive() {
        assert_eq!(leading_thought("Thought: plan\nAction: x\nFinal Answer: y"), "plan");
        assert_eq!(leading_thought("just rambling"), "just rambling");
        assert_eq!(leading_thought("Observation: nothing"), "");
    }

    #[test]
    fn error_text_is_the_corrective_observation() {
        assert_eq!(
            ParseError::MissingAction.to_string(),
            "Invalid Format: Missing 'Action:' after 'Thought:'"
        );
    }
}
