//! Prompt templates and mode selection.
//!
//! Two templates share the ReAct format block. The initial template drives
//! a broad search, a `site:`-restricted academic search, a summary, and up
//! to five linked papers. The follow-up template answers from the
//! conversation without starting a new literature search.

use crate::context::ConversationContext;

/// Academic sites the initial research search is restricted to.
pub const ACADEMIC_SITES: [&str; 7] = [
    "scholar.google.com",
    "arxiv.org",
    "ieeexplore.ieee.org",
    "sciencedirect.com",
    "pubmed.ncbi.nlm.nih.gov",
    "dl.acm.org",
    "jstor.org",
];

const FORMAT_BLOCK: &str = "\
Use the following format:
Question: the input question you must answer
Thought: Your reasoning here...
Action: The action to take, should be one of [{tool_names}]
Action Input: The input to the action
Observation: The result of the action
... (This sequence can repeat)
Thought: I have finished my research and will now provide the final answer.
Final Answer: [Your final answer]

Begin!
Question: {input}
{agent_scratchpad}Thought:";

const INITIAL_RESEARCH: &str = "\
You are a hyper-competent academic research assistant. Your mission is to provide a concise summary and a list of papers from elite academic sources.

**INSTRUCTIONS:**
1.  Perform a broad web search to write a brief, one-paragraph summary of the user's topic.
2.  Next, to find academic papers, you MUST perform a dedicated search using an advanced query with `site:` operators. Search **only** the following elite academic websites: Google Scholar, arXiv (Cornell), IEEE Xplore, ScienceDirect, PubMed, ACM Digital Library, and JSTOR.
    * Example of a good Action Input: `\"neural networks\" {site_filter}`
3.  From your search results, identify and list up to 5 of the most relevant papers.
4.  Present the final answer with the summary first, followed by the list of research papers with their titles and clickable Markdown links.

You have access to the following tools:
{tools}

";

const FOLLOW_UP: &str = "\
You are a hyper-competent academic research assistant continuing a conversation with a researcher.

**INSTRUCTIONS:**
1.  The question below follows up on the conversation so far. Answer it from that conversation.
2.  Do NOT start a new literature search. Do NOT add new `site:`-restricted searches, citations, or paper links.
3.  Use a tool only if the conversation lacks a specific fact you need, and keep the query general.
4.  Keep the answer focused and concise.

Conversation so far:
{context}

You have access to the following tools:
{tools}

";

/// Which prompt a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Fresh research: summary plus academic papers.
    InitialResearch,
    /// Contextual follow-up on the conversation.
    FollowUp,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInputs<'a> {
    /// `name: description` lines, one per tool.
    pub tools: &'a str,
    /// Comma-separated tool names.
    pub tool_names: &'a str,
    /// The user's question.
    pub question: &'a str,
    /// Formatted conversation context (follow-up only).
    pub context: &'a str,
    /// Transcript of the steps taken so far.
    pub scratchpad: &'a str,
}

/// Choose the template for a run.
///
/// Follow-up iff the caller hints at one and there is context to follow up
/// on. Pure and total.
pub fn select(_query: &str, context: &ConversationContext, follow_up_hint: bool) -> PromptTemplate {
    if follow_up_hint && !context.is_empty() {
        PromptTemplate::FollowUp
    } else {
        PromptTemplate::InitialResearch
    }
}

/// `site:a OR site:b ...` over [`ACADEMIC_SITES`].
pub fn academic_site_filter() -> String {
    ACADEMIC_SITES
        .iter()
        .map(|site| format!("site:{site}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

impl PromptTemplate {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitialResearch => "initial_research",
            Self::FollowUp => "follow_up",
        }
    }

    fn preamble(&self) -> &'static str {
        match self {
            Self::InitialResearch => INITIAL_RESEARCH,
            Self::FollowUp => FOLLOW_UP,
        }
    }

    /// Render the full prompt.
    ///
    /// Placeholders are substituted in a single pass, so braces inside the
    /// question or observations are never re-expanded.
    pub fn render(&self, inputs: &PromptInputs<'_>) -> String {
        let site_filter = academic_site_filter();
        let template = format!("{}{}", self.preamble(), FORMAT_BLOCK);

        substitute(&template, |key| match key {
            "tools" => Some(inputs.tools),
            "tool_names" => Some(inputs.tool_names),
            "input" => Some(inputs.question),
            "context" => Some(inputs.context),
            "agent_scratchpad" => Some(inputs.scratchpad),
            "site_filter" => Some(site_filter.as_str()),
            _ => None,
        })
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Replace `{key}` placeholders known to `lookup`; leave other braces as-is.
fn substitute<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after
            .find('}')
            .and_then(|end| lookup(&after[..end]).map(|value| (value, end)));

        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_memory::ConversationTurn;

    fn three_turns() -> ConversationContext {
        ConversationContext::recent(vec![
            ConversationTurn::user("quantum error correction"),
            ConversationTurn::assistant("Summary... 1. Surface codes 2. Color codes 3. LDPC codes"),
            ConversationTurn::user("thanks"),
        ])
    }

    #[test]
    fn empty_context_forces_initial() {
        let empty = ConversationContext::empty();
        assert_eq!(select("q", &empty, true), PromptTemplate::InitialResearch);
        assert_eq!(select("q", &empty, false), PromptTemplate::InitialResearch);
    }

    #[test]
    fn hint_with_context_is_follow_up() {
        assert_eq!(select("q", &three_turns(), true), PromptTemplate::FollowUp);
        assert_eq!(select("q", &three_turns(), false), PromptTemplate::InitialResearch);
    }

    #[test]
    fn selection_is_deterministic() {
        let ctx = three_turns();
        let first = select("more on the third one", &ctx, true);
        for _ in 0..10 {
            assert_eq!(select("more on the third one", &ctx, true), first);
        }
    }

    #[test]
    fn initial_render_fills_placeholders() {
        let prompt = PromptTemplate::InitialResearch.render(&PromptInputs {
            tools: "tavily_search: searches the web",
            tool_names: "tavily_search",
            question: "quantum error correction",
            context: "",
            scratchpad: "",
        });

        assert!(prompt.contains("tavily_search: searches the web"));
        assert!(prompt.contains("should be one of [tavily_search]"));
        assert!(prompt.contains("site:arxiv.org OR site:ieeexplore.ieee.org"));
        assert!(prompt.ends_with("Question: quantum error correction\nThought:"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn follow_up_render_embeds_context() {
        let ctx = three_turns();
        let prompt = PromptTemplate::FollowUp.render(&PromptInputs {
            tools: "t: d",
            tool_names: "t",
            question: "say more about the third one",
            context: &ctx.format(),
            scratchpad: "Thought: a\nAction: t\nAction Input: b\nObservation: c\n",
        });

        assert!(prompt.contains("Conversation so far:\nUser: quantum error correction"));
        assert!(prompt.contains("Do NOT start a new literature search"));
        assert!(prompt.ends_with("Observation: c\nThought:"));
    }

    #[test]
    fn question_braces_are_not_expanded() {
        let prompt = PromptTemplate::InitialResearch.render(&PromptInputs {
            tools: "t: d",
            tool_names: "t",
            question: "what is {tools} in set {a, b}",
            ..Default::default()
        });
        assert!(prompt.contains("Question: what is {tools} in set {a, b}\nThought:"));
    }

    #[test]
    fn names() {
        assert_eq!(PromptTemplate::FollowUp.to_string(), "follow_up");
        assert_eq!(PromptTemplate::InitialResearch.name(), "initial_research");
    }
}
