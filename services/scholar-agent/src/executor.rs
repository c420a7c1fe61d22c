//! Agent executor: the ReAct loop.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Thinking ──Action──▶ Acting ──▶ Observing ──▶ Thinking
//!    │  └──malformed──────────────▶ Observing
//!    ├──Final Answer──▶ Final
//!    └──budget / model failure / cancel──▶ Aborted
//! ```
//!
//! Every observed step is recorded before the next prompt is built, and the
//! prompt's scratchpad is rendered from those records.

use scholar_common::{Config, ToolTimeoutPolicy};
use scholar_tools::{ToolError, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ConversationContext;
use crate::parser::{leading_thought, parse_completion, Directive};
use crate::prompt::{PromptInputs, PromptTemplate};
use crate::provider::{CompletionRequest, ModelError, Provider};
use crate::trace::{AgentStep, Trace, TraceRecorder};

/// Stop sequence keeping the model from writing its own observations.
const OBSERVATION_STOP: &str = "\nObservation:";

/// Which budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Steps,
    ParseRetries,
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Steps => f.write_str("step"),
            Self::ParseRetries => f.write_str("parse retry"),
        }
    }
}

/// Why a run ended without an answer.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// A tool failure that the configuration treats as fatal.
    #[error("{0}")]
    Tool(String),

    #[error("Model unavailable after {attempts} attempt(s): {message}")]
    ModelUnavailable { attempts: u32, message: String },

    #[error("Model timed out after {attempts} attempt(s) of {}s", timeout.as_secs())]
    ModelTimeout { attempts: u32, timeout: Duration },

    #[error("{budget} budget of {limit} exceeded")]
    BudgetExceeded { budget: Budget, limit: u32 },

    #[error("Cancelled by caller")]
    Cancelled,
}

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone)]
pub enum RunStatus {
    Completed,
    Aborted(AgentError),
}

/// Result of one run: the trace plus how it ended.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub template: PromptTemplate,
    pub trace: Trace,
    pub status: RunStatus,
}

impl AgentRun {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    /// The final answer of a completed run.
    pub fn answer(&self) -> Option<&str> {
        match self.status {
            RunStatus::Completed => self.trace.final_answer.as_deref(),
            RunStatus::Aborted(_) => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&AgentError> {
        match &self.status {
            RunStatus::Completed => None,
            RunStatus::Aborted(err) => Some(err),
        }
    }
}

/// Budgets, timeouts, and model settings for the loop.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<i64>,
    /// Maximum recorded steps (tool calls and corrections) per run.
    pub max_steps: u32,
    /// Malformed completions recovered before aborting.
    pub max_parse_retries: u32,
    /// Extra attempts after a failed model call.
    pub model_retries: u32,
    pub model_timeout: Duration,
    pub tool_timeout_policy: ToolTimeoutPolicy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ExecutorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: Some(config.llm.max_tokens),
            max_steps: config.agent.max_steps,
            max_parse_retries: config.agent.max_parse_retries,
            model_retries: config.llm.retries,
            model_timeout: config.agent.model_timeout(),
            tool_timeout_policy: config.agent.tool_timeout_policy,
        }
    }
}

/// Loop state. Data needed by the next transition travels in the variant.
enum LoopState {
    Thinking,
    Acting {
        thought: String,
        tool: String,
        input: String,
    },
    Observing(AgentStep),
    Final {
        thought: String,
        answer: String,
    },
    Aborted(AgentError),
}

/// Runs the ReAct loop against a provider and a tool registry.
pub struct AgentExecutor {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    options: ExecutorOptions,
}

impl AgentExecutor {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, options: ExecutorOptions) -> Self {
        Self {
            provider,
            tools,
            options,
        }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one research question to a terminal state.
    ///
    /// Never fails: aborts are reported in [`AgentRun::status`] together with
    /// the partial trace.
    pub async fn run(
        &self,
        question: &str,
        template: PromptTemplate,
        context: &ConversationContext,
        cancel: &CancellationToken,
    ) -> AgentRun {
        let tool_descriptions = self.tools.describe();
        let tool_names = self.tools.tool_names().join(", ");
        let context_block = context.format();

        let mut recorder = TraceRecorder::new();
        let mut steps_taken: u32 = 0;
        let mut parse_failures: u32 = 0;
        let mut state = LoopState::Thinking;

        tracing::info!(template = %template, context_turns = context.len(), "Starting research run");

        loop {
            state = match state {
                LoopState::Thinking => {
                    if cancel.is_cancelled() {
                        LoopState::Aborted(AgentError::Cancelled)
                    } else if steps_taken >= self.options.max_steps {
                        LoopState::Aborted(AgentError::BudgetExceeded {
                            budget: Budget::Steps,
                            limit: self.options.max_steps,
                        })
                    } else {
                        let scratchpad = recorder.scratchpad();
                        let prompt = template.render(&PromptInputs {
                            tools: &tool_descriptions,
                            tool_names: &tool_names,
                            question,
                            context: &context_block,
                            scratchpad: &scratchpad,
                        });

                        match self.complete(prompt, cancel).await {
                            Err(err) => LoopState::Aborted(err),
                            Ok(completion) => match parse_completion(&completion) {
                                Ok(Directive::Action {
                                    thought,
                                    tool,
                                    input,
                                }) => LoopState::Acting {
                                    thought,
                                    tool,
                                    input,
                                },
                                Ok(Directive::Final { thought, answer }) => {
                                    LoopState::Final { thought, answer }
                                }
                                Err(err) => {
                                    parse_failures += 1;
                                    let step =
                                        AgentStep::correction(leading_thought(&completion), err.to_string());
                                    if parse_failures > self.options.max_parse_retries {
                                        tracing::warn!(
                                            failures = parse_failures,
                                            error = %err,
                                            "Parse retry budget exhausted"
                                        );
                                        recorder.record_step(step);
                                        LoopState::Aborted(AgentError::BudgetExceeded {
                                            budget: Budget::ParseRetries,
                                            limit: self.options.max_parse_retries,
                                        })
                                    } else {
                                        tracing::warn!(
                                            failures = parse_failures,
                                            error = %err,
                                            "Malformed completion, asking the model to correct it"
                                        );
                                        LoopState::Observing(step)
                                    }
                                }
                            },
                        }
                    }
                }

                LoopState::Acting {
                    thought,
                    tool,
                    input,
                } => {
                    let outcome = tokio::select! {
                        biased;
                        () = cancel.cancelled() => None,
                        result = self.tools.invoke(&tool, &input) => Some(result),
                    };

                    match outcome {
                        None => LoopState::Aborted(AgentError::Cancelled),
                        Some(Ok(observation)) => {
                            LoopState::Observing(AgentStep::tool_call(thought, tool, input, observation))
                        }
                        Some(Err(err))
                            if err.is_timeout()
                                && self.options.tool_timeout_policy == ToolTimeoutPolicy::Abort =>
                        {
                            tracing::warn!(tool = %tool, error = %err, "Tool timed out, aborting run");
                            recorder.record_step(AgentStep::tool_call(thought, tool, input, err.to_string()));
                            LoopState::Aborted(err.into())
                        }
                        Some(Err(err)) => {
                            tracing::warn!(tool = %tool, error = %err, "Tool failed, continuing with error observation");
                            LoopState::Observing(AgentStep::tool_call(thought, tool, input, err.to_string()))
                        }
                    }
                }

                LoopState::Observing(step) => {
                    recorder.record_step(step);
                    steps_taken += 1;
                    LoopState::Thinking
                }

                LoopState::Final { thought, answer } => {
                    recorder.record_step(AgentStep::final_step(thought));
                    let trace = recorder.finalize(answer);
                    tracing::info!(
                        steps = trace.steps.len(),
                        tool_calls = trace.tool_calls(),
                        "Research run completed"
                    );
                    return AgentRun {
                        template,
                        trace,
                        status: RunStatus::Completed,
                    };
                }

                LoopState::Aborted(err) => {
                    tracing::warn!(error = %err, steps = recorder.len(), "Research run aborted");
                    return AgentRun {
                        template,
                        trace: recorder.export(),
                        status: RunStatus::Aborted(err),
                    };
                }
            };
        }
    }

    /// One model call with timeout, bounded retry, and cancellation.
    async fn complete(&self, prompt: String, cancel: &CancellationToken) -> Result<String, AgentError> {
        let request = CompletionRequest::new(prompt, self.options.model.clone())
            .with_temperature(self.options.temperature)
            .with_stop([OBSERVATION_STOP]);
        let request = match self.options.max_tokens {
            Some(max_tokens) => request.with_max_tokens(max_tokens),
            None => request,
        };

        let attempts = self.options.model_retries + 1;
        let mut last_error = ModelError::Timeout(self.options.model_timeout);

        for attempt in 1..=attempts {
            let call = tokio::time::timeout(self.options.model_timeout, self.provider.complete(&request));
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AgentError::Cancelled),
                outcome = call => outcome,
            };

            match outcome {
                Ok(Ok(completion)) => {
                    tracing::debug!(attempt, completion_len = completion.len(), "Model responded");
                    return Ok(completion);
                }
                Ok(Err(err)) => last_error = err,
                Err(_) => last_error = ModelError::Timeout(self.options.model_timeout),
            }

            if attempt < attempts {
                tracing::warn!(attempt, error = %last_error, "Model call failed, retrying");
            }
        }

        Err(match last_error {
            ModelError::Timeout(timeout) => AgentError::ModelTimeout { attempts, timeout },
            ModelError::Unavailable { provider, message } => AgentError::ModelUnavailable {
                attempts,
                message: format!("[{provider}] {message}"),
            },
        })
    }
}
