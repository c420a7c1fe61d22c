//! Scholar Agent - ReAct research loop.
//!
//! Drives a language model through Thought / Action / Observation cycles:
//! - Picks the initial-research or follow-up prompt from the conversation
//! - Calls the model and parses one directive per completion
//! - Invokes tools and feeds observations back
//! - Records every step in a replayable trace
//!
//! ## Example
//!
//! ```ignore
//! use scholar_agent::{ResearchAssistant, ResearchRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let assistant = ResearchAssistant::from_config(&config)?;
//! let run = assistant
//!     .research(ResearchRequest::new("quantum error correction"), &CancellationToken::new())
//!     .await;
//! println!("{}", run.answer().unwrap_or("research could not be completed"));
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod context;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod trace;

pub use context::{ConversationContext, DEFAULT_CONTEXT_WINDOW};
pub use executor::{AgentError, AgentExecutor, AgentRun, Budget, ExecutorOptions, RunStatus};
pub use parser::{parse_completion, Directive, ParseError};
pub use prompt::{select, PromptInputs, PromptTemplate, ACADEMIC_SITES};
pub use provider::{create_provider, CompatibleProvider, CompletionRequest, ModelError, Provider};
pub use service::{persist_exchange, ResearchAssistant, ResearchRequest};
pub use trace::{AgentStep, Trace, TraceRecorder, TranscriptError};
