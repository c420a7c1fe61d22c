#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scholar_agent::{persist_exchange, ResearchAssistant, ResearchRequest};
use scholar_common::logging::init_logging_with_exclusions;
use scholar_common::{Config, Validate};
use scholar_memory::{ConversationStore, Role, SqliteConversationStore, StoredTurn};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

mod report;

/// `scholar` - academic research assistant in your terminal.
#[derive(Parser, Debug)]
#[command(name = "scholar")]
#[command(version = "0.1.0")]
#[command(about = "Academic research assistant driven by a ReAct agent loop.", long_about = None)]
struct Cli {
    /// Config file, or a directory holding config.json and secrets.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Conversation history database (overrides memory.path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a topic, or follow up on the conversation so far
    Ask {
        /// The research question
        query: String,

        /// Treat the query as a follow-up to the stored conversation
        #[arg(long)]
        follow_up: bool,

        /// Print the run as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List stored conversation turns
    History {
        /// Only show the most recent N turns
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print one stored answer as a Markdown report
    Show {
        /// Turn id, as listed by `scholar history`
        id: i64,
    },

    /// Create the conversation history database
    #[command(name = "init-db")]
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.db.as_deref())?;
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    match cli.command {
        Commands::Ask {
            query,
            follow_up,
            json,
        } => ask(&config, &query, follow_up, json).await,
        Commands::History { limit } => history(&config, limit).await,
        Commands::Show { id } => show(&config, id).await,
        Commands::InitDb => {
            let store = open_store(&config)?;
            println!("History database ready at {}", store.path().display());
            Ok(())
        }
    }
}

/// Defaults, then the config file(s), then environment, then CLI flags.
fn load_config(path: Option<&Path>, db: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) if path.is_dir() => Config::load_dir(path)?,
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(db) = db {
        config.memory.path = Some(db.display().to_string());
    }
    Ok(config)
}

fn open_store(config: &Config) -> Result<SqliteConversationStore> {
    SqliteConversationStore::new(config.memory.db_path())
}

/// The query as it is researched, reported, and stored.
fn normalize_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Query must not be empty");
    }
    Ok(query)
}

async fn ask(config: &Config, query: &str, follow_up: bool, json: bool) -> Result<()> {
    let query = normalize_query(query)?;
    config.validate().context("Invalid configuration")?;
    config
        .require_credentials()
        .context("Set GROQ_API_KEY and TAVILY_API_KEY, or add them to secrets.json")?;

    let store = open_store(config)?;
    let history = store.recent(config.agent.context_window_turns).await?;
    let assistant = ResearchAssistant::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling research run");
            on_interrupt.cancel();
        }
    });

    let request = ResearchRequest::new(query)
        .with_history(history)
        .follow_up(follow_up);
    let run = assistant.research(request, &cancel).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report::RunReport::new(query, &run))?);
    } else {
        println!("{}", report::render_run(&run));
    }

    if let Some((user_id, assistant_id)) = persist_exchange(&store, query, &run).await? {
        tracing::info!(user_id, assistant_id, "Exchange saved to history");
    }

    match run.abort_reason() {
        Some(reason) => bail!("Research run aborted: {reason}"),
        None => Ok(()),
    }
}

async fn history(config: &Config, limit: Option<usize>) -> Result<()> {
    let store = open_store(config)?;
    let mut turns = store.list_all().await?;
    if let Some(limit) = limit {
        let skip = turns.len().saturating_sub(limit);
        turns.drain(..skip);
    }

    if turns.is_empty() {
        println!("No conversation history yet.");
    } else {
        println!("{}", report::render_history(&turns));
    }
    Ok(())
}

async fn show(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config)?;
    print!("{}", report::render_markdown(&find_report(&store, id).await?));
    Ok(())
}

/// Only assistant answers are reports.
async fn find_report(store: &dyn ConversationStore, id: i64) -> Result<StoredTurn> {
    match store.get(id).await? {
        Some(turn) if turn.role == Role::Assistant => Ok(turn),
        _ => bail!("Report not found: no stored answer with id {id}"),
    }
}
