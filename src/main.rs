//! # rag-review CLI (`rrv`)
//!
//! ## Usage
//!
//! ```bash
//! rrv --config ./config/rrv.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rrv serve` | Start the HTTP API |
//! | `rrv chunk <paths>` | Show the chunks ingestion would produce |
//! | `rrv analyze "<query>" --input <paths>` | Issue list as JSON |
//! | `rrv metrics "<query>" --input <paths>` | Quality metrics as JSON |
//! | `rrv inject-bugs "<query>" --input <paths>` | Buggy code plus bug list as JSON |
//! | `rrv completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! export API_KEY=...
//! rrv analyze "database access" --input ./src
//! rrv inject-bugs "login handler" --input app.py --bug-type "SQL Injection" --num-bugs 2
//! RUST_LOG=debug rrv serve
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rag_review::commands;
use rag_review::config::{self, default_config_path};
use rag_review::server;
use rag_review_core::prompt::{BugInjectionParams, Task};

/// rag-review: retrieval-augmented code review.
///
/// Indexes code, retrieves the chunks relevant to a query, and asks an LLM
/// for an issue list, quality metrics, or injected bugs.
#[derive(Parser)]
#[command(name = "rrv", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// API key for the completion backend, overriding the configured env var.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Dry run: list documents and chunk counts without embedding.
    Chunk {
        /// Files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Find issues in the code most relevant to QUERY.
    Analyze {
        query: String,
        #[arg(long = "input", short, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },

    /// Score the code most relevant to QUERY.
    Metrics {
        query: String,
        #[arg(long = "input", short, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },

    /// Inject bugs into the code most relevant to QUERY.
    InjectBugs {
        query: String,
        #[arg(long = "input", short, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = "Security Vulnerability")]
        bug_type: String,
        /// 1 (Low) to 5 (Extreme).
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
        severity_level: u8,
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=10))]
        num_bugs: u8,
    },

    /// Print a shell completion script to stdout.
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "rrv", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_default(&cli.config)?;
    let api_key = cli.api_key.as_deref();

    match cli.command {
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Chunk { paths } => commands::run_chunk(&cfg, &paths)?,
        Commands::Analyze { query, inputs } => {
            commands::run_query(&cfg, Task::Analysis, &query, &inputs, api_key).await?
        }
        Commands::Metrics { query, inputs } => {
            commands::run_query(&cfg, Task::Metrics, &query, &inputs, api_key).await?
        }
        Commands::InjectBugs {
            query,
            inputs,
            bug_type,
            severity_level,
            num_bugs,
        } => {
            let params = BugInjectionParams {
                bug_type,
                severity_level,
                num_bugs,
            };
            commands::run_query(&cfg, Task::InjectBugs(params), &query, &inputs, api_key).await?
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
