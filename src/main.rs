//! # Daily Question CLI (`dq`)
//!
//! ## Usage
//!
//! ```bash
//! dq --config ./config/dq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dq init` | Create the SQLite database and run schema migrations |
//! | `dq post` | Generate, check, record and post one question |
//! | `dq check "<text>"` | Show the uniqueness verdict for a question |
//! | `dq duplicates` | Report similar pairs already in the history |
//! | `dq calibrate` | Score labelled sample pairs at several thresholds |
//! | `dq seed` | Insert sample questions |
//! | `dq history` | List recorded questions |
//! | `dq serve` | Start the health / trigger HTTP server |
//!
//! ## Environment
//!
//! - `OPENAI_API_KEY`: required when embedding or generation uses `openai`.
//! - `SLACK_BOT_TOKEN`: required when `chat.provider = "slack"`.
//! - `RUST_LOG`: log filter (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use daily_question::{
    calibrate, check_cmd, config, cycle, history, migrate, report, seed, server,
};

/// Daily Question: posts one team question a day, never the same one twice.
#[derive(Parser)]
#[command(
    name = "dq",
    about = "Daily Question: posts one team question a day, never the same one twice",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dq.toml")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Run one posting cycle.
    ///
    /// Generates candidates until one passes the uniqueness check (or the
    /// attempt budget is spent), records it, then posts it.
    Post {
        /// Override `generation.max_attempts`.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Check against a copy of the history and print instead of posting.
        /// Nothing is recorded.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check whether a question would be accepted.
    Check {
        /// The question text.
        text: String,
    },

    /// Report pairs of recorded questions that are semantically similar.
    ///
    /// Embeds every recorded question once and compares all pairs. Useful
    /// for tuning `similarity.threshold`.
    Duplicates {
        /// Override `similarity.threshold` for this report.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Score labelled sample pairs against candidate thresholds.
    Calibrate,

    /// Insert sample questions, skipping ones already recorded.
    Seed,

    /// List recorded questions, newest first.
    History {
        /// Maximum number of questions to list.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Start the HTTP server (`GET /health`, `POST /ask`).
    Serve,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Post {
            max_attempts,
            dry_run,
        } => {
            cycle::run_post(&cfg, max_attempts, dry_run).await?;
        }
        Commands::Check { text } => {
            check_cmd::run_check(&cfg, &text).await?;
        }
        Commands::Duplicates { threshold } => {
            report::run_duplicates(&cfg, threshold).await?;
        }
        Commands::Calibrate => {
            calibrate::run_calibrate(&cfg).await?;
        }
        Commands::Seed => {
            seed::run_seed(&cfg).await?;
        }
        Commands::History { limit } => {
            history::run_history(&cfg, limit).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
