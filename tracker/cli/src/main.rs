//! Tracker - Command-Line Task Tracker
//!
//! A thin surface over `tracker-core`: every subcommand drives one of the
//! core controllers, waits for it to settle, and prints the result.
//!
//! # Usage
//!
//! ```bash
//! # Sign in against the configured backend
//! tracker sign-in me@example.com hunter22
//!
//! # Add and list tasks
//! tracker add "Buy milk" --priority high --due 2025-06-01
//! tracker list --active
//!
//! # Bulk delete
//! tracker delete 3f2a... 9c41...
//!
//! # Try it without a backend (nothing is kept between runs)
//! tracker --offline add "Buy milk"
//!
//! # Verbose logging
//! RUST_LOG=debug tracker list
//! ```

mod commands;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tracker_core::config::{load_config_from_path, ConfigOverrides};
use tracker_core::{
    default_config_path, FilePreferenceStore, InMemoryGateway, MemoryPreferenceStore,
    SupabaseClient, TaskPriority, TrackerConfig,
};

/// Tracker - personal tasks from the command line
#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "TRACKER_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Use an in-process backend instead of the configured one
    #[arg(long, global = true)]
    offline: bool,

    /// Backend project URL (overrides config and environment)
    #[arg(long, value_name = "URL", global = true)]
    url: Option<String>,

    /// Backend anon key (overrides config and environment)
    #[arg(long, value_name = "KEY", global = true)]
    key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "TRACKER_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    SignUp {
        /// Email address
        email: String,
        /// Password (at least 6 characters)
        password: String,
    },

    /// Sign in to an existing account
    SignIn {
        /// Email address
        email: String,
        /// Password
        password: String,
    },

    /// End the current session
    SignOut,

    /// Show the signed-in user
    Whoami,

    /// List tasks
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "active")]
        completed: bool,
        /// Only tasks still to do
        #[arg(long)]
        active: bool,
    },

    /// Add a task
    Add {
        /// Title
        title: String,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: TaskPriority,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE", value_parser = parse_due_date)]
        due: Option<String>,
    },

    /// Change fields of a task
    Update {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New priority (low, medium, high)
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE", value_parser = parse_due_date)]
        due: Option<String>,
    },

    /// Mark a task completed
    Done {
        /// Task id
        id: String,
        /// Mark it not completed instead
        #[arg(long)]
        undo: bool,
    },

    /// Delete one or more tasks
    Delete {
        /// Task ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show or change the theme preference
    Theme {
        /// New setting; omit to show the current one
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },
}

/// Theme setting accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ThemeMode {
    /// Always dark
    Dark,
    /// Always light
    Light,
    /// Follow the platform
    System,
}

fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(s).ok_or_else(|| format!("unknown priority '{s}' (expected low, medium or high)"))
}

fn parse_due_date(s: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("invalid date '{s}': {e}"))
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so they never mix with command output.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("tracker_cli={level},tracker_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(args: &Args) -> Result<TrackerConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path)
        .await
        .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(url) = &args.url {
        overrides = overrides.with_url(url.clone());
    }
    if let Some(key) = &args.key {
        overrides = overrides.with_anon_key(key.clone());
    }
    overrides.apply(&mut config);

    debug!(source = %config.source(), "Configuration resolved");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Tracker starting");
    let config = load_config(&args).await?;

    // Theme commands only touch local preferences
    if let Command::Theme { mode } = args.command {
        return match &config.preferences_path {
            Some(path) => {
                let store = FilePreferenceStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open preferences at {}", path.display()))?;
                commands::theme(Arc::new(store), mode).await
            }
            None => commands::theme(Arc::new(MemoryPreferenceStore::new()), mode).await,
        };
    }

    if args.offline {
        info!("Using the in-process backend");
        let gateway = Arc::new(InMemoryGateway::for_tasks(&config.tasks_table));
        commands::sign_in_offline(&gateway).await?;
        return commands::run(gateway, &config, args.command).await;
    }

    let supabase = config
        .supabase()
        .context("No backend configured (or pass --offline)")?;
    let client = SupabaseClient::new(&supabase).context("Failed to create backend client")?;
    info!(url = client.base_url(), "Using the Supabase backend");
    commands::run(Arc::new(client), &config, args.command).await
}
