//! Protein Pulse - track daily protein intake from the terminal.
//!
//! Works fully offline against the local store; when a remote backend is
//! configured and you are signed in, data is synced to it as well.

mod app;
mod commands;

use std::io;
use std::path::Path;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proteinpulse_core::config::Config;
use proteinpulse_core::models::{ThemePreference, UnitPreference};

use crate::app::App;

/// Log files are written to `<data dir>/logs/proteinpulse.log.<date>`
const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "proteinpulse.log";

#[derive(Parser)]
#[command(name = "proteinpulse", version, about = "Track your daily protein intake")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show storage mode, session and sync state
    Status,
    /// Sign in to the remote backend
    Signin {
        /// Account email (default: last used)
        email: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Create an account on the remote backend and sign in to it
    Signup {
        /// Account email
        email: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and return to guest mode
    Signout {
        /// Also remove the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// View or change your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage saved foods
    Foods {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log what you ate
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Per-day protein goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Push writes that could not reach the server
    Sync,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show,
    /// Change profile settings
    Set {
        /// Default daily protein target in grams
        #[arg(long)]
        target: Option<f64>,
        /// Display units: grams or ounces
        #[arg(long)]
        units: Option<UnitPreference>,
        /// Theme: light or dark
        #[arg(long)]
        theme: Option<ThemePreference>,
    },
    /// Restore default settings
    Reset,
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List saved foods
    List,
    /// Save a food for quick logging
    Add {
        /// Food name
        name: String,
        /// Default protein amount in grams
        amount: f64,
    },
    /// Remove a saved food by ID
    Rm {
        /// Saved food ID
        id: String,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Log an entry, by name and amount or from a saved food
    Add {
        /// Food name, or the name/ID of a saved food when no amount is given
        food: String,
        /// Protein in grams (default: the saved food's amount)
        amount: Option<f64>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a day's log and progress
    Show {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
    },
    /// Delete a logged entry by ID
    Rm {
        /// Entry ID
        id: String,
        /// Date the entry was logged on (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Show the target for a day
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
    },
    /// Set a target for one day
    Set {
        /// Protein target in grams
        target: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

/// Initialize the tracing subscriber: stderr plus a daily log file when a
/// log directory is available. The returned guard must be held until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn log_dir(config: &Config) -> Option<std::path::PathBuf> {
    let dir = config.data_dir().ok()?.join(LOG_DIR);
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let _guard = init_tracing(log_dir(&config).as_deref());
    info!("Protein Pulse starting");

    let mut app = App::new(config)?;
    app.restore_session().await;

    match cli.command {
        Commands::Status => commands::cmd_status(&app).await,
        Commands::Signin { email, remember } => commands::cmd_signin(&mut app, email, remember).await,
        Commands::Signup { email, remember } => commands::cmd_signup(&mut app, email, remember).await,
        Commands::Signout { forget } => commands::cmd_signout(&app, forget).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::cmd_profile_show(&app).await,
            ProfileCommands::Set { target, units, theme } => {
                commands::cmd_profile_set(&app, target, units, theme).await
            }
            ProfileCommands::Reset => commands::cmd_profile_reset(&app).await,
        },
        Commands::Foods { command } => match command {
            FoodCommands::List => commands::cmd_foods_list(&app).await,
            FoodCommands::Add { name, amount } => commands::cmd_foods_add(&app, &name, amount).await,
            FoodCommands::Rm { id } => commands::cmd_foods_rm(&app, &id).await,
        },
        Commands::Log { command } => match command {
            LogCommands::Add { food, amount, date } => {
                commands::cmd_log_add(&app, &food, amount, date).await
            }
            LogCommands::Show { date } => commands::cmd_log_show(&app, date).await,
            LogCommands::Rm { id, date } => commands::cmd_log_rm(&app, &id, date).await,
        },
        Commands::Goal { command } => match command {
            GoalCommands::Show { date } => commands::cmd_goal_show(&app, date).await,
            GoalCommands::Set { target, date } => commands::cmd_goal_set(&app, target, date).await,
        },
        Commands::Sync => commands::cmd_sync(&app).await,
    }
}
