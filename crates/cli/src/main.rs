//! Sky Deck CLI - Data seeding and housekeeping tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the house menu
//! skydeck menu seed
//!
//! # Seed sample contact info and menu items
//! skydeck seed sample
//!
//! # List published news
//! skydeck news list --status published
//!
//! # Free a publication slot
//! skydeck news archive-oldest
//!
//! # Show how an identity would be classified
//! skydeck role resolve <uid> --email owner@lagusancoffee.com
//!
//! # Provision an allow-listed admin
//! skydeck admin create -e owner@lagusancoffee.com
//! ```
//!
//! # Commands
//!
//! - `menu` - Seed or list the menu
//! - `seed sample` - Seed sample contact info and menu items
//! - `news` - List news, archive the oldest published item
//! - `role resolve` - Resolve an identity's role
//! - `admin create` - Register an admin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use skydeck_backend::AppState;
use skydeck_backend::config::SkydeckConfig;
use skydeck_core::NewsStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "skydeck")]
#[command(author, version, about = "Sky Deck CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
    /// Seed sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage news updates
    News {
        #[command(subcommand)]
        action: NewsAction,
    },
    /// Inspect identity roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Add the house menu items
    Seed,
    /// List menu items by category
    List,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Add sample contact info and menu items
    Sample,
}

#[derive(Subcommand)]
enum NewsAction {
    /// List news updates, newest first
    List {
        /// Only show this status (`draft`, `published`, `archived`)
        #[arg(short, long)]
        status: Option<NewsStatus>,
    },
    /// Archive the oldest published news update
    ArchiveOldest,
}

#[derive(Subcommand)]
enum RoleAction {
    /// Resolve the role of an identity
    Resolve {
        /// Identity provider uid
        uid: String,

        /// Email, consulted against the admin allow-list
        #[arg(short, long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Register an admin account (email must be allow-listed)
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long, env = "SKYDECK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SkydeckConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "skydeck_backend=info,skydeck_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match SkydeckConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let result: Result<(), commands::CommandError> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &SkydeckConfig) -> Result<(), commands::CommandError> {
    let state = AppState::from_config(config)?;

    match cli.command {
        Commands::Menu { action } => match action {
            MenuAction::Seed => commands::menu::seed(&state).await?,
            MenuAction::List => commands::menu::list(&state).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Sample => commands::seed::sample(&state).await?,
        },
        Commands::News { action } => match action {
            NewsAction::List { status } => commands::news::list(&state, status).await?,
            NewsAction::ArchiveOldest => commands::news::archive_oldest(&state).await?,
        },
        Commands::Role { action } => match action {
            RoleAction::Resolve { uid, email } => {
                commands::role::resolve(&state, &uid, email.as_deref()).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create { email, password } => {
                commands::admin::create(&state, &email, password).await?;
            }
        },
    }
    Ok(())
}
