mod config;
mod display;
mod plan_cmds;
mod serve_cmd;
mod subject_cmds;
mod user_cmds;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use studyplan_core::store::PgStore;
use studyplan_db::config::DbConfig;
use studyplan_db::pool;

use config::AppConfig;
use serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "studyplan", about = "AI study planner for students")]
struct Cli {
    /// Database URL (overrides STUDYPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a studyplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the studyplan database (requires config file or env vars)
    DbInit,
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// User management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Subject management for one user
    Subject {
        /// Email of the user whose subjects to manage
        #[arg(long)]
        user: String,
        #[command(subcommand)]
        command: SubjectCommands,
    },
    /// Study plan generation and rendering
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Add {
        /// Email address (unique)
        email: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List users with their roles
    List,
    /// Grant the admin role
    Promote { email: String },
    /// Revoke the admin role
    Demote { email: String },
    /// Print an API bearer token for a user
    Token { email: String },
}

#[derive(Subcommand)]
pub enum SubjectCommands {
    /// Add a subject
    Add {
        /// Subject name
        name: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: String,
        /// Priority: high, medium, or low
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List subjects, nearest deadline first
    List,
    /// Delete a subject
    Delete {
        /// Subject ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a study plan from a user's stored subjects
    Generate {
        /// Email of the user
        #[arg(long)]
        user: String,
        /// Print the prompt without calling the model
        #[arg(long)]
        dry_run: bool,
        /// Print the model's markdown as-is
        #[arg(long)]
        raw: bool,
    },
    /// Render plan markdown from a file ("-" for stdin)
    Render {
        file: String,
        /// Print rendered blocks as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute the `studyplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
        },
        ai: config::AiSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.token_secret = {}...{}", &token_secret[..8], &token_secret[56..]);
    println!();
    println!("Set STUDYPLAN_AI_API_KEY in the environment to enable plan generation.");
    println!("Next: run `studyplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `studyplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = AppConfig::resolve(cli_db_url)?;

    println!("Initializing studyplan database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database {}", resolved.db_config.database_name().unwrap_or_default());
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("studyplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let tokens = resolved.require_token_config()?.clone();
            let planner = resolved.planner()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = Arc::new(PgStore::new(db_pool.clone()));
            let state = AppState {
                planner,
                subjects: store.clone(),
                access: store,
                tokens,
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::User { command } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = user_cmds::run_user_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Subject { user, command } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = subject_cmds::run_subject_command(command, &user, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan {
            command:
                PlanCommands::Generate {
                    user,
                    dry_run,
                    raw,
                },
        } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let planner = resolved.planner()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::cmd_generate(&db_pool, &planner, &user, dry_run, raw).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan {
            command: PlanCommands::Render { file, json },
        } => {
            plan_cmds::cmd_render(&file, json)?;
        }
    }

    Ok(())
}
