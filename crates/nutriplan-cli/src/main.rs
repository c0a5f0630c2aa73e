mod config;
mod plan_cmds;
mod profile_cmds;
mod report_cmd;

use clap::{Parser, Subcommand};
use tracing::debug;

use nutriplan_core::generator::{AgentQueryGenerator, HttpPlanGenerator, PlanGenerator};
use nutriplan_core::session::PlanSession;
use nutriplan_core::store::PgStore;
use nutriplan_db::pool;

use config::{GeneratorMode, NutriplanConfig, Overrides};

#[derive(Parser)]
#[command(name = "nutriplan", about = "Progressive multi-week nutrition plans")]
struct Cli {
    /// Database URL (overrides NUTRIPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Plan generator base URL (overrides NUTRIPLAN_GENERATOR_URL env var)
    #[arg(long, global = true)]
    generator_url: Option<String>,

    /// User id (overrides NUTRIPLAN_USER env var; stored by `init`)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a nutriplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/nutriplan")]
        db_url: String,
        /// Plan generator base URL
        #[arg(long, default_value = config::DEFAULT_GENERATOR_URL)]
        generator: String,
        /// Which generator endpoint to use
        #[arg(long, value_enum, default_value_t = GeneratorMode::Structured)]
        mode: GeneratorMode,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the nutriplan database (requires config file or env vars)
    DbInit,
    /// Profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Compute plan length for a weight goal (no database required)
    Tenure {
        /// cut, bulk or maintain
        #[arg(long)]
        goal: String,
        /// Current weight in kg
        #[arg(long)]
        weight: f64,
        /// Target weight in kg (ignored for maintain)
        #[arg(long)]
        target: Option<f64>,
        /// conservative, balanced or aggressive
        #[arg(long, default_value = "balanced")]
        intensity: String,
    },
    /// Generate the next batch of weeks
    Generate,
    /// Append weeks from a free-text plan file
    Import {
        /// Path to the plan text
        file: String,
    },
    /// List stored weeks grouped by month
    Weeks,
    /// Show the cumulative summary over all stored weeks
    Summary,
    /// Compile the report for one week
    Report {
        /// Week number
        week: i32,
        /// Append the cumulative summary
        #[arg(long)]
        cumulative: bool,
        /// Write the report into this directory instead of printing it
        #[arg(long)]
        output: Option<String>,
    },
    /// Discard all stored weeks, the continuation state and the summary
    Reset {
        /// Confirm discarding the history
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the stored profile
    Show,
    /// Create or update the profile (unset flags keep their stored value)
    Set(profile_cmds::ProfileArgs),
}

/// Execute the `nutriplan init` command: write config file.
fn cmd_init(
    db_url: &str,
    generator_url: &str,
    mode: GeneratorMode,
    user_id: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        generator: config::GeneratorSection {
            url: generator_url.to_string(),
            mode,
            timeout_secs: config::DEFAULT_TIMEOUT_SECS,
        },
        user: user_id.map(|id| config::UserSection { id }),
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  generator.url = {generator_url}");
    if let Some(user) = &cfg.user {
        println!("  user.id = {}", user.id);
    }
    println!();
    println!("Next: run `nutriplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `nutriplan db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &NutriplanConfig) -> anyhow::Result<()> {
    println!("Initializing nutriplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("nutriplan db-init complete.");
    Ok(())
}

pub type CliSession = PlanSession<Box<dyn PlanGenerator>, PgStore>;

fn build_generator(resolved: &NutriplanConfig) -> anyhow::Result<Box<dyn PlanGenerator>> {
    let settings = &resolved.generator;
    let generator: Box<dyn PlanGenerator> = match settings.mode {
        GeneratorMode::Structured => Box::new(HttpPlanGenerator::new(
            settings.url.as_str(),
            settings.timeout,
        )?),
        GeneratorMode::Agent => Box::new(AgentQueryGenerator::new(
            settings.url.as_str(),
            settings.timeout,
        )?),
    };
    debug!(mode = ?settings.mode, url = %settings.url, "plan generator configured");
    Ok(generator)
}

/// Connect, open the user's session, run `f`, then close the pool.
async fn with_session<F, Fut>(resolved: &NutriplanConfig, f: F) -> anyhow::Result<()>
where
    F: FnOnce(CliSession) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let user_id = resolved.user_id()?;
    let generator = build_generator(resolved)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = match PlanSession::open(user_id, generator, PgStore::new(db_pool.clone())).await {
        Ok(session) => f(session).await,
        Err(e) => Err(e.into()),
    };
    db_pool.close().await;
    result
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
    let overrides = Overrides {
        database_url: cli.database_url.as_deref(),
        generator_url: cli.generator_url.as_deref(),
        user: cli.user.as_deref(),
    };

    match cli.command {
        Commands::Init {
            db_url,
            generator,
            mode,
            force,
        } => {
            cmd_init(&db_url, &generator, mode, cli.user.clone(), force)?;
        }
        Commands::DbInit => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            cmd_db_init(&resolved).await?;
        }
        Commands::Tenure {
            goal,
            weight,
            target,
            intensity,
        } => {
            profile_cmds::run_tenure(&goal, weight, target, &intensity)?;
        }
        Commands::Profile { command } => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                profile_cmds::run_profile_command(command, &session).await
            })
            .await?;
        }
        Commands::Generate => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                plan_cmds::run_generate(&session).await
            })
            .await?;
        }
        Commands::Import { file } => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                plan_cmds::run_import(&session, &file).await
            })
            .await?;
        }
        Commands::Weeks => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                plan_cmds::run_weeks(&session).await
            })
            .await?;
        }
        Commands::Summary => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                plan_cmds::run_summary(&session).await
            })
            .await?;
        }
        Commands::Report {
            week,
            cumulative,
            output,
        } => {
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                report_cmd::run_report(&session, week, cumulative, output.as_deref()).await
            })
            .await?;
        }
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("reset discards every stored week; pass --yes to confirm");
            }
            let resolved = NutriplanConfig::resolve(&overrides)?;
            with_session(&resolved, |session| async move {
                plan_cmds::run_reset(&session).await
            })
            .await?;
        }
    }

    Ok(())
}
