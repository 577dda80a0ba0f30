mod config;
mod registry;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use fkseed_core::{Error as CoreError, RuleSpec, RuleStore, SeedPlan, redact_connection_string};
use fkseed_generate::{SeedEngine, SeedError, SeedOptions};
use fkseed_postgres::{PostgresCatalog, PostgresOptions, PostgresWriter};
use registry::{
    RunContext, RunOptions, init_console_logging, init_run_logging, start_run, write_report,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "fkseed", version, about = "Seed a table and its foreign key ancestors")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one row into every target table and each table it depends on.
    Seed(SeedArgs),
    /// Print the dependency graph and migrated rules without inserting.
    Graph(GraphArgs),
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// Database connection string (flag form); falls back to DATABASE_URL.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Database connection string (positional form).
    #[arg(value_name = "CONNECTION_STRING")]
    conn_pos: Option<String>,
    /// Schema holding the target tables.
    #[arg(long, default_value = "public")]
    schema: String,
    /// Maximum pooled connections.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Target table; repeat for several.
    #[arg(long = "table", value_name = "TABLE")]
    tables: Vec<String>,
    /// Literal override in the form table.column=value; repeat for several.
    #[arg(long = "rule", value_name = "TABLE.COLUMN=VALUE")]
    rules: Vec<RuleSpec>,
    /// TOML seed file with targets, rules and seed.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[command(flatten)]
    conn: ConnArgs,
    #[command(flatten)]
    plan: PlanArgs,
    /// Seed for deterministic values.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[command(flatten)]
    conn: ConnArgs,
    #[command(flatten)]
    plan: PlanArgs,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Seed(args) => run_seed(args).await,
        Command::Graph(args) => run_graph(args).await,
    }
}

async fn run_seed(args: SeedArgs) -> Result<(), CliError> {
    let SeedArgs {
        conn: conn_args,
        plan: plan_args,
        seed,
        run_dir,
    } = args;

    let conn = connection_string(conn_args.conn.clone(), conn_args.conn_pos.clone())?;
    let engine = detect_engine(&conn)?;
    let plan = config::resolve_plan(
        plan_args.config.as_deref(),
        plan_args.tables,
        plan_args.rules,
        seed,
    )?;
    let rules = RuleStore::from_rules(plan.rules()?);

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        engine: engine.to_string(),
        run_dir,
        options: RunOptions {
            targets: plan.targets.clone(),
            rules: plan.rules.clone(),
            seed: plan.seed,
            schema: conn_args.schema.clone(),
            max_connections: conn_args.max_connections,
            config_file: plan_args.config,
        },
        connection: redact_connection_string(&conn),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, engine = %engine);

    let timer = Instant::now();
    let pool = connect(&conn, conn_args.max_connections).await?;
    let options = PostgresOptions {
        schema: conn_args.schema,
    };
    let catalog = PostgresCatalog::new(pool.clone(), options.clone());
    let writer = PostgresWriter::new(pool, options);

    let seed_engine = SeedEngine::new(SeedOptions {
        run_id: Some(run_id),
        seed: plan.seed,
        now: None,
    });
    let report = match seed_engine.run(&catalog, &writer, &plan.targets, rules).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", error = %err);
            return Err(err.into());
        }
    };

    write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);

    println!(
        "seeded {} tables ({}) into {}",
        report.insertion_order.len(),
        report.insertion_order.join(", "),
        run_paths.root.display()
    );
    Ok(())
}

async fn run_graph(args: GraphArgs) -> Result<(), CliError> {
    let GraphArgs {
        conn: conn_args,
        plan: plan_args,
    } = args;

    init_console_logging()?;

    let conn = connection_string(conn_args.conn, conn_args.conn_pos)?;
    detect_engine(&conn)?;
    let plan: SeedPlan = config::resolve_plan(
        plan_args.config.as_deref(),
        plan_args.tables,
        plan_args.rules,
        None,
    )?;
    let rules = RuleStore::from_rules(plan.rules()?);

    let pool = connect(&conn, conn_args.max_connections).await?;
    let catalog = PostgresCatalog::new(
        pool,
        PostgresOptions {
            schema: conn_args.schema,
        },
    );

    let discovery = SeedEngine::default()
        .plan(&catalog, &plan.targets, rules)
        .await?;

    let output = serde_json::json!({
        "targets": plan.targets,
        "graph": discovery.graph,
        "rules": discovery.rules,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn connect(conn: &str, max_connections: u32) -> Result<PgPool, CliError> {
    if max_connections == 0 {
        return Err(CliError::InvalidConfig(
            "--max-connections must be at least 1".to_string(),
        ));
    }
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(conn)
        .await?;
    Ok(pool)
}

fn connection_string(conn: Option<String>, conn_pos: Option<String>) -> Result<String, CliError> {
    match (conn, conn_pos) {
        (Some(value), None) | (None, Some(value)) => Ok(value),
        (Some(_), Some(_)) => Err(CliError::InvalidConfig(
            "use either --conn or positional connection string".to_string(),
        )),
        (None, None) => std::env::var("DATABASE_URL").map_err(|_| {
            CliError::InvalidConfig(
                "connection string is required (--conn, positional or DATABASE_URL)".to_string(),
            )
        }),
    }
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(
            redact_connection_string(conn).redacted,
        ))
    }
}
