//! nl-task-manager
//!
//! Manage a shared task list by writing requests in Spanish, e.g.
//! "Pon la tarea 3 en progreso" or "Asigna la tarea 3 a Test User".

use anyhow::{Context, Result};
use clap::Parser;
use nl_task_manager::agent::Agent;
use nl_task_manager::cli::users::execute_users;
use nl_task_manager::cli::{Cli, Command};
use nl_task_manager::config::{Config, load_env_file};
use nl_task_manager::db::Database;
use nl_task_manager::error::ErrorBody;
use nl_task_manager::executor::Executor;
use nl_task_manager::format::{OutputFormat, format_task_listing, to_json};
use nl_task_manager::intent::RuleResolver;
use nl_task_manager::types::TaskStatus;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the tracing subscriber selected by `--log`.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("opening log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Read requests from stdin until EOF, answering each on stdout.
async fn run_repl(agent: &Agent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "salir" | "exit" | "quit") {
            break;
        }
        let reply = agent.process(line).await;
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    load_env_file();

    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;
    if let Some(ref url) = cli.database {
        config.database.url = url.clone();
    }

    let db = Database::open_url(&config.database.url)
        .with_context(|| format!("opening database {}", config.database.url))?;
    info!(url = %config.database.url, "Database ready");

    let executor = Executor::new(db.clone());
    let agent = Agent::new(Arc::new(RuleResolver::new()?), executor)
        .with_error_prefix(config.agent.error_prefix.clone());

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => run_repl(&agent).await?,
        Command::Ask { text, json } => {
            let text = text.join(" ");
            if json {
                let out = match agent.handle(&text).await {
                    Ok(outcome) => to_json(&outcome)?,
                    Err(err) => to_json(&ErrorBody::from(&err))?,
                };
                println!("{}", out);
            } else {
                println!("{}", agent.process(&text).await);
            }
        }
        Command::Tasks { status, format } => {
            let status = status
                .map(|s| s.parse::<TaskStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let tasks = db.list_tasks(status)?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&tasks)?),
                OutputFormat::Text => {
                    let names: HashMap<i64, String> = db
                        .list_users()?
                        .into_iter()
                        .map(|u| (u.id, u.display_name().to_string()))
                        .collect();
                    println!("{}", format_task_listing(&tasks, &names));
                }
            }
        }
        Command::Users(args) => println!("{}", execute_users(&db, args)?),
        Command::Schema => println!("{}", to_json(&db.schema_context()?)?),
    }

    Ok(())
}
