//! CLI command definitions for nl-task-manager
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod users;

use crate::format::OutputFormat;
use clap::{Parser, Subcommand};
use users::UsersArgs;

/// Natural-language task manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database URL or path (overrides config and DATABASE_URL)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read requests line by line from stdin (default if no subcommand given)
    Repl,

    /// Process a single request, e.g. `ask Pon la tarea 3 en progreso`
    Ask {
        /// The request text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the structured outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    Tasks {
        /// Only tasks in this status (TODO, BLOCKED, IN_PROGRESS, DONE or a Spanish name)
        #[arg(short, long)]
        status: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage registered users
    Users(UsersArgs),

    /// Print the database schema as JSON
    Schema,
}
