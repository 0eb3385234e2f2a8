//! User management subcommands.

use crate::db::Database;
use crate::format::{OutputFormat, format_user_line, to_json};
use crate::types::NewUser;
use anyhow::{Result, bail};
use clap::{Args, Subcommand};

/// Arguments for the users subcommand.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Register a user
    Add {
        /// Email address (unique)
        #[arg(long)]
        email: String,

        /// Chat-platform user id (unique)
        #[arg(long)]
        user_id: String,

        /// Conversation id used to address replies
        #[arg(long)]
        chat_id: String,

        /// Chat-platform handle
        #[arg(long)]
        user_name: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// List registered users
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Remove a user; their tasks become unassigned
    Remove {
        /// User row id
        id: i64,
    },
}

/// Execute a users subcommand, returning the text to print.
pub fn execute_users(db: &Database, args: UsersArgs) -> Result<String> {
    match args.command {
        UsersCommand::Add {
            email,
            user_id,
            chat_id,
            user_name,
            first_name,
            last_name,
        } => {
            let user = db.create_user(NewUser {
                email,
                user_id,
                chat_id,
                user_name,
                first_name,
                last_name,
            })?;
            Ok(format!("Registered {}", format_user_line(&user)))
        }
        UsersCommand::List { format } => {
            let users = db.list_users()?;
            match format {
                OutputFormat::Json => to_json(&users),
                OutputFormat::Text if users.is_empty() => Ok("No users registered.".to_string()),
                OutputFormat::Text => Ok(users
                    .iter()
                    .map(format_user_line)
                    .collect::<Vec<_>>()
                    .join("\n")),
            }
        }
        UsersCommand::Remove { id } => {
            let user = match db.get_user(id)? {
                Some(user) => user,
                None => bail!("User {} not found", id),
            };
            let detached = db.list_tasks_for_user(id)?.len();
            db.delete_user(id)?;
            Ok(format!(
                "Removed {} ({} task(s) unassigned)",
                format_user_line(&user),
                detached
            ))
        }
    }
}
