//! Agent façade: text in, text out.

use crate::error::{CommandError, CommandResult};
use crate::executor::{Executor, Outcome};
use crate::intent::Resolver;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix for replies when a request fails.
pub const DEFAULT_ERROR_PREFIX: &str = "Error processing natural language";

/// Resolves an utterance, executes it, and reports the result.
#[derive(Clone)]
pub struct Agent {
    resolver: Arc<dyn Resolver>,
    executor: Executor,
    error_prefix: String,
}

impl Agent {
    pub fn new(resolver: Arc<dyn Resolver>, executor: Executor) -> Self {
        Self {
            resolver,
            executor,
            error_prefix: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }

    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Resolve and execute, keeping the structured error.
    ///
    /// The schema snapshot is read before resolving and the storage lock is
    /// released while the resolver runs.
    pub async fn handle(&self, text: &str) -> CommandResult<Outcome> {
        // SQLite calls block; keep them off the async workers.
        let db = self.executor.database().clone();
        let schema = tokio::task::spawn_blocking(move || db.schema_context())
            .await
            .map_err(join_failure)??;

        let intent = self
            .resolver
            .resolve(text, &schema)
            .await
            .map_err(|e| CommandError::Translator(format!("{:#}", e)))?;
        debug!(intent = %intent, "Intent resolved");

        let executor = self.executor.clone();
        tokio::task::spawn_blocking(move || executor.execute(&intent))
            .await
            .map_err(join_failure)?
    }

    /// Resolve and execute, collapsing any failure into a reply string.
    pub async fn process(&self, text: &str) -> String {
        match self.handle(text).await {
            Ok(outcome) => outcome.message,
            Err(err) => {
                warn!(code = ?err.code(), error = %err, "Request failed");
                format!("{}: {}", self.error_prefix, err)
            }
        }
    }
}

fn join_failure(err: tokio::task::JoinError) -> CommandError {
    CommandError::Internal(format!("blocking task failed: {}", err))
}
