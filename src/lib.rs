//! Natural-language task manager library.
//!
//! Spanish requests are resolved into typed [`intent::Intent`]s, executed
//! transactionally against SQLite by [`executor::Executor`], and answered
//! through the [`agent::Agent`] façade.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod format;
pub mod intent;
pub mod types;
