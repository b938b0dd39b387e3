//! Operator tooling for a file-backed cardbook ledger.
//!
//! The binary plays the hosting environment: it supplies the caller identity,
//! keeps the journal on disk, and serializes calls by running one per process.

pub mod commands;
pub mod config;
pub mod error;
pub mod store;

pub use config::CliConfig;
pub use error::CliError;
pub use store::{JournalFile, JournalLock};
