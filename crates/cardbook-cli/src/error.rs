//! CLI error type

use cardbook_core::{AuditError, LedgerError};

/// Failures surfaced by the `cardbook` binary
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Config file missing fields, malformed, or rejected by validation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading or writing a file failed
    #[error("File system error: {0}")]
    FileSystem(String),

    /// A journal line or config value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another writer holds the journal lock
    #[error("Journal is locked by another writer: {0} (remove it if no cardbook process is running)")]
    JournalLocked(String),

    /// Mutations need the ledger owner, and none is configured
    #[error("No ledger owner configured; run `cardbook init` or set CARDBOOK_OWNER")]
    MissingOwner,

    /// The ledger rejected the call
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The journal file failed verification
    #[error("Journal verification failed: {0}")]
    Audit(#[from] AuditError),
}
