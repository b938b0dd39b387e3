//! # Cardbook Core
//!
//! Owner-gated, append-only record of disciplinary infractions.
//!
//! A [`Ledger`] is created by a single owner principal. Only that owner may
//! register participants and issue cautions or dismissals; anyone may read a
//! participant's counters. Every accepted mutation appends exactly one
//! [`JournalEntry`] to a hash-chained [`NotificationJournal`] and is pushed to
//! live [`NotificationStream`] subscribers. Rejected calls change nothing.
//!
//! The [`Auditor`] re-derives every record from the journal alone, so an
//! external watcher never has to call back into the ledger to check it.

pub mod audit;
pub mod errors;
pub mod hash;
pub mod identifiers;
pub mod journal;
pub mod ledger;
pub mod notification;
pub mod record;
pub mod stream;

pub use audit::{AuditReport, Auditor};
pub use errors::{AuditError, LedgerError, LedgerResult, StreamError};
pub use hash::Hash32;
pub use identifiers::{ParticipantId, PrincipalId};
pub use journal::{
    genesis_hash, verify_chain, JournalEntry, NotificationJournal, JOURNAL_FORMAT_VERSION,
};
pub use ledger::{Ledger, DEFAULT_STREAM_CAPACITY};
pub use notification::{Notification, NotificationKind};
pub use record::{ParticipantRecord, RecordTable};
pub use stream::NotificationStream;
