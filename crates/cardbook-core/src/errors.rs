//! Error types for ledger operations, journal auditing and notification streams
//!
//! Every ledger precondition failure maps to exactly one [`LedgerError`]
//! variant. A failed call is all-or-nothing: no record changes, no journal
//! entry, no stream message.

use crate::hash::Hash32;
use crate::identifiers::{ParticipantId, PrincipalId};
use serde::{Deserialize, Serialize};

/// Rejection reasons for ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    /// Caller is not the ledger owner
    #[error("Unauthorized: {caller} is not the ledger owner")]
    Unauthorized {
        /// Principal that attempted the mutation
        caller: PrincipalId,
    },

    /// Participant already has a registration record
    #[error("Already registered: {participant}")]
    AlreadyRegistered {
        /// Participant targeted by the second registration
        participant: ParticipantId,
    },

    /// Participant has no registration record
    #[error("Not registered: {participant}")]
    NotRegistered {
        /// Participant targeted by the operation
        participant: ParticipantId,
    },

    /// Counter reached `u64::MAX` and cannot advance by one
    #[error("Counter overflow for {participant}")]
    CounterOverflow {
        /// Participant whose counter is saturated
        participant: ParticipantId,
    },
}

impl LedgerError {
    /// Create an unauthorized error
    pub fn unauthorized(caller: PrincipalId) -> Self {
        Self::Unauthorized { caller }
    }

    /// Create an already-registered error
    pub fn already_registered(participant: ParticipantId) -> Self {
        Self::AlreadyRegistered { participant }
    }

    /// Create a not-registered error
    pub fn not_registered(participant: ParticipantId) -> Self {
        Self::NotRegistered { participant }
    }

    /// Create a counter overflow error
    pub fn counter_overflow(participant: ParticipantId) -> Self {
        Self::CounterOverflow { participant }
    }

    /// Short machine-readable reason, used as a structured log field
    pub fn reason(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::AlreadyRegistered { .. } => "already_registered",
            LedgerError::NotRegistered { .. } => "not_registered",
            LedgerError::CounterOverflow { .. } => "counter_overflow",
        }
    }
}

/// Standard result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Integrity failures found while verifying or replaying a journal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// Entry sequence numbers are not contiguous from zero
    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap {
        /// Sequence number the next entry should carry
        expected: u64,
        /// Sequence number actually found
        found: u64,
    },

    /// First entry is not anchored to the expected owner's genesis link
    #[error("Journal was not created by {owner}")]
    OwnerMismatch {
        /// Owner the journal was checked against
        owner: PrincipalId,
    },

    /// Entry does not link to the hash of its predecessor
    #[error("Broken link at sequence {sequence}: expected prev {expected}, found {found}")]
    BrokenLink {
        /// Offending entry
        sequence: u64,
        /// Hash of the preceding entry
        expected: Hash32,
        /// `prev_hash` recorded in the entry
        found: Hash32,
    },

    /// Stored entry hash does not match its recomputed hash
    #[error("Hash mismatch at sequence {sequence}")]
    HashMismatch {
        /// Offending entry
        sequence: u64,
    },

    /// Counter notification for a participant that was never registered
    #[error("Mutation before registration of {participant} at sequence {sequence}")]
    MutationBeforeRegistration {
        /// Offending entry
        sequence: u64,
        /// Participant named by the entry
        participant: ParticipantId,
    },

    /// Second registration notification for the same participant
    #[error("Duplicate registration of {participant} at sequence {sequence}")]
    DuplicateRegistration {
        /// Offending entry
        sequence: u64,
        /// Participant named by the entry
        participant: ParticipantId,
    },

    /// Carried counter total is not exactly one more than the replayed total
    #[error(
        "Counter discontinuity for {participant} at sequence {sequence}: expected {expected}, found {found}"
    )]
    CounterDiscontinuity {
        /// Offending entry
        sequence: u64,
        /// Participant named by the entry
        participant: ParticipantId,
        /// Total derived from the preceding entries plus one
        expected: u64,
        /// Total carried by the notification
        found: u64,
    },
}

/// Failures observed by a notification stream subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Subscriber fell behind and the oldest entries were dropped
    #[error("Notification stream lagged by {0} entries")]
    Lagged(u64),

    /// Ledger was dropped and no further entries will arrive
    #[error("Notification stream closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_distinct() {
        let participant = ParticipantId::new_from_entropy([1u8; 32]);
        let caller = PrincipalId::new_from_entropy([2u8; 32]);
        let reasons = [
            LedgerError::unauthorized(caller).reason(),
            LedgerError::already_registered(participant).reason(),
            LedgerError::not_registered(participant).reason(),
            LedgerError::counter_overflow(participant).reason(),
        ];
        let unique: std::collections::BTreeSet<_> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }

    #[test]
    fn display_names_the_subject() {
        let participant = ParticipantId::new_from_entropy([3u8; 32]);
        let message = LedgerError::not_registered(participant).to_string();
        assert!(message.contains(&participant.to_string()));
    }
}
