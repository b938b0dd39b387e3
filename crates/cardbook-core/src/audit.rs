//! Independent verification of a ledger from its notifications alone
//!
//! An [`Auditor`] follows journal entries one at a time (from a file, or live
//! from a [`crate::NotificationStream`]) and re-derives every participant
//! record. It checks the hash chain and the ledger rules: registration before
//! mutation, a single registration per participant, and counters that
//! advance by exactly one.
//!
//! An auditor built with [`Auditor::new`] also checks that the journal was
//! created by the given owner. [`Auditor::anchored_at`] verifies a journal
//! from an arbitrary first back-link when the owner is not known.

use crate::errors::AuditError;
use crate::hash::Hash32;
use crate::identifiers::{ParticipantId, PrincipalId};
use crate::journal::{genesis_hash, JournalEntry};
use crate::notification::Notification;
use crate::record::ParticipantRecord;
use std::collections::BTreeMap;

/// Result of a successful replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Back-link of the first entry
    pub anchor: Hash32,
    /// Entries verified
    pub entries: u64,
    /// Hash of the last verified entry
    pub head: Hash32,
    /// Records derived from the notifications
    pub records: BTreeMap<ParticipantId, ParticipantRecord>,
}

impl AuditReport {
    /// Derived record for `participant`, if it was registered
    pub fn record(&self, participant: ParticipantId) -> Option<&ParticipantRecord> {
        self.records.get(&participant)
    }

    /// Sum of all derived caution and dismissal counters
    pub fn totals(&self) -> (u64, u64) {
        self.records.values().fold((0, 0), |(c, d), record| {
            (
                c.saturating_add(record.caution_count),
                d.saturating_add(record.dismissal_count),
            )
        })
    }
}

/// Incremental journal verifier
#[derive(Debug, Clone)]
pub struct Auditor {
    owner: Option<PrincipalId>,
    anchor: Hash32,
    next_sequence: u64,
    head: Hash32,
    records: BTreeMap<ParticipantId, ParticipantRecord>,
}

impl Auditor {
    /// Auditor for a journal created by `owner`, positioned before the first entry
    pub fn new(owner: PrincipalId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::anchored_at(genesis_hash(owner))
        }
    }

    /// Auditor expecting the first entry to link to `anchor`
    pub fn anchored_at(anchor: Hash32) -> Self {
        Self {
            owner: None,
            anchor,
            next_sequence: 0,
            head: anchor,
            records: BTreeMap::new(),
        }
    }

    /// Verify a complete journal created by `owner`.
    ///
    /// # Errors
    ///
    /// The first [`AuditError`] found, in journal order.
    /// [`AuditError::OwnerMismatch`] if the journal belongs to someone else.
    pub fn replay(owner: PrincipalId, entries: &[JournalEntry]) -> Result<AuditReport, AuditError> {
        Self::new(owner).run(entries)
    }

    /// Verify a complete journal whose first entry links to `anchor`.
    ///
    /// # Errors
    ///
    /// The first [`AuditError`] found, in journal order.
    pub fn replay_anchored(
        anchor: Hash32,
        entries: &[JournalEntry],
    ) -> Result<AuditReport, AuditError> {
        Self::anchored_at(anchor).run(entries)
    }

    fn run(mut self, entries: &[JournalEntry]) -> Result<AuditReport, AuditError> {
        for entry in entries {
            self.observe(entry)?;
        }
        tracing::debug!(
            entries = self.next_sequence,
            participants = self.records.len(),
            head = %self.head,
            "journal replay verified"
        );
        Ok(self.report())
    }

    /// Verify and apply the next entry.
    ///
    /// On error the auditor state is unchanged, so a watcher can keep the
    /// last good position.
    ///
    /// # Errors
    ///
    /// Chain failures ([`AuditError::OwnerMismatch`], [`AuditError::SequenceGap`],
    /// [`AuditError::BrokenLink`], [`AuditError::HashMismatch`]) or rule failures
    /// ([`AuditError::MutationBeforeRegistration`],
    /// [`AuditError::DuplicateRegistration`],
    /// [`AuditError::CounterDiscontinuity`]).
    pub fn observe(&mut self, entry: &JournalEntry) -> Result<(), AuditError> {
        if entry.sequence != self.next_sequence {
            return Err(AuditError::SequenceGap {
                expected: self.next_sequence,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != self.head {
            if let (0, Some(owner)) = (entry.sequence, self.owner) {
                return Err(AuditError::OwnerMismatch { owner });
            }
            return Err(AuditError::BrokenLink {
                sequence: entry.sequence,
                expected: self.head,
                found: entry.prev_hash,
            });
        }
        if !entry.is_intact() {
            return Err(AuditError::HashMismatch {
                sequence: entry.sequence,
            });
        }

        self.apply(entry.sequence, &entry.notification)?;
        self.next_sequence += 1;
        self.head = entry.hash;
        Ok(())
    }

    fn apply(&mut self, sequence: u64, notification: &Notification) -> Result<(), AuditError> {
        let participant = notification.participant();
        match notification {
            Notification::ParticipantRegistered { .. } => {
                if self.records.contains_key(&participant) {
                    return Err(AuditError::DuplicateRegistration {
                        sequence,
                        participant,
                    });
                }
                self.records
                    .insert(participant, ParticipantRecord::registered());
            }
            Notification::CautionIssued { total_cautions, .. } => {
                let record = self.registered_mut(sequence, participant)?;
                record.caution_count = next_count(
                    sequence,
                    participant,
                    record.caution_count,
                    *total_cautions,
                )?;
            }
            Notification::DismissalIssued {
                total_dismissals, ..
            } => {
                let record = self.registered_mut(sequence, participant)?;
                record.dismissal_count = next_count(
                    sequence,
                    participant,
                    record.dismissal_count,
                    *total_dismissals,
                )?;
            }
        }
        Ok(())
    }

    fn registered_mut(
        &mut self,
        sequence: u64,
        participant: ParticipantId,
    ) -> Result<&mut ParticipantRecord, AuditError> {
        self.records
            .get_mut(&participant)
            .ok_or(AuditError::MutationBeforeRegistration {
                sequence,
                participant,
            })
    }

    /// Sequence number the next entry must carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Hash of the last verified entry
    pub fn head(&self) -> Hash32 {
        self.head
    }

    /// Snapshot of what has been verified so far
    pub fn report(&self) -> AuditReport {
        AuditReport {
            anchor: self.anchor,
            entries: self.next_sequence,
            head: self.head,
            records: self.records.clone(),
        }
    }
}

fn next_count(
    sequence: u64,
    participant: ParticipantId,
    current: u64,
    carried: u64,
) -> Result<u64, AuditError> {
    let expected = current.saturating_add(1);
    if carried != expected || expected == current {
        return Err(AuditError::CounterDiscontinuity {
            sequence,
            participant,
            expected,
            found: carried,
        });
    }
    Ok(carried)
}
