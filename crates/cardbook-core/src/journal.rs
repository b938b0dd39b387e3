//! Hash-chained, append-only notification journal
//!
//! Each entry commits to its predecessor through `prev_hash`, so rewriting or
//! dropping any historical entry breaks every later link. The first entry
//! links to [`genesis_hash`] of the ledger owner, which pins the journal to
//! the principal that created it. The journal exposes no removal or in-place
//! update.

use crate::errors::AuditError;
use crate::hash::{hasher, Hash32};
use crate::identifiers::{ParticipantId, PrincipalId};
use crate::notification::Notification;
use serde::{Deserialize, Serialize};

/// Version byte mixed into every entry hash
pub const JOURNAL_FORMAT_VERSION: u8 = 1;

const GENESIS_DOMAIN: &[u8] = b"cardbook/genesis";

/// Back-link of the first entry in a journal owned by `owner`
pub fn genesis_hash(owner: PrincipalId) -> Hash32 {
    let mut h = hasher();
    h.update(&[JOURNAL_FORMAT_VERSION]);
    h.update(GENESIS_DOMAIN);
    h.update(&owner.to_bytes());
    h.finalize()
}

/// One accepted transition, positioned in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JournalEntry {
    /// Zero-based position in the journal
    pub sequence: u64,
    /// Hash of the previous entry, the owner's [`genesis_hash`] for the first
    pub prev_hash: Hash32,
    /// The accepted transition
    pub notification: Notification,
    /// Hash over version, sequence, back-link and notification
    pub hash: Hash32,
}

impl JournalEntry {
    /// Build an entry and compute its hash
    pub fn new(sequence: u64, prev_hash: Hash32, notification: Notification) -> Self {
        let hash = Self::compute_hash(sequence, &prev_hash, &notification);
        Self {
            sequence,
            prev_hash,
            notification,
            hash,
        }
    }

    /// Hash committed to by an entry with these contents
    pub fn compute_hash(sequence: u64, prev_hash: &Hash32, notification: &Notification) -> Hash32 {
        let mut h = hasher();
        h.update(&[JOURNAL_FORMAT_VERSION]);
        h.update(&sequence.to_le_bytes());
        h.update(prev_hash.as_bytes());
        h.update(&notification.canonical_bytes());
        h.finalize()
    }

    /// Whether the stored hash matches the contents
    pub fn is_intact(&self) -> bool {
        Self::compute_hash(self.sequence, &self.prev_hash, &self.notification) == self.hash
    }
}

/// Append-only log of accepted notifications
#[derive(Debug, Clone)]
pub struct NotificationJournal {
    anchor: Hash32,
    entries: Vec<JournalEntry>,
}

impl NotificationJournal {
    /// Create an empty journal anchored to `owner`
    pub fn new(owner: PrincipalId) -> Self {
        Self {
            anchor: genesis_hash(owner),
            entries: Vec::new(),
        }
    }

    /// Adopt entries after checking the chain against `owner`
    ///
    /// # Errors
    ///
    /// Returns the first integrity failure found by [`verify_chain`].
    pub fn from_entries(owner: PrincipalId, entries: Vec<JournalEntry>) -> Result<Self, AuditError> {
        verify_chain(owner, &entries)?;
        Ok(Self {
            anchor: genesis_hash(owner),
            entries,
        })
    }

    /// Adopt entries the caller has already replayed through an auditor
    pub(crate) fn from_verified(owner: PrincipalId, entries: Vec<JournalEntry>) -> Self {
        Self {
            anchor: genesis_hash(owner),
            entries,
        }
    }

    /// Append a notification, linking it to the current head
    pub fn append(&mut self, notification: Notification) -> &JournalEntry {
        let entry = JournalEntry::new(self.entries.len() as u64, self.head(), notification);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Back-link of the first entry
    pub fn anchor(&self) -> Hash32 {
        self.anchor
    }

    /// Hash of the latest entry, or the anchor when empty
    pub fn head(&self) -> Hash32 {
        self.entries.last().map_or(self.anchor, |entry| entry.hash)
    }

    /// All entries in append order
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries at or after `sequence`
    pub fn since(&self, sequence: u64) -> &[JournalEntry] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    /// Entries naming `participant`, in append order
    pub fn entries_for(&self, participant: ParticipantId) -> Vec<JournalEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.notification.participant() == participant)
            .cloned()
            .collect()
    }
}

/// Verify that `entries` form a chain created by `owner`: sequence
/// contiguity, back-links from the owner's genesis, and entry hashes.
///
/// Returns the head hash (the genesis link for an empty slice).
///
/// # Errors
///
/// [`AuditError::OwnerMismatch`] if the first entry is anchored elsewhere,
/// otherwise the first [`AuditError::SequenceGap`], [`AuditError::BrokenLink`]
/// or [`AuditError::HashMismatch`] encountered.
pub fn verify_chain(owner: PrincipalId, entries: &[JournalEntry]) -> Result<Hash32, AuditError> {
    let mut prev = genesis_hash(owner);
    for (expected, entry) in (0u64..).zip(entries) {
        if entry.sequence != expected {
            return Err(AuditError::SequenceGap {
                expected,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != prev {
            if expected == 0 {
                return Err(AuditError::OwnerMismatch { owner });
            }
            return Err(AuditError::BrokenLink {
                sequence: entry.sequence,
                expected: prev,
                found: entry.prev_hash,
            });
        }
        if !entry.is_intact() {
            return Err(AuditError::HashMismatch {
                sequence: entry.sequence,
            });
        }
        prev = entry.hash;
    }
    Ok(prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> PrincipalId {
        PrincipalId::new_from_entropy([0xA0; 32])
    }

    fn participant(seed: u8) -> ParticipantId {
        ParticipantId::new_from_entropy([seed; 32])
    }

    fn sample_journal() -> NotificationJournal {
        let mut journal = NotificationJournal::new(owner());
        journal.append(Notification::ParticipantRegistered {
            participant: participant(1),
        });
        journal.append(Notification::CautionIssued {
            participant: participant(1),
            total_cautions: 1,
        });
        journal.append(Notification::ParticipantRegistered {
            participant: participant(2),
        });
        journal
    }

    #[test]
    fn appends_link_to_previous_head() {
        let journal = sample_journal();
        let entries = journal.entries();
        assert_eq!(entries[0].prev_hash, genesis_hash(owner()));
        assert_eq!(entries[1].prev_hash, entries[0].hash);
        assert_eq!(entries[2].prev_hash, entries[1].hash);
        assert_eq!(journal.head(), entries[2].hash);
        assert_eq!(verify_chain(owner(), entries), Ok(journal.head()));
    }

    #[test]
    fn empty_journal_heads_at_owner_genesis() {
        let journal = NotificationJournal::new(owner());
        assert!(journal.is_empty());
        assert_eq!(journal.head(), genesis_hash(owner()));
        assert_eq!(journal.anchor(), genesis_hash(owner()));
        assert_eq!(verify_chain(owner(), &[]), Ok(genesis_hash(owner())));
    }

    #[test]
    fn genesis_differs_per_owner() {
        let other = PrincipalId::new_from_entropy([0xB0; 32]);
        assert_ne!(genesis_hash(owner()), genesis_hash(other));
    }

    #[test]
    fn chain_checked_against_another_owner_is_rejected() {
        let other = PrincipalId::new_from_entropy([0xB0; 32]);
        let entries = sample_journal().entries().to_vec();
        assert_eq!(
            verify_chain(other, &entries),
            Err(AuditError::OwnerMismatch { owner: other })
        );
        assert!(NotificationJournal::from_entries(other, entries).is_err());
    }

    #[test]
    fn tampered_payload_is_detected() {
        let mut entries = sample_journal().entries().to_vec();
        entries[1].notification = Notification::CautionIssued {
            participant: participant(1),
            total_cautions: 5,
        };
        assert_eq!(
            verify_chain(owner(), &entries),
            Err(AuditError::HashMismatch { sequence: 1 })
        );
    }

    #[test]
    fn dropped_entry_is_detected() {
        let mut entries = sample_journal().entries().to_vec();
        entries.remove(1);
        assert_eq!(
            verify_chain(owner(), &entries),
            Err(AuditError::SequenceGap {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn relinked_entry_is_detected() {
        let mut entries = sample_journal().entries().to_vec();
        entries[2].prev_hash = entries[0].hash;
        assert!(matches!(
            verify_chain(owner(), &entries),
            Err(AuditError::BrokenLink { sequence: 2, .. })
        ));
    }

    #[test]
    fn filters_by_participant_and_sequence() {
        let journal = sample_journal();
        assert_eq!(journal.entries_for(participant(1)).len(), 2);
        assert_eq!(journal.entries_for(participant(3)).len(), 0);
        assert_eq!(journal.since(1).len(), 2);
        assert!(journal.since(10).is_empty());
    }
}
