//! The access-controlled caution/dismissal ledger.
//!
//! Every mutating call runs the same pipeline:
//!
//! 1. authorization: `caller == owner`, else [`LedgerError::Unauthorized`]
//! 2. existence: registration state of the participant
//! 3. record update
//! 4. journal append and stream broadcast
//!
//! The journal is anchored to the owner, so a ledger can only be restored
//! from a journal by the principal that created it.
//!
//! Steps 2-4 run inside one mutex critical section, so concurrent callers
//! observe a total order of operations and a failed call leaves records,
//! journal and subscribers untouched. Reads take the same lock.

use crate::audit::Auditor;
use crate::errors::{AuditError, LedgerError, LedgerResult};
use crate::hash::Hash32;
use crate::identifiers::{ParticipantId, PrincipalId};
use crate::journal::{JournalEntry, NotificationJournal};
use crate::notification::Notification;
use crate::record::{Counter, ParticipantRecord, RecordTable};
use crate::stream::NotificationStream;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Buffered entries per subscriber before it starts lagging
pub const DEFAULT_STREAM_CAPACITY: usize = 256;

/// Mutable state guarded by the ledger lock
#[derive(Debug)]
struct LedgerState {
    records: RecordTable,
    journal: NotificationJournal,
}

/// Owner-gated record of participant cautions and dismissals
///
/// Share across threads with `Arc<Ledger>`; all methods take `&self`.
#[derive(Debug)]
pub struct Ledger {
    /// Fixed at construction, never reassigned
    owner: PrincipalId,
    state: Mutex<LedgerState>,
    notifications: broadcast::Sender<JournalEntry>,
}

impl Ledger {
    /// Construct a ledger owned by the constructing principal
    pub fn new(owner: PrincipalId) -> Self {
        Self::with_stream_capacity(owner, DEFAULT_STREAM_CAPACITY)
    }

    /// Construct with a custom per-subscriber buffer (clamped to at least 1)
    pub fn with_stream_capacity(owner: PrincipalId, capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(capacity.max(1));
        tracing::info!(%owner, "ledger created");
        Self {
            owner,
            state: Mutex::new(LedgerState {
                records: RecordTable::new(),
                journal: NotificationJournal::new(owner),
            }),
            notifications,
        }
    }

    /// Rebuild a ledger from a previously written journal.
    ///
    /// The journal is fully replayed through an [`Auditor`] for `owner` first;
    /// records are taken from the replay, never from outside input.
    ///
    /// # Errors
    ///
    /// [`AuditError::OwnerMismatch`] if the journal was created by a different
    /// owner, or any other [`AuditError`] found while verifying it.
    pub fn restore(owner: PrincipalId, entries: Vec<JournalEntry>) -> Result<Self, AuditError> {
        let report = Auditor::replay(owner, &entries)?;
        let journal = NotificationJournal::from_verified(owner, entries);
        let ledger = Self::new(owner);
        {
            let mut state = ledger.state.lock();
            state.records = RecordTable::from_records(report.records);
            state.journal = journal;
        }
        tracing::info!(
            %owner,
            entries = report.entries,
            head = %report.head,
            "ledger restored from journal"
        );
        Ok(ledger)
    }

    /// The principal allowed to mutate this ledger
    pub fn owner(&self) -> PrincipalId {
        self.owner
    }

    /// Register a participant with both counters at zero.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] for a non-owner caller,
    /// [`LedgerError::AlreadyRegistered`] if the participant exists. Neither
    /// changes any counter.
    pub fn register_participant(
        &self,
        caller: PrincipalId,
        participant: ParticipantId,
    ) -> LedgerResult<JournalEntry> {
        const OP: &str = "register_participant";
        self.authorize(OP, caller, participant)?;

        let mut state = self.state.lock();
        state
            .records
            .register(participant)
            .map_err(|err| rejected(OP, caller, participant, err))?;
        let entry = self.commit(
            &mut state,
            Notification::ParticipantRegistered { participant },
        );
        tracing::info!(%participant, sequence = entry.sequence, "participant registered");
        Ok(entry)
    }

    /// Advance a participant's caution counter by one.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] for a non-owner caller,
    /// [`LedgerError::NotRegistered`] for an unknown participant.
    pub fn issue_caution(
        &self,
        caller: PrincipalId,
        participant: ParticipantId,
    ) -> LedgerResult<JournalEntry> {
        const OP: &str = "issue_caution";
        self.authorize(OP, caller, participant)?;

        let mut state = self.state.lock();
        let total_cautions = state
            .records
            .increment(participant, Counter::Caution)
            .map_err(|err| rejected(OP, caller, participant, err))?;
        let entry = self.commit(
            &mut state,
            Notification::CautionIssued {
                participant,
                total_cautions,
            },
        );
        tracing::info!(
            %participant,
            total_cautions,
            sequence = entry.sequence,
            "caution issued"
        );
        Ok(entry)
    }

    /// Advance a participant's dismissal counter by one.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] for a non-owner caller,
    /// [`LedgerError::NotRegistered`] for an unknown participant.
    pub fn issue_dismissal(
        &self,
        caller: PrincipalId,
        participant: ParticipantId,
    ) -> LedgerResult<JournalEntry> {
        const OP: &str = "issue_dismissal";
        self.authorize(OP, caller, participant)?;

        let mut state = self.state.lock();
        let total_dismissals = state
            .records
            .increment(participant, Counter::Dismissal)
            .map_err(|err| rejected(OP, caller, participant, err))?;
        let entry = self.commit(
            &mut state,
            Notification::DismissalIssued {
                participant,
                total_dismissals,
            },
        );
        tracing::info!(
            %participant,
            total_dismissals,
            sequence = entry.sequence,
            "dismissal issued"
        );
        Ok(entry)
    }

    /// `(caution_count, dismissal_count)` for a participant. Open to any caller.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotRegistered`] for an unknown participant.
    pub fn get_record(&self, participant: ParticipantId) -> LedgerResult<(u64, u64)> {
        let state = self.state.lock();
        let counts = state.records.get(participant)?.counts();
        tracing::debug!(%participant, cautions = counts.0, dismissals = counts.1, "record read");
        Ok(counts)
    }

    /// Whether a participant has been registered
    pub fn is_registered(&self, participant: ParticipantId) -> bool {
        self.state.lock().records.is_registered(participant)
    }

    /// Snapshot of every record, ordered by participant
    pub fn participants(&self) -> Vec<(ParticipantId, ParticipantRecord)> {
        self.state
            .lock()
            .records
            .iter()
            .map(|(id, record)| (*id, *record))
            .collect()
    }

    /// Number of accepted mutations so far
    pub fn journal_len(&self) -> usize {
        self.state.lock().journal.len()
    }

    /// Hash of the latest journal entry
    pub fn journal_head(&self) -> Hash32 {
        self.state.lock().journal.head()
    }

    /// Copy of the full journal
    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.entries().to_vec()
    }

    /// Journal entries at or after `sequence`
    pub fn journal_since(&self, sequence: u64) -> Vec<JournalEntry> {
        self.state.lock().journal.since(sequence).to_vec()
    }

    /// Journal entries naming `participant`
    pub fn entries_for(&self, participant: ParticipantId) -> Vec<JournalEntry> {
        self.state.lock().journal.entries_for(participant)
    }

    /// Subscribe to entries accepted from now on
    pub fn subscribe(&self) -> NotificationStream {
        NotificationStream::new(self.notifications.subscribe())
    }

    fn authorize(
        &self,
        op: &'static str,
        caller: PrincipalId,
        participant: ParticipantId,
    ) -> LedgerResult<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(rejected(
                op,
                caller,
                participant,
                LedgerError::unauthorized(caller),
            ))
        }
    }

    /// Append and broadcast while the caller still holds the lock.
    fn commit(&self, state: &mut LedgerState, notification: Notification) -> JournalEntry {
        let entry = state.journal.append(notification).clone();
        // No subscribers is fine.
        let _ = self.notifications.send(entry.clone());
        entry
    }
}

fn rejected(
    op: &'static str,
    caller: PrincipalId,
    participant: ParticipantId,
    err: LedgerError,
) -> LedgerError {
    tracing::warn!(op, %caller, %participant, reason = err.reason(), "ledger call rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(seed: u8) -> PrincipalId {
        PrincipalId::new_from_entropy([seed; 32])
    }

    fn participant(seed: u8) -> ParticipantId {
        ParticipantId::new_from_entropy([seed; 32])
    }

    #[test]
    fn authorization_is_checked_before_existence() {
        let ledger = Ledger::new(principal(1));
        // Unregistered target, non-owner caller: the caller check wins.
        assert_eq!(
            ledger.issue_caution(principal(2), participant(9)),
            Err(LedgerError::unauthorized(principal(2)))
        );
        ledger
            .register_participant(principal(1), participant(9))
            .unwrap();
        assert_eq!(
            ledger.register_participant(principal(2), participant(9)),
            Err(LedgerError::unauthorized(principal(2)))
        );
    }

    #[test]
    fn returned_entry_is_the_journal_tail() {
        let ledger = Ledger::new(principal(1));
        let entry = ledger
            .register_participant(principal(1), participant(1))
            .unwrap();
        assert_eq!(entry.sequence, 0);
        assert_eq!(ledger.journal_head(), entry.hash);
        assert_eq!(ledger.journal_entries(), vec![entry]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let ledger = Ledger::with_stream_capacity(principal(1), 0);
        let mut stream = ledger.subscribe();
        ledger
            .register_participant(principal(1), participant(1))
            .unwrap();
        assert!(stream.try_recv().unwrap().is_some());
    }
}
