//! Participant records and the record table
//!
//! Records are created once, never removed, and their counters only move
//! forward by exactly one. Every mutation computes the new value before
//! touching the record, so a rejected call leaves the table unchanged.

use crate::errors::{LedgerError, LedgerResult};
use crate::identifiers::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-participant infraction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Accepted cautions so far
    pub caution_count: u64,
    /// Accepted dismissals so far
    pub dismissal_count: u64,
    /// Existence flag; never reset once set
    pub registered: bool,
}

impl ParticipantRecord {
    /// Fresh record for a newly registered participant
    pub fn registered() -> Self {
        Self {
            caution_count: 0,
            dismissal_count: 0,
            registered: true,
        }
    }

    /// `(caution_count, dismissal_count)`
    pub fn counts(&self) -> (u64, u64) {
        (self.caution_count, self.dismissal_count)
    }
}

/// Which counter a mutation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Caution,
    Dismissal,
}

/// Registered participants keyed by identity
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: BTreeMap<ParticipantId, ParticipantRecord>,
}

impl RecordTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt records derived by a journal replay
    pub(crate) fn from_records(records: BTreeMap<ParticipantId, ParticipantRecord>) -> Self {
        Self { records }
    }

    /// Whether `participant` has been registered
    pub fn is_registered(&self, participant: ParticipantId) -> bool {
        self.records
            .get(&participant)
            .is_some_and(|record| record.registered)
    }

    /// Look up a registered participant
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotRegistered`] if there is no registration record.
    pub fn get(&self, participant: ParticipantId) -> LedgerResult<&ParticipantRecord> {
        self.records
            .get(&participant)
            .filter(|record| record.registered)
            .ok_or_else(|| LedgerError::not_registered(participant))
    }

    /// Number of registered participants
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no participant is registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in participant order
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantRecord)> {
        self.records.iter()
    }

    /// Create a zeroed record. A second registration is rejected and never
    /// resets counters.
    pub(crate) fn register(&mut self, participant: ParticipantId) -> LedgerResult<()> {
        if self.is_registered(participant) {
            return Err(LedgerError::already_registered(participant));
        }
        self.records
            .insert(participant, ParticipantRecord::registered());
        Ok(())
    }

    /// Advance one counter by exactly one and return the new value.
    pub(crate) fn increment(
        &mut self,
        participant: ParticipantId,
        counter: Counter,
    ) -> LedgerResult<u64> {
        let record = self
            .records
            .get_mut(&participant)
            .filter(|record| record.registered)
            .ok_or_else(|| LedgerError::not_registered(participant))?;

        let slot = match counter {
            Counter::Caution => &mut record.caution_count,
            Counter::Dismissal => &mut record.dismissal_count,
        };
        let next = slot
            .checked_add(1)
            .ok_or_else(|| LedgerError::counter_overflow(participant))?;
        *slot = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(seed: u8) -> ParticipantId {
        ParticipantId::new_from_entropy([seed; 32])
    }

    #[test]
    fn register_then_increment() {
        let mut table = RecordTable::new();
        table.register(participant(1)).unwrap();
        assert_eq!(table.increment(participant(1), Counter::Caution), Ok(1));
        assert_eq!(table.increment(participant(1), Counter::Caution), Ok(2));
        assert_eq!(table.increment(participant(1), Counter::Dismissal), Ok(1));
        assert_eq!(table.get(participant(1)).unwrap().counts(), (2, 1));
    }

    #[test]
    fn second_registration_keeps_counters() {
        let mut table = RecordTable::new();
        table.register(participant(1)).unwrap();
        table.increment(participant(1), Counter::Dismissal).unwrap();
        assert_eq!(
            table.register(participant(1)),
            Err(LedgerError::already_registered(participant(1)))
        );
        assert_eq!(table.get(participant(1)).unwrap().counts(), (0, 1));
    }

    #[test]
    fn unknown_participant_is_not_registered() {
        let mut table = RecordTable::new();
        assert!(!table.is_registered(participant(9)));
        assert_eq!(
            table.increment(participant(9), Counter::Caution),
            Err(LedgerError::not_registered(participant(9)))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn overflow_is_rejected_without_wrapping() {
        let mut table = RecordTable::new();
        table.register(participant(1)).unwrap();
        table
            .records
            .get_mut(&participant(1))
            .unwrap()
            .caution_count = u64::MAX;
        assert_eq!(
            table.increment(participant(1), Counter::Caution),
            Err(LedgerError::counter_overflow(participant(1)))
        );
        assert_eq!(table.get(participant(1)).unwrap().caution_count, u64::MAX);
    }
}
