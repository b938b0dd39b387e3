//! External observation: live streams and offline journal audits.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use assert_matches::assert_matches;
use cardbook_core::{
    genesis_hash, AuditError, Auditor, JournalEntry, Ledger, Notification, NotificationJournal,
    ParticipantId, PrincipalId, StreamError,
};

fn owner() -> PrincipalId {
    PrincipalId::new_from_entropy([0xA0; 32])
}

fn participant(seed: u8) -> ParticipantId {
    ParticipantId::new_from_entropy([seed; 32])
}

#[tokio::test]
async fn subscribers_see_entries_in_journal_order() {
    let ledger = Ledger::new(owner());
    let mut stream = ledger.subscribe();

    ledger.register_participant(owner(), participant(1)).unwrap();
    ledger.issue_dismissal(owner(), participant(1)).unwrap();
    ledger.issue_caution(owner(), participant(1)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(stream.recv().await.unwrap());
    }
    assert_eq!(seen, ledger.journal_entries());
    assert_eq!(
        seen[1].notification,
        Notification::DismissalIssued {
            participant: participant(1),
            total_dismissals: 1
        }
    );
}

#[test]
fn rejected_calls_emit_nothing() {
    let ledger = Ledger::new(owner());
    let mut stream = ledger.subscribe();
    let stranger = PrincipalId::new_from_entropy([0x55; 32]);

    let _ = ledger.issue_caution(owner(), participant(1));
    let _ = ledger.register_participant(stranger, participant(1));
    let _ = ledger.get_record(participant(1));

    assert_eq!(stream.drain().unwrap(), Vec::<JournalEntry>::new());
}

#[test]
fn slow_subscriber_is_told_it_lagged() {
    let ledger = Ledger::with_stream_capacity(owner(), 2);
    let mut stream = ledger.subscribe();
    for seed in 0..5 {
        ledger.register_participant(owner(), participant(seed)).unwrap();
    }
    assert_eq!(stream.try_recv(), Err(StreamError::Lagged(3)));
    // Resumes with the oldest retained entry.
    assert_eq!(stream.try_recv().unwrap().map(|entry| entry.sequence), Some(3));
}

#[test]
fn dropping_the_ledger_closes_the_stream() {
    let ledger = Ledger::new(owner());
    let mut stream = ledger.subscribe();
    ledger.register_participant(owner(), participant(1)).unwrap();
    drop(ledger);

    assert_matches!(stream.try_recv(), Ok(Some(_)));
    assert_eq!(stream.try_recv(), Err(StreamError::Closed));
}

#[test]
fn live_auditor_follows_the_stream() {
    let ledger = Ledger::new(owner());
    let mut stream = ledger.subscribe();
    let mut auditor = Auditor::new(owner());

    ledger.register_participant(owner(), participant(1)).unwrap();
    ledger.issue_caution(owner(), participant(1)).unwrap();
    for entry in stream.drain().unwrap() {
        auditor.observe(&entry).unwrap();
    }
    ledger.issue_caution(owner(), participant(1)).unwrap();
    for entry in stream.drain().unwrap() {
        auditor.observe(&entry).unwrap();
    }

    let report = auditor.report();
    assert_eq!(report.head, ledger.journal_head());
    assert_eq!(
        report.record(participant(1)).map(|record| record.counts()),
        Some((2, 0))
    );
}

#[test]
fn restore_resumes_counting_and_chaining() {
    let original = Ledger::new(owner());
    original.register_participant(owner(), participant(1)).unwrap();
    original.issue_caution(owner(), participant(1)).unwrap();

    let restored = Ledger::restore(owner(), original.journal_entries()).unwrap();
    assert_eq!(restored.get_record(participant(1)), Ok((1, 0)));
    assert_eq!(restored.journal_head(), original.journal_head());

    let entry = restored.issue_caution(owner(), participant(1)).unwrap();
    assert_eq!(entry.sequence, 2);
    assert_eq!(entry.prev_hash, original.journal_head());
    assert_eq!(restored.get_record(participant(1)), Ok((2, 0)));
}

#[test]
fn restore_rejects_forged_journals() {
    // Counter entry for a participant that was never registered, correctly chained.
    let mut forged = NotificationJournal::new(owner());
    forged.append(Notification::CautionIssued {
        participant: participant(7),
        total_cautions: 1,
    });
    assert_matches!(
        Ledger::restore(owner(), forged.entries().to_vec()),
        Err(AuditError::MutationBeforeRegistration { sequence: 0, .. })
    );

    // Rewritten history: second entry re-pointed at the genesis link.
    let ledger = Ledger::new(owner());
    ledger.register_participant(owner(), participant(1)).unwrap();
    ledger.issue_dismissal(owner(), participant(1)).unwrap();
    let mut entries = ledger.journal_entries();
    entries[1].prev_hash = entries[0].prev_hash;
    assert_matches!(
        NotificationJournal::from_entries(owner(), entries),
        Err(AuditError::BrokenLink { sequence: 1, .. })
    );
}

#[test]
fn restore_under_another_owner_is_rejected() {
    let ledger = Ledger::new(owner());
    ledger.register_participant(owner(), participant(1)).unwrap();
    let entries = ledger.journal_entries();

    let intruder = PrincipalId::new_from_entropy([0xEE; 32]);
    assert_eq!(
        Ledger::restore(intruder, entries.clone()).err(),
        Some(AuditError::OwnerMismatch { owner: intruder })
    );

    // The rightful owner can still resume.
    let restored = Ledger::restore(owner(), entries).unwrap();
    restored.issue_dismissal(owner(), participant(1)).unwrap();
    assert_eq!(restored.get_record(participant(1)), Ok((0, 1)));
}

#[test]
fn empty_journal_heads_at_the_owner_genesis() {
    let ledger = Ledger::new(owner());
    assert_eq!(ledger.journal_head(), genesis_hash(owner()));
    let entry = ledger.register_participant(owner(), participant(1)).unwrap();
    assert_eq!(entry.prev_hash, genesis_hash(owner()));
}

#[test]
fn entries_survive_json_round_trip() {
    let ledger = Ledger::new(owner());
    ledger.register_participant(owner(), participant(1)).unwrap();
    ledger.issue_dismissal(owner(), participant(1)).unwrap();

    let lines: Vec<String> = ledger
        .journal_entries()
        .iter()
        .map(|entry| serde_json::to_string(entry).unwrap())
        .collect();
    let parsed: Vec<JournalEntry> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let report = Auditor::replay(owner(), &parsed).unwrap();
    assert_eq!(report.head, ledger.journal_head());
}
