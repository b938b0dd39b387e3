//! Concurrent callers sharing one ledger through `Arc`.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use cardbook_core::{verify_chain, Auditor, Ledger, LedgerError, ParticipantId, PrincipalId};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const CALLS_PER_THREAD: u64 = 250;

#[test]
fn concurrent_increments_are_never_lost() {
    let owner = PrincipalId::new_from_entropy([1u8; 32]);
    let p = ParticipantId::new_from_entropy([2u8; 32]);
    let ledger = Arc::new(Ledger::new(owner));
    ledger.register_participant(owner, p).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..CALLS_PER_THREAD {
                    if i % 2 == 0 {
                        ledger.issue_caution(owner, p).unwrap();
                    } else {
                        ledger.issue_dismissal(owner, p).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let per_kind = (THREADS as u64 / 2) * CALLS_PER_THREAD;
    assert_eq!(ledger.get_record(p), Ok((per_kind, per_kind)));

    // Journal order is a valid serialization of the concurrent calls.
    let entries = ledger.journal_entries();
    assert_eq!(entries.len() as u64, 1 + 2 * per_kind);
    verify_chain(owner, &entries).unwrap();
    let report = Auditor::replay(owner, &entries).unwrap();
    assert_eq!(
        report.record(p).map(|record| record.counts()),
        Some((per_kind, per_kind))
    );
}

#[test]
fn racing_registrations_accept_exactly_one() {
    let owner = PrincipalId::new_from_entropy([1u8; 32]);
    let p = ParticipantId::new_from_entropy([3u8; 32]);
    let ledger = Arc::new(Ledger::new(owner));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.register_participant(owner, p))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| *err == LedgerError::already_registered(p)));
    assert_eq!(ledger.journal_len(), 1);
}
