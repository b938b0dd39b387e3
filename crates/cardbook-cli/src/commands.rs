//! Command handlers
//!
//! Each mutation takes the journal lock, replays the journal file into a
//! fresh [`Ledger`], performs exactly one call, and appends the accepted entry
//! before releasing the lock. Reads are answered from an [`Auditor`] replay of
//! the file; they check the configured owner when there is one, and otherwise
//! only the chain itself.

use crate::config::CliConfig;
use crate::error::CliError;
use crate::store::JournalFile;
use cardbook_core::{
    AuditReport, Auditor, Hash32, JournalEntry, Ledger, LedgerError, ParticipantId, PrincipalId,
};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// The three owner-gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `register_participant`
    Register,
    /// `issue_caution`
    Caution,
    /// `issue_dismissal`
    Dismiss,
}

/// Accept a UUID (optionally `participant-` prefixed) or any external handle.
pub fn parse_participant(raw: &str) -> ParticipantId {
    raw.parse()
        .unwrap_or_else(|_| ParticipantId::from_handle(raw))
}

/// Write a config naming `owner`
///
/// Without `owner`, an existing config keeps its owner and a new one gets a
/// random principal.
///
/// # Errors
///
/// [`CliError::Configuration`] if a config with a different owner already
/// exists, otherwise any save failure.
pub fn init(config_path: &Path, owner: Option<PrincipalId>) -> Result<CliConfig, CliError> {
    let mut config = CliConfig::load(config_path)?;
    let owner = match (config.owner, owner) {
        (Some(existing), Some(requested)) if existing != requested => {
            return Err(CliError::Configuration(format!(
                "{} already names owner {existing}",
                config_path.display()
            )));
        }
        (_, Some(requested)) => requested,
        (Some(existing), None) => existing,
        (None, None) => PrincipalId::from_uuid(uuid::Uuid::new_v4()),
    };
    config.owner = Some(owner);
    config.save(config_path)?;
    tracing::info!(%owner, path = %config_path.display(), "config initialized");
    Ok(config)
}

/// Run one owner-gated operation against the journal file
///
/// `caller` defaults to the configured owner.
///
/// # Errors
///
/// [`CliError::MissingOwner`], [`CliError::JournalLocked`] if another writer
/// holds the journal past the configured wait, journal load or verification
/// failures (including a journal created by a different owner), or the
/// ledger's own rejection. Nothing is appended on error.
pub fn mutate(
    config: &CliConfig,
    mutation: Mutation,
    participant: ParticipantId,
    caller: Option<PrincipalId>,
) -> Result<JournalEntry, CliError> {
    let owner = config.require_owner()?;
    let caller = caller.unwrap_or(owner);
    let file = JournalFile::new(&config.journal_path);
    let _lock = file.lock(Duration::from_millis(config.lock_wait_ms))?;
    let ledger = Ledger::restore(owner, file.load()?)?;

    let entry = match mutation {
        Mutation::Register => ledger.register_participant(caller, participant)?,
        Mutation::Caution => ledger.issue_caution(caller, participant)?,
        Mutation::Dismiss => ledger.issue_dismissal(caller, participant)?,
    };
    file.append(&entry)?;
    Ok(entry)
}

/// Verify the journal file and derive every record
///
/// # Errors
///
/// Journal load or verification failures.
pub fn audit(config: &CliConfig) -> Result<AuditReport, CliError> {
    let entries = JournalFile::new(&config.journal_path).load()?;
    replay(config, &entries)
}

fn replay(config: &CliConfig, entries: &[JournalEntry]) -> Result<AuditReport, CliError> {
    let report = match (config.owner, entries.first()) {
        (Some(owner), _) => Auditor::replay(owner, entries)?,
        (None, Some(first)) => Auditor::replay_anchored(first.prev_hash, entries)?,
        (None, None) => Auditor::anchored_at(Hash32::default()).report(),
    };
    Ok(report)
}

/// `(cautions, dismissals)` for one participant
///
/// # Errors
///
/// [`LedgerError::NotRegistered`] for an unknown participant, or audit failures.
pub fn record(config: &CliConfig, participant: ParticipantId) -> Result<(u64, u64), CliError> {
    let report = audit(config)?;
    report
        .record(participant)
        .map(|record| record.counts())
        .ok_or_else(|| LedgerError::not_registered(participant).into())
}

/// Render journal entries, optionally filtered to one participant
///
/// # Errors
///
/// Journal load or verification failures.
pub fn log(config: &CliConfig, participant: Option<ParticipantId>) -> Result<String, CliError> {
    let entries = JournalFile::new(&config.journal_path).load()?;
    replay(config, &entries)?;

    let mut out = String::new();
    for entry in entries
        .iter()
        .filter(|entry| participant.map_or(true, |p| entry.notification.participant() == p))
    {
        let _ = writeln!(out, "{}", render_entry(entry));
    }
    Ok(out)
}

/// One-line rendering of an entry
pub fn render_entry(entry: &JournalEntry) -> String {
    format!(
        "#{} {} {}",
        entry.sequence,
        entry.notification.summary(),
        entry.hash
    )
}

/// Multi-line rendering of an audit report
pub fn render_report(report: &AuditReport) -> String {
    let (cautions, dismissals) = report.totals();
    let mut out = String::new();
    let _ = writeln!(out, "entries={} head={}", report.entries, report.head);
    let _ = writeln!(
        out,
        "participants={} cautions={cautions} dismissals={dismissals}",
        report.records.len()
    );
    for (participant, record) in &report.records {
        let _ = writeln!(
            out,
            "{participant} cautions={} dismissals={}",
            record.caution_count, record.dismissal_count
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participants_parse_from_uuid_or_handle() {
        let id = ParticipantId::new_from_entropy([5u8; 32]);
        assert_eq!(parse_participant(&id.to_string()), id);
        assert_eq!(parse_participant(&id.uuid().to_string()), id);
        assert_eq!(
            parse_participant("player-10"),
            ParticipantId::from_handle("player-10")
        );
    }
}
