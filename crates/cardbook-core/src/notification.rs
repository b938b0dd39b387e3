//! Ledger notifications
//!
//! One notification is emitted per accepted mutation. Each names the subject
//! participant and, for counter mutations, the counter value after the
//! update, so an observer can follow state without querying the ledger.

use crate::identifiers::ParticipantId;
use serde::{Deserialize, Serialize};

/// Tag bytes of the canonical encoding. Never renumber.
const TAG_PARTICIPANT_REGISTERED: u8 = 1;
const TAG_CAUTION_ISSUED: u8 = 2;
const TAG_DISMISSAL_ISSUED: u8 = 3;

/// Accepted state transition of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Notification {
    /// Participant record created with both counters at zero
    ParticipantRegistered {
        /// Newly registered participant
        participant: ParticipantId,
    },

    /// Caution counter advanced by one
    CautionIssued {
        /// Cautioned participant
        participant: ParticipantId,
        /// Caution count after the update
        total_cautions: u64,
    },

    /// Dismissal counter advanced by one
    DismissalIssued {
        /// Dismissed participant
        participant: ParticipantId,
        /// Dismissal count after the update
        total_dismissals: u64,
    },
}

/// Fieldless discriminant of [`Notification`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationKind {
    /// See [`Notification::ParticipantRegistered`]
    ParticipantRegistered,
    /// See [`Notification::CautionIssued`]
    CautionIssued,
    /// See [`Notification::DismissalIssued`]
    DismissalIssued,
}

impl NotificationKind {
    /// Stable snake_case name for logs and filters
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ParticipantRegistered => "participant_registered",
            NotificationKind::CautionIssued => "caution_issued",
            NotificationKind::DismissalIssued => "dismissal_issued",
        }
    }
}

impl Notification {
    /// Participant this notification is about
    pub fn participant(&self) -> ParticipantId {
        match self {
            Notification::ParticipantRegistered { participant } => *participant,
            Notification::CautionIssued { participant, .. } => *participant,
            Notification::DismissalIssued { participant, .. } => *participant,
        }
    }

    /// Discriminant without payload
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::ParticipantRegistered { .. } => NotificationKind::ParticipantRegistered,
            Notification::CautionIssued { .. } => NotificationKind::CautionIssued,
            Notification::DismissalIssued { .. } => NotificationKind::DismissalIssued,
        }
    }

    /// Updated counter value, if this notification carries one
    pub fn counter_value(&self) -> Option<u64> {
        match self {
            Notification::ParticipantRegistered { .. } => None,
            Notification::CautionIssued { total_cautions, .. } => Some(*total_cautions),
            Notification::DismissalIssued {
                total_dismissals, ..
            } => Some(*total_dismissals),
        }
    }

    /// Deterministic byte encoding used for journal hashing.
    ///
    /// Layout: tag (1) | participant uuid (16) | counter LE (8, counter variants only).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 16 + 8);
        match self {
            Notification::ParticipantRegistered { participant } => {
                out.push(TAG_PARTICIPANT_REGISTERED);
                out.extend_from_slice(&participant.to_bytes());
            }
            Notification::CautionIssued {
                participant,
                total_cautions,
            } => {
                out.push(TAG_CAUTION_ISSUED);
                out.extend_from_slice(&participant.to_bytes());
                out.extend_from_slice(&total_cautions.to_le_bytes());
            }
            Notification::DismissalIssued {
                participant,
                total_dismissals,
            } => {
                out.push(TAG_DISMISSAL_ISSUED);
                out.extend_from_slice(&participant.to_bytes());
                out.extend_from_slice(&total_dismissals.to_le_bytes());
            }
        }
        out
    }

    /// Produce a human-readable summary for logs.
    pub fn summary(&self) -> String {
        match self {
            Notification::ParticipantRegistered { participant } => {
                format!("participant_registered:{participant}")
            }
            Notification::CautionIssued {
                participant,
                total_cautions,
            } => format!("caution_issued:{participant}:{total_cautions}"),
            Notification::DismissalIssued {
                participant,
                total_dismissals,
            } => format!("dismissal_issued:{participant}:{total_dismissals}"),
        }
    }
}
