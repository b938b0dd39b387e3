//! Identifier types for principals and participants
//!
//! Both identifiers are opaque and globally unique. The ledger never
//! authenticates a [`PrincipalId`]; the hosting environment supplies it with
//! every call and the ledger only compares it to the owner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a calling principal
///
/// The principal that constructs a ledger becomes its owner; every other
/// principal is limited to the open read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Create a principal ID from caller-provided entropy.
    pub fn new_from_entropy(entropy: [u8; 32]) -> Self {
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes.copy_from_slice(&entropy[..16]);
        Self(Uuid::from_bytes(uuid_bytes))
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.into_bytes()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "principal-{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("principal-").unwrap_or(s);
        Ok(PrincipalId(Uuid::parse_str(raw)?))
    }
}

impl From<Uuid> for PrincipalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(principal: PrincipalId) -> Self {
        principal.0
    }
}

/// Identity of a tracked participant
///
/// Keys the record table. Typically derived from a public key or an account
/// address by the hosting environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Create a participant ID from caller-provided entropy.
    pub fn new_from_entropy(entropy: [u8; 32]) -> Self {
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes.copy_from_slice(&entropy[..16]);
        Self(Uuid::from_bytes(uuid_bytes))
    }

    /// Create a deterministic ID from an external handle (account address, key fingerprint).
    pub fn from_handle(handle: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, handle.as_bytes()))
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.into_bytes()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant-{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("participant-").unwrap_or(s);
        Ok(ParticipantId(Uuid::parse_str(raw)?))
    }
}

impl From<Uuid> for ParticipantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ParticipantId> for Uuid {
    fn from(participant: ParticipantId) -> Self {
        participant.0
    }
}
