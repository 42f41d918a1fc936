//! Attestation records and the canonical capability payload codec.
//!
//! Attestation records are owned by the external ledger's store and are
//! read-only to this engine. The payload carried in a record's `data`
//! field uses a fixed big-endian layout in one of two versions:
//!
//! - **legacy (v1)**: document id and capability mask only;
//! - **hardened (v2)**: v1 fields followed by the origin context that
//!   binds the payload to one network, one verifier instance, and one
//!   target contract.
//!
//! The origin context is what stops a proof minted for one deployment
//! from being replayed against another.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capability::CapabilityMask;
use crate::object_id::{Address, AttestationId, DocumentId, LedgerTime, NetworkId, SchemaId};

// ---------------------------------------------------------------------------
// Payload versions
// ---------------------------------------------------------------------------

/// Version tag of the legacy payload layout.
pub const PAYLOAD_VERSION_LEGACY: u16 = 1;

/// Version tag of the hardened payload layout.
pub const PAYLOAD_VERSION_HARDENED: u16 = 2;

const LEGACY_LEN: usize = 32 + 4;
const HARDENED_LEN: usize = LEGACY_LEN + 8 + 20 + 20 + 2 + 8;

/// Which field layout a payload is expected to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PayloadLayout {
    /// Document id + capability mask.
    Legacy,
    /// Legacy fields + origin context.
    Hardened,
}

impl PayloadLayout {
    /// The layout whose encoded form carries the given version tag.
    pub fn for_version(version: u16) -> Option<PayloadLayout> {
        match version {
            PAYLOAD_VERSION_LEGACY => Some(PayloadLayout::Legacy),
            PAYLOAD_VERSION_HARDENED => Some(PayloadLayout::Hardened),
            _ => None,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Legacy => LEGACY_LEN,
            Self::Hardened => HARDENED_LEN,
        }
    }
}

impl fmt::Display for PayloadLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Hardened => f.write_str("hardened"),
        }
    }
}

// ---------------------------------------------------------------------------
// PayloadError
// ---------------------------------------------------------------------------

/// Errors from decoding a capability payload.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PayloadError {
    #[error("payload too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("payload has {actual} trailing bytes beyond the {expected}-byte layout")]
    TrailingBytes { expected: usize, actual: usize },
    #[error("unsupported payload version {version}")]
    UnsupportedVersion { version: u16 },
}

// ---------------------------------------------------------------------------
// OriginContext — hardened replay-prevention fields
// ---------------------------------------------------------------------------

/// Origin-context fields of the hardened payload layout.
///
/// Binds a payload to the network it was issued on, the ledger
/// verification service that is expected to check it, and the single
/// contract allowed to consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginContext {
    /// Chain/network the attestation was issued for.
    pub origin_network: NetworkId,
    /// Address of the ledger-verification service the payload targets.
    pub origin_verifier: Address,
    /// Contract allowed to consume this payload.
    pub target_contract: Address,
    /// Layout version tag baked into the payload.
    pub payload_version: u16,
    /// Issuance timestamp recorded inside the payload.
    pub issued_at: LedgerTime,
}

// ---------------------------------------------------------------------------
// CapabilityPayload
// ---------------------------------------------------------------------------

/// Decoded capability payload of an attestation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityPayload {
    /// Document the capabilities apply to.
    pub document_id: DocumentId,
    /// Granted capability bitmask, as carried on the wire (unsanitized).
    pub capabilities: CapabilityMask,
    /// Origin context; present only in the hardened layout.
    pub origin: Option<OriginContext>,
}

impl CapabilityPayload {
    /// Build a legacy (v1) payload.
    pub fn legacy(document_id: DocumentId, capabilities: CapabilityMask) -> Self {
        Self {
            document_id,
            capabilities,
            origin: None,
        }
    }

    /// Build a hardened (v2) payload.
    pub fn hardened(
        document_id: DocumentId,
        capabilities: CapabilityMask,
        origin: OriginContext,
    ) -> Self {
        Self {
            document_id,
            capabilities,
            origin: Some(origin),
        }
    }

    /// Layout this payload encodes to.
    pub fn layout(&self) -> PayloadLayout {
        if self.origin.is_some() {
            PayloadLayout::Hardened
        } else {
            PayloadLayout::Legacy
        }
    }

    /// Canonical big-endian encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.layout().encoded_len());
        buf.extend_from_slice(self.document_id.as_bytes());
        buf.extend_from_slice(&self.capabilities.as_raw().to_be_bytes());
        if let Some(origin) = &self.origin {
            buf.extend_from_slice(&origin.origin_network.as_u64().to_be_bytes());
            buf.extend_from_slice(origin.origin_verifier.as_bytes());
            buf.extend_from_slice(origin.target_contract.as_bytes());
            buf.extend_from_slice(&origin.payload_version.to_be_bytes());
            buf.extend_from_slice(&origin.issued_at.as_u64().to_be_bytes());
        }
        buf
    }

    /// Decode a payload against the expected layout.
    ///
    /// The layout is chosen by the verifying provider's configuration,
    /// not sniffed from the bytes; a payload that does not match the
    /// expected layout exactly is rejected.
    pub fn decode(data: &[u8], layout: PayloadLayout) -> Result<CapabilityPayload, PayloadError> {
        let expected = layout.encoded_len();
        if data.len() < expected {
            return Err(PayloadError::TooShort {
                expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            return Err(PayloadError::TrailingBytes {
                expected,
                actual: data.len() - expected,
            });
        }

        let mut document = [0u8; 32];
        document.copy_from_slice(&data[0..32]);
        let mask = u32::from_be_bytes([data[32], data[33], data[34], data[35]]);

        let origin = match layout {
            PayloadLayout::Legacy => None,
            PayloadLayout::Hardened => {
                let mut at = LEGACY_LEN;
                let network = read_u64_be(data, at);
                at += 8;
                let mut verifier = [0u8; 20];
                verifier.copy_from_slice(&data[at..at + 20]);
                at += 20;
                let mut target = [0u8; 20];
                target.copy_from_slice(&data[at..at + 20]);
                at += 20;
                let version = u16::from_be_bytes([data[at], data[at + 1]]);
                at += 2;
                let issued = read_u64_be(data, at);
                Some(OriginContext {
                    origin_network: NetworkId(network),
                    origin_verifier: Address::from_bytes(verifier),
                    target_contract: Address::from_bytes(target),
                    payload_version: version,
                    issued_at: LedgerTime(issued),
                })
            }
        };

        Ok(CapabilityPayload {
            document_id: DocumentId::from_bytes(document),
            capabilities: CapabilityMask::from_raw(mask),
            origin,
        })
    }
}

fn read_u64_be(data: &[u8], at: usize) -> u64 {
    u64::from_be_bytes([
        data[at],
        data[at + 1],
        data[at + 2],
        data[at + 3],
        data[at + 4],
        data[at + 5],
        data[at + 6],
        data[at + 7],
    ])
}

// ---------------------------------------------------------------------------
// Attestation — ledger record (read-only to this engine)
// ---------------------------------------------------------------------------

/// A signed claim record as stored by the ledger's attestation store.
///
/// Once `revocation_time` is set it is never cleared; revocation is
/// permanent for a given record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Unique record id.
    pub uid: AttestationId,
    /// Schema the record was issued under.
    pub schema: SchemaId,
    /// Address whose authorship makes the record trusted.
    pub issuer: Address,
    /// Address the claim is about; the only party who may redeem it.
    pub recipient: Address,
    /// Ledger time the record was issued.
    pub issued_at: LedgerTime,
    /// Optional expiration; `None` means the record does not expire.
    pub expiration_time: Option<LedgerTime>,
    /// Set iff the record has been revoked.
    pub revocation_time: Option<LedgerTime>,
    /// Opaque payload bytes.
    pub data: Vec<u8>,
}

impl Attestation {
    pub fn is_revoked(&self) -> bool {
        self.revocation_time.is_some()
    }

    /// Whether the record has expired as of `now`. A record with no
    /// expiration never expires.
    pub fn is_expired_at(&self, now: LedgerTime) -> bool {
        match self.expiration_time {
            Some(expiry) => now > expiry,
            None => false,
        }
    }

    /// Age of the record at `now`, in seconds.
    pub fn age_at(&self, now: LedgerTime) -> u64 {
        now.since(self.issued_at)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
