//! Core identifier newtypes and code fingerprints.
//!
//! Every identity in the engine is a distinct Rust newtype to prevent
//! cross-domain confusion at compile time: a [`ProviderId`] can never be
//! passed where a [`DocumentId`] is expected, and a [`CodeFingerprint`]
//! is not interchangeable with any other 32-byte hash.
//!
//! Derived identifiers ([`SchemaId`], [`CodeFingerprint`]) use SHA-256
//! with an ASCII domain-separation prefix so the same input bytes can
//! never collide across identifier classes.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Derivation helper
// ---------------------------------------------------------------------------

/// Domain-separated SHA-256: `H(domain || 0x00 || input)`.
fn domain_hash(domain: &[u8], input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update([0u8]);
    hasher.update(input);
    hasher.finalize().into()
}

fn hex_of(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}

fn parse_hex<const N: usize>(s: &str) -> Result<[u8; N], String> {
    fn nibble(c: u8) -> Result<u8, String> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(format!("invalid hex digit: {}", c as char)),
        }
    }
    let bytes = s.as_bytes();
    if bytes.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, bytes.len()));
    }
    let mut out = [0u8; N];
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        out[i] = (nibble(chunk[0])? << 4) | nibble(chunk[1])?;
    }
    Ok(out)
}

/// Byte-array newtypes serialize as lowercase hex strings so they stay
/// readable in exported audit logs and stay legal as JSON map keys.
macro_rules! impl_hex_serde {
    ($ty:ident, $len:expr) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                parse_hex::<$len>(&s).map($ty).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_hex_serde!(Address, 20);
impl_hex_serde!(ProviderId, 32);
impl_hex_serde!(DocumentId, 32);
impl_hex_serde!(AttestationId, 32);
impl_hex_serde!(SchemaId, 32);
impl_hex_serde!(CodeFingerprint, 32);

// ---------------------------------------------------------------------------
// Address — ledger account/contract address
// ---------------------------------------------------------------------------

/// A 20-byte ledger address (account or contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Used as "unset" in external records, never
    /// as a trusted issuer.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// ProviderId — opaque provider registry key
// ---------------------------------------------------------------------------

/// Opaque 256-bit provider identifier chosen at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(pub [u8; 32]);

impl ProviderId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a provider id from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(domain_hash(b"docid.provider-id.v1", label.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// 256-bit document identity (the token/namehash of the document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub [u8; 32]);

impl DocumentId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// AttestationId
// ---------------------------------------------------------------------------

/// Unique id of an attestation record in the ledger's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttestationId(pub [u8; 32]);

impl AttestationId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attestation:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// SchemaId
// ---------------------------------------------------------------------------

/// Identifier of an attestation schema, derived from its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaId(pub [u8; 32]);

impl SchemaId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a schema id from its canonical definition bytes.
    pub fn from_definition(definition: &[u8]) -> Self {
        Self(domain_hash(b"docid.schema-id.v1", definition))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// NetworkId
// ---------------------------------------------------------------------------

/// Origin-chain/network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl NetworkId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "network:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LedgerTime — canonical ledger timestamp
// ---------------------------------------------------------------------------

/// The ledger's canonical timestamp in seconds.
///
/// All temporal checks in the engine use this value; there is no wall
/// clock anywhere in the core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct LedgerTime(pub u64);

impl LedgerTime {
    pub const ZERO: LedgerTime = LedgerTime(0);

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, saturating at zero.
    pub fn since(&self, earlier: LedgerTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for LedgerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CodeFingerprint — hash of deployed verifier code
// ---------------------------------------------------------------------------

/// SHA-256 fingerprint of a deployed verifier's executable code.
///
/// Captured once at registration and compared (never overwritten) on
/// every later read; a mismatch means the code behind the address changed
/// and the record must be treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeFingerprint(pub [u8; 32]);

impl CodeFingerprint {
    /// Compute the fingerprint of the given code bytes.
    pub fn compute(code: &[u8]) -> Self {
        Self(domain_hash(b"docid.code-fingerprint.v1", code))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_of(&self.0)
    }
}

impl fmt::Display for CodeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_and_hex() {
        let a = Address::from_bytes([0xAB; 20]);
        assert_eq!(a.to_hex().len(), 40);
        assert!(a.to_string().starts_with("addr:"));
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_bytes([1; 20]).is_zero());
    }

    #[test]
    fn provider_id_from_label_deterministic() {
        let a = ProviderId::from_label("eas-default");
        let b = ProviderId::from_label("eas-default");
        assert_eq!(a, b);
    }

    #[test]
    fn provider_id_labels_differ() {
        assert_ne!(
            ProviderId::from_label("eas-default"),
            ProviderId::from_label("zk-default")
        );
    }

    #[test]
    fn schema_id_from_definition_deterministic() {
        let a = SchemaId::from_definition(b"DocumentCapability.v2");
        let b = SchemaId::from_definition(b"DocumentCapability.v2");
        assert_eq!(a, b);
        assert_ne!(a, SchemaId::from_definition(b"DocumentCapability.v1"));
    }

    #[test]
    fn schema_and_fingerprint_domains_are_separated() {
        // Same input bytes, different identifier classes, different hashes.
        let s = SchemaId::from_definition(b"same-input");
        let f = CodeFingerprint::compute(b"same-input");
        assert_ne!(s.as_bytes(), f.as_bytes());
    }

    #[test]
    fn code_fingerprint_tracks_code_changes() {
        let f1 = CodeFingerprint::compute(b"verifier-v1");
        let f2 = CodeFingerprint::compute(b"verifier-v2");
        assert_ne!(f1, f2);
        assert_eq!(f1, CodeFingerprint::compute(b"verifier-v1"));
    }

    #[test]
    fn ledger_time_since_saturates() {
        let early = LedgerTime(100);
        let late = LedgerTime(250);
        assert_eq!(late.since(early), 150);
        assert_eq!(early.since(late), 0);
    }

    #[test]
    fn display_prefixes_are_distinct() {
        let bytes = [7u8; 32];
        assert!(ProviderId(bytes).to_string().starts_with("provider:"));
        assert!(DocumentId(bytes).to_string().starts_with("doc:"));
        assert!(AttestationId(bytes).to_string().starts_with("attestation:"));
        assert!(SchemaId(bytes).to_string().starts_with("schema:"));
        assert!(CodeFingerprint(bytes).to_string().starts_with("code:"));
    }

    #[test]
    fn id_serialization_round_trip() {
        let id = AttestationId::from_bytes([3; 32]);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let restored: AttestationId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, restored);
    }

    #[test]
    fn ids_work_as_json_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(DocumentId::from_bytes([9; 32]), 1u32);
        let json = serde_json::to_string(&map).expect("serialize");
        let restored: std::collections::BTreeMap<DocumentId, u32> =
            serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, map);
    }

    #[test]
    fn hex_deserialization_rejects_bad_input() {
        assert!(serde_json::from_str::<Address>("\"zz\"").is_err());
        assert!(serde_json::from_str::<Address>(&format!("\"{}\"", "ab".repeat(19))).is_err());
        let upper: Address =
            serde_json::from_str(&format!("\"{}\"", "AB".repeat(20))).expect("uppercase hex");
        assert_eq!(upper, Address::from_bytes([0xAB; 20]));
    }

    #[test]
    fn ledger_time_serialization_round_trip() {
        let t = LedgerTime(1_700_000_000);
        let json = serde_json::to_string(&t).expect("serialize");
        let restored: LedgerTime = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(t, restored);
    }
}
