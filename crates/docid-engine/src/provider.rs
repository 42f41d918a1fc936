//! Attestation provider contract and the default ledger-backed
//! verification pipeline.
//!
//! A provider is a pluggable verification backend behind a uniform
//! three-method contract: given an opaque proof blob, a claimed
//! recipient, a document id, and an optional required capability, answer
//! whether the proof authentically grants capabilities on the document.
//!
//! Verification is a pure read: deterministic for identical inputs, no
//! wall clock (time checks use the ledger's canonical timestamp), and
//! every failure is a sentinel outcome, never an abort, so the calling
//! contract keeps control over its own fallback.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attestation::{CapabilityPayload, PayloadLayout};
use crate::capability::{Capability, CapabilityMask};
use crate::issuer::IssuerAuthority;
use crate::ledger::AttestationStore;
use crate::object_id::{Address, AttestationId, DocumentId, NetworkId, SchemaId};

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Verification strategy a provider implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Ledger attestation records in the EAS style.
    EasStyle,
    /// Off-ledger verifiable credentials.
    Credential,
    /// Zero-knowledge proof verification.
    ZeroKnowledge,
    /// Anything else; the registry's free-text type field carries the
    /// description.
    Other,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EasStyle => f.write_str("eas_style"),
            Self::Credential => f.write_str("credential"),
            Self::ZeroKnowledge => f.write_str("zero_knowledge"),
            Self::Other => f.write_str("other"),
        }
    }
}

// ---------------------------------------------------------------------------
// VerifyStep — the ordered pipeline checks
// ---------------------------------------------------------------------------

/// The ordered checks of the verification pipeline. The first failing
/// check short-circuits the pipeline and is reported in the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VerifyStep {
    /// 1. Decode the proof blob into a record id.
    ProofDecode,
    /// 2. Record exists in the store.
    RecordExists,
    /// 3. Record not revoked.
    NotRevoked,
    /// 4. Record not expired.
    NotExpired,
    /// 5. Record schema matches the provider's schema.
    SchemaMatch,
    /// 6. Record recipient equals the presented recipient.
    RecipientBinding,
    /// 7. Record issuer equals the document's active issuer.
    IssuerMatch,
    /// 8. Payload decodes to the expected layout.
    PayloadDecode,
    /// 9. Payload origin network equals the verifier's network.
    OriginNetwork,
    /// 10. Payload origin verifier equals this verifier's address.
    OriginVerifier,
    /// 11. Payload target contract equals the consuming contract.
    TargetContract,
    /// 12. Payload version tag equals the implemented version.
    PayloadVersion,
    /// 13. Payload document id equals the presented document.
    DocumentBinding,
    /// 14. Record age within the configured maximum.
    MaxAge,
}

impl fmt::Display for VerifyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProofDecode => f.write_str("proof_decode"),
            Self::RecordExists => f.write_str("record_exists"),
            Self::NotRevoked => f.write_str("not_revoked"),
            Self::NotExpired => f.write_str("not_expired"),
            Self::SchemaMatch => f.write_str("schema_match"),
            Self::RecipientBinding => f.write_str("recipient_binding"),
            Self::IssuerMatch => f.write_str("issuer_match"),
            Self::PayloadDecode => f.write_str("payload_decode"),
            Self::OriginNetwork => f.write_str("origin_network"),
            Self::OriginVerifier => f.write_str("origin_verifier"),
            Self::TargetContract => f.write_str("target_contract"),
            Self::PayloadVersion => f.write_str("payload_version"),
            Self::DocumentBinding => f.write_str("document_binding"),
            Self::MaxAge => f.write_str("max_age"),
        }
    }
}

// ---------------------------------------------------------------------------
// VerifyOutcome
// ---------------------------------------------------------------------------

/// Result of a capability verification.
///
/// Any failure yields `(verified = false, capabilities = EMPTY)`;
/// `rejected_at` names the failing check for diagnostics without changing
/// that sentinel contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub verified: bool,
    /// Granted capabilities, sanitized to known bits. Empty unless
    /// `verified`.
    pub capabilities: CapabilityMask,
    /// First failing pipeline check, if any.
    pub rejected_at: Option<VerifyStep>,
}

impl VerifyOutcome {
    /// Successful outcome carrying the granted mask.
    pub fn granted(capabilities: CapabilityMask) -> Self {
        Self {
            verified: true,
            capabilities,
            rejected_at: None,
        }
    }

    /// Failed outcome naming the check that rejected the proof.
    pub fn rejected(step: VerifyStep) -> Self {
        Self {
            verified: false,
            capabilities: CapabilityMask::EMPTY,
            rejected_at: Some(step),
        }
    }

    /// Whether the outcome grants the given capability. Sufficiency is
    /// the caller's check, not the provider's; this helper is the
    /// caller-side test.
    pub fn satisfies(&self, required: Option<Capability>) -> bool {
        if !self.verified {
            return false;
        }
        match required {
            Some(cap) => self.capabilities.has_capability(cap),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// AttestationProvider — the uniform contract
// ---------------------------------------------------------------------------

/// The uniform provider contract. Exactly this surface crosses the
/// provider boundary; no implementation detail leaks through it.
pub trait AttestationProvider {
    /// Verification strategy of this provider.
    fn kind(&self) -> ProviderKind;

    /// Schema this provider accepts records under.
    fn expected_schema(&self) -> SchemaId;

    /// Verify an opaque proof for `(recipient, document)`.
    ///
    /// `required` is advisory: the provider attests authenticity and the
    /// full granted mask; the caller tests sufficiency (see
    /// [`VerifyOutcome::satisfies`]). One verification can serve several
    /// capability checks without re-querying the ledger.
    fn verify_capabilities(
        &self,
        proof: &[u8],
        recipient: &Address,
        document: &DocumentId,
        required: Option<Capability>,
    ) -> VerifyOutcome;
}

// ---------------------------------------------------------------------------
// VerifierConfig
// ---------------------------------------------------------------------------

/// Deployment configuration of the default provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Schema accepted by this provider.
    pub schema: SchemaId,
    /// This deployment's network.
    pub network: NetworkId,
    /// Address of this ledger-verification service.
    pub verifier_address: Address,
    /// The document contract whose proofs this verifier serves.
    pub target_contract: Address,
    /// Payload layout version this provider implements.
    pub payload_version: u16,
    /// Maximum accepted record age in seconds; 0 means unlimited.
    /// Governor-configurable.
    pub max_attestation_age: u64,
}

impl VerifierConfig {
    /// Hardened-layout configuration: origin-context checks enforced.
    pub fn hardened(
        schema: SchemaId,
        network: NetworkId,
        verifier_address: Address,
        target_contract: Address,
    ) -> Self {
        Self {
            schema,
            network,
            verifier_address,
            target_contract,
            payload_version: crate::attestation::PAYLOAD_VERSION_HARDENED,
            max_attestation_age: 0,
        }
    }

    /// Legacy-layout configuration: payloads carry no origin context and
    /// the origin checks do not apply.
    pub fn legacy(schema: SchemaId) -> Self {
        Self {
            schema,
            network: NetworkId(0),
            verifier_address: Address::ZERO,
            target_contract: Address::ZERO,
            payload_version: crate::attestation::PAYLOAD_VERSION_LEGACY,
            max_attestation_age: 0,
        }
    }

    /// Set the maximum accepted record age (0 = unlimited).
    #[must_use]
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_attestation_age = seconds;
        self
    }
}

// ---------------------------------------------------------------------------
// LedgerCapabilityProvider — default implementation
// ---------------------------------------------------------------------------

/// The default EAS-style provider: verifies capability attestations read
/// from the ledger's store against the issuer authority.
#[derive(Debug)]
pub struct LedgerCapabilityProvider<'a, S: AttestationStore> {
    store: &'a S,
    authority: &'a IssuerAuthority,
    config: VerifierConfig,
}

impl<'a, S: AttestationStore> LedgerCapabilityProvider<'a, S> {
    pub fn new(store: &'a S, authority: &'a IssuerAuthority, config: VerifierConfig) -> Self {
        Self {
            store,
            authority,
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Decode a proof blob into a record id. The EAS-style proof is the
    /// 32-byte record uid.
    fn decode_proof(proof: &[u8]) -> Option<AttestationId> {
        let bytes: [u8; 32] = proof.try_into().ok()?;
        Some(AttestationId::from_bytes(bytes))
    }
}

impl<S: AttestationStore> AttestationProvider for LedgerCapabilityProvider<'_, S> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::EasStyle
    }

    fn expected_schema(&self) -> SchemaId {
        self.config.schema
    }

    fn verify_capabilities(
        &self,
        proof: &[u8],
        recipient: &Address,
        document: &DocumentId,
        _required: Option<Capability>,
    ) -> VerifyOutcome {
        // 1. Proof decodes to a record id.
        let Some(id) = Self::decode_proof(proof) else {
            return VerifyOutcome::rejected(VerifyStep::ProofDecode);
        };

        // 2. Record exists.
        let Some(record) = self.store.attestation(&id) else {
            return VerifyOutcome::rejected(VerifyStep::RecordExists);
        };

        // 3. Not revoked.
        if record.is_revoked() {
            return VerifyOutcome::rejected(VerifyStep::NotRevoked);
        }

        // 4. Not expired at the ledger's canonical time.
        let now = self.store.current_time();
        if record.is_expired_at(now) {
            return VerifyOutcome::rejected(VerifyStep::NotExpired);
        }

        // 5. Schema matches.
        if record.schema != self.config.schema {
            return VerifyOutcome::rejected(VerifyStep::SchemaMatch);
        }

        // 6. Recipient binding: a third party cannot redeem someone
        // else's proof.
        if record.recipient != *recipient {
            return VerifyOutcome::rejected(VerifyStep::RecipientBinding);
        }

        // 7. Issuer matches the document's currently-active issuer.
        let resolution = self.authority.active_issuer(document);
        if resolution.issuer != Some(record.issuer) {
            return VerifyOutcome::rejected(VerifyStep::IssuerMatch);
        }

        // 8. Payload decodes to the expected layout.
        let Some(layout) = PayloadLayout::for_version(self.config.payload_version) else {
            return VerifyOutcome::rejected(VerifyStep::PayloadDecode);
        };
        let Ok(payload) = CapabilityPayload::decode(&record.data, layout) else {
            return VerifyOutcome::rejected(VerifyStep::PayloadDecode);
        };

        // 9–12. Origin context binds the payload to one network, one
        // verifier instance, and one consuming contract. Legacy payloads
        // carry no origin context and these checks do not apply.
        if let Some(origin) = &payload.origin {
            if origin.origin_network != self.config.network {
                return VerifyOutcome::rejected(VerifyStep::OriginNetwork);
            }
            if origin.origin_verifier != self.config.verifier_address {
                return VerifyOutcome::rejected(VerifyStep::OriginVerifier);
            }
            if origin.target_contract != self.config.target_contract {
                return VerifyOutcome::rejected(VerifyStep::TargetContract);
            }
            if origin.payload_version != self.config.payload_version {
                return VerifyOutcome::rejected(VerifyStep::PayloadVersion);
            }
        }

        // 13. Document binding.
        if payload.document_id != *document {
            return VerifyOutcome::rejected(VerifyStep::DocumentBinding);
        }

        // 14. Optional staleness ceiling.
        if self.config.max_attestation_age > 0
            && record.age_at(now) > self.config.max_attestation_age
        {
            return VerifyOutcome::rejected(VerifyStep::MaxAge);
        }

        VerifyOutcome::granted(payload.capabilities.sanitize())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::{
        Attestation, OriginContext, PAYLOAD_VERSION_HARDENED,
    };
    use crate::ledger::InMemoryLedger;
    use crate::object_id::LedgerTime;

    fn schema() -> SchemaId {
        SchemaId::from_definition(b"DocumentCapability.v2")
    }

    fn governor() -> Address {
        Address::from_bytes([0xA0; 20])
    }

    fn owner() -> Address {
        Address::from_bytes([0xB0; 20])
    }

    fn issuer() -> Address {
        Address::from_bytes([0xC0; 20])
    }

    fn recipient() -> Address {
        Address::from_bytes([0xC1; 20])
    }

    fn doc() -> DocumentId {
        DocumentId::from_bytes([0xD0; 32])
    }

    fn config() -> VerifierConfig {
        VerifierConfig::hardened(
            schema(),
            NetworkId(10),
            Address::from_bytes([0xE0; 20]),
            Address::from_bytes([0xE1; 20]),
        )
    }

    fn payload() -> CapabilityPayload {
        CapabilityPayload::hardened(
            doc(),
            CapabilityMask::single(Capability::View).grant(Capability::Transfer),
            OriginContext {
                origin_network: NetworkId(10),
                origin_verifier: Address::from_bytes([0xE0; 20]),
                target_contract: Address::from_bytes([0xE1; 20]),
                payload_version: PAYLOAD_VERSION_HARDENED,
                issued_at: LedgerTime(1_000),
            },
        )
    }

    fn record(uid: u8, data: Vec<u8>) -> Attestation {
        Attestation {
            uid: AttestationId::from_bytes([uid; 32]),
            schema: schema(),
            issuer: issuer(),
            recipient: recipient(),
            issued_at: LedgerTime(1_000),
            expiration_time: None,
            revocation_time: None,
            data,
        }
    }

    fn setup() -> (InMemoryLedger, IssuerAuthority) {
        let mut ledger = InMemoryLedger::new(LedgerTime(1_000));
        ledger.set_document_owner(doc(), owner());
        ledger.publish_attestation(record(1, payload().encode()));

        let mut authority = IssuerAuthority::new(governor());
        authority
            .set_default_issuer(doc(), issuer(), governor(), LedgerTime(1_000))
            .unwrap();
        (ledger, authority)
    }

    fn proof(uid: u8) -> [u8; 32] {
        [uid; 32]
    }

    #[test]
    fn valid_attestation_verifies() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());

        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert!(outcome.verified);
        assert!(outcome.capabilities.has_capability(Capability::View));
        assert!(outcome.capabilities.has_capability(Capability::Transfer));
        assert_eq!(outcome.rejected_at, None);
    }

    #[test]
    fn malformed_proof_rejects_at_decode() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());

        for bad in [&b""[..], &[1u8; 31][..], &[1u8; 33][..]] {
            let outcome = provider.verify_capabilities(bad, &recipient(), &doc(), None);
            assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::ProofDecode));
        }
    }

    #[test]
    fn missing_record_rejects() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(9), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::RecordExists));
    }

    #[test]
    fn revoked_record_rejects() {
        let (mut ledger, authority) = setup();
        ledger.revoke_attestation(&AttestationId::from_bytes([1; 32]));
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::NotRevoked));
    }

    #[test]
    fn expired_record_rejects() {
        let (mut ledger, authority) = setup();
        let mut rec = record(2, payload().encode());
        rec.expiration_time = Some(LedgerTime(1_500));
        ledger.publish_attestation(rec);
        ledger.advance_time(LedgerTime(1_501));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(2), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::NotExpired));
    }

    #[test]
    fn revocation_check_precedes_expiry_check() {
        let (mut ledger, authority) = setup();
        let mut rec = record(3, payload().encode());
        rec.expiration_time = Some(LedgerTime(1_500));
        ledger.publish_attestation(rec);
        ledger.revoke_attestation(&AttestationId::from_bytes([3; 32]));
        ledger.advance_time(LedgerTime(2_000));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(3), &recipient(), &doc(), None);
        assert_eq!(outcome.rejected_at, Some(VerifyStep::NotRevoked));
    }

    #[test]
    fn wrong_schema_rejects() {
        let (mut ledger, authority) = setup();
        let mut rec = record(4, payload().encode());
        rec.schema = SchemaId::from_definition(b"SomeOtherSchema.v1");
        ledger.publish_attestation(rec);

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(4), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::SchemaMatch));
    }

    #[test]
    fn recipient_swap_rejects() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let thief = Address::from_bytes([0x66; 20]);
        let outcome = provider.verify_capabilities(&proof(1), &thief, &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::RecipientBinding));
    }

    #[test]
    fn wrong_issuer_rejects() {
        let (ledger, mut authority) = setup();
        authority
            .set_owner_issuer(
                &ledger,
                doc(),
                Address::from_bytes([0x77; 20]),
                owner(),
                LedgerTime(1_001),
            )
            .unwrap();

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::IssuerMatch));
    }

    #[test]
    fn revoked_issuer_rejects() {
        let (ledger, mut authority) = setup();
        authority
            .revoke_issuer(&ledger, doc(), owner(), LedgerTime(1_001))
            .unwrap();

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::IssuerMatch));
    }

    #[test]
    fn garbage_payload_rejects_at_decode() {
        let (mut ledger, authority) = setup();
        ledger.publish_attestation(record(5, vec![0xFF; 7]));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(5), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::PayloadDecode));
    }

    #[test]
    fn cross_network_replay_rejects() {
        let (mut ledger, authority) = setup();
        let mut p = payload();
        p.origin.as_mut().unwrap().origin_network = NetworkId(999);
        ledger.publish_attestation(record(6, p.encode()));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(6), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::OriginNetwork));
    }

    #[test]
    fn spoofed_verifier_rejects() {
        let (mut ledger, authority) = setup();
        let mut p = payload();
        p.origin.as_mut().unwrap().origin_verifier = Address::from_bytes([0x55; 20]);
        ledger.publish_attestation(record(7, p.encode()));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(7), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::OriginVerifier));
    }

    #[test]
    fn cross_contract_replay_rejects() {
        let (mut ledger, authority) = setup();
        let mut p = payload();
        p.origin.as_mut().unwrap().target_contract = Address::from_bytes([0x44; 20]);
        ledger.publish_attestation(record(8, p.encode()));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(8), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::TargetContract));
    }

    #[test]
    fn version_tag_mismatch_rejects() {
        let (mut ledger, authority) = setup();
        let mut p = payload();
        p.origin.as_mut().unwrap().payload_version = 7;
        ledger.publish_attestation(record(9, p.encode()));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(9), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::PayloadVersion));
    }

    #[test]
    fn wrong_document_rejects() {
        let (ledger, mut authority) = setup();
        let other = DocumentId::from_bytes([0xDD; 32]);
        authority
            .set_default_issuer(other, issuer(), governor(), LedgerTime(1_000))
            .unwrap();

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &other, None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::DocumentBinding));
    }

    #[test]
    fn stale_record_rejects_when_max_age_set() {
        let (mut ledger, authority) = setup();
        ledger.advance_time(LedgerTime(10_000));

        let provider = LedgerCapabilityProvider::new(
            &ledger,
            &authority,
            config().with_max_age(3_600),
        );
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert_eq!(outcome, VerifyOutcome::rejected(VerifyStep::MaxAge));
    }

    #[test]
    fn zero_max_age_means_unlimited() {
        let (mut ledger, authority) = setup();
        ledger.advance_time(LedgerTime(u64::MAX / 2));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert!(outcome.verified);
    }

    #[test]
    fn granted_mask_is_sanitized() {
        let (mut ledger, authority) = setup();
        let mut p = payload();
        p.capabilities = CapabilityMask::from_raw(0xFFFF_FFFF);
        ledger.publish_attestation(record(10, p.encode()));

        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());
        let outcome = provider.verify_capabilities(&proof(10), &recipient(), &doc(), None);
        assert!(outcome.verified);
        assert!(!outcome.capabilities.has_unknown_bits());
        assert_eq!(outcome.capabilities, CapabilityMask::ALL_KNOWN);
    }

    #[test]
    fn satisfies_tests_required_capability() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());

        let outcome = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert!(outcome.satisfies(None));
        assert!(outcome.satisfies(Some(Capability::View)));
        assert!(!outcome.satisfies(Some(Capability::Administer)));

        let rejected = VerifyOutcome::rejected(VerifyStep::RecordExists);
        assert!(!rejected.satisfies(None));
    }

    #[test]
    fn verification_is_deterministic() {
        let (ledger, authority) = setup();
        let provider = LedgerCapabilityProvider::new(&ledger, &authority, config());

        let a = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        let b = provider.verify_capabilities(&proof(1), &recipient(), &doc(), None);
        assert_eq!(a, b);
    }

    #[test]
    fn legacy_config_skips_origin_checks() {
        let mut ledger = InMemoryLedger::new(LedgerTime(1_000));
        ledger.set_document_owner(doc(), owner());
        let legacy_schema = SchemaId::from_definition(b"DocumentCapability.v1");
        let p = CapabilityPayload::legacy(doc(), CapabilityMask::single(Capability::View));
        let mut rec = record(11, p.encode());
        rec.schema = legacy_schema;
        ledger.publish_attestation(rec);

        let mut authority = IssuerAuthority::new(governor());
        authority
            .set_default_issuer(doc(), issuer(), governor(), LedgerTime(1_000))
            .unwrap();

        let provider = LedgerCapabilityProvider::new(
            &ledger,
            &authority,
            VerifierConfig::legacy(legacy_schema),
        );
        let outcome = provider.verify_capabilities(&proof(11), &recipient(), &doc(), None);
        assert!(outcome.verified);
        assert!(outcome.capabilities.has_capability(Capability::View));
    }

    #[test]
    fn provider_kind_display() {
        assert_eq!(ProviderKind::EasStyle.to_string(), "eas_style");
        assert_eq!(ProviderKind::ZeroKnowledge.to_string(), "zero_knowledge");
    }

    #[test]
    fn outcome_serialization_round_trip() {
        let outcome = VerifyOutcome::rejected(VerifyStep::OriginNetwork);
        let json = serde_json::to_string(&outcome).expect("serialize");
        let restored: VerifyOutcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(outcome, restored);
    }
}
