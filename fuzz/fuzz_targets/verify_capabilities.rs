#![no_main]

use docid_engine::attestation::{Attestation, CapabilityPayload, OriginContext};
use docid_engine::capability::CapabilityMask;
use docid_engine::issuer::IssuerAuthority;
use docid_engine::ledger::InMemoryLedger;
use docid_engine::object_id::{
    Address, AttestationId, DocumentId, LedgerTime, NetworkId, SchemaId,
};
use docid_engine::provider::{
    AttestationProvider, LedgerCapabilityProvider, VerifierConfig,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let governor = Address::from_bytes([0xA0; 20]);
    let issuer = Address::from_bytes([byte(data, 0); 20]);
    let recipient = Address::from_bytes([byte(data, 1); 20]);
    let document = DocumentId::from_bytes(bytes32(data, 2));
    let schema = SchemaId::from_definition(b"DocumentCapability.v2");
    let verifier = Address::from_bytes([0xE0; 20]);
    let contract = Address::from_bytes([0xE1; 20]);
    let network = NetworkId(u64::from(byte(data, 3)));

    let mut ledger = InMemoryLedger::new(LedgerTime(1 + u64::from(byte(data, 4))));
    let mut authority = IssuerAuthority::new(governor);
    let _ = authority.set_default_issuer(document, issuer, governor, ledger_now(&ledger));

    // Attestation payload built from fuzz bytes; possibly mismatched
    // origin fields, unknown mask bits, wrong document.
    let payload = CapabilityPayload::hardened(
        DocumentId::from_bytes(bytes32(data, 5)),
        CapabilityMask::from_raw(u32::from_le_bytes([
            byte(data, 6),
            byte(data, 7),
            byte(data, 0),
            byte(data, 1),
        ])),
        OriginContext {
            origin_network: NetworkId(u64::from(byte(data, 2))),
            origin_verifier: verifier,
            target_contract: contract,
            payload_version: u16::from(byte(data, 3)),
            issued_at: LedgerTime(u64::from(byte(data, 4))),
        },
    );

    let uid = AttestationId::from_bytes(bytes32(data, 6));
    let record = Attestation {
        uid,
        schema,
        issuer,
        recipient,
        issued_at: LedgerTime(u64::from(byte(data, 5))),
        expiration_time: (byte(data, 6) & 1 == 1).then(|| LedgerTime(u64::from(byte(data, 7)))),
        revocation_time: None,
        data: payload.encode(),
    };
    ledger.publish_attestation(record.clone());
    if byte(data, 7) & 1 == 1 {
        ledger.revoke_attestation(&uid);
    }

    let config = VerifierConfig::hardened(schema, network, verifier, contract)
        .with_max_age(u64::from(byte(data, 0)));
    let provider = LedgerCapabilityProvider::new(&ledger, &authority, config);

    // Arbitrary proof bytes must never panic, and a rejected outcome
    // must never leak capabilities.
    let outcome = provider.verify_capabilities(data, &recipient, &document, None);
    if !outcome.verified {
        assert!(outcome.capabilities.is_empty());
    } else {
        assert!(!outcome.capabilities.has_unknown_bits());
    }

    // The record's own uid as proof: same sentinel contract, and
    // deterministic across repeated calls.
    let a = provider.verify_capabilities(uid.as_bytes(), &recipient, &document, None);
    let b = provider.verify_capabilities(uid.as_bytes(), &recipient, &document, None);
    assert_eq!(a, b);
    if !a.verified {
        assert!(a.capabilities.is_empty());
    }

    // Serde round-trip of the record must not change the verdict.
    if let Ok(json) = serde_json::to_string(&record) {
        let decoded: Attestation = serde_json::from_str(&json).expect("round-trip");
        assert_eq!(decoded, record);
    }
});

fn byte(data: &[u8], index: usize) -> u8 {
    data[index % data.len()]
}

fn bytes32(data: &[u8], seed: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, b) in out.iter_mut().enumerate() {
        *b = byte(data, seed.wrapping_add(i));
    }
    out
}

fn ledger_now(ledger: &InMemoryLedger) -> LedgerTime {
    use docid_engine::ledger::AttestationStore;
    ledger.current_time()
}
