#![no_main]

use docid_engine::attestation::{CapabilityPayload, PayloadLayout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for layout in [PayloadLayout::Legacy, PayloadLayout::Hardened] {
        // Decoding must never panic on arbitrary bytes, and when it
        // succeeds the canonical encoding must be an exact inverse.
        if let Ok(payload) = CapabilityPayload::decode(data, layout) {
            let encoded = payload.encode();
            assert_eq!(encoded, data);
            let decoded = CapabilityPayload::decode(&encoded, layout).expect("re-decode");
            assert_eq!(decoded, payload);
        }
    }
});
