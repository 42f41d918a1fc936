//! Interfaces to the external ledger collaborators, and a deterministic
//! in-memory implementation used by tests and reference deployments.
//!
//! The engine never owns attestation records, document ownership, or
//! deployed code; it reads them through three narrow traits. Each trait
//! method is a snapshot read against the ledger's committed state and
//! must be side-effect-free.
//!
//! All collections use `BTreeMap` for deterministic iteration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attestation::Attestation;
use crate::object_id::{Address, AttestationId, CodeFingerprint, DocumentId, LedgerTime};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Read access to the ledger's attestation store.
pub trait AttestationStore {
    /// Fetch a record by id. `None` means not found.
    fn attestation(&self, id: &AttestationId) -> Option<Attestation>;

    /// The ledger's canonical current timestamp.
    fn current_time(&self) -> LedgerTime;
}

/// Code-identity queries against the ledger.
pub trait CodeOracle {
    /// Fingerprint of the executable code deployed at `address`.
    /// `None` means the address holds no executable code.
    fn code_fingerprint(&self, address: &Address) -> Option<CodeFingerprint>;
}

/// Document ownership lookups against the document registry.
///
/// Executors hold the same issuer-management rights as owners.
pub trait DocumentDirectory {
    fn document_owner(&self, document: &DocumentId) -> Option<Address>;

    fn document_executor(&self, document: &DocumentId) -> Option<Address>;
}

// ---------------------------------------------------------------------------
// CallBudget — resource ceiling for external calls
// ---------------------------------------------------------------------------

/// Governor-configurable ceiling on resource units charged per external
/// call.
///
/// A callee that would exceed the ceiling is treated as unavailable; the
/// budget never aborts the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallBudget {
    /// Maximum units a single external call may consume. 0 means no
    /// external calls are permitted at all.
    pub ceiling: u64,
}

impl CallBudget {
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    /// Whether a call costing `units` fits under the ceiling.
    pub fn admits(&self, units: u64) -> bool {
        units <= self.ceiling
    }
}

impl Default for CallBudget {
    fn default() -> Self {
        // Generous enough for a fingerprint query on any reasonable host.
        Self { ceiling: 100_000 }
    }
}

// ---------------------------------------------------------------------------
// InMemoryLedger — deterministic reference implementation
// ---------------------------------------------------------------------------

/// Deterministic in-memory ledger implementing all three collaborator
/// traits. Time only moves when the host advances it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    attestations: BTreeMap<AttestationId, Attestation>,
    code: BTreeMap<Address, Vec<u8>>,
    owners: BTreeMap<DocumentId, Address>,
    executors: BTreeMap<DocumentId, Address>,
    now: LedgerTime,
}

impl InMemoryLedger {
    pub fn new(start: LedgerTime) -> Self {
        Self {
            now: start,
            ..Self::default()
        }
    }

    /// Advance the canonical clock. Time never moves backwards.
    pub fn advance_time(&mut self, to: LedgerTime) {
        if to > self.now {
            self.now = to;
        }
    }

    /// Publish an attestation record, keyed by its uid.
    pub fn publish_attestation(&mut self, record: Attestation) {
        self.attestations.insert(record.uid, record);
    }

    /// Mark a record revoked at the current time. Revocation is
    /// permanent: a record that is already revoked keeps its original
    /// revocation time.
    pub fn revoke_attestation(&mut self, id: &AttestationId) {
        if let Some(record) = self.attestations.get_mut(id) {
            if record.revocation_time.is_none() {
                record.revocation_time = Some(self.now);
            }
        }
    }

    /// Deploy code bytes at an address. Overwriting models a proxy-style
    /// upgrade or address replacement.
    pub fn deploy_code(&mut self, address: Address, code: &[u8]) {
        self.code.insert(address, code.to_vec());
    }

    /// Remove the code at an address (self-destruct).
    pub fn clear_code(&mut self, address: &Address) {
        self.code.remove(address);
    }

    pub fn set_document_owner(&mut self, document: DocumentId, owner: Address) {
        self.owners.insert(document, owner);
    }

    pub fn set_document_executor(&mut self, document: DocumentId, executor: Address) {
        self.executors.insert(document, executor);
    }
}

impl AttestationStore for InMemoryLedger {
    fn attestation(&self, id: &AttestationId) -> Option<Attestation> {
        self.attestations.get(id).cloned()
    }

    fn current_time(&self) -> LedgerTime {
        self.now
    }
}

impl CodeOracle for InMemoryLedger {
    fn code_fingerprint(&self, address: &Address) -> Option<CodeFingerprint> {
        self.code
            .get(address)
            .map(|code| CodeFingerprint::compute(code))
    }
}

impl DocumentDirectory for InMemoryLedger {
    fn document_owner(&self, document: &DocumentId) -> Option<Address> {
        self.owners.get(document).copied()
    }

    fn document_executor(&self, document: &DocumentId) -> Option<Address> {
        self.executors.get(document).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
