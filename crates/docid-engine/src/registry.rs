//! Provider registry with enforceable code identity.
//!
//! Maps provider ids to verifier addresses and pins each registration to
//! the code fingerprint captured at registration time. Every later read
//! re-checks the live fingerprint; a mismatch (proxy-style upgrade or
//! address replacement) makes the record read as absent rather than
//! erroring, so a compromised provider can never halt unrelated
//! operations.
//!
//! Records are never physically deleted, only logically disabled, which
//! preserves historical references.
//!
//! All collections use `BTreeMap` for deterministic iteration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::{CallBudget, CodeOracle};
use crate::object_id::{Address, CodeFingerprint, LedgerTime, ProviderId};

/// Units charged against the call budget for one fingerprint query.
const FINGERPRINT_CALL_COST: u64 = 2_600;

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors from registry mutations. Each aborts the whole state
/// transition; no partial application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryError {
    /// Caller is not the governor.
    NotGovernor { caller: Address },
    /// A record with this id is already registered.
    DuplicateId { id: ProviderId },
    /// The address holds no executable code.
    InvalidAddress { address: Address },
    /// No record with this id.
    ProviderNotFound { id: ProviderId },
    /// The code behind the registered address no longer matches the
    /// captured fingerprint.
    CodeChanged {
        id: ProviderId,
        expected: CodeFingerprint,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotGovernor { caller } => write!(f, "caller is not the governor: {caller}"),
            Self::DuplicateId { id } => write!(f, "provider already registered: {id}"),
            Self::InvalidAddress { address } => {
                write!(f, "no executable code at address: {address}")
            }
            Self::ProviderNotFound { id } => write!(f, "provider not found: {id}"),
            Self::CodeChanged { id, expected } => {
                write!(f, "code changed for provider {id}: expected {expected}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// ProviderRecord
// ---------------------------------------------------------------------------

/// A registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    /// Network address of the verifier implementation.
    pub address: Address,
    /// Fingerprint of the verifier's code, captured at registration and
    /// compared (never overwritten) on every later read.
    pub fingerprint: CodeFingerprint,
    pub active: bool,
    pub registered_at: LedgerTime,
    /// Free-text provider type, e.g. "eas", "credential", "zk".
    pub provider_type: String,
    pub description: String,
    /// Reason given with the most recent deactivation, if any.
    pub deactivation_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// Type of registry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegistryEventType {
    ProviderRegistered,
    ProviderDeactivated,
    ProviderReactivated,
    LookupDegraded,
}

impl fmt::Display for RegistryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderRegistered => f.write_str("provider_registered"),
            Self::ProviderDeactivated => f.write_str("provider_deactivated"),
            Self::ProviderReactivated => f.write_str("provider_reactivated"),
            Self::LookupDegraded => f.write_str("lookup_degraded"),
        }
    }
}

/// Why a lookup degraded to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DegradationReason {
    UnknownId,
    Inactive,
    BudgetExceeded,
    FingerprintMismatch,
}

impl fmt::Display for DegradationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownId => f.write_str("unknown_id"),
            Self::Inactive => f.write_str("inactive"),
            Self::BudgetExceeded => f.write_str("budget_exceeded"),
            Self::FingerprintMismatch => f.write_str("fingerprint_mismatch"),
        }
    }
}

/// Structured audit event for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub event_type: RegistryEventType,
    pub provider_id: ProviderId,
    /// Captured fingerprint, carried on registration events for
    /// auditability.
    pub fingerprint: Option<CodeFingerprint>,
    /// Deactivation or degradation reason.
    pub reason: Option<String>,
    pub timestamp: LedgerTime,
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// The provider registry.
///
/// Mutations are governor-gated and take the ledger's code oracle plus
/// the canonical time as call inputs. The plain read path (`lookup`)
/// is side-effect-free; governance tooling that wants degradation events
/// uses [`ProviderRegistry::lookup_with_event`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRegistry {
    governor: Address,
    /// Resource ceiling for each code-oracle call.
    call_budget: CallBudget,
    records: BTreeMap<ProviderId, ProviderRecord>,
    /// Registration order, for stable pagination.
    order: Vec<ProviderId>,
    events: Vec<RegistryEvent>,
}

impl ProviderRegistry {
    pub fn new(governor: Address) -> Self {
        Self {
            governor,
            call_budget: CallBudget::default(),
            records: BTreeMap::new(),
            order: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn governor(&self) -> Address {
        self.governor
    }

    /// Governor-configurable ceiling for external calls.
    pub fn set_call_budget(
        &mut self,
        budget: CallBudget,
        caller: Address,
    ) -> Result<(), RegistryError> {
        if caller != self.governor {
            return Err(RegistryError::NotGovernor { caller });
        }
        self.call_budget = budget;
        Ok(())
    }

    pub fn call_budget(&self) -> CallBudget {
        self.call_budget
    }

    /// Access the audit event log.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Count of records, active or not.
    pub fn provider_count(&self) -> usize {
        self.records.len()
    }

    /// Raw record accessor for governance tooling. Does not perform the
    /// fingerprint check; use [`ProviderRegistry::lookup`] on trust
    /// paths.
    pub fn record(&self, id: &ProviderId) -> Option<&ProviderRecord> {
        self.records.get(id)
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a provider, capturing the code fingerprint of `address`.
    #[allow(clippy::too_many_arguments)]
    pub fn register<C: CodeOracle>(
        &mut self,
        oracle: &C,
        id: ProviderId,
        address: Address,
        provider_type: &str,
        description: &str,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), RegistryError> {
        if caller != self.governor {
            return Err(RegistryError::NotGovernor { caller });
        }
        if self.records.contains_key(&id) {
            return Err(RegistryError::DuplicateId { id });
        }
        let Some(fingerprint) = self.query_fingerprint(oracle, &address) else {
            return Err(RegistryError::InvalidAddress { address });
        };

        self.records.insert(
            id,
            ProviderRecord {
                id,
                address,
                fingerprint,
                active: true,
                registered_at: now,
                provider_type: provider_type.to_string(),
                description: description.to_string(),
                deactivation_reason: None,
            },
        );
        self.order.push(id);
        self.events.push(RegistryEvent {
            event_type: RegistryEventType::ProviderRegistered,
            provider_id: id,
            fingerprint: Some(fingerprint),
            reason: None,
            timestamp: now,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup (graceful degradation)
    // -----------------------------------------------------------------------

    /// Resolve a provider id to its verifier address.
    ///
    /// Returns `None` if the id is unknown, the record is inactive, the
    /// oracle call does not fit the budget ceiling, or the live code
    /// fingerprint no longer matches the captured one. Never aborts the
    /// caller; callers must branch on `None`.
    pub fn lookup<C: CodeOracle>(&self, oracle: &C, id: &ProviderId) -> Option<Address> {
        self.resolve(oracle, id).ok()
    }

    /// Like [`ProviderRegistry::lookup`], but records a degradation
    /// event when the answer is `None`. For governance tooling only; the
    /// trust path stays side-effect-free.
    pub fn lookup_with_event<C: CodeOracle>(
        &mut self,
        oracle: &C,
        id: &ProviderId,
        now: LedgerTime,
    ) -> Option<Address> {
        match self.resolve(oracle, id) {
            Ok(address) => Some(address),
            Err(reason) => {
                self.events.push(RegistryEvent {
                    event_type: RegistryEventType::LookupDegraded,
                    provider_id: *id,
                    fingerprint: None,
                    reason: Some(reason.to_string()),
                    timestamp: now,
                });
                None
            }
        }
    }

    fn resolve<C: CodeOracle>(
        &self,
        oracle: &C,
        id: &ProviderId,
    ) -> Result<Address, DegradationReason> {
        let record = self.records.get(id).ok_or(DegradationReason::UnknownId)?;
        if !record.active {
            return Err(DegradationReason::Inactive);
        }
        if !self.call_budget.admits(FINGERPRINT_CALL_COST) {
            return Err(DegradationReason::BudgetExceeded);
        }
        match oracle.code_fingerprint(&record.address) {
            Some(live) if live == record.fingerprint => Ok(record.address),
            _ => Err(DegradationReason::FingerprintMismatch),
        }
    }

    // -----------------------------------------------------------------------
    // Activation lifecycle
    // -----------------------------------------------------------------------

    /// Disable a provider. Idempotent beyond the first call: deactivating
    /// an already-inactive record changes nothing observable.
    pub fn deactivate(
        &mut self,
        id: ProviderId,
        reason: &str,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), RegistryError> {
        if caller != self.governor {
            return Err(RegistryError::NotGovernor { caller });
        }
        let record = self
            .records
            .get_mut(&id)
            .ok_or(RegistryError::ProviderNotFound { id })?;
        if !record.active {
            return Ok(());
        }
        record.active = false;
        record.deactivation_reason = Some(reason.to_string());
        self.events.push(RegistryEvent {
            event_type: RegistryEventType::ProviderDeactivated,
            provider_id: id,
            fingerprint: None,
            reason: Some(reason.to_string()),
            timestamp: now,
        });
        Ok(())
    }

    /// Re-enable a provider after re-validating its fingerprint, so a
    /// provider whose code changed while disabled cannot be silently
    /// reactivated.
    pub fn reactivate<C: CodeOracle>(
        &mut self,
        oracle: &C,
        id: ProviderId,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), RegistryError> {
        if caller != self.governor {
            return Err(RegistryError::NotGovernor { caller });
        }
        let record = self
            .records
            .get_mut(&id)
            .ok_or(RegistryError::ProviderNotFound { id })?;
        let live = oracle.code_fingerprint(&record.address);
        if live != Some(record.fingerprint) {
            return Err(RegistryError::CodeChanged {
                id,
                expected: record.fingerprint,
            });
        }
        record.active = true;
        record.deactivation_reason = None;
        self.events.push(RegistryEvent {
            event_type: RegistryEventType::ProviderReactivated,
            provider_id: id,
            fingerprint: Some(record.fingerprint),
            reason: None,
            timestamp: now,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Paginated listing in registration order. Unbounded enumeration is
    /// a denial-of-service risk, so callers page through with
    /// `(offset, limit)`.
    pub fn providers(&self, offset: usize, limit: usize) -> Vec<&ProviderRecord> {
        self.order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    fn query_fingerprint<C: CodeOracle>(
        &self,
        oracle: &C,
        address: &Address,
    ) -> Option<CodeFingerprint> {
        if !self.call_budget.admits(FINGERPRINT_CALL_COST) {
            return None;
        }
        oracle.code_fingerprint(address)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    fn governor() -> Address {
        Address::from_bytes([0xA0; 20])
    }

    fn provider_addr() -> Address {
        Address::from_bytes([0x10; 20])
    }

    fn pid(label: &str) -> ProviderId {
        ProviderId::from_label(label)
    }

    fn setup() -> (ProviderRegistry, InMemoryLedger) {
        let mut ledger = InMemoryLedger::new(LedgerTime(100));
        ledger.deploy_code(provider_addr(), b"eas-verifier-v1");
        (ProviderRegistry::new(governor()), ledger)
    }

    fn register_default(registry: &mut ProviderRegistry, ledger: &InMemoryLedger) -> ProviderId {
        let id = pid("eas");
        registry
            .register(
                ledger,
                id,
                provider_addr(),
                "eas",
                "default EAS-style provider",
                governor(),
                LedgerTime(100),
            )
            .unwrap();
        id
    }

    // -- Registration --

    #[test]
    fn register_captures_fingerprint() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);

        let record = registry.record(&id).unwrap();
        assert!(record.active);
        assert_eq!(record.fingerprint, CodeFingerprint::compute(b"eas-verifier-v1"));
        assert_eq!(record.registered_at, LedgerTime(100));
    }

    #[test]
    fn register_duplicate_fails() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        let err = registry
            .register(
                &ledger,
                id,
                provider_addr(),
                "eas",
                "again",
                governor(),
                LedgerTime(101),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
    }

    #[test]
    fn register_codeless_address_fails() {
        let (mut registry, ledger) = setup();
        let empty = Address::from_bytes([0x99; 20]);
        let err = registry
            .register(
                &ledger,
                pid("bad"),
                empty,
                "eas",
                "no code here",
                governor(),
                LedgerTime(100),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAddress { .. }));
    }

    #[test]
    fn register_requires_governor() {
        let (mut registry, ledger) = setup();
        let err = registry
            .register(
                &ledger,
                pid("eas"),
                provider_addr(),
                "eas",
                "",
                Address::from_bytes([0xEE; 20]),
                LedgerTime(100),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotGovernor { .. }));
    }

    #[test]
    fn registration_event_carries_fingerprint() {
        let (mut registry, ledger) = setup();
        register_default(&mut registry, &ledger);
        let event = &registry.events()[0];
        assert_eq!(event.event_type, RegistryEventType::ProviderRegistered);
        assert_eq!(
            event.fingerprint,
            Some(CodeFingerprint::compute(b"eas-verifier-v1"))
        );
    }

    // -- Lookup --

    #[test]
    fn lookup_returns_address_while_code_unchanged() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        assert_eq!(registry.lookup(&ledger, &id), Some(provider_addr()));
    }

    #[test]
    fn lookup_unknown_id_is_none() {
        let (registry, ledger) = setup();
        assert_eq!(registry.lookup(&ledger, &pid("missing")), None);
    }

    #[test]
    fn lookup_after_code_change_is_none() {
        let (mut registry, mut ledger) = setup();
        let id = register_default(&mut registry, &ledger);

        ledger.deploy_code(provider_addr(), b"eas-verifier-v2");
        assert_eq!(registry.lookup(&ledger, &id), None);
    }

    #[test]
    fn lookup_after_code_removal_is_none() {
        let (mut registry, mut ledger) = setup();
        let id = register_default(&mut registry, &ledger);

        ledger.clear_code(&provider_addr());
        assert_eq!(registry.lookup(&ledger, &id), None);
    }

    #[test]
    fn lookup_inactive_is_none() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        registry
            .deactivate(id, "maintenance", governor(), LedgerTime(101))
            .unwrap();
        assert_eq!(registry.lookup(&ledger, &id), None);
    }

    #[test]
    fn lookup_with_exhausted_budget_is_none() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        registry
            .set_call_budget(CallBudget::new(0), governor())
            .unwrap();
        assert_eq!(registry.lookup(&ledger, &id), None);
    }

    #[test]
    fn lookup_with_event_records_degradation_reason() {
        let (mut registry, mut ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        ledger.deploy_code(provider_addr(), b"eas-verifier-v2");

        assert_eq!(registry.lookup_with_event(&ledger, &id, LedgerTime(102)), None);
        let event = registry.events().last().unwrap();
        assert_eq!(event.event_type, RegistryEventType::LookupDegraded);
        assert_eq!(event.reason.as_deref(), Some("fingerprint_mismatch"));
    }

    // -- Activation lifecycle --

    #[test]
    fn deactivate_is_idempotent() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);

        registry
            .deactivate(id, "compromise suspected", governor(), LedgerTime(101))
            .unwrap();
        let events_after_first = registry.events().len();
        let record_after_first = registry.record(&id).cloned();

        registry
            .deactivate(id, "second call", governor(), LedgerTime(102))
            .unwrap();
        assert_eq!(registry.events().len(), events_after_first);
        assert_eq!(registry.record(&id).cloned(), record_after_first);
    }

    #[test]
    fn deactivate_unknown_fails() {
        let (mut registry, _) = setup();
        let err = registry
            .deactivate(pid("missing"), "x", governor(), LedgerTime(101))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ProviderNotFound { .. }));
    }

    #[test]
    fn reactivate_restores_lookup() {
        let (mut registry, ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        registry
            .deactivate(id, "maintenance", governor(), LedgerTime(101))
            .unwrap();
        registry
            .reactivate(&ledger, id, governor(), LedgerTime(102))
            .unwrap();
        assert_eq!(registry.lookup(&ledger, &id), Some(provider_addr()));
        assert_eq!(registry.record(&id).unwrap().deactivation_reason, None);
    }

    #[test]
    fn reactivate_with_changed_code_fails() {
        let (mut registry, mut ledger) = setup();
        let id = register_default(&mut registry, &ledger);
        registry
            .deactivate(id, "maintenance", governor(), LedgerTime(101))
            .unwrap();

        ledger.deploy_code(provider_addr(), b"eas-verifier-v2");
        let err = registry
            .reactivate(&ledger, id, governor(), LedgerTime(102))
            .unwrap_err();
        assert!(matches!(err, RegistryError::CodeChanged { .. }));
        // Still inactive; the failed mutation applied nothing.
        assert!(!registry.record(&id).unwrap().active);
    }

    // -- Enumeration --

    #[test]
    fn providers_paginate_in_registration_order() {
        let (mut registry, mut ledger) = setup();
        for i in 0u8..5 {
            let addr = Address::from_bytes([0x20 + i; 20]);
            ledger.deploy_code(addr, &[i]);
            registry
                .register(
                    &ledger,
                    pid(&format!("p{i}")),
                    addr,
                    "eas",
                    "",
                    governor(),
                    LedgerTime(100 + u64::from(i)),
                )
                .unwrap();
        }
        assert_eq!(registry.provider_count(), 5);

        let page = registry.providers(1, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, pid("p1"));
        assert_eq!(page[1].id, pid("p2"));

        assert_eq!(registry.providers(4, 10).len(), 1);
        assert!(registry.providers(5, 10).is_empty());
        assert!(registry.providers(0, 0).is_empty());
    }

    // -- Serde --

    #[test]
    fn registry_serialization_round_trip() {
        let (mut registry, ledger) = setup();
        register_default(&mut registry, &ledger);
        let json = serde_json::to_string(&registry).expect("serialize");
        let restored: ProviderRegistry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.provider_count(), 1);
        assert_eq!(restored.lookup(&ledger, &pid("eas")), Some(provider_addr()));
    }
}
