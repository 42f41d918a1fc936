//! Per-document issuer authority: the three-tier trust state machine that
//! decides whose attestations are currently trusted for a document.
//!
//! Tiers, in resolution priority order:
//! 1. **Revoked**: the document owner has killed trust entirely; no
//!    issuer is active until the owner restores one.
//! 2. **Owner override**: an issuer chosen by the document owner.
//! 3. **Default**: the platform issuer provisioned by the governor.
//!
//! The governor provisions platform-level trust; only the owner (or the
//! document's executor, which holds the same rights) can override or
//! revoke it for their own document. Neither role alone can both grant
//! and unilaterally block the other's emergency response.
//!
//! All collections use `BTreeMap` for deterministic iteration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::DocumentDirectory;
use crate::object_id::{Address, DocumentId, LedgerTime};

// ---------------------------------------------------------------------------
// IssuerError
// ---------------------------------------------------------------------------

/// Errors from issuer-authority mutations. Each aborts the whole state
/// transition; no partial application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuerError {
    /// Caller is not the governor.
    NotGovernor { caller: Address },
    /// Caller is neither the document's owner nor its executor.
    NotDocumentOwner {
        document: DocumentId,
        caller: Address,
    },
    /// The directory has no owner on file for the document.
    UnknownDocument { document: DocumentId },
    /// The document's issuer is currently revoked and must be restored
    /// first.
    AlreadyRevoked { document: DocumentId },
    /// Restore called on a document that is not revoked.
    NotRevoked { document: DocumentId },
    /// Revoke called on a document with no active issuer.
    NoActiveIssuer { document: DocumentId },
}

impl fmt::Display for IssuerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotGovernor { caller } => write!(f, "caller is not the governor: {caller}"),
            Self::NotDocumentOwner { document, caller } => {
                write!(f, "caller {caller} is not owner or executor of {document}")
            }
            Self::UnknownDocument { document } => {
                write!(f, "no owner on file for document: {document}")
            }
            Self::AlreadyRevoked { document } => {
                write!(f, "issuer already revoked for document: {document}")
            }
            Self::NotRevoked { document } => {
                write!(f, "issuer not revoked for document: {document}")
            }
            Self::NoActiveIssuer { document } => {
                write!(f, "no active issuer for document: {document}")
            }
        }
    }
}

impl std::error::Error for IssuerError {}

// ---------------------------------------------------------------------------
// IssuerState — per-document stored state
// ---------------------------------------------------------------------------

/// Stored issuer pointers for one document.
///
/// `revoked_at == LedgerTime::ZERO` means not revoked; a real revocation
/// timestamp is always non-zero because the ledger clock starts after
/// genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssuerState {
    /// Platform issuer provisioned by the governor.
    pub default_issuer: Option<Address>,
    /// Owner-chosen override; takes priority over the default.
    pub owner_issuer: Option<Address>,
    /// Time of revocation, or `ZERO` if not revoked.
    pub revoked_at: LedgerTime,
}

impl IssuerState {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at != LedgerTime::ZERO
    }

    /// Current status per the resolution priority order.
    pub fn status(&self) -> IssuerStatus {
        if self.is_revoked() {
            IssuerStatus::Revoked
        } else if self.owner_issuer.is_some() {
            IssuerStatus::OwnerActive
        } else if self.default_issuer.is_some() {
            IssuerStatus::DefaultActive
        } else {
            IssuerStatus::NoIssuer
        }
    }
}

/// Resolution states of the issuer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssuerStatus {
    NoIssuer,
    DefaultActive,
    OwnerActive,
    Revoked,
}

impl fmt::Display for IssuerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIssuer => f.write_str("no_issuer"),
            Self::DefaultActive => f.write_str("default_active"),
            Self::OwnerActive => f.write_str("owner_active"),
            Self::Revoked => f.write_str("revoked"),
        }
    }
}

// ---------------------------------------------------------------------------
// IssuerResolution — read-path answer
// ---------------------------------------------------------------------------

/// Answer to "who may issue for this document right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerResolution {
    pub status: IssuerStatus,
    /// The currently trusted issuer, if any.
    pub issuer: Option<Address>,
    /// Whether an owner override is in place.
    pub is_owner_set: bool,
}

impl IssuerResolution {
    fn none(status: IssuerStatus) -> Self {
        Self {
            status,
            issuer: None,
            is_owner_set: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// Type of issuer-authority event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssuerEventType {
    DefaultIssuerSet,
    OwnerIssuerSet,
    IssuerRevoked,
    IssuerRestored,
}

impl fmt::Display for IssuerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultIssuerSet => f.write_str("default_issuer_set"),
            Self::OwnerIssuerSet => f.write_str("owner_issuer_set"),
            Self::IssuerRevoked => f.write_str("issuer_revoked"),
            Self::IssuerRestored => f.write_str("issuer_restored"),
        }
    }
}

/// Structured audit event for issuer-authority mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerEvent {
    pub event_type: IssuerEventType,
    pub document: DocumentId,
    /// Issuer the event concerns; absent for revocations.
    pub issuer: Option<Address>,
    /// Address that performed the mutation.
    pub actor: Address,
    pub timestamp: LedgerTime,
}

// ---------------------------------------------------------------------------
// IssuerAuthority
// ---------------------------------------------------------------------------

/// The per-document issuer state machine.
///
/// Mutations take the document directory and the ledger's current time as
/// call inputs so every check is a snapshot read against committed state.
/// The read path (`active_issuer`) touches only local state and never
/// errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerAuthority {
    governor: Address,
    states: BTreeMap<DocumentId, IssuerState>,
    events: Vec<IssuerEvent>,
}

impl IssuerAuthority {
    pub fn new(governor: Address) -> Self {
        Self {
            governor,
            states: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn governor(&self) -> Address {
        self.governor
    }

    /// Access the audit event log.
    pub fn events(&self) -> &[IssuerEvent] {
        &self.events
    }

    /// Stored state for a document, if any mutation ever touched it.
    pub fn state(&self, document: &DocumentId) -> Option<&IssuerState> {
        self.states.get(document)
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Resolve the currently trusted issuer for a document.
    ///
    /// Priority: revoked → none; owner override → owner issuer; default →
    /// default issuer; otherwise none.
    pub fn active_issuer(&self, document: &DocumentId) -> IssuerResolution {
        let Some(state) = self.states.get(document) else {
            return IssuerResolution::none(IssuerStatus::NoIssuer);
        };
        match state.status() {
            IssuerStatus::Revoked => IssuerResolution::none(IssuerStatus::Revoked),
            IssuerStatus::OwnerActive => IssuerResolution {
                status: IssuerStatus::OwnerActive,
                issuer: state.owner_issuer,
                is_owner_set: true,
            },
            IssuerStatus::DefaultActive => IssuerResolution {
                status: IssuerStatus::DefaultActive,
                issuer: state.default_issuer,
                is_owner_set: false,
            },
            IssuerStatus::NoIssuer => IssuerResolution::none(IssuerStatus::NoIssuer),
        }
    }

    // -----------------------------------------------------------------------
    // Governor path
    // -----------------------------------------------------------------------

    /// Provision the platform default issuer for a document.
    ///
    /// Fails with `AlreadyRevoked` while a revocation is in force: the
    /// governor must not be able to silently re-trust a document the
    /// owner has killed.
    pub fn set_default_issuer(
        &mut self,
        document: DocumentId,
        issuer: Address,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), IssuerError> {
        if caller != self.governor {
            return Err(IssuerError::NotGovernor { caller });
        }
        let state = self.states.entry(document).or_default();
        if state.is_revoked() {
            return Err(IssuerError::AlreadyRevoked { document });
        }
        state.default_issuer = Some(issuer);
        self.events.push(IssuerEvent {
            event_type: IssuerEventType::DefaultIssuerSet,
            document,
            issuer: Some(issuer),
            actor: caller,
            timestamp: now,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Owner path
    // -----------------------------------------------------------------------

    /// Set an owner override issuer. Clears any revocation in force.
    pub fn set_owner_issuer<D: DocumentDirectory>(
        &mut self,
        directory: &D,
        document: DocumentId,
        issuer: Address,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), IssuerError> {
        self.require_controller(directory, &document, caller)?;
        let state = self.states.entry(document).or_default();
        state.owner_issuer = Some(issuer);
        state.revoked_at = LedgerTime::ZERO;
        self.events.push(IssuerEvent {
            event_type: IssuerEventType::OwnerIssuerSet,
            document,
            issuer: Some(issuer),
            actor: caller,
            timestamp: now,
        });
        Ok(())
    }

    /// Revoke trust for a document: both issuer pointers are deleted and
    /// become untrusted immediately.
    pub fn revoke_issuer<D: DocumentDirectory>(
        &mut self,
        directory: &D,
        document: DocumentId,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), IssuerError> {
        self.require_controller(directory, &document, caller)?;
        let Some(state) = self.states.get_mut(&document) else {
            return Err(IssuerError::NoActiveIssuer { document });
        };
        match state.status() {
            IssuerStatus::Revoked => return Err(IssuerError::AlreadyRevoked { document }),
            IssuerStatus::NoIssuer => return Err(IssuerError::NoActiveIssuer { document }),
            IssuerStatus::DefaultActive | IssuerStatus::OwnerActive => {}
        }
        state.default_issuer = None;
        state.owner_issuer = None;
        state.revoked_at = now;
        self.events.push(IssuerEvent {
            event_type: IssuerEventType::IssuerRevoked,
            document,
            issuer: None,
            actor: caller,
            timestamp: now,
        });
        Ok(())
    }

    /// Restore trust after a revocation with a new owner issuer.
    pub fn restore_issuer<D: DocumentDirectory>(
        &mut self,
        directory: &D,
        document: DocumentId,
        issuer: Address,
        caller: Address,
        now: LedgerTime,
    ) -> Result<(), IssuerError> {
        self.require_controller(directory, &document, caller)?;
        let Some(state) = self.states.get_mut(&document) else {
            return Err(IssuerError::NotRevoked { document });
        };
        if !state.is_revoked() {
            return Err(IssuerError::NotRevoked { document });
        }
        state.owner_issuer = Some(issuer);
        state.revoked_at = LedgerTime::ZERO;
        self.events.push(IssuerEvent {
            event_type: IssuerEventType::IssuerRestored,
            document,
            issuer: Some(issuer),
            actor: caller,
            timestamp: now,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn require_controller<D: DocumentDirectory>(
        &self,
        directory: &D,
        document: &DocumentId,
        caller: Address,
    ) -> Result<(), IssuerError> {
        let Some(owner) = directory.document_owner(document) else {
            return Err(IssuerError::UnknownDocument {
                document: *document,
            });
        };
        if caller == owner {
            return Ok(());
        }
        if directory.document_executor(document) == Some(caller) {
            return Ok(());
        }
        Err(IssuerError::NotDocumentOwner {
            document: *document,
            caller,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
