#![forbid(unsafe_code)]

//! Attestation-based capability authorization engine for a
//! document-identity platform.
//!
//! Given a `(document, user, requested permission)` triple, the engine
//! decides whether a signed claim record ("attestation") read from an
//! external ledger grants the permission, and manages the trust
//! relationships that make such claims meaningful:
//!
//! - [`registry`]: maps provider ids to verifier addresses and pins each
//!   registration to a code fingerprint, so tampering with registered
//!   verifier code is detected on every lookup;
//! - [`provider`]: the uniform provider contract and the default
//!   ledger-backed verification pipeline guarding against forgery,
//!   replay, cross-system spoofing, and staleness;
//! - [`issuer`]: the per-document three-tier issuer state machine
//!   (default, owner override, revoked) governing who may produce valid
//!   attestations;
//! - [`capability`]: the closed permission namespace and its wire
//!   bitmask;
//! - [`attestation`]: attestation records and the canonical payload
//!   codec;
//! - [`ledger`]: the narrow traits behind which the external ledger's
//!   attestation store, code oracle, and document directory sit;
//! - [`object_id`]: identifier newtypes shared by everything above.
//!
//! Query paths (`lookup`, `verify_capabilities`) degrade gracefully to
//! sentinel values and never abort the caller; mutation paths fail with
//! named errors and apply atomically or not at all.

pub mod attestation;
pub mod capability;
pub mod issuer;
pub mod ledger;
pub mod object_id;
pub mod provider;
pub mod registry;
