//! Capability namespace: the closed set of document permissions and the
//! bitmask that carries them on the wire.
//!
//! Bit positions are a versioned, closed enumeration. An attestation
//! payload may carry arbitrary mask bits, but bits outside the known set
//! must never be trusted as granted; [`CapabilityMask::sanitize`] strips
//! them before a mask leaves the verification pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Capability — the atomic permission unit
// ---------------------------------------------------------------------------

/// Atomic permissions grantable on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read the document and its records.
    View,
    /// Claim the document identity (mint/take ownership of the token).
    Claim,
    /// Transfer the document to another holder.
    Transfer,
    /// Grant time-bounded delegated use without transfer.
    Lease,
    /// Issue further attestations on behalf of the holder.
    Delegate,
    /// Manage resolver attachment and document metadata.
    Administer,
}

impl Capability {
    /// All known capabilities, in bit order.
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::Claim,
        Capability::Transfer,
        Capability::Lease,
        Capability::Delegate,
        Capability::Administer,
    ];

    /// Fixed bit position of this capability. Positions are append-only
    /// across versions of the namespace; existing positions never move.
    pub fn bit(&self) -> u32 {
        match self {
            Self::View => 0,
            Self::Claim => 1,
            Self::Transfer => 2,
            Self::Lease => 3,
            Self::Delegate => 4,
            Self::Administer => 5,
        }
    }

    fn mask_bit(&self) -> u32 {
        1u32 << self.bit()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => f.write_str("view"),
            Self::Claim => f.write_str("claim"),
            Self::Transfer => f.write_str("transfer"),
            Self::Lease => f.write_str("lease"),
            Self::Delegate => f.write_str("delegate"),
            Self::Administer => f.write_str("administer"),
        }
    }
}

// ---------------------------------------------------------------------------
// CapabilityMask — wire bitmask
// ---------------------------------------------------------------------------

/// Bitmask of granted capabilities; combinable with OR, tested with AND.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CapabilityMask(pub u32);

impl CapabilityMask {
    /// No capabilities.
    pub const EMPTY: CapabilityMask = CapabilityMask(0);

    /// Every capability in the current namespace version.
    pub const ALL_KNOWN: CapabilityMask = CapabilityMask(0b11_1111);

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u32 {
        self.0
    }

    /// Mask containing exactly one capability.
    pub fn single(cap: Capability) -> Self {
        Self(cap.mask_bit())
    }

    /// Return a mask with `cap` added.
    #[must_use]
    pub fn grant(&self, cap: Capability) -> Self {
        Self(self.0 | cap.mask_bit())
    }

    /// Bitwise union of two masks.
    #[must_use]
    pub fn union(&self, other: CapabilityMask) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `cap` is present.
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.0 & cap.mask_bit() != 0
    }

    /// Whether every bit of `other` is present in `self`.
    pub fn contains(&self, other: CapabilityMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether the mask carries bits outside the known namespace.
    pub fn has_unknown_bits(&self) -> bool {
        self.0 & !Self::ALL_KNOWN.0 != 0
    }

    /// Strip bits outside the known namespace. Unknown bits must never
    /// be trusted as granted.
    #[must_use]
    pub fn sanitize(&self) -> Self {
        Self(self.0 & Self::ALL_KNOWN.0)
    }

    /// Iterate over the known capabilities set in this mask.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(move |cap| self.has_capability(*cap))
    }
}

impl fmt::Display for CapabilityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("caps:{}");
        }
        f.write_str("caps:{")?;
        let mut first = true;
        for cap in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{cap}")?;
            first = false;
        }
        if self.has_unknown_bits() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str("?")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<Capability> for CapabilityMask {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        iter.into_iter()
            .fold(CapabilityMask::EMPTY, |mask, cap| mask.grant(cap))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
