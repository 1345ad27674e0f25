//! Purchase verification.
//!
//! A verifier classifies a purchase before it reaches the application or is
//! auto-consumed:
//!
//! ```text
//! purchase ──► signature present? ──no──► Error
//!                   │yes
//!                   ▼
//!             decode signature ──fail──► Error
//!                   │
//!                   ▼
//!         RSA check over receipt ──mismatch──► Failed
//!                   │
//!                   ▼
//!                Success
//! ```
//!
//! Verification is a pure, synchronous classification per call. RSA work is
//! CPU-bound, so callers on an event loop should run it on a worker thread.

mod cache;
mod policy;
mod public_key;

pub use cache::{CacheStats, CachedVerifier};
pub use policy::{VerificationPolicy, VerifyMode};
pub use public_key::{
    encode_public_key, sign_receipt, OriginalJson, PublicKeyVerifier, PurchaseToken,
    SignatureAlgorithm, SignedPayload,
};

use crate::purchase::Purchase;
use std::fmt;

/// Outcome of verifying a purchase.
///
/// Ordered by how far a caller may trust the purchase, not by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerificationResult {
    /// Proof of authenticity checked out.
    Success,
    /// The check ran and the purchase is not authentic.
    Failed,
    /// The check could not be completed (missing or malformed input).
    Error,
    /// Verification was never attempted.
    #[default]
    Unknown,
}

impl VerificationResult {
    /// Returns true only for [`VerificationResult::Success`].
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if the outcome is final for this purchase and signature,
    /// i.e. repeating the check cannot change it.
    #[must_use]
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Strategy for deciding whether a purchase is authentic.
pub trait PurchaseVerifier: Send + Sync {
    /// Classify `purchase`. Never mutates it.
    fn verify(&self, purchase: &Purchase) -> VerificationResult;
}

impl<V: PurchaseVerifier + ?Sized> PurchaseVerifier for Box<V> {
    fn verify(&self, purchase: &Purchase) -> VerificationResult {
        (**self).verify(purchase)
    }
}

impl<V: PurchaseVerifier + ?Sized> PurchaseVerifier for std::sync::Arc<V> {
    fn verify(&self, purchase: &Purchase) -> VerificationResult {
        (**self).verify(purchase)
    }
}

/// Trusts every purchase. Use when the store itself is trusted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl PurchaseVerifier for AcceptAll {
    fn verify(&self, _purchase: &Purchase) -> VerificationResult {
        VerificationResult::Success
    }
}

/// Reports every purchase as unverifiable. Stands in for stores that must
/// be verified but have no key configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unverifiable;

impl PurchaseVerifier for Unverifiable {
    fn verify(&self, _purchase: &Purchase) -> VerificationResult {
        VerificationResult::Error
    }
}
