//! Error types for unified-iab.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or using the billing core.
///
/// Lookups and verification never return these: SKU resolution degrades to
/// identity and verification reports a [`crate::VerificationResult`]. These
/// errors surface at setup time, when a bad key or a conflicting mapping
/// must stop the application from starting.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// A cryptographic operation failed outside of verification.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// A SKU identifier is not acceptable for registration.
    #[error("invalid SKU: {0}")]
    InvalidSku(String),

    /// A SKU is already taken by an earlier registration.
    #[error("SKU '{sku}' conflicts with existing registration of '{existing}'")]
    SkuConflict {
        /// The identifier that collided.
        sku: String,
        /// Application SKU of the registration that already owns it.
        existing: String,
    },

    /// A purchase receipt could not be interpreted.
    #[error("invalid purchase: {0}")]
    InvalidPurchase(String),
}
