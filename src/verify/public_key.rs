//! RSA signature verification of store receipts.
//!
//! Stores such as Google Play sign the exact receipt text with an RSA key
//! (PKCS#1 v1.5, SHA-1) and publish the public half in their developer
//! console as Base64 DER. The signature travels alongside the receipt as
//! standard Base64.

use super::{PurchaseVerifier, VerificationResult};
use crate::error::{Error, Result};
use crate::purchase::Purchase;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Hash and padding used by a store's signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlgorithm {
    /// PKCS#1 v1.5 with SHA-1 (Google Play in-app billing).
    #[default]
    Sha1WithRsa,
    /// PKCS#1 v1.5 with SHA-256.
    Sha256WithRsa,
}

/// Selects which field of a purchase the store signed.
pub trait SignedPayload: Send + Sync {
    /// The signed text of `purchase`.
    fn signed_data<'a>(&self, purchase: &'a Purchase) -> &'a str;
}

/// The raw receipt, which is what most stores sign.
#[derive(Debug, Default, Clone, Copy)]
pub struct OriginalJson;

impl SignedPayload for OriginalJson {
    fn signed_data<'a>(&self, purchase: &'a Purchase) -> &'a str {
        &purchase.original_json
    }
}

/// The purchase token, for stores that sign the token instead of the receipt.
#[derive(Debug, Default, Clone, Copy)]
pub struct PurchaseToken;

impl SignedPayload for PurchaseToken {
    fn signed_data<'a>(&self, purchase: &'a Purchase) -> &'a str {
        &purchase.token
    }
}

/// Verifies store signatures against a public RSA key.
///
/// The key is decoded when the verifier is built. A key that does not decode
/// is a configuration error returned by the constructor, so a verifier with
/// an unusable key never exists.
#[derive(Debug, Clone)]
pub struct PublicKeyVerifier<P = OriginalJson> {
    key: RsaPublicKey,
    algorithm: SignatureAlgorithm,
    payload: P,
}

impl PublicKeyVerifier<OriginalJson> {
    /// Build from a Base64-encoded X.509 `SubjectPublicKeyInfo`, the format
    /// store consoles publish. Whitespace in `encoded` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the text is not Base64 or not an RSA
    /// public key.
    pub fn from_base64_der(encoded: &str) -> Result<Self> {
        let der = decode_base64(encoded)
            .map_err(|e| Error::InvalidKey(format!("public key is not valid Base64: {e}")))?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| Error::InvalidKey(format!("public key is not an RSA SPKI key: {e}")))?;
        Ok(Self::from_key(key))
    }

    /// Build from a PEM key, either `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY`
    /// (PKCS#1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if neither form decodes.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| Error::InvalidKey(format!("unrecognised PEM public key: {e}")))?;
        Ok(Self::from_key(key))
    }

    /// Build from an already decoded key.
    #[must_use]
    pub fn from_key(key: RsaPublicKey) -> Self {
        debug!("Public key verifier ready ({} bit key)", key.size() * 8);
        Self {
            key,
            algorithm: SignatureAlgorithm::default(),
            payload: OriginalJson,
        }
    }
}

impl<P: SignedPayload> PublicKeyVerifier<P> {
    /// Use `algorithm` instead of SHA-1 with RSA.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Verify a different field of the purchase.
    #[must_use]
    pub fn with_payload<Q: SignedPayload>(self, payload: Q) -> PublicKeyVerifier<Q> {
        PublicKeyVerifier {
            key: self.key,
            algorithm: self.algorithm,
            payload,
        }
    }

    /// The key signatures are checked against.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.key
    }

    /// The configured signature scheme.
    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn check(&self, data: &[u8], signature: &[u8]) -> bool {
        let outcome = match self.algorithm {
            SignatureAlgorithm::Sha1WithRsa => {
                self.key
                    .verify(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(data), signature)
            }
            SignatureAlgorithm::Sha256WithRsa => {
                self.key
                    .verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data), signature)
            }
        };
        outcome.is_ok()
    }
}

impl<P: SignedPayload> PurchaseVerifier for PublicKeyVerifier<P> {
    fn verify(&self, purchase: &Purchase) -> VerificationResult {
        let Some(signature) = purchase.signature.as_deref() else {
            debug!("Purchase {} carries no signature", purchase.order_id);
            return VerificationResult::Error;
        };
        let data = self.payload.signed_data(purchase);
        if data.is_empty() || signature.is_empty() {
            debug!("Purchase {} has empty data or signature", purchase.order_id);
            return VerificationResult::Error;
        }

        let signature = match decode_base64(signature) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Signature of {} is not valid Base64: {e}", purchase.order_id);
                return VerificationResult::Error;
            }
        };
        if signature.len() != self.key.size() {
            debug!(
                "Signature of {} is {} bytes, key expects {}",
                purchase.order_id,
                signature.len(),
                self.key.size()
            );
            return VerificationResult::Error;
        }

        if self.check(data.as_bytes(), &signature) {
            VerificationResult::Success
        } else {
            VerificationResult::Failed
        }
    }
}

fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Encode `key` as Base64 DER, the format accepted by
/// [`PublicKeyVerifier::from_base64_der`].
///
/// # Errors
///
/// Returns [`Error::Crypto`] if the key cannot be DER-encoded.
pub fn encode_public_key(key: &RsaPublicKey) -> Result<String> {
    let der = key
        .to_public_key_der()
        .map_err(|e| Error::Crypto(format!("failed to encode public key: {e}")))?;
    Ok(STANDARD.encode(der.as_bytes()))
}

/// Sign `data` the way a store signs a receipt, returning Base64.
///
/// Intended for tests and local tooling; stores sign their own receipts.
///
/// # Errors
///
/// Returns [`Error::Crypto`] if signing fails.
pub fn sign_receipt(
    key: &RsaPrivateKey,
    algorithm: SignatureAlgorithm,
    data: &[u8],
) -> Result<String> {
    let signature = match algorithm {
        SignatureAlgorithm::Sha1WithRsa => {
            key.sign(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(data))
        }
        SignatureAlgorithm::Sha256WithRsa => {
            key.sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data))
        }
    }
    .map_err(|e| Error::Crypto(format!("signing failed: {e}")))?;
    Ok(STANDARD.encode(signature))
}
