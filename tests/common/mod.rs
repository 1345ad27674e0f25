//! Shared fixtures for integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use rsa::RsaPrivateKey;
use std::sync::OnceLock;
use unified_iab::verify::{encode_public_key, sign_receipt};
use unified_iab::{Purchase, SignatureAlgorithm};

/// A receipt in the Google Play wire format.
pub const RECEIPT: &str = r#"{"orderId":"GPA.3301-8823-1120-55417","packageName":"com.example.game","productId":"com.app.gold100","purchaseTime":1700000000000,"purchaseState":0,"developerPayload":"session-42","purchaseToken":"aabbccddeeff"}"#;

/// Store signing key, generated once per test binary.
pub fn store_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("keygen"))
}

/// Base64 DER public half of [`store_key`], as published by a store console.
pub fn store_public_key() -> String {
    encode_public_key(&store_key().to_public_key()).unwrap()
}

/// Sign `data` with [`store_key`] using SHA-1 with RSA.
pub fn sign(data: &str) -> String {
    sign_receipt(store_key(), SignatureAlgorithm::Sha1WithRsa, data.as_bytes()).unwrap()
}

/// [`RECEIPT`] with a valid signature.
pub fn signed_receipt() -> Purchase {
    Purchase::signed(RECEIPT, sign(RECEIPT))
}
