//! Per-store verification policy.

use super::{
    AcceptAll, CachedVerifier, PublicKeyVerifier, PurchaseVerifier, Unverifiable,
    VerificationResult,
};
use crate::config::BillingConfig;
use crate::error::{Error, Result};
use crate::purchase::Purchase;
use crate::sku::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Which purchases get verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Verify every store. A configured store without a key is a startup
    /// error; an unconfigured store yields `Error` for every purchase.
    #[default]
    Everything,
    /// Trust every store.
    Skip,
    /// Verify stores that have a key, trust the rest.
    OnlyKnown,
}

/// Chooses and runs the verifier for the store a purchase came from.
pub struct VerificationPolicy {
    mode: VerifyMode,
    verifiers: BTreeMap<Provider, Box<dyn PurchaseVerifier>>,
    fallback: Box<dyn PurchaseVerifier>,
}

impl fmt::Debug for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPolicy")
            .field("mode", &self.mode)
            .field("stores", &self.verifiers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl VerificationPolicy {
    /// Empty policy: every store uses the default for `mode`.
    #[must_use]
    pub fn new(mode: VerifyMode) -> Self {
        let fallback: Box<dyn PurchaseVerifier> = match mode {
            VerifyMode::Everything => Box::new(Unverifiable),
            VerifyMode::Skip | VerifyMode::OnlyKnown => Box::new(AcceptAll),
        };
        Self {
            mode,
            verifiers: BTreeMap::new(),
            fallback,
        }
    }

    /// Build the policy described by `config`.
    ///
    /// Keys are decoded here, so a bad key stops startup instead of failing
    /// every purchase later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if a configured key does not decode, and
    /// [`Error::Config`] if `verify_mode = "everything"` and a configured
    /// store has no key.
    pub fn from_config(config: &BillingConfig) -> Result<Self> {
        let mut policy = Self::new(config.verify_mode);
        if config.verify_mode == VerifyMode::Skip {
            info!("Purchase verification disabled");
            return Ok(policy);
        }

        for (provider, store) in &config.providers {
            let Some(encoded) = store.public_key.as_deref() else {
                if config.verify_mode == VerifyMode::Everything {
                    return Err(Error::Config(format!(
                        "{provider}: public_key is required when verify_mode is \"everything\""
                    )));
                }
                debug!("{provider}: no public key, purchases are trusted");
                continue;
            };

            let verifier = PublicKeyVerifier::from_base64_der(encoded)
                .map_err(|e| match e {
                    Error::InvalidKey(msg) => Error::InvalidKey(format!("{provider}: {msg}")),
                    other => other,
                })?
                .with_algorithm(store.algorithm);

            let verifier: Box<dyn PurchaseVerifier> = if config.cache_capacity > 0 {
                Box::new(CachedVerifier::with_capacity(verifier, config.cache_capacity))
            } else {
                Box::new(verifier)
            };
            policy.verifiers.insert(*provider, verifier);
        }

        info!(
            "Verification policy ready (mode={:?}, keyed stores={})",
            policy.mode,
            policy.verifiers.len()
        );
        Ok(policy)
    }

    /// Use `verifier` for purchases from `provider`, replacing any previous one.
    pub fn set_verifier(&mut self, provider: Provider, verifier: Box<dyn PurchaseVerifier>) {
        self.verifiers.insert(provider, verifier);
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> VerifyMode {
        self.mode
    }

    /// Returns true if `provider` has its own verifier.
    #[must_use]
    pub fn has_verifier(&self, provider: Provider) -> bool {
        self.verifiers.contains_key(&provider)
    }

    /// Verify a purchase received from `provider`.
    ///
    /// `Failed` and `Error` are both untrusted but logged differently: the
    /// first means a forged or tampered receipt, the second a purchase that
    /// could not be checked at all.
    pub fn verify(&self, provider: Provider, purchase: &Purchase) -> VerificationResult {
        let verifier = self
            .verifiers
            .get(&provider)
            .unwrap_or(&self.fallback);
        let result = verifier.verify(purchase);

        match result {
            VerificationResult::Success => {
                debug!("{provider}: purchase {} verified", purchase.order_id);
            }
            VerificationResult::Failed => {
                warn!(
                    "{provider}: signature mismatch for purchase {} ({})",
                    purchase.order_id, purchase.sku
                );
            }
            VerificationResult::Error => {
                warn!(
                    "{provider}: purchase {} ({}) could not be verified",
                    purchase.order_id, purchase.sku
                );
            }
            VerificationResult::Unknown => {
                debug!("{provider}: purchase {} not verified", purchase.order_id);
            }
        }
        result
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(VerifyMode::default())
    }
}
