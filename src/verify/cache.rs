//! LRU cache of verification outcomes.
//!
//! Stores redeliver the same purchases on every inventory query, so the
//! RSA check for a given receipt and signature is repeated many times. Only
//! definitive outcomes (`Success`, `Failed`) are cached; `Error` may be caused
//! by a transient condition of the wrapped verifier and is always retried.

use super::{PurchaseVerifier, VerificationResult};
use crate::purchase::Purchase;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use tracing::debug;

/// Cache key: SHA-256 over every field of the purchase.
type OutcomeKey = [u8; 32];

/// Default cache capacity.
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries added.
    pub additions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Wraps a verifier and remembers its definitive outcomes.
pub struct CachedVerifier<V> {
    inner: V,
    cache: Mutex<LruCache<OutcomeKey, VerificationResult>>,
    stats: Mutex<CacheStats>,
}

impl<V: PurchaseVerifier> CachedVerifier<V> {
    /// Wrap `inner` with the default capacity.
    #[must_use]
    pub fn new(inner: V) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// Wrap `inner` with room for `capacity` outcomes (at least one).
    #[must_use]
    pub fn with_capacity(inner: V, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(cap)),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The wrapped verifier.
    #[must_use]
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Get the current number of cached outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Clear all cached outcomes.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl<V: PurchaseVerifier> PurchaseVerifier for CachedVerifier<V> {
    fn verify(&self, purchase: &Purchase) -> VerificationResult {
        let key = outcome_key(purchase);

        let cached = self.cache.lock().get(&key).copied();
        if let Some(result) = cached {
            self.stats.lock().hits += 1;
            debug!(
                "Verification of {} served from cache ({})",
                purchase.order_id,
                hex::encode(&key[..8])
            );
            return result;
        }
        self.stats.lock().misses += 1;

        // The lock is not held across the RSA check so other purchases are
        // verified concurrently.
        let result = self.inner.verify(purchase);
        if result.is_definitive() {
            self.cache.lock().put(key, result);
            self.stats.lock().additions += 1;
        }
        result
    }
}

fn outcome_key(purchase: &Purchase) -> OutcomeKey {
    let mut hasher = Sha256::new();
    let item_type = purchase.item_type.to_string();
    let purchase_state = format!("{:?}", purchase.purchase_state);
    let provider = purchase.provider.map_or("", |p| p.as_str());
    for field in [
        item_type.as_str(),
        purchase.sku.as_str(),
        purchase.order_id.as_str(),
        purchase.package_name.as_str(),
        purchase_state.as_str(),
        purchase.developer_payload.as_str(),
        purchase.token.as_str(),
        purchase.original_json.as_str(),
        provider,
    ] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(purchase.purchase_time.to_be_bytes());
    match &purchase.signature {
        Some(signature) => {
            hasher.update([1u8]);
            hasher.update(signature.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.finalize().into()
}
