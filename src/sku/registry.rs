//! Per-store SKU registrations.

use super::{IdentityResolver, Provider, SkuMap, SkuType, TypedSkuResolver};
use crate::config::BillingConfig;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::info;

/// SKU mappings for every store the application sells through.
///
/// Stores without any registration resolve through an [`IdentityResolver`].
#[derive(Debug, Default, Clone)]
pub struct SkuRegistry {
    maps: BTreeMap<Provider, SkuMap>,
    identity: IdentityResolver,
}

impl SkuRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the `[[providers.*.skus]]` tables of a config.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is invalid or conflicts with another
    /// entry for the same store.
    pub fn from_config(config: &BillingConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (provider, store) in &config.providers {
            for entry in &store.skus {
                registry
                    .map_sku(
                        *provider,
                        &entry.sku,
                        entry.provider_sku.as_deref(),
                        entry.sku_type,
                    )
                    .map_err(|e| Error::Config(format!("{provider}: {e}")))?;
            }
        }

        info!(
            "SKU registry loaded ({} stores, {} SKUs)",
            registry.maps.len(),
            registry.maps.values().map(SkuMap::len).sum::<usize>()
        );
        Ok(registry)
    }

    /// Register `sku` for `provider`. See [`SkuMap::add`].
    ///
    /// # Errors
    ///
    /// Propagates the registration error from [`SkuMap::add`].
    pub fn map_sku(
        &mut self,
        provider: Provider,
        sku: &str,
        provider_sku: Option<&str>,
        sku_type: SkuType,
    ) -> Result<()> {
        self.maps.entry(provider).or_default().add(sku, provider_sku, sku_type)
    }

    /// Resolver for `provider`.
    #[must_use]
    pub fn resolver(&self, provider: Provider) -> &dyn TypedSkuResolver {
        match self.maps.get(&provider) {
            Some(map) => map,
            None => &self.identity,
        }
    }

    /// Store SKU of `sku` for `provider`.
    #[must_use]
    pub fn resolve<'a>(&'a self, provider: Provider, sku: &'a str) -> &'a str {
        self.resolver(provider).resolve(sku)
    }

    /// Application SKU of `provider_sku` for `provider`.
    #[must_use]
    pub fn revert<'a>(&'a self, provider: Provider, provider_sku: &'a str) -> &'a str {
        self.resolver(provider).revert(provider_sku)
    }

    /// Declared type of `sku` for `provider`.
    #[must_use]
    pub fn resolve_type(&self, provider: Provider, sku: &str) -> SkuType {
        self.resolver(provider).resolve_type(sku)
    }

    /// Stores with at least one registration.
    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.maps.keys().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{SkuConfig, StoreConfig};

    #[test]
    fn test_stores_are_isolated() {
        let mut registry = SkuRegistry::new();
        registry
            .map_sku(Provider::Amazon, "gold", Some("amzn.gold"), SkuType::Consumable)
            .unwrap();
        registry
            .map_sku(Provider::Fortumo, "gold", Some("svc-42"), SkuType::Consumable)
            .unwrap();

        assert_eq!(registry.resolve(Provider::Amazon, "gold"), "amzn.gold");
        assert_eq!(registry.resolve(Provider::Fortumo, "gold"), "svc-42");
        assert_eq!(registry.revert(Provider::Fortumo, "svc-42"), "gold");
        assert_eq!(registry.revert(Provider::Amazon, "svc-42"), "svc-42");
    }

    #[test]
    fn test_unconfigured_store_is_identity() {
        let registry = SkuRegistry::new();
        assert_eq!(registry.resolve(Provider::GooglePlay, "gold"), "gold");
        assert_eq!(
            registry.resolve_type(Provider::GooglePlay, "gold"),
            SkuType::Unknown
        );
        assert_eq!(registry.providers().count(), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = BillingConfig::default();
        config.providers.insert(
            Provider::Amazon,
            StoreConfig {
                skus: vec![
                    SkuConfig {
                        sku: "gold".to_string(),
                        provider_sku: Some("amzn.gold".to_string()),
                        sku_type: SkuType::Consumable,
                    },
                    SkuConfig {
                        sku: "pro".to_string(),
                        provider_sku: None,
                        sku_type: SkuType::Entitlement,
                    },
                ],
                ..StoreConfig::default()
            },
        );

        let registry = SkuRegistry::from_config(&config).unwrap();
        assert_eq!(registry.resolve(Provider::Amazon, "gold"), "amzn.gold");
        assert_eq!(
            registry.resolve_type(Provider::Amazon, "amzn.gold"),
            SkuType::Consumable
        );
        assert_eq!(
            registry.resolve_type(Provider::Amazon, "pro"),
            SkuType::Entitlement
        );
        assert_eq!(registry.providers().collect::<Vec<_>>(), vec![Provider::Amazon]);
    }

    #[test]
    fn test_from_config_reports_conflict_with_store() {
        let mut config = BillingConfig::default();
        let dup = SkuConfig {
            sku: "gold".to_string(),
            provider_sku: None,
            sku_type: SkuType::Consumable,
        };
        config.providers.insert(
            Provider::Aptoide,
            StoreConfig {
                skus: vec![dup.clone(), dup],
                ..StoreConfig::default()
            },
        );

        let err = SkuRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("aptoide"));
    }
}
