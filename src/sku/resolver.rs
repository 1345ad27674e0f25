//! Resolver implementations: identity and registered mappings.

use super::{SkuResolver, SkuType, TypedSkuResolver};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// Zero-configuration resolver: every SKU maps to itself and is `Unknown`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IdentityResolver;

impl IdentityResolver {
    /// Create an identity resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SkuResolver for IdentityResolver {
    fn resolve<'a>(&'a self, sku: &'a str) -> &'a str {
        sku
    }

    fn revert<'a>(&'a self, provider_sku: &'a str) -> &'a str {
        provider_sku
    }
}

impl TypedSkuResolver for IdentityResolver {
    fn resolve_type(&self, _sku: &str) -> SkuType {
        SkuType::Unknown
    }
}

/// One registration as seen through [`SkuMap::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkuEntry<'a> {
    /// Application SKU.
    pub sku: &'a str,
    /// Store SKU; equal to `sku` for identity registrations.
    pub provider_sku: &'a str,
    /// Declared type.
    pub sku_type: SkuType,
}

/// Registered SKU mappings for a single store.
///
/// Populate with [`SkuMap::add`] during setup, then share immutably. Every
/// identifier (application or store SKU) can belong to one registration
/// only; a second registration touching a taken identifier is rejected.
#[derive(Debug, Default, Clone)]
pub struct SkuMap {
    /// Application SKU -> store SKU.
    forward: HashMap<String, String>,
    /// Store SKU -> application SKU.
    reverse: HashMap<String, String>,
    /// Type of every registered key, application and store SKUs alike.
    types: HashMap<String, SkuType>,
}

impl SkuMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sku` with its store identifier and type.
    ///
    /// A `provider_sku` that is absent, empty or equal to `sku` registers an
    /// identity mapping: only the type is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSku`] if `sku` is empty, and
    /// [`Error::SkuConflict`] if `sku` or `provider_sku` is already used by an
    /// earlier registration. The map is unchanged on error.
    pub fn add(&mut self, sku: &str, provider_sku: Option<&str>, sku_type: SkuType) -> Result<()> {
        if sku.is_empty() {
            return Err(Error::InvalidSku("application SKU must not be empty".to_string()));
        }
        let provider_sku = provider_sku.filter(|p| !p.is_empty() && *p != sku);

        self.ensure_free(sku)?;
        if let Some(p) = provider_sku {
            self.ensure_free(p)?;
        }

        self.types.insert(sku.to_string(), sku_type);
        if let Some(p) = provider_sku {
            self.forward.insert(sku.to_string(), p.to_string());
            self.reverse.insert(p.to_string(), sku.to_string());
            self.types.insert(p.to_string(), sku_type);
        }

        debug!(
            "Registered SKU {} -> {} ({})",
            sku,
            provider_sku.unwrap_or(sku),
            sku_type
        );
        Ok(())
    }

    fn ensure_free(&self, key: &str) -> Result<()> {
        if self.types.contains_key(key) {
            return Err(Error::SkuConflict {
                sku: key.to_string(),
                existing: self.revert(key).to_string(),
            });
        }
        Ok(())
    }

    /// Returns true if `sku` is registered, either as application or store SKU.
    #[must_use]
    pub fn contains(&self, sku: &str) -> bool {
        self.types.contains_key(sku)
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len() - self.reverse.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over registrations in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = SkuEntry<'_>> + '_ {
        self.types
            .iter()
            .filter(|(key, _)| !self.reverse.contains_key(key.as_str()))
            .map(|(sku, sku_type)| SkuEntry {
                sku,
                provider_sku: self.forward.get(sku).map_or(sku.as_str(), String::as_str),
                sku_type: *sku_type,
            })
    }
}

impl SkuResolver for SkuMap {
    fn resolve<'a>(&'a self, sku: &'a str) -> &'a str {
        self.forward.get(sku).map_or(sku, String::as_str)
    }

    fn revert<'a>(&'a self, provider_sku: &'a str) -> &'a str {
        self.reverse.get(provider_sku).map_or(provider_sku, String::as_str)
    }
}

impl TypedSkuResolver for SkuMap {
    fn resolve_type(&self, sku: &str) -> SkuType {
        self.types.get(sku).copied().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_resolver() {
        let r = IdentityResolver::new();
        assert_eq!(r.resolve("gold"), "gold");
        assert_eq!(r.revert("gold"), "gold");
        assert_eq!(r.resolve_type("gold"), SkuType::Unknown);
    }

    #[test]
    fn test_mapped_sku_scenario() {
        let mut map = SkuMap::new();
        map.add("gold_100", Some("com.app.gold100"), SkuType::Consumable)
            .unwrap();

        assert_eq!(map.resolve("gold_100"), "com.app.gold100");
        assert_eq!(map.revert("com.app.gold100"), "gold_100");
        assert_eq!(map.resolve_type("gold_100"), SkuType::Consumable);
        assert_eq!(map.resolve_type("com.app.gold100"), SkuType::Consumable);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_identity_registration_stores_type_only() {
        let mut map = SkuMap::new();
        map.add("premium", None, SkuType::Entitlement).unwrap();
        map.add("monthly", Some(""), SkuType::Subscription).unwrap();
        map.add("coins", Some("coins"), SkuType::Consumable).unwrap();

        assert_eq!(map.resolve("premium"), "premium");
        assert_eq!(map.revert("premium"), "premium");
        assert_eq!(map.resolve_type("premium"), SkuType::Entitlement);
        assert_eq!(map.resolve_type("monthly"), SkuType::Subscription);
        assert_eq!(map.resolve("coins"), "coins");
        assert_eq!(map.resolve_type("coins"), SkuType::Consumable);
        assert!(!map.contains(""));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_unregistered_falls_back() {
        let mut map = SkuMap::new();
        map.add("a", Some("store.a"), SkuType::Consumable).unwrap();

        assert_eq!(map.resolve("b"), "b");
        assert_eq!(map.revert("store.b"), "store.b");
        assert_eq!(map.resolve_type("b"), SkuType::Unknown);
    }

    #[test]
    fn test_empty_sku_rejected() {
        let mut map = SkuMap::new();
        let result = map.add("", Some("store.x"), SkuType::Consumable);
        assert!(matches!(result, Err(Error::InvalidSku(_))));
        assert!(map.is_empty());
    }

    #[test]
    fn test_duplicate_application_sku_rejected() {
        let mut map = SkuMap::new();
        map.add("gold", Some("store.gold"), SkuType::Consumable).unwrap();

        let result = map.add("gold", Some("store.gold2"), SkuType::Consumable);
        assert!(matches!(result, Err(Error::SkuConflict { .. })));
        assert_eq!(map.resolve("gold"), "store.gold");
        assert!(!map.contains("store.gold2"));
    }

    #[test]
    fn test_provider_sku_colliding_with_identity_key_rejected() {
        let mut map = SkuMap::new();
        map.add("silver", None, SkuType::Entitlement).unwrap();

        let err = map
            .add("gold", Some("silver"), SkuType::Consumable)
            .unwrap_err();
        match err {
            Error::SkuConflict { sku, existing } => {
                assert_eq!(sku, "silver");
                assert_eq!(existing, "silver");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing from the rejected call leaked in.
        assert!(!map.contains("gold"));
        assert_eq!(map.resolve_type("silver"), SkuType::Entitlement);
    }

    #[test]
    fn test_application_sku_colliding_with_provider_key_rejected() {
        let mut map = SkuMap::new();
        map.add("gold", Some("store.gold"), SkuType::Consumable).unwrap();

        let err = map.add("store.gold", None, SkuType::Entitlement).unwrap_err();
        match err {
            Error::SkuConflict { existing, .. } => assert_eq!(existing, "gold"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shared_provider_sku_rejected() {
        let mut map = SkuMap::new();
        map.add("gold", Some("store.item"), SkuType::Consumable).unwrap();
        assert!(map.add("silver", Some("store.item"), SkuType::Consumable).is_err());
        assert_eq!(map.revert("store.item"), "gold");
    }

    #[test]
    fn test_iter_lists_registrations() {
        let mut map = SkuMap::new();
        map.add("gold", Some("store.gold"), SkuType::Consumable).unwrap();
        map.add("premium", None, SkuType::Entitlement).unwrap();

        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by_key(|e| e.sku);
        assert_eq!(
            entries,
            vec![
                SkuEntry {
                    sku: "gold",
                    provider_sku: "store.gold",
                    sku_type: SkuType::Consumable,
                },
                SkuEntry {
                    sku: "premium",
                    provider_sku: "premium",
                    sku_type: SkuType::Entitlement,
                },
            ]
        );
    }

    fn sku_type_strategy() -> impl Strategy<Value = SkuType> {
        prop_oneof![
            Just(SkuType::Consumable),
            Just(SkuType::Entitlement),
            Just(SkuType::Subscription),
        ]
    }

    proptest! {
        #[test]
        fn prop_unregistered_is_identity(sku in "[a-z0-9_.]{1,24}") {
            let map = SkuMap::new();
            prop_assert_eq!(map.resolve(&sku), sku.as_str());
            prop_assert_eq!(map.revert(&sku), sku.as_str());
            prop_assert_eq!(map.resolve_type(&sku), SkuType::Unknown);
        }

        #[test]
        fn prop_registered_pair_laws(
            sku in "app_[a-z0-9]{1,16}",
            provider_sku in "store\\.[a-z0-9]{1,16}",
            sku_type in sku_type_strategy(),
        ) {
            let mut map = SkuMap::new();
            map.add(&sku, Some(&provider_sku), sku_type).unwrap();

            prop_assert_eq!(map.resolve(&sku), provider_sku.as_str());
            prop_assert_eq!(map.revert(&provider_sku), sku.as_str());
            prop_assert_eq!(map.resolve_type(&sku), sku_type);
            prop_assert_eq!(map.resolve_type(&provider_sku), sku_type);
            prop_assert_eq!(map.revert(map.resolve(&sku)), sku.as_str());
        }

        #[test]
        fn prop_round_trip_over_many(
            skus in proptest::collection::btree_set("[a-z]{1,12}", 1..20),
        ) {
            let mut map = SkuMap::new();
            for (i, sku) in skus.iter().enumerate() {
                let provider_sku = format!("store.{i}.{sku}");
                // Every third SKU is identity-mapped.
                let mapped = (i % 3 != 0).then_some(provider_sku.as_str());
                map.add(sku, mapped, SkuType::Consumable).unwrap();
            }
            for sku in &skus {
                prop_assert_eq!(map.revert(map.resolve(sku)), sku.as_str());
            }
            prop_assert_eq!(map.len(), skus.len());
        }
    }
}
