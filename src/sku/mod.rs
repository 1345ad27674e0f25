//! SKU resolution between application and store namespaces.
//!
//! Every store names its products differently: Amazon uses its own SKUs,
//! Fortumo uses service IDs, and so on. The application always talks in its
//! own SKU vocabulary and a resolver translates at the store boundary.
//!
//! Resolution never fails. A SKU without a registered mapping resolves to
//! itself and has type [`SkuType::Unknown`], so an unregistered product never
//! breaks a purchase flow.

mod registry;
mod resolver;

pub use registry::SkuRegistry;
pub use resolver::{IdentityResolver, SkuEntry, SkuMap};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared kind of a purchasable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuType {
    /// Must be consumed before it can be bought again.
    Consumable,
    /// Non-consumable; owned forever once granted.
    Entitlement,
    /// Recurring subscription.
    Subscription,
    /// Never registered.
    #[default]
    Unknown,
}

impl SkuType {
    /// Returns true if purchases of this type should be consumed after delivery.
    #[must_use]
    pub fn is_consumable(&self) -> bool {
        matches!(self, Self::Consumable)
    }
}

impl fmt::Display for SkuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Consumable => "consumable",
            Self::Entitlement => "entitlement",
            Self::Subscription => "subscription",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A third-party billing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Google Play in-app billing.
    GooglePlay,
    /// Amazon Appstore in-app purchasing.
    Amazon,
    /// Aptoide store.
    Aptoide,
    /// Fortumo carrier billing.
    Fortumo,
    /// Generic OpenStore-protocol store.
    OpenStore,
}

impl Provider {
    /// All known providers.
    pub const ALL: [Self; 5] = [
        Self::GooglePlay,
        Self::Amazon,
        Self::Aptoide,
        Self::Fortumo,
        Self::OpenStore,
    ];

    /// Stable name used in configuration files and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GooglePlay => "google_play",
            Self::Amazon => "amazon",
            Self::Aptoide => "aptoide",
            Self::Fortumo => "fortumo",
            Self::OpenStore => "open_store",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| crate::Error::Config(format!("unknown provider '{s}'")))
    }
}

/// Bidirectional translation between application and store SKUs.
pub trait SkuResolver: Send + Sync {
    /// Store SKU for `sku`, or `sku` itself when no mapping exists.
    fn resolve<'a>(&'a self, sku: &'a str) -> &'a str;

    /// Application SKU for `provider_sku`, or the input when no mapping exists.
    fn revert<'a>(&'a self, provider_sku: &'a str) -> &'a str;
}

/// A resolver that also knows the declared type of each SKU.
pub trait TypedSkuResolver: SkuResolver {
    /// Declared type of `sku`, which may be either an application or a
    /// store SKU. [`SkuType::Unknown`] if never registered.
    fn resolve_type(&self, sku: &str) -> SkuType;
}
