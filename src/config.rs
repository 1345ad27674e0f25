//! Configuration for unified-iab.
//!
//! ```toml
//! log_level = "info"
//! verify_mode = "everything"
//! cache_capacity = 10000
//!
//! [providers.google_play]
//! public_key = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA..."
//!
//! [[providers.google_play.skus]]
//! sku = "gold_100"
//! provider_sku = "com.app.gold100"
//! type = "consumable"
//! ```

use crate::sku::{Provider, SkuType};
use crate::verify::{SignatureAlgorithm, VerifyMode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level billing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Which purchases get verified.
    #[serde(default)]
    pub verify_mode: VerifyMode,

    /// Capacity of the verification outcome cache (0 disables caching).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Per-store settings.
    #[serde(
        default,
        serialize_with = "serialize_providers",
        deserialize_with = "deserialize_providers"
    )]
    pub providers: BTreeMap<Provider, StoreConfig>,
}

/// Settings for one store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base64 DER (X.509 SubjectPublicKeyInfo) RSA key published by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Signature scheme used by the store.
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,

    /// SKU registrations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skus: Vec<SkuConfig>,
}

/// One SKU registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuConfig {
    /// Application SKU.
    pub sku: String,

    /// Store SKU; omitted for identity mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_sku: Option<String>,

    /// Declared type.
    #[serde(rename = "type", default)]
    pub sku_type: SkuType,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            verify_mode: VerifyMode::default(),
            cache_capacity: default_cache_capacity(),
            providers: BTreeMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_cache_capacity() -> usize {
    10_000
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "unified-iab")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("unified-iab.toml"))
}

// Provider keys are written with their stable names so that an unknown store
// is reported by name rather than as a generic enum error.
fn serialize_providers<S>(
    providers: &BTreeMap<Provider, StoreConfig>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let named: BTreeMap<&str, &StoreConfig> =
        providers.iter().map(|(p, c)| (p.as_str(), c)).collect();
    named.serialize(serializer)
}

fn deserialize_providers<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<Provider, StoreConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let named = BTreeMap::<String, StoreConfig>::deserialize(deserializer)?;
    named
        .into_iter()
        .map(|(name, store)| {
            name.parse::<Provider>()
                .map(|p| (p, store))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

impl BillingConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings for `provider`, if configured.
    #[must_use]
    pub fn store(&self, provider: Provider) -> Option<&StoreConfig> {
        self.providers.get(&provider)
    }
}
