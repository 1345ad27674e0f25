//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use unified_iab::config::default_config_path;
use unified_iab::{BillingConfig, Provider, SignatureAlgorithm};

/// Inspect SKU mappings and verify store purchases.
#[derive(Parser, Debug)]
#[command(name = "iab-tool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long, short, env = "IAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level; overrides `log_level` from the configuration file.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate an application SKU to the store SKU.
    Resolve {
        /// Store.
        #[arg(value_enum)]
        provider: CliProvider,
        /// Application SKU.
        sku: String,
    },

    /// Translate a store SKU back to the application SKU.
    Revert {
        /// Store.
        #[arg(value_enum)]
        provider: CliProvider,
        /// Store SKU.
        provider_sku: String,
    },

    /// Print the declared type of a SKU.
    Type {
        /// Store.
        #[arg(value_enum)]
        provider: CliProvider,
        /// Application or store SKU.
        sku: String,
    },

    /// Verify a purchase receipt. Exits non-zero unless it verifies.
    Verify {
        /// Store the receipt came from.
        #[arg(value_enum)]
        provider: CliProvider,
        /// File holding the receipt exactly as delivered.
        #[arg(long)]
        data: PathBuf,
        /// Base64 signature.
        #[arg(long, conflicts_with = "signature_file")]
        signature: Option<String>,
        /// File holding the Base64 signature.
        #[arg(long)]
        signature_file: Option<PathBuf>,
    },

    /// Sign a receipt with a private key, as a store would.
    Sign {
        /// PKCS#8 PEM private key.
        #[arg(long)]
        key: PathBuf,
        /// File holding the receipt.
        #[arg(long)]
        data: PathBuf,
        /// Signature scheme.
        #[arg(long, value_enum, default_value = "sha1")]
        algorithm: CliAlgorithm,
    },

    /// Load the configuration and report any problem.
    CheckConfig,
}

/// Store CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliProvider {
    /// Google Play.
    GooglePlay,
    /// Amazon Appstore.
    Amazon,
    /// Aptoide.
    Aptoide,
    /// Fortumo.
    Fortumo,
    /// OpenStore.
    OpenStore,
}

/// Signature scheme CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliAlgorithm {
    /// SHA-1 with RSA.
    Sha1,
    /// SHA-256 with RSA.
    Sha256,
}

impl Cli {
    /// Load the configuration named on the command line, falling back to the
    /// default location, then to built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn load_config(&self) -> color_eyre::Result<BillingConfig> {
        let path = match self.config {
            Some(ref path) => path.clone(),
            None => {
                let path = default_config_path();
                if !path.exists() {
                    return Ok(BillingConfig::default());
                }
                path
            }
        };
        tracing::debug!("Loading configuration from {}", path.display());
        Ok(BillingConfig::from_file(&path)?)
    }
}

impl Cli {
    /// Log filter to use: the command line wins over the configuration file.
    #[must_use]
    pub fn log_filter<'a>(&'a self, config: &'a BillingConfig) -> &'a str {
        self.log_level.as_deref().unwrap_or(&config.log_level)
    }
}

impl From<CliProvider> for Provider {
    fn from(p: CliProvider) -> Self {
        match p {
            CliProvider::GooglePlay => Provider::GooglePlay,
            CliProvider::Amazon => Provider::Amazon,
            CliProvider::Aptoide => Provider::Aptoide,
            CliProvider::Fortumo => Provider::Fortumo,
            CliProvider::OpenStore => Provider::OpenStore,
        }
    }
}

impl From<CliAlgorithm> for SignatureAlgorithm {
    fn from(a: CliAlgorithm) -> Self {
        match a {
            CliAlgorithm::Sha1 => SignatureAlgorithm::Sha1WithRsa,
            CliAlgorithm::Sha256 => SignatureAlgorithm::Sha256WithRsa,
        }
    }
}
