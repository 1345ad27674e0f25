//! iab-tool CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use color_eyre::eyre::{bail, WrapErr};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use unified_iab::verify::sign_receipt;
use unified_iab::{Purchase, SkuRegistry, VerificationPolicy, VerificationResult};

fn main() -> color_eyre::Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = cli.load_config()?;

    // Initialize tracing
    let filter = EnvFilter::new(cli.log_filter(&config));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("iab-tool v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Resolve { provider, sku } => {
            let registry = SkuRegistry::from_config(&config)?;
            println!("{}", registry.resolve(provider.into(), &sku));
        }
        Command::Revert {
            provider,
            provider_sku,
        } => {
            let registry = SkuRegistry::from_config(&config)?;
            println!("{}", registry.revert(provider.into(), &provider_sku));
        }
        Command::Type { provider, sku } => {
            let registry = SkuRegistry::from_config(&config)?;
            println!("{}", registry.resolve_type(provider.into(), &sku));
        }
        Command::Verify {
            provider,
            data,
            signature,
            signature_file,
        } => {
            let policy = VerificationPolicy::from_config(&config)?;
            let receipt = std::fs::read_to_string(&data)
                .wrap_err_with(|| format!("failed to read {}", data.display()))?;
            let signature = match (signature, signature_file) {
                (Some(sig), _) => Some(sig),
                (None, Some(path)) => Some(
                    std::fs::read_to_string(&path)
                        .wrap_err_with(|| format!("failed to read {}", path.display()))?,
                ),
                (None, None) => None,
            };
            let purchase = match signature {
                Some(sig) => Purchase::signed(receipt, sig),
                None => Purchase::unsigned(receipt),
            };

            let result = policy.verify(provider.into(), &purchase);
            println!("{result}");
            if result != VerificationResult::Success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Sign {
            key,
            data,
            algorithm,
        } => {
            let pem = std::fs::read_to_string(&key)
                .wrap_err_with(|| format!("failed to read {}", key.display()))?;
            let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
                .wrap_err("private key is not PKCS#8 PEM")?;
            let receipt = std::fs::read(&data)
                .wrap_err_with(|| format!("failed to read {}", data.display()))?;
            println!(
                "{}",
                sign_receipt(&private_key, algorithm.into(), &receipt)?
            );
        }
        Command::CheckConfig => {
            let registry = SkuRegistry::from_config(&config)?;
            let policy = VerificationPolicy::from_config(&config)?;
            if config.providers.is_empty() {
                bail!("no providers configured");
            }
            for provider in config.providers.keys() {
                println!(
                    "{provider}: {} SKUs, verifier={}",
                    config.providers[provider].skus.len(),
                    if policy.has_verifier(*provider) { "public key" } else { "default" }
                );
            }
            println!(
                "ok ({} stores with SKU mappings, mode {:?})",
                registry.providers().count(),
                policy.mode()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
