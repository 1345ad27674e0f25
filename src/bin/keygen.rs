//! RSA keypair generator for local receipt signing.
//!
//! Produces a key pair in the same shape stores use, so receipts can be
//! signed with `iab-tool sign` and verified against the printed public key:
//! - Private key saved as PKCS#8 PEM
//! - Public key printed as Base64 DER, ready for `public_key` in config
//!
//! Usage:
//!   cargo run --bin iab-keygen [output-dir]

use color_eyre::eyre::WrapErr;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use std::env;
use std::fs;
use std::path::PathBuf;
use unified_iab::verify::encode_public_key;

/// Modulus size used by Google Play license keys.
const KEY_BITS: usize = 2048;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    println!("RSA Keypair Generator for unified-iab receipt signing\n");

    // Get output directory from args or use current directory
    let output_dir = match env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir().wrap_err("failed to get current directory")?,
    };
    fs::create_dir_all(&output_dir).wrap_err("failed to create output directory")?;

    println!("Generating RSA-{KEY_BITS} keypair...");
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), KEY_BITS)
        .wrap_err("key generation failed")?;
    let public_b64 = encode_public_key(&private_key.to_public_key())?;

    // Save private key (KEEP THIS SECURE!)
    let pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .wrap_err("failed to encode private key")?;
    let sk_path = output_dir.join("receipt-signing-key.pem");
    fs::write(&sk_path, pem.as_bytes()).wrap_err("failed to write private key")?;
    println!("\nPrivate key saved to: {}", sk_path.display());
    println!("  WARNING: Keep this file secure! Anyone holding it can forge receipts.");

    let pk_path = output_dir.join("receipt-signing-key.pub");
    fs::write(&pk_path, &public_b64).wrap_err("failed to write public key")?;
    println!("Public key saved to: {}", pk_path.display());

    println!("\n--- config.toml ---\n");
    println!("[providers.open_store]");
    println!("public_key = \"{public_b64}\"");
    Ok(())
}
