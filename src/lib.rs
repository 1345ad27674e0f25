//! # unified-iab
//!
//! Provider-agnostic core of a unified in-app billing API.
//!
//! Applications talk to one billing API while purchases are fulfilled by a
//! third-party store (Google Play, Amazon, Aptoide, Fortumo or an OpenStore).
//! Two pieces of that abstraction carry real logic and live here:
//!
//! - **SKU resolution** ([`sku`]): translate application SKUs to and from
//!   each store's own identifiers, and remember what kind of product each
//!   SKU is.
//! - **Purchase verification** ([`verify`]): classify a purchase as
//!   authentic or not, most importantly by checking the store's RSA
//!   signature over the original receipt.
//!
//! ```text
//!  app SKU ──resolve──► store SKU ──► store request
//!                                         │
//!  app SKU ◄──revert─── store SKU ◄── purchase response
//!                                         │
//!                                  verify(purchase)
//!                                         │
//!                     Success / Failed / Error / Unknown
//! ```
//!
//! Request dispatch, vendor receipt formats and platform lifecycle glue are
//! left to the embedding application.

pub mod config;
pub mod error;
pub mod purchase;
pub mod sku;
pub mod verify;

pub use config::BillingConfig;
pub use error::{Error, Result};
pub use purchase::{Purchase, PurchaseState};
pub use sku::{
    IdentityResolver, Provider, SkuMap, SkuRegistry, SkuResolver, SkuType, TypedSkuResolver,
};
pub use verify::{
    AcceptAll, CachedVerifier, PublicKeyVerifier, PurchaseVerifier, SignatureAlgorithm,
    Unverifiable, VerificationPolicy, VerificationResult, VerifyMode,
};
