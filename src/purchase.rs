//! Shared purchase model.
//!
//! Store adapters translate their receipts into [`Purchase`]; the verifier
//! reads only [`Purchase::original_json`] (or another signed field) and
//! [`Purchase::signature`].

use crate::error::{Error, Result};
use crate::sku::{Provider, SkuType};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a purchase as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    /// Paid and not reversed.
    #[default]
    Purchased,
    /// Cancelled before completion.
    Canceled,
    /// Refunded after completion.
    Refunded,
}

impl TryFrom<i64> for PurchaseState {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Purchased),
            1 => Ok(Self::Canceled),
            2 => Ok(Self::Refunded),
            other => Err(Error::InvalidPurchase(format!(
                "unrecognised purchase state {other}"
            ))),
        }
    }
}

/// A completed (or reversed) purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Purchase {
    /// Kind of product bought.
    pub item_type: SkuType,
    /// SKU the purchase is for.
    pub sku: String,
    /// Store order identifier.
    pub order_id: String,
    /// Application package name.
    pub package_name: String,
    /// Purchase time in milliseconds since the Unix epoch.
    pub purchase_time: i64,
    /// Current state.
    pub purchase_state: PurchaseState,
    /// Opaque payload supplied by the application at purchase time.
    pub developer_payload: String,
    /// Token identifying the purchase for consumption.
    pub token: String,
    /// Receipt exactly as delivered by the store.
    pub original_json: String,
    /// Store signature over the receipt. `None` for stores that do not sign.
    pub signature: Option<String>,
    /// Store the purchase came from.
    pub provider: Option<Provider>,
}

/// Receipt fields in the Google Play wire format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    package_name: String,
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    purchase_time: i64,
    #[serde(default)]
    purchase_state: i64,
    #[serde(default)]
    developer_payload: String,
    #[serde(default)]
    purchase_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl Purchase {
    /// A signed purchase carrying only its receipt and signature.
    #[must_use]
    pub fn signed(original_json: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            original_json: original_json.into(),
            signature: Some(signature.into()),
            ..Self::default()
        }
    }

    /// An unsigned purchase carrying only its receipt.
    #[must_use]
    pub fn unsigned(original_json: impl Into<String>) -> Self {
        Self {
            original_json: original_json.into(),
            ..Self::default()
        }
    }

    /// Parse a Google-Play-style JSON receipt.
    ///
    /// The JSON text is kept verbatim in [`Purchase::original_json`] because
    /// the store signature covers those exact bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPurchase`] if the text is not a JSON receipt or
    /// carries an unknown purchase state.
    pub fn from_receipt_json(
        item_type: SkuType,
        json: &str,
        signature: Option<&str>,
    ) -> Result<Self> {
        let receipt: Receipt = serde_json::from_str(json)
            .map_err(|e| Error::InvalidPurchase(format!("malformed receipt: {e}")))?;

        Ok(Self {
            item_type,
            sku: receipt.product_id,
            order_id: receipt.order_id,
            package_name: receipt.package_name,
            purchase_time: receipt.purchase_time,
            purchase_state: PurchaseState::try_from(receipt.purchase_state)?,
            developer_payload: receipt.developer_payload,
            token: receipt.token.or(receipt.purchase_token).unwrap_or_default(),
            original_json: json.to_string(),
            signature: signature.map(str::to_string),
            provider: None,
        })
    }

    /// Tag the purchase with the store it came from.
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Copy of this purchase with `sku` replaced, used when translating
    /// store SKUs back to application SKUs.
    #[must_use]
    pub fn with_sku(&self, sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..self.clone()
        }
    }

    /// Returns true if the store attached a signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const RECEIPT: &str = r#"{"orderId":"GPA.1234-5678","packageName":"com.example.app","productId":"com.app.gold100","purchaseTime":1345678900000,"purchaseState":0,"developerPayload":"bGoa+V7g/yqDXvKRqq+JTFn4uQZbPiQJo4pf9RzJ","purchaseToken":"opaque-token-up-to-1000-characters"}"#;

    #[test]
    fn test_parse_receipt() {
        let purchase =
            Purchase::from_receipt_json(SkuType::Consumable, RECEIPT, Some("c2ln")).unwrap();

        assert_eq!(purchase.item_type, SkuType::Consumable);
        assert_eq!(purchase.sku, "com.app.gold100");
        assert_eq!(purchase.order_id, "GPA.1234-5678");
        assert_eq!(purchase.package_name, "com.example.app");
        assert_eq!(purchase.purchase_time, 1_345_678_900_000);
        assert_eq!(purchase.purchase_state, PurchaseState::Purchased);
        assert_eq!(purchase.token, "opaque-token-up-to-1000-characters");
        assert_eq!(purchase.original_json, RECEIPT);
        assert_eq!(purchase.signature.as_deref(), Some("c2ln"));
        assert!(purchase.is_signed());
    }

    #[test]
    fn test_token_field_preferred() {
        let json = r#"{"productId":"x","token":"t1","purchaseToken":"t2"}"#;
        let purchase = Purchase::from_receipt_json(SkuType::Unknown, json, None).unwrap();
        assert_eq!(purchase.token, "t1");
        assert!(!purchase.is_signed());
    }

    #[test]
    fn test_purchase_state_codes() {
        assert_eq!(PurchaseState::try_from(1).unwrap(), PurchaseState::Canceled);
        assert_eq!(PurchaseState::try_from(2).unwrap(), PurchaseState::Refunded);
        assert!(PurchaseState::try_from(7).is_err());

        let json = r#"{"productId":"x","purchaseState":9}"#;
        let result = Purchase::from_receipt_json(SkuType::Unknown, json, None);
        assert!(matches!(result, Err(Error::InvalidPurchase(_))));
    }

    #[test]
    fn test_malformed_receipt() {
        let result = Purchase::from_receipt_json(SkuType::Unknown, "not json", None);
        assert!(matches!(result, Err(Error::InvalidPurchase(_))));
    }

    #[test]
    fn test_with_sku_keeps_receipt() {
        let purchase = Purchase::from_receipt_json(SkuType::Consumable, RECEIPT, Some("c2ln"))
            .unwrap()
            .with_provider(Provider::GooglePlay);
        let reverted = purchase.with_sku("gold_100");

        assert_eq!(reverted.sku, "gold_100");
        assert_eq!(reverted.original_json, purchase.original_json);
        assert_eq!(reverted.signature, purchase.signature);
        assert_eq!(reverted.provider, Some(Provider::GooglePlay));
    }
}
