use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// One in-app purchase transaction embedded in a receipt.
///
/// Every field is optional: the storefront may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurchaseRecord {
    /// The number of items purchased.
    pub quantity: Option<i64>,
    /// The product identifier of the item that was purchased.
    pub product_id: Option<String>,
    /// The transaction identifier of the item that was purchased.
    pub transaction_id: Option<String>,
    /// The time the App Store charged the user's account.
    pub purchase_date: Option<DateTime<Utc>>,
    /// For a transaction that restores a previous transaction, the
    /// transaction identifier of the original transaction.
    pub original_transaction_id: Option<String>,
    /// For a transaction that restores a previous transaction, the date of the
    /// original transaction.
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The expiration date for the subscription. Only present for
    /// auto-renewable subscriptions.
    pub expires_date: Option<DateTime<Utc>>,
    /// The primary key for identifying subscription purchases.
    pub web_order_line_item_id: Option<i64>,
    /// For a transaction that was canceled by Apple customer support, the time
    /// and date of the cancellation.
    pub cancellation_date: Option<DateTime<Utc>>,
}

impl fmt::Display for PurchaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = FieldList::new(f);
        fields.entry("quantity", self.quantity.as_ref())?;
        fields.entry("product_id", self.product_id.as_ref())?;
        fields.entry("transaction_id", self.transaction_id.as_ref())?;
        fields.timestamp("purchase_date", self.purchase_date.as_ref())?;
        fields.entry("original_transaction_id", self.original_transaction_id.as_ref())?;
        fields.timestamp("original_purchase_date", self.original_purchase_date.as_ref())?;
        fields.timestamp("expires_date", self.expires_date.as_ref())?;
        fields.entry("web_order_line_item_id", self.web_order_line_item_id.as_ref())?;
        fields.timestamp("cancellation_date", self.cancellation_date.as_ref())
    }
}

/// Writes `key: value` pairs separated by `, `, skipping absent values.
pub(crate) struct FieldList<'f, 'b> {
    f: &'f mut fmt::Formatter<'b>,
    first: bool,
}

impl<'f, 'b> FieldList<'f, 'b> {
    pub(crate) fn new(f: &'f mut fmt::Formatter<'b>) -> Self {
        Self { f, first: true }
    }

    pub(crate) fn entry(&mut self, key: &str, value: Option<&impl fmt::Display>) -> fmt::Result {
        match value {
            Some(value) => self.write(key, value),
            None => Ok(()),
        }
    }

    pub(crate) fn timestamp(&mut self, key: &str, value: Option<&DateTime<Utc>>) -> fmt::Result {
        match value {
            Some(value) => self.write(key, &value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => Ok(()),
        }
    }

    pub(crate) fn write(&mut self, key: &str, value: &dyn fmt::Display) -> fmt::Result {
        if !self.first {
            self.f.write_str(", ")?;
        }
        self.first = false;
        write!(self.f, "{key}: {value}")
    }
}
