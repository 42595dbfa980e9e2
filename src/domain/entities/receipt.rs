use std::fmt;

use chrono::{DateTime, Utc};
use openssl::sha::Sha1;
use serde::Serialize;
use serde_with::{base64::Base64, serde_as};

use super::purchase_record::{FieldList, PurchaseRecord};

/// A verified, decoded App Store receipt.
///
/// https://developer.apple.com/library/archive/releasenotes/General/ValidateAppStoreReceipt/Chapters/ReceiptFields.html
///
/// No field is validated beyond its encoding, and any of them may be missing.
/// Multiple in-app purchases may be present in a single receipt.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub receipt_type: Option<String>,
    pub app_item_id: Option<i64>,
    /// The app's bundle identifier.
    pub bundle_id: Option<String>,
    /// The app's version number (CFBundleVersion).
    pub application_version: Option<String>,
    /// An opaque value used, with other data, to compute the SHA-1 hash
    /// during validation.
    #[serde_as(as = "Option<Base64>")]
    pub opaque_value: Option<Vec<u8>>,
    /// A SHA-1 hash, used to validate the receipt.
    #[serde_as(as = "Option<Base64>")]
    pub sha1_hash: Option<Vec<u8>>,
    /// The date when the app receipt was created.
    pub receipt_creation_date: Option<DateTime<Utc>>,
    pub download_id: Option<i64>,
    pub version_external_identifier: Option<i64>,
    /// The in-app purchase receipts, in the order they appear in the receipt.
    pub in_app_purchases: Vec<PurchaseRecord>,
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The version of the app that was originally purchased.
    pub original_application_version: Option<String>,
    /// The date that the app receipt expires. Only set for receipts of apps
    /// purchased through the Volume Purchase Program.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Encoded bytes of the bundle identifier, as hashed by the storefront.
    #[serde(skip)]
    pub bundle_id_data: Option<Vec<u8>>,
}

impl Receipt {
    /// Checks that the receipt was issued for the device with the given
    /// identifier (`identifierForVendor` on iOS, the primary MAC address on
    /// macOS).
    ///
    /// Returns `false` if the receipt lacks any of the hashed fields.
    pub fn matches_device(&self, device_identifier: &[u8]) -> bool {
        let (Some(opaque_value), Some(bundle_id_data), Some(expected)) = (
            self.opaque_value.as_deref(),
            self.bundle_id_data.as_deref(),
            self.sha1_hash.as_deref(),
        ) else {
            return false;
        };
        let mut hasher = Sha1::new();
        hasher.update(device_identifier);
        hasher.update(opaque_value);
        hasher.update(bundle_id_data);
        hasher.finish().as_slice() == expected
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = FieldList::new(f);
        fields.entry("receipt_type", self.receipt_type.as_ref())?;
        fields.entry("app_item_id", self.app_item_id.as_ref())?;
        fields.entry("bundle_id", self.bundle_id.as_ref())?;
        fields.entry("application_version", self.application_version.as_ref())?;
        fields.timestamp("receipt_creation_date", self.receipt_creation_date.as_ref())?;
        fields.entry("download_id", self.download_id.as_ref())?;
        fields.entry(
            "version_external_identifier",
            self.version_external_identifier.as_ref(),
        )?;
        fields.timestamp("original_purchase_date", self.original_purchase_date.as_ref())?;
        fields.entry(
            "original_application_version",
            self.original_application_version.as_ref(),
        )?;
        fields.timestamp("expiration_date", self.expiration_date.as_ref())?;
        fields.write("in_app", &InAppList(&self.in_app_purchases))
    }
}

struct InAppList<'a>(&'a [PurchaseRecord]);

impl fmt::Display for InAppList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, purchase) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{{{purchase}}}")?;
        }
        f.write_str("]")
    }
}
