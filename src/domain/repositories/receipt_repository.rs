use crate::{domain::entities::receipt::Receipt, errors::ReceiptError};

pub trait ReceiptRepository: Send + Sync {
    /// Verifies the signed envelope, decodes the receipt it carries and checks
    /// it was issued for `expected_bundle_id`.
    ///
    /// data:
    ///   The raw receipt file, as found in the app bundle's
    ///   `appStoreReceiptURL`.
    fn parse_receipt(&self, data: &[u8], expected_bundle_id: &str)
        -> Result<Receipt, ReceiptError>;
}
