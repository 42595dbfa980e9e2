use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    config::{Config, DecodeLimits},
    data::{
        datasources::signed_envelope_datasource::SignedEnvelopeDatasourceImpl,
        repositories::receipt_repository_impl::ReceiptRepositoryImpl,
    },
    domain::{
        entities::{receipt::Receipt, trust_anchor::TrustAnchor},
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::ReceiptError,
};

/// Receipt verifier backed by the built-in CMS envelope verification.
pub type DefaultReceiptUtil = ReceiptUtil<ReceiptRepositoryImpl<SignedEnvelopeDatasourceImpl>>;

/// Entry point for verifying and decoding App Store receipts.
///
/// Stateless apart from its trust anchor and limits; share one instance
/// across threads.
pub struct ReceiptUtil<R: ReceiptRepository> {
    receipt_repository: R,
}

impl<R: ReceiptRepository> ReceiptUtil<R> {
    pub fn parse_receipt(
        &self,
        data: &[u8],
        expected_bundle_id: &str,
    ) -> Result<Receipt, ReceiptError> {
        self.receipt_repository
            .parse_receipt(data, expected_bundle_id)
    }

    /// Same as [`Self::parse_receipt`], for receipts transported as base64
    /// text (standard alphabet, surrounding whitespace ignored).
    pub fn parse_base64_receipt(
        &self,
        encoded: &str,
        expected_bundle_id: &str,
    ) -> Result<Receipt, ReceiptError> {
        let data = STANDARD.decode(encoded.trim())?;
        self.parse_receipt(&data, expected_bundle_id)
    }
}

impl ReceiptUtil<ReceiptRepositoryImpl<SignedEnvelopeDatasourceImpl>> {
    pub fn new(trust_anchor: TrustAnchor) -> Self {
        Self::with_limits(Arc::new(trust_anchor), DecodeLimits::default())
    }

    pub fn with_limits(trust_anchor: Arc<TrustAnchor>, limits: DecodeLimits) -> Self {
        Self {
            receipt_repository: ReceiptRepositoryImpl::new(trust_anchor, limits),
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::with_limits(config.trust_anchor, config.limits)
    }
}
