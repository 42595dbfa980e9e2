use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    config::DecodeLimits,
    data::{
        datasources::signed_envelope_datasource::{
            SignedEnvelopeDatasource, SignedEnvelopeDatasourceImpl,
        },
        decoders::receipt_payload_decoder::decode_receipt_payload,
    },
    domain::{
        entities::{receipt::Receipt, trust_anchor::TrustAnchor},
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::ReceiptError,
};

pub struct ReceiptRepositoryImpl<S: SignedEnvelopeDatasource> {
    signed_envelope_datasource: S,
    trust_anchor: Arc<TrustAnchor>,
    limits: DecodeLimits,
}

impl<S: SignedEnvelopeDatasource> ReceiptRepository for ReceiptRepositoryImpl<S> {
    #[instrument(skip_all)]
    fn parse_receipt(
        &self,
        data: &[u8],
        expected_bundle_id: &str,
    ) -> Result<Receipt, ReceiptError> {
        let content = self
            .signed_envelope_datasource
            .verify_envelope(data, &self.trust_anchor)?;
        let receipt = decode_receipt_payload(&content, self.limits.max_depth)?;
        if receipt.bundle_id.as_deref() != Some(expected_bundle_id) {
            return Err(ReceiptError::IdentityMismatch {
                found: receipt.bundle_id,
            });
        }
        debug!(
            in_app_purchases = receipt.in_app_purchases.len(),
            "receipt decoded"
        );
        Ok(receipt)
    }
}

impl ReceiptRepositoryImpl<SignedEnvelopeDatasourceImpl> {
    pub(crate) fn new(trust_anchor: Arc<TrustAnchor>, limits: DecodeLimits) -> Self {
        Self {
            signed_envelope_datasource: SignedEnvelopeDatasourceImpl::new(limits),
            trust_anchor,
            limits,
        }
    }
}
