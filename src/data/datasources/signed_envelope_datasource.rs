use openssl::{
    error::ErrorStack,
    hash::{hash, MessageDigest},
    pkey::Id,
    sign::Verifier,
};
use tracing::{debug, instrument, trace};

use crate::{
    config::DecodeLimits,
    constants::{
        ECDSA_SIGNATURE_OIDS, OID_SHA1, OID_SHA256, OID_SHA384, OID_SHA512, RSA_SIGNATURE_OIDS,
    },
    data::models::pkcs7::{
        certificate_model::CertificateModel, signed_envelope_model::SignedEnvelopeModel,
        signer_info_model::SignerInfoModel,
    },
    domain::entities::trust_anchor::TrustAnchor,
    errors::{EncodingError, ReceiptError},
};

pub trait SignedEnvelopeDatasource: Send + Sync {
    /// Verifies a CMS SignedData envelope against `trust_anchor` and returns
    /// the signed content.
    ///
    /// The envelope is trusted when one of its signers is matched by an
    /// embedded certificate whose key verifies the signature, and that
    /// certificate was issued by an embedded intermediate which in turn was
    /// issued by the trust anchor.
    fn verify_envelope(
        &self,
        data: &[u8],
        trust_anchor: &TrustAnchor,
    ) -> Result<Vec<u8>, ReceiptError>;
}

pub struct SignedEnvelopeDatasourceImpl {
    limits: DecodeLimits,
}

impl SignedEnvelopeDatasource for SignedEnvelopeDatasourceImpl {
    #[instrument(skip_all)]
    fn verify_envelope(
        &self,
        data: &[u8],
        trust_anchor: &TrustAnchor,
    ) -> Result<Vec<u8>, ReceiptError> {
        self.limits.check_input(data)?;
        let envelope = SignedEnvelopeModel::decode(data, self.limits.max_depth)?;
        if envelope.signers.is_empty() {
            return Err(ReceiptError::NoSigner);
        }
        let content = envelope
            .content
            .as_deref()
            .ok_or(EncodingError::MissingElement("encapsulated content"))?;

        let path = find_trust_path(&envelope, content, trust_anchor)
            .ok_or(ReceiptError::SignatureInvalid)?;
        debug!(
            signers = envelope.signers.len(),
            certificates = envelope.certificates.len(),
            signed_attributes = path.signer.signed_attributes.is_some(),
            leaf_serial = %hex(path.leaf.serial_number),
            intermediate_serial = %hex(path.intermediate.serial_number),
            "envelope trusted"
        );
        Ok(content.to_vec())
    }
}

impl SignedEnvelopeDatasourceImpl {
    pub(crate) fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }
}

/// A signer together with the certificates that link it to the trust anchor.
struct TrustPath<'e, 'a> {
    signer: &'e SignerInfoModel<'a>,
    leaf: &'e CertificateModel<'a>,
    intermediate: &'e CertificateModel<'a>,
}

/// First (signer, leaf, intermediate) combination that verifies, in envelope
/// order.
fn find_trust_path<'e, 'a>(
    envelope: &'e SignedEnvelopeModel<'a>,
    content: &[u8],
    trust_anchor: &TrustAnchor,
) -> Option<TrustPath<'e, 'a>> {
    envelope.signers.iter().find_map(|signer| {
        envelope
            .certificates
            .iter()
            .filter(|certificate| certificate.is_identified_by(&signer.identifier))
            .filter(|leaf| signature_matches(signer, leaf, content))
            .find_map(|leaf| {
                find_intermediate(&envelope.certificates, leaf, trust_anchor).map(
                    |intermediate| TrustPath {
                        signer,
                        leaf,
                        intermediate,
                    },
                )
            })
    })
}

/// An embedded certificate that issued `leaf` and was itself issued by the
/// trust anchor. Longer chains are not followed.
fn find_intermediate<'e, 'a>(
    certificates: &'e [CertificateModel<'a>],
    leaf: &CertificateModel<'_>,
    trust_anchor: &TrustAnchor,
) -> Option<&'e CertificateModel<'a>> {
    certificates.iter().find(|candidate| {
        if candidate.subject != leaf.issuer {
            return false;
        }
        let issued_leaf = candidate
            .x509
            .public_key()
            .and_then(|key| leaf.x509.verify(&key))
            .unwrap_or(false);
        if !issued_leaf {
            trace!("intermediate candidate did not issue the signing certificate");
            return false;
        }
        if !trust_anchor.issued(&candidate.x509) {
            trace!("intermediate candidate not issued by the trust anchor");
            return false;
        }
        true
    })
}

fn signature_matches(
    signer: &SignerInfoModel<'_>,
    certificate: &CertificateModel<'_>,
    content: &[u8],
) -> bool {
    match verify_signature(signer, certificate, content) {
        Ok(true) => true,
        Ok(false) => {
            trace!("signature rejected by candidate certificate");
            false
        }
        Err(error) => {
            trace!(%error, "signature verification failed for candidate certificate");
            false
        }
    }
}

fn verify_signature(
    signer: &SignerInfoModel<'_>,
    certificate: &CertificateModel<'_>,
    content: &[u8],
) -> Result<bool, ErrorStack> {
    let Some(digest) = message_digest(signer.digest_algorithm) else {
        trace!("unsupported digest algorithm");
        return Ok(false);
    };
    let key = certificate.x509.public_key()?;
    let Some(expected_key) = key_type(signer.signature_algorithm) else {
        trace!("unsupported signature algorithm");
        return Ok(false);
    };
    if key.id() != expected_key {
        return Ok(false);
    }

    let signed_bytes = match &signer.signed_attributes {
        Some(attributes) => {
            let content_digest = hash(digest, content)?;
            if attributes.message_digest != Some(&*content_digest) {
                trace!("message digest attribute does not match the content");
                return Ok(false);
            }
            attributes.encoded.as_slice()
        }
        None => content,
    };

    let mut verifier = Verifier::new(digest, &key)?;
    verifier.update(signed_bytes)?;
    verifier.verify(signer.signature)
}

fn message_digest(oid: &[u8]) -> Option<MessageDigest> {
    match oid {
        OID_SHA1 => Some(MessageDigest::sha1()),
        OID_SHA256 => Some(MessageDigest::sha256()),
        OID_SHA384 => Some(MessageDigest::sha384()),
        OID_SHA512 => Some(MessageDigest::sha512()),
        _ => None,
    }
}

fn key_type(signature_algorithm: &[u8]) -> Option<Id> {
    let listed = |oids: &[&[u8]]| oids.iter().any(|oid| *oid == signature_algorithm);
    if listed(RSA_SIGNATURE_OIDS) {
        Some(Id::RSA)
    } else if listed(ECDSA_SIGNATURE_OIDS) {
        Some(Id::EC)
    } else {
        None
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
