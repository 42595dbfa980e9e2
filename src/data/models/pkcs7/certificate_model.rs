use openssl::x509::X509;

use crate::{
    data::{
        decoders::der_reader::{context_tag, DerElement, TAG_INTEGER, TAG_SEQUENCE},
        models::pkcs7::signer_info_model::SignerIdentifier,
    },
    errors::EncodingError,
};

/// An embedded certificate, with the encoded names and serial number kept
/// verbatim so they can be compared byte-for-byte against signer identifiers
/// and issuer names.
///
/// ```text
/// Certificate ::= SEQUENCE {
///   tbsCertificate SEQUENCE {
///     version [0] EXPLICIT Version DEFAULT v1,
///     serialNumber INTEGER,
///     signature AlgorithmIdentifier,
///     issuer Name,
///     validity Validity,
///     subject Name,
///     ...
///   },
///   signatureAlgorithm AlgorithmIdentifier,
///   signatureValue BIT STRING
/// }
/// ```
pub(crate) struct CertificateModel<'a> {
    pub(crate) x509: X509,
    pub(crate) serial_number: &'a [u8],
    pub(crate) issuer: &'a [u8],
    pub(crate) subject: &'a [u8],
}

impl<'a> CertificateModel<'a> {
    pub(crate) fn decode(element: DerElement<'a>) -> Result<Self, EncodingError> {
        let mut certificate = element
            .expect_tag(TAG_SEQUENCE, "certificate")?
            .children()?;
        let mut tbs = certificate
            .expect_element("tbsCertificate")?
            .expect_tag(TAG_SEQUENCE, "tbsCertificate")?
            .children()?;
        tbs.read_optional(context_tag(0, true))?;
        let serial_number = tbs
            .expect_element("serialNumber")?
            .expect_tag(TAG_INTEGER, "serialNumber")?
            .value();
        tbs.expect_element("signature")?;
        let issuer = tbs
            .expect_element("issuer")?
            .expect_tag(TAG_SEQUENCE, "issuer")?
            .raw();
        tbs.expect_element("validity")?;
        let subject = tbs
            .expect_element("subject")?
            .expect_tag(TAG_SEQUENCE, "subject")?
            .raw();
        let x509 = X509::from_der(element.raw()).map_err(EncodingError::InvalidCertificate)?;
        Ok(Self {
            x509,
            serial_number,
            issuer,
            subject,
        })
    }

    pub(crate) fn is_identified_by(&self, identifier: &SignerIdentifier<'_>) -> bool {
        match identifier {
            SignerIdentifier::IssuerAndSerialNumber {
                issuer,
                serial_number,
            } => self.issuer == *issuer && self.serial_number == *serial_number,
            SignerIdentifier::SubjectKeyIdentifier(key_id) => self
                .x509
                .subject_key_id()
                .is_some_and(|own| own.as_slice() == *key_id),
        }
    }
}
