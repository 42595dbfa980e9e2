use std::borrow::Cow;

use crate::{
    constants::OID_SIGNED_DATA,
    data::{
        decoders::der_reader::{
            context_tag, DerReader, ElementKind, TAG_INTEGER, TAG_SEQUENCE, TAG_SET,
        },
        models::pkcs7::{certificate_model::CertificateModel, signer_info_model::SignerInfoModel},
    },
    errors::EncodingError,
};

/// The parts of a CMS SignedData message needed to verify it.
///
/// https://www.rfc-editor.org/rfc/rfc5652#section-5.1
/// ```text
/// ContentInfo ::= SEQUENCE {
///   contentType OBJECT IDENTIFIER id-signedData,
///   content [0] EXPLICIT SignedData
/// }
///
/// SignedData ::= SEQUENCE {
///   version CMSVersion,
///   digestAlgorithms SET OF DigestAlgorithmIdentifier,
///   encapContentInfo EncapsulatedContentInfo,
///   certificates [0] IMPLICIT CertificateSet OPTIONAL,
///   crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///   signerInfos SET OF SignerInfo
/// }
///
/// EncapsulatedContentInfo ::= SEQUENCE {
///   eContentType OBJECT IDENTIFIER,
///   eContent [0] EXPLICIT OCTET STRING OPTIONAL
/// }
/// ```
pub(crate) struct SignedEnvelopeModel<'a> {
    /// `None` for detached signatures.
    pub(crate) content: Option<Cow<'a, [u8]>>,
    pub(crate) certificates: Vec<CertificateModel<'a>>,
    pub(crate) signers: Vec<SignerInfoModel<'a>>,
}

impl<'a> SignedEnvelopeModel<'a> {
    pub(crate) fn decode(data: &'a [u8], max_depth: usize) -> Result<Self, EncodingError> {
        let mut content_info = DerReader::new(data, max_depth)
            .single()?
            .expect_tag(TAG_SEQUENCE, "content info")?
            .children()?;
        if content_info.expect_element("content type")?.as_oid()? != OID_SIGNED_DATA {
            return Err(EncodingError::UnsupportedContentType);
        }
        let mut signed_data = content_info
            .expect_element("signed data")?
            .expect_tag(context_tag(0, true), "explicit signed data")?
            .children()?
            .expect_element("signed data")?
            .expect_tag(TAG_SEQUENCE, "signed data")?
            .children()?;

        signed_data
            .expect_element("version")?
            .expect_tag(TAG_INTEGER, "version")?;
        signed_data
            .expect_element("digest algorithms")?
            .expect_tag(TAG_SET, "digest algorithms")?;

        let mut encapsulated = signed_data
            .expect_element("encapsulated content info")?
            .expect_tag(TAG_SEQUENCE, "encapsulated content info")?
            .children()?;
        encapsulated.expect_element("content type")?.as_oid()?;
        let content = match encapsulated.read_optional(context_tag(0, true))? {
            Some(explicit) => Some(
                explicit
                    .children()?
                    .expect_element("encapsulated content")?
                    .octets()?,
            ),
            None => None,
        };

        let mut certificates = Vec::new();
        let mut signers = None;
        for element in signed_data {
            let element = element?;
            match element.kind() {
                ElementKind::ContextSpecific(0) if element.is_constructed() => {
                    for choice in element.children()? {
                        let choice = choice?;
                        // Only plain X.509 certificates; attribute and other
                        // certificate formats cannot take part in the chain.
                        if choice.kind() == ElementKind::Sequence {
                            certificates.push(CertificateModel::decode(choice)?);
                        }
                    }
                }
                ElementKind::ContextSpecific(1) => {}
                ElementKind::Set if signers.is_none() => {
                    signers = Some(
                        element
                            .children()?
                            .map(|signer| SignerInfoModel::decode(signer?))
                            .collect::<Result<Vec<_>, _>>()?,
                    );
                }
                _ => {
                    return Err(EncodingError::UnexpectedTag {
                        expected: "certificates, crls or signer infos",
                        found: element.tag(),
                    })
                }
            }
        }

        Ok(Self {
            content,
            certificates,
            signers: signers.ok_or(EncodingError::MissingElement("signer infos"))?,
        })
    }
}
