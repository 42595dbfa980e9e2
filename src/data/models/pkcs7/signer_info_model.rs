use crate::{
    constants::OID_MESSAGE_DIGEST,
    data::decoders::der_reader::{
        context_tag, DerElement, ElementKind, TAG_INTEGER, TAG_OCTET_STRING, TAG_SEQUENCE, TAG_SET,
    },
    errors::EncodingError,
};

/// Which embedded certificate claims to have produced a signature.
#[derive(Debug)]
pub(crate) enum SignerIdentifier<'a> {
    /// Encoded issuer name and serial number content octets.
    IssuerAndSerialNumber {
        issuer: &'a [u8],
        serial_number: &'a [u8],
    },
    SubjectKeyIdentifier(&'a [u8]),
}

/// ```text
/// SignerInfo ::= SEQUENCE {
///   version CMSVersion,
///   sid SignerIdentifier,
///   digestAlgorithm DigestAlgorithmIdentifier,
///   signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///   signatureAlgorithm SignatureAlgorithmIdentifier,
///   signature OCTET STRING,
///   unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL
/// }
/// ```
#[derive(Debug)]
pub(crate) struct SignerInfoModel<'a> {
    pub(crate) identifier: SignerIdentifier<'a>,
    pub(crate) digest_algorithm: &'a [u8],
    pub(crate) signed_attributes: Option<SignedAttributesModel<'a>>,
    pub(crate) signature_algorithm: &'a [u8],
    pub(crate) signature: &'a [u8],
}

/// The signed attributes of a signer. When present, the signature covers
/// their DER encoding (with the SET OF tag, not the implicit `[0]`), and the
/// content is bound through the message-digest attribute.
#[derive(Debug)]
pub(crate) struct SignedAttributesModel<'a> {
    pub(crate) encoded: Vec<u8>,
    pub(crate) message_digest: Option<&'a [u8]>,
}

impl<'a> SignerInfoModel<'a> {
    pub(crate) fn decode(element: DerElement<'a>) -> Result<Self, EncodingError> {
        let mut fields = element
            .expect_tag(TAG_SEQUENCE, "signer info")?
            .children()?;
        fields
            .expect_element("signer info version")?
            .expect_tag(TAG_INTEGER, "signer info version")?;

        let sid = fields.expect_element("signer identifier")?;
        let identifier = match sid.kind() {
            ElementKind::Sequence => {
                let mut parts = sid.children()?;
                let issuer = parts
                    .expect_element("issuer")?
                    .expect_tag(TAG_SEQUENCE, "issuer")?
                    .raw();
                let serial_number = parts
                    .expect_element("serial number")?
                    .expect_tag(TAG_INTEGER, "serial number")?
                    .value();
                SignerIdentifier::IssuerAndSerialNumber {
                    issuer,
                    serial_number,
                }
            }
            ElementKind::ContextSpecific(0) if !sid.is_constructed() => {
                SignerIdentifier::SubjectKeyIdentifier(sid.value())
            }
            _ => {
                return Err(EncodingError::UnexpectedTag {
                    expected: "signer identifier",
                    found: sid.tag(),
                })
            }
        };

        let digest_algorithm = decode_algorithm(fields.expect_element("digest algorithm")?)?;
        let signed_attributes = fields
            .read_optional(context_tag(0, true))?
            .map(SignedAttributesModel::decode)
            .transpose()?;
        let signature_algorithm =
            decode_algorithm(fields.expect_element("signature algorithm")?)?;
        let signature = fields
            .expect_element("signature")?
            .expect_tag(TAG_OCTET_STRING, "signature")?
            .value();

        Ok(Self {
            identifier,
            digest_algorithm,
            signed_attributes,
            signature_algorithm,
            signature,
        })
    }
}

impl<'a> SignedAttributesModel<'a> {
    fn decode(element: DerElement<'a>) -> Result<Self, EncodingError> {
        let mut encoded = element.raw().to_vec();
        encoded[0] = TAG_SET;

        let mut message_digest = None;
        for attribute in element.children()? {
            let mut parts = attribute?
                .expect_tag(TAG_SEQUENCE, "attribute")?
                .children()?;
            let attribute_type = parts.expect_element("attribute type")?.as_oid()?;
            let values = parts
                .expect_element("attribute values")?
                .expect_tag(TAG_SET, "attribute values")?;
            if attribute_type == OID_MESSAGE_DIGEST {
                let digest = values
                    .children()?
                    .expect_element("message digest")?
                    .expect_tag(TAG_OCTET_STRING, "message digest")?;
                message_digest = Some(digest.value());
            }
        }

        Ok(Self {
            encoded,
            message_digest,
        })
    }
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`
fn decode_algorithm(element: DerElement<'_>) -> Result<&[u8], EncodingError> {
    element
        .expect_tag(TAG_SEQUENCE, "algorithm identifier")?
        .children()?
        .expect_element("algorithm")?
        .as_oid()
}
