use crate::{
    data::decoders::der_reader::{DerElement, TAG_INTEGER, TAG_OCTET_STRING, TAG_SEQUENCE},
    errors::EncodingError,
};

/// One entry of a receipt (or in-app purchase) container:
///
/// ```text
/// ReceiptAttribute ::= SEQUENCE {
///     type    INTEGER,
///     version INTEGER,
///     value   OCTET STRING
/// }
/// ```
///
/// The version is carried by the storefront but has no documented meaning,
/// so it is skipped without inspection.
#[derive(Debug)]
pub(crate) struct ReceiptAttributeModel<'a> {
    pub(crate) tag: i64,
    pub(crate) value: DerElement<'a>,
}

impl<'a> ReceiptAttributeModel<'a> {
    pub(crate) fn decode(element: DerElement<'a>) -> Result<Self, EncodingError> {
        let mut fields = element
            .expect_tag(TAG_SEQUENCE, "receipt attribute sequence")?
            .children()?;
        let tag = fields
            .expect_element("attribute type")?
            .expect_tag(TAG_INTEGER, "attribute type")?
            .as_integer()?;
        fields.expect_element("attribute version")?;
        let value = fields
            .expect_element("attribute value")?
            .expect_tag(TAG_OCTET_STRING, "attribute value")?;
        Ok(Self { tag, value })
    }
}
