use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::{
    data::{
        decoders::{
            der_reader::{DerElement, ElementKind},
            utils::{decode_ia5_string, decode_integer, decode_utf8_string, parse_timestamp},
        },
        models::receipt_payload::receipt_attribute_model::ReceiptAttributeModel,
    },
    errors::{EncodingError, ReceiptError},
};

/// How the value of one known tag is decoded, paired with the setter that
/// stores the decoded value on the record being built.
pub(crate) enum FieldHandler<T> {
    Integer(fn(&mut T, i64)),
    Utf8String(fn(&mut T, String)),
    Timestamp(fn(&mut T, DateTime<Utc>)),
    /// Like `Timestamp`, but an empty string means the date is not set.
    OptionalTimestamp(fn(&mut T, Option<DateTime<Utc>>)),
    Octets(fn(&mut T, Vec<u8>)),
    /// Decodes the raw value element itself, e.g. nested containers.
    Custom(fn(&mut T, i64, &DerElement<'_>) -> Result<(), ReceiptError>),
}

impl<T> FieldHandler<T> {
    fn apply(&self, target: &mut T, tag: i64, value: &DerElement<'_>) -> Result<(), ReceiptError> {
        let field_error = |source: EncodingError| ReceiptError::FieldDecode { tag, source };
        match self {
            Self::Integer(set) => set(target, decode_integer(value).map_err(field_error)?),
            Self::Utf8String(set) => set(target, decode_utf8_string(value).map_err(field_error)?),
            Self::Timestamp(set) => {
                let text = decode_ia5_string(value).map_err(field_error)?;
                set(target, parse_timestamp(text)?)
            }
            Self::OptionalTimestamp(set) => {
                let text = decode_ia5_string(value).map_err(field_error)?;
                let timestamp = match text {
                    "" => None,
                    text => Some(parse_timestamp(text)?),
                };
                set(target, timestamp)
            }
            Self::Octets(set) => set(target, value.value().to_vec()),
            Self::Custom(decode) => decode(target, tag, value)?,
        }
        Ok(())
    }
}

/// Tag → handler lookup table for one record type.
pub(crate) struct FieldTable<T> {
    handlers: HashMap<i64, FieldHandler<T>>,
}

impl<T> FieldTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub(crate) fn integer(self, tag: i64, set: fn(&mut T, i64)) -> Self {
        self.with(tag, FieldHandler::Integer(set))
    }

    pub(crate) fn utf8_string(self, tag: i64, set: fn(&mut T, String)) -> Self {
        self.with(tag, FieldHandler::Utf8String(set))
    }

    pub(crate) fn timestamp(self, tag: i64, set: fn(&mut T, DateTime<Utc>)) -> Self {
        self.with(tag, FieldHandler::Timestamp(set))
    }

    pub(crate) fn optional_timestamp(
        self,
        tag: i64,
        set: fn(&mut T, Option<DateTime<Utc>>),
    ) -> Self {
        self.with(tag, FieldHandler::OptionalTimestamp(set))
    }

    pub(crate) fn octets(self, tag: i64, set: fn(&mut T, Vec<u8>)) -> Self {
        self.with(tag, FieldHandler::Octets(set))
    }

    pub(crate) fn custom(
        self,
        tag: i64,
        decode: fn(&mut T, i64, &DerElement<'_>) -> Result<(), ReceiptError>,
    ) -> Self {
        self.with(tag, FieldHandler::Custom(decode))
    }

    fn with(mut self, tag: i64, handler: FieldHandler<T>) -> Self {
        self.handlers.insert(tag, handler);
        self
    }

    fn get(&self, tag: i64) -> Option<&FieldHandler<T>> {
        self.handlers.get(&tag)
    }
}

/// Builds a `T` from a container of `(tag, version, value)` attributes.
///
/// Tags without a handler are skipped: the storefront adds undocumented and
/// future fields freely.
pub(crate) fn extract_fields<T: Default>(
    container: &DerElement<'_>,
    table: &FieldTable<T>,
) -> Result<T, ReceiptError> {
    if !matches!(container.kind(), ElementKind::Set | ElementKind::Sequence) {
        return Err(EncodingError::UnexpectedTag {
            expected: "attribute set",
            found: container.tag(),
        }
        .into());
    }
    let mut target = T::default();
    for element in container.children()? {
        let attribute = ReceiptAttributeModel::decode(element?)?;
        match table.get(attribute.tag) {
            Some(handler) => handler.apply(&mut target, attribute.tag, &attribute.value)?,
            None => trace!(
                tag = attribute.tag,
                depth = attribute.value.depth(),
                "skipping unknown attribute"
            ),
        }
    }
    Ok(target)
}
