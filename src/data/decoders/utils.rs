use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use crate::{
    data::decoders::der_reader::DerElement,
    errors::{EncodingError, ReceiptError},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Decodes an attribute value holding a re-encoded INTEGER.
pub(crate) fn decode_integer(value: &DerElement<'_>) -> Result<i64, EncodingError> {
    value.encapsulated()?.as_integer()
}

/// Decodes an attribute value holding a re-encoded UTF8String.
pub(crate) fn decode_utf8_string(value: &DerElement<'_>) -> Result<String, EncodingError> {
    Ok(value.encapsulated()?.as_utf8_str()?.to_owned())
}

/// Decodes an attribute value holding a re-encoded IA5String.
pub(crate) fn decode_ia5_string<'a>(value: &DerElement<'a>) -> Result<&'a str, EncodingError> {
    value.encapsulated()?.as_ia5_str()
}

/// Parses a `YYYY-MM-DDThh:mm:ssZ` timestamp. Only that exact shape is
/// accepted: no fractional seconds, no offsets, no missing padding.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ReceiptError> {
    let invalid = || ReceiptError::DateParse {
        value: value.to_owned(),
    };
    if !has_fixed_profile(value) {
        return Err(invalid());
    }
    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
    // chrono reads second 60 as a leap second at any minute.
    if naive.second() > 59 || naive.nanosecond() != 0 {
        return Err(invalid());
    }
    Ok(naive.and_utc())
}

fn has_fixed_profile(value: &str) -> bool {
    value.len() == 20
        && value.bytes().enumerate().all(|(i, byte)| match i {
            4 | 7 => byte == b'-',
            10 => byte == b'T',
            13 | 16 => byte == b':',
            19 => byte == b'Z',
            _ => byte.is_ascii_digit(),
        })
}
