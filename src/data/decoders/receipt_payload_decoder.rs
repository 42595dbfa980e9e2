use once_cell::sync::Lazy;

use crate::{
    data::decoders::{
        der_reader::{DerElement, DerReader},
        field_extractor::{extract_fields, FieldTable},
        purchase_record_decoder::decode_purchase_record,
        utils::decode_utf8_string,
    },
    domain::entities::receipt::Receipt,
    errors::ReceiptError,
};

// https://developer.apple.com/library/archive/releasenotes/General/ValidateAppStoreReceipt/Chapters/ReceiptFields.html
const RECEIPT_TYPE: i64 = 0;
const APP_ITEM_ID: i64 = 1;
const BUNDLE_ID: i64 = 2;
const APPLICATION_VERSION: i64 = 3;
const OPAQUE_VALUE: i64 = 4;
const SHA1_HASH: i64 = 5;
const RECEIPT_CREATION_DATE: i64 = 12;
const DOWNLOAD_ID: i64 = 15;
const VERSION_EXTERNAL_IDENTIFIER: i64 = 16;
const IN_APP_PURCHASE: i64 = 17;
const ORIGINAL_PURCHASE_DATE: i64 = 18;
const ORIGINAL_APPLICATION_VERSION: i64 = 19;
const EXPIRATION_DATE: i64 = 21;

static RECEIPT_FIELDS: Lazy<FieldTable<Receipt>> = Lazy::new(|| {
    FieldTable::<Receipt>::new()
        .utf8_string(RECEIPT_TYPE, |r, value| r.receipt_type = Some(value))
        .integer(APP_ITEM_ID, |r, value| r.app_item_id = Some(value))
        .custom(BUNDLE_ID, decode_bundle_id)
        .utf8_string(APPLICATION_VERSION, |r, value| {
            r.application_version = Some(value)
        })
        .octets(OPAQUE_VALUE, |r, value| r.opaque_value = Some(value))
        .octets(SHA1_HASH, |r, value| r.sha1_hash = Some(value))
        .timestamp(RECEIPT_CREATION_DATE, |r, value| {
            r.receipt_creation_date = Some(value)
        })
        .integer(DOWNLOAD_ID, |r, value| r.download_id = Some(value))
        .integer(VERSION_EXTERNAL_IDENTIFIER, |r, value| {
            r.version_external_identifier = Some(value)
        })
        .custom(IN_APP_PURCHASE, |r, _, value| {
            r.in_app_purchases.push(decode_purchase_record(value)?);
            Ok(())
        })
        .timestamp(ORIGINAL_PURCHASE_DATE, |r, value| {
            r.original_purchase_date = Some(value)
        })
        .utf8_string(ORIGINAL_APPLICATION_VERSION, |r, value| {
            r.original_application_version = Some(value)
        })
        .optional_timestamp(EXPIRATION_DATE, |r, value| r.expiration_date = value)
});

/// The device hash is computed over the encoded bundle identifier, so the raw
/// value is kept next to the decoded string.
fn decode_bundle_id(
    receipt: &mut Receipt,
    tag: i64,
    value: &DerElement<'_>,
) -> Result<(), ReceiptError> {
    let bundle_id =
        decode_utf8_string(value).map_err(|source| ReceiptError::FieldDecode { tag, source })?;
    receipt.bundle_id = Some(bundle_id);
    receipt.bundle_id_data = Some(value.value().to_vec());
    Ok(())
}

/// Decodes verified receipt content: exactly one attribute set, nothing after
/// it.
pub(crate) fn decode_receipt_payload(
    content: &[u8],
    max_depth: usize,
) -> Result<Receipt, ReceiptError> {
    let container = DerReader::new(content, max_depth).single()?;
    extract_fields(&container, &RECEIPT_FIELDS)
}
