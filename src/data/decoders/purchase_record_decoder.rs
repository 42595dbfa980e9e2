use once_cell::sync::Lazy;

use crate::{
    data::decoders::{
        der_reader::DerElement,
        field_extractor::{extract_fields, FieldTable},
    },
    domain::entities::purchase_record::PurchaseRecord,
    errors::ReceiptError,
};

// https://developer.apple.com/library/archive/releasenotes/General/ValidateAppStoreReceipt/Chapters/ReceiptFields.html#//apple_ref/doc/uid/TP40010545-CH2-SW12
const QUANTITY: i64 = 1701;
const PRODUCT_ID: i64 = 1702;
const TRANSACTION_ID: i64 = 1703;
const PURCHASE_DATE: i64 = 1704;
const ORIGINAL_TRANSACTION_ID: i64 = 1705;
const ORIGINAL_PURCHASE_DATE: i64 = 1706;
const EXPIRES_DATE: i64 = 1708;
const WEB_ORDER_LINE_ITEM_ID: i64 = 1711;
const CANCELLATION_DATE: i64 = 1712;

static IN_APP_FIELDS: Lazy<FieldTable<PurchaseRecord>> = Lazy::new(|| {
    FieldTable::<PurchaseRecord>::new()
        .integer(QUANTITY, |p, value| p.quantity = Some(value))
        .utf8_string(PRODUCT_ID, |p, value| p.product_id = Some(value))
        .utf8_string(TRANSACTION_ID, |p, value| p.transaction_id = Some(value))
        .timestamp(PURCHASE_DATE, |p, value| p.purchase_date = Some(value))
        .utf8_string(ORIGINAL_TRANSACTION_ID, |p, value| {
            p.original_transaction_id = Some(value)
        })
        .timestamp(ORIGINAL_PURCHASE_DATE, |p, value| {
            p.original_purchase_date = Some(value)
        })
        .optional_timestamp(EXPIRES_DATE, |p, value| p.expires_date = value)
        .integer(WEB_ORDER_LINE_ITEM_ID, |p, value| {
            p.web_order_line_item_id = Some(value)
        })
        .optional_timestamp(CANCELLATION_DATE, |p, value| p.cancellation_date = value)
});

/// Decodes the value of one in-app purchase attribute. The octet string holds
/// a nested attribute set of the same shape as the receipt itself.
pub(crate) fn decode_purchase_record(value: &DerElement<'_>) -> Result<PurchaseRecord, ReceiptError> {
    let container = value.encapsulated()?;
    extract_fields(&container, &IN_APP_FIELDS)
}
