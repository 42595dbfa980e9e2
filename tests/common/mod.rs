//! Shared helpers for the receipt integration tests.
//!
//! Receipts are hand-encoded attribute sets, signed with a throw-away PKI
//! (root, intermediate, leaf) through OpenSSL's PKCS#7 implementation, the
//! same envelope shape the storefront produces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use fractic_iap_receipt::{domain::entities::trust_anchor::TrustAnchor, util::DefaultReceiptUtil};
use once_cell::sync::Lazy;
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    ec::{EcGroup, EcKey},
    hash::MessageDigest,
    nid::Nid,
    pkcs7::{Pkcs7, Pkcs7Flags},
    pkey::{PKey, Private},
    rsa::Rsa,
    stack::Stack,
    x509::{
        extension::{BasicConstraints, SubjectKeyIdentifier},
        X509NameBuilder, X509,
    },
};

pub const BUNDLE_ID: &str = "com.example.app";

// ---------------------------------------------------------------------------
// DER encoding
// ---------------------------------------------------------------------------

pub fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = value.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let octets: Vec<u8> = len
            .to_be_bytes()
            .iter()
            .copied()
            .skip_while(|byte| *byte == 0)
            .collect();
        out.push(0x80 | octets.len() as u8);
        out.extend(octets);
    }
    out.extend_from_slice(value);
    out
}

/// Minimal two's complement INTEGER.
pub fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ones = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;
        if !(redundant_zero || redundant_ones) {
            break;
        }
        start += 1;
    }
    tlv(0x02, &bytes[start..])
}

pub fn utf8(value: &str) -> Vec<u8> {
    tlv(0x0C, value.as_bytes())
}

pub fn ia5(value: &str) -> Vec<u8> {
    tlv(0x16, value.as_bytes())
}

pub fn octets(value: &[u8]) -> Vec<u8> {
    tlv(0x04, value)
}

pub fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

pub fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x31, &parts.concat())
}

/// `SEQUENCE { INTEGER tag, INTEGER 1, OCTET STRING value }`
pub fn attribute(tag: i64, encoded_value: Vec<u8>) -> Vec<u8> {
    sequence(&[integer(tag), integer(1), octets(&encoded_value)])
}

// ---------------------------------------------------------------------------
// Receipt payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct PurchaseBuilder {
    attributes: Vec<Vec<u8>>,
}

impl PurchaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(self, value: i64) -> Self {
        self.raw(1701, integer(value))
    }

    pub fn product_id(self, value: &str) -> Self {
        self.raw(1702, utf8(value))
    }

    pub fn transaction_id(self, value: &str) -> Self {
        self.raw(1703, utf8(value))
    }

    pub fn purchase_date(self, value: &str) -> Self {
        self.raw(1704, ia5(value))
    }

    pub fn original_transaction_id(self, value: &str) -> Self {
        self.raw(1705, utf8(value))
    }

    pub fn original_purchase_date(self, value: &str) -> Self {
        self.raw(1706, ia5(value))
    }

    pub fn expires_date(self, value: &str) -> Self {
        self.raw(1708, ia5(value))
    }

    pub fn web_order_line_item_id(self, value: i64) -> Self {
        self.raw(1711, integer(value))
    }

    pub fn cancellation_date(self, value: &str) -> Self {
        self.raw(1712, ia5(value))
    }

    pub fn raw(mut self, tag: i64, encoded_value: Vec<u8>) -> Self {
        self.attributes.push(attribute(tag, encoded_value));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        set(&self.attributes)
    }
}

#[derive(Clone, Default)]
pub struct ReceiptBuilder {
    attributes: Vec<Vec<u8>>,
}

impl ReceiptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipt_type(self, value: &str) -> Self {
        self.raw(0, utf8(value))
    }

    pub fn app_item_id(self, value: i64) -> Self {
        self.raw(1, integer(value))
    }

    pub fn bundle_id(self, value: &str) -> Self {
        self.raw(2, utf8(value))
    }

    pub fn application_version(self, value: &str) -> Self {
        self.raw(3, utf8(value))
    }

    /// Stored as-is, not re-encoded.
    pub fn opaque_value(self, value: &[u8]) -> Self {
        self.raw(4, value.to_vec())
    }

    /// Stored as-is, not re-encoded.
    pub fn sha1_hash(self, value: &[u8]) -> Self {
        self.raw(5, value.to_vec())
    }

    pub fn receipt_creation_date(self, value: &str) -> Self {
        self.raw(12, ia5(value))
    }

    pub fn download_id(self, value: i64) -> Self {
        self.raw(15, integer(value))
    }

    pub fn version_external_identifier(self, value: i64) -> Self {
        self.raw(16, integer(value))
    }

    pub fn purchase(self, purchase: PurchaseBuilder) -> Self {
        self.raw(17, purchase.build())
    }

    pub fn original_purchase_date(self, value: &str) -> Self {
        self.raw(18, ia5(value))
    }

    pub fn original_application_version(self, value: &str) -> Self {
        self.raw(19, utf8(value))
    }

    pub fn expiration_date(self, value: &str) -> Self {
        self.raw(21, ia5(value))
    }

    pub fn raw(mut self, tag: i64, encoded_value: Vec<u8>) -> Self {
        self.attributes.push(attribute(tag, encoded_value));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        set(&self.attributes)
    }
}

/// A receipt with every known field populated and two purchases.
pub fn full_receipt() -> ReceiptBuilder {
    ReceiptBuilder::new()
        .receipt_type("ProductionSandbox")
        .app_item_id(1234567890)
        .bundle_id(BUNDLE_ID)
        .application_version("42")
        .opaque_value(&[0xDE, 0xAD, 0xBE, 0xEF])
        .sha1_hash(&[0x11; 20])
        .receipt_creation_date("2024-03-01T10:00:00Z")
        .download_id(-7)
        .version_external_identifier(812345)
        .purchase(
            PurchaseBuilder::new()
                .quantity(1)
                .product_id("gems_100")
                .transaction_id("1000000001")
                .purchase_date("2024-02-01T08:30:00Z")
                .original_transaction_id("1000000001")
                .original_purchase_date("2024-02-01T08:30:00Z")
                .expires_date("")
                .web_order_line_item_id(0)
                .cancellation_date(""),
        )
        .purchase(
            PurchaseBuilder::new()
                .quantity(1)
                .product_id("pro_monthly")
                .transaction_id("1000000002")
                .purchase_date("2024-02-15T12:00:00Z")
                .original_transaction_id("1000000002")
                .original_purchase_date("2024-02-15T12:00:00Z")
                .expires_date("2024-03-15T12:00:00Z")
                .web_order_line_item_id(2000000005)
                .cancellation_date("2024-02-20T09:15:30Z"),
        )
        .original_purchase_date("2023-12-24T18:00:00Z")
        .original_application_version("1.0")
        .expiration_date("2025-03-01T10:00:00Z")
}

// ---------------------------------------------------------------------------
// PKI
// ---------------------------------------------------------------------------

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

pub struct Issued {
    pub certificate: X509,
    pub key: PKey<Private>,
}

pub fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

pub fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Issues a certificate for `key`. Self-signed when `issuer` is `None`.
pub fn issue(
    common_name: &str,
    key: PKey<Private>,
    issuer: Option<&Issued>,
    ca: bool,
) -> Issued {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("O", "Receipt Test PKI").unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let serial = BigNum::from_u32(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed))
        .unwrap()
        .to_asn1_integer()
        .unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some(issuer) => builder
            .set_issuer_name(issuer.certificate.subject_name())
            .unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    let subject_key_id = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(subject_key_id).unwrap();

    let signing_key = issuer.map(|issuer| &issuer.key).unwrap_or(&key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    Issued {
        certificate: builder.build(),
        key,
    }
}

pub struct TestPki {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
}

impl TestPki {
    pub fn new(name: &str) -> Self {
        Self::with_leaf_key(name, rsa_key())
    }

    pub fn with_leaf_key(name: &str, leaf_key: PKey<Private>) -> Self {
        let root = issue(&format!("{name} Root CA"), rsa_key(), None, true);
        let intermediate = issue(
            &format!("{name} Intermediate CA"),
            rsa_key(),
            Some(&root),
            true,
        );
        let leaf = issue(
            &format!("{name} Receipt Signing"),
            leaf_key,
            Some(&intermediate),
            false,
        );
        Self {
            root,
            intermediate,
            leaf,
        }
    }

    pub fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::from_der(&self.root.certificate.to_der().unwrap()).unwrap()
    }

    pub fn receipt_util(&self) -> DefaultReceiptUtil {
        DefaultReceiptUtil::new(self.trust_anchor())
    }

    /// Signs `content` the way the storefront does: signed attributes, with
    /// the intermediate embedded next to the leaf.
    pub fn sign(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, &[&self.intermediate.certificate], Pkcs7Flags::BINARY)
    }

    pub fn sign_with(&self, content: &[u8], extra: &[&X509], flags: Pkcs7Flags) -> Vec<u8> {
        sign_envelope(&self.leaf, content, extra, flags)
    }
}

pub fn sign_envelope(signer: &Issued, content: &[u8], extra: &[&X509], flags: Pkcs7Flags) -> Vec<u8> {
    let mut certificates = Stack::new().unwrap();
    for certificate in extra {
        certificates.push((*certificate).clone()).unwrap();
    }
    Pkcs7::sign(
        &signer.certificate,
        &signer.key,
        &certificates,
        content,
        flags | Pkcs7Flags::BINARY,
    )
    .unwrap()
    .to_der()
    .unwrap()
}

pub static PKI: Lazy<TestPki> = Lazy::new(|| TestPki::new("Primary"));
pub static FOREIGN_PKI: Lazy<TestPki> = Lazy::new(|| TestPki::new("Foreign"));

/// Signs a receipt with the primary PKI.
pub fn signed(receipt: &ReceiptBuilder) -> Vec<u8> {
    PKI.sign(&receipt.build())
}

// ---------------------------------------------------------------------------
// Envelope surgery
// ---------------------------------------------------------------------------

const OID_SIGNED_DATA: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];
const OID_DATA: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01];

/// A well-formed SignedData with content and an empty signer set.
pub fn unsigned_envelope(content: &[u8]) -> Vec<u8> {
    let encapsulated = sequence(&[tlv(0x06, &OID_DATA), tlv(0xA0, &octets(content))]);
    let signed_data = sequence(&[integer(1), set(&[]), encapsulated, set(&[])]);
    sequence(&[tlv(0x06, &OID_SIGNED_DATA), tlv(0xA0, &signed_data)])
}

/// Splits definite-length DER into its top-level elements.
fn elements(mut input: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    while !input.is_empty() {
        let (header, len) = header(input);
        out.push(&input[..header + len]);
        input = &input[header + len..];
    }
    out
}

fn header(input: &[u8]) -> (usize, usize) {
    let first = input[1];
    if first < 0x80 {
        return (2, first as usize);
    }
    let count = (first & 0x7F) as usize;
    let len = input[2..2 + count]
        .iter()
        .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);
    (2 + count, len)
}

fn contents(element: &[u8]) -> &[u8] {
    let (header, len) = header(element);
    &element[header..header + len]
}

fn indefinite(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag, 0x80];
    out.extend_from_slice(body);
    out.extend_from_slice(&[0, 0]);
    out
}

/// Re-encodes a DER envelope the way the storefront does: indefinite lengths
/// on the outer layers, and the receipt content split into a constructed
/// OCTET STRING of `segment_size` chunks. Signatures stay valid since neither
/// the content nor the signer infos change.
pub fn to_ber(envelope: &[u8], segment_size: usize) -> Vec<u8> {
    let content_info = elements(contents(envelope));
    let signed_data = contents(content_info[1]);
    let signed_data_fields = elements(contents(signed_data));

    let mut body = Vec::new();
    for (index, field) in signed_data_fields.iter().enumerate() {
        if index != 2 {
            body.extend_from_slice(field);
            continue;
        }
        let encapsulated = elements(contents(field));
        let content = contents(contents(encapsulated[1]));
        let segments: Vec<u8> = content
            .chunks(segment_size)
            .flat_map(|chunk| octets(chunk))
            .collect();
        let mut encapsulated_body = encapsulated[0].to_vec();
        encapsulated_body.extend(indefinite(0xA0, &indefinite(0x24, &segments)));
        body.extend(indefinite(0x30, &encapsulated_body));
    }

    let mut content_info_body = content_info[0].to_vec();
    content_info_body.extend(indefinite(0xA0, &indefinite(0x30, &body)));
    indefinite(0x30, &content_info_body)
}
