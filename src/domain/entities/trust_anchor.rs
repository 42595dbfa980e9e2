use std::{fmt, path::Path};

use openssl::{
    pkey::{PKey, Public},
    x509::{X509Ref, X509},
};

use crate::errors::ReceiptError;

/// The root certificate every valid receipt must chain to (for production
/// receipts, Apple Inc. Root Certificate).
///
/// Construct it once and share it; it is never mutated.
#[derive(Clone)]
pub struct TrustAnchor {
    certificate: X509,
    public_key: PKey<Public>,
}

impl TrustAnchor {
    pub fn from_der(der: &[u8]) -> Result<Self, ReceiptError> {
        let certificate = X509::from_der(der).map_err(ReceiptError::InvalidTrustAnchor)?;
        Self::from_certificate(certificate)
    }

    pub fn from_pem(pem: &[u8]) -> Result<Self, ReceiptError> {
        let certificate = X509::from_pem(pem).map_err(ReceiptError::InvalidTrustAnchor)?;
        Self::from_certificate(certificate)
    }

    /// Accepts either encoding; PEM is recognised by its armor line.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReceiptError> {
        let start = bytes
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        if bytes[start..].starts_with(b"-----BEGIN") {
            Self::from_pem(&bytes[start..])
        } else {
            Self::from_der(bytes)
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReceiptError> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| ReceiptError::FileIo(e, path.to_path_buf()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_certificate(certificate: X509) -> Result<Self, ReceiptError> {
        let public_key = certificate
            .public_key()
            .map_err(ReceiptError::InvalidTrustAnchor)?;
        Ok(Self {
            certificate,
            public_key,
        })
    }

    pub fn certificate(&self) -> &X509Ref {
        &self.certificate
    }

    /// Whether `certificate` carries a valid signature by this anchor's key.
    pub(crate) fn issued(&self, certificate: &X509Ref) -> bool {
        certificate.verify(&self.public_key).unwrap_or(false)
    }
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject: Vec<String> = self
            .certificate
            .subject_name()
            .entries()
            .map(|entry| String::from_utf8_lossy(entry.data().as_slice()).into_owned())
            .collect();
        f.debug_struct("TrustAnchor")
            .field("subject", &subject)
            .finish_non_exhaustive()
    }
}
