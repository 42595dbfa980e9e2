use std::path::PathBuf;

use openssl::error::ErrorStack;
use thiserror::Error;

/// Outcome of a failed receipt parse, or of loading the pieces the parser
/// needs.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] EncodingError),
    #[error("field with tag {tag} could not be decoded: {source}")]
    FieldDecode {
        tag: i64,
        #[source]
        source: EncodingError,
    },
    #[error("timestamp {value:?} does not match YYYY-MM-DDThh:mm:ssZ")]
    DateParse { value: String },

    // Trust errors
    #[error("signed envelope carries no signer")]
    NoSigner,
    #[error("no signer chains to the trust anchor")]
    SignatureInvalid,

    #[error("invalid bundle_id: {}", .found.as_deref().unwrap_or("absent"))]
    IdentityMismatch { found: Option<String> },

    // Loading errors
    #[error("invalid trust anchor certificate")]
    InvalidTrustAnchor(#[source] ErrorStack),
    #[error("could not read {}", .1.display())]
    FileIo(#[source] std::io::Error, PathBuf),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

/// Structural problems found while reading the tag-length-value encoding.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },
    #[error("truncated element header")]
    TruncatedHeader,
    #[error("declared length {declared} exceeds the {remaining} bytes available")]
    LengthExceedsInput { declared: usize, remaining: usize },
    #[error("unsupported length encoding")]
    UnsupportedLength,
    #[error("high tag number form is not supported")]
    UnsupportedTag,
    #[error("unterminated indefinite-length element")]
    UnterminatedContent,
    #[error("nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),
    #[error("expected {expected}, found tag {found:#04x}")]
    UnexpectedTag { expected: &'static str, found: u8 },
    #[error("missing {0}")]
    MissingElement(&'static str),
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("invalid integer encoding")]
    InvalidInteger,
    #[error("integer does not fit in 64 bits")]
    IntegerOverflow,
    #[error("invalid {0} string")]
    InvalidString(&'static str),
    #[error("content type is not signed data")]
    UnsupportedContentType,
    #[error("invalid embedded certificate")]
    InvalidCertificate(#[source] ErrorStack),
}
