use std::fmt;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

impl FetchOutput {
    /// Decodes the body to text. The BOM wins, then the Content-Type charset,
    /// then byte-level detection.
    pub fn decode_text(&self) -> Result<String, FetchError> {
        let encoding = Encoding::for_bom(&self.bytes)
            .map(|(encoding, _)| encoding)
            .or_else(|| {
                self.metadata
                    .content_type
                    .as_deref()
                    .and_then(charset_label)
                    .and_then(|label| Encoding::for_label(label.as_bytes()))
            })
            .unwrap_or_else(|| {
                let mut detector = EncodingDetector::new();
                detector.feed(&self.bytes, true);
                detector.guess(None, true)
            });

        let (text, _, had_errors) = encoding.decode(&self.bytes);
        if had_errors {
            return Err(FetchError::new(
                FailureKind::Decode {
                    encoding: encoding.name().to_string(),
                },
                format!("body of {} is not valid {}", self.metadata.final_url, encoding.name()),
            ));
        }
        Ok(text.into_owned())
    }
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

/// A single candidate could not be fetched. Never fatal to a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode { encoding: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode { encoding } => write!(f, "undecodable {encoding} body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
