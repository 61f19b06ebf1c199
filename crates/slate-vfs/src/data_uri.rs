use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    #[error("content is not a data URI")]
    MissingScheme,
    #[error("data URI has no `,` separating header and payload")]
    MissingPayload,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encodes `bytes` as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decodes a `data:` URI.
///
/// Payloads without the `;base64` marker are returned verbatim.
pub fn decode(uri: &str) -> Result<DecodedDataUri, DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let mime = if mime.is_empty() {
        "text/plain".to_owned()
    } else {
        mime.to_owned()
    };

    let bytes = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok(DecodedDataUri { mime, bytes })
}
