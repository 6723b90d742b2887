//! Opaque continuation tokens.
//!
//! A token is standard base64 over the little-endian bytes of a 32-bit offset.
//! There is no version or checksum; bad input is rejected on decode.

use base64::{engine::general_purpose::STANDARD, Engine as _};

// Well above the 8 characters a real token has; bounds work on untrusted input.
const MAX_CURSOR_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CursorDecodeError {
    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("cursor token must hold exactly 4 bytes, found {0}")]
    InvalidLength(usize),
}

/// Encode an offset as an opaque token.
#[must_use]
pub fn encode_cursor(offset: u32) -> String {
    STANDARD.encode(offset.to_le_bytes())
}

/// Decode a token back into an offset. Absent or blank tokens mean the start of the collection.
pub fn decode_cursor(token: Option<&str>) -> Result<u32, CursorDecodeError> {
    let token = match token.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(t) => t,
    };

    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorDecodeError::TooLong {
            len: token.len(),
            max: MAX_CURSOR_TOKEN_LEN,
        });
    }

    let bytes = STANDARD
        .decode(token)
        .map_err(|e| CursorDecodeError::InvalidEncoding(e.to_string()))?;

    let raw: [u8; 4] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CursorDecodeError::InvalidLength(bytes.len()))?;

    Ok(u32::from_le_bytes(raw))
}
