//! ISO-8859-1 at the byte boundary of TXT files and sheets.

use crate::core::FormatError;

/// Decode ISO-8859-1 bytes.
pub fn decode_latin1(bytes: &[u8]) -> String {
    encoding_rs::mem::decode_latin1(bytes).into_owned()
}

/// Encode text as ISO-8859-1, rejecting characters outside U+0000..=U+00FF.
pub fn encode_latin1(text: &str) -> Result<Vec<u8>, FormatError> {
    if let Some((pos, ch)) = text.char_indices().find(|(_, c)| u32::from(*c) > 0xFF) {
        return Err(FormatError::Encoding(format!(
            "character {ch:?} at byte {pos} is not representable in Latin-1"
        )));
    }
    Ok(encoding_rs::mem::encode_latin1_lossy(text).into_owned())
}

/// UTF-8 when the bytes are valid UTF-8, ISO-8859-1 otherwise.
pub(crate) fn decode_utf8_or_latin1(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| decode_latin1(e.as_bytes()))
}
