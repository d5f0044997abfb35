//! Base64 encoding used for every binary value embedded in the envelope.
use base64ct::{Base64, Encoding};

/// Encoder for binary values placed into the envelope.
///
/// Implementations must use the standard padded alphabet and must not wrap
/// output across lines: inserted values are single contiguous tokens, and
/// the envelope pipeline rejects any value containing a line break.
pub trait Base64Codec {
    fn encode(&self, bytes: &[u8]) -> String;
}

/// Standard padded base64 without line wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardBase64;

impl Base64Codec for StandardBase64 {
    fn encode(&self, bytes: &[u8]) -> String {
        Base64::encode_string(bytes)
    }
}
